use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Prometheus counters for one migration run.
pub struct MigrationMetrics {
    pub registry: Registry,
    pub rows_read: IntCounterVec,
    pub rows_rejected: IntCounterVec,
    pub documents_transformed: IntCounterVec,
    pub transform_errors: IntCounterVec,
    pub documents_written: IntCounterVec,
    pub write_errors: IntCounterVec,
    pub throttle_retries: IntCounter,
    pub batch_latency: HistogramVec,
}

impl MigrationMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let rows_read = IntCounterVec::new(
            Opts::new("migrate_rows_read_total", "Source rows read"),
            &["table"],
        )?;
        let rows_rejected = IntCounterVec::new(
            Opts::new("migrate_rows_rejected_total", "Lookup rows rejected as malformed"),
            &["table"],
        )?;
        let documents_transformed = IntCounterVec::new(
            Opts::new("migrate_documents_transformed_total", "Documents produced"),
            &["aggregate"],
        )?;
        let transform_errors = IntCounterVec::new(
            Opts::new("migrate_transform_errors_total", "Primary rows that failed to transform"),
            &["aggregate"],
        )?;
        let documents_written = IntCounterVec::new(
            Opts::new("migrate_documents_written_total", "Documents upserted"),
            &["aggregate"],
        )?;
        let write_errors = IntCounterVec::new(
            Opts::new("migrate_write_errors_total", "Documents that failed to upsert"),
            &["aggregate"],
        )?;
        let throttle_retries = IntCounter::new(
            "migrate_throttle_retries_total",
            "Upserts retried after throttling",
        )?;
        let batch_latency = HistogramVec::new(
            HistogramOpts::new("migrate_batch_seconds", "Wall time per upsert batch"),
            &["aggregate"],
        )?;

        registry.register(Box::new(rows_read.clone()))?;
        registry.register(Box::new(rows_rejected.clone()))?;
        registry.register(Box::new(documents_transformed.clone()))?;
        registry.register(Box::new(transform_errors.clone()))?;
        registry.register(Box::new(documents_written.clone()))?;
        registry.register(Box::new(write_errors.clone()))?;
        registry.register(Box::new(throttle_retries.clone()))?;
        registry.register(Box::new(batch_latency.clone()))?;

        Ok(Self {
            registry,
            rows_read,
            rows_rejected,
            documents_transformed,
            transform_errors,
            documents_written,
            write_errors,
            throttle_retries,
            batch_latency,
        })
    }

    /// Text exposition format of everything registered.
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
