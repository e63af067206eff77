//! Flat-file export → DynamoDB migration.
//!
//! One run reads every source table, builds the lookups, transforms the five
//! aggregates and upserts them. Setup failures abort before the first write;
//! after that, bad records are counted and the run carries on.
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::error::MigrationError;
use crate::loader::{BulkLoader, LoadSummary};
use crate::lookup::Lookups;
use crate::report::MigrationReport;
use crate::source::load_sources;
use crate::storage::models::{Aggregate, Document};
use crate::storage::DocumentStore;
use crate::transform::{check_category_offset, transform_all};
use crate::utils::{Config, MigrationMetrics};

pub struct DataMigration {
    config: Config,
    store: Arc<dyn DocumentStore>,
    loader: BulkLoader,
    metrics: Arc<MigrationMetrics>,
    dry_run: bool,
}

impl DataMigration {
    pub fn new(config: Config, store: Arc<dyn DocumentStore>, metrics: Arc<MigrationMetrics>) -> Self {
        let loader =
            BulkLoader::new(store.clone(), config.throttle_retry()).with_metrics(metrics.clone());
        Self {
            config,
            store,
            loader,
            metrics,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn run(&self) -> Result<MigrationReport, MigrationError> {
        let started = Instant::now();
        let mut report = MigrationReport::new(self.dry_run);

        self.store
            .ping()
            .await
            .map_err(|e| MigrationError::Destination(e.to_string()))?;

        info!(source_dir = %self.config.source_dir.display(), "Reading source tables...");
        let data = load_sources(&self.config.source_dir).await?;

        let (lookups, rejected) = Lookups::build(&data);
        check_category_offset(&lookups.catalog)?;

        report.record_sources(&data, &rejected);
        for (table, rows) in data.row_counts() {
            self.metrics
                .rows_read
                .with_label_values(&[table.name()])
                .inc_by(rows as u64);
        }
        for err in &rejected {
            self.metrics
                .rows_rejected
                .with_label_values(&[err.table().name()])
                .inc();
        }
        info!(
            rows = data.total_rows(),
            rejected = rejected.len(),
            "Lookups built"
        );

        for (aggregate, output) in transform_all(&data, &lookups) {
            report.record_transform(aggregate, &output);
            self.metrics
                .documents_transformed
                .with_label_values(&[aggregate.discriminator()])
                .inc_by(output.documents.len() as u64);
            self.metrics
                .transform_errors
                .with_label_values(&[aggregate.discriminator()])
                .inc_by(output.errors.len() as u64);

            let summary = self.migrate_aggregate(aggregate, &output.documents).await;
            report.record_load(aggregate, &summary);

            let (checked, missing) = self.validate_migration(&output.documents).await;
            report.record_verification(aggregate, checked, missing);
        }

        report.elapsed = started.elapsed();
        info!(
            written = report.documents_written(),
            failed = report.write_failures(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Migration finished"
        );
        Ok(report)
    }

    /// Upsert one aggregate's documents with its configured batch size.
    pub async fn migrate_aggregate(&self, aggregate: Aggregate, documents: &[Document]) -> LoadSummary {
        let batch_size = self.config.batch_sizes.for_aggregate(aggregate);
        info!(
            aggregate = %aggregate,
            documents = documents.len(),
            batch_size,
            "Starting migration of {}...",
            aggregate
        );
        self.loader
            .load(aggregate, documents, Document::partition_key, batch_size)
            .await
    }

    /// Point-read the first `verify_sample` documents back. Returns how many
    /// were checked and the ids that could not be found.
    pub async fn validate_migration(&self, documents: &[Document]) -> (usize, Vec<String>) {
        let sample = &documents[..documents.len().min(self.config.verify_sample)];
        let mut missing = Vec::new();

        for document in sample {
            let found = self
                .store
                .read(document.container(), document.id(), &document.partition_key())
                .await;
            match found {
                Ok(Some(_)) => {}
                Ok(None) => {
                    warn!(id = %document.id(), "Document not found after load");
                    missing.push(document.id().to_string());
                }
                Err(e) => {
                    warn!(id = %document.id(), error = %e, "Verification read failed");
                    missing.push(document.id().to_string());
                }
            }
        }

        (sample.len(), missing)
    }
}
