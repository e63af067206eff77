use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::storage::models::{Aggregate, Document};
use crate::storage::{DocumentStore, StoreError};
use crate::utils::MigrationMetrics;

const BATCH_REPORT_INTERVAL: usize = 10;

/// Result of one document's upsert.
#[derive(Debug)]
pub struct UpsertOutcome {
    pub id: String,
    pub retried: bool,
    pub result: Result<(), StoreError>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub retried: usize,
}

impl LoadSummary {
    fn record(&mut self, outcome: &UpsertOutcome) {
        if outcome.retried {
            self.retried += 1;
        }
        match outcome.result {
            Ok(()) => self.succeeded += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// Concurrent upserts against the shared store handle.
pub struct BulkLoader {
    store: Arc<dyn DocumentStore>,
    retry_fallback: Duration,
    metrics: Option<Arc<MigrationMetrics>>,
}

impl BulkLoader {
    pub fn new(store: Arc<dyn DocumentStore>, retry_fallback: Duration) -> Self {
        Self {
            store,
            retry_fallback,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MigrationMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Upsert `documents` in batches of `batch_size`. Batches run one after
    /// another; documents inside a batch run concurrently in no set order.
    pub async fn load<F>(
        &self,
        aggregate: Aggregate,
        documents: &[Document],
        partition_key: F,
        batch_size: usize,
    ) -> LoadSummary
    where
        F: Fn(&Document) -> String,
    {
        let batch_size = batch_size.max(1);
        let total_batches = documents.len().div_ceil(batch_size);
        let mut summary = LoadSummary::default();

        for (batch_idx, batch) in documents.chunks(batch_size).enumerate() {
            let started = Instant::now();
            let outcomes = self.load_batch(batch, &partition_key).await;

            for outcome in &outcomes {
                summary.record(outcome);
            }
            let failed_ids: Vec<&str> = outcomes
                .iter()
                .filter(|o| o.result.is_err())
                .map(|o| o.id.as_str())
                .collect();
            if !failed_ids.is_empty() {
                warn!(
                    aggregate = %aggregate,
                    batch = batch_idx + 1,
                    failed_ids = ?failed_ids,
                    "Batch finished with failed documents"
                );
            }
            if let Some(metrics) = &self.metrics {
                metrics
                    .batch_latency
                    .with_label_values(&[aggregate.discriminator()])
                    .observe(started.elapsed().as_secs_f64());
            }

            if (batch_idx + 1) % BATCH_REPORT_INTERVAL == 0 || batch_idx + 1 == total_batches {
                info!(
                    aggregate = %aggregate,
                    "  Progress: {}/{} batches ({} written, {} failed)",
                    batch_idx + 1,
                    total_batches,
                    summary.succeeded,
                    summary.failed
                );
            }
        }

        if let Some(metrics) = &self.metrics {
            let label = [aggregate.discriminator()];
            metrics
                .documents_written
                .with_label_values(&label)
                .inc_by(summary.succeeded as u64);
            metrics
                .write_errors
                .with_label_values(&label)
                .inc_by(summary.failed as u64);
            metrics.throttle_retries.inc_by(summary.retried as u64);
        }

        summary
    }

    /// Fan out one upsert per document and wait for all of them.
    pub async fn load_batch<F>(&self, batch: &[Document], partition_key: &F) -> Vec<UpsertOutcome>
    where
        F: Fn(&Document) -> String,
    {
        join_all(
            batch
                .iter()
                .map(|document| self.upsert_with_retry(document, partition_key(document))),
        )
        .await
    }

    async fn upsert_with_retry(&self, document: &Document, partition_key: String) -> UpsertOutcome {
        let container = document.container();
        let id = document.id().to_string();

        let first = self.store.upsert(container, &partition_key, document).await;
        let (retried, result) = match first {
            Err(StoreError::Throttled { retry_after }) => {
                let delay = retry_after.unwrap_or(self.retry_fallback);
                warn!(id = %id, delay_ms = delay.as_millis() as u64, "Throttled, retrying once");
                tokio::time::sleep(delay).await;
                (true, self.store.upsert(container, &partition_key, document).await)
            }
            other => (false, other),
        };

        if let Err(e) = &result {
            error!(id = %id, container = %container, error = %e, "Failed to write document");
        }

        UpsertOutcome {
            id,
            retried,
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::CategoryDocument;
    use crate::storage::{Container, MemoryStore, MockDocumentStore};
    use mockall::Sequence;

    fn categories(count: i64) -> Vec<Document> {
        (1..=count)
            .map(|id| {
                Document::Category(CategoryDocument {
                    id: CategoryDocument::document_id(id),
                    category_id: id,
                    name: format!("Category {}", id),
                    parent_category_id: None,
                    parent_category_name: None,
                    modified_date: "2008-04-30T00:00:00.000Z".to_string(),
                })
            })
            .collect()
    }

    fn throttled() -> StoreError {
        StoreError::Throttled {
            retry_after: Some(Duration::from_millis(1)),
        }
    }

    #[tokio::test]
    async fn test_throttle_then_success_counts_as_success() {
        let mut store = MockDocumentStore::new();
        let mut seq = Sequence::new();
        store
            .expect_upsert()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Err(throttled()));
        store
            .expect_upsert()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));

        let loader = BulkLoader::new(Arc::new(store), Duration::from_millis(1));
        let summary = loader
            .load(Aggregate::Category, &categories(1), Document::partition_key, 10)
            .await;

        assert_eq!(
            summary,
            LoadSummary {
                succeeded: 1,
                failed: 0,
                retried: 1
            }
        );
    }

    #[tokio::test]
    async fn test_second_throttle_is_permanent() {
        let mut store = MockDocumentStore::new();
        store
            .expect_upsert()
            .times(2)
            .returning(|_, _, _| Err(throttled()));

        let loader = BulkLoader::new(Arc::new(store), Duration::from_millis(1));
        let summary = loader
            .load(Aggregate::Category, &categories(1), Document::partition_key, 10)
            .await;

        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.failed, 1);
    }

    #[tokio::test]
    async fn test_failures_do_not_abort_batch() {
        let mut store = MockDocumentStore::new();
        store
            .expect_upsert()
            .withf(|_, _, doc| doc.id() == "category-2")
            .times(1)
            .returning(|_, _, _| Err(StoreError::Rejected("item too large".to_string())));
        store
            .expect_upsert()
            .withf(|_, _, doc| doc.id() != "category-2")
            .times(4)
            .returning(|_, _, _| Ok(()));

        let loader = BulkLoader::new(Arc::new(store), Duration::from_millis(1));
        let summary = loader
            .load(Aggregate::Category, &categories(5), Document::partition_key, 2)
            .await;

        assert_eq!(summary.succeeded, 4);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.retried, 0);
    }

    #[tokio::test]
    async fn test_batch_outcomes_carry_ids() {
        let store = Arc::new(MemoryStore::new());
        let loader = BulkLoader::new(store.clone(), Duration::from_millis(1));
        let documents = categories(3);

        let outcomes = loader
            .load_batch(&documents, &Document::partition_key)
            .await;

        let mut ids: Vec<_> = outcomes.iter().map(|o| o.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["category-1", "category-2", "category-3"]);
        assert!(outcomes.iter().all(|o| o.result.is_ok()));
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_reloading_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let loader = BulkLoader::new(store.clone(), Duration::from_millis(1));
        let documents = categories(7);

        let first = loader
            .load(Aggregate::Category, &documents, Document::partition_key, 3)
            .await;
        let snapshot = store
            .read(Container::Products, "category-4", "category-4")
            .await
            .unwrap();
        let second = loader
            .load(Aggregate::Category, &documents, Document::partition_key, 3)
            .await;

        assert_eq!(first.succeeded, 7);
        assert_eq!(second.succeeded, 7);
        assert_eq!(second.failed, 0);
        assert_eq!(store.len().await, 7);
        assert_eq!(
            store
                .read(Container::Products, "category-4", "category-4")
                .await
                .unwrap(),
            snapshot
        );
    }
}
