pub mod dynamodb;
pub mod memory;
pub mod migration;
pub mod models;

pub use dynamodb::DynamoDBStore;
pub use memory::MemoryStore;
pub use migration::DataMigration;
pub use models::{Container, Document};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The destination asked the caller to back off.
    #[error("request throttled by destination")]
    Throttled { retry_after: Option<Duration> },

    #[error("write rejected: {0}")]
    Rejected(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("destination unavailable: {0}")]
    Unavailable(String),
}

/// Destination of the migration: documents addressed by (id, partition key).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create or replace a document.
    async fn upsert(
        &self,
        container: Container,
        partition_key: &str,
        document: &Document,
    ) -> Result<(), StoreError>;

    /// Point read; `None` when no such document exists.
    async fn read(
        &self,
        container: Container,
        id: &str,
        partition_key: &str,
    ) -> Result<Option<serde_json::Value>, StoreError>;

    /// Fails when the destination cannot be reached.
    async fn ping(&self) -> Result<(), StoreError>;
}
