use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::storage::models::{Container, Document};
use crate::storage::{DocumentStore, StoreError};

type Key = (Container, String, String);

/// In-process store used for dry runs and tests. Same upsert semantics as
/// the real destination: one document per (container, partition key, id).
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<Key, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn count(&self, container: Container) -> usize {
        self.documents
            .read()
            .await
            .keys()
            .filter(|(c, _, _)| *c == container)
            .count()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn upsert(
        &self,
        container: Container,
        partition_key: &str,
        document: &Document,
    ) -> Result<(), StoreError> {
        let value = document.to_json()?;
        self.documents.write().await.insert(
            (container, partition_key.to_string(), document.id().to_string()),
            value,
        );
        Ok(())
    }

    async fn read(
        &self,
        container: Container,
        id: &str,
        partition_key: &str,
    ) -> Result<Option<Value>, StoreError> {
        let key = (container, partition_key.to_string(), id.to_string());
        Ok(self.documents.read().await.get(&key).cloned())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
