use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::MigrationError;
use crate::storage::models::Aggregate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Upsert fan-out per batch. Larger aggregates get smaller batches.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BatchSizes {
    pub category: usize,
    pub product_model: usize,
    pub product: usize,
    pub customer: usize,
    pub sales_order: usize,
}

impl Default for BatchSizes {
    fn default() -> Self {
        Self {
            category: 100,
            product_model: 100,
            product: 100,
            customer: 50,
            sales_order: 25,
        }
    }
}

impl BatchSizes {
    pub fn for_aggregate(&self, aggregate: Aggregate) -> usize {
        let size = match aggregate {
            Aggregate::Category => self.category,
            Aggregate::ProductModel => self.product_model,
            Aggregate::Product => self.product,
            Aggregate::Customer => self.customer,
            Aggregate::SalesOrder => self.sales_order,
        };
        size.max(1)
    }
}

/// Migration settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source_dir: PathBuf,
    pub aws_region: Option<String>,
    /// Endpoint override, e.g. a local DynamoDB.
    pub dynamodb_endpoint: Option<String>,
    pub products_table: String,
    pub customers_table: String,
    /// Delay before the single retry when the destination gives no hint.
    pub throttle_retry_ms: u64,
    pub batch_sizes: BatchSizes,
    /// Documents per aggregate point-read after loading; 0 disables.
    pub verify_sample: usize,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("data"),
            aws_region: None,
            dynamodb_endpoint: None,
            products_table: "products".to_string(),
            customers_table: "customers".to_string(),
            throttle_retry_ms: 1000,
            batch_sizes: BatchSizes::default(),
            verify_sample: 5,
            log_format: LogFormat::Text,
        }
    }
}

impl Config {
    /// Load config: defaults, then the optional TOML file, then `MIGRATE_*`
    /// environment variables (`__` separates nested keys).
    pub fn load(file: &Path) -> Result<Self, MigrationError> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::from(file).required(false))
            .add_source(
                config::Environment::with_prefix("MIGRATE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn throttle_retry(&self) -> Duration {
        Duration::from_millis(self.throttle_retry_ms)
    }
}
