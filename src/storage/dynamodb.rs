use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_dynamodb::config::retry::RetryConfig;
use aws_sdk_dynamodb::config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use serde_json::Value;
use std::collections::HashMap;

use crate::storage::models::{Container, Document};
use crate::storage::{DocumentStore, StoreError};
use crate::utils::Config;

const THROTTLE_CODES: [&str; 3] = [
    "ProvisionedThroughputExceededException",
    "RequestLimitExceeded",
    "ThrottlingException",
];

/// Document store backed by the products and customers tables.
pub struct DynamoDBStore {
    client: Client,
    products_table: String,
    customers_table: String,
}

impl DynamoDBStore {
    pub async fn new(config: &Config) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.aws_region {
            loader = loader.region(Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;

        Self {
            client: Client::from_conf(client_config(&sdk_config, config)),
            products_table: config.products_table.clone(),
            customers_table: config.customers_table.clone(),
        }
    }

    fn table_name(&self, container: Container) -> &str {
        match container {
            Container::Products => &self.products_table,
            Container::Customers => &self.customers_table,
        }
    }

    fn key(container: Container, id: &str, partition_key: &str) -> HashMap<String, AttributeValue> {
        let mut key = HashMap::new();
        key.insert(
            container.partition_key_attribute().to_string(),
            AttributeValue::S(partition_key.to_string()),
        );
        if let Some(sort_key) = container.sort_key_attribute() {
            key.insert(sort_key.to_string(), AttributeValue::S(id.to_string()));
        }
        key
    }
}

/// SDK retries are switched off; the bulk loader owns the throttle retry.
fn client_config(sdk_config: &SdkConfig, config: &Config) -> aws_sdk_dynamodb::Config {
    let mut builder = aws_sdk_dynamodb::config::Builder::from(sdk_config)
        .retry_config(RetryConfig::disabled());
    if let Some(endpoint) = &config.dynamodb_endpoint {
        tracing::info!(endpoint = %endpoint, "Using DynamoDB endpoint override");
        builder = builder.endpoint_url(endpoint);
    }
    builder.build()
}

#[async_trait]
impl DocumentStore for DynamoDBStore {
    async fn upsert(
        &self,
        container: Container,
        partition_key: &str,
        document: &Document,
    ) -> Result<(), StoreError> {
        let mut item = document_to_item(document)?;
        item.insert(
            container.partition_key_attribute().to_string(),
            AttributeValue::S(partition_key.to_string()),
        );

        self.client
            .put_item()
            .table_name(self.table_name(container))
            .set_item(Some(item))
            .send()
            .await
            .map_err(classify)?;

        Ok(())
    }

    async fn read(
        &self,
        container: Container,
        id: &str,
        partition_key: &str,
    ) -> Result<Option<Value>, StoreError> {
        let response = self
            .client
            .get_item()
            .table_name(self.table_name(container))
            .set_key(Some(Self::key(container, id, partition_key)))
            .send()
            .await
            .map_err(classify)?;

        Ok(response.item.map(|item| item_to_json(&item)))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        for table in [&self.products_table, &self.customers_table] {
            self.client
                .describe_table()
                .table_name(table)
                .send()
                .await
                .map_err(|e| {
                    StoreError::Unavailable(format!("{}: {}", table, DisplayErrorContext(&e)))
                })?;
        }
        Ok(())
    }
}

fn classify<E, R>(err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    if let Some(code) = err.code() {
        if THROTTLE_CODES.contains(&code) {
            // DynamoDB does not suggest a delay; the loader falls back to its own.
            return StoreError::Throttled { retry_after: None };
        }
    }

    match err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => {
            StoreError::Unavailable(DisplayErrorContext(&err).to_string())
        }
        other => StoreError::Rejected(DisplayErrorContext(&other).to_string()),
    }
}

pub fn document_to_item(document: &Document) -> Result<HashMap<String, AttributeValue>, StoreError> {
    match document.to_json()? {
        Value::Object(map) => Ok(map
            .iter()
            .map(|(k, v)| (k.clone(), json_to_attribute(v)))
            .collect()),
        _ => Err(StoreError::Rejected(format!(
            "document {} did not serialize to an object",
            document.id()
        ))),
    }
}

pub fn json_to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(json_to_attribute).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_attribute(v)))
                .collect(),
        ),
    }
}

pub fn item_to_json(item: &HashMap<String, AttributeValue>) -> Value {
    Value::Object(
        item.iter()
            .map(|(k, v)| (k.clone(), attribute_to_json(v)))
            .collect(),
    )
}

fn attribute_to_json(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => number(n),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::L(items) => Value::Array(items.iter().map(attribute_to_json).collect()),
        AttributeValue::M(map) => item_to_json(map),
        AttributeValue::Ss(items) => Value::Array(items.iter().cloned().map(Value::String).collect()),
        AttributeValue::Ns(items) => Value::Array(items.iter().map(|n| number(n)).collect()),
        _ => Value::Null,
    }
}

fn number(n: &str) -> Value {
    n.parse::<serde_json::Number>()
        .map(Value::Number)
        .unwrap_or_else(|_| Value::String(n.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::CategoryDocument;
    use serde_json::json;

    #[test]
    fn test_document_to_item_keeps_nulls_and_discriminator() {
        let doc = Document::Category(CategoryDocument {
            id: "category-1".to_string(),
            category_id: 1,
            name: "Bikes".to_string(),
            parent_category_id: None,
            parent_category_name: None,
            modified_date: "2008-04-30T00:00:00.000Z".to_string(),
        });

        let item = document_to_item(&doc).unwrap();
        assert_eq!(item["type"], AttributeValue::S("category".to_string()));
        assert_eq!(item["categoryId"], AttributeValue::N("1".to_string()));
        assert_eq!(item["parentCategoryId"], AttributeValue::Null(true));
    }

    #[test]
    fn test_nested_values_convert_both_ways() {
        let value = json!({
            "id": "order-43659",
            "subTotal": 20565.6206,
            "onlineOrder": false,
            "lineItems": [{"productName": "Unknown", "orderQty": 1}],
            "shipDate": null,
        });

        let attribute = json_to_attribute(&value);
        let AttributeValue::M(item) = attribute else {
            panic!("expected a map");
        };
        assert_eq!(item_to_json(&item), value);
    }

    #[test]
    fn test_client_makes_a_single_attempt() {
        let sdk_config = SdkConfig::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("eu-west-1"))
            .retry_config(RetryConfig::standard())
            .build();
        let config = Config {
            dynamodb_endpoint: Some("http://localhost:8000".to_string()),
            ..Config::default()
        };

        let client_config = client_config(&sdk_config, &config);

        let retry = client_config.retry_config().unwrap();
        assert_eq!(retry.max_attempts(), 1);
    }

    #[test]
    fn test_customer_key_includes_sort_key() {
        let key = DynamoDBStore::key(Container::Customers, "order-1", "29825");
        assert_eq!(key["customerId"], AttributeValue::S("29825".to_string()));
        assert_eq!(key["id"], AttributeValue::S("order-1".to_string()));

        let key = DynamoDBStore::key(Container::Products, "product-1", "product-1");
        assert_eq!(key.len(), 1);
    }
}
