#[cfg(test)]
mod integration_tests {
    use std::collections::HashSet;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use crate::error::MigrationError;
    use crate::source::reader::{FIELD_SEPARATOR, RECORD_TERMINATOR};
    use crate::storage::models::Aggregate;
    use crate::storage::{
        Container, DataMigration, DocumentStore, MemoryStore, MockDocumentStore, StoreError,
    };
    use crate::transform::sales_order::UNKNOWN_PRODUCT;
    use crate::utils::{Config, MigrationMetrics};

    const DATE: &str = "2014-09-12 11:15:07.263";

    fn tab(dir: &Path, table: &str, rows: &[&[&str]]) {
        let text: String = rows.iter().map(|r| format!("{}\n", r.join("\t"))).collect();
        std::fs::write(dir.join(format!("{}.csv", table)), text).unwrap();
    }

    fn pipe_text(rows: &[&[&str]]) -> String {
        rows.iter()
            .map(|r| format!("{}{}\n", r.join(FIELD_SEPARATOR), RECORD_TERMINATOR))
            .collect()
    }

    fn pipe(dir: &Path, table: &str, rows: &[&[&str]]) {
        std::fs::write(dir.join(format!("{}.csv", table)), pipe_text(rows)).unwrap();
    }

    fn pipe_utf16(dir: &Path, table: &str, rows: &[&[&str]]) {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in pipe_text(rows).encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        std::fs::write(dir.join(format!("{}.csv", table)), bytes).unwrap();
    }

    /// A small but complete export: one category tree, one product, one
    /// customer with an address and one order with a dangling product line.
    fn write_export(dir: &Path, top_category_id: &str) {
        tab(dir, "ProductCategory", &[&[top_category_id, "Bikes", "guid", "2008-04-30 00:00:00.000"]]);
        tab(
            dir,
            "ProductSubcategory",
            &[&["1", top_category_id, "Mountain Bikes", "guid", "2008-04-30 00:00:00.000"]],
        );
        tab(
            dir,
            "Product",
            &[&[
                "771", "Mountain-100 Silver, 38", "BK-M82S-38", "1", "1", "Silver", "100", "75",
                "1912.1544", "3399.99", "38", "CM ", "LB ", "20.35", "4", "M ", "H ", "U ", "1",
                "19", "2011-05-31 00:00:00.000", "", "", "guid", "2014-02-08 10:01:36.827",
            ]],
        );
        pipe(dir, "ProductDescription", &[&["1", "Top-of-the-line competition bike.", "guid", DATE]]);
        tab(dir, "ProductModelProductDescriptionCulture", &[&["19", "1", "en    ", DATE]]);
        pipe(dir, "ProductModel", &[&["19", "Mountain-100", "", "", "guid", DATE]]);

        tab(
            dir,
            "Customer",
            &[
                &["11000", "1", "", "9", "AW00011000", "guid", DATE],
                &["11001", "", "934", "1", "AW00011001", "guid", DATE],
            ],
        );
        pipe(
            dir,
            "Person",
            &[&["1", "IN", "0", "", "Jon", "V", "Yang", "", "1", "", "", "guid", DATE]],
        );
        pipe(dir, "EmailAddress", &[&["1", "1", "jon24@adventure-works.com", "guid", DATE]]);
        pipe(dir, "Password", &[&["1", "pbFwXWE99vobT6g+vPWFy93NtUU=", "bE3XiWw=", "guid", DATE]]);
        pipe(dir, "PersonPhone", &[&["1", "1 (11) 500 555-0162", "1", DATE]]);
        tab(
            dir,
            "Address",
            &[&["100", "3761 N. 14th St", "", "Rockhampton", "64", "4700", "", "guid", DATE]],
        );
        pipe(dir, "BusinessEntityAddress", &[&["1", "100", "2", "guid", DATE]]);
        tab(dir, "AddressType", &[&["2", "Home", "guid", DATE]]);
        tab(dir, "StateProvince", &[&["64", "QLD", "AU", "0", "Queensland", "9", "guid", DATE]]);
        pipe_utf16(dir, "CountryRegion", &[&["AU", "Australia", DATE]]);

        tab(
            dir,
            "SalesOrderHeader",
            &[&[
                "43659", "8", "2011-05-31 00:00:00.000", "2011-06-12 00:00:00.000",
                "2011-06-07 00:00:00.000", "5", "0", "PO522145787", "10-4020-000676", "11000",
                "279", "5", "100", "100", "5", "16281", "105041Vi84182", "", "20565.6206",
                "1971.5149", "616.0984", "23153.2339", "", "guid", "2011-06-07 00:00:00.000",
            ]],
        );
        tab(
            dir,
            "SalesOrderDetail",
            &[
                &["43659", "1", "4911-403C-98", "1", "771", "1", "2024.994", "0.00", "2024.994", "guid", DATE],
                &["43659", "2", "4911-403C-98", "3", "999", "1", "2039.994", "0.00", "6119.982", "guid", DATE],
            ],
        );
        tab(dir, "ShipMethod", &[&["5", "CARGO TRANSPORT 5", "8.99", "1.49", "guid", DATE]]);
    }

    fn config(source_dir: &Path) -> Config {
        Config {
            source_dir: source_dir.to_path_buf(),
            throttle_retry_ms: 1,
            ..Config::default()
        }
    }

    fn migration(store: Arc<dyn DocumentStore>, source_dir: &Path) -> DataMigration {
        let metrics = Arc::new(MigrationMetrics::new().unwrap());
        DataMigration::new(config(source_dir), store, metrics).dry_run(true)
    }

    #[tokio::test]
    async fn test_full_migration_into_memory_store() {
        let dir = tempfile::tempdir().unwrap();
        write_export(dir.path(), "1");
        let store = Arc::new(MemoryStore::new());

        let report = migration(store.clone(), dir.path()).run().await.unwrap();

        assert!(report.is_clean(), "{}", report.render());
        assert_eq!(report.documents_written(), 6);
        assert_eq!(store.count(Container::Products).await, 4);
        assert_eq!(store.count(Container::Customers).await, 2);

        let bikes = store
            .read(Container::Products, "category-1", "category-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(bikes["type"], "category");
        assert!(bikes["parentCategoryId"].is_null());

        let mountain = store
            .read(Container::Products, "category-101", "category-101")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(mountain["name"], "Mountain Bikes");
        assert_eq!(mountain["parentCategoryId"], 1);
        assert_eq!(mountain["parentCategoryName"], "Bikes");

        let product = store
            .read(Container::Products, "product-771", "product-771")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product["categoryId"], 101);
        assert_eq!(product["categoryName"], mountain["name"]);
        assert_eq!(product["parentCategoryName"], "Bikes");
        assert_eq!(product["productModelName"], "Mountain-100");

        let model = store
            .read(Container::Products, "model-19", "model-19")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(model["descriptions"][0]["culture"], "en");
        assert!(model["catalogDescription"].is_null());
    }

    #[tokio::test]
    async fn test_customer_and_order_documents() {
        let dir = tempfile::tempdir().unwrap();
        write_export(dir.path(), "1");
        let store = Arc::new(MemoryStore::new());

        migration(store.clone(), dir.path()).run().await.unwrap();

        // customer 11001 has no person record and is not migrated
        assert!(store
            .read(Container::Customers, "11001", "11001")
            .await
            .unwrap()
            .is_none());

        let customer = store
            .read(Container::Customers, "11000", "11000")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(customer["type"], "customer");
        assert_eq!(customer["emailAddress"], "jon24@adventure-works.com");
        assert_eq!(customer["addresses"][0]["addressType"], "Home");
        assert_eq!(customer["addresses"][0]["countryRegion"], "Australia");
        assert_eq!(customer["addresses"][0]["stateProvince"], "Queensland");

        let order = store
            .read(Container::Customers, "order-43659", "11000")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order["type"], "salesOrder");
        assert_eq!(order["salesOrderNumber"], "SO43659");
        assert_eq!(order["customerName"], "Jon Yang");
        assert_eq!(order["shipMethod"], "CARGO TRANSPORT 5");
        assert_eq!(order["orderDate"], "2011-05-31T00:00:00.000Z");
        assert_eq!(order["totalDue"], 23153.2339);
        assert_eq!(order["billToAddress"]["city"], "Rockhampton");
        assert_eq!(order["lineItems"][0]["productName"], "Mountain-100 Silver, 38");
        assert_eq!(order["lineItems"][1]["productName"], UNKNOWN_PRODUCT);
        assert_eq!(order["lineItems"][1]["orderQty"], 3);
    }

    #[tokio::test]
    async fn test_rerun_overwrites_instead_of_duplicating() {
        let dir = tempfile::tempdir().unwrap();
        write_export(dir.path(), "1");
        let store = Arc::new(MemoryStore::new());

        let first = migration(store.clone(), dir.path()).run().await.unwrap();
        let before = store.len().await;
        let second = migration(store.clone(), dir.path()).run().await.unwrap();

        assert_eq!(store.len().await, before);
        assert_eq!(second.documents_written(), first.documents_written());
        assert_eq!(second.write_failures(), 0);
    }

    #[tokio::test]
    async fn test_category_offset_violation_stops_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        write_export(dir.path(), "100");
        let store = Arc::new(MemoryStore::new());

        let err = migration(store.clone(), dir.path()).run().await.unwrap_err();

        assert!(matches!(
            err,
            MigrationError::CategoryOffset {
                offset: 100,
                max_category_id: 100
            }
        ));
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_throttled_writes_are_retried_once() {
        let dir = tempfile::tempdir().unwrap();
        write_export(dir.path(), "1");

        let throttled_once = Arc::new(Mutex::new(HashSet::new()));
        let mut store = MockDocumentStore::new();
        store.expect_ping().returning(|| Ok(()));
        store.expect_upsert().returning(move |_, _, document| {
            if throttled_once.lock().unwrap().insert(document.id().to_string()) {
                Err(StoreError::Throttled {
                    retry_after: Some(Duration::from_millis(1)),
                })
            } else {
                Ok(())
            }
        });
        store
            .expect_read()
            .returning(|_, _, _| Ok(Some(serde_json::json!({}))));

        let report = migration(Arc::new(store), dir.path()).run().await.unwrap();

        assert_eq!(report.documents_written(), 6);
        assert_eq!(report.write_failures(), 0);
        assert_eq!(report.throttle_retries(), 6);
        assert_eq!(report.aggregates[&Aggregate::SalesOrder].written, 1);
    }
}
