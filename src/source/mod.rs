pub mod reader;
pub mod rows;

pub use reader::{read_rows, Dialect, Row};
pub use rows::{parse_rows, SourceRecord};

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::error::MigrationError;

/// Every flat file the export produces, one per source table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceTable {
    ProductCategory,
    ProductSubcategory,
    Product,
    ProductDescription,
    ProductModelProductDescriptionCulture,
    ProductModel,
    Customer,
    Person,
    EmailAddress,
    Password,
    PersonPhone,
    Address,
    BusinessEntityAddress,
    AddressType,
    StateProvince,
    CountryRegion,
    SalesOrderHeader,
    SalesOrderDetail,
    ShipMethod,
}

impl SourceTable {
    pub const ALL: [SourceTable; 19] = [
        SourceTable::ProductCategory,
        SourceTable::ProductSubcategory,
        SourceTable::Product,
        SourceTable::ProductDescription,
        SourceTable::ProductModelProductDescriptionCulture,
        SourceTable::ProductModel,
        SourceTable::Customer,
        SourceTable::Person,
        SourceTable::EmailAddress,
        SourceTable::Password,
        SourceTable::PersonPhone,
        SourceTable::Address,
        SourceTable::BusinessEntityAddress,
        SourceTable::AddressType,
        SourceTable::StateProvince,
        SourceTable::CountryRegion,
        SourceTable::SalesOrderHeader,
        SourceTable::SalesOrderDetail,
        SourceTable::ShipMethod,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SourceTable::ProductCategory => "ProductCategory",
            SourceTable::ProductSubcategory => "ProductSubcategory",
            SourceTable::Product => "Product",
            SourceTable::ProductDescription => "ProductDescription",
            SourceTable::ProductModelProductDescriptionCulture => {
                "ProductModelProductDescriptionCulture"
            }
            SourceTable::ProductModel => "ProductModel",
            SourceTable::Customer => "Customer",
            SourceTable::Person => "Person",
            SourceTable::EmailAddress => "EmailAddress",
            SourceTable::Password => "Password",
            SourceTable::PersonPhone => "PersonPhone",
            SourceTable::Address => "Address",
            SourceTable::BusinessEntityAddress => "BusinessEntityAddress",
            SourceTable::AddressType => "AddressType",
            SourceTable::StateProvince => "StateProvince",
            SourceTable::CountryRegion => "CountryRegion",
            SourceTable::SalesOrderHeader => "SalesOrderHeader",
            SourceTable::SalesOrderDetail => "SalesOrderDetail",
            SourceTable::ShipMethod => "ShipMethod",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.csv", self.name())
    }

    /// Person-schema tables and the free-text catalog tables are exported with
    /// the pipe dialect; everything else is tab separated.
    pub fn dialect(&self) -> Dialect {
        match self {
            SourceTable::Person
            | SourceTable::EmailAddress
            | SourceTable::Password
            | SourceTable::PersonPhone
            | SourceTable::BusinessEntityAddress
            | SourceTable::CountryRegion
            | SourceTable::ProductDescription
            | SourceTable::ProductModel => Dialect::Pipe,
            _ => Dialect::Tab,
        }
    }
}

impl fmt::Display for SourceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw rows of every source table, in file order.
#[derive(Debug, Default)]
pub struct SourceData {
    tables: HashMap<SourceTable, Vec<Row>>,
}

impl SourceData {
    pub fn insert(&mut self, table: SourceTable, rows: Vec<Row>) {
        self.tables.insert(table, rows);
    }

    /// Rows of `table`; empty when the table was never loaded.
    pub fn rows(&self, table: SourceTable) -> &[Row] {
        self.tables.get(&table).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn row_counts(&self) -> Vec<(SourceTable, usize)> {
        let mut counts: Vec<_> = self
            .tables
            .iter()
            .map(|(table, rows)| (*table, rows.len()))
            .collect();
        counts.sort();
        counts
    }

    pub fn total_rows(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }
}

/// Read every source table from `dir`. A missing directory or file is fatal.
pub async fn load_sources(dir: &Path) -> Result<SourceData, MigrationError> {
    if !tokio::fs::metadata(dir)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
    {
        return Err(MigrationError::SourceDirMissing(dir.to_path_buf()));
    }

    let mut data = SourceData::default();
    for table in SourceTable::ALL {
        let path = dir.join(table.file_name());
        let rows = read_rows(&path, table.dialect()).await.map_err(|e| match e {
            MigrationError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                MigrationError::SourceFileMissing {
                    table,
                    path: path.clone(),
                }
            }
            other => other,
        })?;
        tracing::info!(table = %table, rows = rows.len(), "Read source table");
        data.insert(table, rows);
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let err = load_sources(&missing).await.unwrap_err();
        assert!(matches!(err, MigrationError::SourceDirMissing(_)));
    }

    #[tokio::test]
    async fn test_missing_file_names_the_table() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ProductCategory.csv"), "1\tBikes\tg\t2008-04-30\n")
            .unwrap();

        let err = load_sources(dir.path()).await.unwrap_err();
        match err {
            MigrationError::SourceFileMissing { table, .. } => {
                assert_eq!(table, SourceTable::ProductSubcategory)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_file_names_and_dialects() {
        assert_eq!(SourceTable::Person.file_name(), "Person.csv");
        assert_eq!(SourceTable::Person.dialect(), Dialect::Pipe);
        assert_eq!(SourceTable::SalesOrderDetail.dialect(), Dialect::Tab);
    }
}
