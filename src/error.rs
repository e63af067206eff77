use std::path::PathBuf;
use thiserror::Error;

use crate::source::SourceTable;

/// Fatal errors. Any of these stops the run before the first write.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("source directory not found: {0}")]
    SourceDirMissing(PathBuf),

    #[error("source file for {table} not found: {path}")]
    SourceFileMissing { table: SourceTable, path: PathBuf },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid text: {reason}")]
    Encoding { path: PathBuf, reason: String },

    #[error(
        "subcategory id offset {offset} must exceed the largest top-level category id ({max_category_id})"
    )]
    CategoryOffset { offset: i64, max_category_id: i64 },

    #[error("destination unavailable: {0}")]
    Destination(String),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

/// A source row that does not satisfy its table's column contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("{table} record {record}: expected {expected} columns, found {found}")]
    ColumnCount {
        table: SourceTable,
        record: usize,
        expected: usize,
        found: usize,
    },

    #[error("{table} record {record}: column {column} is not an integer: {value:?}")]
    InvalidInteger {
        table: SourceTable,
        record: usize,
        column: usize,
        value: String,
    },
}

impl RowError {
    pub fn table(&self) -> SourceTable {
        match self {
            RowError::ColumnCount { table, .. } | RowError::InvalidInteger { table, .. } => *table,
        }
    }
}
