//! Row → document transforms, one per aggregate.
//!
//! Transforms are independent of each other; each takes exactly the lookups
//! it joins against. A row that cannot be parsed becomes a `RecordError`
//! and the walk continues.

pub mod address;
pub mod category;
pub mod customer;
pub mod product;
pub mod product_model;
pub mod sales_order;
pub mod values;

pub use category::{check_category_offset, transform_categories};
pub use customer::transform_customers;
pub use product::transform_products;
pub use product_model::transform_product_models;
pub use sales_order::transform_sales_orders;

use std::fmt;

use crate::error::RowError;
use crate::lookup::Lookups;
use crate::source::{SourceData, SourceTable};
use crate::storage::models::{Aggregate, Document};

/// A source record that did not produce a document.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordError {
    pub record: String,
    pub message: String,
}

impl From<RowError> for RecordError {
    fn from(err: RowError) -> Self {
        let record = match &err {
            RowError::ColumnCount { table, record, .. }
            | RowError::InvalidInteger { table, record, .. } => format!("{} record {}", table, record),
        };
        Self {
            record,
            message: err.to_string(),
        }
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.record, self.message)
    }
}

#[derive(Debug)]
pub struct TransformOutput<D> {
    pub documents: Vec<D>,
    pub errors: Vec<RecordError>,
}

impl<D> Default for TransformOutput<D> {
    fn default() -> Self {
        Self {
            documents: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl<D> TransformOutput<D> {
    pub fn push_error(&mut self, aggregate: Aggregate, error: impl Into<RecordError>) {
        let error = error.into();
        tracing::warn!(aggregate = %aggregate, record = %error.record, error = %error.message, "Transform failed");
        self.errors.push(error);
    }

    pub fn into_documents(self, wrap: fn(D) -> Document) -> TransformOutput<Document> {
        TransformOutput {
            documents: self.documents.into_iter().map(wrap).collect(),
            errors: self.errors,
        }
    }
}

/// Run all five transforms. The order carries no meaning.
pub fn transform_all(data: &SourceData, lookups: &Lookups) -> Vec<(Aggregate, TransformOutput<Document>)> {
    vec![
        (
            Aggregate::Category,
            transform_categories(
                data.rows(SourceTable::ProductCategory),
                data.rows(SourceTable::ProductSubcategory),
                &lookups.catalog,
            )
            .into_documents(Document::Category),
        ),
        (
            Aggregate::ProductModel,
            transform_product_models(data.rows(SourceTable::ProductModel), &lookups.catalog)
                .into_documents(Document::ProductModel),
        ),
        (
            Aggregate::Product,
            transform_products(data.rows(SourceTable::Product), &lookups.catalog)
                .into_documents(Document::Product),
        ),
        (
            Aggregate::Customer,
            transform_customers(&lookups.customers).into_documents(Document::Customer),
        ),
        (
            Aggregate::SalesOrder,
            transform_sales_orders(
                data.rows(SourceTable::SalesOrderHeader),
                &lookups.catalog,
                &lookups.customers,
                &lookups.sales,
            )
            .into_documents(Document::SalesOrder),
        ),
    ]
}
