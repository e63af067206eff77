use crate::error::MigrationError;
use crate::lookup::CatalogLookups;
use crate::source::rows::{CategoryRow, SubcategoryRow};
use crate::source::{Row, SourceRecord};
use crate::storage::models::{Aggregate, CategoryDocument};
use crate::transform::values::normalize_date;
use crate::transform::TransformOutput;

/// Subcategories share the id space of top-level categories; their document
/// ids are shifted by this amount.
pub const SUBCATEGORY_ID_OFFSET: i64 = 100;

/// Category id of a subcategory. Product documents link through the same id.
pub fn subcategory_category_id(subcategory_id: i64) -> i64 {
    subcategory_id + SUBCATEGORY_ID_OFFSET
}

/// Fails when a shifted subcategory id could collide with a top-level id.
pub fn check_category_offset(catalog: &CatalogLookups) -> Result<(), MigrationError> {
    match catalog.max_category_id() {
        Some(max) if max >= SUBCATEGORY_ID_OFFSET => Err(MigrationError::CategoryOffset {
            offset: SUBCATEGORY_ID_OFFSET,
            max_category_id: max,
        }),
        _ => Ok(()),
    }
}

pub fn transform_categories(
    category_rows: &[Row],
    subcategory_rows: &[Row],
    catalog: &CatalogLookups,
) -> TransformOutput<CategoryDocument> {
    let mut output = TransformOutput::default();

    for row in category_rows {
        match CategoryRow::from_row(row) {
            Ok(category) => output.documents.push(CategoryDocument {
                id: CategoryDocument::document_id(category.category_id),
                category_id: category.category_id,
                name: category.name,
                parent_category_id: None,
                parent_category_name: None,
                modified_date: normalize_date(&category.modified_date),
            }),
            Err(e) => output.push_error(Aggregate::Category, e),
        }
    }

    for row in subcategory_rows {
        match SubcategoryRow::from_row(row) {
            Ok(sub) => {
                let category_id = subcategory_category_id(sub.subcategory_id);
                let parent_name = catalog
                    .categories
                    .get(&sub.category_id)
                    .map(|parent| parent.name.clone());
                output.documents.push(CategoryDocument {
                    id: CategoryDocument::document_id(category_id),
                    category_id,
                    name: sub.name,
                    parent_category_id: Some(sub.category_id),
                    parent_category_name: parent_name,
                    modified_date: normalize_date(&sub.modified_date),
                });
            }
            Err(e) => output.push_error(Aggregate::Category, e),
        }
    }

    output
}
