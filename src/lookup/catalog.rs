use std::collections::HashMap;

use super::{group_by, index_by, parse_primary, parse_table, DuplicatePolicy};
use crate::error::RowError;
use crate::source::rows::{
    CategoryRow, DescriptionRow, ModelCultureRow, ProductModelRow, ProductRow, SubcategoryRow,
};
use crate::source::SourceData;

#[derive(Debug, Default)]
pub struct CatalogLookups {
    /// Top-level categories by ProductCategoryID.
    pub categories: HashMap<i64, CategoryRow>,
    pub subcategories: HashMap<i64, SubcategoryRow>,
    pub models: HashMap<i64, ProductModelRow>,
    /// Description text by ProductDescriptionID.
    pub descriptions: HashMap<i64, String>,
    /// Culture junction rows grouped by ProductModelID.
    pub model_cultures: HashMap<i64, Vec<ModelCultureRow>>,
    pub product_names: HashMap<i64, String>,
}

impl CatalogLookups {
    pub fn build(data: &SourceData, rejected: &mut Vec<RowError>) -> Self {
        let categories = index_by(
            parse_primary::<CategoryRow>(data),
            DuplicatePolicy::LastWins,
            |c| c.category_id,
            |c| c,
        );
        let subcategories = index_by(
            parse_primary::<SubcategoryRow>(data),
            DuplicatePolicy::LastWins,
            |s| s.subcategory_id,
            |s| s,
        );
        let models = index_by(
            parse_primary::<ProductModelRow>(data),
            DuplicatePolicy::LastWins,
            |m| m.product_model_id,
            |m| m,
        );
        let product_names = index_by(
            parse_primary::<ProductRow>(data),
            DuplicatePolicy::LastWins,
            |p| p.product_id,
            |p| p.name,
        );
        let descriptions = index_by(
            parse_table::<DescriptionRow>(data, rejected),
            DuplicatePolicy::LastWins,
            |d| d.description_id,
            |d| d.description,
        );
        let model_cultures = group_by(
            parse_table::<ModelCultureRow>(data, rejected),
            |c| c.product_model_id,
        );

        tracing::debug!(
            categories = categories.len(),
            subcategories = subcategories.len(),
            models = models.len(),
            descriptions = descriptions.len(),
            products = product_names.len(),
            "Built catalog lookups"
        );

        Self {
            categories,
            subcategories,
            models,
            descriptions,
            model_cultures,
            product_names,
        }
    }

    pub fn max_category_id(&self) -> Option<i64> {
        self.categories.keys().copied().max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::reader::{parse_pipe, parse_tab};
    use crate::source::SourceTable;

    #[test]
    fn test_catalog_lookups() {
        let mut data = SourceData::default();
        data.insert(
            SourceTable::ProductCategory,
            parse_tab("1\tBikes\tg\t2008-04-30\n4\tAccessories\tg\t2008-04-30\n"),
        );
        data.insert(
            SourceTable::ProductDescription,
            parse_pipe("1199+|Light-weight frame+|g+|2013-04-30&|\n1200+|broken&|\n"),
        );
        data.insert(
            SourceTable::ProductModelProductDescriptionCulture,
            parse_tab("1\t1199\ten    \t2013-04-30\n1\t1200\tfr    \t2013-04-30\n"),
        );

        let mut rejected = Vec::new();
        let lookups = CatalogLookups::build(&data, &mut rejected);

        assert_eq!(lookups.categories[&1].name, "Bikes");
        assert_eq!(lookups.max_category_id(), Some(4));
        assert_eq!(lookups.descriptions[&1199], "Light-weight frame");
        assert_eq!(lookups.model_cultures[&1].len(), 2);
        assert_eq!(rejected.len(), 1);
        assert!(lookups.product_names.is_empty());
    }
}
