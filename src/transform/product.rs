use crate::lookup::CatalogLookups;
use crate::source::rows::ProductRow;
use crate::source::{Row, SourceRecord};
use crate::storage::models::{Aggregate, ProductDocument};
use crate::transform::category::subcategory_category_id;
use crate::transform::values::{decimal, flag, integer, normalize_date, optional_date, optional_decimal};
use crate::transform::TransformOutput;

struct CategoryLink {
    category_id: Option<i64>,
    category_name: Option<String>,
    parent_category_name: Option<String>,
}

fn resolve_category(subcategory_id: Option<i64>, catalog: &CatalogLookups) -> CategoryLink {
    let Some(subcategory_id) = subcategory_id else {
        return CategoryLink {
            category_id: None,
            category_name: None,
            parent_category_name: None,
        };
    };

    let subcategory = catalog.subcategories.get(&subcategory_id);
    CategoryLink {
        category_id: Some(subcategory_category_id(subcategory_id)),
        category_name: subcategory.map(|s| s.name.clone()),
        parent_category_name: subcategory
            .and_then(|s| catalog.categories.get(&s.category_id))
            .map(|c| c.name.clone()),
    }
}

pub fn transform_products(rows: &[Row], catalog: &CatalogLookups) -> TransformOutput<ProductDocument> {
    let mut output = TransformOutput::default();

    for row in rows {
        let product = match ProductRow::from_row(row) {
            Ok(product) => product,
            Err(e) => {
                output.push_error(Aggregate::Product, e);
                continue;
            }
        };

        let category = resolve_category(product.subcategory_id, catalog);
        let model_name = product
            .product_model_id
            .and_then(|id| catalog.models.get(&id))
            .map(|m| m.name.clone());

        output.documents.push(ProductDocument {
            id: ProductDocument::document_id(product.product_id),
            product_id: product.product_id,
            name: product.name,
            product_number: product.product_number,
            make_flag: flag(&product.make_flag),
            finished_goods_flag: flag(&product.finished_goods_flag),
            color: product.color,
            safety_stock_level: integer(&product.safety_stock_level),
            reorder_point: integer(&product.reorder_point),
            standard_cost: decimal(&product.standard_cost),
            list_price: decimal(&product.list_price),
            size: product.size,
            size_unit_measure_code: product.size_unit,
            weight_unit_measure_code: product.weight_unit,
            weight: optional_decimal(Some(&product.weight)),
            days_to_manufacture: integer(&product.days_to_manufacture),
            product_line: product.product_line,
            class: product.class,
            style: product.style,
            category_id: category.category_id,
            category_name: category.category_name,
            parent_category_name: category.parent_category_name,
            product_model_id: product.product_model_id,
            product_model_name: model_name,
            sell_start_date: normalize_date(&product.sell_start_date),
            sell_end_date: optional_date(product.sell_end_date.as_deref()),
            discontinued_date: optional_date(product.discontinued_date.as_deref()),
            modified_date: normalize_date(&product.modified_date),
        });
    }

    output
}
