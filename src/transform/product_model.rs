use crate::lookup::CatalogLookups;
use crate::source::rows::ProductModelRow;
use crate::source::{Row, SourceRecord};
use crate::storage::models::{Aggregate, ModelDescription, ProductModelDocument};
use crate::transform::values::normalize_date;
use crate::transform::TransformOutput;

pub fn transform_product_models(
    rows: &[Row],
    catalog: &CatalogLookups,
) -> TransformOutput<ProductModelDocument> {
    let mut output = TransformOutput::default();

    for row in rows {
        let model = match ProductModelRow::from_row(row) {
            Ok(model) => model,
            Err(e) => {
                output.push_error(Aggregate::ProductModel, e);
                continue;
            }
        };

        output.documents.push(ProductModelDocument {
            id: ProductModelDocument::document_id(model.product_model_id),
            product_model_id: model.product_model_id,
            descriptions: descriptions(model.product_model_id, catalog),
            name: model.name,
            catalog_description: model.catalog_description,
            modified_date: normalize_date(&model.modified_date),
        });
    }

    output
}

// Junction rows whose description is missing are skipped.
fn descriptions(product_model_id: i64, catalog: &CatalogLookups) -> Vec<ModelDescription> {
    catalog
        .model_cultures
        .get(&product_model_id)
        .map(|links| {
            links
                .iter()
                .filter_map(|link| {
                    catalog
                        .descriptions
                        .get(&link.description_id)
                        .map(|text| ModelDescription {
                            culture: link.culture_id.clone(),
                            description: text.clone(),
                        })
                })
                .collect()
        })
        .unwrap_or_default()
}
