use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical DynamoDB table a document lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Container {
    Products,
    Customers,
}

impl Container {
    /// Attribute holding the partition key.
    pub fn partition_key_attribute(&self) -> &'static str {
        match self {
            Container::Products => "id",
            Container::Customers => "customerId",
        }
    }

    /// Sort key attribute, when the table has one.
    pub fn sort_key_attribute(&self) -> Option<&'static str> {
        match self {
            Container::Products => None,
            Container::Customers => Some("id"),
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Container::Products => f.write_str("products"),
            Container::Customers => f.write_str("customers"),
        }
    }
}

/// The five aggregate types written by the migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Aggregate {
    Category,
    ProductModel,
    Product,
    Customer,
    SalesOrder,
}

impl Aggregate {
    pub const ALL: [Aggregate; 5] = [
        Aggregate::Category,
        Aggregate::ProductModel,
        Aggregate::Product,
        Aggregate::Customer,
        Aggregate::SalesOrder,
    ];

    /// Discriminator value stored in the `type` field.
    pub fn discriminator(&self) -> &'static str {
        match self {
            Aggregate::Category => "category",
            Aggregate::ProductModel => "productModel",
            Aggregate::Product => "product",
            Aggregate::Customer => "customer",
            Aggregate::SalesOrder => "salesOrder",
        }
    }

    pub fn container(&self) -> Container {
        match self {
            Aggregate::Category | Aggregate::ProductModel | Aggregate::Product => {
                Container::Products
            }
            Aggregate::Customer | Aggregate::SalesOrder => Container::Customers,
        }
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.discriminator())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDocument {
    pub id: String,
    pub category_id: i64,
    pub name: String,
    pub parent_category_id: Option<i64>,
    pub parent_category_name: Option<String>,
    pub modified_date: String,
}

impl CategoryDocument {
    pub fn document_id(category_id: i64) -> String {
        format!("category-{}", category_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescription {
    pub culture: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductModelDocument {
    pub id: String,
    pub product_model_id: i64,
    pub name: String,
    pub catalog_description: Option<String>,
    pub descriptions: Vec<ModelDescription>,
    pub modified_date: String,
}

impl ProductModelDocument {
    pub fn document_id(product_model_id: i64) -> String {
        format!("model-{}", product_model_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDocument {
    pub id: String,
    pub product_id: i64,
    pub name: String,
    pub product_number: String,
    pub make_flag: bool,
    pub finished_goods_flag: bool,
    pub color: Option<String>,
    pub safety_stock_level: i64,
    pub reorder_point: i64,
    pub standard_cost: f64,
    pub list_price: f64,
    pub size: Option<String>,
    pub size_unit_measure_code: Option<String>,
    pub weight_unit_measure_code: Option<String>,
    pub weight: Option<f64>,
    pub days_to_manufacture: i64,
    pub product_line: Option<String>,
    pub class: Option<String>,
    pub style: Option<String>,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub parent_category_name: Option<String>,
    pub product_model_id: Option<i64>,
    pub product_model_name: Option<String>,
    pub sell_start_date: String,
    pub sell_end_date: Option<String>,
    pub discontinued_date: Option<String>,
    pub modified_date: String,
}

impl ProductDocument {
    pub fn document_id(product_id: i64) -> String {
        format!("product-{}", product_id)
    }
}

/// Address frozen into a customer or order document at migration time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSnapshot {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub address_type: Option<String>,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state_province: Option<String>,
    pub state_province_code: Option<String>,
    pub country_region: Option<String>,
    pub country_region_code: Option<String>,
    pub postal_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDocument {
    /// Equal to `customer_id`; the document is its own partition.
    pub id: String,
    pub customer_id: String,
    pub account_number: String,
    pub person_type: Option<String>,
    pub title: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub suffix: Option<String>,
    pub email_address: Option<String>,
    pub email_promotion: Option<i64>,
    pub phone_number: Option<String>,
    pub password_hash: Option<String>,
    pub password_salt: Option<String>,
    pub addresses: Vec<AddressSnapshot>,
    pub modified_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub sales_order_detail_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub carrier_tracking_number: Option<String>,
    pub order_qty: i64,
    pub unit_price: f64,
    pub unit_price_discount: f64,
    pub line_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrderDocument {
    pub id: String,
    pub customer_id: String,
    pub sales_order_id: i64,
    pub sales_order_number: String,
    pub revision_number: i64,
    pub order_date: String,
    pub due_date: String,
    pub ship_date: Option<String>,
    pub status: i64,
    pub online_order: bool,
    pub purchase_order_number: Option<String>,
    pub account_number: Option<String>,
    pub customer_name: Option<String>,
    pub ship_method: Option<String>,
    pub bill_to_address: Option<AddressSnapshot>,
    pub ship_to_address: Option<AddressSnapshot>,
    pub sub_total: f64,
    pub tax_amount: f64,
    pub freight: f64,
    pub total_due: f64,
    pub comment: Option<String>,
    pub line_items: Vec<LineItem>,
    pub modified_date: String,
}

impl SalesOrderDocument {
    pub fn document_id(sales_order_id: i64) -> String {
        format!("order-{}", sales_order_id)
    }

    pub fn order_number(sales_order_id: i64) -> String {
        format!("SO{}", sales_order_id)
    }
}

/// Any document the migration writes. The `type` field is the discriminator
/// shared by every aggregate living in the same container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Document {
    Category(CategoryDocument),
    ProductModel(ProductModelDocument),
    Product(ProductDocument),
    Customer(CustomerDocument),
    SalesOrder(SalesOrderDocument),
}

impl Document {
    pub fn id(&self) -> &str {
        match self {
            Document::Category(d) => &d.id,
            Document::ProductModel(d) => &d.id,
            Document::Product(d) => &d.id,
            Document::Customer(d) => &d.id,
            Document::SalesOrder(d) => &d.id,
        }
    }

    pub fn aggregate(&self) -> Aggregate {
        match self {
            Document::Category(_) => Aggregate::Category,
            Document::ProductModel(_) => Aggregate::ProductModel,
            Document::Product(_) => Aggregate::Product,
            Document::Customer(_) => Aggregate::Customer,
            Document::SalesOrder(_) => Aggregate::SalesOrder,
        }
    }

    pub fn container(&self) -> Container {
        self.aggregate().container()
    }

    pub fn partition_key(&self) -> String {
        match self {
            Document::Customer(d) => d.customer_id.clone(),
            Document::SalesOrder(d) => d.customer_id.clone(),
            other => other.id().to_string(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category() -> Document {
        Document::Category(CategoryDocument {
            id: CategoryDocument::document_id(101),
            category_id: 101,
            name: "Mountain Bikes".to_string(),
            parent_category_id: Some(1),
            parent_category_name: Some("Bikes".to_string()),
            modified_date: "2008-04-30T00:00:00.000Z".to_string(),
        })
    }

    #[test]
    fn test_discriminator_and_camel_case() {
        let json = category().to_json().unwrap();

        assert_eq!(json["type"], "category");
        assert_eq!(json["id"], "category-101");
        assert_eq!(json["parentCategoryName"], "Bikes");
        assert_eq!(json["modifiedDate"], "2008-04-30T00:00:00.000Z");
        assert!(json.get("parent_category_name").is_none());
    }

    #[test]
    fn test_discriminators_match_serde_tags() {
        let doc = category();
        let json = doc.to_json().unwrap();
        assert_eq!(json["type"], doc.aggregate().discriminator());
    }

    #[test]
    fn test_partition_keys() {
        assert_eq!(category().partition_key(), "category-101");
        assert_eq!(category().container(), Container::Products);
        assert_eq!(Aggregate::SalesOrder.container(), Container::Customers);
        assert_eq!(Container::Customers.partition_key_attribute(), "customerId");
    }

    #[test]
    fn test_null_fields_are_serialized() {
        let doc = Document::Category(CategoryDocument {
            id: CategoryDocument::document_id(1),
            category_id: 1,
            name: "Bikes".to_string(),
            parent_category_id: None,
            parent_category_name: None,
            modified_date: "2008-04-30T00:00:00.000Z".to_string(),
        });
        let json = doc.to_json().unwrap();
        assert!(json["parentCategoryId"].is_null());
    }

    #[test]
    fn test_document_round_trips_through_json() {
        let doc = category();
        let back: Document = serde_json::from_value(doc.to_json().unwrap()).unwrap();
        assert_eq!(back, doc);
    }
}
