//! Named-field views over raw source rows.
//!
//! Each struct documents the positional column contract of its export file.
//! Only the columns the transforms consume are kept; dates and decimals stay
//! as text so the transform stage can apply its permissive parsing policy.

use crate::error::RowError;
use crate::source::{Row, SourceTable};

/// A typed source record parsed from a positional row.
pub trait SourceRecord: Sized {
    const TABLE: SourceTable;
    /// Minimum number of columns the row must carry.
    const COLUMNS: usize;

    fn from_fields(fields: &Fields<'_>) -> Result<Self, RowError>;

    fn from_row(row: &Row) -> Result<Self, RowError> {
        if row.fields.len() < Self::COLUMNS {
            return Err(RowError::ColumnCount {
                table: Self::TABLE,
                record: row.number,
                expected: Self::COLUMNS,
                found: row.fields.len(),
            });
        }
        Self::from_fields(&Fields {
            table: Self::TABLE,
            record: row.number,
            values: &row.fields,
        })
    }
}

/// Parse every row, splitting successes from failures. Source order is kept.
pub fn parse_rows<T: SourceRecord>(rows: &[Row]) -> (Vec<T>, Vec<RowError>) {
    let mut parsed = Vec::with_capacity(rows.len());
    let mut errors = Vec::new();
    for row in rows {
        match T::from_row(row) {
            Ok(record) => parsed.push(record),
            Err(e) => errors.push(e),
        }
    }
    (parsed, errors)
}

/// Column accessor used by `SourceRecord::from_fields`. Callers have already
/// checked the column count, so indexing below `COLUMNS` cannot fail.
pub struct Fields<'a> {
    table: SourceTable,
    record: usize,
    values: &'a [String],
}

impl Fields<'_> {
    pub fn text(&self, column: usize) -> String {
        self.values[column].trim().to_string()
    }

    /// `None` for empty columns and the literal `NULL`.
    pub fn optional_text(&self, column: usize) -> Option<String> {
        let value = self.values[column].trim();
        if value.is_empty() || value.eq_ignore_ascii_case("null") {
            None
        } else {
            Some(value.to_string())
        }
    }

    /// Free text kept verbatim, apart from the optional/NULL handling.
    pub fn raw_text(&self, column: usize) -> Option<String> {
        self.optional_text(column)
            .map(|_| self.values[column].clone())
    }

    pub fn id(&self, column: usize) -> Result<i64, RowError> {
        let value = self.values[column].trim();
        value.parse().map_err(|_| RowError::InvalidInteger {
            table: self.table,
            record: self.record,
            column,
            value: value.to_string(),
        })
    }

    pub fn optional_id(&self, column: usize) -> Result<Option<i64>, RowError> {
        match self.optional_text(column) {
            None => Ok(None),
            Some(_) => self.id(column).map(Some),
        }
    }
}

/// `ProductCategory.csv`: ProductCategoryID, Name, rowguid, ModifiedDate
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRow {
    pub category_id: i64,
    pub name: String,
    pub modified_date: String,
}

impl SourceRecord for CategoryRow {
    const TABLE: SourceTable = SourceTable::ProductCategory;
    const COLUMNS: usize = 4;

    fn from_fields(f: &Fields<'_>) -> Result<Self, RowError> {
        Ok(Self {
            category_id: f.id(0)?,
            name: f.text(1),
            modified_date: f.text(3),
        })
    }
}

/// `ProductSubcategory.csv`: ProductSubcategoryID, ProductCategoryID, Name,
/// rowguid, ModifiedDate
#[derive(Debug, Clone, PartialEq)]
pub struct SubcategoryRow {
    pub subcategory_id: i64,
    pub category_id: i64,
    pub name: String,
    pub modified_date: String,
}

impl SourceRecord for SubcategoryRow {
    const TABLE: SourceTable = SourceTable::ProductSubcategory;
    const COLUMNS: usize = 5;

    fn from_fields(f: &Fields<'_>) -> Result<Self, RowError> {
        Ok(Self {
            subcategory_id: f.id(0)?,
            category_id: f.id(1)?,
            name: f.text(2),
            modified_date: f.text(4),
        })
    }
}

/// `Product.csv`: ProductID, Name, ProductNumber, MakeFlag, FinishedGoodsFlag,
/// Color, SafetyStockLevel, ReorderPoint, StandardCost, ListPrice, Size,
/// SizeUnitMeasureCode, WeightUnitMeasureCode, Weight, DaysToManufacture,
/// ProductLine, Class, Style, ProductSubcategoryID, ProductModelID,
/// SellStartDate, SellEndDate, DiscontinuedDate, rowguid, ModifiedDate
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRow {
    pub product_id: i64,
    pub name: String,
    pub product_number: String,
    pub make_flag: String,
    pub finished_goods_flag: String,
    pub color: Option<String>,
    pub safety_stock_level: String,
    pub reorder_point: String,
    pub standard_cost: String,
    pub list_price: String,
    pub size: Option<String>,
    pub size_unit: Option<String>,
    pub weight_unit: Option<String>,
    pub weight: String,
    pub days_to_manufacture: String,
    pub product_line: Option<String>,
    pub class: Option<String>,
    pub style: Option<String>,
    pub subcategory_id: Option<i64>,
    pub product_model_id: Option<i64>,
    pub sell_start_date: String,
    pub sell_end_date: Option<String>,
    pub discontinued_date: Option<String>,
    pub modified_date: String,
}

impl SourceRecord for ProductRow {
    const TABLE: SourceTable = SourceTable::Product;
    const COLUMNS: usize = 25;

    fn from_fields(f: &Fields<'_>) -> Result<Self, RowError> {
        Ok(Self {
            product_id: f.id(0)?,
            name: f.text(1),
            product_number: f.text(2),
            make_flag: f.text(3),
            finished_goods_flag: f.text(4),
            color: f.optional_text(5),
            safety_stock_level: f.text(6),
            reorder_point: f.text(7),
            standard_cost: f.text(8),
            list_price: f.text(9),
            size: f.optional_text(10),
            size_unit: f.optional_text(11),
            weight_unit: f.optional_text(12),
            weight: f.text(13),
            days_to_manufacture: f.text(14),
            product_line: f.optional_text(15),
            class: f.optional_text(16),
            style: f.optional_text(17),
            subcategory_id: f.optional_id(18)?,
            product_model_id: f.optional_id(19)?,
            sell_start_date: f.text(20),
            sell_end_date: f.optional_text(21),
            discontinued_date: f.optional_text(22),
            modified_date: f.text(24),
        })
    }
}

/// `ProductDescription.csv` (pipe): ProductDescriptionID, Description,
/// rowguid, ModifiedDate
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptionRow {
    pub description_id: i64,
    pub description: String,
}

impl SourceRecord for DescriptionRow {
    const TABLE: SourceTable = SourceTable::ProductDescription;
    const COLUMNS: usize = 4;

    fn from_fields(f: &Fields<'_>) -> Result<Self, RowError> {
        Ok(Self {
            description_id: f.id(0)?,
            description: f.text(1),
        })
    }
}

/// `ProductModelProductDescriptionCulture.csv`: ProductModelID,
/// ProductDescriptionID, CultureID, ModifiedDate
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCultureRow {
    pub product_model_id: i64,
    pub description_id: i64,
    pub culture_id: String,
}

impl SourceRecord for ModelCultureRow {
    const TABLE: SourceTable = SourceTable::ProductModelProductDescriptionCulture;
    const COLUMNS: usize = 4;

    fn from_fields(f: &Fields<'_>) -> Result<Self, RowError> {
        Ok(Self {
            product_model_id: f.id(0)?,
            description_id: f.id(1)?,
            // CultureID is a fixed-width nchar(6) column
            culture_id: f.text(2),
        })
    }
}

/// `ProductModel.csv` (pipe): ProductModelID, Name, CatalogDescription,
/// Instructions, rowguid, ModifiedDate
#[derive(Debug, Clone, PartialEq)]
pub struct ProductModelRow {
    pub product_model_id: i64,
    pub name: String,
    pub catalog_description: Option<String>,
    pub modified_date: String,
}

impl SourceRecord for ProductModelRow {
    const TABLE: SourceTable = SourceTable::ProductModel;
    const COLUMNS: usize = 6;

    fn from_fields(f: &Fields<'_>) -> Result<Self, RowError> {
        Ok(Self {
            product_model_id: f.id(0)?,
            name: f.text(1),
            catalog_description: f.raw_text(2),
            modified_date: f.text(5),
        })
    }
}

/// `Customer.csv`: CustomerID, PersonID, StoreID, TerritoryID, AccountNumber,
/// rowguid, ModifiedDate
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRow {
    pub customer_id: i64,
    pub person_id: Option<i64>,
    pub store_id: Option<i64>,
    pub territory_id: Option<i64>,
    pub account_number: String,
    pub modified_date: String,
}

impl SourceRecord for CustomerRow {
    const TABLE: SourceTable = SourceTable::Customer;
    const COLUMNS: usize = 7;

    fn from_fields(f: &Fields<'_>) -> Result<Self, RowError> {
        Ok(Self {
            customer_id: f.id(0)?,
            person_id: f.optional_id(1)?,
            store_id: f.optional_id(2)?,
            territory_id: f.optional_id(3)?,
            account_number: f.text(4),
            modified_date: f.text(6),
        })
    }
}

/// `Person.csv` (pipe): BusinessEntityID, PersonType, NameStyle, Title,
/// FirstName, MiddleName, LastName, Suffix, EmailPromotion,
/// AdditionalContactInfo, Demographics, rowguid, ModifiedDate
#[derive(Debug, Clone, PartialEq)]
pub struct PersonRow {
    pub business_entity_id: i64,
    pub person_type: String,
    pub title: Option<String>,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub suffix: Option<String>,
    pub email_promotion: String,
}

impl PersonRow {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl SourceRecord for PersonRow {
    const TABLE: SourceTable = SourceTable::Person;
    const COLUMNS: usize = 13;

    fn from_fields(f: &Fields<'_>) -> Result<Self, RowError> {
        Ok(Self {
            business_entity_id: f.id(0)?,
            person_type: f.text(1),
            title: f.optional_text(3),
            first_name: f.text(4),
            middle_name: f.optional_text(5),
            last_name: f.text(6),
            suffix: f.optional_text(7),
            email_promotion: f.text(8),
        })
    }
}

/// `EmailAddress.csv` (pipe): BusinessEntityID, EmailAddressID, EmailAddress,
/// rowguid, ModifiedDate
#[derive(Debug, Clone, PartialEq)]
pub struct EmailRow {
    pub business_entity_id: i64,
    pub email_address: String,
}

impl SourceRecord for EmailRow {
    const TABLE: SourceTable = SourceTable::EmailAddress;
    const COLUMNS: usize = 5;

    fn from_fields(f: &Fields<'_>) -> Result<Self, RowError> {
        Ok(Self {
            business_entity_id: f.id(0)?,
            email_address: f.text(2),
        })
    }
}

/// `Password.csv` (pipe): BusinessEntityID, PasswordHash, PasswordSalt,
/// rowguid, ModifiedDate
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordRow {
    pub business_entity_id: i64,
    pub password_hash: String,
    pub password_salt: String,
}

impl SourceRecord for PasswordRow {
    const TABLE: SourceTable = SourceTable::Password;
    const COLUMNS: usize = 5;

    fn from_fields(f: &Fields<'_>) -> Result<Self, RowError> {
        Ok(Self {
            business_entity_id: f.id(0)?,
            password_hash: f.text(1),
            password_salt: f.text(2),
        })
    }
}

/// `PersonPhone.csv` (pipe): BusinessEntityID, PhoneNumber,
/// PhoneNumberTypeID, ModifiedDate
#[derive(Debug, Clone, PartialEq)]
pub struct PhoneRow {
    pub business_entity_id: i64,
    pub phone_number: String,
    pub phone_number_type_id: Option<i64>,
}

impl SourceRecord for PhoneRow {
    const TABLE: SourceTable = SourceTable::PersonPhone;
    const COLUMNS: usize = 4;

    fn from_fields(f: &Fields<'_>) -> Result<Self, RowError> {
        Ok(Self {
            business_entity_id: f.id(0)?,
            phone_number: f.text(1),
            phone_number_type_id: f.optional_id(2)?,
        })
    }
}

/// `Address.csv`: AddressID, AddressLine1, AddressLine2, City,
/// StateProvinceID, PostalCode, SpatialLocation, rowguid, ModifiedDate
#[derive(Debug, Clone, PartialEq)]
pub struct AddressRow {
    pub address_id: i64,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state_province_id: Option<i64>,
    pub postal_code: String,
}

impl SourceRecord for AddressRow {
    const TABLE: SourceTable = SourceTable::Address;
    const COLUMNS: usize = 9;

    fn from_fields(f: &Fields<'_>) -> Result<Self, RowError> {
        Ok(Self {
            address_id: f.id(0)?,
            address_line1: f.text(1),
            address_line2: f.optional_text(2),
            city: f.text(3),
            state_province_id: f.optional_id(4)?,
            postal_code: f.text(5),
        })
    }
}

/// `BusinessEntityAddress.csv` (pipe): BusinessEntityID, AddressID,
/// AddressTypeID, rowguid, ModifiedDate
#[derive(Debug, Clone, PartialEq)]
pub struct EntityAddressRow {
    pub business_entity_id: i64,
    pub address_id: i64,
    pub address_type_id: i64,
}

impl SourceRecord for EntityAddressRow {
    const TABLE: SourceTable = SourceTable::BusinessEntityAddress;
    const COLUMNS: usize = 5;

    fn from_fields(f: &Fields<'_>) -> Result<Self, RowError> {
        Ok(Self {
            business_entity_id: f.id(0)?,
            address_id: f.id(1)?,
            address_type_id: f.id(2)?,
        })
    }
}

/// `AddressType.csv`: AddressTypeID, Name, rowguid, ModifiedDate
#[derive(Debug, Clone, PartialEq)]
pub struct AddressTypeRow {
    pub address_type_id: i64,
    pub name: String,
}

impl SourceRecord for AddressTypeRow {
    const TABLE: SourceTable = SourceTable::AddressType;
    const COLUMNS: usize = 4;

    fn from_fields(f: &Fields<'_>) -> Result<Self, RowError> {
        Ok(Self {
            address_type_id: f.id(0)?,
            name: f.text(1),
        })
    }
}

/// `StateProvince.csv`: StateProvinceID, StateProvinceCode,
/// CountryRegionCode, IsOnlyStateProvinceFlag, Name, TerritoryID, rowguid,
/// ModifiedDate
#[derive(Debug, Clone, PartialEq)]
pub struct StateProvinceRow {
    pub state_province_id: i64,
    pub code: String,
    pub country_region_code: String,
    pub name: String,
}

impl SourceRecord for StateProvinceRow {
    const TABLE: SourceTable = SourceTable::StateProvince;
    const COLUMNS: usize = 8;

    fn from_fields(f: &Fields<'_>) -> Result<Self, RowError> {
        Ok(Self {
            state_province_id: f.id(0)?,
            code: f.text(1),
            country_region_code: f.text(2),
            name: f.text(4),
        })
    }
}

/// `CountryRegion.csv` (pipe): CountryRegionCode, Name, ModifiedDate
#[derive(Debug, Clone, PartialEq)]
pub struct CountryRegionRow {
    pub code: String,
    pub name: String,
}

impl SourceRecord for CountryRegionRow {
    const TABLE: SourceTable = SourceTable::CountryRegion;
    const COLUMNS: usize = 3;

    fn from_fields(f: &Fields<'_>) -> Result<Self, RowError> {
        Ok(Self {
            code: f.text(0),
            name: f.text(1),
        })
    }
}

/// `SalesOrderHeader.csv`: SalesOrderID, RevisionNumber, OrderDate, DueDate,
/// ShipDate, Status, OnlineOrderFlag, PurchaseOrderNumber, AccountNumber,
/// CustomerID, SalesPersonID, TerritoryID, BillToAddressID, ShipToAddressID,
/// ShipMethodID, CreditCardID, CreditCardApprovalCode, CurrencyRateID,
/// SubTotal, TaxAmt, Freight, TotalDue, Comment, rowguid, ModifiedDate
#[derive(Debug, Clone, PartialEq)]
pub struct OrderHeaderRow {
    pub sales_order_id: i64,
    pub revision_number: String,
    pub order_date: String,
    pub due_date: String,
    pub ship_date: Option<String>,
    pub status: String,
    pub online_order_flag: String,
    pub purchase_order_number: Option<String>,
    pub account_number: Option<String>,
    pub customer_id: i64,
    pub bill_to_address_id: Option<i64>,
    pub ship_to_address_id: Option<i64>,
    pub ship_method_id: Option<i64>,
    pub sub_total: String,
    pub tax_amount: String,
    pub freight: String,
    pub total_due: String,
    pub comment: Option<String>,
    pub modified_date: String,
}

impl SourceRecord for OrderHeaderRow {
    const TABLE: SourceTable = SourceTable::SalesOrderHeader;
    const COLUMNS: usize = 25;

    fn from_fields(f: &Fields<'_>) -> Result<Self, RowError> {
        Ok(Self {
            sales_order_id: f.id(0)?,
            revision_number: f.text(1),
            order_date: f.text(2),
            due_date: f.text(3),
            ship_date: f.optional_text(4),
            status: f.text(5),
            online_order_flag: f.text(6),
            purchase_order_number: f.optional_text(7),
            account_number: f.optional_text(8),
            customer_id: f.id(9)?,
            bill_to_address_id: f.optional_id(12)?,
            ship_to_address_id: f.optional_id(13)?,
            ship_method_id: f.optional_id(14)?,
            sub_total: f.text(18),
            tax_amount: f.text(19),
            freight: f.text(20),
            total_due: f.text(21),
            comment: f.optional_text(22),
            modified_date: f.text(24),
        })
    }
}

/// `SalesOrderDetail.csv`: SalesOrderID, SalesOrderDetailID,
/// CarrierTrackingNumber, OrderQty, ProductID, SpecialOfferID, UnitPrice,
/// UnitPriceDiscount, LineTotal, rowguid, ModifiedDate
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDetailRow {
    pub sales_order_id: i64,
    pub sales_order_detail_id: i64,
    pub carrier_tracking_number: Option<String>,
    pub order_qty: String,
    pub product_id: i64,
    pub unit_price: String,
    pub unit_price_discount: String,
    pub line_total: String,
}

impl SourceRecord for OrderDetailRow {
    const TABLE: SourceTable = SourceTable::SalesOrderDetail;
    const COLUMNS: usize = 11;

    fn from_fields(f: &Fields<'_>) -> Result<Self, RowError> {
        Ok(Self {
            sales_order_id: f.id(0)?,
            sales_order_detail_id: f.id(1)?,
            carrier_tracking_number: f.optional_text(2),
            order_qty: f.text(3),
            product_id: f.id(4)?,
            unit_price: f.text(6),
            unit_price_discount: f.text(7),
            line_total: f.text(8),
        })
    }
}

/// `ShipMethod.csv`: ShipMethodID, Name, ShipBase, ShipRate, rowguid,
/// ModifiedDate
#[derive(Debug, Clone, PartialEq)]
pub struct ShipMethodRow {
    pub ship_method_id: i64,
    pub name: String,
}

impl SourceRecord for ShipMethodRow {
    const TABLE: SourceTable = SourceTable::ShipMethod;
    const COLUMNS: usize = 6;

    fn from_fields(f: &Fields<'_>) -> Result<Self, RowError> {
        Ok(Self {
            ship_method_id: f.id(0)?,
            name: f.text(1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[&str]) -> Row {
        Row::new(7, fields.iter().map(|f| f.to_string()).collect())
    }

    #[test]
    fn test_short_row_reports_column_count() {
        let err = SubcategoryRow::from_row(&row(&["1", "1", "Mountain Bikes"])).unwrap_err();
        assert_eq!(
            err,
            RowError::ColumnCount {
                table: SourceTable::ProductSubcategory,
                record: 7,
                expected: 5,
                found: 3,
            }
        );
        assert!(err.to_string().contains("ProductSubcategory record 7"));
    }

    #[test]
    fn test_invalid_id_is_rejected() {
        let err = CategoryRow::from_row(&row(&["one", "Bikes", "g", "2008-04-30"])).unwrap_err();
        assert!(matches!(err, RowError::InvalidInteger { column: 0, .. }));
    }

    #[test]
    fn test_customer_without_person() {
        let customer =
            CustomerRow::from_row(&row(&["1", "", "934", "1", "AW00000001", "g", "2014-09-12"]))
                .unwrap();
        assert_eq!(customer.person_id, None);
        assert_eq!(customer.store_id, Some(934));
    }

    #[test]
    fn test_culture_id_is_trimmed() {
        let culture = ModelCultureRow::from_row(&row(&["1", "1199", "en    ", "2013-04-30"])).unwrap();
        assert_eq!(culture.culture_id, "en");
    }

    #[test]
    fn test_parse_rows_splits_failures() {
        let rows = vec![
            row(&["1", "Bikes", "g", "2008-04-30"]),
            row(&["2"]),
            row(&["3", "Clothing", "g", "2008-04-30"]),
        ];
        let (parsed, errors) = parse_rows::<CategoryRow>(&rows);

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].name, "Clothing");
        assert_eq!(errors.len(), 1);
    }
}
