use crate::lookup::{CatalogLookups, CustomerLookups, SalesLookups};
use crate::source::rows::{OrderDetailRow, OrderHeaderRow};
use crate::source::{Row, SourceRecord};
use crate::storage::models::{Aggregate, LineItem, SalesOrderDocument};
use crate::transform::address::address_snapshot;
use crate::transform::values::{decimal, flag, integer, normalize_date, optional_date};
use crate::transform::TransformOutput;

/// Product name used for order lines whose product is not in the catalog.
pub const UNKNOWN_PRODUCT: &str = "Unknown";

/// Orders land in their customer's partition. Addresses are snapshots taken
/// now; they do not follow later edits of the customer document.
pub fn transform_sales_orders(
    rows: &[Row],
    catalog: &CatalogLookups,
    customers: &CustomerLookups,
    sales: &SalesLookups,
) -> TransformOutput<SalesOrderDocument> {
    let mut output = TransformOutput::default();

    for row in rows {
        match OrderHeaderRow::from_row(row) {
            Ok(header) => output
                .documents
                .push(order_document(header, catalog, customers, sales)),
            Err(e) => output.push_error(Aggregate::SalesOrder, e),
        }
    }

    output
}

fn order_document(
    header: OrderHeaderRow,
    catalog: &CatalogLookups,
    customers: &CustomerLookups,
    sales: &SalesLookups,
) -> SalesOrderDocument {
    let order_id = header.sales_order_id;
    let line_items = sales
        .order_lines
        .get(&order_id)
        .map(|lines| lines.iter().map(|line| line_item(order_id, line, catalog)).collect())
        .unwrap_or_default();

    SalesOrderDocument {
        id: SalesOrderDocument::document_id(order_id),
        customer_id: header.customer_id.to_string(),
        sales_order_id: order_id,
        sales_order_number: SalesOrderDocument::order_number(order_id),
        revision_number: integer(&header.revision_number),
        order_date: normalize_date(&header.order_date),
        due_date: normalize_date(&header.due_date),
        ship_date: optional_date(header.ship_date.as_deref()),
        status: integer(&header.status),
        online_order: flag(&header.online_order_flag),
        purchase_order_number: header.purchase_order_number,
        account_number: header.account_number,
        customer_name: customers.customer_name(header.customer_id),
        ship_method: header
            .ship_method_id
            .and_then(|id| sales.ship_methods.get(&id).cloned()),
        bill_to_address: header
            .bill_to_address_id
            .and_then(|id| address_snapshot(customers, id, None)),
        ship_to_address: header
            .ship_to_address_id
            .and_then(|id| address_snapshot(customers, id, None)),
        // TotalDue comes from the source as-is; it is not recomputed.
        sub_total: decimal(&header.sub_total),
        tax_amount: decimal(&header.tax_amount),
        freight: decimal(&header.freight),
        total_due: decimal(&header.total_due),
        comment: header.comment,
        line_items,
        modified_date: normalize_date(&header.modified_date),
    }
}

fn line_item(order_id: i64, line: &OrderDetailRow, catalog: &CatalogLookups) -> LineItem {
    let product_name = match catalog.product_names.get(&line.product_id) {
        Some(name) => name.clone(),
        None => {
            tracing::warn!(
                order_id,
                product_id = line.product_id,
                "Order line references a missing product"
            );
            UNKNOWN_PRODUCT.to_string()
        }
    };

    LineItem {
        sales_order_detail_id: line.sales_order_detail_id,
        product_id: line.product_id,
        product_name,
        carrier_tracking_number: line.carrier_tracking_number.clone(),
        order_qty: integer(&line.order_qty),
        unit_price: decimal(&line.unit_price),
        unit_price_discount: decimal(&line.unit_price_discount),
        line_total: decimal(&line.line_total),
    }
}
