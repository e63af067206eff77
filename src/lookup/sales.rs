use std::collections::HashMap;

use super::{group_by, index_by, parse_table, DuplicatePolicy};
use crate::error::RowError;
use crate::source::rows::{OrderDetailRow, ShipMethodRow};
use crate::source::SourceData;

#[derive(Debug, Default)]
pub struct SalesLookups {
    /// Order lines grouped by SalesOrderID, in source order.
    pub order_lines: HashMap<i64, Vec<OrderDetailRow>>,
    pub ship_methods: HashMap<i64, String>,
}

impl SalesLookups {
    pub fn build(data: &SourceData, rejected: &mut Vec<RowError>) -> Self {
        let order_lines = group_by(
            parse_table::<OrderDetailRow>(data, rejected),
            |line| line.sales_order_id,
        );
        let ship_methods = index_by(
            parse_table::<ShipMethodRow>(data, rejected),
            DuplicatePolicy::LastWins,
            |m| m.ship_method_id,
            |m| m.name,
        );

        tracing::debug!(
            orders_with_lines = order_lines.len(),
            ship_methods = ship_methods.len(),
            "Built sales lookups"
        );

        Self {
            order_lines,
            ship_methods,
        }
    }
}
