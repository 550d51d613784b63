//! Sales order models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cravely_core::{CustomerId, OrderId, OrderLineId, OrderStatus, ProductId, round_money};

/// The root record of a placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesOrder {
    pub id: OrderId,
    /// Sequence name shown to the customer, e.g. `S00042`.
    pub name: String,
    pub customer_id: CustomerId,
    pub status: OrderStatus,
    pub note: String,
    pub totals: OrderTotals,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new order. Orders start without lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub status: OrderStatus,
    pub note: String,
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub description: String,
    pub quantity: Decimal,
    /// Unit price as submitted by the client.
    pub price_unit: Decimal,
    pub price_subtotal: Decimal,
    pub is_delivery: bool,
}

/// Fields for a new order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub description: String,
    pub quantity: Decimal,
    pub price_unit: Decimal,
    pub is_delivery: bool,
}

/// Order amounts. There is no tax engine, so `amount_tax` is only ever what
/// the back office enters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub amount_untaxed: Decimal,
    pub amount_tax: Decimal,
    pub amount_total: Decimal,
}

impl OrderTotals {
    /// Sum line subtotals. `None` if the sum overflows.
    #[must_use]
    pub fn from_lines(lines: &[OrderLine]) -> Option<Self> {
        let amount_untaxed = lines
            .iter()
            .try_fold(Decimal::ZERO, |acc, line| acc.checked_add(line.price_subtotal))
            .map(round_money)?;
        Some(Self {
            amount_untaxed,
            amount_tax: Decimal::ZERO,
            amount_total: amount_untaxed,
        })
    }
}

/// Quantity times unit price, rounded. `None` if the product overflows.
#[must_use]
pub fn line_subtotal(quantity: Decimal, price_unit: Decimal) -> Option<Decimal> {
    quantity.checked_mul(price_unit).map(round_money)
}

/// Format a sequence number as an order name.
#[must_use]
pub fn order_name(sequence: i64) -> String {
    format!("S{sequence:05}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_name_is_zero_padded() {
        assert_eq!(order_name(1), "S00001");
        assert_eq!(order_name(42), "S00042");
        assert_eq!(order_name(123_456), "S123456");
    }

    #[test]
    fn test_totals_from_lines() {
        let line = |subtotal: i64| OrderLine {
            id: OrderLineId::new(1),
            order_id: OrderId::new(1),
            product_id: ProductId::new(1),
            description: "x".to_owned(),
            quantity: Decimal::ONE,
            price_unit: Decimal::new(subtotal, 0),
            price_subtotal: Decimal::new(subtotal, 0),
            is_delivery: false,
        };
        let totals = OrderTotals::from_lines(&[line(900), line(450), line(100)]).unwrap();
        assert_eq!(totals.amount_untaxed, Decimal::new(1450, 0));
        assert_eq!(totals.amount_total, Decimal::new(1450, 0));
        assert_eq!(totals.amount_tax, Decimal::ZERO);
    }

    #[test]
    fn test_line_subtotal_overflow_is_none() {
        assert_eq!(
            line_subtotal(Decimal::new(15, 1), Decimal::new(333, 0)),
            Some(Decimal::new(4995, 1))
        );
        assert_eq!(line_subtotal(Decimal::MAX, Decimal::TWO), None);
    }

    #[test]
    fn test_totals_overflow_is_none() {
        let line = OrderLine {
            id: OrderLineId::new(1),
            order_id: OrderId::new(1),
            product_id: ProductId::new(1),
            description: "x".to_owned(),
            quantity: Decimal::ONE,
            price_unit: Decimal::MAX,
            price_subtotal: Decimal::MAX,
            is_delivery: false,
        };
        assert_eq!(OrderTotals::from_lines(&[line.clone(), line]), None);
    }
}
