//! Sales order repository.
//!
//! Each write is its own statement. The checkout pipeline does not wrap an
//! order in a transaction, so a failure part way leaves earlier rows behind.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use cravely_core::{CustomerId, OrderId, OrderLineId, OrderStatus, ProductId};

use super::{RepositoryError, conflict_or_database};
use crate::models::order::{line_subtotal, order_name};
use crate::models::{NewOrder, NewOrderLine, OrderLine, OrderTotals, SalesOrder};
use crate::store::OrderStore;

const ORDER_COLUMNS: &str = r"
    id, name, customer_id, status, note, amount_untaxed, amount_tax, amount_total, created_at
";

const LINE_COLUMNS: &str = r"
    id, order_id, product_id, description, quantity, price_unit, price_subtotal, is_delivery
";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i32,
    name: String,
    customer_id: i32,
    status: String,
    note: String,
    amount_untaxed: Decimal,
    amount_tax: Decimal,
    amount_total: Decimal,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for SalesOrder {
    type Error = RepositoryError;

    fn try_from(r: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = r.status.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order status in database: {e}"))
        })?;

        Ok(Self {
            id: OrderId::new(r.id),
            name: r.name,
            customer_id: CustomerId::new(r.customer_id),
            status,
            note: r.note,
            totals: OrderTotals {
                amount_untaxed: r.amount_untaxed,
                amount_tax: r.amount_tax,
                amount_total: r.amount_total,
            },
            created_at: r.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LineRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    description: String,
    quantity: Decimal,
    price_unit: Decimal,
    price_subtotal: Decimal,
    is_delivery: bool,
}

impl From<LineRow> for OrderLine {
    fn from(r: LineRow) -> Self {
        Self {
            id: OrderLineId::new(r.id),
            order_id: OrderId::new(r.order_id),
            product_id: ProductId::new(r.product_id),
            description: r.description,
            quantity: r.quantity,
            price_unit: r.price_unit,
            price_subtotal: r.price_subtotal,
            is_delivery: r.is_delivery,
        }
    }
}

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn create_order(&self, order: NewOrder) -> Result<SalesOrder, RepositoryError> {
        let (sequence,): (i64,) =
            sqlx::query_as("SELECT nextval('storefront.sales_order_name_seq')")
                .fetch_one(&self.pool)
                .await?;

        let sql = format!(
            r"
            INSERT INTO storefront.sales_order (name, customer_id, status, note)
            VALUES ($1, $2, $3, $4)
            RETURNING {ORDER_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(order_name(sequence))
            .bind(order.customer_id)
            .bind(order.status.as_str())
            .bind(&order.note)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_or_database(e, "order name"))?;

        row.try_into()
    }

    async fn add_line(
        &self,
        order_id: OrderId,
        line: NewOrderLine,
    ) -> Result<OrderLine, RepositoryError> {
        let price_subtotal = line_subtotal(line.quantity, line.price_unit)
            .ok_or(RepositoryError::AmountOutOfRange("line subtotal"))?;
        let sql = format!(
            r"
            INSERT INTO storefront.sales_order_line (
                order_id, product_id, description, quantity, price_unit, price_subtotal, is_delivery
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {LINE_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, LineRow>(&sql)
            .bind(order_id)
            .bind(line.product_id)
            .bind(&line.description)
            .bind(line.quantity)
            .bind(line.price_unit)
            .bind(price_subtotal)
            .bind(line.is_delivery)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn recompute_totals(&self, order_id: OrderId) -> Result<OrderTotals, RepositoryError> {
        let row: Option<(Decimal, Decimal, Decimal)> = sqlx::query_as(
            r"
            UPDATE storefront.sales_order o
            SET amount_untaxed = t.untaxed,
                amount_total = t.untaxed + o.amount_tax
            FROM (
                SELECT COALESCE(SUM(price_subtotal), 0) AS untaxed
                FROM storefront.sales_order_line
                WHERE order_id = $1
            ) t
            WHERE o.id = $1
            RETURNING o.amount_untaxed, o.amount_tax, o.amount_total
            ",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        let (amount_untaxed, amount_tax, amount_total) = row.ok_or(RepositoryError::NotFound)?;
        Ok(OrderTotals {
            amount_untaxed,
            amount_tax,
            amount_total,
        })
    }

    async fn next_order_name(&self) -> Result<String, RepositoryError> {
        let (next,): (i64,) = sqlx::query_as(
            r"
            SELECT CASE WHEN is_called THEN last_value + 1 ELSE last_value END
            FROM storefront.sales_order_name_seq
            ",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(order_name(next))
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<SalesOrder>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM storefront.sales_order WHERE id = $1");
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(SalesOrder::try_from).transpose()
    }

    async fn order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        let sql = format!(
            "SELECT {LINE_COLUMNS} FROM storefront.sales_order_line WHERE order_id = $1 ORDER BY id"
        );
        let rows = sqlx::query_as::<_, LineRow>(&sql)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(OrderLine::from).collect())
    }
}
