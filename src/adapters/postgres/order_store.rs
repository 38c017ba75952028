//! PostgreSQL implementation of the order store.
//!
//! Decisions run inside one `sqlx` transaction. The order row is locked with
//! `FOR UPDATE`, products are locked in id order, the status write is a
//! conditional `UPDATE ... WHERE status = $expected` and stock decrements are
//! guarded with `stock >= $quantity`, so the `CHECK (stock >= 0)` constraint
//! is never the thing that stops an oversell.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgConnection;
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Duration;
use uuid::Uuid;

use crate::domain::catalog::Product;
use crate::domain::foundation::{
    AdminId, ChatId, DomainError, ErrorCode, Money, OrderId, OrderNumber, ProductId,
    SubscriptionId, Timestamp, UserId,
};
use crate::domain::order::{DurationMonths, Order, OrderItem, OrderStatus, PaymentMethod};
use crate::domain::subscription::{AccessDetails, Subscription};
use crate::ports::{OrderStore, OrderTransaction, StatusChange, StatusWrite, StockWrite};

/// SQLSTATE raised when `lock_timeout` expires.
const LOCK_NOT_AVAILABLE: &str = "55P03";

/// PostgreSQL-backed order store.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
    lock_timeout: Option<Duration>,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            lock_timeout: None,
        }
    }

    /// Bounds how long a transaction waits for a row lock before failing
    /// with `ErrorCode::Timeout`.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn begin(&self) -> Result<Box<dyn OrderTransaction>, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error("Failed to begin transaction", e))?;

        if let Some(timeout) = self.lock_timeout {
            // SET does not take bind parameters; the value is an integer we built.
            sqlx::query(&format!("SET LOCAL lock_timeout = '{}ms'", timeout.as_millis()))
                .execute(&mut *tx)
                .await
                .map_err(|e| store_error("Failed to set lock timeout", e))?;
        }

        Ok(Box::new(PostgresTransaction { tx }))
    }

    async fn find_order(&self, id: &OrderId) -> Result<Option<Order>, DomainError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| store_error("Failed to acquire connection", e))?;
        fetch_order(&mut conn, id, false).await
    }

    async fn find_subscriptions_for_order(
        &self,
        order_id: &OrderId,
    ) -> Result<Vec<Subscription>, DomainError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, product_id, order_id, start_date, end_date,
                   is_active, access_details, created_at
            FROM subscriptions
            WHERE order_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("Failed to fetch subscriptions", e))?;

        rows.into_iter().map(Subscription::try_from).collect()
    }

    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, DomainError> {
        let row: Option<ProductRow> = sqlx::query_as(
            r#"
            SELECT id, name, stock, delivery_instructions
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("Failed to fetch product", e))?;

        row.map(Product::try_from).transpose()
    }
}

/// One open database transaction. Dropping it rolls back.
pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl OrderTransaction for PostgresTransaction {
    async fn read_order_for_update(&mut self, id: &OrderId) -> Result<Option<Order>, DomainError> {
        fetch_order(&mut self.tx, id, true).await
    }

    async fn read_products_for_update(
        &mut self,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, DomainError> {
        let mut uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        uuids.sort();
        uuids.dedup();

        let rows: Vec<ProductRow> = sqlx::query_as(
            r#"
            SELECT id, name, stock, delivery_instructions
            FROM products
            WHERE id = ANY($1)
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(&uuids)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| store_error("Failed to lock products", e))?;

        rows.into_iter().map(Product::try_from).collect()
    }

    async fn write_order_status(
        &mut self,
        change: StatusChange,
    ) -> Result<StatusWrite, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $3, decided_by = $4, decided_at = $5, updated_at = $5
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(change.order_id.as_uuid())
        .bind(change.expected.as_str())
        .bind(change.new_status.as_str())
        .bind(change.decided_by.as_str())
        .bind(change.decided_at.as_datetime())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| store_error("Failed to update order status", e))?;

        if result.rows_affected() == 1 {
            return Ok(StatusWrite::Applied);
        }

        let current: Option<String> =
            sqlx::query_scalar("SELECT status FROM orders WHERE id = $1")
                .bind(change.order_id.as_uuid())
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(|e| store_error("Failed to re-read order status", e))?;

        match current {
            Some(status) => Ok(StatusWrite::Conflict(parse_status(&status)?)),
            None => Err(
                DomainError::new(ErrorCode::OrderNotFound, "Order disappeared during decision")
                    .with_detail("order_id", change.order_id.to_string()),
            ),
        }
    }

    async fn create_subscriptions(&mut self, batch: &[Subscription]) -> Result<(), DomainError> {
        for subscription in batch {
            sqlx::query(
                r#"
                INSERT INTO subscriptions (
                    id, user_id, product_id, order_id, start_date, end_date,
                    is_active, access_details, created_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(subscription.id.as_uuid())
            .bind(subscription.user_id.as_str())
            .bind(subscription.product_id.as_uuid())
            .bind(subscription.order_id.as_uuid())
            .bind(subscription.start_date.as_datetime())
            .bind(subscription.end_date.as_datetime())
            .bind(subscription.is_active)
            .bind(subscription.access_details.as_str())
            .bind(subscription.created_at.as_datetime())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| store_error("Failed to insert subscription", e))?;
        }
        Ok(())
    }

    async fn decrement_stock(
        &mut self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<StockWrite, DomainError> {
        let quantity = i32::try_from(quantity).map_err(|_| {
            DomainError::new(
                ErrorCode::ValidationFailed,
                format!("Quantity out of range: {}", quantity),
            )
        })?;

        let remaining: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock = stock - $2, updated_at = NOW()
            WHERE id = $1 AND stock >= $2
            RETURNING stock
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(quantity)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| store_error("Failed to decrement stock", e))?;

        if let Some(remaining) = remaining {
            return Ok(StockWrite::Applied {
                remaining: to_u32("stock", remaining)?,
            });
        }

        let available: Option<i32> = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
            .bind(product_id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| store_error("Failed to read stock", e))?;

        Ok(StockWrite::Insufficient {
            available: available.map(|s| to_u32("stock", s)).transpose()?.unwrap_or(0),
        })
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        self.tx
            .commit()
            .await
            .map_err(|e| store_error("Failed to commit transaction", e))
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| store_error("Failed to roll back transaction", e))
    }
}

/// Loads an order with its items on `conn`, optionally locking the order row.
async fn fetch_order(
    conn: &mut PgConnection,
    id: &OrderId,
    for_update: bool,
) -> Result<Option<Order>, DomainError> {
    let sql = if for_update {
        concat!(
            "SELECT id, order_number, user_id, customer_chat_id, total_cents, payment_method, ",
            "receipt_ref, status, decided_by, decided_at, created_at, updated_at ",
            "FROM orders WHERE id = $1 FOR UPDATE"
        )
    } else {
        concat!(
            "SELECT id, order_number, user_id, customer_chat_id, total_cents, payment_method, ",
            "receipt_ref, status, decided_by, decided_at, created_at, updated_at ",
            "FROM orders WHERE id = $1"
        )
    };

    let row: Option<OrderRow> = sqlx::query_as(sql)
        .bind(id.as_uuid())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| store_error("Failed to fetch order", e))?;

    let Some(row) = row else {
        return Ok(None);
    };

    let items: Vec<OrderItemRow> = sqlx::query_as(
        r#"
        SELECT product_id, product_name, quantity, duration_months, unit_price_cents
        FROM order_items
        WHERE order_id = $1
        ORDER BY line_no
        "#,
    )
    .bind(id.as_uuid())
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| store_error("Failed to fetch order items", e))?;

    row.into_order(items).map(Some)
}

/// Maps sqlx errors, keeping lock and pool timeouts distinguishable.
fn store_error(context: &str, e: sqlx::Error) -> DomainError {
    let timed_out = match &e {
        sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(LOCK_NOT_AVAILABLE),
        _ => false,
    };
    let code = if timed_out {
        ErrorCode::Timeout
    } else {
        ErrorCode::DatabaseError
    };
    DomainError::new(code, format!("{}: {}", context, e))
}

// ════════════════════════════════════════════════════════════════════════════════
// Row Types
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    user_id: String,
    customer_chat_id: Option<String>,
    total_cents: i64,
    payment_method: String,
    receipt_ref: Option<String>,
    status: String,
    decided_by: Option<String>,
    decided_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItemRow>) -> Result<Order, DomainError> {
        let items = items
            .into_iter()
            .map(OrderItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Order {
            id: OrderId::from_uuid(self.id),
            order_number: OrderNumber::new(self.order_number).map_err(invalid_row)?,
            user_id: UserId::new(self.user_id).map_err(invalid_row)?,
            customer_chat: self
                .customer_chat_id
                .filter(|chat| !chat.trim().is_empty())
                .map(ChatId::new)
                .transpose()
                .map_err(invalid_row)?,
            items,
            total: Money::from_cents(self.total_cents),
            payment_method: PaymentMethod::parse(&self.payment_method),
            receipt: self.receipt_ref,
            status: parse_status(&self.status)?,
            decided_by: self
                .decided_by
                .map(AdminId::new)
                .transpose()
                .map_err(invalid_row)?,
            decided_at: self.decided_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(self.created_at),
            updated_at: Timestamp::from_datetime(self.updated_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    product_id: Uuid,
    product_name: String,
    quantity: i32,
    duration_months: i32,
    unit_price_cents: i64,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = DomainError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        OrderItem::new(
            ProductId::from_uuid(row.product_id),
            row.product_name,
            to_u32("quantity", row.quantity)?,
            DurationMonths::from_i32(row.duration_months).map_err(invalid_row)?,
            Money::from_cents(row.unit_price_cents),
        )
        .map_err(invalid_row)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    stock: i32,
    delivery_instructions: Option<String>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DomainError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let product = Product::new(
            ProductId::from_uuid(row.id),
            row.name,
            to_u32("stock", row.stock)?,
        );
        Ok(match row.delivery_instructions {
            Some(instructions) => product.with_instructions(instructions),
            None => product,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: String,
    product_id: Uuid,
    order_id: Uuid,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    is_active: bool,
    access_details: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            user_id: UserId::new(row.user_id).map_err(invalid_row)?,
            product_id: ProductId::from_uuid(row.product_id),
            order_id: OrderId::from_uuid(row.order_id),
            start_date: Timestamp::from_datetime(row.start_date),
            end_date: Timestamp::from_datetime(row.end_date),
            is_active: row.is_active,
            access_details: AccessDetails::new(row.access_details),
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Conversion Helpers
// ════════════════════════════════════════════════════════════════════════════════

fn parse_status(s: &str) -> Result<OrderStatus, DomainError> {
    s.parse::<OrderStatus>()
        .map_err(|e| DomainError::database(format!("Invalid order status '{}': {}", s, e)))
}

fn to_u32(field: &str, value: i32) -> Result<u32, DomainError> {
    u32::try_from(value)
        .map_err(|_| DomainError::database(format!("Negative {} in row: {}", field, value)))
}

fn invalid_row(e: impl std::fmt::Display) -> DomainError {
    DomainError::database(format!("Invalid stored value: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_row(status: &str) -> OrderRow {
        let now = Utc::now();
        OrderRow {
            id: Uuid::new_v4(),
            order_number: "ORD-1001".to_string(),
            user_id: "user-1".to_string(),
            customer_chat_id: Some("5550001".to_string()),
            total_cents: 9000,
            payment_method: "bank_transfer".to_string(),
            receipt_ref: Some("receipt-file-1".to_string()),
            status: status.to_string(),
            decided_by: None,
            decided_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn item_row(quantity: i32) -> OrderItemRow {
        OrderItemRow {
            product_id: Uuid::new_v4(),
            product_name: "Streaming Premium".to_string(),
            quantity,
            duration_months: 3,
            unit_price_cents: 4500,
        }
    }

    #[test]
    fn order_row_converts_with_items() {
        let order = order_row("PENDING_REVIEW")
            .into_order(vec![item_row(2)])
            .unwrap();

        assert_eq!(order.status, OrderStatus::PendingReview);
        assert_eq!(order.payment_method, PaymentMethod::BankTransfer);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 2);
        assert_eq!(order.items[0].duration.get(), 3);
        assert_eq!(order.customer_chat.unwrap().as_str(), "5550001");
    }

    #[test]
    fn blank_chat_id_is_treated_as_unlinked() {
        let mut row = order_row("PENDING_REVIEW");
        row.customer_chat_id = Some("  ".to_string());
        assert!(row.into_order(vec![item_row(1)]).unwrap().customer_chat.is_none());
    }

    #[test]
    fn unknown_status_is_a_database_error() {
        let err = order_row("SHIPPED").into_order(vec![]).unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[test]
    fn zero_quantity_item_is_rejected() {
        assert!(OrderItem::try_from(item_row(0)).is_err());
    }

    #[test]
    fn negative_stock_is_rejected() {
        let row = ProductRow {
            id: Uuid::new_v4(),
            name: "Streaming".to_string(),
            stock: -1,
            delivery_instructions: None,
        };
        assert!(Product::try_from(row).is_err());
    }

    #[test]
    fn pool_timeout_maps_to_timeout_code() {
        let err = store_error("Failed to begin transaction", sqlx::Error::PoolTimedOut);
        assert_eq!(err.code, ErrorCode::Timeout);
        let err = store_error("Failed to fetch order", sqlx::Error::RowNotFound);
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }
}
