//! PostgreSQL implementation of OrderRepository.
//!
//! Inserts use `ON CONFLICT DO NOTHING` (primary key and the unique
//! `gateway_intent_id` index both count), updates are guarded by
//! `version = $n` and bump it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, OrderId, Timestamp, UserId};
use crate::domain::order::{FulfillmentStatus, Order, OrderStatus, PaymentStatus};
use crate::domain::pricing::{Platform, ServiceType};
use crate::ports::OrderRepository;

const SELECT_COLUMNS: &str = r#"
    SELECT order_id, gateway_intent_id, owner_id, service_type, quantity, target_reference,
           platform, amount_subtotal, amount_tax, amount_total, payment_status, status,
           fulfillment_status, failure_reason, created_at, paid_at, fulfillment_started_at,
           fulfillment_completed_at, updated_at, version
    FROM orders
"#;

pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        clause: &str,
        value: &str,
    ) -> Result<Option<Order>, DomainError> {
        let sql = format!("{} WHERE {} = $1", SELECT_COLUMNS, clause);
        let row: Option<OrderRow> = sqlx::query_as(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("find order", e))?;

        row.map(Order::try_from).transpose()
    }
}

/// Database row representation of an order.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    order_id: String,
    gateway_intent_id: String,
    owner_id: String,
    service_type: String,
    quantity: i64,
    target_reference: Option<String>,
    platform: String,
    amount_subtotal: i64,
    amount_tax: i64,
    amount_total: i64,
    payment_status: String,
    status: String,
    fulfillment_status: String,
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
    fulfillment_started_at: Option<DateTime<Utc>>,
    fulfillment_completed_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<OrderRow> for Order {
    type Error = DomainError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let order_id = OrderId::parse(row.order_id).map_err(corrupt)?;
        let owner_id = UserId::new(row.owner_id).map_err(corrupt)?;
        let service_type: ServiceType = row.service_type.parse().map_err(corrupt)?;
        let platform: Platform = row.platform.parse().map_err(corrupt)?;
        let quantity = u32::try_from(row.quantity)
            .map_err(|_| corrupt(format!("quantity out of range: {}", row.quantity)))?;

        Ok(Order {
            order_id,
            gateway_intent_id: row.gateway_intent_id,
            owner_id,
            service_type,
            quantity,
            target_reference: row.target_reference,
            platform,
            amount_subtotal: row.amount_subtotal,
            amount_tax: row.amount_tax,
            amount_total: row.amount_total,
            payment_status: parse_status(&row.payment_status, PaymentStatus::parse)?,
            status: parse_status(&row.status, OrderStatus::parse)?,
            fulfillment_status: parse_status(&row.fulfillment_status, FulfillmentStatus::parse)?,
            failure_reason: row.failure_reason,
            created_at: Timestamp::from_datetime(row.created_at),
            paid_at: row.paid_at.map(Timestamp::from_datetime),
            fulfillment_started_at: row.fulfillment_started_at.map(Timestamp::from_datetime),
            fulfillment_completed_at: row.fulfillment_completed_at.map(Timestamp::from_datetime),
            updated_at: Timestamp::from_datetime(row.updated_at),
            version: row.version,
        })
    }
}

fn parse_status<T>(value: &str, parse: fn(&str) -> Option<T>) -> Result<T, DomainError> {
    parse(value).ok_or_else(|| corrupt(format!("Invalid status value: {}", value)))
}

fn corrupt(err: impl std::fmt::Display) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("Corrupt order row: {}", err))
}

fn db_error(action: &str, err: sqlx::Error) -> DomainError {
    DomainError::database(format!("Failed to {}: {}", action, err))
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn insert_if_absent(&self, order: &Order) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO orders (
                order_id, gateway_intent_id, owner_id, service_type, quantity, target_reference,
                platform, amount_subtotal, amount_tax, amount_total, payment_status, status,
                fulfillment_status, failure_reason, created_at, paid_at, fulfillment_started_at,
                fulfillment_completed_at, updated_at, version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(order.order_id.as_str())
        .bind(&order.gateway_intent_id)
        .bind(order.owner_id.as_str())
        .bind(order.service_type.as_str())
        .bind(i64::from(order.quantity))
        .bind(&order.target_reference)
        .bind(order.platform.as_str())
        .bind(order.amount_subtotal)
        .bind(order.amount_tax)
        .bind(order.amount_total)
        .bind(order.payment_status.as_str())
        .bind(order.status.as_str())
        .bind(order.fulfillment_status.as_str())
        .bind(&order.failure_reason)
        .bind(order.created_at.as_datetime())
        .bind(order.paid_at.map(|t| *t.as_datetime()))
        .bind(order.fulfillment_started_at.map(|t| *t.as_datetime()))
        .bind(order.fulfillment_completed_at.map(|t| *t.as_datetime()))
        .bind(order.updated_at.as_datetime())
        .bind(order.version)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert order", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn update(&self, order: &Order) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                payment_status = $3,
                status = $4,
                fulfillment_status = $5,
                failure_reason = $6,
                paid_at = $7,
                fulfillment_started_at = $8,
                fulfillment_completed_at = $9,
                updated_at = $10,
                version = version + 1
            WHERE order_id = $1 AND version = $2
            "#,
        )
        .bind(order.order_id.as_str())
        .bind(order.version)
        .bind(order.payment_status.as_str())
        .bind(order.status.as_str())
        .bind(order.fulfillment_status.as_str())
        .bind(&order.failure_reason)
        .bind(order.paid_at.map(|t| *t.as_datetime()))
        .bind(order.fulfillment_started_at.map(|t| *t.as_datetime()))
        .bind(order.fulfillment_completed_at.map(|t| *t.as_datetime()))
        .bind(order.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("update order", e))?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        let exists: Option<(i64,)> = sqlx::query_as("SELECT version FROM orders WHERE order_id = $1")
            .bind(order.order_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("check order version", e))?;

        match exists {
            Some(_) => Err(DomainError::concurrent_modification("order")
                .with_detail("order_id", order.order_id.to_string())),
            None => Err(DomainError::new(
                ErrorCode::OrderNotFound,
                format!("Order not found: {}", order.order_id),
            )),
        }
    }

    async fn find_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, DomainError> {
        self.fetch_one_where("order_id", order_id.as_str()).await
    }

    async fn find_by_intent_id(&self, intent_id: &str) -> Result<Option<Order>, DomainError> {
        self.fetch_one_where("gateway_intent_id", intent_id).await
    }
}
