//! PostgreSQL implementation of SubscriptionRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::domain::subscription::{Subscription, SubscriptionStatus};
use crate::ports::SubscriptionRepository;

pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    gateway_subscription_id: String,
    gateway_customer_id: String,
    owner_contact: Option<String>,
    status: String,
    current_period_start: DateTime<Utc>,
    current_period_end: DateTime<Utc>,
    plan_id: Option<String>,
    canceled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_event_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let status = SubscriptionStatus::parse(&row.status).ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid status value: {}", row.status),
            )
        })?;

        Ok(Subscription {
            gateway_subscription_id: row.gateway_subscription_id,
            gateway_customer_id: row.gateway_customer_id,
            owner_contact: row.owner_contact,
            status,
            current_period_start: Timestamp::from_datetime(row.current_period_start),
            current_period_end: Timestamp::from_datetime(row.current_period_end),
            plan_id: row.plan_id,
            canceled_at: row.canceled_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
            last_event_at: Timestamp::from_datetime(row.last_event_at),
            version: row.version,
        })
    }
}

fn db_error(action: &str, err: sqlx::Error) -> DomainError {
    DomainError::database(format!("Failed to {}: {}", action, err))
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn insert_if_absent(&self, subscription: &Subscription) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO subscriptions (
                gateway_subscription_id, gateway_customer_id, owner_contact, status,
                current_period_start, current_period_end, plan_id, canceled_at,
                created_at, updated_at, last_event_at, version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (gateway_subscription_id) DO NOTHING
            "#,
        )
        .bind(&subscription.gateway_subscription_id)
        .bind(&subscription.gateway_customer_id)
        .bind(&subscription.owner_contact)
        .bind(subscription.status.as_str())
        .bind(subscription.current_period_start.as_datetime())
        .bind(subscription.current_period_end.as_datetime())
        .bind(&subscription.plan_id)
        .bind(subscription.canceled_at.map(|t| *t.as_datetime()))
        .bind(subscription.created_at.as_datetime())
        .bind(subscription.updated_at.as_datetime())
        .bind(subscription.last_event_at.as_datetime())
        .bind(subscription.version)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert subscription", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET
                owner_contact = COALESCE(owner_contact, $3),
                status = $4,
                current_period_start = $5,
                current_period_end = $6,
                plan_id = $7,
                canceled_at = $8,
                updated_at = $9,
                last_event_at = $10,
                version = version + 1
            WHERE gateway_subscription_id = $1 AND version = $2
            "#,
        )
        .bind(&subscription.gateway_subscription_id)
        .bind(subscription.version)
        .bind(&subscription.owner_contact)
        .bind(subscription.status.as_str())
        .bind(subscription.current_period_start.as_datetime())
        .bind(subscription.current_period_end.as_datetime())
        .bind(&subscription.plan_id)
        .bind(subscription.canceled_at.map(|t| *t.as_datetime()))
        .bind(subscription.updated_at.as_datetime())
        .bind(subscription.last_event_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("update subscription", e))?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        let exists: Option<(i64,)> = sqlx::query_as(
            "SELECT version FROM subscriptions WHERE gateway_subscription_id = $1",
        )
        .bind(&subscription.gateway_subscription_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("check subscription version", e))?;

        match exists {
            Some(_) => Err(DomainError::concurrent_modification("subscription").with_detail(
                "gateway_subscription_id",
                subscription.gateway_subscription_id.clone(),
            )),
            None => Err(DomainError::new(
                ErrorCode::SubscriptionNotFound,
                format!(
                    "Subscription not found: {}",
                    subscription.gateway_subscription_id
                ),
            )),
        }
    }

    async fn find_by_gateway_id(
        &self,
        gateway_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT gateway_subscription_id, gateway_customer_id, owner_contact, status,
                   current_period_start, current_period_end, plan_id, canceled_at,
                   created_at, updated_at, last_event_at, version
            FROM subscriptions
            WHERE gateway_subscription_id = $1
            "#,
        )
        .bind(gateway_subscription_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find subscription", e))?;

        row.map(Subscription::try_from).transpose()
    }
}
