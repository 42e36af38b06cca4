//! PostgreSQL implementation of CustomerMappingRepository.
//!
//! `owner_contact` is the primary key; concurrent first-time resolutions
//! race on the insert and everyone reads back the winning row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::{normalize_contact, DomainError, ErrorCode, Timestamp, UserId};
use crate::ports::{CustomerMapping, CustomerMappingRepository};

pub struct PostgresCustomerMappingRepository {
    pool: PgPool,
}

impl PostgresCustomerMappingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CustomerMappingRow {
    owner_contact: String,
    gateway_customer_id: String,
    owner_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<CustomerMappingRow> for CustomerMapping {
    type Error = DomainError;

    fn try_from(row: CustomerMappingRow) -> Result<Self, Self::Error> {
        let owner_id = row
            .owner_id
            .map(UserId::new)
            .transpose()
            .map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid owner_id: {}", e))
            })?;

        Ok(CustomerMapping {
            owner_contact: row.owner_contact,
            gateway_customer_id: row.gateway_customer_id,
            owner_id,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

fn db_error(action: &str, err: sqlx::Error) -> DomainError {
    DomainError::database(format!("Failed to {}: {}", action, err))
}

#[async_trait]
impl CustomerMappingRepository for PostgresCustomerMappingRepository {
    async fn find_by_contact(&self, contact: &str) -> Result<Option<CustomerMapping>, DomainError> {
        let row: Option<CustomerMappingRow> = sqlx::query_as(
            r#"
            SELECT owner_contact, gateway_customer_id, owner_id, created_at
            FROM customer_mappings
            WHERE owner_contact = $1
            "#,
        )
        .bind(normalize_contact(contact))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find customer mapping", e))?;

        row.map(CustomerMapping::try_from).transpose()
    }

    async fn find_by_gateway_customer_id(
        &self,
        gateway_customer_id: &str,
    ) -> Result<Option<CustomerMapping>, DomainError> {
        let row: Option<CustomerMappingRow> = sqlx::query_as(
            r#"
            SELECT owner_contact, gateway_customer_id, owner_id, created_at
            FROM customer_mappings
            WHERE gateway_customer_id = $1
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(gateway_customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find customer mapping", e))?;

        row.map(CustomerMapping::try_from).transpose()
    }

    async fn save_if_absent(&self, mapping: &CustomerMapping) -> Result<CustomerMapping, DomainError> {
        let contact = normalize_contact(&mapping.owner_contact);

        sqlx::query(
            r#"
            INSERT INTO customer_mappings (owner_contact, gateway_customer_id, owner_id, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (owner_contact) DO NOTHING
            "#,
        )
        .bind(&contact)
        .bind(&mapping.gateway_customer_id)
        .bind(mapping.owner_id.as_ref().map(UserId::as_str))
        .bind(mapping.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("save customer mapping", e))?;

        self.find_by_contact(&contact).await?.ok_or_else(|| {
            DomainError::database(format!("Customer mapping for {} vanished after insert", contact))
        })
    }
}
