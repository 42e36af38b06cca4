//! PostgreSQL adapters - database implementations of the repository ports.
//!
//! - `PostgresOrderRepository` - orders, keyed by order id and intent id
//! - `PostgresSubscriptionRepository` - gateway subscription mirror
//! - `PostgresCustomerMappingRepository` - contact to gateway customer links
//!
//! Schema lives in `migrations/` and is applied by [`run_migrations`].

mod customer_mapping_repository;
mod order_repository;
mod subscription_repository;

pub use customer_mapping_repository::PostgresCustomerMappingRepository;
pub use order_repository::PostgresOrderRepository;
pub use subscription_repository::PostgresSubscriptionRepository;

use sqlx::migrate::MigrateError;
use sqlx::PgPool;

/// Applies the embedded migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
