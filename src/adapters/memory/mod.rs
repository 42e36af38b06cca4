//! In-memory repository adapters.
//!
//! Same conditional-write semantics as the PostgreSQL adapters (insert if
//! absent, version-checked update). Used by tests and by local runs without
//! a database.

mod customer_mapping_repository;
mod order_repository;
mod subscription_repository;

pub use customer_mapping_repository::InMemoryCustomerMappingRepository;
pub use order_repository::InMemoryOrderRepository;
pub use subscription_repository::InMemorySubscriptionRepository;
