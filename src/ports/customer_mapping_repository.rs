//! Customer mapping port.
//!
//! One row per normalized contact identifier, pointing at a gateway
//! customer. Rows are created lazily on first charge and never updated.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Timestamp, UserId};

/// Link between a caller identity and a gateway customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerMapping {
    /// Normalized (trimmed, lower-cased) contact identifier.
    pub owner_contact: String,
    pub gateway_customer_id: String,
    /// Internal user id, when known at mapping time.
    pub owner_id: Option<UserId>,
    pub created_at: Timestamp,
}

#[async_trait]
pub trait CustomerMappingRepository: Send + Sync {
    async fn find_by_contact(&self, contact: &str) -> Result<Option<CustomerMapping>, DomainError>;

    async fn find_by_gateway_customer_id(
        &self,
        gateway_customer_id: &str,
    ) -> Result<Option<CustomerMapping>, DomainError>;

    /// Saves the mapping unless the contact is already mapped.
    ///
    /// Returns the stored mapping, which is the earlier row when a
    /// concurrent resolution won the race.
    async fn save_if_absent(&self, mapping: &CustomerMapping) -> Result<CustomerMapping, DomainError>;
}
