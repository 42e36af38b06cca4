//! In-memory customer mapping repository.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{normalize_contact, DomainError};
use crate::ports::{CustomerMapping, CustomerMappingRepository};

/// Mappings keyed by normalized contact.
#[derive(Clone, Default)]
pub struct InMemoryCustomerMappingRepository {
    mappings: Arc<RwLock<HashMap<String, CustomerMapping>>>,
    fail_all: Arc<AtomicBool>,
}

impl InMemoryCustomerMappingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes reads and writes fail with a database error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.fail_all.store(unavailable, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.mappings.read().await.len()
    }

    fn check_available(&self) -> Result<(), DomainError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(DomainError::database("customer mapping store unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl CustomerMappingRepository for InMemoryCustomerMappingRepository {
    async fn find_by_contact(&self, contact: &str) -> Result<Option<CustomerMapping>, DomainError> {
        self.check_available()?;
        Ok(self
            .mappings
            .read()
            .await
            .get(&normalize_contact(contact))
            .cloned())
    }

    async fn find_by_gateway_customer_id(
        &self,
        gateway_customer_id: &str,
    ) -> Result<Option<CustomerMapping>, DomainError> {
        self.check_available()?;
        Ok(self
            .mappings
            .read()
            .await
            .values()
            .filter(|m| m.gateway_customer_id == gateway_customer_id)
            .min_by_key(|m| m.created_at)
            .cloned())
    }

    async fn save_if_absent(&self, mapping: &CustomerMapping) -> Result<CustomerMapping, DomainError> {
        self.check_available()?;

        let key = normalize_contact(&mapping.owner_contact);
        let mut mappings = self.mappings.write().await;
        let stored = mappings.entry(key.clone()).or_insert_with(|| CustomerMapping {
            owner_contact: key,
            ..mapping.clone()
        });
        Ok(stored.clone())
    }
}
