//! CustomerResolver - maps a caller identity to a gateway customer.
//!
//! Resolution order: local mapping by contact, gateway search by email,
//! gateway create. Whatever the gateway answers is recorded in the mapping
//! store so the next checkout skips the gateway round trip.

use std::sync::Arc;

use crate::domain::foundation::{normalize_contact, AuthenticatedUser, Timestamp};
use crate::domain::order::CheckoutError;
use crate::ports::{CreateCustomerRequest, CustomerMapping, CustomerMappingRepository, PaymentGateway};

pub struct CustomerResolver {
    gateway: Arc<dyn PaymentGateway>,
    mappings: Arc<dyn CustomerMappingRepository>,
}

impl CustomerResolver {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        mappings: Arc<dyn CustomerMappingRepository>,
    ) -> Self {
        Self { gateway, mappings }
    }

    /// Returns the gateway customer id for `owner`, creating the customer on
    /// first use.
    ///
    /// Two first-time resolutions racing each other may both create a
    /// gateway customer; the mapping store keeps whichever was saved first
    /// and both callers return that one.
    pub async fn resolve(&self, owner: &AuthenticatedUser) -> Result<String, CheckoutError> {
        let contact = owner.contact();
        if contact.is_empty() {
            return Err(CheckoutError::validation(
                "email",
                "caller identity carries no contact email",
            ));
        }

        // 1. Local mapping
        match self.mappings.find_by_contact(&contact).await {
            Ok(Some(mapping)) => return Ok(mapping.gateway_customer_id),
            Ok(None) => {}
            Err(e) => tracing::warn!(
                user_id = %owner.id,
                error = %e,
                "Customer mapping lookup failed, falling back to the gateway"
            ),
        }

        // 2. Existing gateway customer
        let existing = self
            .gateway
            .find_customer_by_email(&contact)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %owner.id, error = %e, "Customer search failed");
                CheckoutError::customer_resolution(e.message)
            })?;

        // 3. New gateway customer
        let customer_id = match existing {
            Some(customer) => customer.id,
            None => {
                let created = self
                    .gateway
                    .create_customer(CreateCustomerRequest {
                        user_id: owner.id.clone(),
                        email: contact.clone(),
                        name: owner.display_name.clone(),
                        idempotency_key: Some(format!("customer-{}", owner.id)),
                    })
                    .await
                    .map_err(|e| {
                        tracing::error!(user_id = %owner.id, error = %e, "Customer creation failed");
                        CheckoutError::customer_resolution(e.message)
                    })?;
                tracing::info!(
                    user_id = %owner.id,
                    customer_id = %created.id,
                    "Created gateway customer"
                );
                created.id
            }
        };

        Ok(self.remember(owner, contact, customer_id).await)
    }

    /// Finds the contact for a gateway customer: local mapping first, then
    /// the gateway's customer record.
    pub async fn contact_for_customer(&self, gateway_customer_id: &str) -> Option<String> {
        match self
            .mappings
            .find_by_gateway_customer_id(gateway_customer_id)
            .await
        {
            Ok(Some(mapping)) => return Some(mapping.owner_contact),
            Ok(None) => {}
            Err(e) => tracing::warn!(
                customer_id = gateway_customer_id,
                error = %e,
                "Customer mapping lookup failed"
            ),
        }

        match self.gateway.get_customer(gateway_customer_id).await {
            Ok(Some(customer)) => customer
                .email
                .map(|email| normalize_contact(&email))
                .filter(|contact| !contact.is_empty()),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(
                    customer_id = gateway_customer_id,
                    error = %e,
                    "Gateway customer lookup failed"
                );
                None
            }
        }
    }

    async fn remember(
        &self,
        owner: &AuthenticatedUser,
        contact: String,
        customer_id: String,
    ) -> String {
        let mapping = CustomerMapping {
            owner_contact: contact,
            gateway_customer_id: customer_id.clone(),
            owner_id: Some(owner.id.clone()),
            created_at: Timestamp::now(),
        };

        match self.mappings.save_if_absent(&mapping).await {
            Ok(stored) => {
                if stored.gateway_customer_id != customer_id {
                    tracing::info!(
                        user_id = %owner.id,
                        kept = %stored.gateway_customer_id,
                        discarded = %customer_id,
                        "Contact was mapped concurrently, keeping the earlier customer"
                    );
                }
                stored.gateway_customer_id
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %owner.id,
                    customer_id = %customer_id,
                    error = %e,
                    "Failed to record customer mapping"
                );
                customer_id
            }
        }
    }
}
