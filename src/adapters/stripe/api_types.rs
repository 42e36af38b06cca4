//! Stripe REST response bodies.
//!
//! Only the fields the gateway adapter reads are modelled; everything else
//! in the Stripe objects is ignored by serde.

use std::collections::HashMap;

use serde::Deserialize;

use crate::ports::{Customer, PaymentIntent};

/// Stripe customer object.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeCustomer {
    /// Unique customer identifier (cus_...).
    pub id: String,

    pub email: Option<String>,

    pub name: Option<String>,

    /// Unix timestamp of creation. Absent on deleted-customer stubs.
    #[serde(default)]
    pub created: i64,

    #[serde(default)]
    pub metadata: HashMap<String, String>,

    /// Set on the stub returned for deleted customers.
    #[serde(default)]
    pub deleted: bool,
}

impl From<StripeCustomer> for Customer {
    fn from(customer: StripeCustomer) -> Self {
        Customer {
            id: customer.id,
            email: customer.email,
            name: customer.name,
            created_at: customer.created,
            metadata: customer.metadata,
        }
    }
}

/// Stripe list envelope (`{"object":"list","data":[...]}`).
#[derive(Debug, Clone, Deserialize)]
pub struct StripeList<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
}

/// Stripe payment intent object.
#[derive(Debug, Clone, Deserialize)]
pub struct StripePaymentIntent {
    /// Intent identifier (pi_...).
    pub id: String,

    /// Absent when the API key lacks permission to read it.
    pub client_secret: Option<String>,

    pub amount: i64,

    pub currency: String,

    pub status: String,
}

impl StripePaymentIntent {
    /// Converts into the port type; an intent without a client secret is
    /// unusable for checkout.
    pub fn into_payment_intent(self) -> Option<PaymentIntent> {
        let client_secret = self.client_secret?;
        Some(PaymentIntent {
            id: self.id,
            client_secret,
            amount: self.amount,
            currency: self.currency,
            status: self.status,
        })
    }
}

/// Stripe error envelope (`{"error":{...}}`).
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorBody {
    pub error: StripeErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorDetail {
    /// `api_error`, `card_error`, `invalid_request_error`, ...
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    pub code: Option<String>,
    pub message: Option<String>,
    pub param: Option<String>,
}
