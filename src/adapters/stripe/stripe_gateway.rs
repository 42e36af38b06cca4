//! Stripe implementation of the `PaymentGateway` port.
//!
//! Requests are form-encoded with basic auth (API key as username), the way
//! the Stripe API expects. Non-success responses are mapped to
//! `PaymentError` from the Stripe error envelope:
//!
//! | HTTP status | PaymentErrorCode      |
//! |-------------|-----------------------|
//! | 401, 403    | AuthenticationError   |
//! | 404         | NotFound              |
//! | 429         | RateLimitExceeded     |
//! | other 4xx   | InvalidRequest        |
//! | 5xx         | ProviderError         |

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;

use crate::ports::{
    CreateCustomerRequest, CreatePaymentIntentRequest, Customer, PaymentError, PaymentErrorCode,
    PaymentGateway, PaymentIntent,
};

use super::api_types::{StripeCustomer, StripeErrorBody, StripeList, StripePaymentIntent};
use super::config::StripeConfig;

const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Largest page Stripe allows on list endpoints.
const CUSTOMER_SEARCH_LIMIT: &str = "100";

pub struct StripePaymentGateway {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripePaymentGateway {
    pub fn new(config: StripeConfig) -> Result<Self, PaymentError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaymentError::provider(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    async fn send(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, PaymentError> {
        request
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(operation, error = %e, "Stripe request failed to send");
                PaymentError::network(e.to_string())
            })
    }

    async fn parse<T: DeserializeOwned>(
        operation: &'static str,
        response: reqwest::Response,
    ) -> Result<T, PaymentError> {
        response.json::<T>().await.map_err(|e| {
            tracing::error!(operation, error = %e, "Failed to parse Stripe response");
            PaymentError::new(
                PaymentErrorCode::Unknown,
                format!("Failed to parse Stripe response: {}", e),
            )
        })
    }

    /// Drains a non-success response into a `PaymentError`.
    async fn error_from(operation: &'static str, response: reqwest::Response) -> PaymentError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let error = map_error(status, &body);

        tracing::error!(
            operation,
            status = status.as_u16(),
            code = %error.code,
            provider_code = error.provider_code.as_deref().unwrap_or(""),
            "Stripe API error"
        );
        error
    }
}

/// Maps an HTTP status and Stripe error body to a port error.
fn map_error(status: StatusCode, body: &str) -> PaymentError {
    let detail = serde_json::from_str::<StripeErrorBody>(body)
        .ok()
        .map(|b| b.error);

    let message = detail
        .as_ref()
        .and_then(|d| d.message.clone())
        .unwrap_or_else(|| format!("Stripe API error (HTTP {})", status.as_u16()));

    let code = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PaymentErrorCode::AuthenticationError,
        StatusCode::NOT_FOUND => PaymentErrorCode::NotFound,
        StatusCode::TOO_MANY_REQUESTS => PaymentErrorCode::RateLimitExceeded,
        s if s.is_server_error() => PaymentErrorCode::ProviderError,
        s if s.is_client_error() => PaymentErrorCode::InvalidRequest,
        _ => PaymentErrorCode::Unknown,
    };

    let error = PaymentError::new(code, message);
    match detail.and_then(|d| d.code.or(d.error_type)) {
        Some(provider_code) => error.with_provider_code(provider_code),
        None => error,
    }
}

/// Picks the oldest live customer from a search result.
fn oldest_customer(customers: Vec<StripeCustomer>) -> Option<StripeCustomer> {
    customers
        .into_iter()
        .filter(|c| !c.deleted)
        .min_by_key(|c| c.created)
}

fn intent_params(request: &CreatePaymentIntentRequest) -> Vec<(String, String)> {
    let mut params = vec![
        ("amount".to_string(), request.amount.to_string()),
        ("currency".to_string(), request.currency.clone()),
        ("customer".to_string(), request.customer_id.clone()),
        (
            "automatic_payment_methods[enabled]".to_string(),
            "true".to_string(),
        ),
    ];

    if let Some(description) = &request.description {
        params.push(("description".to_string(), description.clone()));
    }

    let mut keys: Vec<&String> = request.metadata.keys().collect();
    keys.sort();
    for key in keys {
        params.push((format!("metadata[{}]", key), request.metadata[key].clone()));
    }

    params
}

#[async_trait]
impl PaymentGateway for StripePaymentGateway {
    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>, PaymentError> {
        let request = self
            .http_client
            .get(self.config.endpoint("customers"))
            .query(&[("email", email), ("limit", CUSTOMER_SEARCH_LIMIT)]);

        let response = self.send("find_customer_by_email", request).await?;
        if !response.status().is_success() {
            return Err(Self::error_from("find_customer_by_email", response).await);
        }

        let list: StripeList<StripeCustomer> = Self::parse("find_customer_by_email", response).await?;
        if list.has_more {
            tracing::warn!("More than one page of Stripe customers share an email");
        }

        Ok(oldest_customer(list.data).map(Customer::from))
    }

    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, PaymentError> {
        let mut params = vec![
            ("email", request.email.clone()),
            ("metadata[user_id]", request.user_id.to_string()),
        ];

        if let Some(name) = &request.name {
            params.push(("name", name.clone()));
        }

        let mut builder = self
            .http_client
            .post(self.config.endpoint("customers"))
            .form(&params);
        if let Some(key) = &request.idempotency_key {
            builder = builder.header(IDEMPOTENCY_HEADER, key);
        }

        let response = self.send("create_customer", builder).await?;
        if !response.status().is_success() {
            return Err(Self::error_from("create_customer", response).await);
        }

        let customer: StripeCustomer = Self::parse("create_customer", response).await?;
        tracing::info!(customer_id = %customer.id, user_id = %request.user_id, "Created Stripe customer");

        let mut customer = Customer::from(customer);
        if customer.email.is_none() {
            customer.email = Some(request.email);
        }
        Ok(customer)
    }

    async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>, PaymentError> {
        let request = self
            .http_client
            .get(self.config.endpoint(&format!("customers/{}", customer_id)));

        let response = self.send("get_customer", request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::error_from("get_customer", response).await);
        }

        let customer: StripeCustomer = Self::parse("get_customer", response).await?;
        if customer.deleted {
            return Ok(None);
        }

        Ok(Some(customer.into()))
    }

    async fn create_payment_intent(
        &self,
        request: CreatePaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError> {
        let mut builder = self
            .http_client
            .post(self.config.endpoint("payment_intents"))
            .form(&intent_params(&request));
        if let Some(key) = &request.idempotency_key {
            builder = builder.header(IDEMPOTENCY_HEADER, key);
        }

        let response = self.send("create_payment_intent", builder).await?;
        if !response.status().is_success() {
            return Err(Self::error_from("create_payment_intent", response).await);
        }

        let intent: StripePaymentIntent = Self::parse("create_payment_intent", response).await?;
        let intent_id = intent.id.clone();

        intent.into_payment_intent().ok_or_else(|| {
            tracing::error!(intent_id = %intent_id, "Stripe returned a payment intent without client_secret");
            PaymentError::new(
                PaymentErrorCode::Unknown,
                "Payment intent response is missing client_secret",
            )
        })
    }
}
