//! Fulfillment worker configuration

use secrecy::SecretString;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::fulfillment::FulfillmentWorkerConfig;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct FulfillmentConfig {
    /// Endpoint receiving order notifications
    pub worker_url: String,

    /// Bearer token sent to the worker
    pub worker_token: Option<String>,

    /// Shared secret the worker presents when reporting outcomes.
    /// Reports are refused while unset.
    pub report_token: Option<String>,

    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl FulfillmentConfig {
    pub fn worker_config(&self) -> FulfillmentWorkerConfig {
        let config = FulfillmentWorkerConfig::new(&self.worker_url)
            .with_timeout(Duration::from_secs(self.request_timeout_secs));
        match non_blank(&self.worker_token) {
            Some(token) => config.with_token(SecretString::new(token.to_string())),
            None => config,
        }
    }

    pub fn report_token(&self) -> Option<Arc<SecretString>> {
        non_blank(&self.report_token).map(|t| Arc::new(SecretString::new(t.to_string())))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.worker_url.is_empty() {
            return Err(ValidationError::MissingRequired("FULFILLMENT_WORKER_URL"));
        }
        if !self.worker_url.starts_with("http://") && !self.worker_url.starts_with("https://") {
            return Err(ValidationError::InvalidUrl("fulfillment.worker_url"));
        }
        if self.queue_capacity == 0 {
            return Err(ValidationError::InvalidQueueCapacity);
        }
        if self.request_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for FulfillmentConfig {
    fn default() -> Self {
        Self {
            worker_url: String::new(),
            worker_token: None,
            report_token: None,
            queue_capacity: default_queue_capacity(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_request_timeout() -> u64 {
    10
}
