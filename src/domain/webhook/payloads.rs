//! Gateway objects carried inside webhook events.
//!
//! Fields moved between gateway API versions (subscription periods now live
//! on subscription items, invoice subscriptions under `parent`), so the
//! accessors here look in both places.

use serde::Deserialize;
use std::collections::HashMap;

use crate::domain::foundation::Timestamp;
use crate::domain::subscription::BillingPeriod;

use super::WebhookError;

/// `payment_intent` object.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntentObject {
    pub id: String,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub last_payment_error: Option<LastPaymentError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LastPaymentError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub decline_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl PaymentIntentObject {
    /// Human-readable failure reason, when the gateway supplied one.
    pub fn failure_reason(&self) -> Option<String> {
        let error = self.last_payment_error.as_ref()?;
        error
            .message
            .clone()
            .or_else(|| error.decline_code.clone())
            .or_else(|| error.code.clone())
    }
}

/// `invoice` object.
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceObject {
    pub id: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub subscription: Option<String>,
    #[serde(default)]
    pub parent: Option<InvoiceParent>,
    #[serde(default)]
    pub lines: Option<InvoiceLines>,
    #[serde(default)]
    pub period_start: Option<i64>,
    #[serde(default)]
    pub period_end: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceParent {
    #[serde(default)]
    pub subscription_details: Option<SubscriptionDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionDetails {
    #[serde(default)]
    pub subscription: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceLines {
    #[serde(default)]
    pub data: Vec<InvoiceLine>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceLine {
    #[serde(default)]
    pub period: Option<PeriodObject>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PeriodObject {
    pub start: i64,
    pub end: i64,
}

impl InvoiceObject {
    /// Subscription the invoice bills, if any.
    pub fn subscription_id(&self) -> Option<&str> {
        self.subscription
            .as_deref()
            .or_else(|| {
                self.parent
                    .as_ref()?
                    .subscription_details
                    .as_ref()?
                    .subscription
                    .as_deref()
            })
            .filter(|id| !id.is_empty())
    }

    /// Billing period the invoice covers.
    ///
    /// Line items carry the subscription period; the invoice-level fields are
    /// only a fallback.
    pub fn billing_period(&self) -> Result<Option<BillingPeriod>, WebhookError> {
        let from_lines = self
            .lines
            .as_ref()
            .and_then(|lines| lines.data.iter().find_map(|line| line.period));

        match (from_lines, self.period_start, self.period_end) {
            (Some(period), _, _) => to_period(period.start, period.end).map(Some),
            (None, Some(start), Some(end)) => to_period(start, end).map(Some),
            _ => Ok(None),
        }
    }
}

/// `subscription` object.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionObject {
    pub id: String,
    pub customer: String,
    pub status: String,
    #[serde(default)]
    pub current_period_start: Option<i64>,
    #[serde(default)]
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub items: Option<SubscriptionItems>,
    #[serde(default)]
    pub plan: Option<PlanObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionItems {
    #[serde(default)]
    pub data: Vec<SubscriptionItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionItem {
    #[serde(default)]
    pub price: Option<PriceObject>,
    #[serde(default)]
    pub current_period_start: Option<i64>,
    #[serde(default)]
    pub current_period_end: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceObject {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanObject {
    pub id: String,
}

impl SubscriptionObject {
    fn first_item(&self) -> Option<&SubscriptionItem> {
        self.items.as_ref().and_then(|items| items.data.first())
    }

    pub fn plan_id(&self) -> Option<String> {
        self.first_item()
            .and_then(|item| item.price.as_ref())
            .map(|price| price.id.clone())
            .or_else(|| self.plan.as_ref().map(|plan| plan.id.clone()))
    }

    pub fn billing_period(&self) -> Result<Option<BillingPeriod>, WebhookError> {
        let item = self.first_item();
        let start = self
            .current_period_start
            .or_else(|| item.and_then(|i| i.current_period_start));
        let end = self
            .current_period_end
            .or_else(|| item.and_then(|i| i.current_period_end));

        match (start, end) {
            (Some(start), Some(end)) => to_period(start, end).map(Some),
            _ => Ok(None),
        }
    }
}

fn to_period(start: i64, end: i64) -> Result<BillingPeriod, WebhookError> {
    let start = Timestamp::from_unix_secs(start).map_err(|e| WebhookError::ParseError(e.to_string()))?;
    let end = Timestamp::from_unix_secs(end).map_err(|e| WebhookError::ParseError(e.to_string()))?;
    if end.is_before(&start) {
        return Err(WebhookError::ParseError(
            "billing period ends before it starts".to_string(),
        ));
    }
    Ok(BillingPeriod { start, end })
}
