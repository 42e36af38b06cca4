//! HTTP handlers for payment, order and fulfillment-report endpoints.
//!
//! These connect axum routes to the application command/query handlers.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Json, Path, Request, State};
use axum::http::{request::Parts, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use subtle::ConstantTimeEq;

use crate::adapters::http::middleware::RequireAuth;
use crate::application::handlers::checkout::{
    CreatePaymentIntentCommand, CreatePaymentIntentHandler, GetOrderHandler, GetOrderQuery,
};
use crate::application::handlers::fulfillment::{
    ReportFulfillmentCommand, ReportFulfillmentHandler,
};
use crate::application::handlers::webhook::{
    HandleGatewayWebhookCommand, HandleGatewayWebhookHandler,
};
use crate::domain::order::CheckoutError;
use crate::domain::webhook::WebhookError;

use super::dto::{
    CreatePaymentIntentRequest, ErrorResponse, FulfillmentReportRequest, OrderResponse,
    PaymentIntentResponse, WebhookAckResponse,
};

pub const SIGNATURE_HEADER: &str = "Stripe-Signature";
pub const FULFILLMENT_TOKEN_HEADER: &str = "X-Fulfillment-Token";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the checkout routes.
///
/// Handlers are built once at startup and shared behind `Arc`.
#[derive(Clone)]
pub struct CheckoutAppState {
    pub create_intent: Arc<CreatePaymentIntentHandler>,
    pub get_order: Arc<GetOrderHandler>,
    pub webhook: Arc<HandleGatewayWebhookHandler>,
    pub report_fulfillment: Arc<ReportFulfillmentHandler>,
    /// Shared secret for worker reports. Reports are refused when unset.
    pub fulfillment_report_token: Option<Arc<SecretString>>,
}

impl CheckoutAppState {
    fn report_token_matches(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = &self.fulfillment_report_token else {
            return false;
        };
        let Some(presented) = headers
            .get(FULFILLMENT_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
        else {
            return false;
        };
        bool::from(
            presented
                .as_bytes()
                .ct_eq(expected.expose_secret().as_bytes()),
        )
    }
}

/// Proof that the caller presented the fulfillment worker's shared secret.
///
/// Checked from the headers alone, before the body is read.
#[derive(Debug, Clone, Copy)]
pub struct WorkerToken;

#[async_trait]
impl FromRequestParts<CheckoutAppState> for WorkerToken {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &CheckoutAppState,
    ) -> Result<Self, Self::Rejection> {
        if state.report_token_matches(&parts.headers) {
            return Ok(WorkerToken);
        }
        tracing::warn!(path = %parts.uri.path(), "Fulfillment report with missing or wrong token");
        let body = ErrorResponse::new("UNAUTHENTICATED", "Invalid fulfillment token");
        Err((StatusCode::UNAUTHORIZED, Json(body)).into_response())
    }
}

/// JSON body whose rejections are reported as checkout validation errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckoutJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for CheckoutJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = CheckoutApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(CheckoutJson(value)),
            Err(rejection) => Err(body_rejection(rejection)),
        }
    }
}

fn body_rejection(rejection: JsonRejection) -> CheckoutApiError {
    tracing::debug!(error = %rejection, "Rejected request body");
    CheckoutApiError(CheckoutError::validation("body", rejection.body_text()))
}

// ════════════════════════════════════════════════════════════════════════════════
// Payment intents and orders
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/payments/intent - Start a checkout
pub async fn create_payment_intent(
    State(state): State<CheckoutAppState>,
    RequireAuth(user): RequireAuth,
    CheckoutJson(request): CheckoutJson<CreatePaymentIntentRequest>,
) -> Result<impl IntoResponse, CheckoutApiError> {
    let cmd = CreatePaymentIntentCommand {
        owner: user,
        service_type: request.service_type,
        quantity: request.quantity,
        amount: request.amount,
        target_reference: request.target_url,
        platform: request.platform,
    };

    let result = state.create_intent.handle(cmd).await?;

    Ok(Json(PaymentIntentResponse::from(result)))
}

/// GET /api/orders/{order_id} - The caller's own order
pub async fn get_order(
    State(state): State<CheckoutAppState>,
    RequireAuth(user): RequireAuth,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, CheckoutApiError> {
    let query = GetOrderQuery {
        order_id,
        requested_by: user.id,
    };

    let order = state.get_order.handle(query).await?;

    Ok(Json(OrderResponse::from(&order)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Gateway webhook
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/webhooks/stripe - Gateway event delivery
///
/// The raw body is required for signature verification, so it is taken as
/// bytes rather than JSON.
pub async fn handle_stripe_webhook(
    State(state): State<CheckoutAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let cmd = HandleGatewayWebhookCommand {
        payload: body.to_vec(),
        signature,
    };

    state.webhook.handle(cmd).await?;

    Ok(Json(WebhookAckResponse::received()))
}

// ════════════════════════════════════════════════════════════════════════════════
// Fulfillment worker reports
// ════════════════════════════════════════════════════════════════════════════════

/// POST /internal/fulfillment/{order_id}/report - Worker completion report
pub async fn report_fulfillment(
    State(state): State<CheckoutAppState>,
    _worker: WorkerToken,
    Path(order_id): Path<String>,
    CheckoutJson(request): CheckoutJson<FulfillmentReportRequest>,
) -> Result<impl IntoResponse, CheckoutApiError> {
    let cmd = ReportFulfillmentCommand {
        order_id,
        outcome: request.outcome,
        reason: request.reason,
    };

    let result = state.report_fulfillment.handle(cmd).await?;

    Ok(Json(OrderResponse::from(&result.order)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// Converts checkout errors to JSON responses.
#[derive(Debug)]
pub struct CheckoutApiError(pub CheckoutError);

impl From<CheckoutError> for CheckoutApiError {
    fn from(err: CheckoutError) -> Self {
        Self(err)
    }
}

impl IntoResponse for CheckoutApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CheckoutError::ValidationFailed { .. }
            | CheckoutError::AmountMismatch { .. }
            | CheckoutError::UnsupportedSelection(_) => StatusCode::BAD_REQUEST,
            CheckoutError::OrderNotFound(_) => StatusCode::NOT_FOUND,
            CheckoutError::InvalidState { .. } => StatusCode::CONFLICT,
            CheckoutError::CustomerResolution(_)
            | CheckoutError::Gateway { .. }
            | CheckoutError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "Checkout request failed");
        }

        let body = ErrorResponse::new(self.0.code().to_string(), self.0.message());
        (status, Json(body)).into_response()
    }
}

/// Converts webhook errors to the status the gateway acts on.
#[derive(Debug)]
pub struct WebhookApiError(pub WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> Response {
        let error_code = match &self.0 {
            e if e.is_authentication_failure() => "INVALID_SIGNATURE",
            WebhookError::Storage(_) => "STORAGE_ERROR",
            _ => "INVALID_PAYLOAD",
        };

        let body = ErrorResponse::new(error_code, self.0.to_string());
        (self.0.status_code(), Json(body)).into_response()
    }
}
