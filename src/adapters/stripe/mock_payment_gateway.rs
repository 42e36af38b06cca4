//! Mock payment gateway for testing.
//!
//! Provides a configurable in-process implementation of `PaymentGateway`
//! for unit and integration tests. Supports:
//! - Stored customers (searchable by email)
//! - Idempotency keys, replayed like the real gateway does
//! - Error injection, globally or per method
//! - Call tracking

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::ports::{
    CreateCustomerRequest, CreatePaymentIntentRequest, Customer, PaymentError, PaymentGateway,
    PaymentIntent,
};

/// Mock payment gateway for testing.
///
/// # Example
///
/// ```ignore
/// let gateway = MockPaymentGateway::new();
/// gateway.set_method_error("create_payment_intent", PaymentError::provider("down"));
///
/// let result = gateway.create_payment_intent(request).await;
/// assert!(result.is_err());
/// ```
#[derive(Default, Clone)]
pub struct MockPaymentGateway {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Customers by id.
    customers: HashMap<String, Customer>,

    /// Intents created so far, with the request that created them.
    intents: Vec<(PaymentIntent, CreatePaymentIntentRequest)>,

    /// Results already returned per idempotency key.
    idempotent_customers: HashMap<String, Customer>,
    idempotent_intents: HashMap<String, PaymentIntent>,

    /// Monotonic counter used for ids and creation times.
    sequence: u64,

    /// Error to return on next call.
    next_error: Option<PaymentError>,

    /// Sticky errors by method name.
    method_errors: HashMap<String, PaymentError>,

    call_log: Vec<MethodCall>,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Adds a customer to the gateway's "database".
    pub fn add_customer(&self, customer: Customer) {
        let id = customer.id.clone();
        self.state().customers.insert(id, customer);
    }

    /// Set an error to return on the next call to any method.
    pub fn set_error(&self, error: PaymentError) {
        self.state().next_error = Some(error);
    }

    /// Set an error for a specific method until cleared.
    pub fn set_method_error(&self, method: &str, error: PaymentError) {
        self.state().method_errors.insert(method.to_string(), error);
    }

    pub fn clear_errors(&self) {
        let mut state = self.state();
        state.next_error = None;
        state.method_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Inspection
    // ════════════════════════════════════════════════════════════════════════════

    pub fn customers(&self) -> Vec<Customer> {
        self.state().customers.values().cloned().collect()
    }

    /// Payment intents created so far, oldest first.
    pub fn created_intents(&self) -> Vec<(PaymentIntent, CreatePaymentIntentRequest)> {
        self.state().intents.clone()
    }

    pub fn calls(&self) -> Vec<MethodCall> {
        self.state().call_log.clone()
    }

    pub fn was_called(&self, method: &str) -> bool {
        self.state().call_log.iter().any(|c| c.method == method)
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    pub fn clear_calls(&self) {
        self.state().call_log.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.state().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
    }

    fn check_error(&self, method: &str) -> Result<(), PaymentError> {
        let mut state = self.state();

        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }

        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        Ok(())
    }
}

impl MockState {
    fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>, PaymentError> {
        self.record_call("find_customer_by_email", vec![email.to_string()]);
        self.check_error("find_customer_by_email")?;

        let state = self.state();
        Ok(state
            .customers
            .values()
            .filter(|c| {
                c.email
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(email))
            })
            .min_by_key(|c| c.created_at)
            .cloned())
    }

    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, PaymentError> {
        self.record_call(
            "create_customer",
            vec![request.user_id.to_string(), request.email.clone()],
        );
        self.check_error("create_customer")?;

        let mut state = self.state();
        if let Some(key) = &request.idempotency_key {
            if let Some(existing) = state.idempotent_customers.get(key) {
                return Ok(existing.clone());
            }
        }

        let sequence = state.next_sequence();
        let customer = Customer {
            id: format!("cus_mock_{}", sequence),
            email: Some(request.email),
            name: request.name,
            created_at: sequence as i64,
            metadata: HashMap::from([("user_id".to_string(), request.user_id.to_string())]),
        };

        state
            .customers
            .insert(customer.id.clone(), customer.clone());
        if let Some(key) = request.idempotency_key {
            state.idempotent_customers.insert(key, customer.clone());
        }

        Ok(customer)
    }

    async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>, PaymentError> {
        self.record_call("get_customer", vec![customer_id.to_string()]);
        self.check_error("get_customer")?;

        Ok(self.state().customers.get(customer_id).cloned())
    }

    async fn create_payment_intent(
        &self,
        request: CreatePaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError> {
        self.record_call(
            "create_payment_intent",
            vec![request.customer_id.clone(), request.amount.to_string()],
        );
        self.check_error("create_payment_intent")?;

        let mut state = self.state();
        if let Some(key) = &request.idempotency_key {
            if let Some(existing) = state.idempotent_intents.get(key) {
                return Ok(existing.clone());
            }
        }

        let sequence = state.next_sequence();
        let id = format!("pi_mock_{}", sequence);
        let intent = PaymentIntent {
            client_secret: format!("{}_secret_mock", id),
            id,
            amount: request.amount,
            currency: request.currency.clone(),
            status: "requires_payment_method".to_string(),
        };

        if let Some(key) = &request.idempotency_key {
            state.idempotent_intents.insert(key.clone(), intent.clone());
        }
        state.intents.push((intent.clone(), request));

        Ok(intent)
    }
}
