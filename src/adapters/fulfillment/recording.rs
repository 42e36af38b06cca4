//! Fulfillment dispatcher that records requests instead of sending them.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::ports::{DispatchError, FulfillmentDispatcher, FulfillmentRequest};

#[derive(Default)]
struct RecordingState {
    requests: Vec<FulfillmentRequest>,
    failure: Option<DispatchError>,
}

/// Captures dispatched requests for assertions.
#[derive(Clone, Default)]
pub struct RecordingFulfillmentDispatcher {
    inner: Arc<Mutex<RecordingState>>,
}

impl RecordingFulfillmentDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every dispatch fail with `error` (nothing is recorded).
    pub fn fail_with(&self, error: DispatchError) {
        self.state().failure = Some(error);
    }

    pub fn requests(&self) -> Vec<FulfillmentRequest> {
        self.state().requests.clone()
    }

    pub fn count(&self) -> usize {
        self.state().requests.len()
    }

    fn state(&self) -> MutexGuard<'_, RecordingState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl FulfillmentDispatcher for RecordingFulfillmentDispatcher {
    async fn dispatch(&self, request: FulfillmentRequest) -> Result<(), DispatchError> {
        let mut state = self.state();
        if let Some(error) = &state.failure {
            return Err(error.clone());
        }
        state.requests.push(request);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{OrderId, Timestamp};
    use crate::domain::pricing::{Platform, ServiceType};

    fn request() -> FulfillmentRequest {
        FulfillmentRequest {
            order_id: OrderId::generate(Timestamp::now()),
            service_type: ServiceType::TwitchFollowers,
            quantity: 100,
            target_reference: None,
            platform: Platform::Twitch,
        }
    }

    #[tokio::test]
    async fn records_in_order() {
        let dispatcher = RecordingFulfillmentDispatcher::new();
        let first = request();
        let second = request();

        dispatcher.dispatch(first.clone()).await.unwrap();
        dispatcher.dispatch(second.clone()).await.unwrap();

        assert_eq!(dispatcher.requests(), vec![first, second]);
    }

    #[tokio::test]
    async fn failure_mode_records_nothing() {
        let dispatcher = RecordingFulfillmentDispatcher::new();
        dispatcher.fail_with(DispatchError::QueueFull);

        assert_eq!(dispatcher.dispatch(request()).await, Err(DispatchError::QueueFull));
        assert_eq!(dispatcher.count(), 0);
    }
}
