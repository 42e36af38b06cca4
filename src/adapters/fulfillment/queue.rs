//! Bounded in-process fulfillment queue.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::ports::{DispatchError, FulfillmentDispatcher, FulfillmentRequest};

/// Sending half of the fulfillment queue.
///
/// `dispatch` never waits: a full queue is reported immediately so the
/// webhook acknowledgement is never held up by a slow worker.
#[derive(Debug, Clone)]
pub struct QueuedFulfillmentDispatcher {
    sender: mpsc::Sender<FulfillmentRequest>,
}

impl QueuedFulfillmentDispatcher {
    /// Creates the queue; the receiver goes to the worker task.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<FulfillmentRequest>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl FulfillmentDispatcher for QueuedFulfillmentDispatcher {
    async fn dispatch(&self, request: FulfillmentRequest) -> Result<(), DispatchError> {
        self.sender.try_send(request).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DispatchError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => DispatchError::QueueClosed,
        })
    }
}
