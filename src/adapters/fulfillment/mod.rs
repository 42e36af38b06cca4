//! Fulfillment dispatch adapters.
//!
//! - `QueuedFulfillmentDispatcher` - bounded in-process queue, the production
//!   `FulfillmentDispatcher`
//! - `FulfillmentWorkerClient` - background task draining the queue into
//!   HTTP notifications to the external worker
//! - `RecordingFulfillmentDispatcher` - captures requests for tests

mod queue;
mod recording;
mod worker_client;

pub use queue::QueuedFulfillmentDispatcher;
pub use recording::RecordingFulfillmentDispatcher;
pub use worker_client::{FulfillmentWorkerClient, FulfillmentWorkerConfig};
