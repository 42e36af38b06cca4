//! Background task that forwards queued fulfillment requests to the worker.
//!
//! Each request becomes one `POST <worker_url>` with the request as JSON and
//! an optional bearer token. Delivery is best effort: failures are logged and
//! the order stays `processing`, which is the observable signal for
//! operators. The worker later reports back through the internal endpoint.
//!
//! On shutdown the task drains whatever is already queued, then stops.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{mpsc, watch};

use crate::ports::{DispatchError, FulfillmentRequest};

#[derive(Clone)]
pub struct FulfillmentWorkerConfig {
    pub worker_url: String,
    pub worker_token: Option<SecretString>,
    pub request_timeout: Duration,
}

impl FulfillmentWorkerConfig {
    pub fn new(worker_url: impl Into<String>) -> Self {
        Self {
            worker_url: worker_url.into(),
            worker_token: None,
            request_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_token(mut self, token: SecretString) -> Self {
        self.worker_token = Some(token);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

pub struct FulfillmentWorkerClient {
    config: FulfillmentWorkerConfig,
    http_client: reqwest::Client,
}

impl FulfillmentWorkerClient {
    pub fn new(config: FulfillmentWorkerConfig) -> Result<Self, DispatchError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| DispatchError::Rejected(format!("HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Sends one notification.
    pub async fn notify(&self, request: &FulfillmentRequest) -> Result<(), DispatchError> {
        let mut builder = self.http_client.post(&self.config.worker_url).json(request);
        if let Some(token) = &self.config.worker_token {
            builder = builder.bearer_auth(token.expose_secret());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| DispatchError::Rejected(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DispatchError::Rejected(format!("HTTP {}: {}", status.as_u16(), body)));
        }

        Ok(())
    }

    /// Runs until the queue closes or shutdown is signalled.
    pub async fn run(
        self,
        mut receiver: mpsc::Receiver<FulfillmentRequest>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        tracing::info!(worker_url = %self.config.worker_url, "Fulfillment worker client started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        receiver.close();
                        while let Some(request) = receiver.recv().await {
                            self.deliver(&request).await;
                        }
                        break;
                    }
                }

                next = receiver.recv() => {
                    match next {
                        Some(request) => self.deliver(&request).await,
                        None => break,
                    }
                }
            }
        }

        tracing::info!("Fulfillment worker client stopped");
    }

    async fn deliver(&self, request: &FulfillmentRequest) {
        match self.notify(request).await {
            Ok(()) => tracing::info!(
                order_id = %request.order_id,
                service_type = %request.service_type,
                quantity = request.quantity,
                "Fulfillment worker notified"
            ),
            Err(e) => tracing::error!(
                order_id = %request.order_id,
                error = %e,
                "Fulfillment worker notification failed; order remains processing"
            ),
        }
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
            service_type: ServiceType::YoutubeViews,
            quantity: 1000,
            target_reference: None,
            platform: Platform::Youtube,
        }
    }

    fn unreachable_client() -> FulfillmentWorkerClient {
        FulfillmentWorkerClient::new(
            FulfillmentWorkerConfig::new("http://127.0.0.1:9/fulfill")
                .with_timeout(Duration::from_millis(200)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn unreachable_worker_is_rejected() {
        let err = unreachable_client().notify(&request()).await.unwrap_err();
        assert!(matches!(err, DispatchError::Rejected(_)));
    }

    #[tokio::test]
    async fn run_stops_when_queue_closes() {
        let (sender, receiver) = mpsc::channel(4);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        drop(sender);

        tokio::time::timeout(
            Duration::from_secs(2),
            unreachable_client().run(receiver, shutdown_rx),
        )
        .await
        .expect("worker loop should exit once the queue is closed");
    }

    #[tokio::test]
    async fn run_drains_and_stops_on_shutdown() {
        let (sender, receiver) = mpsc::channel(4);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        sender.send(request()).await.unwrap();
        shutdown_tx.send(true).unwrap();

        tokio::time::timeout(
            Duration::from_secs(5),
            unreachable_client().run(receiver, shutdown_rx),
        )
        .await
        .expect("worker loop should exit after shutdown");
    }
}
