//! Outbound delivery of one payload to one destination.

use async_trait::async_trait;
use reqwest::{Client, header};

use crate::error::DeliveryError;

/// Performs the outbound call for one payload to one destination and
/// classifies the outcome.
#[async_trait]
pub trait DeliveryClient: Send + Sync {
    async fn deliver(&self, destination: &str, payload: &[u8]) -> Result<(), DeliveryError>;
}

/// HTTP delivery client.
///
/// One POST per attempt with `Content-Type: application/json`, platform
/// default timeout and redirect behavior. No retries: delivery is a single
/// best-effort attempt.
#[derive(Debug, Clone, Default)]
pub struct HttpDeliveryClient {
    client: Client,
}

impl HttpDeliveryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a caller-provided client (shared connection pools, proxies,
    /// custom TLS).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DeliveryClient for HttpDeliveryClient {
    async fn deliver(&self, destination: &str, payload: &[u8]) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(destination)
            .header(header::CONTENT_TYPE, "application/json")
            .body(payload.to_vec())
            .send()
            .await
            .map_err(|source| DeliveryError::Transport {
                url: destination.to_owned(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        // Body text is best effort; a failed read must not mask the status.
        let body = response.text().await.unwrap_or_default();
        Err(DeliveryError::RemoteRejected {
            status,
            url: destination.to_owned(),
            body,
        })
    }
}
