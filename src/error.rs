//! Error taxonomy for the fan-out path.
//!
//! [`NotifyError`] aborts a whole `notify` call before anything is sent;
//! [`DeliveryError`] is scoped to one delivery attempt and never escapes the
//! fan-out loop.

use reqwest::StatusCode;

/// Failure of the subscription store backend during a subscriber lookup.
#[derive(Debug, thiserror::Error)]
#[error("subscription store query failed: {reason}")]
pub struct StoreError {
    reason: String,
}

impl StoreError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Invalid subscriber data rejected at construction time.
#[derive(Debug, thiserror::Error)]
pub enum SubscriberError {
    #[error("subscriber field `{field}` must be non-empty")]
    EmptyField { field: &'static str },

    #[error("subscriber destination `{destination}` is not an absolute URL: {reason}")]
    InvalidDestination {
        destination: String,
        reason: String,
    },
}

/// Errors that abort an entire `notify` call.
///
/// Both variants fire before the first delivery attempt, so when one is
/// returned nothing was sent to any subscriber.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("subscriber lookup failed for collection `{collection}`: {source}")]
    StoreQuery {
        collection: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to serialize notification payload: {source}")]
    PayloadSerialization {
        #[from]
        source: serde_json::Error,
    },
}

/// Outcome classification for a single failed delivery attempt.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// Network-level failure: connection refused, DNS, TLS, timeout.
    #[error("request to `{url}` failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered outside the 2xx range. `body` is best effort;
    /// it is empty when reading the response body itself failed.
    #[error("destination `{url}` rejected delivery with HTTP {status}: {body}")]
    RemoteRejected {
        status: StatusCode,
        url: String,
        body: String,
    },
}

impl DeliveryError {
    /// Response status for remote rejections, `None` for transport failures.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::RemoteRejected { status, .. } => Some(*status),
            Self::Transport { .. } => None,
        }
    }
}
