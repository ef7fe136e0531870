//! Notification payload serialized to subscriber destinations.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Committed record mutation kinds.
///
/// Every variant is an after-success action: notifications fire only once
/// the triggering mutation has committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordAction {
    #[serde(rename = "create-after-success")]
    Create,
    #[serde(rename = "update-after-success")]
    Update,
    #[serde(rename = "delete-after-success")]
    Delete,
}

impl RecordAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create-after-success",
            Self::Update => "update-after-success",
            Self::Delete => "delete-after-success",
        }
    }
}

impl fmt::Display for RecordAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One change event as sent to every matched subscriber.
///
/// A single payload is built per event and the same serialized bytes go to
/// every destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub action: RecordAction,
    pub collection: String,
    /// Full post-commit snapshot of the affected record.
    pub record: Value,
    /// Principal of the triggering request, when it was authenticated.
    /// Never populated by the fan-out path itself; reserved for hosts that
    /// carry auth context through their hooks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<Value>,
}
