//! Subscriber records and the subscription store boundary.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{StoreError, SubscriberError};

/// An administrative record naming a destination to notify for changes on
/// one collection.
///
/// Subscribers are created and edited through ordinary administrative CRUD
/// against the store; nothing in the fan-out path mutates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: String,
    pub name: String,
    /// Source collection whose changes trigger notification. Matched against
    /// event collections by exact case-sensitive comparison, keyed by name
    /// rather than a durable id: renaming a collection silently orphans its
    /// subscriptions.
    pub collection: String,
    /// Absolute URL the payload is POSTed to.
    pub destination: String,
}

impl Subscriber {
    /// Build a validated subscriber.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        collection: impl Into<String>,
        destination: impl Into<String>,
    ) -> Result<Self, SubscriberError> {
        let subscriber = Self {
            id: id.into(),
            name: name.into(),
            collection: collection.into(),
            destination: destination.into(),
        };
        subscriber.validate()?;
        Ok(subscriber)
    }

    /// Check the creation-time invariants: `name` and `collection` non-empty,
    /// `destination` a syntactically valid absolute URL.
    pub fn validate(&self) -> Result<(), SubscriberError> {
        if self.name.is_empty() {
            return Err(SubscriberError::EmptyField { field: "name" });
        }
        if self.collection.is_empty() {
            return Err(SubscriberError::EmptyField { field: "collection" });
        }
        if self.destination.is_empty() {
            return Err(SubscriberError::EmptyField {
                field: "destination",
            });
        }
        Url::parse(&self.destination).map_err(|e| SubscriberError::InvalidDestination {
            destination: self.destination.clone(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

/// Read side of the subscription store consumed by the notifier.
///
/// Durable storage, administrative CRUD routes, and schema bootstrap belong
/// to the hosting record engine; the fan-out path only needs this query.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// All subscribers registered against `collection`, in store order.
    async fn subscribers_for(&self, collection: &str) -> Result<Vec<Subscriber>, StoreError>;
}

/// In-process subscription store keeping subscribers in insertion order.
///
/// Serves embedders and tests; hosts with durable storage implement
/// [`SubscriptionStore`] over their own backend instead.
#[derive(Debug, Default)]
pub struct MemoryStore {
    subscribers: RwLock<Vec<Subscriber>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a subscriber after re-checking its invariants.
    pub fn add(&self, subscriber: Subscriber) -> Result<(), SubscriberError> {
        subscriber.validate()?;
        self.subscribers.write().push(subscriber);
        Ok(())
    }

    /// Remove by id, returning the removed subscriber if it existed.
    pub fn remove(&self, id: &str) -> Option<Subscriber> {
        let mut subscribers = self.subscribers.write();
        let position = subscribers.iter().position(|s| s.id == id)?;
        Some(subscribers.remove(position))
    }

    pub fn list(&self) -> Vec<Subscriber> {
        self.subscribers.read().clone()
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn subscribers_for(&self, collection: &str) -> Result<Vec<Subscriber>, StoreError> {
        Ok(self
            .subscribers
            .read()
            .iter()
            .filter(|s| s.collection == collection)
            .cloned()
            .collect())
    }
}
