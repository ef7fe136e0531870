//! # hookfan
//!
//! Webhook fan-out for record store change events.
//!
//! After a record create/update/delete commits, the hosting engine's
//! post-commit hooks hand the event to a [`Notifier`]. The notifier looks up
//! the subscribers registered against the record's collection, serializes
//! one [`NotificationPayload`], POSTs the same bytes to every destination,
//! and logs success or failure per subscriber. Delivery is a best-effort
//! single attempt: notification failures never block or reverse the
//! committed mutation that triggered them.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use hookfan::{MemoryStore, Notifier, Subscriber};
//!
//! let store = Arc::new(MemoryStore::new());
//! store.add(Subscriber::new(
//!     "sub1",
//!     "orders hook",
//!     "orders",
//!     "https://example.com/hook",
//! )?)?;
//! let notifier = Notifier::with_store(store);
//!
//! // Wired into the engine's after-create-success hook:
//! notifier.on_record_create_success("orders", &record).await;
//! ```

pub mod delivery;
pub mod error;
pub mod notifier;
pub mod payload;
pub mod subscriber;

pub use delivery::{DeliveryClient, HttpDeliveryClient};
pub use error::{DeliveryError, NotifyError, StoreError, SubscriberError};
pub use notifier::Notifier;
pub use payload::{NotificationPayload, RecordAction};
pub use subscriber::{MemoryStore, Subscriber, SubscriptionStore};
