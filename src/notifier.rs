//! Fan-out of one committed change event to all interested subscribers.

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::delivery::{DeliveryClient, HttpDeliveryClient};
use crate::error::NotifyError;
use crate::payload::{NotificationPayload, RecordAction};
use crate::subscriber::SubscriptionStore;

/// Fans one committed record mutation out to every subscriber registered
/// against the record's collection.
///
/// Both collaborators are injected at construction: the store the engine
/// keeps subscribers in, and the client that performs the outbound calls.
/// Logging goes through the `tracing` facade.
pub struct Notifier {
    store: Arc<dyn SubscriptionStore>,
    client: Arc<dyn DeliveryClient>,
}

impl Notifier {
    pub fn new(store: Arc<dyn SubscriptionStore>, client: Arc<dyn DeliveryClient>) -> Self {
        Self { store, client }
    }

    /// Notifier delivering over plain HTTP POST.
    pub fn with_store(store: Arc<dyn SubscriptionStore>) -> Self {
        Self::new(store, Arc::new(HttpDeliveryClient::new()))
    }

    /// Deliver one event to all subscribers of `collection`.
    ///
    /// Builds a single payload shared by every matched subscriber and
    /// attempts delivery to each in store order, logging one line per
    /// subscriber. A failed attempt is logged and swallowed so the remaining
    /// subscribers still get theirs; delivery outcomes never affect the
    /// return value. Only a store lookup or payload serialization failure
    /// aborts the call, and then nothing was sent to anyone. `record` is the
    /// full post-commit snapshot of the affected entity.
    pub async fn notify(
        &self,
        action: RecordAction,
        collection: &str,
        record: &Value,
    ) -> Result<(), NotifyError> {
        let subscribers = self.store.subscribers_for(collection).await.map_err(|source| {
            NotifyError::StoreQuery {
                collection: collection.to_owned(),
                source,
            }
        })?;

        if subscribers.is_empty() {
            return Ok(());
        }

        let payload = NotificationPayload {
            action,
            collection: collection.to_owned(),
            record: record.clone(),
            auth: None,
        };
        let body = serde_json::to_vec(&payload)?;

        for subscriber in &subscribers {
            match self.client.deliver(&subscriber.destination, &body).await {
                Ok(()) => info!(
                    action = %action,
                    name = %subscriber.name,
                    collection = %subscriber.collection,
                    destination = %subscriber.destination,
                    "webhook sent"
                ),
                Err(e) => warn!(
                    action = %action,
                    name = %subscriber.name,
                    collection = %subscriber.collection,
                    destination = %subscriber.destination,
                    error = %e,
                    "failed to send webhook"
                ),
            }
        }

        Ok(())
    }

    /// Post-commit hook for a successful record create.
    pub async fn on_record_create_success(&self, collection: &str, record: &Value) {
        self.dispatch(RecordAction::Create, collection, record).await;
    }

    /// Post-commit hook for a successful record update.
    pub async fn on_record_update_success(&self, collection: &str, record: &Value) {
        self.dispatch(RecordAction::Update, collection, record).await;
    }

    /// Post-commit hook for a successful record delete.
    pub async fn on_record_delete_success(&self, collection: &str, record: &Value) {
        self.dispatch(RecordAction::Delete, collection, record).await;
    }

    // The triggering mutation has already committed when the hook fires, so
    // failures are logged and swallowed rather than propagated into the hook
    // chain.
    async fn dispatch(&self, action: RecordAction, collection: &str, record: &Value) {
        if let Err(e) = self.notify(action, collection, record).await {
            error!(
                action = %action,
                collection = %collection,
                error = %e,
                "webhook fan-out failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::SocketAddr;

    use async_trait::async_trait;
    use axum::Router;
    use axum::body::Bytes;
    use axum::http::StatusCode;
    use axum::routing::post;
    use parking_lot::Mutex;
    use serde_json::json;
    use tokio::net::TcpListener;

    use crate::error::{DeliveryError, StoreError};
    use crate::subscriber::{MemoryStore, Subscriber};

    /// Records every delivery attempt; fails those aimed at `failing`
    /// destinations.
    #[derive(Default)]
    struct RecordingClient {
        calls: Mutex<Vec<(String, Vec<u8>)>>,
        failing: Vec<String>,
    }

    #[async_trait]
    impl DeliveryClient for RecordingClient {
        async fn deliver(&self, destination: &str, payload: &[u8]) -> Result<(), DeliveryError> {
            self.calls.lock().push((destination.to_owned(), payload.to_vec()));
            if self.failing.iter().any(|d| d == destination) {
                return Err(DeliveryError::RemoteRejected {
                    status: reqwest::StatusCode::BAD_GATEWAY,
                    url: destination.to_owned(),
                    body: String::new(),
                });
            }
            Ok(())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl SubscriptionStore for FailingStore {
        async fn subscribers_for(&self, _collection: &str) -> Result<Vec<Subscriber>, StoreError> {
            Err(StoreError::new("backend unavailable"))
        }
    }

    fn store_with(subscribers: &[(&str, &str, &str)]) -> Arc<MemoryStore> {
        let store = MemoryStore::new();
        for (id, collection, destination) in subscribers {
            store
                .add(Subscriber::new(*id, *id, *collection, *destination).unwrap())
                .unwrap();
        }
        Arc::new(store)
    }

    #[tokio::test]
    async fn no_subscribers_means_no_calls() {
        let store = store_with(&[("a", "posts", "https://example.com/a")]);
        let client = Arc::new(RecordingClient::default());
        let notifier = Notifier::new(store, client.clone());

        notifier
            .notify(RecordAction::Create, "orders", &json!({"id": "r1"}))
            .await
            .unwrap();

        assert!(client.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn fans_out_one_shared_payload_in_store_order() {
        let store = store_with(&[
            ("a", "orders", "https://example.com/a"),
            ("b", "posts", "https://example.com/b"),
            ("c", "orders", "https://example.com/c"),
        ]);
        let client = Arc::new(RecordingClient::default());
        let notifier = Notifier::new(store, client.clone());

        notifier
            .notify(RecordAction::Update, "orders", &json!({"id": "r1", "total": 42}))
            .await
            .unwrap();

        let calls = client.calls.lock();
        let destinations: Vec<_> = calls.iter().map(|(d, _)| d.as_str()).collect();
        assert_eq!(destinations, ["https://example.com/a", "https://example.com/c"]);
        assert_eq!(calls[0].1, calls[1].1);

        let parsed: NotificationPayload = serde_json::from_slice(&calls[0].1).unwrap();
        assert_eq!(parsed.action, RecordAction::Update);
        assert_eq!(parsed.collection, "orders");
        assert_eq!(parsed.record, json!({"id": "r1", "total": 42}));
        assert_eq!(parsed.auth, None);
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_rest() {
        let store = store_with(&[
            ("a", "orders", "https://example.com/a"),
            ("b", "orders", "https://example.com/b"),
        ]);
        let client = Arc::new(RecordingClient {
            failing: vec!["https://example.com/a".to_string()],
            ..Default::default()
        });
        let notifier = Notifier::new(store, client.clone());

        let result = notifier
            .notify(RecordAction::Delete, "orders", &json!({"id": "r1"}))
            .await;

        assert!(result.is_ok());
        assert_eq!(client.calls.lock().len(), 2);
    }

    #[tokio::test]
    async fn store_failure_aborts_before_any_delivery() {
        let client = Arc::new(RecordingClient::default());
        let notifier = Notifier::new(Arc::new(FailingStore), client.clone());

        let err = notifier
            .notify(RecordAction::Create, "orders", &json!({"id": "r1"}))
            .await
            .unwrap_err();

        assert!(matches!(err, NotifyError::StoreQuery { .. }));
        assert!(client.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn hooks_swallow_fan_out_failures() {
        let notifier = Notifier::new(Arc::new(FailingStore), Arc::new(RecordingClient::default()));

        // Must not panic or propagate; the mutation already committed.
        notifier.on_record_create_success("orders", &json!({"id": "r1"})).await;
        notifier.on_record_update_success("orders", &json!({"id": "r1"})).await;
        notifier.on_record_delete_success("orders", &json!({"id": "r1"})).await;
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("hookfan=debug")
            .with_test_writer()
            .try_init();
    }

    async fn spawn_receiver(app: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn end_to_end_posts_exact_body_over_http() {
        init_tracing();

        let bodies: Arc<Mutex<Vec<Bytes>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = bodies.clone();
        let app = Router::new().route(
            "/hook",
            post(move |body: Bytes| {
                let sink = sink.clone();
                async move {
                    sink.lock().push(body);
                    StatusCode::OK
                }
            }),
        );
        let addr = spawn_receiver(app).await;

        let store = MemoryStore::new();
        store
            .add(Subscriber::new("s1", "s1", "orders", format!("http://{addr}/hook")).unwrap())
            .unwrap();
        let notifier = Notifier::with_store(Arc::new(store));

        notifier
            .notify(RecordAction::Create, "orders", &json!({"id": "r1", "total": 42}))
            .await
            .unwrap();

        let bodies = bodies.lock();
        assert_eq!(bodies.len(), 1);
        assert_eq!(
            std::str::from_utf8(&bodies[0]).unwrap(),
            r#"{"action":"create-after-success","collection":"orders","record":{"id":"r1","total":42}}"#
        );
    }

    #[tokio::test]
    async fn unreachable_subscriber_does_not_block_reachable_one() {
        init_tracing();

        let hits: Arc<Mutex<usize>> = Arc::new(Mutex::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/hook",
            post(move || {
                let counter = counter.clone();
                async move {
                    *counter.lock() += 1;
                    StatusCode::OK
                }
            }),
        );
        let live_addr = spawn_receiver(app).await;

        let dead_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead_addr = dead_listener.local_addr().unwrap();
        drop(dead_listener);

        let store = MemoryStore::new();
        store
            .add(Subscriber::new("dead", "dead", "orders", format!("http://{dead_addr}/hook")).unwrap())
            .unwrap();
        store
            .add(Subscriber::new("live", "live", "orders", format!("http://{live_addr}/hook")).unwrap())
            .unwrap();
        let notifier = Notifier::with_store(Arc::new(store));

        let result = notifier
            .notify(RecordAction::Create, "orders", &json!({"id": "r1"}))
            .await;

        assert!(result.is_ok());
        assert_eq!(*hits.lock(), 1);
    }
}
