//! Realtime feed binder: couples a store query to the app event channel
//! through a disposable, epoch-tagged forwarder task.
//!
//! Disposal cancels the forwarder before it can push another event, and
//! every update carries the binding epoch so the app can drop anything a
//! later mode switch has already invalidated. Backend query failures are
//! forwarded as events, never panics.

use crate::store::{DocEvent, DocumentStore, Query, StoreError};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Which subscription produced an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    Messages,
    ChannelMeta,
    Notifications,
}

#[derive(Debug)]
pub enum FeedEvent {
    Added { id: String, fields: Value },
    Removed { id: String },
    Failed(StoreError),
}

#[derive(Debug)]
pub struct FeedUpdate {
    pub epoch: u64,
    pub kind: FeedKind,
    pub event: FeedEvent,
}

/// Disposable handle to a bound feed. `dispose` is idempotent; dropping the
/// handle disposes as well, so a replaced binding can never leak a live
/// forwarder.
pub struct FeedHandle {
    cancel: CancellationToken,
}

impl FeedHandle {
    pub fn dispose(&self) {
        self.cancel.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Bind a query to the app event channel. Events are delivered in the
/// store's push order (timestamp order for conversation queries).
pub fn bind(
    store: Arc<dyn DocumentStore>,
    query: Query,
    kind: FeedKind,
    epoch: u64,
    tx: mpsc::UnboundedSender<FeedUpdate>,
) -> FeedHandle {
    let cancel = CancellationToken::new();
    let task_cancel = cancel.clone();
    tokio::spawn(async move {
        let mut subscription = match store.subscribe(&query).await {
            Ok(subscription) => subscription,
            Err(err) => {
                tracing::warn!(?kind, %err, "feed subscription failed");
                let _ = tx.send(FeedUpdate {
                    epoch,
                    kind,
                    event: FeedEvent::Failed(err),
                });
                return;
            }
        };
        loop {
            tokio::select! {
                // Cancellation wins over a queued event, so nothing is
                // forwarded once dispose has been observed.
                biased;
                _ = task_cancel.cancelled() => break,
                next = subscription.events.recv() => {
                    let event = match next {
                        Some(Ok(DocEvent::Added(snapshot))) => FeedEvent::Added {
                            id: snapshot.id,
                            fields: snapshot.fields,
                        },
                        Some(Ok(DocEvent::Removed { id })) => FeedEvent::Removed { id },
                        Some(Err(err)) => FeedEvent::Failed(err),
                        None => break,
                    };
                    if tx.send(FeedUpdate { epoch, kind, event }).is_err() {
                        break;
                    }
                }
            }
        }
    });
    FeedHandle { cancel }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ArrayOp, DocumentSnapshot, MemoryStore, Subscription};
    use async_trait::async_trait;
    use serde_json::json;

    async fn settle() {
        // Let the forwarder task observe whatever is pending.
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn bound_feed_forwards_added_events_with_epoch() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let query = Query::collection("public/messages").where_eq("conversationId", json!("c"));
        let _handle = bind(store.clone(), query, FeedKind::Messages, 7, tx);
        settle().await;

        store
            .create("public/messages", json!({ "conversationId": "c", "text": "hi" }))
            .await
            .unwrap();
        settle().await;

        let update = rx.try_recv().expect("added event expected");
        assert_eq!(update.epoch, 7);
        assert_eq!(update.kind, FeedKind::Messages);
        assert!(matches!(update.event, FeedEvent::Added { .. }));
    }

    #[tokio::test]
    async fn disposed_feed_never_forwards_queued_events() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let query = Query::collection("public/messages").where_eq("conversationId", json!("c"));
        let handle = bind(store.clone(), query, FeedKind::Messages, 1, tx);
        settle().await;

        handle.dispose();
        handle.dispose(); // idempotent
        assert!(handle.is_disposed());

        store
            .create("public/messages", json!({ "conversationId": "c", "text": "late" }))
            .await
            .unwrap();
        settle().await;

        assert!(rx.try_recv().is_err(), "stale listener must stay silent");
    }

    struct IndexlessStore;

    #[async_trait]
    impl DocumentStore for IndexlessStore {
        async fn read_one(&self, _: &str) -> Result<Option<Value>, StoreError> {
            Ok(None)
        }
        async fn run_query(&self, _: &Query) -> Result<Vec<DocumentSnapshot>, StoreError> {
            Ok(Vec::new())
        }
        async fn create(&self, _: &str, _: Value) -> Result<String, StoreError> {
            Ok("doc000001".into())
        }
        async fn merge_write(&self, _: &str, _: Value) -> Result<(), StoreError> {
            Ok(())
        }
        async fn delete(&self, _: &str) -> Result<(), StoreError> {
            Ok(())
        }
        async fn update_array(
            &self,
            _: &str,
            _: &str,
            _: ArrayOp,
            _: Value,
        ) -> Result<(), StoreError> {
            Ok(())
        }
        async fn subscribe(&self, _: &Query) -> Result<Subscription, StoreError> {
            Err(StoreError::Backend(
                "the query requires a composite index".into(),
            ))
        }
    }

    #[tokio::test]
    async fn subscription_failure_surfaces_as_event_not_panic() {
        let store: Arc<dyn DocumentStore> = Arc::new(IndexlessStore);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let query = Query::collection("public/messages");
        let _handle = bind(store, query, FeedKind::Messages, 3, tx);
        settle().await;

        let update = rx.try_recv().expect("failure event expected");
        let FeedEvent::Failed(err) = update.event else {
            panic!("expected failed event");
        };
        assert!(err.is_missing_index());
    }
}
