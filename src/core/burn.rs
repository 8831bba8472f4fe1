//! Scheduled deletion of self-destruct messages.
//!
//! One cancellable task per sent burn message, keyed by message id. Timers
//! are client-local: if the client exits before a timer fires, the message
//! stays in the store and no in-scope cleanup process will remove it.

use crate::core::constants::{message_path, BURN_DELAY};
use crate::store::DocumentStore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

pub struct BurnScheduler {
    store: Arc<dyn DocumentStore>,
    pending: Arc<Mutex<HashMap<String, CancellationToken>>>,
}

impl BurnScheduler {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Schedule deletion of a message [`BURN_DELAY`] from now. Re-scheduling
    /// the same id replaces the previous timer.
    pub fn schedule(&self, message_id: impl Into<String>) {
        let message_id = message_id.into();
        let token = CancellationToken::new();
        if let Some(previous) = self
            .lock()
            .insert(message_id.clone(), token.clone())
        {
            previous.cancel();
        }

        let store = self.store.clone();
        let pending = self.pending.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(BURN_DELAY) => {
                    if let Err(err) = store.delete(&message_path(&message_id)).await {
                        tracing::warn!(%message_id, %err, "burn deletion failed");
                    }
                }
            }
            pending
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&message_id);
        });
    }

    pub fn cancel(&self, message_id: &str) {
        if let Some(token) = self.lock().remove(message_id) {
            token.cancel();
        }
    }

    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CancellationToken>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}
