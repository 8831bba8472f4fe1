//! Document-store contract and the in-process reference backend.
//!
//! The hosted backend is a collection/document database with equality and
//! ordering queries, realtime push of added/removed documents, atomic merge
//! writes, and array union/remove updates. This module captures exactly that
//! surface as an object-safe trait so the rest of the client never names a
//! concrete backend. [`MemoryStore`] implements the contract in-process and
//! backs both offline sessions and the test suite.

mod memory;
mod types;

pub use memory::MemoryStore;
pub use types::{
    is_server_timestamp, server_timestamp, ArrayOp, Direction, DocEvent, DocumentSnapshot,
    OrderBy, Predicate, Query, StoreError, SERVER_TIMESTAMP_KEY,
};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

/// Stream of realtime changes for one subscribed query.
///
/// Dropping the receiver ends the subscription; the backend detects the
/// closed channel on its next push and forgets the watcher.
pub struct Subscription {
    pub events: mpsc::UnboundedReceiver<Result<DocEvent, StoreError>>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a single document by full path (`collection/id`).
    async fn read_one(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Run a query once and return the matching documents, ordered.
    async fn run_query(&self, query: &Query) -> Result<Vec<DocumentSnapshot>, StoreError>;

    /// Create a document with a backend-assigned id; returns the id.
    async fn create(&self, collection: &str, fields: Value) -> Result<String, StoreError>;

    /// Merge fields into a document, creating it if absent.
    async fn merge_write(&self, path: &str, fields: Value) -> Result<(), StoreError>;

    /// Delete a document. Deleting an absent document is not an error.
    async fn delete(&self, path: &str) -> Result<(), StoreError>;

    /// Atomically union into or remove from an array field.
    async fn update_array(
        &self,
        path: &str,
        field: &str,
        op: ArrayOp,
        value: Value,
    ) -> Result<(), StoreError>;

    /// Subscribe to a query: the current matches arrive first as `Added`
    /// events (in query order), then live changes as they happen.
    async fn subscribe(&self, query: &Query) -> Result<Subscription, StoreError>;
}
