//! Shared types for the document-store contract.

use serde_json::Value;
use std::fmt;

/// Sentinel placed in a write payload where the backend should substitute
/// its own monotonic timestamp (milliseconds).
pub const SERVER_TIMESTAMP_KEY: &str = "__serverTimestamp";

/// Build a server-timestamp sentinel value for a write payload.
pub fn server_timestamp() -> Value {
    serde_json::json!({ SERVER_TIMESTAMP_KEY: true })
}

pub fn is_server_timestamp(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| map.contains_key(SERVER_TIMESTAMP_KEY))
}

/// A document observed in a collection: its id plus a JSON object of fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub id: String,
    pub fields: Value,
}

impl DocumentSnapshot {
    pub fn new(id: impl Into<String>, fields: Value) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// Equality predicate on a single field.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: String,
    pub equals: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// A query over one collection: equality predicates, optional ordering,
/// optional result limit.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub predicates: Vec<Predicate>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            predicates: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    pub fn where_eq(mut self, field: impl Into<String>, equals: Value) -> Self {
        self.predicates.push(Predicate {
            field: field.into(),
            equals,
        });
        self
    }

    pub fn order_by_asc(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction: Direction::Ascending,
        });
        self
    }

    pub fn order_by_desc(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction: Direction::Descending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a document's fields satisfy every predicate.
    pub fn matches(&self, fields: &Value) -> bool {
        self.predicates
            .iter()
            .all(|p| fields.get(&p.field) == Some(&p.equals))
    }
}

/// Array mutation mode for [`update_array`](super::DocumentStore::update_array).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayOp {
    /// Add the value if it is not already present (set semantics).
    Union,
    /// Remove every occurrence of the value.
    Remove,
}

/// Realtime change pushed to a subscriber.
///
/// `Added` fires when a document first enters the subscribed result set and
/// again when a document already in the set changes; persisted chat messages
/// are immutable, so for a message feed it fires exactly once per message.
#[derive(Debug, Clone, PartialEq)]
pub enum DocEvent {
    Added(DocumentSnapshot),
    Removed { id: String },
}

/// Errors surfaced by a document-store backend.
#[derive(Debug)]
pub enum StoreError {
    /// A document path did not split into collection and id.
    InvalidPath(String),
    /// The backend rejected or failed the operation.
    Backend(String),
    /// A payload could not be decoded into the expected record shape.
    Decode(String),
}

impl StoreError {
    /// Query-configuration failures (a missing composite index) carry an
    /// index marker in the backend message; the UI shows those with a
    /// distinct hint instead of a generic failure.
    pub fn is_missing_index(&self) -> bool {
        matches!(self, StoreError::Backend(msg) if msg.to_ascii_lowercase().contains("index"))
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::InvalidPath(path) => write!(f, "invalid document path: {path}"),
            StoreError::Backend(msg) => write!(f, "backend error: {msg}"),
            StoreError::Decode(msg) => write!(f, "malformed document: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_matches_all_predicates() {
        let q = Query::collection("public/messages")
            .where_eq("conversationId", json!("a_b"))
            .where_eq("receiverId", json!("ALL"));
        assert!(q.matches(&json!({ "conversationId": "a_b", "receiverId": "ALL" })));
        assert!(!q.matches(&json!({ "conversationId": "a_b", "receiverId": "b" })));
        assert!(!q.matches(&json!({ "receiverId": "ALL" })));
    }

    #[test]
    fn missing_index_marker_is_detected() {
        let err = StoreError::Backend("The query requires an INDEX to be built".into());
        assert!(err.is_missing_index());
        let err = StoreError::Backend("permission denied".into());
        assert!(!err.is_missing_index());
    }

    #[test]
    fn server_timestamp_sentinel_roundtrip() {
        assert!(is_server_timestamp(&server_timestamp()));
        assert!(!is_server_timestamp(&json!(12)));
    }
}
