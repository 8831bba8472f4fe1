//! Conversation identity and the persisted message record.

use crate::core::constants::{MESSAGES_COLLECTION, RECEIVER_ALL};
use crate::store::{server_timestamp, DocumentStore, Query, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

/// Deterministic id for a 1:1 conversation: both participants sort the two
/// uids and join them, so either side computes the same id regardless of who
/// initiates.
pub fn conversation_id(a: &str, b: &str) -> String {
    let mut pair = [a, b];
    pair.sort_unstable();
    pair.join("_")
}

/// A persisted chat message. Created by the sending client, never mutated;
/// field names are the backend's camelCase wire form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub conversation_id: String,
    pub sender_id: String,
    pub sender_display_name: String,
    #[serde(rename = "text")]
    pub body: String,
    pub receiver_id: String,
    #[serde(default)]
    pub is_art: bool,
    #[serde(default)]
    pub is_burn: bool,
    #[serde(default)]
    pub is_from_admin: bool,
    #[serde(default)]
    pub created_at: Option<i64>,
}

impl ChatMessage {
    pub fn is_broadcast(&self) -> bool {
        self.receiver_id == RECEIVER_ALL
    }

    /// Wire payload for a send; the creation timestamp is left to the store.
    pub fn to_wire(&self) -> Value {
        let mut fields = json!({
            "conversationId": self.conversation_id,
            "senderId": self.sender_id,
            "senderDisplayName": self.sender_display_name,
            "text": self.body,
            "receiverId": self.receiver_id,
            "isArt": self.is_art,
            "isBurn": self.is_burn,
            "createdAt": server_timestamp(),
        });
        if self.is_from_admin {
            fields["isFromAdmin"] = Value::Bool(true);
        }
        fields
    }

    pub fn from_wire(fields: &Value) -> Result<Self, StoreError> {
        serde_json::from_value(fields.clone()).map_err(|e| StoreError::Decode(e.to_string()))
    }
}

/// Timestamp-ordered feed query for one conversation.
pub fn conversation_query(conversation_id: &str) -> Query {
    Query::collection(MESSAGES_COLLECTION)
        .where_eq("conversationId", json!(conversation_id))
        .order_by_asc("createdAt")
}

/// One-shot inbox scan: every message addressed to this uid.
pub async fn messages_addressed_to(
    store: &Arc<dyn DocumentStore>,
    uid: &str,
) -> Result<Vec<ChatMessage>, StoreError> {
    let query = Query::collection(MESSAGES_COLLECTION).where_eq("receiverId", json!(uid));
    let docs = store.run_query(&query).await?;
    docs.iter().map(|doc| ChatMessage::from_wire(&doc.fields)).collect()
}
