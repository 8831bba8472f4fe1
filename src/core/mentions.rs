//! Mention scanning, shortcode expansion, and mention notifications.
//!
//! A mention is an `@(Name)` token in message text. Shortcode expansion
//! replaces `(code)` tokens that resolve in the emoji table and leaves
//! everything else untouched, which is what keeps `@(Bob)` intact for
//! mention highlighting downstream.

use crate::core::constants::{notifications_collection, NOTIFICATION_PREVIEW_MAX};
use crate::core::profile;
use crate::store::{server_timestamp, DocumentStore, Query, StoreError};
use crate::utils::emoji;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Names mentioned as `@(Name)`, in order of appearance, deduplicated.
pub fn mentions_in(text: &str) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("@(") {
        let after = &rest[start + 2..];
        let Some(end) = after.find(')') else { break };
        let name = &after[..end];
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
        rest = &after[end + 1..];
    }
    names
}

/// Replace every `(code)` token that resolves in the emoji table with its
/// glyph. Unknown parenthesized tokens pass through unchanged.
pub fn expand_shortcodes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('(') {
        let Some(close) = rest[open..].find(')') else {
            break;
        };
        let token = &rest[open..open + close + 1];
        out.push_str(&rest[..open]);
        match emoji::lookup(token) {
            Some(glyph) => out.push_str(glyph),
            None => out.push_str(token),
        }
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);
    out
}

/// Expand the `(?n)` body token into a literal newline.
pub fn expand_newline_token(text: &str) -> String {
    text.replace("(?n)", "\n")
}

/// A persisted mention notification for one recipient.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(default)]
    pub kind: String,
    pub from_user_id: String,
    pub from_display_name: String,
    pub preview_text: String,
    #[serde(default)]
    pub created_at: Option<i64>,
}

impl Notification {
    pub fn from_wire(fields: &serde_json::Value) -> Result<Self, StoreError> {
        serde_json::from_value(fields.clone()).map_err(|e| StoreError::Decode(e.to_string()))
    }
}

fn preview_of(text: &str) -> String {
    text.chars().take(NOTIFICATION_PREVIEW_MAX).collect()
}

/// Fan out one notification per resolvable mentioned display name.
/// Unresolvable names and self-mentions are skipped silently.
pub async fn notify_mentions(
    store: &Arc<dyn DocumentStore>,
    sender_uid: &str,
    sender_name: &str,
    text: &str,
) -> Result<usize, StoreError> {
    let mut delivered = 0;
    for name in mentions_in(text) {
        let Some(target) = profile::resolve_user(store, name).await? else {
            continue;
        };
        if target.uid == sender_uid {
            continue;
        }
        store
            .create(
                &notifications_collection(&target.uid),
                json!({
                    "kind": "mention",
                    "fromUserId": sender_uid,
                    "fromDisplayName": sender_name,
                    "previewText": preview_of(text),
                    "createdAt": server_timestamp(),
                }),
            )
            .await?;
        delivered += 1;
    }
    Ok(delivered)
}

/// Latest mention notifications for a user, newest first.
pub async fn recent_mentions(
    store: &Arc<dyn DocumentStore>,
    uid: &str,
    limit: usize,
) -> Result<Vec<Notification>, StoreError> {
    let query = Query::collection(notifications_collection(uid))
        .order_by_desc("createdAt")
        .limit(limit);
    let docs = store.run_query(&query).await?;
    docs.iter().map(|doc| Notification::from_wire(&doc.fields)).collect()
}

/// Feed query for the persistent notification listener.
pub fn notification_query(uid: &str) -> Query {
    Query::collection(notifications_collection(uid))
        .order_by_desc("createdAt")
        .limit(1)
}
