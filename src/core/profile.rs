//! User profiles and the per-user friend list.

use crate::auth::Identity;
use crate::core::constants::{friend_path, friends_collection, profile_path, PROFILES_COLLECTION};
use crate::store::{server_timestamp, DocumentStore, Query, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Online,
    Away,
    Busy,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Online => "online",
            Status::Away => "away",
            Status::Busy => "busy",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(Status::Online),
            "away" => Ok(Status::Away),
            "busy" => Ok(Status::Busy),
            _ => Err(()),
        }
    }
}

/// Public directory record, one per authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    #[serde(default)]
    pub display_name_lower: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_art: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub joined_at: Option<i64>,
    #[serde(default)]
    pub last_seen: Option<i64>,
}

/// Friend-list entry, a subcollection document of the owning user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Friend {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub added_at: Option<i64>,
}

impl Friend {
    /// Nickname when set, else the email.
    pub fn label(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.email)
    }
}

/// Merge the base profile on authentication; `joinedAt` is written only the
/// first time so it stays a set-once field.
pub async fn ensure_profile(
    store: &Arc<dyn DocumentStore>,
    identity: &Identity,
) -> Result<(), StoreError> {
    let Identity::Authenticated {
        uid,
        email,
        display_name,
    } = identity
    else {
        return Ok(());
    };

    let path = profile_path(uid);
    let existing = store.read_one(&path).await?;
    let mut fields = json!({
        "uid": uid,
        "email": email,
        "displayName": display_name,
        "displayNameLower": display_name.to_lowercase(),
        "status": "online",
        "lastSeen": server_timestamp(),
    });
    let joined = existing
        .as_ref()
        .and_then(|doc| doc.get("joinedAt"))
        .is_some_and(|v| !v.is_null());
    if !joined {
        fields["joinedAt"] = server_timestamp();
    }
    store.merge_write(&path, fields).await
}

pub async fn update_status(
    store: &Arc<dyn DocumentStore>,
    uid: &str,
    status: Status,
) -> Result<(), StoreError> {
    store
        .merge_write(
            &profile_path(uid),
            json!({ "status": status.as_str(), "lastSeen": server_timestamp() }),
        )
        .await
}

pub async fn load(
    store: &Arc<dyn DocumentStore>,
    uid: &str,
) -> Result<Option<Profile>, StoreError> {
    match store.read_one(&profile_path(uid)).await? {
        Some(fields) => serde_json::from_value(fields)
            .map(Some)
            .map_err(|e| StoreError::Decode(e.to_string())),
        None => Ok(None),
    }
}

/// Resolve a directory entry by exact email, then exact display name.
/// Absence (and therefore ambiguity of neither kind) yields `None`.
pub async fn resolve_user(
    store: &Arc<dyn DocumentStore>,
    identifier: &str,
) -> Result<Option<Profile>, StoreError> {
    for field in ["email", "displayName"] {
        let query = Query::collection(PROFILES_COLLECTION)
            .where_eq(field, json!(identifier))
            .limit(1);
        if let Some(doc) = store.run_query(&query).await?.into_iter().next() {
            return serde_json::from_value(doc.fields)
                .map(Some)
                .map_err(|e| StoreError::Decode(e.to_string()));
        }
    }
    Ok(None)
}

/// Persist the profile-editor fields. Empty strings clear bio and avatar
/// but the display name keeps its previous value rather than going blank.
pub async fn update_editable(
    store: &Arc<dyn DocumentStore>,
    uid: &str,
    display_name: &str,
    bio: &str,
    avatar_art: &str,
) -> Result<(), StoreError> {
    let mut fields = json!({
        "bio": bio,
        "avatarArt": avatar_art,
        "lastSeen": server_timestamp(),
    });
    if !display_name.trim().is_empty() {
        fields["displayName"] = json!(display_name.trim());
        fields["displayNameLower"] = json!(display_name.trim().to_lowercase());
    }
    store.merge_write(&profile_path(uid), fields).await
}

pub async fn add_friend(
    store: &Arc<dyn DocumentStore>,
    owner_uid: &str,
    peer: &Profile,
) -> Result<(), StoreError> {
    store
        .merge_write(
            &friend_path(owner_uid, &peer.uid),
            json!({
                "uid": peer.uid,
                "email": peer.email,
                "displayName": peer.display_name,
                "addedAt": server_timestamp(),
            }),
        )
        .await
}

pub async fn list_friends(
    store: &Arc<dyn DocumentStore>,
    owner_uid: &str,
) -> Result<Vec<Friend>, StoreError> {
    let docs = store
        .run_query(&Query::collection(friends_collection(owner_uid)))
        .await?;
    docs.into_iter()
        .map(|doc| serde_json::from_value(doc.fields).map_err(|e| StoreError::Decode(e.to_string())))
        .collect()
}

/// Find a friend entry by exact nickname, then exact email.
pub async fn find_friend(
    store: &Arc<dyn DocumentStore>,
    owner_uid: &str,
    identifier: &str,
) -> Result<Option<Friend>, StoreError> {
    for field in ["nickname", "email"] {
        let query = Query::collection(friends_collection(owner_uid))
            .where_eq(field, json!(identifier))
            .limit(1);
        if let Some(doc) = store.run_query(&query).await?.into_iter().next() {
            return serde_json::from_value(doc.fields)
                .map(Some)
                .map_err(|e| StoreError::Decode(e.to_string()));
        }
    }
    Ok(None)
}

/// Attach a nickname to an existing friend entry; `false` when the email is
/// not in the friend list.
pub async fn set_nickname(
    store: &Arc<dyn DocumentStore>,
    owner_uid: &str,
    email: &str,
    nickname: &str,
) -> Result<bool, StoreError> {
    let query = Query::collection(friends_collection(owner_uid))
        .where_eq("email", json!(email))
        .limit(1);
    let Some(doc) = store.run_query(&query).await?.into_iter().next() else {
        return Ok(false);
    };
    store
        .merge_write(
            &format!("{}/{}", friends_collection(owner_uid), doc.id),
            json!({ "nickname": nickname }),
        )
        .await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn authenticated(email: &str, name: &str) -> Identity {
        Identity::Authenticated {
            uid: format!("uid-{name}"),
            email: email.into(),
            display_name: name.into(),
        }
    }

    #[tokio::test]
    async fn ensure_profile_sets_joined_at_only_once() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let identity = authenticated("ada@example.com", "Ada");

        ensure_profile(&store, &identity).await.unwrap();
        let first = load(&store, "uid-Ada").await.unwrap().unwrap();
        let joined = first.joined_at.unwrap();

        ensure_profile(&store, &identity).await.unwrap();
        let second = load(&store, "uid-Ada").await.unwrap().unwrap();
        assert_eq!(second.joined_at, Some(joined));
        assert!(second.last_seen.unwrap() > first.last_seen.unwrap());
    }

    #[tokio::test]
    async fn resolve_user_accepts_email_or_display_name() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        ensure_profile(&store, &authenticated("bob@example.com", "Bob"))
            .await
            .unwrap();

        let by_email = resolve_user(&store, "bob@example.com").await.unwrap();
        assert_eq!(by_email.unwrap().display_name, "Bob");

        let by_name = resolve_user(&store, "Bob").await.unwrap();
        assert_eq!(by_name.unwrap().email, "bob@example.com");

        assert!(resolve_user(&store, "nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn friend_nickname_requires_existing_entry() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        ensure_profile(&store, &authenticated("bob@example.com", "Bob"))
            .await
            .unwrap();
        let bob = resolve_user(&store, "Bob").await.unwrap().unwrap();

        assert!(!set_nickname(&store, "me", "bob@example.com", "bobby")
            .await
            .unwrap());

        add_friend(&store, "me", &bob).await.unwrap();
        assert!(set_nickname(&store, "me", "bob@example.com", "bobby")
            .await
            .unwrap());

        let friend = find_friend(&store, "me", "bobby").await.unwrap().unwrap();
        assert_eq!(friend.email, "bob@example.com");
        assert_eq!(friend.label(), "bobby");

        let listed = list_friends(&store, "me").await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[test]
    fn status_parses_valid_values_only() {
        assert_eq!("away".parse::<Status>(), Ok(Status::Away));
        assert!("offline".parse::<Status>().is_err());
    }
}
