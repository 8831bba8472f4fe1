//! Broadcast-channel authorization: host/admin/ban state over a persisted
//! channel record.
//!
//! The backend has no authorization concept, so every rule here is enforced
//! client-side: admin checks run against the locally cached admin list from
//! the channel-metadata feed, and mutations go through array union/remove
//! writes. Concurrent writers are resolved by backend atomicity only; a
//! claim that loses the race degenerates to a merge into an already-hosted
//! record (first write wins silently).

use crate::core::constants::channel_path;
use crate::store::{server_timestamp, ArrayOp, DocumentStore, StoreError};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;

/// Persisted per-frequency governance record. Admins are kept in insertion
/// order; the first entry is the original claimant.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRecord {
    #[serde(default)]
    pub admins: Vec<String>,
    #[serde(default)]
    pub banned: Vec<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

impl ChannelRecord {
    pub fn from_wire(fields: &Value) -> Result<Self, StoreError> {
        serde_json::from_value(fields.clone()).map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// A channel with any admin is hosted; an empty admin set is behaviorally
    /// unclaimed again, even after a demotion emptied it.
    pub fn is_hosted(&self) -> bool {
        !self.admins.is_empty()
    }

    pub fn is_admin(&self, uid: &str) -> bool {
        self.admins.iter().any(|admin| admin == uid)
    }

    pub fn is_banned(&self, uid: &str) -> bool {
        self.banned.iter().any(|banned| banned == uid)
    }
}

#[derive(Debug)]
pub enum ChannelError {
    /// The acting user is not in the channel's admin set.
    PermissionDenied,
    Store(StoreError),
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelError::PermissionDenied => write!(f, "permission denied: admins only"),
            ChannelError::Store(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ChannelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChannelError::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ChannelError {
    fn from(err: StoreError) -> Self {
        ChannelError::Store(err)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The channel was unclaimed and now has this user as its sole admin.
    Claimed,
    /// Someone already hosts the frequency; nothing was changed.
    AlreadyHosted,
}

/// Admin-gated operations on one frequency's channel record.
pub struct ChannelAuthority {
    store: Arc<dyn DocumentStore>,
    frequency: String,
}

impl ChannelAuthority {
    pub fn new(store: Arc<dyn DocumentStore>, frequency: impl Into<String>) -> Self {
        Self {
            store,
            frequency: frequency.into(),
        }
    }

    fn path(&self) -> String {
        channel_path(&self.frequency)
    }

    /// Current record, defaulting to unclaimed when the document is absent.
    pub async fn load(&self) -> Result<ChannelRecord, StoreError> {
        match self.store.read_one(&self.path()).await? {
            Some(fields) => ChannelRecord::from_wire(&fields),
            None => Ok(ChannelRecord::default()),
        }
    }

    /// Claim an unclaimed channel. The read-then-write pair is not atomic;
    /// the loser of a simultaneous claim merges into the winner's record
    /// without clobbering its admin list (the local read decides which
    /// outcome is reported).
    pub async fn claim(&self, uid: &str) -> Result<ClaimOutcome, ChannelError> {
        let record = self.load().await?;
        if record.is_hosted() {
            return Ok(ClaimOutcome::AlreadyHosted);
        }
        self.store
            .merge_write(
                &self.path(),
                json!({
                    "admins": [uid],
                    "banned": [],
                    "createdAt": server_timestamp(),
                    "frequency": self.frequency,
                }),
            )
            .await?;
        Ok(ClaimOutcome::Claimed)
    }

    /// Add an admin. No floor check exists on the other end: demoting the
    /// last admin returns the channel to an unclaimed, re-claimable state.
    pub async fn promote(
        &self,
        admins: &[String],
        actor_uid: &str,
        target_uid: &str,
    ) -> Result<(), ChannelError> {
        self.require_admin(admins, actor_uid)?;
        self.store
            .update_array(&self.path(), "admins", ArrayOp::Union, json!(target_uid))
            .await?;
        Ok(())
    }

    pub async fn demote(
        &self,
        admins: &[String],
        actor_uid: &str,
        target_uid: &str,
    ) -> Result<(), ChannelError> {
        self.require_admin(admins, actor_uid)?;
        self.store
            .update_array(&self.path(), "admins", ArrayOp::Remove, json!(target_uid))
            .await?;
        Ok(())
    }

    pub async fn ban(
        &self,
        admins: &[String],
        actor_uid: &str,
        target_uid: &str,
    ) -> Result<(), ChannelError> {
        self.require_admin(admins, actor_uid)?;
        self.store
            .update_array(&self.path(), "banned", ArrayOp::Union, json!(target_uid))
            .await?;
        Ok(())
    }

    pub async fn unban(
        &self,
        admins: &[String],
        actor_uid: &str,
        target_uid: &str,
    ) -> Result<(), ChannelError> {
        self.require_admin(admins, actor_uid)?;
        self.store
            .update_array(&self.path(), "banned", ArrayOp::Remove, json!(target_uid))
            .await?;
        Ok(())
    }

    fn require_admin(&self, admins: &[String], actor_uid: &str) -> Result<(), ChannelError> {
        if admins.iter().any(|admin| admin == actor_uid) {
            Ok(())
        } else {
            Err(ChannelError::PermissionDenied)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn authority(store: &Arc<dyn DocumentStore>) -> ChannelAuthority {
        ChannelAuthority::new(store.clone(), "101.5")
    }

    #[tokio::test]
    async fn claiming_an_unclaimed_channel_installs_sole_admin() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let authority = authority(&store);

        assert_eq!(authority.claim("alice").await.unwrap(), ClaimOutcome::Claimed);
        let record = authority.load().await.unwrap();
        assert!(record.is_hosted());
        assert_eq!(record.admins, vec!["alice".to_string()]);
        assert!(record.banned.is_empty());
        assert!(record.created_at.is_some());
    }

    #[tokio::test]
    async fn second_claim_is_a_no_op_on_the_admin_set() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let authority = authority(&store);
        authority.claim("alice").await.unwrap();

        assert_eq!(
            authority.claim("bob").await.unwrap(),
            ClaimOutcome::AlreadyHosted
        );
        let record = authority.load().await.unwrap();
        assert_eq!(record.admins, vec!["alice".to_string()]);
    }

    #[tokio::test]
    async fn non_admin_operations_are_denied_without_mutation() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let authority = authority(&store);
        authority.claim("alice").await.unwrap();
        let admins = vec!["alice".to_string()];

        for result in [
            authority.promote(&admins, "mallory", "eve").await,
            authority.demote(&admins, "mallory", "alice").await,
            authority.ban(&admins, "mallory", "alice").await,
            authority.unban(&admins, "mallory", "alice").await,
        ] {
            assert!(matches!(result, Err(ChannelError::PermissionDenied)));
        }

        let record = authority.load().await.unwrap();
        assert_eq!(record.admins, vec!["alice".to_string()]);
        assert!(record.banned.is_empty());
    }

    #[tokio::test]
    async fn admins_accumulate_in_insertion_order() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let authority = authority(&store);
        authority.claim("alice").await.unwrap();
        let admins = vec!["alice".to_string()];

        authority.promote(&admins, "alice", "bob").await.unwrap();
        authority.promote(&admins, "alice", "carol").await.unwrap();
        let record = authority.load().await.unwrap();
        assert_eq!(record.admins, vec!["alice", "bob", "carol"]);
    }

    #[tokio::test]
    async fn demoting_the_last_admin_reopens_the_channel() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let authority = authority(&store);
        authority.claim("alice").await.unwrap();
        let admins = vec!["alice".to_string()];

        authority.demote(&admins, "alice", "alice").await.unwrap();
        let record = authority.load().await.unwrap();
        assert!(!record.is_hosted());

        // Anyone can claim again.
        assert_eq!(authority.claim("bob").await.unwrap(), ClaimOutcome::Claimed);
        assert_eq!(authority.load().await.unwrap().admins, vec!["bob".to_string()]);
    }

    #[tokio::test]
    async fn ban_and_unban_round_trip() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let authority = authority(&store);
        authority.claim("alice").await.unwrap();
        let admins = vec!["alice".to_string()];

        authority.ban(&admins, "alice", "troll").await.unwrap();
        assert!(authority.load().await.unwrap().is_banned("troll"));

        authority.unban(&admins, "alice", "troll").await.unwrap();
        assert!(!authority.load().await.unwrap().is_banned("troll"));
    }
}
