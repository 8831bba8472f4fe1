//! Shared constants and persisted-collection paths.

use std::time::Duration;

/// Delay before a self-destruct message is deleted by the sending client.
pub const BURN_DELAY: Duration = Duration::from_secs(10);

/// Mention notifications older than this are not alerted on feed replay.
pub const NOTIFICATION_FRESHNESS: Duration = Duration::from_secs(30);

/// Maximum length of a mention notification preview.
pub const NOTIFICATION_PREVIEW_MAX: usize = 50;

/// Broadcast conversation ids are the frequency label behind this prefix.
pub const RADIO_CHANNEL_PREFIX: &str = "RADIO_";

/// Receiver id marking a broadcast message.
pub const RECEIVER_ALL: &str = "ALL";

pub const PROFILES_COLLECTION: &str = "public/user_profiles";
pub const MESSAGES_COLLECTION: &str = "public/messages";
pub const CHANNELS_COLLECTION: &str = "public/radio_channels";

pub fn profile_path(uid: &str) -> String {
    format!("{PROFILES_COLLECTION}/{uid}")
}

pub fn message_path(id: &str) -> String {
    format!("{MESSAGES_COLLECTION}/{id}")
}

pub fn channel_path(frequency: &str) -> String {
    format!("{CHANNELS_COLLECTION}/{frequency}")
}

pub fn friends_collection(uid: &str) -> String {
    format!("users/{uid}/friends")
}

pub fn friend_path(uid: &str, peer_uid: &str) -> String {
    format!("users/{uid}/friends/{peer_uid}")
}

pub fn notifications_collection(uid: &str) -> String {
    format!("users/{uid}/notifications")
}
