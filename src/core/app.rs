//! The session controller.
//!
//! Owns the session state machine, the transcript, and the three realtime
//! feed bindings. Every mode switch follows the same strict order: dispose
//! the conversation feeds, clear the transcript, swap the mode and target,
//! then bind fresh feeds. The epoch counter increments on every switch so a
//! stale forwarder that raced disposal is filtered at the handler.

use crate::auth::{Identity, IdentityGateway};
use crate::core::burn::BurnScheduler;
use crate::core::channel::{ChannelAuthority, ChannelRecord};
use crate::core::constants::{CHANNELS_COLLECTION, NOTIFICATION_FRESHNESS, RECEIVER_ALL};
use crate::core::conversation::{conversation_id, conversation_query, ChatMessage};
use crate::core::feed::{self, FeedEvent, FeedHandle, FeedKind, FeedUpdate};
use crate::core::mentions::{self, Notification};
use crate::core::session::{ConversationTarget, Mode, Session};
use crate::core::config::Config;
use crate::store::{DocumentStore, Query, StoreError};
use crate::ui::editor::ProfileEditor;
use crate::ui::theme::Theme;
use crate::ui::transcript::{LineKind, Transcript};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

pub struct App {
    pub store: Arc<dyn DocumentStore>,
    pub gateway: Arc<dyn IdentityGateway>,
    pub session: Session,
    pub transcript: Transcript,
    pub config: Config,
    pub theme: Theme,
    pub editor: Option<ProfileEditor>,
    /// Display names seen in the current conversation, for mention
    /// completion. Reset on every mode switch.
    pub participants: Vec<String>,
    /// Cached admin list from the channel-metadata feed; authorization
    /// checks in radio mode run against this.
    pub channel_admins: Vec<String>,
    pub burns: BurnScheduler,
    pub http: reqwest::Client,
    pub started_at: Instant,
    pub should_quit: bool,

    feeds_tx: mpsc::UnboundedSender<FeedUpdate>,
    epoch: u64,
    message_feed: Option<FeedHandle>,
    channel_feed: Option<FeedHandle>,
    notification_feed: Option<FeedHandle>,
}

impl App {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        gateway: Arc<dyn IdentityGateway>,
        config: Config,
        feeds_tx: mpsc::UnboundedSender<FeedUpdate>,
    ) -> Self {
        let theme = config
            .theme
            .as_deref()
            .and_then(crate::ui::theme::by_id)
            .unwrap_or_default();
        Self {
            burns: BurnScheduler::new(store.clone()),
            store,
            gateway,
            session: Session::new(),
            transcript: Transcript::new(),
            config,
            theme,
            editor: None,
            participants: Vec::new(),
            channel_admins: Vec::new(),
            http: reqwest::Client::new(),
            started_at: Instant::now(),
            should_quit: false,
            feeds_tx,
            epoch: 0,
            message_feed: None,
            channel_feed: None,
            notification_feed: None,
        }
    }

    pub fn prompt(&self) -> String {
        self.session.prompt()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Uniform gate for commands that need a signed-in user.
    pub fn require_auth(&mut self) -> bool {
        if self.session.is_authenticated() {
            true
        } else {
            self.transcript.error("ACCESS DENIED. LOGIN REQUIRED.");
            false
        }
    }

    fn my_uid(&self) -> Option<String> {
        self.session.uid().map(str::to_string)
    }

    fn my_display_name(&self) -> String {
        self.session
            .identity
            .as_ref()
            .map(|identity| identity.display_name().to_string())
            .unwrap_or_else(|| "anonymous".into())
    }

    /// Tear down the conversation feeds and bump the epoch. The persistent
    /// notification feed is not touched here.
    fn dispose_conversation_feeds(&mut self) {
        if let Some(feed) = self.message_feed.take() {
            feed.dispose();
        }
        if let Some(feed) = self.channel_feed.take() {
            feed.dispose();
        }
        self.epoch += 1;
        self.participants.clear();
        self.channel_admins.clear();
    }

    pub fn enter_command_mode(&mut self) {
        self.dispose_conversation_feeds();
        self.transcript.clear();
        self.session.mode = Mode::Command;
        self.session.target = None;
        self.editor = None;
    }

    pub fn enter_direct_chat(&mut self, peer_uid: String, peer_email: String, nickname: Option<String>) {
        self.dispose_conversation_feeds();
        self.transcript.clear();
        self.session.mode = Mode::DirectChat;
        self.session.target = Some(ConversationTarget::DirectChat {
            peer_uid: peer_uid.clone(),
            peer_email,
            nickname,
        });

        let label = self
            .session
            .target
            .as_ref()
            .map(|t| t.label().to_string())
            .unwrap_or_default();
        self.transcript
            .system(format!("SECURE CHANNEL ESTABLISHED WITH {label}"));
        self.transcript.system("Type 'exit' to disconnect.");

        if let Some(uid) = self.my_uid() {
            let query = conversation_query(&conversation_id(&uid, &peer_uid));
            self.message_feed = Some(feed::bind(
                self.store.clone(),
                query,
                FeedKind::Messages,
                self.epoch,
                self.feeds_tx.clone(),
            ));
        }
    }

    /// Tune a broadcast frequency. Banned users are refused before any feed
    /// is bound.
    pub async fn enter_broadcast(&mut self, frequency: &str) -> Result<(), StoreError> {
        let Some(uid) = self.my_uid() else {
            self.transcript.error("ACCESS DENIED. LOGIN REQUIRED.");
            return Ok(());
        };
        let authority = ChannelAuthority::new(self.store.clone(), frequency);
        let record = authority.load().await?;
        if record.is_banned(&uid) {
            self.transcript
                .error(format!("CONNECTION REFUSED: you are banned from {frequency}"));
            return Ok(());
        }

        self.dispose_conversation_feeds();
        self.transcript.clear();
        self.session.mode = Mode::Broadcast;
        let target = ConversationTarget::broadcast(frequency);
        let ConversationTarget::Broadcast { channel_id, .. } = &target else {
            unreachable!()
        };
        let channel_id = channel_id.clone();
        self.session.target = Some(target);
        self.channel_admins = record.admins;

        self.transcript
            .system(format!("TUNED TO {frequency}. BROADCASTING IN THE CLEAR."));
        if self.channel_admins.is_empty() {
            self.transcript
                .system("Frequency is unhosted. Type 'host' to claim it.");
        }

        self.message_feed = Some(feed::bind(
            self.store.clone(),
            conversation_query(&channel_id),
            FeedKind::Messages,
            self.epoch,
            self.feeds_tx.clone(),
        ));
        self.channel_feed = Some(feed::bind(
            self.store.clone(),
            Query::collection(CHANNELS_COLLECTION).where_eq("frequency", json!(frequency)),
            FeedKind::ChannelMeta,
            self.epoch,
            self.feeds_tx.clone(),
        ));
        Ok(())
    }

    pub fn enter_profile_edit(&mut self, editor: ProfileEditor) {
        self.dispose_conversation_feeds();
        self.transcript.clear();
        self.session.mode = Mode::ProfileEdit;
        self.session.target = None;
        self.editor = Some(editor);
    }

    /// Start (or restart) the persistent mention-notification listener.
    pub fn bind_notifications(&mut self) {
        self.unbind_notifications();
        let Some(uid) = self.my_uid() else { return };
        self.notification_feed = Some(feed::bind(
            self.store.clone(),
            mentions::notification_query(&uid),
            FeedKind::Notifications,
            self.epoch,
            self.feeds_tx.clone(),
        ));
    }

    pub fn unbind_notifications(&mut self) {
        if let Some(feed) = self.notification_feed.take() {
            feed.dispose();
        }
    }

    /// Apply a session change observed on the gateway watch. Changes our own
    /// sign-in and sign-out paths already applied arrive as no-ops; a
    /// provider-side sign-out drops the session and any conversation with it.
    pub fn apply_session_change(&mut self, identity: Option<Identity>) {
        if self.session.identity == identity {
            return;
        }
        match identity {
            Some(identity) => {
                self.session.identity = Some(identity);
            }
            None => {
                self.session.identity = None;
                self.unbind_notifications();
                if self.session.mode != Mode::Command {
                    self.enter_command_mode();
                }
                self.transcript
                    .alert("SESSION EXPIRED: signed out by the identity provider.");
            }
        }
    }

    /// Admin-gated channel handle for the current broadcast target.
    pub fn channel_authority(&self) -> Option<ChannelAuthority> {
        match &self.session.target {
            Some(ConversationTarget::Broadcast { frequency, .. }) => Some(
                ChannelAuthority::new(self.store.clone(), frequency.clone()),
            ),
            _ => None,
        }
    }

    pub fn is_channel_admin(&self) -> bool {
        self.session
            .uid()
            .is_some_and(|uid| self.channel_admins.iter().any(|admin| admin == uid))
    }

    /// Send a message into the current conversation. Shortcodes and the
    /// `(?n)` token are expanded, mentions fan out notifications, and burn
    /// messages get their deletion timer. The message renders when it comes
    /// back through the feed.
    pub async fn send_message(
        &mut self,
        body: &str,
        is_burn: bool,
        is_art: bool,
    ) -> Result<(), StoreError> {
        let Some(uid) = self.my_uid() else {
            return Ok(());
        };
        let (conversation, receiver) = match &self.session.target {
            Some(ConversationTarget::DirectChat { peer_uid, .. }) => {
                (conversation_id(&uid, peer_uid), peer_uid.clone())
            }
            Some(ConversationTarget::Broadcast { channel_id, .. }) => {
                (channel_id.clone(), RECEIVER_ALL.to_string())
            }
            None => return Ok(()),
        };

        let body = if is_art {
            body.to_string()
        } else {
            mentions::expand_shortcodes(&mentions::expand_newline_token(body))
        };
        let sender_name = self.my_display_name();

        if !is_art {
            mentions::notify_mentions(&self.store, &uid, &sender_name, &body).await?;
        }

        let message = ChatMessage {
            conversation_id: conversation,
            sender_id: uid,
            sender_display_name: sender_name,
            body,
            receiver_id: receiver,
            is_art,
            is_burn,
            is_from_admin: self.session.mode == Mode::Broadcast && self.is_channel_admin(),
            created_at: None,
        };
        let id = self
            .store
            .create(crate::core::constants::MESSAGES_COLLECTION, message.to_wire())
            .await?;
        if is_burn {
            self.burns.schedule(id);
        }
        Ok(())
    }

    /// Route one feed update into the transcript. Updates from a superseded
    /// epoch are dropped; the notification feed outlives mode switches and
    /// is exempt from the guard.
    pub fn handle_feed_update(&mut self, update: FeedUpdate) {
        if update.kind != FeedKind::Notifications && update.epoch != self.epoch {
            tracing::debug!(epoch = update.epoch, current = self.epoch, "stale feed update dropped");
            return;
        }
        match (update.kind, update.event) {
            (FeedKind::Messages, FeedEvent::Added { id, fields }) => {
                match ChatMessage::from_wire(&fields) {
                    Ok(message) => self.render_message(&id, &message),
                    Err(err) => tracing::warn!(%id, %err, "undecodable message dropped"),
                }
            }
            (FeedKind::Messages, FeedEvent::Removed { id }) => {
                if self.transcript.remove_message(&id) {
                    self.transcript.system("A message has self-destructed.");
                }
            }
            (FeedKind::ChannelMeta, FeedEvent::Added { fields, .. }) => {
                match ChannelRecord::from_wire(&fields) {
                    Ok(record) => self.apply_channel_record(record),
                    Err(err) => tracing::warn!(%err, "undecodable channel record dropped"),
                }
            }
            (FeedKind::Notifications, FeedEvent::Added { fields, .. }) => {
                if let Ok(notification) = Notification::from_wire(&fields) {
                    self.render_notification(&notification);
                }
            }
            (_, FeedEvent::Failed(err)) => {
                if err.is_missing_index() {
                    self.transcript.error(
                        "QUERY REJECTED: the backend needs a composite index for this feed.",
                    );
                } else {
                    self.transcript.error(format!("FEED FAILURE: {err}"));
                }
            }
            (FeedKind::ChannelMeta | FeedKind::Notifications, FeedEvent::Removed { .. }) => {}
        }
    }

    fn render_message(&mut self, id: &str, message: &ChatMessage) {
        let own = self.session.uid() == Some(message.sender_id.as_str());
        if !own && !self.participants.contains(&message.sender_display_name) {
            self.participants.push(message.sender_display_name.clone());
        }

        if message.is_art {
            self.transcript.art(message.body.clone());
            return;
        }

        let mut sender = if own {
            "ME".to_string()
        } else {
            message.sender_display_name.clone()
        };
        if message.is_from_admin && message.is_broadcast() {
            sender.push_str(" (*)");
        }
        let kind = match (message.is_broadcast(), own) {
            (true, true) => LineKind::RadioOwn,
            (true, false) => LineKind::RadioPeer,
            (false, true) => LineKind::ChatOwn,
            (false, false) => LineKind::ChatPeer,
        };
        self.transcript
            .message(kind, sender, message.body.clone(), id, message.is_burn);
    }

    /// A changed channel record updates the cached admin list, and a ban on
    /// the local user evicts the session back to command mode immediately.
    fn apply_channel_record(&mut self, record: ChannelRecord) {
        self.channel_admins = record.admins.clone();
        let Some(uid) = self.my_uid() else { return };
        if self.session.mode == Mode::Broadcast && record.is_banned(&uid) {
            self.dispose_conversation_feeds();
            self.transcript.clear();
            self.session.mode = Mode::Command;
            self.session.target = None;
            self.transcript
                .alert("CONNECTION TERMINATED: you have been banned from this frequency.");
        }
    }

    fn render_notification(&mut self, notification: &Notification) {
        if self.session.uid() == Some(notification.from_user_id.as_str()) {
            return;
        }
        // Feed replay redelivers the latest notification; only alert on
        // fresh ones.
        let now = chrono::Utc::now().timestamp_millis();
        let fresh = notification
            .created_at
            .is_some_and(|at| now.saturating_sub(at) <= NOTIFICATION_FRESHNESS.as_millis() as i64);
        if fresh {
            self.transcript.alert(format!(
                "{} mentioned you: {}",
                notification.from_display_name, notification.preview_text
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::LocalIdentityGateway;
    use crate::core::profile;
    use crate::store::MemoryStore;

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    async fn signed_in_app(name: &str) -> (App, mpsc::UnboundedReceiver<FeedUpdate>) {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let gateway: Arc<dyn IdentityGateway> = Arc::new(LocalIdentityGateway::new());
        let (tx, rx) = mpsc::unbounded_channel();
        let mut app = App::new(store, gateway.clone(), Config::default(), tx);
        let identity = gateway
            .sign_in_interactive(Some(&format!("{name}@example.com")))
            .await
            .unwrap();
        profile::ensure_profile(&app.store, &identity).await.unwrap();
        app.session.identity = Some(identity);
        (app, rx)
    }

    fn drain(app: &mut App, rx: &mut mpsc::UnboundedReceiver<FeedUpdate>) {
        while let Ok(update) = rx.try_recv() {
            app.handle_feed_update(update);
        }
    }

    #[tokio::test]
    async fn direct_chat_renders_own_messages_as_me() {
        let (mut app, mut rx) = signed_in_app("ada").await;
        app.enter_direct_chat("peer-uid".into(), "peer@example.com".into(), None);
        settle().await;

        app.send_message("hello there", false, false).await.unwrap();
        settle().await;
        drain(&mut app, &mut rx);

        let line = app
            .transcript
            .lines()
            .iter()
            .find(|l| l.message_id.is_some())
            .expect("message line");
        assert_eq!(line.prefix.as_deref(), Some("ME"));
        assert_eq!(line.body, "hello there");
    }

    #[tokio::test]
    async fn stale_epoch_updates_are_dropped() {
        let (mut app, mut rx) = signed_in_app("ada").await;
        app.enter_direct_chat("peer-uid".into(), "peer@example.com".into(), None);
        settle().await;
        app.send_message("before switch", false, false).await.unwrap();
        settle().await;

        // Switch modes before draining: the queued update carries the old
        // epoch and must not reach the new transcript.
        app.enter_command_mode();
        drain(&mut app, &mut rx);
        assert!(app.transcript.lines().iter().all(|l| l.message_id.is_none()));
    }

    #[tokio::test]
    async fn banned_user_cannot_tune_the_frequency() {
        let (mut app, _rx) = signed_in_app("ada").await;
        let uid = app.session.uid().unwrap().to_string();
        let authority = ChannelAuthority::new(app.store.clone(), "99.9");
        authority.claim("host-uid").await.unwrap();
        authority
            .ban(&["host-uid".into()], "host-uid", &uid)
            .await
            .unwrap();

        app.enter_broadcast("99.9").await.unwrap();
        assert_eq!(app.session.mode, Mode::Command);
        assert!(app
            .transcript
            .lines()
            .iter()
            .any(|l| l.body.contains("CONNECTION REFUSED")));
    }

    #[tokio::test]
    async fn live_ban_evicts_the_session_mid_broadcast() {
        let (mut app, mut rx) = signed_in_app("ada").await;
        let uid = app.session.uid().unwrap().to_string();
        let authority = ChannelAuthority::new(app.store.clone(), "88.8");
        authority.claim("host-uid").await.unwrap();

        app.enter_broadcast("88.8").await.unwrap();
        settle().await;
        drain(&mut app, &mut rx);
        assert_eq!(app.session.mode, Mode::Broadcast);

        authority
            .ban(&["host-uid".into()], "host-uid", &uid)
            .await
            .unwrap();
        settle().await;
        drain(&mut app, &mut rx);

        assert_eq!(app.session.mode, Mode::Command);
        assert!(app
            .transcript
            .lines()
            .iter()
            .any(|l| l.body.contains("CONNECTION TERMINATED")));
    }

    #[tokio::test]
    async fn admin_broadcast_messages_carry_the_star_suffix() {
        let (mut app, mut rx) = signed_in_app("ada").await;
        let uid = app.session.uid().unwrap().to_string();

        app.enter_broadcast("77.7").await.unwrap();
        settle().await;
        let authority = app.channel_authority().unwrap();
        authority.claim(&uid).await.unwrap();
        settle().await;
        drain(&mut app, &mut rx);
        assert!(app.is_channel_admin());

        app.send_message("order on the channel", false, false)
            .await
            .unwrap();
        settle().await;
        drain(&mut app, &mut rx);

        let line = app
            .transcript
            .lines()
            .iter()
            .find(|l| l.message_id.is_some())
            .expect("message line");
        assert_eq!(line.prefix.as_deref(), Some("ME (*)"));
    }

    #[tokio::test]
    async fn provider_sign_out_drops_the_session() {
        let (mut app, _rx) = signed_in_app("ada").await;
        app.enter_direct_chat("peer-uid".into(), "peer@example.com".into(), None);

        app.apply_session_change(None);

        assert!(app.session.identity.is_none());
        assert_eq!(app.session.mode, Mode::Command);
        assert!(app
            .transcript
            .lines()
            .iter()
            .any(|l| l.body.contains("SESSION EXPIRED")));
    }

    #[tokio::test]
    async fn session_changes_already_applied_are_ignored() {
        let (mut app, _rx) = signed_in_app("ada").await;
        let before = app.transcript.len();
        app.apply_session_change(app.session.identity.clone());
        assert_eq!(app.transcript.len(), before);
        assert!(app.session.is_authenticated());
    }

    #[tokio::test]
    async fn peer_names_accumulate_as_participants() {
        let (mut app, mut rx) = signed_in_app("ada").await;
        app.enter_broadcast("55.5").await.unwrap();
        settle().await;

        let peer = ChatMessage {
            conversation_id: "RADIO_55.5".into(),
            sender_id: "peer-uid".into(),
            sender_display_name: "Bob".into(),
            body: "hi all".into(),
            receiver_id: RECEIVER_ALL.into(),
            is_art: false,
            is_burn: false,
            is_from_admin: false,
            created_at: None,
        };
        app.store
            .create(crate::core::constants::MESSAGES_COLLECTION, peer.to_wire())
            .await
            .unwrap();
        settle().await;
        drain(&mut app, &mut rx);

        assert_eq!(app.participants, vec!["Bob".to_string()]);
    }
}
