//! Session state: the single interaction mode and its conversation target.

use crate::auth::Identity;
use crate::core::constants::RADIO_CHANNEL_PREFIX;

/// The single exclusive interaction context of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Command,
    DirectChat,
    Broadcast,
    ProfileEdit,
}

impl Mode {
    pub fn in_conversation(self) -> bool {
        matches!(self, Mode::DirectChat | Mode::Broadcast)
    }
}

/// The peer or channel the current mode is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationTarget {
    DirectChat {
        peer_uid: String,
        peer_email: String,
        nickname: Option<String>,
    },
    Broadcast {
        frequency: String,
        channel_id: String,
    },
}

impl ConversationTarget {
    pub fn broadcast(frequency: impl Into<String>) -> Self {
        let frequency = frequency.into();
        let channel_id = format!("{RADIO_CHANNEL_PREFIX}{frequency}");
        ConversationTarget::Broadcast {
            frequency,
            channel_id,
        }
    }

    /// Label shown in the prompt and connection banner.
    pub fn label(&self) -> &str {
        match self {
            ConversationTarget::DirectChat {
                nickname: Some(nick),
                ..
            } => nick,
            ConversationTarget::DirectChat { peer_email, .. } => peer_email,
            ConversationTarget::Broadcast { frequency, .. } => frequency,
        }
    }
}

/// Exactly one per running client; mutated only by the session controller.
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: Option<Identity>,
    pub mode: Mode,
    pub target: Option<ConversationTarget>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            identity: None,
            mode: Mode::Command,
            target: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity
            .as_ref()
            .is_some_and(|identity| !identity.is_anonymous())
    }

    pub fn uid(&self) -> Option<&str> {
        self.identity.as_ref().map(Identity::uid)
    }

    /// The prompt label for the current mode.
    pub fn prompt(&self) -> String {
        match (&self.mode, &self.target) {
            (Mode::DirectChat, Some(target)) => format!("[CHAT:{}] >", target.label()),
            (Mode::Broadcast, Some(target)) => format!("[RADIO:{}] >", target.label()),
            _ => {
                let name = self
                    .identity
                    .as_ref()
                    .map(Identity::prompt_name)
                    .unwrap_or("offline");
                format!("{name}@tchat:~$")
            }
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_follows_mode_and_identity() {
        let mut session = Session::new();
        assert_eq!(session.prompt(), "offline@tchat:~$");

        session.identity = Some(Identity::Authenticated {
            uid: "u1".into(),
            email: "ada@example.com".into(),
            display_name: "Ada".into(),
        });
        assert_eq!(session.prompt(), "ada@tchat:~$");

        session.mode = Mode::Broadcast;
        session.target = Some(ConversationTarget::broadcast("101.5"));
        assert_eq!(session.prompt(), "[RADIO:101.5] >");

        session.mode = Mode::DirectChat;
        session.target = Some(ConversationTarget::DirectChat {
            peer_uid: "u2".into(),
            peer_email: "bob@example.com".into(),
            nickname: Some("bobby".into()),
        });
        assert_eq!(session.prompt(), "[CHAT:bobby] >");
    }

    #[test]
    fn broadcast_target_derives_channel_id() {
        let target = ConversationTarget::broadcast("88.8");
        let ConversationTarget::Broadcast { channel_id, .. } = &target else {
            unreachable!()
        };
        assert_eq!(channel_id, "RADIO_88.8");
    }
}
