//! Identity-gateway contract and the local reference gateway.
//!
//! The hosted identity provider supports anonymous sessions, interactive
//! sign-in, sign-out, and session-change notifications. The contract is a
//! trait so the client core never names a concrete provider; the local
//! gateway derives deterministic ids from the account email, which keeps two
//! clients signed in with the same address on the same conversation id.

use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

/// The resolved identity of this session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Anonymous {
        uid: String,
    },
    Authenticated {
        uid: String,
        email: String,
        display_name: String,
    },
}

impl Identity {
    pub fn uid(&self) -> &str {
        match self {
            Identity::Anonymous { uid } => uid,
            Identity::Authenticated { uid, .. } => uid,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous { .. })
    }

    /// Short name for the prompt label: the local part of the email for
    /// authenticated sessions, `guest` otherwise.
    pub fn prompt_name(&self) -> &str {
        match self {
            Identity::Anonymous { .. } => "guest",
            Identity::Authenticated { email, .. } => {
                email.split('@').next().unwrap_or(email.as_str())
            }
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Identity::Anonymous { .. } => "guest",
            Identity::Authenticated { display_name, .. } => display_name,
        }
    }
}

#[derive(Debug)]
pub enum AuthError {
    /// The provider rejected or failed the sign-in.
    Unavailable(String),
    /// Interactive sign-in needs an account identifier.
    MissingAccount,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Unavailable(msg) => write!(f, "identity provider unavailable: {msg}"),
            AuthError::MissingAccount => write!(f, "an account email is required to sign in"),
        }
    }
}

impl std::error::Error for AuthError {}

#[async_trait]
pub trait IdentityGateway: Send + Sync {
    /// Establish an anonymous session.
    async fn sign_in_anonymous(&self) -> Result<Identity, AuthError>;

    /// Establish an authenticated session. The account hint is the email
    /// entered at the console; a hosted provider would run its own flow.
    async fn sign_in_interactive(&self, account: Option<&str>) -> Result<Identity, AuthError>;

    /// End the authenticated session.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Watch session changes; `None` means no session at all.
    fn watch_session(&self) -> watch::Receiver<Option<Identity>>;
}

/// In-process gateway used by offline sessions and tests.
pub struct LocalIdentityGateway {
    sessions: watch::Sender<Option<Identity>>,
    guest_counter: AtomicU64,
}

impl LocalIdentityGateway {
    pub fn new() -> Self {
        let (sessions, _) = watch::channel(None);
        Self {
            sessions,
            guest_counter: AtomicU64::new(0),
        }
    }

    /// Stable uid for an email so re-login and cross-client tests agree.
    pub fn uid_for_email(email: &str) -> String {
        // FNV-1a; collision risk is irrelevant at this scale.
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in email.to_ascii_lowercase().bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
        format!("u{hash:016x}")
    }
}

impl Default for LocalIdentityGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityGateway for LocalIdentityGateway {
    async fn sign_in_anonymous(&self) -> Result<Identity, AuthError> {
        let n = self.guest_counter.fetch_add(1, Ordering::Relaxed);
        let identity = Identity::Anonymous {
            uid: format!("guest{n:04}"),
        };
        let _ = self.sessions.send(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_in_interactive(&self, account: Option<&str>) -> Result<Identity, AuthError> {
        let email = account
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(AuthError::MissingAccount)?;
        let display_name = email.split('@').next().unwrap_or(email).to_string();
        let identity = Identity::Authenticated {
            uid: Self::uid_for_email(email),
            email: email.to_string(),
            display_name,
        };
        let _ = self.sessions.send(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let _ = self.sessions.send(None);
        Ok(())
    }

    fn watch_session(&self) -> watch::Receiver<Option<Identity>> {
        self.sessions.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn interactive_sign_in_is_deterministic_per_email() {
        let gateway = LocalIdentityGateway::new();
        let a = gateway.sign_in_interactive(Some("bob@example.com")).await.unwrap();
        let b = gateway.sign_in_interactive(Some("Bob@Example.com")).await.unwrap();
        assert_eq!(a.uid(), b.uid());
        assert_eq!(a.prompt_name(), "bob");
        assert!(!a.is_anonymous());
    }

    #[tokio::test]
    async fn sign_in_without_account_is_rejected() {
        let gateway = LocalIdentityGateway::new();
        assert!(matches!(
            gateway.sign_in_interactive(None).await,
            Err(AuthError::MissingAccount)
        ));
        assert!(matches!(
            gateway.sign_in_interactive(Some("  ")).await,
            Err(AuthError::MissingAccount)
        ));
    }

    #[tokio::test]
    async fn session_watch_sees_sign_out() {
        let gateway = LocalIdentityGateway::new();
        let mut watch = gateway.watch_session();
        gateway.sign_in_anonymous().await.unwrap();
        watch.changed().await.unwrap();
        assert!(watch.borrow().as_ref().is_some_and(Identity::is_anonymous));
        gateway.sign_out().await.unwrap();
        watch.changed().await.unwrap();
        assert!(watch.borrow().is_none());
    }
}
