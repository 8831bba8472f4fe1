//! Command dispatch.
//!
//! Command mode feeds every line through [`dispatch`]; conversation modes
//! feed lines through [`process_conversation_input`], which intercepts the
//! conversational commands and treats everything else as message text.

pub mod handlers;
pub mod registry;

use crate::core::app::App;
use crate::core::channel::ChannelError;
use crate::store::StoreError;
use crate::utils::ascii::ArtError;
use crate::auth::AuthError;
use std::fmt;

#[derive(Debug)]
pub enum CommandError {
    Store(StoreError),
    Channel(ChannelError),
    Auth(AuthError),
    Art(ArtError),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Store(err) => write!(f, "STORE ERROR: {err}"),
            CommandError::Channel(err) => write!(f, "{err}"),
            CommandError::Auth(err) => write!(f, "{err}"),
            CommandError::Art(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<StoreError> for CommandError {
    fn from(err: StoreError) -> Self {
        CommandError::Store(err)
    }
}

impl From<ChannelError> for CommandError {
    fn from(err: ChannelError) -> Self {
        CommandError::Channel(err)
    }
}

impl From<AuthError> for CommandError {
    fn from(err: AuthError) -> Self {
        CommandError::Auth(err)
    }
}

impl From<ArtError> for CommandError {
    fn from(err: ArtError) -> Self {
        CommandError::Art(err)
    }
}

/// Run one command line. Unknown names and failed handlers land in the
/// transcript; nothing here panics the loop.
pub async fn dispatch(app: &mut App, line: &str) {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else { return };
    let args: Vec<&str> = words.collect();

    let Some(spec) = registry::find_command(name) else {
        app.transcript
            .error(format!("UNKNOWN COMMAND: {}", name.to_lowercase()));
        return;
    };
    if spec.requires_auth && !app.require_auth() {
        return;
    }

    let result = match spec.name {
        "help" => handlers::misc::help(app),
        "login" => handlers::account::login(app, args.first().copied()).await,
        "logout" => handlers::account::logout(app).await,
        "friend" => handlers::friends::friend(app, &args).await,
        "friends" => handlers::friends::friends(app, false).await,
        "friends-email" => handlers::friends::friends(app, true).await,
        "chat" => handlers::friends::chat(app, &args).await,
        "reqbox" => handlers::friends::reqbox(app).await,
        "radio" => handlers::radio::radio(app, &args).await,
        "burn" => handlers::misc::burn_outside_conversation(app),
        "theme" => handlers::misc::theme(app, args.first().copied()),
        "ascii" => handlers::misc::ascii(app, args.first().copied()).await,
        "mute" => handlers::misc::set_muted(app, true),
        "unmute" => handlers::misc::set_muted(app, false),
        "clear" => handlers::misc::clear(app),
        "status" => handlers::account::status(app, args.first().copied()).await,
        "date" => handlers::misc::date(app),
        "exit" => handlers::misc::exit(app),
        "emoji" => handlers::misc::emoji(app),
        "ping" => handlers::misc::ping(app).await,
        "neofetch" => handlers::misc::neofetch(app),
        "set-bio" => handlers::account::set_bio(app).await,
        "whois" => handlers::account::whois(app, &args).await,
        "mentions" => handlers::account::mentions(app).await,
        "host" => handlers::radio::host(app, &args).await,
        "unhost" => handlers::radio::unhost(app).await,
        "kick" => handlers::radio::kick(app, &args, true).await,
        "unkick" => handlers::radio::kick(app, &args, false).await,
        "host-list" => handlers::radio::host_list(app).await,
        other => {
            tracing::error!(command = other, "registry entry without a handler");
            Ok(())
        }
    };
    if let Err(err) = result {
        app.transcript.error(err.to_string());
    }
}

/// Handle one submitted line while in chat or radio mode: conversational
/// commands are intercepted, `burn` and `ascii` prefixes get their message
/// treatment, and anything else is sent as text.
pub async fn process_conversation_input(app: &mut App, line: &str) {
    debug_assert!(app.session.mode.in_conversation());
    let first = line.split_whitespace().next().unwrap_or("");

    if let Some(spec) = registry::find_command(first) {
        if spec.conversational && !matches!(spec.name, "burn" | "ascii") {
            dispatch(app, line).await;
            return;
        }
    }

    let result = if let Some(rest) = strip_command_prefix(line, "burn") {
        if rest.is_empty() {
            app.transcript.error("USAGE: burn <message>");
            Ok(())
        } else {
            app.send_message(rest, true, false).await
        }
    } else if let Some(rest) = strip_command_prefix(line, "ascii") {
        if rest.is_empty() {
            app.transcript.error("USAGE: ascii <url>");
            return;
        }
        match handlers::misc::fetch_art(app, rest).await {
            Ok(art) => app.send_message(&art, false, true).await,
            Err(err) => {
                app.transcript.error(err.to_string());
                Ok(())
            }
        }
    } else {
        app.send_message(line, false, false).await
    };
    if let Err(err) = result {
        app.transcript.error(format!("SEND FAILED: {err}"));
    }
}

fn strip_command_prefix<'a>(line: &'a str, command: &str) -> Option<&'a str> {
    let first = line.split_whitespace().next()?;
    if first.eq_ignore_ascii_case(command) {
        Some(line[first.len()..].trim())
    } else {
        None
    }
}

/// Strip an `@(Name)` wrapper from a moderation target argument.
pub fn unwrap_mention(arg: &str) -> &str {
    arg.strip_prefix("@(")
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap_or(arg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{IdentityGateway, LocalIdentityGateway};
    use crate::core::config::Config;
    use crate::core::profile;
    use crate::store::{DocumentStore, MemoryStore};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    async fn app_with_login(name: Option<&str>) -> App {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let gateway: Arc<dyn IdentityGateway> = Arc::new(LocalIdentityGateway::new());
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(store, gateway.clone(), Config::default(), tx);
        if let Some(name) = name {
            let identity = gateway
                .sign_in_interactive(Some(&format!("{name}@example.com")))
                .await
                .unwrap();
            profile::ensure_profile(&app.store, &identity).await.unwrap();
            app.session.identity = Some(identity);
        }
        app
    }

    fn transcript_text(app: &App) -> String {
        app.transcript
            .lines()
            .iter()
            .map(|l| l.body.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn unknown_commands_are_reported_lowercased() {
        let mut app = app_with_login(None).await;
        dispatch(&mut app, "FLOOP now").await;
        assert!(transcript_text(&app).contains("UNKNOWN COMMAND: floop"));
    }

    #[tokio::test]
    async fn auth_gated_commands_are_refused_when_signed_out() {
        let mut app = app_with_login(None).await;
        dispatch(&mut app, "friends").await;
        assert!(transcript_text(&app).contains("ACCESS DENIED. LOGIN REQUIRED."));
    }

    #[tokio::test]
    async fn moderation_commands_are_intercepted_in_radio_mode() {
        let mut app = app_with_login(Some("ada")).await;
        app.enter_broadcast("42.0").await.unwrap();

        process_conversation_input(&mut app, "host").await;
        let authority = app.channel_authority().unwrap();
        let record = authority.load().await.unwrap();
        assert!(record.is_hosted());
    }

    #[tokio::test]
    async fn exit_returns_to_command_mode() {
        let mut app = app_with_login(Some("ada")).await;
        app.enter_direct_chat("peer".into(), "peer@example.com".into(), None);
        process_conversation_input(&mut app, "exit").await;
        assert_eq!(app.session.mode, crate::core::session::Mode::Command);
    }

    #[test]
    fn mention_wrappers_unwrap_for_target_arguments() {
        assert_eq!(unwrap_mention("@(Bob)"), "Bob");
        assert_eq!(unwrap_mention("bob@example.com"), "bob@example.com");
        assert_eq!(unwrap_mention("@(unclosed"), "@(unclosed");
    }
}
