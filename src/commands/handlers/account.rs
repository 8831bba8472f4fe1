//! Account and profile commands: login, logout, status, whois, set-bio,
//! mentions.

use crate::commands::CommandError;
use crate::core::app::App;
use crate::core::mentions;
use crate::core::profile::{self, Status};
use crate::ui::editor::ProfileEditor;
use chrono::TimeZone;

pub async fn login(app: &mut App, account: Option<&str>) -> Result<(), CommandError> {
    if app.session.is_authenticated() {
        app.transcript.system("Already logged in. 'logout' first.");
        return Ok(());
    }
    let identity = match app.gateway.sign_in_interactive(account).await {
        Ok(identity) => identity,
        Err(err) => {
            app.transcript.error(format!("LOGIN FAILED: {err}"));
            return Ok(());
        }
    };
    profile::ensure_profile(&app.store, &identity).await?;
    let name = identity.display_name().to_string();
    app.session.identity = Some(identity);
    app.bind_notifications();
    app.transcript
        .system(format!("LOGIN ACCEPTED. Welcome back, {name}."));
    Ok(())
}

pub async fn logout(app: &mut App) -> Result<(), CommandError> {
    if let Some(uid) = app.session.uid().map(str::to_string) {
        if app.session.is_authenticated() {
            profile::update_status(&app.store, &uid, Status::Away).await?;
        }
    }
    app.gateway.sign_out().await?;
    app.unbind_notifications();
    app.session.identity = Some(app.gateway.sign_in_anonymous().await?);
    app.enter_command_mode();
    app.transcript.system("CONNECTION CLOSED. You are anonymous again.");
    Ok(())
}

pub async fn status(app: &mut App, value: Option<&str>) -> Result<(), CommandError> {
    let Some(status) = value.and_then(|v| v.parse::<Status>().ok()) else {
        app.transcript.error("USAGE: status <online|away|busy>");
        return Ok(());
    };
    let Some(uid) = app.session.uid().map(str::to_string) else {
        return Ok(());
    };
    profile::update_status(&app.store, &uid, status).await?;
    app.transcript
        .system(format!("STATUS SET TO {}", status.as_str().to_uppercase()));
    Ok(())
}

pub async fn set_bio(app: &mut App) -> Result<(), CommandError> {
    let Some(uid) = app.session.uid().map(str::to_string) else {
        return Ok(());
    };
    let current = profile::load(&app.store, &uid).await?;
    app.enter_profile_edit(ProfileEditor::from_profile(current.as_ref()));
    Ok(())
}

fn format_joined(at: Option<i64>) -> String {
    at.and_then(|millis| chrono::Utc.timestamp_millis_opt(millis).single())
        .map(|ts| ts.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown".into())
}

pub async fn whois(app: &mut App, args: &[&str]) -> Result<(), CommandError> {
    let Some(identifier) = args.first() else {
        app.transcript.error("USAGE: whois <email|name>");
        return Ok(());
    };
    let Some(profile) = profile::resolve_user(&app.store, identifier).await? else {
        app.transcript.error(format!("NO RECORD FOR '{identifier}'"));
        return Ok(());
    };

    app.transcript.plain("+----------------------------------+");
    app.transcript.plain(format!("| USER: {}", profile.display_name));
    app.transcript.plain(format!("| MAIL: {}", profile.email));
    app.transcript
        .plain(format!("| STAT: {}", profile.status.as_str()));
    app.transcript
        .plain(format!("| SINCE: {}", format_joined(profile.joined_at)));
    if let Some(bio) = profile.bio.as_deref().filter(|b| !b.is_empty()) {
        app.transcript.plain(format!("| BIO: {bio}"));
    }
    app.transcript.plain("+----------------------------------+");
    if let Some(art) = profile.avatar_art.as_deref().filter(|a| !a.is_empty()) {
        app.transcript.art(art.to_string());
    }
    Ok(())
}

pub async fn mentions(app: &mut App) -> Result<(), CommandError> {
    let Some(uid) = app.session.uid().map(str::to_string) else {
        return Ok(());
    };
    let recent = mentions::recent_mentions(&app.store, &uid, 10).await?;
    if recent.is_empty() {
        app.transcript.system("No recent mentions.");
        return Ok(());
    }
    app.transcript.system("RECENT MENTIONS:");
    for notification in recent {
        app.transcript.plain(format!(
            "  {} -- {}",
            notification.from_display_name, notification.preview_text
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{IdentityGateway, LocalIdentityGateway};
    use crate::core::config::Config;
    use crate::core::session::Mode;
    use crate::store::{DocumentStore, MemoryStore};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn bare_app() -> App {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let gateway: Arc<dyn IdentityGateway> = Arc::new(LocalIdentityGateway::new());
        let (tx, _rx) = mpsc::unbounded_channel();
        App::new(store, gateway, Config::default(), tx)
    }

    #[tokio::test]
    async fn login_creates_a_directory_profile() {
        let mut app = bare_app();
        login(&mut app, Some("ada@example.com")).await.unwrap();
        assert!(app.session.is_authenticated());

        let found = profile::resolve_user(&app.store, "ada@example.com")
            .await
            .unwrap();
        assert_eq!(found.unwrap().display_name, "ada");
    }

    #[tokio::test]
    async fn login_without_account_reports_not_panics() {
        let mut app = bare_app();
        login(&mut app, None).await.unwrap();
        assert!(!app.session.is_authenticated());
        assert!(app
            .transcript
            .lines()
            .iter()
            .any(|l| l.body.contains("LOGIN FAILED")));
    }

    #[tokio::test]
    async fn logout_returns_to_an_anonymous_command_session() {
        let mut app = bare_app();
        login(&mut app, Some("ada@example.com")).await.unwrap();
        logout(&mut app).await.unwrap();
        assert!(!app.session.is_authenticated());
        assert!(app.session.identity.is_some());
        assert_eq!(app.session.mode, Mode::Command);
    }

    #[tokio::test]
    async fn whois_renders_the_profile_box() {
        let mut app = bare_app();
        login(&mut app, Some("bob@example.com")).await.unwrap();
        whois(&mut app, &["bob"]).await.unwrap();
        let text: Vec<_> = app.transcript.lines().iter().map(|l| l.body.clone()).collect();
        assert!(text.iter().any(|l| l.contains("USER: bob")));
        assert!(text.iter().any(|l| l.contains("MAIL: bob@example.com")));
    }

    #[tokio::test]
    async fn set_bio_enters_the_profile_editor() {
        let mut app = bare_app();
        login(&mut app, Some("ada@example.com")).await.unwrap();
        set_bio(&mut app).await.unwrap();
        assert_eq!(app.session.mode, Mode::ProfileEdit);
        assert_eq!(app.editor.as_ref().unwrap().display_name, "ada");
    }
}
