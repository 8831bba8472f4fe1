//! Terminal utility commands.

use crate::commands::{registry, CommandError};
use crate::core::app::App;
use crate::core::session::Mode;
use crate::store::Query;
use crate::ui::{boot, theme};
use crate::utils::{ascii, emoji};
use std::time::Instant;

pub fn help(app: &mut App) -> Result<(), CommandError> {
    app.transcript.system("AVAILABLE COMMANDS:");
    for spec in registry::COMMANDS {
        app.transcript
            .plain(format!("  {:<14} {}", spec.name, spec.help));
    }
    app.transcript
        .plain("  Tab completes commands, arguments, and @(mentions.");
    Ok(())
}

pub fn burn_outside_conversation(app: &mut App) -> Result<(), CommandError> {
    app.transcript
        .error("burn only works inside a conversation. 'chat' or 'radio' first.");
    Ok(())
}

pub fn theme(app: &mut App, name: Option<&str>) -> Result<(), CommandError> {
    let Some(selected) = name.and_then(theme::by_id) else {
        app.transcript
            .error(format!("USAGE: theme <{}>", theme::THEME_IDS.join("|")));
        return Ok(());
    };
    app.theme = selected;
    app.config.theme = Some(selected.id.to_string());
    if let Err(err) = app.config.save() {
        tracing::warn!(%err, "config save failed");
        app.transcript
            .error("Theme applied but could not be saved.");
    } else {
        app.transcript
            .system(format!("PHOSPHOR RETUNED: {}", selected.id));
    }
    Ok(())
}

pub async fn fetch_art(app: &App, url: &str) -> Result<String, CommandError> {
    Ok(ascii::fetch_text_art(&app.http, url).await?)
}

pub async fn ascii(app: &mut App, url: Option<&str>) -> Result<(), CommandError> {
    let Some(url) = url.filter(|u| !u.is_empty()) else {
        app.transcript.error("USAGE: ascii <url>");
        return Ok(());
    };
    let art = fetch_art(app, url).await?;
    app.transcript.art(art);
    Ok(())
}

pub fn set_muted(app: &mut App, muted: bool) -> Result<(), CommandError> {
    app.config.muted = muted;
    if let Err(err) = app.config.save() {
        tracing::warn!(%err, "config save failed");
    }
    app.transcript
        .system(if muted { "AUDIO OFF." } else { "AUDIO ON." });
    Ok(())
}

pub fn clear(app: &mut App) -> Result<(), CommandError> {
    app.transcript.clear();
    Ok(())
}

pub fn date(app: &mut App) -> Result<(), CommandError> {
    let now = chrono::Local::now();
    app.transcript
        .plain(now.format("%a %b %e %H:%M:%S %Y").to_string());
    Ok(())
}

pub fn exit(app: &mut App) -> Result<(), CommandError> {
    if app.session.mode == Mode::Command {
        app.transcript
            .system("Nothing to exit. Ctrl+C powers down the terminal.");
    } else {
        app.enter_command_mode();
        app.transcript.system("DISCONNECTED.");
    }
    Ok(())
}

pub fn emoji(app: &mut App) -> Result<(), CommandError> {
    app.transcript.system("EMOTICON SHORTCODES:");
    for (code, glyph) in emoji::EMOJI_TABLE {
        app.transcript.plain(format!("  {code:<16} {glyph}"));
    }
    Ok(())
}

/// Round-trip timing against the message store.
pub async fn ping(app: &mut App) -> Result<(), CommandError> {
    let started = Instant::now();
    app.store
        .run_query(&Query::collection(crate::core::constants::MESSAGES_COLLECTION).limit(1))
        .await?;
    let elapsed = started.elapsed().as_millis();
    app.transcript.system(format!("PONG: {elapsed}ms"));
    Ok(())
}

pub fn neofetch(app: &mut App) -> Result<(), CommandError> {
    let uptime = app.started_at.elapsed().as_secs();
    let user = app
        .session
        .identity
        .as_ref()
        .map(|identity| identity.prompt_name().to_string())
        .unwrap_or_else(|| "offline".into());

    app.transcript.art(boot::LOGO.trim_end().to_string());
    app.transcript.plain(format!("  user     {user}"));
    app.transcript
        .plain(format!("  client   tchat {}", env!("CARGO_PKG_VERSION")));
    if let Some(describe) = option_env!("VERGEN_GIT_DESCRIBE") {
        app.transcript.plain(format!("  build    {describe}"));
    }
    if let Some(rustc) = option_env!("VERGEN_RUSTC_SEMVER") {
        app.transcript.plain(format!("  rustc    {rustc}"));
    }
    app.transcript.plain(format!("  uptime   {uptime}s"));
    app.transcript.plain(format!("  theme    {}", app.theme.id));
    Ok(())
}
