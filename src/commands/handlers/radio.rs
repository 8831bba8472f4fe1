//! Broadcast-channel commands: tuning, hosting, and moderation.
//!
//! Moderation runs against the admin list cached from the channel feed, so
//! a freshly demoted admin loses their powers as soon as the record change
//! arrives.

use crate::commands::{unwrap_mention, CommandError};
use crate::core::app::App;
use crate::core::channel::ClaimOutcome;
use crate::core::profile;
use crate::core::session::Mode;

pub async fn radio(app: &mut App, args: &[&str]) -> Result<(), CommandError> {
    let Some(frequency) = args.first() else {
        app.transcript.error("USAGE: radio <frequency>");
        return Ok(());
    };
    app.enter_broadcast(frequency).await?;
    Ok(())
}

fn in_radio(app: &mut App) -> bool {
    if app.session.mode == Mode::Broadcast {
        true
    } else {
        app.transcript
            .error("Not tuned to a frequency. 'radio <frequency>' first.");
        false
    }
}

/// `host` claims the frequency; `host add|remove <user>` manages admins.
pub async fn host(app: &mut App, args: &[&str]) -> Result<(), CommandError> {
    if !in_radio(app) {
        return Ok(());
    }
    match args {
        [] => claim(app).await,
        ["add", target] => manage_admin(app, target, true).await,
        ["remove", target] => manage_admin(app, target, false).await,
        _ => {
            app.transcript
                .error("USAGE: host | host add <user> | host remove <user>");
            Ok(())
        }
    }
}

async fn claim(app: &mut App) -> Result<(), CommandError> {
    let Some(uid) = app.session.uid().map(str::to_string) else {
        return Ok(());
    };
    let Some(authority) = app.channel_authority() else {
        return Ok(());
    };
    match authority.claim(&uid).await? {
        ClaimOutcome::Claimed => {
            app.transcript
                .system("FREQUENCY CLAIMED. You are now the host.");
        }
        ClaimOutcome::AlreadyHosted => {
            app.transcript
                .error("This frequency already has a host.");
        }
    }
    Ok(())
}

/// Resolve a moderation target through the public directory; the argument
/// may be wrapped as `@(Name)` straight from completion.
async fn resolve_target(app: &mut App, target: &str) -> Result<Option<String>, CommandError> {
    let identifier = unwrap_mention(target);
    match profile::resolve_user(&app.store, identifier).await? {
        Some(profile) => Ok(Some(profile.uid)),
        None => {
            app.transcript
                .error(format!("NO RECORD FOR '{identifier}'"));
            Ok(None)
        }
    }
}

async fn manage_admin(app: &mut App, target: &str, add: bool) -> Result<(), CommandError> {
    let Some(uid) = app.session.uid().map(str::to_string) else {
        return Ok(());
    };
    let Some(target_uid) = resolve_target(app, target).await? else {
        return Ok(());
    };
    let Some(authority) = app.channel_authority() else {
        return Ok(());
    };
    let admins = app.channel_admins.clone();
    if add {
        authority.promote(&admins, &uid, &target_uid).await?;
        app.transcript.system("ADMIN ADDED.");
    } else {
        authority.demote(&admins, &uid, &target_uid).await?;
        app.transcript.system("ADMIN REMOVED.");
    }
    Ok(())
}

/// Step down; demoting yourself as last admin leaves the frequency
/// unhosted and claimable again.
pub async fn unhost(app: &mut App) -> Result<(), CommandError> {
    if !in_radio(app) {
        return Ok(());
    }
    let Some(uid) = app.session.uid().map(str::to_string) else {
        return Ok(());
    };
    let Some(authority) = app.channel_authority() else {
        return Ok(());
    };
    let admins = app.channel_admins.clone();
    authority.demote(&admins, &uid, &uid).await?;
    app.transcript.system("You are no longer hosting.");
    Ok(())
}

/// `kick` bans, `unkick` lifts the ban.
pub async fn kick(app: &mut App, args: &[&str], ban: bool) -> Result<(), CommandError> {
    if !in_radio(app) {
        return Ok(());
    }
    let Some(target) = args.first() else {
        let verb = if ban { "kick" } else { "unkick" };
        app.transcript.error(format!("USAGE: {verb} <user>"));
        return Ok(());
    };
    let Some(uid) = app.session.uid().map(str::to_string) else {
        return Ok(());
    };
    let Some(target_uid) = resolve_target(app, target).await? else {
        return Ok(());
    };
    let Some(authority) = app.channel_authority() else {
        return Ok(());
    };
    let admins = app.channel_admins.clone();
    if ban {
        authority.ban(&admins, &uid, &target_uid).await?;
        app.transcript.system("USER KICKED FROM THE FREQUENCY.");
    } else {
        authority.unban(&admins, &uid, &target_uid).await?;
        app.transcript.system("BAN LIFTED.");
    }
    Ok(())
}

pub async fn host_list(app: &mut App) -> Result<(), CommandError> {
    if !in_radio(app) {
        return Ok(());
    }
    let Some(authority) = app.channel_authority() else {
        return Ok(());
    };
    let record = authority.load().await?;
    if !record.is_hosted() {
        app.transcript.system("This frequency is unhosted.");
        return Ok(());
    }
    app.transcript.system("CHANNEL ADMINS:");
    for admin_uid in &record.admins {
        let name = profile::load(&app.store, admin_uid)
            .await?
            .map(|p| p.display_name)
            .unwrap_or_else(|| admin_uid.clone());
        app.transcript.plain(format!("  (*) {name}"));
    }
    Ok(())
}
