//! Friend-list commands and direct-chat entry.

use crate::commands::CommandError;
use crate::core::app::App;
use crate::core::conversation;
use crate::core::profile::{self, Status};

pub async fn friend(app: &mut App, args: &[&str]) -> Result<(), CommandError> {
    match args {
        ["add", email] => add(app, email).await,
        ["nick", email, nick @ ..] if !nick.is_empty() => {
            nickname(app, email, &nick.join(" ")).await
        }
        _ => {
            app.transcript
                .error("USAGE: friend add <email> | friend nick <email> <nickname>");
            Ok(())
        }
    }
}

async fn add(app: &mut App, email: &str) -> Result<(), CommandError> {
    let Some(uid) = app.session.uid().map(str::to_string) else {
        return Ok(());
    };
    let Some(peer) = profile::resolve_user(&app.store, email).await? else {
        app.transcript.error(format!("NO USER WITH ADDRESS '{email}'"));
        return Ok(());
    };
    if peer.uid == uid {
        app.transcript.error("You cannot befriend yourself.");
        return Ok(());
    }
    profile::add_friend(&app.store, &uid, &peer).await?;
    app.transcript
        .system(format!("FRIEND ADDED: {} <{}>", peer.display_name, peer.email));
    Ok(())
}

async fn nickname(app: &mut App, email: &str, nick: &str) -> Result<(), CommandError> {
    let Some(uid) = app.session.uid().map(str::to_string) else {
        return Ok(());
    };
    if profile::set_nickname(&app.store, &uid, email, nick).await? {
        app.transcript
            .system(format!("NICKNAME SET: {email} -> {nick}"));
    } else {
        app.transcript
            .error(format!("'{email}' is not in your friend list."));
    }
    Ok(())
}

fn status_dot(status: Status) -> char {
    match status {
        Status::Online => '●',
        Status::Away => '◐',
        Status::Busy => '○',
    }
}

/// List friends; with `with_email` the address column replaces the status
/// dot.
pub async fn friends(app: &mut App, with_email: bool) -> Result<(), CommandError> {
    let Some(uid) = app.session.uid().map(str::to_string) else {
        return Ok(());
    };
    let list = profile::list_friends(&app.store, &uid).await?;
    if list.is_empty() {
        app.transcript
            .system("Your friend list is empty. 'friend add <email>' to start.");
        return Ok(());
    }
    app.transcript.system("FRIENDS:");
    for entry in list {
        if with_email {
            app.transcript
                .plain(format!("  {:<20} {}", entry.label(), entry.email));
        } else {
            let status = profile::load(&app.store, &entry.uid)
                .await?
                .map(|p| p.status)
                .unwrap_or_default();
            app.transcript
                .plain(format!("  {} {}", status_dot(status), entry.label()));
        }
    }
    Ok(())
}

/// Open a direct chat. The identifier resolves through the friend list
/// first (nickname, then email), then the public directory (email, then
/// display name).
pub async fn chat(app: &mut App, args: &[&str]) -> Result<(), CommandError> {
    let Some(identifier) = args.first() else {
        app.transcript.error("USAGE: chat <friend|email|name>");
        return Ok(());
    };
    let Some(uid) = app.session.uid().map(str::to_string) else {
        return Ok(());
    };

    let (peer_uid, peer_email, nickname) =
        match profile::find_friend(&app.store, &uid, identifier).await? {
            Some(entry) => (entry.uid, entry.email, entry.nickname),
            None => match profile::resolve_user(&app.store, identifier).await? {
                Some(peer) => (peer.uid, peer.email, None),
                None => {
                    app.transcript
                        .error(format!("NO ROUTE TO '{identifier}'. Check the address."));
                    return Ok(());
                }
            },
        };
    if peer_uid == uid {
        app.transcript.error("You cannot chat with yourself.");
        return Ok(());
    }
    app.enter_direct_chat(peer_uid, peer_email, nickname);
    Ok(())
}

/// Inbox scan: distinct people who have messaged you, tagged `[FRIEND]`
/// when already in your list and `[NEW]` otherwise.
pub async fn reqbox(app: &mut App) -> Result<(), CommandError> {
    let Some(uid) = app.session.uid().map(str::to_string) else {
        return Ok(());
    };
    let inbound = conversation::messages_addressed_to(&app.store, &uid).await?;
    let friends = profile::list_friends(&app.store, &uid).await?;

    let mut seen: Vec<(String, String)> = Vec::new();
    for message in inbound {
        if !seen.iter().any(|(sender_uid, _)| *sender_uid == message.sender_id) {
            seen.push((message.sender_id, message.sender_display_name));
        }
    }
    if seen.is_empty() {
        app.transcript.system("REQBOX EMPTY. Nobody has hailed you.");
        return Ok(());
    }
    app.transcript.system("INCOMING TRAFFIC FROM:");
    for (sender_uid, name) in seen {
        let tag = if friends.iter().any(|f| f.uid == sender_uid) {
            "[FRIEND]"
        } else {
            "[NEW]"
        };
        app.transcript.plain(format!("  {tag:<8} {name}"));
    }
    Ok(())
}
