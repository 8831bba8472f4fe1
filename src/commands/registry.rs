//! Static command registry.
//!
//! One row per command, in the order the completion menu presents them.
//! Dispatch itself lives in the handlers; the table only carries metadata:
//! usage and help text, whether a login is required, the fixed argument
//! vocabulary (for completion), and whether the command is also reachable
//! from inside a conversation.

use crate::ui::theme::THEME_IDS;

#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
    /// Refused with an access-denied notice when not signed in.
    pub requires_auth: bool,
    /// Fixed first-argument vocabulary, offered by completion.
    pub subcommands: &'static [&'static str],
    /// Also intercepted while in chat or radio mode.
    pub conversational: bool,
}

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "help",
        usage: "help",
        help: "list available commands",
        requires_auth: false,
        subcommands: &[],
        conversational: true,
    },
    CommandSpec {
        name: "login",
        usage: "login [email]",
        help: "sign in to the network",
        requires_auth: false,
        subcommands: &[],
        conversational: false,
    },
    CommandSpec {
        name: "logout",
        usage: "logout",
        help: "sign out",
        requires_auth: true,
        subcommands: &[],
        conversational: false,
    },
    CommandSpec {
        name: "friend",
        usage: "friend add <email> | friend nick <email> <nickname>",
        help: "add a friend or set a nickname",
        requires_auth: true,
        subcommands: &["add", "nick"],
        conversational: false,
    },
    CommandSpec {
        name: "friends",
        usage: "friends",
        help: "list friends with status",
        requires_auth: true,
        subcommands: &[],
        conversational: false,
    },
    CommandSpec {
        name: "friends-email",
        usage: "friends-email",
        help: "list friends with email addresses",
        requires_auth: true,
        subcommands: &[],
        conversational: false,
    },
    CommandSpec {
        name: "chat",
        usage: "chat <friend|email|name>",
        help: "open a direct chat",
        requires_auth: true,
        subcommands: &[],
        conversational: false,
    },
    CommandSpec {
        name: "reqbox",
        usage: "reqbox",
        help: "show who has added you",
        requires_auth: true,
        subcommands: &[],
        conversational: false,
    },
    CommandSpec {
        name: "radio",
        usage: "radio <frequency>",
        help: "tune a broadcast channel",
        requires_auth: true,
        subcommands: &[],
        conversational: false,
    },
    CommandSpec {
        name: "burn",
        usage: "burn <message>",
        help: "send a self-destructing message (in chat)",
        requires_auth: true,
        subcommands: &[],
        conversational: true,
    },
    CommandSpec {
        name: "theme",
        usage: "theme <name>",
        help: "switch the display palette",
        requires_auth: false,
        subcommands: THEME_IDS,
        conversational: false,
    },
    CommandSpec {
        name: "ascii",
        usage: "ascii <url>",
        help: "render remote text art",
        requires_auth: false,
        subcommands: &[],
        conversational: true,
    },
    CommandSpec {
        name: "mute",
        usage: "mute",
        help: "disable audio cues",
        requires_auth: false,
        subcommands: &[],
        conversational: false,
    },
    CommandSpec {
        name: "unmute",
        usage: "unmute",
        help: "enable audio cues",
        requires_auth: false,
        subcommands: &[],
        conversational: false,
    },
    CommandSpec {
        name: "clear",
        usage: "clear",
        help: "clear the screen",
        requires_auth: false,
        subcommands: &[],
        conversational: true,
    },
    CommandSpec {
        name: "status",
        usage: "status <online|away|busy>",
        help: "set your presence",
        requires_auth: true,
        subcommands: &["online", "away", "busy"],
        conversational: false,
    },
    CommandSpec {
        name: "date",
        usage: "date",
        help: "show the current date and time",
        requires_auth: false,
        subcommands: &[],
        conversational: false,
    },
    CommandSpec {
        name: "exit",
        usage: "exit",
        help: "leave the current mode",
        requires_auth: false,
        subcommands: &[],
        conversational: true,
    },
    CommandSpec {
        name: "emoji",
        usage: "emoji",
        help: "list emoticon shortcodes",
        requires_auth: false,
        subcommands: &[],
        conversational: false,
    },
    CommandSpec {
        name: "ping",
        usage: "ping",
        help: "measure round-trip time to the store",
        requires_auth: false,
        subcommands: &[],
        conversational: false,
    },
    CommandSpec {
        name: "neofetch",
        usage: "neofetch",
        help: "show client and session info",
        requires_auth: false,
        subcommands: &[],
        conversational: false,
    },
    CommandSpec {
        name: "set-bio",
        usage: "set-bio",
        help: "open the profile editor",
        requires_auth: true,
        subcommands: &[],
        conversational: false,
    },
    CommandSpec {
        name: "whois",
        usage: "whois <email|name>",
        help: "look up a user's public profile",
        requires_auth: true,
        subcommands: &[],
        conversational: false,
    },
    CommandSpec {
        name: "mentions",
        usage: "mentions",
        help: "list recent mentions of you",
        requires_auth: true,
        subcommands: &[],
        conversational: false,
    },
    CommandSpec {
        name: "host",
        usage: "host [add|remove <user>]",
        help: "claim the channel or manage admins (in radio)",
        requires_auth: true,
        subcommands: &["add", "remove"],
        conversational: true,
    },
    CommandSpec {
        name: "unhost",
        usage: "unhost",
        help: "step down as channel admin (in radio)",
        requires_auth: true,
        subcommands: &[],
        conversational: true,
    },
    CommandSpec {
        name: "kick",
        usage: "kick <user>",
        help: "ban a user from the channel (in radio)",
        requires_auth: true,
        subcommands: &[],
        conversational: true,
    },
    CommandSpec {
        name: "unkick",
        usage: "unkick <user>",
        help: "lift a channel ban (in radio)",
        requires_auth: true,
        subcommands: &[],
        conversational: true,
    },
    CommandSpec {
        name: "host-list",
        usage: "host-list",
        help: "list channel admins (in radio)",
        requires_auth: true,
        subcommands: &[],
        conversational: true,
    },
];

pub fn find_command(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS
        .iter()
        .find(|spec| spec.name.eq_ignore_ascii_case(name))
}

/// Command names starting with `prefix`, registry order, case-insensitive.
pub fn completions_for(prefix: &str) -> Vec<&'static str> {
    let prefix = prefix.to_ascii_lowercase();
    COMMANDS
        .iter()
        .map(|spec| spec.name)
        .filter(|name| name.starts_with(&prefix))
        .collect()
}
