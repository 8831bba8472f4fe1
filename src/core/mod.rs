//! Core client state: the session/mode controller, realtime feed binder,
//! channel authorization, burn scheduling, mentions, profiles, and config.

pub mod app;
pub mod burn;
pub mod channel;
pub mod config;
pub mod constants;
pub mod conversation;
pub mod feed;
pub mod mentions;
pub mod profile;
pub mod session;
