//! Tchat is a retro full-screen terminal chat client backed by a hosted
//! realtime document store.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the session/mode state machine, the realtime feed
//!   binder, channel authorization, the burn scheduler, and configuration.
//! - [`store`] defines the document-store contract (collections, ordered
//!   queries, realtime subscriptions, merge writes) plus an in-process
//!   reference backend used by the offline mode and the test suite.
//! - [`auth`] defines the identity-gateway contract (anonymous and
//!   authenticated sessions with session-change notifications).
//! - [`commands`] implements the command registry and the async dispatcher
//!   shared between console mode and in-conversation escape commands.
//! - [`ui`] renders the terminal interface: transcript, themes, the
//!   autocomplete engine, the profile editor, and the interactive loop.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::run`], which wires the backends into
//! [`core::app::App`] and hands control to [`ui::chat_loop`].

pub mod auth;
pub mod cli;
pub mod commands;
pub mod core;
pub mod store;
pub mod ui;
pub mod utils;
