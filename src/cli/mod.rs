//! Command-line interface parsing and startup wiring.

use std::error::Error;
use std::fs::OpenOptions;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::auth::{IdentityGateway, LocalIdentityGateway};
use crate::core::app::App;
use crate::core::config::Config;
use crate::store::{DocumentStore, MemoryStore};
use crate::ui::chat_loop;

#[derive(Parser)]
#[command(name = "tchat")]
#[command(about = "A retro terminal chat client")]
#[command(version)]
#[command(
    long_about = "tchat is a full-screen terminal chat client styled after a classic \
green-phosphor console. It signs you in to a shared realtime message store and gives \
you direct chats, broadcast frequencies with host moderation, self-destructing \
messages, and @(mention) notifications.\n\n\
Controls:\n\
  Type              Enter a command or message\n\
  Tab               Complete commands, arguments, and @(mentions\n\
  Up/Down           Recall input history or cycle the completion menu\n\
  Enter             Submit\n\
  Ctrl+C            Power down the terminal\n\n\
Start with 'help' at the prompt."
)]
pub struct Args {
    /// Theme to use for this session (overrides the saved config)
    #[arg(short = 't', long, value_name = "NAME")]
    pub theme: Option<String>,

    /// Sign in with this account on startup
    #[arg(short = 'u', long, value_name = "EMAIL")]
    pub login: Option<String>,

    /// Start with audio cues muted
    #[arg(long)]
    pub muted: bool,

    /// Append diagnostics to this file (filtered by RUST_LOG)
    #[arg(short = 'l', long, value_name = "FILE")]
    pub log: Option<String>,
}

fn init_diagnostics(log_file: Option<&str>) -> Result<(), Box<dyn Error>> {
    let Some(path) = log_file else { return Ok(()) };
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(file)
        .with_ansi(false)
        .init();
    Ok(())
}

pub async fn run() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_diagnostics(args.log.as_deref())?;

    let mut config = Config::load()?;
    if let Some(theme) = args.theme.clone() {
        config.theme = Some(theme);
    }
    if args.muted {
        config.muted = true;
    }

    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let gateway: Arc<dyn IdentityGateway> = Arc::new(LocalIdentityGateway::new());

    let (feeds_tx, feeds_rx) = mpsc::unbounded_channel();
    let mut app = App::new(store, gateway.clone(), config, feeds_tx);

    // Every session starts anonymous; 'login' upgrades it.
    app.session.identity = Some(gateway.sign_in_anonymous().await?);
    if let Some(email) = args.login.as_deref() {
        crate::commands::handlers::account::login(&mut app, Some(email)).await?;
    }

    chat_loop::run(app, feeds_rx).await
}
