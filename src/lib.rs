//! spotlet library
//!
//! Mirrors and controls playback of a Spotify account from the terminal, or
//! plays 30 second preview clips locally when no account is connected.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints of the local authorization callback server
//! - `cli` - Command-line front ends for the subcommands
//! - `config` - Configuration from the environment and `.env`
//! - `display` - The display collaborator and its console implementation
//! - `error` - Error taxonomy of the engine
//! - `logging` - `tracing` subscriber setup
//! - `management` - Playback session, reconciler and player controller
//! - `preview` - Local preview streaming
//! - `server` - Local callback server used as the consent window
//! - `spotify` - Spotify Web API client and credential store
//! - `types` - Data structures and wire shapes
//! - `utils` - PKCE helpers and small utilities
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use spotlet::{
//!     config::Config,
//!     display::ConsoleDisplay,
//!     management::{PlaybackReconciler, PlaybackSession},
//!     server::LocalCallbackServer,
//!     spotify::{SpotifyClient, auth::CredentialStore},
//! };
//!
//! async fn run() -> spotlet::Res<()> {
//!     let config = Config::from_env()?;
//!     let http = reqwest::Client::new();
//!     let store = Arc::new(CredentialStore::new(http.clone(), config.clone()));
//!     let consent = Arc::new(LocalCallbackServer::new(&config.server_addr));
//!     store.authorize_with_pkce(consent).await??;
//!
//!     let client = SpotifyClient::new(http, &config.api_url, store);
//!     let session = Arc::new(PlaybackSession::new(
//!         client,
//!         Arc::new(ConsoleDisplay::new()),
//!         config.local_device_name(),
//!     ));
//!     PlaybackReconciler::new(session, config.poll_interval).spawn();
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod management;
pub mod preview;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// Boxed error alias used by the command-line layer.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// ```
/// info!("Waiting for authorization...");
/// info!("Found {} devices", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits with
/// status 1. Only for conditions the command cannot recover from.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning with a yellow exclamation mark.
///
/// Used for recoverable problems the user should see, such as a browser
/// that could not be opened or a missing device.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
