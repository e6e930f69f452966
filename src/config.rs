//! Configuration management for spotlet.
//!
//! Values come from environment variables, optionally loaded from a `.env`
//! file in the platform-specific local data directory:
//! 1. Environment variables (highest priority)
//! 2. `.env` file under `<data_local_dir>/spotlet/.env`
//! 3. Spotify defaults for endpoints and scopes
//!
//! The variables are read once into a [`Config`] which is handed to every
//! component that talks to Spotify.

use std::{env, path::PathBuf, time::Duration};

use thiserror::Error;

pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8898/callback";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8898";
pub const DEFAULT_SCOPE: &str = "user-read-private user-read-playback-state user-modify-playback-state user-read-recently-played user-read-currently-playing streaming";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Loads environment variables from a `.env` file in the local data directory.
///
/// The file is looked up in:
/// - Linux: `~/.local/share/spotlet/.env`
/// - macOS: `~/Library/Application Support/spotlet/.env`
/// - Windows: `%LOCALAPPDATA%/spotlet/.env`
///
/// A missing file is not an error; variables may come from the environment.
pub async fn load_env() -> Result<(), String> {
    let path = env_path();
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| e.to_string())?;
    }
    Ok(())
}

pub fn env_path() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("spotlet/.env");
    path
}

/// Runtime settings shared by the credential store, the API client and the
/// reconciler.
#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
    pub scope: String,
    pub server_addr: String,
    /// Name of the Spotify Connect device that represents this machine.
    /// Defaults to the local hostname.
    pub device_name: Option<String>,
    pub poll_interval: Duration,
}

impl Config {
    /// Settings pointing at the public Spotify endpoints.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            server_addr: DEFAULT_SERVER_ADDRESS.to_string(),
            device_name: None,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    /// Reads every setting from the environment.
    ///
    /// Only `SPOTIFY_API_AUTH_CLIENT_ID` is mandatory.
    pub fn from_env() -> Result<Self, ConfigError> {
        let client_id = var("SPOTIFY_API_AUTH_CLIENT_ID")
            .ok_or(ConfigError::Missing("SPOTIFY_API_AUTH_CLIENT_ID"))?;

        let poll_interval = match var("SPOTLET_POLL_INTERVAL_MS") {
            Some(raw) => {
                let ms = raw.parse::<u64>().map_err(|_| ConfigError::Invalid {
                    name: "SPOTLET_POLL_INTERVAL_MS",
                    value: raw.clone(),
                })?;
                Duration::from_millis(ms)
            }
            None => Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        };

        let defaults = Self::new(client_id);
        Ok(Self {
            client_secret: var("SPOTIFY_API_AUTH_CLIENT_SECRET"),
            redirect_uri: var("SPOTIFY_API_REDIRECT_URI").unwrap_or(defaults.redirect_uri.clone()),
            auth_url: var("SPOTIFY_API_AUTH_URL").unwrap_or(defaults.auth_url.clone()),
            token_url: var("SPOTIFY_API_TOKEN_URL").unwrap_or(defaults.token_url.clone()),
            api_url: var("SPOTIFY_API_URL").unwrap_or(defaults.api_url.clone()),
            scope: var("SPOTIFY_API_AUTH_SCOPE").unwrap_or(defaults.scope.clone()),
            server_addr: var("SERVER_ADDRESS").unwrap_or(defaults.server_addr.clone()),
            device_name: var("SPOTLET_DEVICE_NAME"),
            poll_interval,
            ..defaults
        })
    }

    /// The device name to look for in the devices list.
    pub fn local_device_name(&self) -> String {
        match &self.device_name {
            Some(name) => name.clone(),
            None => hostname::get()
                .map(|h| h.to_string_lossy().to_string())
                .unwrap_or_else(|_| "unknown".to_string()),
        }
    }
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
