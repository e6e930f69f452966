//! Error taxonomy for the synchronization engine.
//!
//! Every remote or local failure is classified into one of five categories so
//! callers can decide how to react:
//!
//! - [`TransportError`] - DNS, timeouts, refused connections. Retryable by the
//!   caller, never retried internally.
//! - [`AuthError`] - consent denied, invalid refresh token, wrong flow. Never
//!   retried, usually ends in re-authorization or the preview fallback.
//! - [`DecodeError`] - a response body with an unexpected shape. Carries the
//!   payload for diagnosis.
//! - [`ApplicationError`] - an error embedded in a Spotify response body, such
//!   as `NO_ACTIVE_DEVICE`.
//! - [`PlaybackError`] - the local audio pipeline could not be opened or used.

use thiserror::Error;

/// Reason code Spotify embeds in player responses when no device is playing.
pub const NO_ACTIVE_DEVICE: &str = "NO_ACTIVE_DEVICE";

#[derive(Debug, Error)]
#[error("transport failure: {0}")]
pub struct TransportError(#[from] pub reqwest::Error);

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token endpoint unreachable: {0}")]
    NetworkUnavailable(String),

    #[error("token endpoint rejected the request: {0}")]
    ServerRejected(String),

    #[error("operation only applies to the authorization code + PKCE flow")]
    NotApplicable,

    #[error("no access token; authorize first")]
    Unauthenticated,

    #[error("user denied access: {0}")]
    ConsentDenied(String),

    #[error("authorization was cancelled before completing")]
    Cancelled,

    #[error("client-credentials flow requires SPOTIFY_API_AUTH_CLIENT_SECRET")]
    MissingClientSecret,

    #[error("consent window could not be shown: {0}")]
    ConsentUnavailable(String),
}

#[derive(Debug, Error)]
#[error("unexpected {shape} payload: {reason}")]
pub struct DecodeError {
    pub shape: &'static str,
    pub reason: String,
    pub payload: String,
}

impl DecodeError {
    pub fn new(shape: &'static str, reason: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            shape,
            reason: reason.into(),
            payload: payload.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error("no active Spotify device")]
    NoActiveDevice,

    #[error("Spotify API error {status}: {message}")]
    Api {
        status: u16,
        reason: Option<String>,
        message: String,
    },
}

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("audio output unavailable: {0}")]
    OutputUnavailable(String),

    #[error("preview source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("preview session was closed")]
    SessionClosed,

    #[error("streaming task failed: {0}")]
    Task(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Application(#[from] ApplicationError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no song loaded; search for a song or start playback on another device")]
    NoSongLoaded,

    #[error("no preview available for this track")]
    NoPreviewAvailable,

    #[error("operation is not available without a Spotify account")]
    UnsupportedInPreviewMode,
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(TransportError(err))
    }
}

impl Error {
    pub fn is_no_active_device(&self) -> bool {
        matches!(self, Error::Application(ApplicationError::NoActiveDevice))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
