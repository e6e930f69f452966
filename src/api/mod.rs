//! # API Module
//!
//! HTTP endpoints of the local callback server used during authorization.
//!
//! - [`callback`] - receives Spotify's redirect and forwards the
//!   authorization code, or the denial, to the waiting credential store.
//! - [`health`] - status and version for a quick liveness check.
//!
//! The handlers are mounted by [`crate::server::LocalCallbackServer`].

mod callback;
mod health;

pub use callback::{ConsentSlot, callback};
pub use health::health;
