//! # Management Module
//!
//! The playback engine proper, built on top of [`crate::spotify`]:
//!
//! - [`PlaybackSession`] - the state one authorized (or preview) session
//!   shares: the canonical song behind the reconciliation lock, the
//!   optimistic player state, the client and the display.
//! - [`PlaybackReconciler`] - the polling loop mirroring the remote player.
//! - [`PlayerController`] - play, pause, skip, search and queue with device
//!   fallback, or preview playback without an account.
//!
//! Both the reconciler and the controller hold the reconciliation lock for
//! their whole critical section; they block on it and never spin.

mod controller;
mod reconciler;
mod session;

pub use controller::{ActionOutcome, PlayerController};
pub use reconciler::{PlaybackReconciler, TickOutcome};
pub use session::PlaybackSession;
