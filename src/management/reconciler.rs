use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::{
    error::Error,
    management::PlaybackSession,
    spotify::decode::PlaybackStateResult,
    types::{AlbumArt, PlayerState, Song},
};

/// What a single reconciliation pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Updated { track_changed: bool },
    NoActivePlayer,
    NothingPlaying,
    DecodeFailed,
    ConnectionLost,
    /// Auth or API failure; logged and skipped.
    Failed,
}

/// Mirrors the remote player into the session once per interval.
pub struct PlaybackReconciler {
    session: Arc<PlaybackSession>,
    interval: Duration,
    connection_lost: AtomicBool,
}

impl PlaybackReconciler {
    pub fn new(session: Arc<PlaybackSession>, interval: Duration) -> Self {
        Self {
            session,
            interval,
            connection_lost: AtomicBool::new(false),
        }
    }

    /// Runs one pass under the reconciliation lock. Never fails.
    pub async fn tick(&self) -> TickOutcome {
        let mut current = self.session.lock().await;

        self.session.refresh_if_due().await;

        let state = match self.session.client().playback_state().await {
            Ok(state) => {
                if self.connection_lost.swap(false, Ordering::SeqCst) {
                    debug!("connection restored");
                }
                state
            }
            Err(Error::Transport(e)) => {
                warn!(error = %e, "playback state unreachable");
                // Only the transition into an outage is shown.
                if !self.connection_lost.swap(true, Ordering::SeqCst) {
                    self.session.display().show_connection_lost();
                }
                return TickOutcome::ConnectionLost;
            }
            Err(e) => {
                warn!(error = %e, "playback state request failed");
                return TickOutcome::Failed;
            }
        };

        let song = match state {
            PlaybackStateResult::Active { song, .. } => song,
            PlaybackStateResult::NoActivePlayer => return TickOutcome::NoActivePlayer,
            PlaybackStateResult::NothingPlaying => return TickOutcome::NothingPlaying,
            PlaybackStateResult::DecodeFailed(e) => {
                error!(shape = e.shape, reason = %e.reason, payload = %e.payload, "undecodable playback state");
                return TickOutcome::DecodeFailed;
            }
        };

        let track_changed = current.as_ref().is_none_or(|previous| previous.id != song.id);
        let art = if track_changed {
            self.fetch_art(&song).await
        } else {
            current.as_ref().and_then(|previous| previous.album_art.clone())
        };
        let song = song.with_album_art(art);

        let paused = song.is_paused();
        self.session.set_player_state(if paused {
            PlayerState::Paused
        } else {
            PlayerState::Playing
        });

        if track_changed {
            debug!(id = %song.id, name = %song.name, "track changed");
        }
        *current = Some(song.clone());
        self.session.display().show_song(song, paused);

        TickOutcome::Updated { track_changed }
    }

    async fn fetch_art(&self, song: &Song) -> Option<AlbumArt> {
        let url = song.album_art_url.as_deref()?;
        match self.session.client().load_album_art(url).await {
            Ok(art) => Some(art),
            Err(e) => {
                warn!(error = %e, url, "album art unavailable");
                None
            }
        }
    }

    /// Ticks forever with a fixed delay between passes.
    pub async fn run(self) {
        loop {
            let outcome = self.tick().await;
            debug!(?outcome, "reconciler tick");
            tokio::time::sleep(self.interval).await;
        }
    }

    /// Runs the loop on its own task for the lifetime of the session.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
