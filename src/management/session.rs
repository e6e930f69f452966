use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::{
    display::Display,
    error::AuthError,
    spotify::{SpotifyClient, auth::CredentialStore},
    types::{PlayerState, Song},
};

/// State shared by the reconciler and the controller for one session.
///
/// The canonical song sits behind the reconciliation lock. Every reconciler
/// tick and every user action holds it for their whole critical section, so
/// neither ever observes the other half-applied.
pub struct PlaybackSession {
    client: SpotifyClient,
    display: Arc<dyn Display>,
    device_name: String,
    current_song: Mutex<Option<Song>>,
    player_state: StdMutex<PlayerState>,
}

impl PlaybackSession {
    pub fn new(
        client: SpotifyClient,
        display: Arc<dyn Display>,
        device_name: impl Into<String>,
    ) -> Self {
        Self {
            client,
            display,
            device_name: device_name.into(),
            current_song: Mutex::new(None),
            player_state: StdMutex::new(PlayerState::Stopped),
        }
    }

    pub fn client(&self) -> &SpotifyClient {
        &self.client
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        self.client.credentials()
    }

    pub fn display(&self) -> &Arc<dyn Display> {
        &self.display
    }

    /// Name of the Spotify Connect device that is this machine.
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Acquires the reconciliation lock.
    pub async fn lock(&self) -> MutexGuard<'_, Option<Song>> {
        self.current_song.lock().await
    }

    /// A snapshot of the canonical song.
    pub async fn current_song(&self) -> Option<Song> {
        self.current_song.lock().await.clone()
    }

    pub fn player_state(&self) -> PlayerState {
        *self
            .player_state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_player_state(&self, state: PlayerState) {
        *self
            .player_state
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Refreshes the token when it is due. The stale token stays in use on
    /// failure. A rejected refresh token is reported once and not retried.
    /// Callers hold the reconciliation lock.
    pub(crate) async fn refresh_if_due(&self) {
        let credentials = self.credentials();
        if !credentials.needs_refresh().await {
            return;
        }
        match credentials.refresh().await {
            Ok(credential) => debug!(expires_at = %credential.expires_at(), "token refreshed"),
            Err(e @ AuthError::ServerRejected(_)) => {
                warn!(error = %e, "refresh token rejected, re-authorization required");
                self.display.show_authorization_lost();
            }
            Err(e) => warn!(error = %e, "token refresh failed, keeping the current token"),
        }
    }
}
