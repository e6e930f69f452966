//! User-facing player operations.
//!
//! With an account, commands go to Spotify's implicit active device first
//! and fall back once to this machine's device on `NO_ACTIVE_DEVICE`.
//! Without one, play and pause drive the local [`PreviewPlayer`].

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    error::{Error, Result},
    management::PlaybackSession,
    preview::PreviewPlayer,
    types::{Device, PlayerActionKind, PlayerState, Song},
    utils::find_device,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Done,
    /// Neither an active device nor this machine's device is available.
    NoActiveDevices,
    /// Nothing is loaded to act on.
    NothingPlaying,
    /// The search returned no tracks.
    NoResults,
}

enum Mode {
    Account,
    Preview(Arc<PreviewPlayer>),
}

pub struct PlayerController {
    session: Arc<PlaybackSession>,
    mode: Mode,
}

impl PlayerController {
    /// Controller for an authorized account.
    pub fn account(session: Arc<PlaybackSession>) -> Self {
        Self {
            session,
            mode: Mode::Account,
        }
    }

    /// Controller for no-account mode, playing previews locally.
    pub fn preview(session: Arc<PlaybackSession>, player: Arc<PreviewPlayer>) -> Self {
        let display = Arc::clone(session.display());
        player.set_update_callback(move |current, total| display.update_progress(current, total));

        let halted = Arc::clone(&session);
        player.add_halted_listener(move || halted.set_player_state(PlayerState::Paused));

        Self {
            session,
            mode: Mode::Preview(player),
        }
    }

    pub fn session(&self) -> &Arc<PlaybackSession> {
        &self.session
    }

    pub fn is_preview(&self) -> bool {
        matches!(self.mode, Mode::Preview(_))
    }

    /// Runs `kind` under the reconciliation lock.
    pub async fn player_action(&self, kind: PlayerActionKind) -> Result<ActionOutcome> {
        let current = self.session.lock().await;
        match &self.mode {
            Mode::Account => self.account_action(kind, current.as_ref()).await,
            Mode::Preview(player) => self.preview_action(player, kind, current.as_ref()).await,
        }
    }

    /// Searches `query`, loads the first hit and plays it.
    ///
    /// The search and the album art download happen before the lock is
    /// taken; replacing the song and starting playback happen under it so a
    /// tick cannot overwrite the choice with stale remote state.
    pub async fn search_and_play(&self, query: &str) -> Result<ActionOutcome> {
        let Some(song) = self.find_song(query).await? else {
            return Ok(ActionOutcome::NoResults);
        };
        info!(id = %song.id, name = %song.name, "playing search result");

        let mut current = self.session.lock().await;
        match &self.mode {
            Mode::Account => {
                *current = Some(song);
                self.account_action(PlayerActionKind::Play, current.as_ref())
                    .await
            }
            Mode::Preview(player) => {
                player.stop();
                *current = Some(song.clone());
                self.session.display().show_song(song, true);
                self.preview_action(player, PlayerActionKind::Play, current.as_ref())
                    .await
            }
        }
    }

    /// Searches `query` and queues the first hit, with the usual device
    /// fallback.
    pub async fn add_to_queue(&self, query: &str) -> Result<ActionOutcome> {
        if self.is_preview() {
            return Err(Error::UnsupportedInPreviewMode);
        }

        let songs = self.session.client().search(query, 1).await?;
        let Some(song) = songs.into_iter().next() else {
            return Ok(ActionOutcome::NoResults);
        };

        let _current = self.session.lock().await;
        self.session.refresh_if_due().await;
        let client = self.session.client();
        let this = self.this_device().await?;

        match client.add_to_queue(&song.id, None).await {
            Ok(()) => Ok(ActionOutcome::Done),
            Err(e) if e.is_no_active_device() => {
                let Some(device) = this else {
                    return Ok(self.no_active_devices());
                };
                debug!(device = %device.name, "queueing on this device");
                match client.add_to_queue(&song.id, Some(&device)).await {
                    Ok(()) => Ok(ActionOutcome::Done),
                    Err(e) if e.is_no_active_device() => Ok(self.no_active_devices()),
                    Err(e) => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Loads the first hit for `query` as the current song without playing
    /// it. Used to give no-account mode something to preview at startup.
    pub async fn load_preview_catalog(&self, query: &str) -> Result<Option<Song>> {
        let Some(song) = self.find_song(query).await? else {
            return Ok(None);
        };

        let mut current = self.session.lock().await;
        *current = Some(song.clone());
        self.session.set_player_state(PlayerState::Paused);
        self.session.display().show_song(song.clone(), true);
        Ok(Some(song))
    }

    async fn find_song(&self, query: &str) -> Result<Option<Song>> {
        let songs = self.session.client().search(query, 1).await?;
        let Some(song) = songs.into_iter().next() else {
            return Ok(None);
        };

        let art = match song.album_art_url.as_deref() {
            Some(url) => match self.session.client().load_album_art(url).await {
                Ok(art) => Some(art),
                Err(e) => {
                    warn!(error = %e, "album art unavailable");
                    None
                }
            },
            None => None,
        };
        Ok(Some(song.with_album_art(art)))
    }

    async fn this_device(&self) -> Result<Option<Device>> {
        let devices = self.session.client().devices().await?;
        Ok(find_device(&devices, self.session.device_name()).cloned())
    }

    fn no_active_devices(&self) -> ActionOutcome {
        self.session.display().show_no_active_devices();
        ActionOutcome::NoActiveDevices
    }

    fn mark(&self, kind: PlayerActionKind) {
        self.session.set_player_state(match kind {
            PlayerActionKind::Pause => PlayerState::Paused,
            _ => PlayerState::Playing,
        });
    }

    async fn account_action(&self, kind: PlayerActionKind, current: Option<&Song>) -> Result<ActionOutcome> {
        self.session.refresh_if_due().await;
        let this = self.this_device().await?;

        let Some(song) = current else {
            return self.cold_start(kind, this).await;
        };

        match self.dispatch(kind, song, None).await {
            Ok(()) => {}
            Err(e) if e.is_no_active_device() => {
                let Some(device) = this else {
                    return Ok(self.no_active_devices());
                };
                debug!(?kind, device = %device.name, "no active device, retrying on this device");

                if kind == PlayerActionKind::Play {
                    self.session
                        .client()
                        .transfer_playback(&device.id, true)
                        .await?;
                }
                match self.dispatch(kind, song, Some(&device)).await {
                    Ok(()) => {}
                    Err(e) if e.is_no_active_device() => return Ok(self.no_active_devices()),
                    Err(e) => return Err(e),
                }
            }
            Err(e) => return Err(e),
        }

        self.mark(kind);
        Ok(ActionOutcome::Done)
    }

    async fn cold_start(&self, kind: PlayerActionKind, this: Option<Device>) -> Result<ActionOutcome> {
        let client = self.session.client();
        match (kind, this) {
            (PlayerActionKind::Pause, _) => return Ok(ActionOutcome::NothingPlaying),
            (_, None) => return Ok(self.no_active_devices()),
            (PlayerActionKind::Play, Some(device)) => {
                client.transfer_playback(&device.id, true).await?
            }
            (PlayerActionKind::Next, Some(device)) => client.next_from(Some(&device)).await?,
            (PlayerActionKind::Previous, Some(device)) => {
                client.previous_from(Some(&device)).await?
            }
        }

        self.mark(kind);
        Ok(ActionOutcome::Done)
    }

    async fn dispatch(&self, kind: PlayerActionKind, song: &Song, device: Option<&Device>) -> Result<()> {
        let client = self.session.client();
        match kind {
            PlayerActionKind::Play => client.play(song, device).await,
            PlayerActionKind::Pause => client.pause_from(device).await,
            PlayerActionKind::Next => client.next_from(device).await,
            PlayerActionKind::Previous => client.previous_from(device).await,
        }
    }

    async fn preview_action(
        &self,
        player: &PreviewPlayer,
        kind: PlayerActionKind,
        current: Option<&Song>,
    ) -> Result<ActionOutcome> {
        match kind {
            PlayerActionKind::Play => {
                let song = current.ok_or(Error::NoSongLoaded)?;
                let url = song.preview_url.as_deref().ok_or(Error::NoPreviewAvailable)?;
                player.play(url).await?;
                self.session.set_player_state(PlayerState::Playing);
                Ok(ActionOutcome::Done)
            }
            PlayerActionKind::Pause => {
                if current.is_none() {
                    return Ok(ActionOutcome::NothingPlaying);
                }
                player.pause();
                self.session.set_player_state(PlayerState::Paused);
                Ok(ActionOutcome::Done)
            }
            PlayerActionKind::Next | PlayerActionKind::Previous => {
                Err(Error::UnsupportedInPreviewMode)
            }
        }
    }
}
