//! Player endpoints under `/me/player`.
//!
//! Commands return `Err(Error::Application(ApplicationError::NoActiveDevice))`
//! when Spotify embeds `NO_ACTIVE_DEVICE` in the body, whatever the status.

use reqwest::Method;
use serde_json::json;

use crate::{
    error::{Error, Result},
    spotify::{
        ApiResponse, SpotifyClient, validate_limit,
        decode::{
            PlaybackStateResult, decode_currently_playing_response, decode_device_list_response,
            decode_playback_state_response, decode_recently_played_response,
        },
    },
    types::{Device, PlayOffset, PlayRequest, Song, TransferPlaybackRequest},
};

fn device_query(device: Option<&Device>) -> Vec<(&'static str, String)> {
    device
        .map(|d| vec![("device_id", d.id.clone())])
        .unwrap_or_default()
}

impl SpotifyClient {
    /// `GET /me/player`.
    ///
    /// Transport and auth failures are returned as `Err`; everything about
    /// the body itself is expressed by [`PlaybackStateResult`].
    pub async fn playback_state(&self) -> Result<PlaybackStateResult> {
        let res = self.request(Method::GET, "/me/player", &[], None).await?;
        if let Some(err) = non_success(&res) {
            return Err(err);
        }
        Ok(decode_playback_state_response(&res.body))
    }

    /// `GET /me/player/currently-playing`.
    pub async fn currently_playing(&self) -> Result<PlaybackStateResult> {
        let res = self
            .request(Method::GET, "/me/player/currently-playing", &[], None)
            .await?;
        if let Some(err) = non_success(&res) {
            return Err(err);
        }
        Ok(decode_currently_playing_response(&res.body))
    }

    /// `GET /me/player/recently-played`, most recent first.
    pub async fn recently_played(&self, limit: u32) -> Result<Vec<Song>> {
        validate_limit(limit)?;
        let res = self
            .request(
                Method::GET,
                "/me/player/recently-played",
                &[("limit", limit.to_string())],
                None,
            )
            .await?
            .into_result()?;
        Ok(decode_recently_played_response(&res.body)?)
    }

    /// `GET /me/player/devices`.
    pub async fn devices(&self) -> Result<Vec<Device>> {
        let res = self
            .request(Method::GET, "/me/player/devices", &[], None)
            .await?
            .into_result()?;
        Ok(decode_device_list_response(&res.body)?)
    }

    /// `PUT /me/player` moving playback to `device_id`.
    pub async fn transfer_playback(&self, device_id: &str, play: bool) -> Result<()> {
        let body = TransferPlaybackRequest {
            device_ids: vec![device_id.to_string()],
            play,
        };
        self.request(Method::PUT, "/me/player", &[], Some(json!(body)))
            .await?
            .into_result()?;
        Ok(())
    }

    /// `PUT /me/player/play` starting `song` at its recorded progress.
    ///
    /// The song is addressed through its context (or its album) and its
    /// position in that context.
    pub async fn play(&self, song: &Song, device: Option<&Device>) -> Result<()> {
        let body = PlayRequest {
            context_uri: song.context_uri.clone().or_else(|| song.album_uri.clone()),
            offset: PlayOffset {
                position: song.track_number.saturating_sub(1),
            },
            position_ms: song.progress_ms,
        };
        self.request(
            Method::PUT,
            "/me/player/play",
            &device_query(device),
            Some(json!(body)),
        )
        .await?
        .into_result()?;
        Ok(())
    }

    pub async fn pause_from(&self, device: Option<&Device>) -> Result<()> {
        self.command(Method::PUT, "/me/player/pause", device).await
    }

    pub async fn next_from(&self, device: Option<&Device>) -> Result<()> {
        self.command(Method::POST, "/me/player/next", device).await
    }

    pub async fn previous_from(&self, device: Option<&Device>) -> Result<()> {
        self.command(Method::POST, "/me/player/previous", device).await
    }

    /// `POST /me/player/queue` for a bare track id.
    pub async fn add_to_queue(&self, track_id: &str, device: Option<&Device>) -> Result<()> {
        let mut query = vec![("uri", format!("spotify:track:{track_id}"))];
        query.extend(device_query(device));
        self.request(Method::POST, "/me/player/queue", &query, None)
            .await?
            .into_result()?;
        Ok(())
    }

    async fn command(&self, method: Method, path: &str, device: Option<&Device>) -> Result<()> {
        self.request(method, path, &device_query(device), None)
            .await?
            .into_result()?;
        Ok(())
    }
}

// The playback state decoder owns body interpretation for 2xx responses;
// only genuine failures are turned into errors here.
fn non_success(res: &ApiResponse) -> Option<Error> {
    if res.is_success() {
        return None;
    }
    res.application_error().map(Error::from)
}
