use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Flow {
    ClientCredentials,
    AuthorizationCodePkce,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub expires_in: Duration,
    pub obtained_at: DateTime<Utc>,
    pub flow: Flow,
}

impl Credential {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.obtained_at + self.expires_in
    }

    /// A token is due for refresh once 90% of its lifetime has passed.
    pub fn refresh_due(&self, now: DateTime<Utc>) -> bool {
        let margin = self.expires_in / 10;
        now >= self.expires_at() - margin
    }
}

/// Raw token endpoint response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

fn default_expires_in() -> i64 {
    3600
}

/// State kept between handing out the authorization URL and receiving the
/// redirect.
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    pub code_verifier: String,
    pub code_challenge: String,
}

/// What the consent window reported back from the redirect URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsentResponse {
    Code(String),
    Denied(String),
}

/// Decoded album cover. Cheap to clone and never mutated after loading.
#[derive(Clone, PartialEq, Eq)]
pub struct AlbumArt(Arc<[u8]>);

impl AlbumArt {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Arc::from(bytes.into()))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for AlbumArt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AlbumArt({} bytes)", self.0.len())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Song {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub album_name: String,
    pub album_art_url: Option<String>,
    pub album_uri: Option<String>,
    pub preview_url: Option<String>,
    pub duration_ms: u64,
    pub progress_ms: u64,
    pub is_playing: bool,
    pub track_number: u32,
    pub context_uri: Option<String>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub album_art: Option<AlbumArt>,
}

// Album art is loaded after decode and is not part of a song's identity.
impl PartialEq for Song {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.artists == other.artists
            && self.album_name == other.album_name
            && self.album_art_url == other.album_art_url
            && self.album_uri == other.album_uri
            && self.preview_url == other.preview_url
            && self.duration_ms == other.duration_ms
            && self.progress_ms == other.progress_ms
            && self.is_playing == other.is_playing
            && self.track_number == other.track_number
            && self.context_uri == other.context_uri
            && self.last_updated_at == other.last_updated_at
    }
}

impl Eq for Song {}

impl Song {
    pub fn is_paused(&self) -> bool {
        !self.is_playing
    }

    pub fn artists_label(&self) -> String {
        self.artists.join(", ")
    }

    pub fn with_album_art(mut self, art: Option<AlbumArt>) -> Self {
        self.album_art = art;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub is_active: bool,
    pub is_private_session: bool,
    pub volume_percent: Option<u32>,
}

#[derive(Tabled)]
pub struct DeviceTableRow {
    pub name: String,
    pub id: String,
    pub active: String,
    pub private: String,
}

impl From<&Device> for DeviceTableRow {
    fn from(device: &Device) -> Self {
        let flag = |b: bool| if b { "yes" } else { "no" }.to_string();
        Self {
            name: device.name.clone(),
            id: device.id.clone(),
            active: flag(device.is_active),
            private: flag(device.is_private_session),
        }
    }
}

/// The optimistic local view of the player, used for instant button feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Stopped,
    Playing,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerActionKind {
    Play,
    Pause,
    Next,
    Previous,
}

// Wire shapes of the Spotify Web API. Only the fields the engine reads.

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub tracks: Option<TrackPage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackPage {
    #[serde(default)]
    pub items: Vec<TrackObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackObject {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistObject>,
    #[serde(default)]
    pub album: Option<AlbumObject>,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub track_number: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistObject {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlbumObject {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub images: Vec<ImageObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageObject {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContextObject {
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackStateObject {
    #[serde(default)]
    pub device: Option<DeviceObject>,
    #[serde(default)]
    pub progress_ms: Option<u64>,
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub context: Option<ContextObject>,
    #[serde(default)]
    pub item: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceListResponse {
    #[serde(default)]
    pub devices: Vec<DeviceObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceObject {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_private_session: bool,
    #[serde(default)]
    pub volume_percent: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecentlyPlayedResponse {
    #[serde(default)]
    pub items: Vec<PlayHistoryObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayHistoryObject {
    pub track: TrackObject,
    #[serde(default)]
    pub context: Option<ContextObject>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferPlaybackRequest {
    pub device_ids: Vec<String>,
    pub play: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_uri: Option<String>,
    pub offset: PlayOffset,
    pub position_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayOffset {
    pub position: u32,
}
