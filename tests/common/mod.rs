#![allow(dead_code)]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread,
    time::Duration as StdDuration,
};

use chrono::{Duration, Utc};
use serde_json::{Value, json};
use spotlet::{
    config::Config,
    display::Display,
    error::PlaybackError,
    management::PlaybackSession,
    preview::backend::{AudioBackend, AudioChunk, DecodeSource, OutputSink, PreviewHandles},
    spotify::{SpotifyClient, auth::CredentialStore},
    types::{Credential, Flow, Song},
};
use wiremock::MockServer;

pub const DEVICE_NAME: &str = "test-host";
pub const DEVICE_ID: &str = "device-local";

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    Song { id: String, paused: bool },
    Progress(f64, f64),
    NoActiveDevices,
    ConnectionLost,
    AuthorizationLost,
}

#[derive(Default)]
pub struct RecordingDisplay {
    events: Mutex<Vec<DisplayEvent>>,
}

impl RecordingDisplay {
    pub fn events(&self) -> Vec<DisplayEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn songs(&self) -> Vec<DisplayEvent> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e, DisplayEvent::Song { .. }))
            .collect()
    }
}

impl Display for RecordingDisplay {
    fn show_song(&self, song: Song, is_paused: bool) {
        self.events.lock().unwrap().push(DisplayEvent::Song {
            id: song.id,
            paused: is_paused,
        });
    }

    fn update_progress(&self, current: f64, total: f64) {
        self.events
            .lock()
            .unwrap()
            .push(DisplayEvent::Progress(current, total));
    }

    fn show_no_active_devices(&self) {
        self.events.lock().unwrap().push(DisplayEvent::NoActiveDevices);
    }

    fn show_connection_lost(&self) {
        self.events.lock().unwrap().push(DisplayEvent::ConnectionLost);
    }

    fn show_authorization_lost(&self) {
        self.events
            .lock()
            .unwrap()
            .push(DisplayEvent::AuthorizationLost);
    }
}

pub fn config_for(base_url: &str) -> Config {
    let mut config = Config::new("test-client");
    config.api_url = format!("{base_url}/v1");
    config.token_url = format!("{base_url}/api/token");
    config.auth_url = format!("{base_url}/authorize");
    config.device_name = Some(DEVICE_NAME.to_string());
    config
}

pub fn pkce_credential(access_token: &str) -> Credential {
    Credential {
        access_token: access_token.to_string(),
        refresh_token: Some("refresh-token".to_string()),
        scope: None,
        expires_in: Duration::seconds(3600),
        obtained_at: Utc::now(),
        flow: Flow::AuthorizationCodePkce,
    }
}

pub fn store_for(base_url: &str, credential: Option<Credential>) -> Arc<CredentialStore> {
    let http = reqwest::Client::new();
    let config = config_for(base_url);
    Arc::new(match credential {
        Some(credential) => CredentialStore::with_credential(http, config, credential),
        None => CredentialStore::new(http, config),
    })
}

pub fn client_for(server: &MockServer) -> SpotifyClient {
    client_with(&server.uri(), Some(pkce_credential("access-token")))
}

pub fn client_with(base_url: &str, credential: Option<Credential>) -> SpotifyClient {
    let store = store_for(base_url, credential);
    SpotifyClient::new(reqwest::Client::new(), format!("{base_url}/v1"), store)
}

pub fn session_for(client: SpotifyClient, display: Arc<RecordingDisplay>) -> Arc<PlaybackSession> {
    Arc::new(PlaybackSession::new(client, display, DEVICE_NAME))
}

pub fn track_json(id: &str, name: &str, image_url: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "duration_ms": 250_000,
        "track_number": 3,
        "preview_url": null,
        "artists": [
            { "name": "Lupe Fiasco" },
            { "name": "Guy Sebastian" },
            { "name": "Lupe Fiasco" }
        ],
        "album": {
            "name": "Food & Liquor II",
            "uri": "spotify:album:album-1",
            "images": [
                { "url": image_url, "height": 640, "width": 640 },
                { "url": "https://i.scdn.co/image/small", "height": 64, "width": 64 }
            ]
        }
    })
}

pub fn search_json(track: Value) -> Value {
    json!({
        "tracks": {
            "href": "https://api.spotify.com/v1/search?query=battle+scars",
            "items": [track],
            "limit": 1,
            "total": 1
        }
    })
}

pub fn playback_state_json(track: Value, is_playing: bool) -> Value {
    json!({
        "device": {
            "id": "device-remote",
            "name": "Kitchen",
            "is_active": true,
            "is_private_session": false,
            "volume_percent": 60
        },
        "progress_ms": 42_000,
        "is_playing": is_playing,
        "timestamp": 1_700_000_000_000i64,
        "context": { "uri": "spotify:playlist:mix" },
        "item": track
    })
}

pub fn devices_json(names: &[(&str, &str)]) -> Value {
    let devices: Vec<Value> = names
        .iter()
        .map(|(id, name)| {
            json!({
                "id": id,
                "name": name,
                "is_active": false,
                "is_private_session": false,
                "volume_percent": 50
            })
        })
        .collect();
    json!({ "devices": devices })
}

pub fn no_active_device_json() -> Value {
    json!({
        "error": {
            "status": 404,
            "message": "Player command failed: No active device found",
            "reason": "NO_ACTIVE_DEVICE"
        }
    })
}

pub fn song(id: &str) -> Song {
    Song {
        id: id.to_string(),
        name: format!("Song {id}"),
        artists: vec!["Artist".to_string()],
        album_name: "Album".to_string(),
        album_uri: Some("spotify:album:album-1".to_string()),
        track_number: 3,
        progress_ms: 1_500,
        context_uri: Some("spotify:playlist:mix".to_string()),
        ..Song::default()
    }
}

/// Counters shared between a [`FakeBackend`] and the handles it opens.
#[derive(Default)]
pub struct BackendStats {
    pub opens: AtomicUsize,
    pub releases: AtomicUsize,
    pub writes: AtomicUsize,
}

impl BackendStats {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

/// Audio backend producing `chunks` silent chunks, each taking `delay` to
/// "play".
pub struct FakeBackend {
    pub stats: Arc<BackendStats>,
    chunks: usize,
    delay: StdDuration,
    fail: AtomicBool,
    on_end: Mutex<Option<Arc<dyn Fn() + Send + Sync>>>,
}

impl FakeBackend {
    pub fn new(chunks: usize, delay: StdDuration) -> Arc<Self> {
        Arc::new(Self {
            stats: Arc::new(BackendStats::default()),
            chunks,
            delay,
            fail: AtomicBool::new(false),
            on_end: Mutex::new(None),
        })
    }

    /// Backend whose clips finish almost immediately.
    pub fn quick() -> Arc<Self> {
        Self::new(3, StdDuration::from_millis(1))
    }

    /// Backend whose clips last long enough to be paused or stopped.
    pub fn slow() -> Arc<Self> {
        Self::new(1_000, StdDuration::from_millis(10))
    }

    pub fn fail_opens(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Runs `hook` on the streaming thread right before a source reports
    /// the end of the clip.
    pub fn on_end_of_stream(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.on_end.lock().unwrap() = Some(Arc::new(hook));
    }
}

impl AudioBackend for FakeBackend {
    fn open(&self, url: &str) -> Result<PreviewHandles, PlaybackError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PlaybackError::SourceUnavailable(url.to_string()));
        }
        self.stats.opens.fetch_add(1, Ordering::SeqCst);
        Ok(PreviewHandles {
            source: Box::new(FakeSource {
                remaining: self.chunks,
                delay: self.delay,
                on_end: self.on_end.lock().unwrap().clone(),
            }),
            output: Box::new(FakeOutput {
                stats: Arc::clone(&self.stats),
                closed: false,
            }),
        })
    }
}

struct FakeSource {
    remaining: usize,
    delay: StdDuration,
    on_end: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl DecodeSource for FakeSource {
    fn read_chunk(&mut self) -> Result<Option<AudioChunk>, PlaybackError> {
        if self.remaining == 0 {
            if let Some(hook) = &self.on_end {
                hook();
            }
            return Ok(None);
        }
        self.remaining -= 1;
        thread::sleep(self.delay);
        Ok(Some(AudioChunk {
            channels: 2,
            sample_rate: 44_100,
            samples: vec![0; 4],
        }))
    }
}

struct FakeOutput {
    stats: Arc<BackendStats>,
    closed: bool,
}

impl OutputSink for FakeOutput {
    fn write(&mut self, _chunk: AudioChunk) -> Result<(), PlaybackError> {
        self.stats.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn pause(&mut self) {}

    fn resume(&mut self) {}

    fn drain(&mut self) {}

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.stats.releases.fetch_add(1, Ordering::SeqCst);
        }
    }
}
