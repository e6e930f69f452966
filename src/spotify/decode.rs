//! Explicit decoders, one per response shape.
//!
//! Each function turns a raw JSON body into typed records or a
//! [`DecodeError`] carrying the offending payload. Fields a shape does not
//! carry are left at their defaults: search results have no progress or
//! playing flag, the playback state fills everything.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    error::DecodeError,
    types::{
        ContextObject, Device, DeviceListResponse, DeviceObject, PlaybackStateObject,
        RecentlyPlayedResponse, SearchResponse, Song, TrackObject,
    },
    utils::dedup_preserving_order,
};

/// Result of decoding `GET /me/player`.
#[derive(Debug)]
pub enum PlaybackStateResult {
    Active { song: Song, device: Option<Device> },
    /// Empty body or `{}`: no player is running anywhere.
    NoActivePlayer,
    /// A player exists but reports no track (e.g. between items or an ad).
    NothingPlaying,
    DecodeFailed(DecodeError),
}

impl PlaybackStateResult {
    pub fn song(&self) -> Option<&Song> {
        match self {
            PlaybackStateResult::Active { song, .. } => Some(song),
            _ => None,
        }
    }
}

fn parse<T: DeserializeOwned>(shape: &'static str, body: &Value) -> Result<T, DecodeError> {
    serde_json::from_value(body.clone())
        .map_err(|e| DecodeError::new(shape, e.to_string(), body.to_string()))
}

fn is_empty_body(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn song_from_track(track: TrackObject) -> Song {
    let (album_name, album_uri, album_art_url) = match track.album {
        Some(album) => (
            album.name,
            album.uri,
            album.images.into_iter().next().map(|i| i.url),
        ),
        None => (String::new(), None, None),
    };

    Song {
        id: track.id.unwrap_or_default(),
        name: track.name,
        artists: dedup_preserving_order(track.artists.into_iter().map(|a| a.name).collect()),
        album_name,
        album_art_url,
        album_uri,
        preview_url: track.preview_url.filter(|url| !url.is_empty()),
        duration_ms: track.duration_ms,
        track_number: track.track_number,
        ..Song::default()
    }
}

fn context_uri(context: Option<ContextObject>) -> Option<String> {
    context.and_then(|c| c.uri)
}

fn device_from_object(device: DeviceObject) -> Device {
    Device {
        id: device.id.unwrap_or_default(),
        name: device.name,
        is_active: device.is_active,
        is_private_session: device.is_private_session,
        volume_percent: device.volume_percent,
    }
}

fn timestamp(ms: Option<i64>) -> Option<DateTime<Utc>> {
    ms.and_then(DateTime::from_timestamp_millis)
}

/// Decodes `GET /search?type=track`.
pub fn decode_search_response(body: &Value) -> Result<Vec<Song>, DecodeError> {
    let response: SearchResponse = parse("search", body)?;
    let page = response
        .tracks
        .ok_or_else(|| DecodeError::new("search", "missing `tracks`", body.to_string()))?;
    Ok(page.items.into_iter().map(song_from_track).collect())
}

/// Decodes `GET /me/player`.
pub fn decode_playback_state_response(body: &Value) -> PlaybackStateResult {
    if is_empty_body(body) {
        return PlaybackStateResult::NoActivePlayer;
    }

    let state: PlaybackStateObject = match parse("playback state", body) {
        Ok(state) => state,
        Err(e) => return PlaybackStateResult::DecodeFailed(e),
    };

    let item = match state.item {
        Some(Value::Null) | None => return PlaybackStateResult::NothingPlaying,
        Some(item) => item,
    };

    let track: TrackObject = match parse("playback state item", &item) {
        Ok(track) => track,
        Err(e) => return PlaybackStateResult::DecodeFailed(e),
    };

    let song = Song {
        progress_ms: state.progress_ms.unwrap_or_default(),
        is_playing: state.is_playing,
        context_uri: context_uri(state.context),
        last_updated_at: timestamp(state.timestamp),
        ..song_from_track(track)
    };

    PlaybackStateResult::Active {
        song,
        device: state.device.map(device_from_object),
    }
}

/// Decodes `GET /me/player/currently-playing`. Same shape as the playback
/// state without the device.
pub fn decode_currently_playing_response(body: &Value) -> PlaybackStateResult {
    match decode_playback_state_response(body) {
        PlaybackStateResult::Active { song, .. } => PlaybackStateResult::Active { song, device: None },
        other => other,
    }
}

/// Decodes `GET /me/player/recently-played`, most recent first.
pub fn decode_recently_played_response(body: &Value) -> Result<Vec<Song>, DecodeError> {
    let response: RecentlyPlayedResponse = parse("recently played", body)?;
    Ok(response
        .items
        .into_iter()
        .map(|entry| Song {
            context_uri: context_uri(entry.context),
            ..song_from_track(entry.track)
        })
        .collect())
}

/// Decodes `GET /me/player/devices`.
pub fn decode_device_list_response(body: &Value) -> Result<Vec<Device>, DecodeError> {
    let response: DeviceListResponse = parse("device list", body)?;
    Ok(response.devices.into_iter().map(device_from_object).collect())
}
