mod common;

use serde_json::json;
use spotlet::{
    spotify::decode::*,
    types::{AlbumArt, Song},
};

use common::{playback_state_json, search_json, track_json};

#[test]
fn test_search_battle_scars_without_preview() {
    let body = search_json(track_json(
        "3f9zqUnrnIq0LANhmnaF0V",
        "Battle Scars",
        "https://i.scdn.co/image/large",
    ));

    let songs = decode_search_response(&body).unwrap();
    assert_eq!(songs.len(), 1);

    let song = &songs[0];
    assert_eq!(song.name, "Battle Scars");
    assert_eq!(song.id, "3f9zqUnrnIq0LANhmnaF0V");
    assert_eq!(song.preview_url, None);
    assert_eq!(song.artists, vec!["Lupe Fiasco", "Guy Sebastian"]);
    assert_eq!(song.album_art_url.as_deref(), Some("https://i.scdn.co/image/large"));
    assert_eq!(song.album_uri.as_deref(), Some("spotify:album:album-1"));
    assert_eq!(song.track_number, 3);

    // Search results carry no playback fields.
    assert_eq!(song.progress_ms, 0);
    assert!(!song.is_playing);
    assert_eq!(song.context_uri, None);
}

#[test]
fn test_search_empty_preview_url_is_absent() {
    let mut track = track_json("id", "name", "https://i.scdn.co/image/x");
    track["preview_url"] = json!("");
    let songs = decode_search_response(&search_json(track)).unwrap();
    assert_eq!(songs[0].preview_url, None);
}

#[test]
fn test_search_without_tracks_is_a_decode_error() {
    let body = json!({ "artists": { "items": [] } });
    let err = decode_search_response(&body).unwrap_err();
    assert_eq!(err.shape, "search");
    assert!(err.payload.contains("artists"));
}

#[test]
fn test_playback_state_paused_flag_is_negated_is_playing() {
    for is_playing in [true, false] {
        let body = playback_state_json(track_json("t1", "Track", "https://img/1"), is_playing);

        let PlaybackStateResult::Active { song, device } = decode_playback_state_response(&body)
        else {
            panic!("expected an active player");
        };

        assert_eq!(song.is_paused(), !is_playing);
        assert_eq!(song.progress_ms, 42_000);
        assert_eq!(song.context_uri.as_deref(), Some("spotify:playlist:mix"));
        assert!(song.last_updated_at.is_some());

        let device = device.unwrap();
        assert_eq!(device.name, "Kitchen");
        assert!(device.is_active);
    }
}

#[test]
fn test_playback_state_empty_body_is_no_active_player() {
    assert!(matches!(
        decode_playback_state_response(&json!({})),
        PlaybackStateResult::NoActivePlayer
    ));
    assert!(matches!(
        decode_playback_state_response(&serde_json::Value::Null),
        PlaybackStateResult::NoActivePlayer
    ));
}

#[test]
fn test_playback_state_without_item_is_nothing_playing() {
    let body = json!({ "is_playing": false, "progress_ms": null, "item": null });
    assert!(matches!(
        decode_playback_state_response(&body),
        PlaybackStateResult::NothingPlaying
    ));

    let body = json!({ "is_playing": true, "currently_playing_type": "ad" });
    assert!(matches!(
        decode_playback_state_response(&body),
        PlaybackStateResult::NothingPlaying
    ));
}

#[test]
fn test_playback_state_malformed_item_keeps_payload() {
    let body = json!({ "is_playing": true, "item": { "name": 42 } });
    let PlaybackStateResult::DecodeFailed(err) = decode_playback_state_response(&body) else {
        panic!("expected a decode failure");
    };
    assert!(err.payload.contains("42"));
}

#[test]
fn test_currently_playing_drops_device() {
    let body = playback_state_json(track_json("t1", "Track", "https://img/1"), true);
    match decode_currently_playing_response(&body) {
        PlaybackStateResult::Active { song, device } => {
            assert_eq!(song.id, "t1");
            assert!(device.is_none());
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_device_list() {
    let body = json!({
        "devices": [
            { "id": "a", "name": "laptop", "is_active": true, "is_private_session": false },
            { "id": null, "name": "restricted", "is_active": false, "is_private_session": true }
        ]
    });

    let devices = decode_device_list_response(&body).unwrap();
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].id, "a");
    assert!(devices[0].is_active);
    assert_eq!(devices[1].id, "");
    assert!(devices[1].is_private_session);
}

#[test]
fn test_recently_played() {
    let body = json!({
        "items": [
            {
                "track": track_json("t2", "Second", "https://img/2"),
                "played_at": "2024-01-01T00:00:00Z",
                "context": { "uri": "spotify:album:album-1" }
            },
            {
                "track": track_json("t1", "First", "https://img/1"),
                "played_at": "2023-12-31T00:00:00Z",
                "context": null
            }
        ]
    });

    let songs = decode_recently_played_response(&body).unwrap();
    assert_eq!(
        songs.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(),
        vec!["t2", "t1"]
    );
    assert_eq!(songs[0].context_uri.as_deref(), Some("spotify:album:album-1"));
    assert_eq!(songs[1].context_uri, None);
}

#[test]
fn test_song_equality_ignores_album_art() {
    let song = Song {
        id: "t1".to_string(),
        name: "Track".to_string(),
        ..Song::default()
    };
    let with_art = song.clone().with_album_art(Some(AlbumArt::new(vec![1, 2, 3])));

    assert_eq!(song, with_art);
    assert_ne!(
        song,
        Song {
            progress_ms: 1,
            ..song.clone()
        }
    );
}
