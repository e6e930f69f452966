mod common;

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use spotlet::{
    error::PlaybackError,
    preview::{PREVIEW_DURATION_SECS, PreviewPlayer, PreviewState},
};

use common::FakeBackend;

const CLIP: &str = "https://p.scdn.co/mp3-preview/clip";
const OTHER: &str = "https://p.scdn.co/mp3-preview/other";

fn player(backend: &Arc<FakeBackend>) -> PreviewPlayer {
    PreviewPlayer::new(backend.clone())
}

fn count_halts(player: &PreviewPlayer) -> Arc<AtomicUsize> {
    let halts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&halts);
    player.add_halted_listener(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    halts
}

#[tokio::test]
async fn test_play_same_url_twice_opens_once() {
    let backend = FakeBackend::slow();
    let player = player(&backend);

    assert!(player.play(CLIP).await.unwrap());
    assert!(!player.play(CLIP).await.unwrap());
    assert_eq!(backend.stats.opens(), 1);
    assert_eq!(player.state(), PreviewState::Playing);
    assert_eq!(player.url().as_deref(), Some(CLIP));

    player.stop();
    player.wait_idle().await;
    assert_eq!(player.state(), PreviewState::Stopped);
    assert_eq!(backend.stats.releases(), 1);
}

#[tokio::test]
async fn test_clip_finishes_and_replays() {
    let backend = FakeBackend::quick();
    let player = player(&backend);
    let halts = count_halts(&player);

    assert!(player.play(CLIP).await.unwrap());
    player.wait_idle().await;

    assert_eq!(player.state(), PreviewState::Finished);
    assert_eq!(halts.load(Ordering::SeqCst), 1);
    assert_eq!(backend.stats.writes(), 3);
    assert_eq!(backend.stats.releases(), 1);

    assert!(player.play(CLIP).await.unwrap());
    player.wait_idle().await;
    assert_eq!(backend.stats.opens(), 2);
    assert_eq!(player.state(), PreviewState::Finished);
    assert_eq!(halts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_pause_and_resume_keep_the_source() {
    let backend = FakeBackend::slow();
    let player = player(&backend);
    let halts = count_halts(&player);

    player.play(CLIP).await.unwrap();
    tokio::time::sleep(Duration::from_millis(60)).await;
    player.pause();
    player.wait_idle().await;

    assert_eq!(player.state(), PreviewState::Paused);
    assert!(player.elapsed_seconds() > 0.0);
    assert_eq!(backend.stats.releases(), 0);
    assert_eq!(halts.load(Ordering::SeqCst), 1);

    let paused_at = player.elapsed_seconds();
    assert!(player.play(CLIP).await.unwrap());
    assert_eq!(player.state(), PreviewState::Playing);
    assert_eq!(backend.stats.opens(), 1);

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(player.elapsed_seconds() >= paused_at);

    player.stop();
    player.wait_idle().await;
    assert_eq!(player.state(), PreviewState::Stopped);
    assert_eq!(player.elapsed_seconds(), 0.0);
    assert_eq!(backend.stats.releases(), 1);
}

#[tokio::test]
async fn test_stop_while_paused_releases_handles() {
    let backend = FakeBackend::slow();
    let player = player(&backend);

    player.play(CLIP).await.unwrap();
    player.pause();
    player.wait_idle().await;
    player.stop();

    assert_eq!(player.state(), PreviewState::Stopped);
    assert_eq!(backend.stats.releases(), 1);

    // Starts over with a fresh source.
    assert!(player.play(CLIP).await.unwrap());
    assert_eq!(backend.stats.opens(), 2);
    player.close();
    player.wait_idle().await;
}

#[tokio::test]
async fn test_close_is_terminal_for_the_url() {
    let backend = FakeBackend::slow();
    let player = player(&backend);

    player.play(CLIP).await.unwrap();
    player.close();
    player.close();
    assert_eq!(player.state(), PreviewState::Stopped);

    assert!(matches!(
        player.play(CLIP).await,
        Err(PlaybackError::SessionClosed)
    ));

    assert!(player.play(OTHER).await.unwrap());
    assert_eq!(player.url().as_deref(), Some(OTHER));
    assert_eq!(backend.stats.opens(), 2);
    assert_eq!(backend.stats.releases(), 1);

    player.close();
    player.wait_idle().await;
    assert_eq!(backend.stats.releases(), 2);
}

#[tokio::test]
async fn test_close_without_session() {
    let backend = FakeBackend::quick();
    let player = player(&backend);

    player.close();
    assert_eq!(player.state(), PreviewState::Stopped);
    assert_eq!(backend.stats.opens(), 0);

    player.close();
    assert_eq!(player.state(), PreviewState::Stopped);

    assert!(player.play(CLIP).await.unwrap());
    player.wait_idle().await;
    assert_eq!(player.state(), PreviewState::Finished);
}

#[tokio::test]
async fn test_pause_on_the_last_chunk_still_finishes() {
    let backend = FakeBackend::quick();
    let player = Arc::new(player(&backend));
    let halts = count_halts(&player);

    let weak = Arc::downgrade(&player);
    backend.on_end_of_stream(move || {
        if let Some(player) = weak.upgrade() {
            player.pause();
        }
    });

    assert!(player.play(CLIP).await.unwrap());
    player.wait_idle().await;

    assert_eq!(player.state(), PreviewState::Finished);
    assert_eq!(backend.stats.writes(), 3);
    assert_eq!(backend.stats.releases(), 1);
    assert_eq!(halts.load(Ordering::SeqCst), 1);

    // Nothing is held for a resume, so the clip reopens from the start.
    assert!(player.play(CLIP).await.unwrap());
    player.wait_idle().await;
    assert_eq!(backend.stats.opens(), 2);
    assert_eq!(player.state(), PreviewState::Finished);
}

#[tokio::test]
async fn test_new_url_replaces_running_clip() {
    let backend = FakeBackend::slow();
    let player = player(&backend);

    player.play(CLIP).await.unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(player.play(OTHER).await.unwrap());

    assert_eq!(player.url().as_deref(), Some(OTHER));
    assert_eq!(player.state(), PreviewState::Playing);
    assert_eq!(backend.stats.opens(), 2);
    // The first clip's task was joined and its output released.
    assert_eq!(backend.stats.releases(), 1);

    player.stop();
    player.wait_idle().await;
    assert_eq!(backend.stats.releases(), 2);
}

#[tokio::test]
async fn test_open_failure_leaves_player_not_started() {
    let backend = FakeBackend::quick();
    backend.fail_opens();
    let player = player(&backend);

    let err = player.play(CLIP).await.unwrap_err();
    assert!(matches!(err, PlaybackError::SourceUnavailable(_)));
    assert_eq!(player.state(), PreviewState::NotStarted);
    assert_eq!(backend.stats.opens(), 0);
}

#[tokio::test]
async fn test_update_callback_reports_elapsed_against_clip_length() {
    let backend = FakeBackend::new(5, Duration::from_millis(5));
    let player = player(&backend);
    let updates = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&updates);
    player.set_update_callback(move |current, total| sink.lock().unwrap().push((current, total)));

    player.play(CLIP).await.unwrap();
    player.wait_idle().await;

    let updates = updates.lock().unwrap().clone();
    assert_eq!(updates.len(), 5);
    assert!(updates.iter().all(|(_, total)| *total == PREVIEW_DURATION_SECS));
    assert!(updates.windows(2).all(|w| w[0].0 <= w[1].0));
}
