//! # Preview Player
//!
//! Streams 30 second preview clips when no Spotify account is connected.
//!
//! ## State machine
//!
//! ```text
//! NotStarted ──play──► Playing ◄──play/pause──► Paused
//!                         │
//!                    end of stream
//!                         ▼
//!                      Finished
//!
//! {Playing, Paused, Finished} ──stop/close──► Stopped
//! ```
//!
//! A single session is open at a time. Playing a different URL stops and
//! joins the previous streaming task and releases its handles before the
//! new ones are opened. `Finished` and `Stopped` sessions replay from the
//! start, except after [`PreviewPlayer::close`], which is terminal for the
//! URL that was open.
//!
//! ## Streaming task
//!
//! Each `play` that starts audio spawns exactly one blocking task. It reads
//! [`CHUNK_SAMPLES`](backend::CHUNK_SAMPLES) at a time from the decode
//! source, writes them to the output sink and reports the elapsed time to
//! the update callback. When the state leaves `Playing` the task records
//! the pause offset and gives the handles back so the clip can resume where
//! it stopped. Every exit of the task notifies the halted listeners.

pub mod backend;

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Instant,
};

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::PlaybackError;
use backend::{AudioBackend, PreviewHandles};

/// Previews are always cut at 30 seconds; the stream does not reliably
/// report its own duration.
pub const PREVIEW_DURATION_SECS: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    NotStarted,
    Playing,
    Paused,
    Stopped,
    Finished,
}

pub type UpdateCallback = Arc<dyn Fn(f64, f64) + Send + Sync>;
pub type HaltedListener = Arc<dyn Fn() + Send + Sync>;

struct Session {
    url: String,
    state: PreviewState,
    elapsed: f64,
    paused_at: f64,
    /// Present only while no streaming task owns them.
    handles: Option<PreviewHandles>,
    closed: bool,
    generation: u64,
}

impl Session {
    fn new(url: &str, generation: u64) -> Self {
        Self {
            url: url.to_string(),
            state: PreviewState::NotStarted,
            elapsed: 0.0,
            paused_at: 0.0,
            handles: None,
            closed: false,
            generation,
        }
    }

    fn release_handles(&mut self) {
        if let Some(handles) = self.handles.take() {
            handles.release();
        }
    }
}

#[derive(Default)]
struct Shared {
    session: Option<Session>,
    generation: u64,
    on_update: Option<UpdateCallback>,
    halted: Vec<HaltedListener>,
}

impl Shared {
    fn current(&mut self, generation: u64) -> Option<&mut Session> {
        self.session
            .as_mut()
            .filter(|s| s.generation == generation)
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct PreviewPlayer {
    backend: Arc<dyn AudioBackend>,
    shared: Arc<Mutex<Shared>>,
    task: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl PreviewPlayer {
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        Self {
            backend,
            shared: Arc::new(Mutex::new(Shared::default())),
            task: tokio::sync::Mutex::new(None),
        }
    }

    pub fn state(&self) -> PreviewState {
        lock(&self.shared)
            .session
            .as_ref()
            .map(|s| s.state)
            .unwrap_or(PreviewState::NotStarted)
    }

    pub fn elapsed_seconds(&self) -> f64 {
        lock(&self.shared)
            .session
            .as_ref()
            .map(|s| s.elapsed)
            .unwrap_or(0.0)
    }

    pub fn url(&self) -> Option<String> {
        lock(&self.shared).session.as_ref().map(|s| s.url.clone())
    }

    /// Called with `(elapsed, total)` seconds after every chunk.
    pub fn set_update_callback(&self, callback: impl Fn(f64, f64) + Send + Sync + 'static) {
        lock(&self.shared).on_update = Some(Arc::new(callback));
    }

    /// Called whenever playback halts: paused, stopped or finished.
    pub fn add_halted_listener(&self, listener: impl Fn() + Send + Sync + 'static) {
        lock(&self.shared).halted.push(Arc::new(listener));
    }

    /// Starts or resumes `url`.
    ///
    /// Returns `Ok(true)` when a streaming task was spawned and `Ok(false)`
    /// when the clip was already playing or got stopped while opening.
    pub async fn play(&self, url: &str) -> Result<bool, PlaybackError> {
        let mut task = self.task.lock().await;

        {
            let mut shared = lock(&self.shared);
            if let Some(session) = shared.session.as_mut() {
                if session.url == url {
                    if session.closed {
                        return Err(PlaybackError::SessionClosed);
                    }
                    if session.state == PreviewState::Playing {
                        return Ok(false);
                    }
                } else if matches!(session.state, PreviewState::Playing | PreviewState::Paused) {
                    session.state = PreviewState::Stopped;
                }
            }
        }

        // Any task still around is on its way out now.
        if let Some(previous) = task.take() {
            join(previous).await;
        }

        let (generation, offset, resumed) = {
            let mut shared = lock(&self.shared);
            let resumable = shared.session.as_mut().and_then(|s| {
                if s.url == url && s.state == PreviewState::Paused {
                    s.handles.take().map(|h| (s.generation, s.paused_at, h))
                } else {
                    None
                }
            });

            match resumable {
                Some((generation, offset, handles)) => {
                    if let Some(session) = shared.session.as_mut() {
                        session.state = PreviewState::Playing;
                    }
                    (generation, offset, Some(handles))
                }
                None => {
                    if let Some(mut old) = shared.session.take() {
                        old.release_handles();
                    }
                    shared.generation += 1;
                    let generation = shared.generation;
                    let mut session = Session::new(url, generation);
                    session.state = PreviewState::Playing;
                    shared.session = Some(session);
                    (generation, 0.0, None)
                }
            }
        };

        let mut handles = match resumed {
            Some(handles) => handles,
            None => match self.open(url).await {
                Ok(handles) => handles,
                Err(e) => {
                    if let Some(session) = lock(&self.shared).current(generation) {
                        session.state = PreviewState::NotStarted;
                    }
                    return Err(e);
                }
            },
        };

        // A stop or close may have landed while the source was opening.
        let status = lock(&self.shared)
            .current(generation)
            .map(|s| (s.state, s.closed));
        match status {
            Some((PreviewState::Playing, _)) => {}
            Some((_, closed)) => {
                handles.release();
                return if closed {
                    Err(PlaybackError::SessionClosed)
                } else {
                    Ok(false)
                };
            }
            None => {
                handles.release();
                return Ok(false);
            }
        }

        handles.output.resume();
        let shared = Arc::clone(&self.shared);
        *task = Some(tokio::task::spawn_blocking(move || {
            stream(shared, handles, generation, offset)
        }));
        debug!(url, generation, offset, "preview streaming started");
        Ok(true)
    }

    async fn open(&self, url: &str) -> Result<PreviewHandles, PlaybackError> {
        let backend = Arc::clone(&self.backend);
        let url = url.to_string();
        tokio::task::spawn_blocking(move || backend.open(&url))
            .await
            .map_err(|e| PlaybackError::Task(e.to_string()))?
    }

    /// Pauses a playing clip. The streaming task keeps the position.
    pub fn pause(&self) {
        let mut shared = lock(&self.shared);
        if let Some(session) = shared.session.as_mut() {
            if session.state == PreviewState::Playing {
                session.state = PreviewState::Paused;
            }
        }
    }

    /// Stops the clip; the next `play` of the same URL starts over.
    pub fn stop(&self) {
        let mut shared = lock(&self.shared);
        if let Some(session) = shared.session.as_mut() {
            if matches!(
                session.state,
                PreviewState::Playing | PreviewState::Paused | PreviewState::Finished
            ) {
                session.state = PreviewState::Stopped;
                session.elapsed = 0.0;
                session.paused_at = 0.0;
                session.release_handles();
            }
        }
    }

    /// Closes the session for good. Safe from any state and idempotent; the
    /// state is `Stopped` afterwards even if nothing was ever played.
    pub fn close(&self) {
        let mut shared = lock(&self.shared);
        let generation = shared.generation;
        let session = shared
            .session
            .get_or_insert_with(|| Session::new("", generation));
        session.closed = true;
        session.state = PreviewState::Stopped;
        session.release_handles();
    }

    /// Waits for the streaming task, if any, to exit.
    pub async fn wait_idle(&self) {
        let handle = self.task.lock().await.take();
        if let Some(handle) = handle {
            join(handle).await;
        }
    }
}

impl Drop for PreviewPlayer {
    fn drop(&mut self) {
        self.close();
    }
}

async fn join(handle: JoinHandle<()>) {
    if let Err(e) = handle.await {
        warn!(error = %e, "preview streaming task failed");
    }
}

enum Exit {
    Paused,
    Stopped,
    Finished,
    Superseded,
}

fn stream(shared: Arc<Mutex<Shared>>, mut handles: PreviewHandles, generation: u64, offset: f64) {
    let start = Instant::now();
    let elapsed = || (offset + start.elapsed().as_secs_f64()).min(PREVIEW_DURATION_SECS);

    let exit = loop {
        {
            let mut guard = lock(&shared);
            let Some(session) = guard.current(generation) else {
                break Exit::Superseded;
            };
            match session.state {
                PreviewState::Playing => {}
                PreviewState::Paused => {
                    session.paused_at = elapsed();
                    session.elapsed = session.paused_at;
                    break Exit::Paused;
                }
                _ => break Exit::Stopped,
            }
        }

        let chunk = match handles.source.read_chunk() {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break Exit::Finished,
            Err(e) => {
                warn!(error = %e, "preview decode failed");
                break Exit::Stopped;
            }
        };

        if let Err(e) = handles.output.write(chunk) {
            warn!(error = %e, "preview output failed");
            break Exit::Stopped;
        }

        let now = elapsed();
        let callback = {
            let mut guard = lock(&shared);
            match guard.current(generation) {
                Some(session) => {
                    session.elapsed = now;
                    guard.on_update.clone()
                }
                None => None,
            }
        };
        if let Some(callback) = callback {
            callback(now, PREVIEW_DURATION_SECS);
        }
    };

    match exit {
        Exit::Paused => {
            handles.output.pause();
            let leftover = {
                let mut guard = lock(&shared);
                match guard.current(generation) {
                    // Still paused: keep the handles for resume.
                    Some(session) if session.state == PreviewState::Paused => {
                        session.handles = Some(handles);
                        None
                    }
                    _ => Some(handles),
                }
            };
            if let Some(handles) = leftover {
                handles.release();
            }
        }
        Exit::Finished => {
            handles.output.drain();
            handles.release();
            if let Some(session) = lock(&shared).current(generation) {
                // A pause that lands on the last chunk still ends the clip.
                if matches!(session.state, PreviewState::Playing | PreviewState::Paused) {
                    session.state = PreviewState::Finished;
                    session.paused_at = 0.0;
                }
            }
        }
        Exit::Stopped => {
            handles.release();
            if let Some(session) = lock(&shared).current(generation) {
                session.state = PreviewState::Stopped;
                session.elapsed = 0.0;
                session.paused_at = 0.0;
            }
        }
        Exit::Superseded => {
            handles.release();
            return;
        }
    }

    let listeners = lock(&shared).halted.clone();
    for listener in listeners {
        listener();
    }
}
