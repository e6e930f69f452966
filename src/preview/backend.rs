//! Audio seam of the preview player.
//!
//! [`AudioBackend::open`] turns a preview URL into a pair of handles: a
//! [`DecodeSource`] yielding interleaved PCM chunks and an [`OutputSink`]
//! consuming them. The streaming task owns both while it runs.

use std::{
    io::Cursor,
    sync::mpsc,
    thread,
    time::Duration,
};

use rodio::{Decoder, OutputStream, Sink, Source, buffer::SamplesBuffer};
use tracing::debug;

use crate::error::PlaybackError;

/// Samples read from the decoder per streaming step.
pub const CHUNK_SAMPLES: usize = 4096;

/// Chunks the rodio sink may hold before the writer waits.
const MAX_QUEUED_CHUNKS: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    pub channels: u16,
    pub sample_rate: u32,
    pub samples: Vec<i16>,
}

pub trait DecodeSource: Send {
    /// Next chunk of at most [`CHUNK_SAMPLES`] samples, `None` at end of stream.
    fn read_chunk(&mut self) -> Result<Option<AudioChunk>, PlaybackError>;
}

pub trait OutputSink: Send {
    fn write(&mut self, chunk: AudioChunk) -> Result<(), PlaybackError>;
    fn pause(&mut self);
    fn resume(&mut self);
    /// Blocks until everything written so far has been played.
    fn drain(&mut self);
    /// Stops output and releases the device. Must tolerate repeated calls.
    fn close(&mut self);
}

pub struct PreviewHandles {
    pub source: Box<dyn DecodeSource>,
    pub output: Box<dyn OutputSink>,
}

impl PreviewHandles {
    pub fn release(mut self) {
        self.output.close();
    }
}

pub trait AudioBackend: Send + Sync {
    /// Opens the decode and output handles for `url`. Blocking.
    fn open(&self, url: &str) -> Result<PreviewHandles, PlaybackError>;
}

/// Downloads the clip, decodes it with rodio and plays it on the default
/// output device.
pub struct RodioBackend {
    timeout: Duration,
}

impl RodioBackend {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(15),
        }
    }
}

impl Default for RodioBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for RodioBackend {
    fn open(&self, url: &str) -> Result<PreviewHandles, PlaybackError> {
        // The blocking client must live and die outside the async runtime.
        let http = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| PlaybackError::SourceUnavailable(e.to_string()))?;

        let bytes = http
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.bytes())
            .map_err(|e| PlaybackError::SourceUnavailable(e.to_string()))?;

        let source = RodioSource::decode(bytes.to_vec())?;
        let output = RodioOutput::open()?;
        debug!(url, samples = source.samples.len(), "preview opened");

        Ok(PreviewHandles {
            source: Box::new(source),
            output: Box::new(output),
        })
    }
}

struct RodioSource {
    channels: u16,
    sample_rate: u32,
    samples: Vec<i16>,
    position: usize,
}

impl RodioSource {
    // Decoded up front so the handle can move between threads.
    fn decode(bytes: Vec<u8>) -> Result<Self, PlaybackError> {
        let decoder = Decoder::new(Cursor::new(bytes))
            .map_err(|e| PlaybackError::SourceUnavailable(e.to_string()))?;
        let channels = decoder.channels();
        let sample_rate = decoder.sample_rate();
        Ok(Self {
            channels,
            sample_rate,
            samples: decoder.collect(),
            position: 0,
        })
    }
}

impl DecodeSource for RodioSource {
    fn read_chunk(&mut self) -> Result<Option<AudioChunk>, PlaybackError> {
        if self.position >= self.samples.len() {
            return Ok(None);
        }
        let end = (self.position + CHUNK_SAMPLES).min(self.samples.len());
        let samples = self.samples[self.position..end].to_vec();
        self.position = end;
        Ok(Some(AudioChunk {
            channels: self.channels,
            sample_rate: self.sample_rate,
            samples,
        }))
    }
}

/// A rodio sink whose `OutputStream` lives on a keeper thread, since the
/// stream itself cannot leave the thread that created it.
struct RodioOutput {
    sink: Sink,
    release: Option<mpsc::Sender<()>>,
}

impl RodioOutput {
    fn open() -> Result<Self, PlaybackError> {
        let (handle_tx, handle_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        thread::Builder::new()
            .name("spotlet-audio".into())
            .spawn(move || match OutputStream::try_default() {
                Ok((_stream, handle)) => {
                    if handle_tx.send(Ok(handle)).is_ok() {
                        // Returns once the sender is dropped.
                        let _ = release_rx.recv();
                    }
                }
                Err(e) => {
                    let _ = handle_tx.send(Err(e.to_string()));
                }
            })
            .map_err(|e| PlaybackError::OutputUnavailable(e.to_string()))?;

        let handle = handle_rx
            .recv()
            .map_err(|e| PlaybackError::OutputUnavailable(e.to_string()))?
            .map_err(PlaybackError::OutputUnavailable)?;

        let sink =
            Sink::try_new(&handle).map_err(|e| PlaybackError::OutputUnavailable(e.to_string()))?;

        Ok(Self {
            sink,
            release: Some(release_tx),
        })
    }
}

impl OutputSink for RodioOutput {
    fn write(&mut self, chunk: AudioChunk) -> Result<(), PlaybackError> {
        if self.release.is_none() {
            return Err(PlaybackError::OutputUnavailable("output closed".into()));
        }
        self.sink.append(SamplesBuffer::new(
            chunk.channels,
            chunk.sample_rate,
            chunk.samples,
        ));
        while self.sink.len() > MAX_QUEUED_CHUNKS && !self.sink.is_paused() {
            thread::sleep(Duration::from_millis(10));
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn resume(&mut self) {
        self.sink.play();
    }

    fn drain(&mut self) {
        if self.release.is_some() {
            self.sink.sleep_until_end();
        }
    }

    fn close(&mut self) {
        self.sink.stop();
        self.release.take();
    }
}

impl Drop for RodioOutput {
    fn drop(&mut self) {
        self.close();
    }
}
