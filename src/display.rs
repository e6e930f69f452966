//! The display collaborator.
//!
//! The engine only ever pushes to a [`Display`]; it never reads from it.
//! [`ConsoleDisplay`] renders to the terminal with an `indicatif` bar for the
//! track position and the colored status macros for everything else.

use std::sync::Mutex;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::{info, types::Song, utils::format_seconds, warning};

pub trait Display: Send + Sync {
    /// A new snapshot of the canonical song. Called on every reconciled tick.
    fn show_song(&self, song: Song, is_paused: bool);

    /// Preview playback progress in seconds.
    fn update_progress(&self, current: f64, total: f64);

    fn show_no_active_devices(&self);

    fn show_connection_lost(&self);

    /// Spotify refused to renew the session; the user has to reconnect.
    fn show_authorization_lost(&self);
}

pub struct ConsoleDisplay {
    bar: ProgressBar,
    last: Mutex<Option<(String, bool)>>,
}

impl ConsoleDisplay {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{prefix} [{bar:30.green/white}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        Self {
            bar,
            last: Mutex::new(None),
        }
    }

    fn set_position(&self, current: f64, total: f64) {
        self.bar.set_length(total.max(0.0) as u64);
        self.bar.set_position(current.clamp(0.0, total.max(0.0)) as u64);
        self.bar
            .set_message(format!("{} / {}", format_seconds(current), format_seconds(total)));
    }
}

impl Default for ConsoleDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ConsoleDisplay {
    fn show_song(&self, song: Song, is_paused: bool) {
        let key = (song.id.clone(), is_paused);
        let changed = match self.last.lock() {
            Ok(mut last) => {
                let changed = last.as_ref() != Some(&key);
                *last = Some(key);
                changed
            }
            Err(_) => true,
        };

        if changed {
            let status = if is_paused {
                "paused".yellow()
            } else {
                "playing".green()
            };
            self.bar.suspend(|| {
                info!(
                    "{} {} - {} ({})",
                    status,
                    song.name.bold(),
                    song.artists_label(),
                    song.album_name.dimmed()
                )
            });
        }

        self.bar.set_prefix(song.name.clone());
        self.set_position(
            song.progress_ms as f64 / 1000.0,
            song.duration_ms as f64 / 1000.0,
        );
    }

    fn update_progress(&self, current: f64, total: f64) {
        self.set_position(current, total);
    }

    fn show_no_active_devices(&self) {
        self.bar.suspend(|| {
            warning!("No active devices. Open Spotify on this machine or another device.")
        });
    }

    fn show_connection_lost(&self) {
        self.bar
            .suspend(|| warning!("Connection to Spotify lost, retrying..."));
    }

    fn show_authorization_lost(&self) {
        self.bar.suspend(|| {
            warning!("Spotify rejected the session refresh. Restart `spotlet connect` to sign in again.")
        });
    }
}
