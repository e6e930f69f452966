//! Command-line front ends.
//!
//! Each subcommand is the composition root for its run: it reads the
//! configuration, authorizes, builds the [`PlaybackSession`](crate::management::PlaybackSession)
//! and hands it to the reconciler and the controller.

mod connect;
mod devices;
mod preview;
mod prompt;

pub use connect::connect;
pub use devices::devices;
pub use preview::preview;

use crate::{config::Config, error};

fn load_config() -> Config {
    match Config::from_env() {
        Ok(config) => config,
        Err(e) => error!(
            "Invalid configuration: {}. Check {}",
            e,
            crate::config::env_path().display()
        ),
    }
}
