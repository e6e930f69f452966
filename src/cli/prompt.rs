use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    error::Result,
    info,
    management::{ActionOutcome, PlayerController},
    types::{PlayerActionKind, PlayerState},
    warning,
};

const HELP: &str = "Commands: play, pause, next, prev, search <query>, queue <query>, status, help, quit";

/// Reads commands from stdin until `quit` or end of input.
pub(crate) async fn run(controller: &PlayerController) {
    info!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        let (command, arg) = match line.split_once(' ') {
            Some((command, arg)) => (command, arg.trim()),
            None => (line, ""),
        };

        let result = match command {
            "" => continue,
            "play" => controller.player_action(PlayerActionKind::Play).await,
            "pause" => controller.player_action(PlayerActionKind::Pause).await,
            "next" => controller.player_action(PlayerActionKind::Next).await,
            "prev" | "previous" => controller.player_action(PlayerActionKind::Previous).await,
            "search" if !arg.is_empty() => controller.search_and_play(arg).await,
            "queue" if !arg.is_empty() => controller.add_to_queue(arg).await,
            "status" => {
                status(controller).await;
                continue;
            }
            "help" => {
                info!("{}", HELP);
                continue;
            }
            "quit" | "exit" | "q" => break,
            _ => {
                warning!("Unknown command `{}`. {}", line, HELP);
                continue;
            }
        };
        report(result);
    }
}

async fn status(controller: &PlayerController) {
    let state = match controller.session().player_state() {
        PlayerState::Playing => "playing",
        PlayerState::Paused => "paused",
        PlayerState::Stopped => "stopped",
    };
    match controller.session().current_song().await {
        Some(song) => info!("{} - {} ({})", song.name, song.artists_label(), state),
        None => info!("Nothing loaded ({})", state),
    }
}

fn report(result: Result<ActionOutcome>) {
    match result {
        // The display already reported the missing device.
        Ok(ActionOutcome::Done) | Ok(ActionOutcome::NoActiveDevices) => {}
        Ok(ActionOutcome::NothingPlaying) => warning!("Nothing is playing."),
        Ok(ActionOutcome::NoResults) => warning!("No tracks found."),
        Err(e) => warning!("{}", e),
    }
}
