use std::sync::Arc;

use reqwest::Client;

use crate::{
    cli::{load_config, prompt},
    display::ConsoleDisplay,
    error, info,
    management::{PlaybackSession, PlayerController},
    preview::{PreviewPlayer, backend::RodioBackend},
    spotify::{SpotifyClient, auth::CredentialStore},
    warning,
};

/// Track loaded when no query is given.
pub const DEFAULT_PREVIEW_QUERY: &str = "battle scars";

/// No-account mode: search with an app token and play 30 second previews.
pub async fn preview(query: Option<String>) {
    let config = load_config();
    let http = Client::new();
    let store = Arc::new(CredentialStore::new(http.clone(), config.clone()));
    if let Err(e) = store.authorize_client_credentials().await {
        error!("Cannot authorize the app: {}", e);
    }

    let client = SpotifyClient::new(http, &config.api_url, store);
    let session = Arc::new(PlaybackSession::new(
        client,
        Arc::new(ConsoleDisplay::new()),
        config.local_device_name(),
    ));
    let player = Arc::new(PreviewPlayer::new(Arc::new(RodioBackend::new())));
    let controller = PlayerController::preview(session, Arc::clone(&player));

    let query = query.unwrap_or_else(|| DEFAULT_PREVIEW_QUERY.to_string());
    match controller.load_preview_catalog(&query).await {
        Ok(Some(song)) if song.preview_url.is_none() => {
            warning!("\"{}\" has no preview; search for another track.", song.name)
        }
        Ok(Some(_)) => info!("Type `play` to listen to the preview."),
        Ok(None) => warning!("No tracks found for \"{}\".", query),
        Err(e) => warning!("Search failed: {}", e),
    }

    prompt::run(&controller).await;
    player.close();
    player.wait_idle().await;
}
