use std::sync::Arc;

use reqwest::Client;

use crate::{
    cli::{load_config, prompt},
    config::Config,
    display::ConsoleDisplay,
    error, info,
    management::{PlaybackReconciler, PlaybackSession, PlayerController},
    server::LocalCallbackServer,
    spotify::{SpotifyClient, auth::CredentialStore},
    success,
};

/// Authorizes with PKCE through the local callback server. Exits on failure.
pub(crate) async fn authorize(config: &Config, open_browser: bool) -> (Client, Arc<CredentialStore>) {
    let http = Client::new();
    let store = Arc::new(CredentialStore::new(http.clone(), config.clone()));

    let mut server = LocalCallbackServer::new(&config.server_addr);
    if !open_browser {
        server = server.without_browser();
    }

    info!("Waiting for authorization in the browser...");
    match store.authorize_with_pkce(Arc::new(server)).await {
        Ok(Ok(_)) => success!("Authorization successful."),
        Ok(Err(e)) => error!("Authorization failed: {}", e),
        Err(_) => error!("Authorization was interrupted."),
    }

    (http, store)
}

/// Mirrors and controls the account's playback until `quit`.
pub async fn connect(open_browser: bool) {
    let config = load_config();
    let (http, store) = authorize(&config, open_browser).await;

    let client = SpotifyClient::new(http, &config.api_url, store);
    let session = Arc::new(PlaybackSession::new(
        client,
        Arc::new(ConsoleDisplay::new()),
        config.local_device_name(),
    ));
    info!("Controlling playback as device \"{}\"", session.device_name());

    let reconciler = PlaybackReconciler::new(Arc::clone(&session), config.poll_interval).spawn();
    let controller = PlayerController::account(session);

    prompt::run(&controller).await;
    reconciler.abort();
}
