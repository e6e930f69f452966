//! Local callback server acting as the consent window.
//!
//! [`LocalCallbackServer`] opens the consent page in the user's browser and
//! serves the redirect URI on `SERVER_ADDRESS` until the credential store
//! closes it.

use std::{
    net::SocketAddr,
    str::FromStr,
    sync::{Arc, Mutex, PoisonError},
};

use axum::{Extension, Router, routing::get};
use reqwest::Url;
use tokio::sync::oneshot;
use tracing::{debug, error};

use crate::{
    api::{self, ConsentSlot},
    error::AuthError,
    spotify::auth::ConsentCollaborator,
    types::ConsentResponse,
    warning,
};

pub fn router(slot: ConsentSlot, callback_path: &str) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route(callback_path, get(api::callback).layer(Extension(slot)))
}

pub struct LocalCallbackServer {
    addr: String,
    open_browser: bool,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
}

impl LocalCallbackServer {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            open_browser: true,
            shutdown: Mutex::new(None),
        }
    }

    /// Prints the consent URL instead of launching a browser.
    pub fn without_browser(mut self) -> Self {
        self.open_browser = false;
        self
    }
}

impl ConsentCollaborator for LocalCallbackServer {
    fn show(
        &self,
        url: &str,
        redirect_prefix: &str,
    ) -> Result<oneshot::Receiver<ConsentResponse>, AuthError> {
        let unavailable = |e: &dyn std::fmt::Display| AuthError::ConsentUnavailable(e.to_string());

        let addr = SocketAddr::from_str(&self.addr).map_err(|e| unavailable(&e))?;
        let callback_path = Url::parse(redirect_prefix)
            .map(|u| u.path().to_string())
            .map_err(|e| unavailable(&e))?;

        let listener = std::net::TcpListener::bind(addr).map_err(|e| unavailable(&e))?;
        listener
            .set_nonblocking(true)
            .map_err(|e| unavailable(&e))?;
        let listener = tokio::net::TcpListener::from_std(listener).map_err(|e| unavailable(&e))?;

        let (tx, rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = router(Arc::new(Mutex::new(Some(tx))), &callback_path);

        tokio::spawn(async move {
            let shutdown = async {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!(error = %e, "callback server failed");
            }
        });
        debug!(%addr, path = %callback_path, "callback server listening");

        *self.shutdown.lock().unwrap_or_else(PoisonError::into_inner) = Some(shutdown_tx);

        if !self.open_browser || webbrowser::open(url).is_err() {
            warning!(
                "Open the following URL in your browser to authorize spotlet:\n{}",
                url
            );
        }
        Ok(rx)
    }

    fn close(&self) {
        let sender = self
            .shutdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(sender) = sender {
            let _ = sender.send(());
        }
    }
}

impl Drop for LocalCallbackServer {
    fn drop(&mut self) {
        self.close();
    }
}
