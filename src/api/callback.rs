use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use axum::{Extension, extract::Query, response::Html};
use tokio::sync::oneshot;
use tracing::debug;

use crate::types::ConsentResponse;

/// One-shot slot the callback hands the redirect outcome to. Only the first
/// redirect is delivered.
pub type ConsentSlot = Arc<Mutex<Option<oneshot::Sender<ConsentResponse>>>>;

/// Receives Spotify's redirect after the consent page.
///
/// Forwards `code` on approval and `error` (usually `access_denied`) on
/// denial; the token exchange itself happens in the credential store.
pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(slot): Extension<ConsentSlot>,
) -> Html<&'static str> {
    let response = match (params.get("code"), params.get("error")) {
        (Some(code), _) => ConsentResponse::Code(code.clone()),
        (None, Some(error)) => ConsentResponse::Denied(error.clone()),
        (None, None) => return Html("<h4>Missing authorization code.</h4>"),
    };

    let sender = slot
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    let Some(sender) = sender else {
        return Html("<h4>Authorization was already handled.</h4>");
    };

    let denied = matches!(response, ConsentResponse::Denied(_));
    debug!(denied, "consent redirect received");
    if sender.send(response).is_err() {
        return Html("<h4>Authorization is no longer pending.</h4>");
    }

    if denied {
        Html("<h2>Access denied.</h2><p>You can close this window.</p>")
    } else {
        Html("<h2>Authorization successful.</h2><p>You can close this window.</p>")
    }
}
