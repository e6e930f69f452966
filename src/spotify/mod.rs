//! # Spotify Integration Module
//!
//! The integration layer between spotlet and the Spotify Web API. Everything
//! that leaves the machine goes through here.
//!
//! ## Architecture
//!
//! ```text
//! Management (reconciler, controller)
//!          ↓
//! SpotifyClient ── player, search, decode
//!          ↓
//! CredentialStore (auth) ── token endpoint
//!          ↓
//! HTTP Layer (reqwest, JSON)
//! ```
//!
//! ## Modules
//!
//! - [`auth`] - the [`CredentialStore`](auth::CredentialStore): client
//!   credentials, authorization code with PKCE and refresh.
//! - [`player`] - playback state, devices and the player commands.
//! - [`search`] - track search and album art.
//! - [`decode`] - one explicit decoder per response shape.
//!
//! ## Error Handling
//!
//! [`SpotifyClient::request`] never refreshes the token and never retries.
//! Transport failures come back as [`TransportError`](crate::error::TransportError),
//! a missing token as [`AuthError::Unauthenticated`]. Spotify reports some
//! player failures, notably `NO_ACTIVE_DEVICE`, inside the response body, so
//! the body is inspected by [`ApiResponse::application_error`] regardless of
//! the status code.

pub mod auth;
pub mod decode;
pub mod player;
pub mod search;

use std::sync::Arc;

use reqwest::{Client, Method};
use serde_json::Value;
use tracing::debug;

use crate::{
    error::{ApplicationError, AuthError, Error, NO_ACTIVE_DEVICE, Result},
    spotify::auth::CredentialStore,
};

/// Spotify pages accept between 1 and 50 items.
pub(crate) fn validate_limit(limit: u32) -> Result<()> {
    if (1..=50).contains(&limit) {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "limit must be between 1 and 50, got {limit}"
        )))
    }
}

/// Status and parsed body of a Web API call.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    /// Parsed JSON body; an empty body is `{}`.
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The application error embedded in the body, if any.
    ///
    /// `NO_ACTIVE_DEVICE` is recognised from `error.reason`, otherwise from a
    /// text scan of the `error` object or of a body that was not JSON at all.
    /// Regular payloads are never scanned since they echo user input.
    /// Other errors are only reported for non-2xx statuses.
    pub fn application_error(&self) -> Option<ApplicationError> {
        let reason = self
            .body
            .pointer("/error/reason")
            .and_then(Value::as_str)
            .map(str::to_string);

        let mentioned = match &self.body {
            Value::String(text) => text.contains(NO_ACTIVE_DEVICE),
            body => body
                .get("error")
                .is_some_and(|error| error.to_string().contains(NO_ACTIVE_DEVICE)),
        };

        if reason.as_deref() == Some(NO_ACTIVE_DEVICE) || (reason.is_none() && mentioned) {
            return Some(ApplicationError::NoActiveDevice);
        }

        if self.is_success() {
            return None;
        }

        let message = self
            .body
            .pointer("/error/message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| self.body.to_string());

        Some(ApplicationError::Api {
            status: self.status,
            reason,
            message,
        })
    }

    /// Converts an embedded application error into `Err`.
    pub fn into_result(self) -> Result<Self> {
        match self.application_error() {
            Some(err) => Err(err.into()),
            None => Ok(self),
        }
    }
}

/// Authenticated Web API client. Cheap to clone.
#[derive(Clone)]
pub struct SpotifyClient {
    http: Client,
    api_url: String,
    credentials: Arc<CredentialStore>,
}

impl SpotifyClient {
    pub fn new(http: Client, api_url: impl Into<String>, credentials: Arc<CredentialStore>) -> Self {
        Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            credentials,
        }
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// Performs one authenticated call against `{api_url}{path}`.
    ///
    /// Fails fast with [`AuthError::Unauthenticated`] when no token is held.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<ApiResponse> {
        let token = self
            .credentials
            .access_token()
            .await
            .ok_or(Error::Auth(AuthError::Unauthenticated))?;

        let url = format!("{}{}", self.api_url, path);
        debug!(%method, %url, "spotify request");

        let mut req = self
            .http
            .request(method, &url)
            .bearer_auth(token)
            .query(query);

        req = match body {
            Some(json) => req.json(&json),
            // Spotify rejects body-less PUT/POST without a content length.
            None => req.header(reqwest::header::CONTENT_LENGTH, 0),
        };

        let res = req.send().await?;
        let status = res.status().as_u16();
        let text = res.text().await?;

        let body = if text.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        debug!(status, "spotify response");
        Ok(ApiResponse { status, body })
    }
}
