//! OAuth credential lifecycle.
//!
//! [`CredentialStore`] is the only place the access token is ever written.
//! It supports the client-credentials flow (no user, preview mode) and the
//! authorization code flow with PKCE (full playback control), plus refresh
//! for the latter.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use chrono::{Duration, Utc};
use reqwest::{Client, Url};
use tokio::sync::{RwLock, oneshot};
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    error::AuthError,
    types::{ConsentResponse, Credential, Flow, PkceChallenge, TokenResponse},
    utils::{basic_auth_header, generate_pkce_challenge},
};

/// The window that shows Spotify's consent page and reports the redirect.
///
/// `show` returns a receiver that yields the redirect outcome. Dropping the
/// sender without sending (the user closed the window) means cancellation.
/// `close` must be idempotent.
pub trait ConsentCollaborator: Send + Sync {
    fn show(
        &self,
        url: &str,
        redirect_prefix: &str,
    ) -> Result<oneshot::Receiver<ConsentResponse>, AuthError>;

    fn close(&self);
}

pub struct CredentialStore {
    http: Client,
    config: Config,
    credential: RwLock<Option<Credential>>,
    /// Set once the token endpoint refused the refresh token. Cleared by the
    /// next successful authorization.
    refresh_rejected: AtomicBool,
}

impl CredentialStore {
    pub fn new(http: Client, config: Config) -> Self {
        Self {
            http,
            config,
            credential: RwLock::new(None),
            refresh_rejected: AtomicBool::new(false),
        }
    }

    /// Store seeded with an existing credential.
    pub fn with_credential(http: Client, config: Config, credential: Credential) -> Self {
        Self {
            http,
            config,
            credential: RwLock::new(Some(credential)),
            refresh_rejected: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn credential(&self) -> Option<Credential> {
        self.credential.read().await.clone()
    }

    /// The current bearer token. An empty token counts as no token.
    pub async fn access_token(&self) -> Option<String> {
        self.credential
            .read()
            .await
            .as_ref()
            .map(|c| c.access_token.clone())
            .filter(|t| !t.is_empty())
    }

    pub async fn flow(&self) -> Option<Flow> {
        self.credential.read().await.as_ref().map(|c| c.flow)
    }

    /// True when a PKCE credential has used up 90% of its lifetime.
    /// Client-credentials tokens are never refreshed, and neither is a
    /// credential whose refresh token was rejected.
    pub async fn needs_refresh(&self) -> bool {
        if self.refresh_rejected() {
            return false;
        }
        match self.credential.read().await.as_ref() {
            Some(c) => c.flow == Flow::AuthorizationCodePkce && c.refresh_due(Utc::now()),
            None => false,
        }
    }

    /// Whether the token endpoint refused the last refresh. Only a new
    /// authorization recovers from this.
    pub fn refresh_rejected(&self) -> bool {
        self.refresh_rejected.load(Ordering::SeqCst)
    }

    async fn store(&self, credential: &Credential) {
        *self.credential.write().await = Some(credential.clone());
        self.refresh_rejected.store(false, Ordering::SeqCst);
    }

    /// Obtains an app-only token with `grant_type=client_credentials`.
    pub async fn authorize_client_credentials(&self) -> Result<Credential, AuthError> {
        let secret = self
            .config
            .client_secret
            .as_deref()
            .ok_or(AuthError::MissingClientSecret)?;

        let response = self
            .token_request(&[("grant_type", "client_credentials")], Some(secret))
            .await?;

        let credential = credential_from(response, Flow::ClientCredentials, None);
        self.store(&credential).await;
        info!("authorized with client credentials");
        Ok(credential)
    }

    /// Starts the authorization code flow with PKCE and returns immediately.
    ///
    /// The consent page is handed to `consent`; the returned receiver
    /// resolves once the user approved, denied or closed the window. The
    /// collaborator is closed in every case and the store is only written on
    /// success.
    pub fn authorize_with_pkce(
        self: &Arc<Self>,
        consent: Arc<dyn ConsentCollaborator>,
    ) -> oneshot::Receiver<Result<Credential, AuthError>> {
        let (tx, rx) = oneshot::channel();
        let store = Arc::clone(self);

        tokio::spawn(async move {
            let result = store.run_pkce(consent.as_ref()).await;
            consent.close();

            if let Err(e) = &result {
                warn!(error = %e, "PKCE authorization failed");
            }
            // The caller may have stopped waiting.
            let _ = tx.send(result);
        });

        rx
    }

    async fn run_pkce(&self, consent: &dyn ConsentCollaborator) -> Result<Credential, AuthError> {
        let challenge = generate_pkce_challenge();
        let url = self.authorization_url(&challenge)?;

        let redirect = consent.show(url.as_str(), &self.config.redirect_uri)?;
        let code = match redirect.await {
            Ok(ConsentResponse::Code(code)) => code,
            Ok(ConsentResponse::Denied(reason)) => return Err(AuthError::ConsentDenied(reason)),
            Err(_) => return Err(AuthError::Cancelled),
        };

        let credential = self.exchange_code(&code, &challenge.code_verifier).await?;
        self.store(&credential).await;
        info!("authorized with PKCE");
        Ok(credential)
    }

    /// The consent page URL for a given challenge.
    pub fn authorization_url(&self, challenge: &PkceChallenge) -> Result<Url, AuthError> {
        Url::parse_with_params(
            &self.config.auth_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("code_challenge_method", "S256"),
                ("code_challenge", challenge.code_challenge.as_str()),
                ("scope", self.config.scope.as_str()),
            ],
        )
        .map_err(|e| AuthError::ConsentUnavailable(e.to_string()))
    }

    async fn exchange_code(&self, code: &str, verifier: &str) -> Result<Credential, AuthError> {
        let response = self
            .token_request(
                &[
                    ("grant_type", "authorization_code"),
                    ("client_id", &self.config.client_id),
                    ("code", code),
                    ("code_verifier", verifier),
                    ("redirect_uri", &self.config.redirect_uri),
                ],
                self.config.client_secret.as_deref(),
            )
            .await?;

        Ok(credential_from(response, Flow::AuthorizationCodePkce, None))
    }

    /// Exchanges the refresh token for a new access token.
    ///
    /// Only valid for the PKCE flow. The previous refresh token is kept when
    /// the response does not rotate it. A rejection by the token endpoint is
    /// remembered and stops [`needs_refresh`](Self::needs_refresh) from
    /// asking again.
    pub async fn refresh(&self) -> Result<Credential, AuthError> {
        let (flow, refresh_token) = {
            let guard = self.credential.read().await;
            let current = guard.as_ref().ok_or(AuthError::Unauthenticated)?;
            (current.flow, current.refresh_token.clone())
        };

        if flow != Flow::AuthorizationCodePkce {
            return Err(AuthError::NotApplicable);
        }
        let refresh_token = refresh_token.ok_or(AuthError::Unauthenticated)?;

        let response = self
            .token_request(
                &[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", &refresh_token),
                    ("client_id", &self.config.client_id),
                ],
                self.config.client_secret.as_deref(),
            )
            .await
            .inspect_err(|e| {
                if matches!(e, AuthError::ServerRejected(_)) {
                    self.refresh_rejected.store(true, Ordering::SeqCst);
                }
            })?;

        let credential = credential_from(response, flow, Some(refresh_token));
        self.store(&credential).await;
        debug!(expires_at = %credential.expires_at(), "access token refreshed");
        Ok(credential)
    }

    async fn token_request(
        &self,
        form: &[(&str, &str)],
        secret: Option<&str>,
    ) -> Result<TokenResponse, AuthError> {
        let mut req = self.http.post(&self.config.token_url).form(form);
        if let Some(secret) = secret {
            req = req.header(
                reqwest::header::AUTHORIZATION,
                basic_auth_header(&self.config.client_id, secret),
            );
        }

        let res = req
            .send()
            .await
            .map_err(|e| AuthError::NetworkUnavailable(e.to_string()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| AuthError::NetworkUnavailable(e.to_string()))?;

        if !status.is_success() {
            return Err(AuthError::ServerRejected(body));
        }

        serde_json::from_str::<TokenResponse>(&body).map_err(|_| AuthError::ServerRejected(body))
    }
}

fn credential_from(response: TokenResponse, flow: Flow, previous_refresh: Option<String>) -> Credential {
    Credential {
        access_token: response.access_token,
        refresh_token: response.refresh_token.or(previous_refresh),
        scope: response.scope,
        expires_in: Duration::seconds(response.expires_in),
        obtained_at: Utc::now(),
        flow,
    }
}
