// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Boundary to the external identity service.
//!
//! The service verifies domain username/password pairs. Its failures come in
//! two flavours that must never be confused: a definite "no" and "could not
//! ask". Only the former is a credential rejection.
//!
//! ## Wire format
//!
//! ```text
//! POST {base_url}/authenticate
//! {"username": "...", "password": "..."}
//!
//! 200 {"subject": "...", "roles": ["..."]}   → verified
//! 401 / 403                                  → invalid credentials
//! anything else, timeouts, connect errors    → unavailable
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

/// Default timeout for one call to the identity service.
pub const DEFAULT_IDENTITY_TIMEOUT: Duration = Duration::from_secs(5);

/// Identity confirmed by the external service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExternalIdentity {
    /// Canonical subject identifier
    pub subject: String,
    /// Role names granted by the service
    #[serde(default)]
    pub roles: Vec<String>,
}

/// External identity service errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExternalAuthError {
    /// The service answered and rejected the credentials.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The service could not be reached or answered unusably.
    #[error("identity service unavailable: {0}")]
    Unavailable(String),
}

/// Verifies domain usernames and secrets.
#[async_trait]
pub trait ExternalIdentityAuthenticator: Send + Sync {
    /// Verify `username`/`secret` and return the identity they belong to.
    async fn authenticate(
        &self,
        username: &str,
        secret: &str,
    ) -> Result<ExternalIdentity, ExternalAuthError>;
}

#[derive(Serialize)]
struct AuthenticateRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// HTTP client for the identity service.
#[derive(Debug, Clone)]
pub struct HttpIdentityAuthenticator {
    endpoint: Url,
    client: Client,
}

impl HttpIdentityAuthenticator {
    /// Create a client for the service at `base_url`.
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, ExternalAuthError> {
        let endpoint = join(base_url, "authenticate")?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ExternalAuthError::Unavailable(format!("failed to build HTTP client: {e}"))
            })?;
        Ok(Self { endpoint, client })
    }

    /// The URL credentials are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ExternalIdentityAuthenticator for HttpIdentityAuthenticator {
    async fn authenticate(
        &self,
        username: &str,
        secret: &str,
    ) -> Result<ExternalIdentity, ExternalAuthError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&AuthenticateRequest {
                username,
                password: secret,
            })
            .send()
            .await
            .map_err(|e| ExternalAuthError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(ExternalAuthError::InvalidCredentials)
            }
            status if status.is_success() => response
                .json::<ExternalIdentity>()
                .await
                .map_err(|e| ExternalAuthError::Unavailable(format!("invalid response: {e}"))),
            status => Err(ExternalAuthError::Unavailable(format!(
                "HTTP {status} from identity service"
            ))),
        }
    }
}

/// Append `segment` to `base` as a path segment, keeping any base path.
fn join(base: &Url, segment: &str) -> Result<Url, ExternalAuthError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(segment)
        .map_err(|e| ExternalAuthError::Unavailable(format!("invalid identity service URL: {e}")))
}
