// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential extraction filter.
//!
//! Runs first on every request:
//!
//! 1. Read the `Authorization` header into a [`Credential`]
//! 2. Ask the [`AuthenticationChain`]
//! 3. On success insert the [`Principal`] into the request extensions and
//!    continue; otherwise hand the failure to the entry point and stop
//!
//! ## Usage
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/protected", get(protected_handler))
//!     .layer(axum::middleware::from_fn_with_state(
//!         FilterState::new(chain, metrics),
//!         authenticate_request,
//!     ));
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::chain::AuthenticationChain;
use super::entry_point::reject;
use super::providers::AuthenticationOutcome;
use super::{AuthError, AuthMetrics, Credential, Principal};

/// State for [`authenticate_request`].
#[derive(Debug, Clone)]
pub struct FilterState {
    pub chain: Arc<AuthenticationChain>,
    pub metrics: Arc<AuthMetrics>,
}

impl FilterState {
    pub fn new(chain: Arc<AuthenticationChain>, metrics: Arc<AuthMetrics>) -> Self {
        Self { chain, metrics }
    }
}

/// Authentication middleware function.
pub async fn authenticate_request(
    State(state): State<FilterState>,
    mut request: Request,
    next: Next,
) -> Response {
    // A principal is installed at most once per request.
    if request.extensions().get::<Principal>().is_some() {
        return next.run(request).await;
    }

    let path = request.uri().path().to_owned();

    let credential = match Credential::from_headers(request.headers()) {
        Ok(Some(credential)) => credential,
        Ok(None) => return unauthorized(&state, AuthError::MissingCredential, &path, None),
        Err(error) => return unauthorized(&state, error, &path, None),
    };

    match state.chain.authenticate(&credential).await {
        Ok(AuthenticationOutcome::Success(principal)) => {
            tracing::debug!(
                path = %path,
                subject = %principal.subject,
                provider = principal.origin.as_str(),
                "Request authenticated"
            );
            state.metrics.record_success(principal.origin);
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Ok(AuthenticationOutcome::Rejected(error)) => {
            unauthorized(&state, error, &path, Some(&credential))
        }
        Ok(AuthenticationOutcome::NotApplicable) => unauthorized(
            &state,
            AuthError::UnsupportedCredentialKind,
            &path,
            Some(&credential),
        ),
        Err(failure) => match failure.auth_error() {
            Some(error) => {
                tracing::error!(
                    path = %path,
                    credential = credential.kind(),
                    %failure,
                    "Authentication aborted by provider failure"
                );
                state.metrics.record_failure(error);
                reject(error)
            }
            None => {
                tracing::error!(path = %path, %failure, "Internal authentication error");
                state.metrics.record_internal_error();
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        },
    }
}

fn unauthorized(
    state: &FilterState,
    error: AuthError,
    path: &str,
    credential: Option<&Credential>,
) -> Response {
    tracing::warn!(
        path,
        credential = credential.map(Credential::kind),
        error_code = error.error_code(),
        "Authentication failed"
    );
    state.metrics.record_failure(error);
    reject(error)
}
