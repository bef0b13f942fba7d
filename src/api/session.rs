// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login, logout and identity endpoints.
//!
//! These run behind the credential extraction filter like everything else,
//! so by the time a handler is called the caller is already authenticated.

use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    auth::{Auth, Credential, Principal, ProviderKind, Role},
    error::ApiError,
    state::AppState,
};

/// Identity of the caller.
#[derive(Debug, Serialize, ToSchema)]
pub struct PrincipalResponse {
    /// Subject identifier.
    pub subject: String,
    /// Granted roles.
    pub roles: Vec<Role>,
    /// Provider that authenticated this request.
    pub provider: ProviderKind,
}

impl From<&Principal> for PrincipalResponse {
    fn from(principal: &Principal) -> Self {
        Self {
            subject: principal.subject.clone(),
            roles: principal.roles.iter().cloned().collect(),
            provider: principal.origin,
        }
    }
}

/// Result of a login.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthenticateResponse {
    #[serde(flatten)]
    pub principal: PrincipalResponse,
    /// Token to present as `Authorization: Bearer <token>` on later calls.
    /// Only domain logins receive one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Token expiry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Exchange credentials for a token.
///
/// Domain credentials are verified by the identity service and answered with
/// a fresh token. Admin and token credentials are echoed back without one.
#[utoipa::path(
    post,
    path = "/api/v1/authenticate",
    tag = "Session",
    responses(
        (status = 200, description = "Authenticated", body = AuthenticateResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn authenticate(Auth(principal): Auth) -> Json<AuthenticateResponse> {
    let token = principal.issued_token.as_ref();
    Json(AuthenticateResponse {
        principal: PrincipalResponse::from(&principal),
        token: token.map(|t| t.value.clone()),
        expires_at: token.map(|t| t.expires_at),
    })
}

/// Revoke the bearer token used for this request.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    tag = "Session",
    responses(
        (status = 204, description = "Token revoked"),
        (status = 400, description = "Request was not authenticated with a bearer token"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    Auth(principal): Auth,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let Ok(Some(Credential::BearerToken(token))) = Credential::from_headers(&headers) else {
        return Err(ApiError::bad_request("logout requires a bearer token"));
    };

    state
        .tokens
        .revoke(&token)
        .map_err(|e| ApiError::internal(format!("failed to revoke token: {e}")))?;

    tracing::info!(subject = %principal.subject, "Token revoked");
    Ok(StatusCode::NO_CONTENT)
}

/// Describe the authenticated caller.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    tag = "Session",
    responses(
        (status = 200, description = "Current principal", body = PrincipalResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(Auth(principal): Auth) -> Json<PrincipalResponse> {
    Json(PrincipalResponse::from(&principal))
}
