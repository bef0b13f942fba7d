// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Operational endpoints for administrators.
//!
//! Every route here is listed in [`crate::auth::MANAGEMENT_ENDPOINTS`] and
//! is only reachable by principals holding the configured admin role. Handlers
//! do not re-check the role; the guard layer runs first.

use std::collections::BTreeMap;

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    auth::{metrics::AuthMetricsSnapshot, Auth, ProviderKind},
    state::AppState,
};

use super::ROUTES;

/// Authentication wiring as configured at startup.
#[derive(Debug, Serialize, ToSchema)]
pub struct AutoconfigResponse {
    /// Providers in the order they are consulted.
    pub providers: Vec<ProviderKind>,
    /// Role required for management endpoints.
    pub admin_role: String,
    /// Paths behind the admin guard.
    pub management_endpoints: Vec<String>,
    pub tls_enabled: bool,
    /// True when tokens are signed with a per-process random secret.
    pub generated_signing_secret: bool,
}

/// Components held in application state.
#[derive(Debug, Serialize, ToSchema)]
pub struct BeansResponse {
    pub components: Vec<String>,
}

/// Effective tunables.
#[derive(Debug, Serialize, ToSchema)]
pub struct ConfigPropsResponse {
    pub token_ttl_seconds: u64,
    pub identity_timeout_ms: u64,
    pub identity_retries: u32,
    pub tls_enabled: bool,
}

/// A single route and the methods it accepts.
#[derive(Debug, Serialize, ToSchema)]
pub struct RouteMapping {
    pub path: String,
    pub methods: Vec<String>,
    pub admin_only: bool,
}

/// Runtime counters.
#[derive(Debug, Serialize, ToSchema)]
pub struct MetricsResponse {
    pub authentication: AuthMetricsSnapshot,
    /// Tokens revoked and not yet expired.
    pub revoked_tokens: usize,
    pub uptime_seconds: u64,
    pub timestamp: String,
}

#[utoipa::path(
    get,
    path = "/autoconfig",
    tag = "Management",
    responses(
        (status = 200, description = "Authentication wiring", body = AutoconfigResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn autoconfig(State(state): State<AppState>) -> Json<AutoconfigResponse> {
    Json(AutoconfigResponse {
        providers: state.chain.provider_kinds(),
        admin_role: state.guard.admin_role.to_string(),
        management_endpoints: state.guard.paths().iter().map(|p| p.to_string()).collect(),
        tls_enabled: state.config.tls.is_some(),
        generated_signing_secret: state.config.token_signing_secret.is_none(),
    })
}

#[utoipa::path(
    get,
    path = "/beans",
    tag = "Management",
    responses(
        (status = 200, description = "Application components", body = BeansResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn beans(State(state): State<AppState>) -> Json<BeansResponse> {
    let mut components: Vec<String> = state
        .chain
        .provider_kinds()
        .into_iter()
        .map(|kind| {
            match kind {
                ProviderKind::Domain => "DomainCredentialProvider",
                ProviderKind::Admin => "AdminCredentialProvider",
                ProviderKind::Token => "TokenCredentialProvider",
            }
            .to_string()
        })
        .collect();
    components.extend(
        ["AuthenticationChain", "TokenService", "AuthMetrics", "ManagementGuard"]
            .into_iter()
            .map(String::from),
    );
    Json(BeansResponse { components })
}

#[utoipa::path(
    get,
    path = "/configprops",
    tag = "Management",
    responses(
        (status = 200, description = "Effective tunables", body = ConfigPropsResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn configprops(State(state): State<AppState>) -> Json<ConfigPropsResponse> {
    let config = &state.config;
    Json(ConfigPropsResponse {
        token_ttl_seconds: state.tokens.ttl().as_secs(),
        identity_timeout_ms: u64::try_from(config.identity_timeout.as_millis()).unwrap_or(u64::MAX),
        identity_retries: config.identity_retries,
        tls_enabled: config.tls.is_some(),
    })
}

/// Environment with secrets redacted.
#[utoipa::path(
    get,
    path = "/env",
    tag = "Management",
    responses(
        (status = 200, description = "Redacted environment as a string map"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn env(State(state): State<AppState>) -> Json<BTreeMap<&'static str, String>> {
    Json(state.config.redacted())
}

#[utoipa::path(
    get,
    path = "/mappings",
    tag = "Management",
    responses(
        (status = 200, description = "Route table", body = [RouteMapping]),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn mappings(State(state): State<AppState>) -> Json<Vec<RouteMapping>> {
    Json(
        ROUTES
            .iter()
            .map(|(path, methods)| RouteMapping {
                path: path.to_string(),
                methods: methods.iter().map(|m| m.to_string()).collect(),
                admin_only: state.guard.is_management_path(path),
            })
            .collect(),
    )
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Management",
    responses(
        (status = 200, description = "Runtime counters", body = MetricsResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        authentication: state.metrics.snapshot(),
        revoked_tokens: state.tokens.revoked_count(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Begin graceful shutdown. In-flight requests are allowed to finish.
#[utoipa::path(
    post,
    path = "/shutdown",
    tag = "Management",
    responses(
        (status = 202, description = "Shutdown initiated"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn shutdown(State(state): State<AppState>, Auth(principal): Auth) -> StatusCode {
    tracing::warn!(subject = %principal.subject, "Shutdown requested over HTTP");
    state.shutdown.cancel();
    StatusCode::ACCEPTED
}
