// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Management endpoint guard.
//!
//! Runs after the credential extraction filter. For the compiled-in set of
//! management paths it additionally requires the administrator role; every
//! other path passes through untouched.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::entry_point::reject;
use super::{AuthError, AuthMetrics, Principal, Role};

/// Management endpoints that require the administrator role.
pub const MANAGEMENT_ENDPOINTS: &[&str] = &[
    "/autoconfig",
    "/beans",
    "/configprops",
    "/env",
    "/mappings",
    "/metrics",
    "/shutdown",
];

/// Access rule for management endpoints.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Role that designates an administrator (exact match).
    pub admin_role: Role,
    paths: &'static [&'static str],
}

impl GuardConfig {
    /// Guard the standard management endpoints with `admin_role`.
    pub fn new(admin_role: Role) -> Self {
        Self {
            admin_role,
            paths: MANAGEMENT_ENDPOINTS,
        }
    }

    /// Guarded path prefixes.
    pub fn paths(&self) -> &'static [&'static str] {
        self.paths
    }

    /// Whether `path` is a management endpoint or below one.
    pub fn is_management_path(&self, path: &str) -> bool {
        self.paths.iter().any(|guarded| {
            path.strip_prefix(guarded)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }

    /// Decide whether `principal` may access `path`.
    pub fn check(&self, path: &str, principal: Option<&Principal>) -> Result<(), AuthError> {
        if !self.is_management_path(path) {
            return Ok(());
        }
        let principal = principal.ok_or(AuthError::MissingCredential)?;
        if principal.has_role(&self.admin_role) {
            Ok(())
        } else {
            Err(AuthError::InsufficientRole)
        }
    }
}

/// State for [`guard_management_endpoints`].
#[derive(Debug, Clone)]
pub struct GuardState {
    pub config: GuardConfig,
    pub metrics: Arc<AuthMetrics>,
}

/// Middleware enforcing [`GuardConfig`].
pub async fn guard_management_endpoints(
    State(state): State<GuardState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    let principal = request.extensions().get::<Principal>();

    if let Err(error) = state.config.check(path, principal) {
        tracing::warn!(
            path,
            subject = principal.map(|p| p.subject.as_str()),
            error_code = error.error_code(),
            "Management endpoint access denied"
        );
        state.metrics.record_failure(error);
        return reject(error);
    }

    next.run(request).await
}
