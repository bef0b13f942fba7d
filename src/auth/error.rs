// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! The variants here are internal classifications. Outwardly, the first six
//! collapse into a bare `401` and only [`AuthError::InsufficientRole`] maps to
//! `403`; see [`entry_point`](super::entry_point).

use axum::http::StatusCode;

/// Why a request could not be authenticated or authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization` header present
    #[error("authorization header is required")]
    MissingCredential,
    /// No provider accepts the presented credential shape
    #[error("unsupported credential kind")]
    UnsupportedCredentialKind,
    /// A provider recognised the credential but the secret is wrong
    #[error("invalid credential")]
    InvalidCredential,
    /// Token is past its expiry
    #[error("token has expired")]
    ExpiredToken,
    /// Token could not be decoded or verified
    #[error("token is malformed")]
    MalformedToken,
    /// The external identity service could not be reached in time
    #[error("external identity service unavailable")]
    ExternalServiceUnavailable,
    /// The principal lacks the role required for this endpoint
    #[error("insufficient role for this endpoint")]
    InsufficientRole,
}

impl AuthError {
    /// All variants, in taxonomy order.
    pub const ALL: [AuthError; 7] = [
        AuthError::MissingCredential,
        AuthError::UnsupportedCredentialKind,
        AuthError::InvalidCredential,
        AuthError::ExpiredToken,
        AuthError::MalformedToken,
        AuthError::ExternalServiceUnavailable,
        AuthError::InsufficientRole,
    ];

    /// Get the error code for this error (logs and metrics only).
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::UnsupportedCredentialKind => "unsupported_credential_kind",
            AuthError::InvalidCredential => "invalid_credential",
            AuthError::ExpiredToken => "expired_token",
            AuthError::MalformedToken => "malformed_token",
            AuthError::ExternalServiceUnavailable => "external_service_unavailable",
            AuthError::InsufficientRole => "insufficient_role",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InsufficientRole => StatusCode::FORBIDDEN,
            AuthError::MissingCredential
            | AuthError::UnsupportedCredentialKind
            | AuthError::InvalidCredential
            | AuthError::ExpiredToken
            | AuthError::MalformedToken
            | AuthError::ExternalServiceUnavailable => StatusCode::UNAUTHORIZED,
        }
    }

    /// Whether a caller may retry the same credential later.
    ///
    /// Only infrastructure failures qualify; they must never be remembered
    /// as a negative result.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::ExternalServiceUnavailable)
    }
}
