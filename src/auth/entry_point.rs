// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The single place where authentication failures become HTTP responses.
//!
//! Responses carry a status code and, for `401`, a `WWW-Authenticate`
//! challenge. Nothing else: no body, no hint about which provider failed.

use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue},
    response::{IntoResponse, Response},
};

use super::AuthError;

/// Challenge advertised on every `401`.
pub const AUTHENTICATE_CHALLENGE: &str = r#"Basic realm="relational", Bearer"#;

/// Convert an authentication failure into the canonical rejection.
pub fn reject(error: AuthError) -> Response {
    let status = error.status_code();
    let mut response = status.into_response();
    if status == axum::http::StatusCode::UNAUTHORIZED {
        response.headers_mut().insert(
            WWW_AUTHENTICATE,
            HeaderValue::from_static(AUTHENTICATE_CHALLENGE),
        );
    }
    response
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        reject(self)
    }
}
