// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credentials presented in the `Authorization` header.
//!
//! Two schemes are understood:
//!
//! - `Basic <base64(username:secret)>` → [`Credential::UsernamePassword`]
//! - `Bearer <token>` → [`Credential::BearerToken`]
//!
//! Scheme names are matched case-insensitively.

use std::fmt;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use base64ct::{Base64, Encoding};

use super::AuthError;

/// A credential extracted from a single request.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Username and secret from a `Basic` header.
    UsernamePassword {
        /// Username as presented
        username: String,
        /// Secret as presented
        secret: String,
    },
    /// Opaque token from a `Bearer` header.
    BearerToken(String),
}

impl Credential {
    /// Shorthand for a username/password credential.
    pub fn username_password(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Credential::UsernamePassword {
            username: username.into(),
            secret: secret.into(),
        }
    }

    /// Shorthand for a bearer token credential.
    pub fn bearer(token: impl Into<String>) -> Self {
        Credential::BearerToken(token.into())
    }

    /// Credential shape, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Credential::UsernamePassword { .. } => "basic",
            Credential::BearerToken(_) => "bearer",
        }
    }

    /// Extract a credential from request headers.
    ///
    /// Returns `Ok(None)` when no `Authorization` header is present. A header
    /// that is present but cannot be understood is
    /// [`AuthError::UnsupportedCredentialKind`].
    pub fn from_headers(headers: &HeaderMap) -> Result<Option<Self>, AuthError> {
        let Some(value) = headers.get(AUTHORIZATION) else {
            return Ok(None);
        };
        let value = value
            .to_str()
            .map_err(|_| AuthError::UnsupportedCredentialKind)?;
        Self::parse_authorization(value).map(Some)
    }

    /// Parse the value of an `Authorization` header.
    pub fn parse_authorization(value: &str) -> Result<Self, AuthError> {
        let (scheme, rest) = value
            .trim()
            .split_once(' ')
            .ok_or(AuthError::UnsupportedCredentialKind)?;
        let rest = rest.trim();

        if scheme.eq_ignore_ascii_case("bearer") {
            if rest.is_empty() {
                return Err(AuthError::UnsupportedCredentialKind);
            }
            return Ok(Credential::BearerToken(rest.to_string()));
        }

        if scheme.eq_ignore_ascii_case("basic") {
            let decoded =
                Base64::decode_vec(rest).map_err(|_| AuthError::UnsupportedCredentialKind)?;
            let decoded =
                String::from_utf8(decoded).map_err(|_| AuthError::UnsupportedCredentialKind)?;
            let (username, secret) = decoded
                .split_once(':')
                .ok_or(AuthError::UnsupportedCredentialKind)?;
            return Ok(Credential::username_password(username, secret));
        }

        Err(AuthError::UnsupportedCredentialKind)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::UsernamePassword { username, .. } => f
                .debug_struct("UsernamePassword")
                .field("username", username)
                .field("secret", &"<redacted>")
                .finish(),
            Credential::BearerToken(_) => {
                f.debug_tuple("BearerToken").field(&"<redacted>").finish()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use base64::{engine::general_purpose::STANDARD, Engine};

    fn basic(user: &str, secret: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{user}:{secret}")))
    }

    #[test]
    fn no_header_is_no_credential() {
        assert_eq!(Credential::from_headers(&HeaderMap::new()), Ok(None));
    }

    #[test]
    fn parses_basic() {
        let cred = Credential::parse_authorization(&basic("alice", "s3cret")).unwrap();
        assert_eq!(cred, Credential::username_password("alice", "s3cret"));
    }

    #[test]
    fn basic_secret_may_contain_colons() {
        let cred = Credential::parse_authorization(&basic("alice", "a:b:c")).unwrap();
        assert_eq!(cred, Credential::username_password("alice", "a:b:c"));
    }

    #[test]
    fn parses_bearer_case_insensitively() {
        for header in ["Bearer abc.def.ghi", "bearer abc.def.ghi", "BEARER  abc.def.ghi "] {
            let cred = Credential::parse_authorization(header).unwrap();
            assert_eq!(cred, Credential::bearer("abc.def.ghi"), "{header}");
        }
    }

    #[test]
    fn from_headers_reads_authorization() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer tok"));
        assert_eq!(
            Credential::from_headers(&headers),
            Ok(Some(Credential::bearer("tok")))
        );
    }

    #[test]
    fn unparseable_headers_are_unsupported() {
        for header in [
            "Bearer",
            "Bearer ",
            "Digest username=\"alice\"",
            "Basic not-base64!!",
            "Basic bm9jb2xvbg==", // "nocolon"
            "token",
        ] {
            assert_eq!(
                Credential::parse_authorization(header),
                Err(AuthError::UnsupportedCredentialKind),
                "{header}"
            );
        }
    }

    #[test]
    fn debug_redacts_secrets() {
        let debug = format!("{:?}", Credential::username_password("alice", "hunter2"));
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));

        let debug = format!("{:?}", Credential::bearer("tok-123"));
        assert!(!debug.contains("tok-123"));
    }
}
