// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication providers.
//!
//! Each provider validates exactly one credential shape. A provider that does
//! not recognise a credential answers [`AuthenticationOutcome::NotApplicable`]
//! and the chain moves on; a provider that recognises it decides the outcome.
//!
//! Expected failures (wrong password, expired token) are outcomes, not
//! errors. Only infrastructure trouble is a [`ProviderFailure`].

use async_trait::async_trait;

use super::credential::Credential;
use super::principal::{Principal, ProviderKind};
use super::token::TokenError;
use super::AuthError;

pub mod admin;
pub mod domain;
pub mod token;

pub use admin::AdminCredentialProvider;
pub use domain::DomainCredentialProvider;
pub use token::TokenCredentialProvider;

/// Result of asking one provider about one credential.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthenticationOutcome {
    /// The credential is valid.
    Success(Principal),
    /// This provider does not handle this credential shape.
    NotApplicable,
    /// The provider handles this shape and the credential is not valid.
    Rejected(AuthError),
}

/// Infrastructure failure while authenticating.
///
/// Never a statement about the credential itself, so never cached as a
/// negative result.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderFailure {
    /// The external identity service could not be consulted.
    #[error("external identity service unavailable: {0}")]
    ExternalServiceUnavailable(String),

    /// Credentials were verified but a token could not be minted.
    #[error("token issuance failed: {0}")]
    TokenIssuance(#[from] TokenError),
}

impl ProviderFailure {
    /// Outward classification, if this failure is an authentication failure.
    ///
    /// Token issuance problems are server faults, not authentication
    /// failures, and return `None`.
    pub fn auth_error(&self) -> Option<AuthError> {
        match self {
            ProviderFailure::ExternalServiceUnavailable(_) => {
                Some(AuthError::ExternalServiceUnavailable)
            }
            ProviderFailure::TokenIssuance(_) => None,
        }
    }
}

/// A strategy that validates one kind of credential.
#[async_trait]
pub trait AuthenticationProvider: Send + Sync {
    /// Which provider this is.
    fn kind(&self) -> ProviderKind;

    /// Whether this provider handles `credential`.
    ///
    /// Decided from the credential's shape and, for username/password
    /// credentials, the username alone. Never from the secret.
    fn applies_to(&self, credential: &Credential) -> bool;

    /// Try to authenticate `credential`.
    async fn try_authenticate(
        &self,
        credential: &Credential,
    ) -> Result<AuthenticationOutcome, ProviderFailure>;
}
