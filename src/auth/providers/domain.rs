// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Domain username/password provider.
//!
//! Delegates verification to the external identity service and mints a token
//! on success, so that later requests can skip the external round trip.
//!
//! The whole delegation (retries included) is bounded by one timeout, split
//! evenly between the attempts so that a hung call still leaves room for a
//! retry. If the request is dropped while waiting, the in-flight call is
//! dropped with it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{AuthenticationOutcome, AuthenticationProvider, ProviderFailure};
use crate::auth::{
    external::{ExternalAuthError, ExternalIdentity, ExternalIdentityAuthenticator},
    AuthError, Credential, Principal, ProviderKind, Role, TokenService,
};

/// Default number of retries after an `Unavailable` answer.
pub const DEFAULT_RETRIES: u32 = 1;

/// Budget for a single identity service call when `total` is shared by the
/// first attempt and `retries` retries.
pub fn attempt_timeout(total: Duration, retries: u32) -> Duration {
    total / retries.saturating_add(1)
}

/// Provider for regular domain users.
pub struct DomainCredentialProvider {
    authenticator: Arc<dyn ExternalIdentityAuthenticator>,
    tokens: Arc<TokenService>,
    /// Username owned by the admin provider; never sent to the identity service.
    reserved_username: String,
    timeout: Duration,
    retries: u32,
}

impl DomainCredentialProvider {
    /// Create a domain provider.
    ///
    /// `reserved_username` is the admin username. Credentials for it are
    /// never considered domain credentials.
    pub fn new(
        authenticator: Arc<dyn ExternalIdentityAuthenticator>,
        tokens: Arc<TokenService>,
        reserved_username: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            authenticator,
            tokens,
            reserved_username: reserved_username.into(),
            timeout,
            retries: DEFAULT_RETRIES,
        }
    }

    /// Set the number of retries after an `Unavailable` answer.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    async fn verify(
        &self,
        username: &str,
        secret: &str,
    ) -> Result<ExternalIdentity, ExternalAuthError> {
        let budget = attempt_timeout(self.timeout, self.retries);
        let mut attempt = 0;
        loop {
            let call = self.authenticator.authenticate(username, secret);
            let result = tokio::time::timeout(budget, call).await.unwrap_or_else(|_| {
                Err(ExternalAuthError::Unavailable(format!(
                    "no answer within {}ms",
                    budget.as_millis()
                )))
            });
            match result {
                Err(ExternalAuthError::Unavailable(reason)) if attempt < self.retries => {
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        max_retries = self.retries,
                        %reason,
                        "Identity service unavailable, retrying"
                    );
                }
                result => return result,
            }
        }
    }
}

#[async_trait]
impl AuthenticationProvider for DomainCredentialProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Domain
    }

    fn applies_to(&self, credential: &Credential) -> bool {
        matches!(
            credential,
            Credential::UsernamePassword { username, .. } if *username != self.reserved_username
        )
    }

    async fn try_authenticate(
        &self,
        credential: &Credential,
    ) -> Result<AuthenticationOutcome, ProviderFailure> {
        if !self.applies_to(credential) {
            return Ok(AuthenticationOutcome::NotApplicable);
        }
        let Credential::UsernamePassword { username, secret } = credential else {
            return Ok(AuthenticationOutcome::NotApplicable);
        };

        let verified = tokio::time::timeout(self.timeout, self.verify(username, secret))
            .await
            .unwrap_or_else(|_| {
                Err(ExternalAuthError::Unavailable(format!(
                    "no answer within {}ms",
                    self.timeout.as_millis()
                )))
            });

        let identity = match verified {
            Ok(identity) => identity,
            Err(ExternalAuthError::InvalidCredentials) => {
                return Ok(AuthenticationOutcome::Rejected(AuthError::InvalidCredential));
            }
            Err(ExternalAuthError::Unavailable(reason)) => {
                return Err(ProviderFailure::ExternalServiceUnavailable(reason));
            }
        };

        let principal = Principal::new(
            identity.subject,
            identity.roles.into_iter().map(Role::from),
            ProviderKind::Domain,
        );
        let token = self.tokens.issue(&principal.subject, &principal.roles)?;

        Ok(AuthenticationOutcome::Success(principal.with_issued_token(token)))
    }
}
