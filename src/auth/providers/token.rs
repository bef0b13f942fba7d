// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token provider.

use std::sync::Arc;

use async_trait::async_trait;

use super::{AuthenticationOutcome, AuthenticationProvider, ProviderFailure};
use crate::auth::{AuthError, Credential, ProviderKind, TokenError, TokenService};

/// Validates previously issued tokens.
pub struct TokenCredentialProvider {
    tokens: Arc<TokenService>,
}

impl TokenCredentialProvider {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl AuthenticationProvider for TokenCredentialProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Token
    }

    fn applies_to(&self, credential: &Credential) -> bool {
        matches!(credential, Credential::BearerToken(_))
    }

    async fn try_authenticate(
        &self,
        credential: &Credential,
    ) -> Result<AuthenticationOutcome, ProviderFailure> {
        let Credential::BearerToken(value) = credential else {
            return Ok(AuthenticationOutcome::NotApplicable);
        };

        let outcome = match self.tokens.validate(value) {
            Ok(principal) => AuthenticationOutcome::Success(principal),
            Err(TokenError::Expired) => AuthenticationOutcome::Rejected(AuthError::ExpiredToken),
            Err(TokenError::Malformed | TokenError::Revoked | TokenError::Encoding(_)) => {
                AuthenticationOutcome::Rejected(AuthError::MalformedToken)
            }
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{TimeDelta, Utc};

    use super::*;
    use crate::auth::{token::DEFAULT_TOKEN_TTL, Role};

    fn setup() -> (Arc<TokenService>, TokenCredentialProvider) {
        let tokens = Arc::new(TokenService::new(
            &TokenService::generate_secret(),
            DEFAULT_TOKEN_TTL,
        ));
        let provider = TokenCredentialProvider::new(tokens.clone());
        (tokens, provider)
    }

    #[tokio::test]
    async fn valid_token_succeeds() {
        let (tokens, provider) = setup();
        let roles: BTreeSet<Role> = [Role::new("USER")].into();
        let token = tokens.issue("alice", &roles).unwrap();

        let outcome = provider
            .try_authenticate(&Credential::bearer(token.value))
            .await
            .unwrap();
        let AuthenticationOutcome::Success(principal) = outcome else {
            panic!("expected success, got {outcome:?}");
        };
        assert_eq!(principal.subject, "alice");
        assert_eq!(principal.roles, roles);
        assert_eq!(principal.origin, ProviderKind::Token);
    }

    #[tokio::test]
    async fn expired_token_is_rejected_as_expired() {
        let (tokens, provider) = setup();
        let issued = Utc::now() - TimeDelta::days(1);
        let token = tokens.issue_at("alice", &BTreeSet::new(), issued).unwrap();

        let outcome = provider
            .try_authenticate(&Credential::bearer(token.value))
            .await
            .unwrap();
        assert_eq!(outcome, AuthenticationOutcome::Rejected(AuthError::ExpiredToken));
    }

    #[tokio::test]
    async fn garbage_and_revoked_tokens_are_malformed() {
        let (tokens, provider) = setup();
        let token = tokens.issue("alice", &BTreeSet::new()).unwrap();
        tokens.revoke(&token.value).unwrap();

        for value in ["garbage".to_string(), token.value] {
            let outcome = provider
                .try_authenticate(&Credential::bearer(value))
                .await
                .unwrap();
            assert_eq!(outcome, AuthenticationOutcome::Rejected(AuthError::MalformedToken));
        }
    }

    #[tokio::test]
    async fn username_password_is_not_applicable() {
        let (_, provider) = setup();
        let cred = Credential::username_password("alice", "secret");
        assert!(!provider.applies_to(&cred));
        assert_eq!(
            provider.try_authenticate(&cred).await.unwrap(),
            AuthenticationOutcome::NotApplicable
        );
    }
}
