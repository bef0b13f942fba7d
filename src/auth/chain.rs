// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The ordered provider chain.
//!
//! Providers are asked in order. The first one that answers `Success` or
//! `Rejected` decides; a rejection does not fall through to later providers.
//! If nobody applies, the credential kind is unsupported. A provider failure
//! aborts the chain on the spot.

use std::sync::Arc;

use super::credential::Credential;
use super::principal::ProviderKind;
use super::providers::{
    AdminCredentialProvider, AuthenticationOutcome, AuthenticationProvider,
    DomainCredentialProvider, ProviderFailure, TokenCredentialProvider,
};
use super::AuthError;

/// Ordered list of authentication providers.
#[derive(Clone)]
pub struct AuthenticationChain {
    providers: Vec<Arc<dyn AuthenticationProvider>>,
}

impl AuthenticationChain {
    /// Build a chain from providers in the order they should be asked.
    pub fn new(providers: Vec<Arc<dyn AuthenticationProvider>>) -> Self {
        Self { providers }
    }

    /// The standard chain: domain, then admin, then token.
    pub fn standard(
        domain: DomainCredentialProvider,
        admin: AdminCredentialProvider,
        token: TokenCredentialProvider,
    ) -> Self {
        let providers: Vec<Arc<dyn AuthenticationProvider>> =
            vec![Arc::new(domain), Arc::new(admin), Arc::new(token)];
        Self::new(providers)
    }

    /// Provider kinds in chain order.
    pub fn provider_kinds(&self) -> Vec<ProviderKind> {
        self.providers.iter().map(|p| p.kind()).collect()
    }

    /// Providers that would handle `credential`.
    pub fn applicable_providers(&self, credential: &Credential) -> Vec<ProviderKind> {
        self.providers
            .iter()
            .filter(|p| p.applies_to(credential))
            .map(|p| p.kind())
            .collect()
    }

    /// Authenticate a credential.
    ///
    /// Never returns `NotApplicable`: an unclaimed credential becomes
    /// `Rejected(UnsupportedCredentialKind)`.
    pub async fn authenticate(
        &self,
        credential: &Credential,
    ) -> Result<AuthenticationOutcome, ProviderFailure> {
        for provider in &self.providers {
            match provider.try_authenticate(credential).await? {
                AuthenticationOutcome::NotApplicable => continue,
                decided => {
                    tracing::debug!(
                        provider = provider.kind().as_str(),
                        credential = credential.kind(),
                        success = matches!(decided, AuthenticationOutcome::Success(_)),
                        "Authentication decided"
                    );
                    return Ok(decided);
                }
            }
        }

        Ok(AuthenticationOutcome::Rejected(
            AuthError::UnsupportedCredentialKind,
        ))
    }
}

impl std::fmt::Debug for AuthenticationChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationChain")
            .field("providers", &self.provider_kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::auth::{
        providers::domain::tests::StubIdentityService, token::DEFAULT_TOKEN_TTL, Role,
        TokenService,
    };

    const ADMIN_USER: &str = "root";
    const ADMIN_SECRET: &str = "admin-secret";

    fn chain_with(stub: Arc<StubIdentityService>) -> (Arc<TokenService>, AuthenticationChain) {
        let tokens = Arc::new(TokenService::new(
            &TokenService::generate_secret(),
            DEFAULT_TOKEN_TTL,
        ));
        let chain = AuthenticationChain::standard(
            DomainCredentialProvider::new(stub, tokens.clone(), ADMIN_USER, Duration::from_secs(1)),
            AdminCredentialProvider::new(ADMIN_USER, ADMIN_SECRET, Role::new("ADMIN")),
            TokenCredentialProvider::new(tokens.clone()),
        );
        (tokens, chain)
    }

    fn success(outcome: AuthenticationOutcome) -> crate::auth::Principal {
        match outcome {
            AuthenticationOutcome::Success(p) => p,
            other => panic!("expected success, got {other:?}"),
        }
    }

    /// Provider that records calls and always answers the same.
    struct Fixed {
        kind: ProviderKind,
        answer: AuthenticationOutcome,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn new(kind: ProviderKind, answer: AuthenticationOutcome) -> Arc<Self> {
            Arc::new(Self {
                kind,
                answer,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl AuthenticationProvider for Fixed {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        fn applies_to(&self, _credential: &Credential) -> bool {
            self.answer != AuthenticationOutcome::NotApplicable
        }

        async fn try_authenticate(
            &self,
            _credential: &Credential,
        ) -> Result<AuthenticationOutcome, ProviderFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer.clone())
        }
    }

    #[test]
    fn standard_order_is_domain_admin_token() {
        let (_, chain) = chain_with(Arc::new(StubIdentityService::default()));
        assert_eq!(
            chain.provider_kinds(),
            vec![ProviderKind::Domain, ProviderKind::Admin, ProviderKind::Token]
        );
    }

    #[tokio::test]
    async fn domain_user_gets_principal_without_admin_role() {
        let stub = Arc::new(StubIdentityService::default().with_user("alice", "pw", &["USER"]));
        let (_, chain) = chain_with(stub);

        let principal = success(
            chain
                .authenticate(&Credential::username_password("alice", "pw"))
                .await
                .unwrap(),
        );
        assert_eq!(principal.subject, "alice");
        assert!(!principal.has_role(&Role::new("ADMIN")));
        assert_eq!(principal.origin, ProviderKind::Domain);
    }

    #[tokio::test]
    async fn admin_login_works_while_identity_service_is_down() {
        let stub = Arc::new(StubIdentityService::unavailable());
        let (_, chain) = chain_with(stub.clone());

        let principal = success(
            chain
                .authenticate(&Credential::username_password(ADMIN_USER, ADMIN_SECRET))
                .await
                .unwrap(),
        );
        assert!(principal.has_role(&Role::new("ADMIN")));
        assert_eq!(principal.origin, ProviderKind::Admin);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn wrong_admin_secret_never_reaches_identity_service() {
        let stub = Arc::new(StubIdentityService::default().with_user(ADMIN_USER, "other", &[]));
        let (_, chain) = chain_with(stub.clone());

        let outcome = chain
            .authenticate(&Credential::username_password(ADMIN_USER, "other"))
            .await
            .unwrap();
        assert_eq!(outcome, AuthenticationOutcome::Rejected(AuthError::InvalidCredential));
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn issued_token_authenticates_later_requests() {
        let stub = Arc::new(StubIdentityService::default().with_user("alice", "pw", &["USER"]));
        let (_, chain) = chain_with(stub.clone());

        let login = success(
            chain
                .authenticate(&Credential::username_password("alice", "pw"))
                .await
                .unwrap(),
        );
        let token = login.issued_token.unwrap();

        let principal = success(
            chain
                .authenticate(&Credential::bearer(token.value))
                .await
                .unwrap(),
        );
        assert_eq!(principal.subject, "alice");
        assert_eq!(principal.roles, login.roles);
        assert_eq!(principal.origin, ProviderKind::Token);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unavailable_aborts_the_chain() {
        let stub = Arc::new(StubIdentityService::unavailable());
        let (_, chain) = chain_with(stub);

        let result = chain
            .authenticate(&Credential::username_password("alice", "pw"))
            .await;
        assert!(matches!(
            result,
            Err(ProviderFailure::ExternalServiceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn rejection_does_not_fall_through() {
        let first = Fixed::new(
            ProviderKind::Domain,
            AuthenticationOutcome::Rejected(AuthError::InvalidCredential),
        );
        let second = Fixed::new(
            ProviderKind::Admin,
            AuthenticationOutcome::Success(crate::auth::Principal::new(
                "x",
                [],
                ProviderKind::Admin,
            )),
        );
        let chain = AuthenticationChain::new(vec![
            first.clone() as Arc<dyn AuthenticationProvider>,
            second.clone(),
        ]);

        let outcome = chain
            .authenticate(&Credential::username_password("x", "y"))
            .await
            .unwrap();
        assert_eq!(outcome, AuthenticationOutcome::Rejected(AuthError::InvalidCredential));
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn nobody_applicable_is_unsupported() {
        let only = Fixed::new(ProviderKind::Token, AuthenticationOutcome::NotApplicable);
        let chain = AuthenticationChain::new(vec![only.clone() as Arc<dyn AuthenticationProvider>]);

        let outcome = chain.authenticate(&Credential::bearer("t")).await.unwrap();
        assert_eq!(
            outcome,
            AuthenticationOutcome::Rejected(AuthError::UnsupportedCredentialKind)
        );
        assert_eq!(only.calls.load(Ordering::SeqCst), 1);

        let empty = AuthenticationChain::new(Vec::new());
        assert_eq!(
            empty.authenticate(&Credential::bearer("t")).await.unwrap(),
            AuthenticationOutcome::Rejected(AuthError::UnsupportedCredentialKind)
        );
    }

    #[tokio::test]
    async fn bad_token_is_rejected_by_token_provider() {
        let (_, chain) = chain_with(Arc::new(StubIdentityService::default()));
        let outcome = chain.authenticate(&Credential::bearer("junk")).await.unwrap();
        assert_eq!(outcome, AuthenticationOutcome::Rejected(AuthError::MalformedToken));
    }

    #[test]
    fn exactly_one_of_domain_or_admin_applies_to_every_username() {
        let (_, chain) = chain_with(Arc::new(StubIdentityService::default()));

        let mut usernames: Vec<String> = vec![
            String::new(),
            ADMIN_USER.to_string(),
            ADMIN_USER.to_uppercase(),
            format!(" {ADMIN_USER}"),
            format!("{ADMIN_USER} "),
            format!("{ADMIN_USER}\0"),
            "alice".to_string(),
            "röot".to_string(),
        ];
        // Every short string over a small alphabet that includes the admin name's letters.
        let alphabet = ['r', 'o', 't', 'R', ':', ' '];
        let mut frontier = vec![String::new()];
        for _ in 0..4 {
            let mut next = Vec::new();
            for prefix in &frontier {
                for c in alphabet {
                    let mut s = prefix.clone();
                    s.push(c);
                    next.push(s);
                }
            }
            usernames.extend(next.iter().cloned());
            frontier = next;
        }

        for username in usernames {
            for secret in ["", ADMIN_SECRET, "pw"] {
                let cred = Credential::username_password(username.clone(), secret);
                let applicable = chain.applicable_providers(&cred);
                assert_eq!(applicable.len(), 1, "{username:?} -> {applicable:?}");
                assert_ne!(applicable[0], ProviderKind::Token);
            }
        }

        assert_eq!(
            chain.applicable_providers(&Credential::bearer("anything")),
            vec![ProviderKind::Token]
        );
    }

    #[test]
    fn provider_failures_classify() {
        let failure = ProviderFailure::ExternalServiceUnavailable("down".into());
        assert_eq!(failure.auth_error(), Some(AuthError::ExternalServiceUnavailable));

        let failure = ProviderFailure::from(crate::auth::TokenError::Encoding("boom".into()));
        assert_eq!(failure.auth_error(), None);
    }
}
