// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::auth::{
    external::{ExternalAuthError, ExternalIdentityAuthenticator, HttpIdentityAuthenticator},
    providers::{
        domain::attempt_timeout, AdminCredentialProvider, DomainCredentialProvider,
        TokenCredentialProvider,
    },
    AuthMetrics, AuthenticationChain, FilterState, GuardConfig, GuardState, TokenService,
};
use crate::config::GatewayConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub tokens: Arc<TokenService>,
    pub chain: Arc<AuthenticationChain>,
    pub metrics: Arc<AuthMetrics>,
    pub guard: GuardConfig,
    /// Cancelled to stop the server (signal or `/shutdown`).
    pub shutdown: CancellationToken,
    pub started_at: Instant,
}

impl AppState {
    /// Build state with the HTTP identity service client from `config`.
    ///
    /// Each HTTP call gets an equal share of the identity timeout so that
    /// retries fit inside it.
    pub fn from_config(config: GatewayConfig) -> Result<Self, ExternalAuthError> {
        let per_call = attempt_timeout(config.identity_timeout, config.identity_retries);
        let authenticator = HttpIdentityAuthenticator::new(&config.identity_service_url, per_call)?;
        Ok(Self::with_authenticator(config, Arc::new(authenticator)))
    }

    /// Build state around any identity service implementation.
    pub fn with_authenticator(
        config: GatewayConfig,
        authenticator: Arc<dyn ExternalIdentityAuthenticator>,
    ) -> Self {
        let tokens = Arc::new(match &config.token_signing_secret {
            Some(secret) => TokenService::new(secret.as_bytes(), config.token_ttl),
            None => {
                tracing::warn!(
                    "No token signing secret configured; generated one for this process. \
                     Issued tokens will not survive a restart."
                );
                TokenService::new(&TokenService::generate_secret(), config.token_ttl)
            }
        });

        let domain = DomainCredentialProvider::new(
            authenticator,
            tokens.clone(),
            config.admin_username.clone(),
            config.identity_timeout,
        )
        .with_retries(config.identity_retries);
        let admin = AdminCredentialProvider::new(
            config.admin_username.clone(),
            &config.admin_password,
            config.admin_role.clone(),
        );
        let token = TokenCredentialProvider::new(tokens.clone());

        Self {
            guard: GuardConfig::new(config.admin_role.clone()),
            chain: Arc::new(AuthenticationChain::standard(domain, admin, token)),
            tokens,
            metrics: Arc::new(AuthMetrics::new()),
            config: Arc::new(config),
            shutdown: CancellationToken::new(),
            started_at: Instant::now(),
        }
    }

    pub fn filter_state(&self) -> FilterState {
        FilterState::new(self.chain.clone(), self.metrics.clone())
    }

    pub fn guard_state(&self) -> GuardState {
        GuardState {
            config: self.guard.clone(),
            metrics: self.metrics.clone(),
        }
    }
}
