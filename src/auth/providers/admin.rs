// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Administrative username/password provider.
//!
//! Checks a single, locally configured credential and never calls out, so
//! operators can still log in while the identity service is down.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::{AuthenticationOutcome, AuthenticationProvider, ProviderFailure};
use crate::auth::{AuthError, Credential, Principal, ProviderKind, Role, TokenService};

type HmacSha256 = Hmac<Sha256>;

/// Provider for the reserved administrator account.
pub struct AdminCredentialProvider {
    username: String,
    /// Per-process HMAC key.
    key: [u8; 32],
    /// HMAC of the configured secret; compared in constant time.
    secret_tag: Vec<u8>,
    admin_role: Role,
}

impl AdminCredentialProvider {
    /// Create a provider for `username`/`secret`, granting `admin_role`.
    pub fn new(username: impl Into<String>, secret: &str, admin_role: Role) -> Self {
        let key = TokenService::generate_secret();

        let secret_tag = mac(&key, secret)
            .map(|m| m.finalize().into_bytes().to_vec())
            .unwrap_or_default();

        Self {
            username: username.into(),
            key,
            secret_tag,
            admin_role,
        }
    }

    /// The reserved admin username.
    pub fn username(&self) -> &str {
        &self.username
    }

    fn secret_matches(&self, secret: &str) -> bool {
        match mac(&self.key, secret) {
            Some(m) => !self.secret_tag.is_empty() && m.verify_slice(&self.secret_tag).is_ok(),
            None => false,
        }
    }
}

fn mac(key: &[u8], secret: &str) -> Option<HmacSha256> {
    let mut m = <HmacSha256 as Mac>::new_from_slice(key).ok()?;
    m.update(secret.as_bytes());
    Some(m)
}

#[async_trait]
impl AuthenticationProvider for AdminCredentialProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Admin
    }

    fn applies_to(&self, credential: &Credential) -> bool {
        matches!(
            credential,
            Credential::UsernamePassword { username, .. } if *username == self.username
        )
    }

    async fn try_authenticate(
        &self,
        credential: &Credential,
    ) -> Result<AuthenticationOutcome, ProviderFailure> {
        let Credential::UsernamePassword { username, secret } = credential else {
            return Ok(AuthenticationOutcome::NotApplicable);
        };
        if *username != self.username {
            return Ok(AuthenticationOutcome::NotApplicable);
        }

        if !self.secret_matches(secret) {
            return Ok(AuthenticationOutcome::Rejected(AuthError::InvalidCredential));
        }

        Ok(AuthenticationOutcome::Success(Principal::new(
            username.clone(),
            [self.admin_role.clone()],
            ProviderKind::Admin,
        )))
    }
}
