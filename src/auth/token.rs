// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token issuance and validation.
//!
//! Tokens are HS256-signed JWTs carrying the subject, roles, issue time,
//! expiry and a unique id. They are self-describing: validation is a local
//! signature check plus a clock comparison and never calls the identity
//! service.
//!
//! ## Revocation
//!
//! `revoke` records a token id until the token would have expired anyway.
//! The list lives in process memory only; a restart forgets it, which is
//! acceptable because tokens signed with a generated secret die with the
//! process as well.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::principal::{Principal, ProviderKind};
use super::roles::Role;

/// Default token lifetime (1 hour).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);

/// Token service errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// The token cannot be decoded or its signature does not verify.
    #[error("token is malformed")]
    Malformed,

    /// The token is past its expiry.
    #[error("token has expired")]
    Expired,

    /// The token was explicitly revoked.
    #[error("token has been revoked")]
    Revoked,

    /// Signing failed while issuing a token.
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// Claims embedded in every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenClaims {
    /// Subject
    sub: String,
    /// Role names
    #[serde(default)]
    roles: Vec<String>,
    /// Issued at (Unix seconds)
    iat: i64,
    /// Expiration (Unix seconds)
    exp: i64,
    /// Unique token id
    jti: Uuid,
}

/// An issued token together with its decoded fields.
#[derive(Clone, PartialEq)]
pub struct Token {
    /// Opaque string handed to the client.
    pub value: String,
    /// Unique token id (`jti`).
    pub id: Uuid,
    /// Subject the token was issued for.
    pub subject: String,
    /// Roles granted at issue time.
    pub roles: BTreeSet<Role>,
    /// Issue time, truncated to whole seconds.
    pub issued_at: DateTime<Utc>,
    /// Expiry, truncated to whole seconds.
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("id", &self.id)
            .field("subject", &self.subject)
            .field("roles", &self.roles)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Issues, validates and revokes tokens.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    /// Revoked token ids mapped to their expiry (Unix seconds).
    revoked: RwLock<HashMap<Uuid, i64>>,
}

impl TokenService {
    /// Create a token service with an HMAC secret and a fixed lifetime.
    ///
    /// The secret should be at least 32 bytes.
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
            revoked: RwLock::new(HashMap::new()),
        }
    }

    /// Generate a random 256-bit secret key.
    #[must_use]
    pub fn generate_secret() -> [u8; 32] {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes
    }

    /// Configured token lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `subject` with `roles`, valid from now.
    pub fn issue(&self, subject: &str, roles: &BTreeSet<Role>) -> Result<Token, TokenError> {
        self.issue_at(subject, roles, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        subject: &str,
        roles: &BTreeSet<Role>,
        now: DateTime<Utc>,
    ) -> Result<Token, TokenError> {
        let iat = now.timestamp();
        let ttl_secs = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let exp = iat.saturating_add(ttl_secs);

        let claims = TokenClaims {
            sub: subject.to_string(),
            roles: roles.iter().map(|r| r.as_str().to_string()).collect(),
            iat,
            exp,
            jti: Uuid::new_v4(),
        };

        let value = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;

        Ok(Token {
            value,
            id: claims.jti,
            subject: claims.sub,
            roles: roles.clone(),
            issued_at: timestamp(iat)?,
            expires_at: timestamp(exp)?,
        })
    }

    /// Validate a token string and return the principal it encodes.
    pub fn validate(&self, value: &str) -> Result<Principal, TokenError> {
        self.validate_at(value, Utc::now())
    }

    /// Validate a token as if the current time were `now`.
    pub fn validate_at(&self, value: &str, now: DateTime<Utc>) -> Result<Principal, TokenError> {
        let claims = self.decode_verified(value)?;

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        if self.is_revoked(&claims.jti) {
            return Err(TokenError::Revoked);
        }

        Ok(Principal::new(
            claims.sub,
            claims.roles.into_iter().map(Role::from),
            ProviderKind::Token,
        ))
    }

    /// Revoke a token so that later validations fail.
    ///
    /// Revoking an already expired token is a no-op. Revoking the same
    /// token twice keeps the first entry.
    pub fn revoke(&self, value: &str) -> Result<(), TokenError> {
        self.revoke_at(value, Utc::now())
    }

    /// Revoke a token as if the current time were `now`.
    ///
    /// Entries whose token has expired by `now` are purged.
    pub fn revoke_at(&self, value: &str, now: DateTime<Utc>) -> Result<(), TokenError> {
        let claims = self.decode_verified(value)?;
        let now = now.timestamp();
        if now >= claims.exp {
            return Ok(());
        }

        let mut revoked = self.revoked.write().unwrap_or_else(PoisonError::into_inner);
        revoked.retain(|_, exp| *exp > now);
        revoked.entry(claims.jti).or_insert(claims.exp);
        Ok(())
    }

    /// Number of revocations currently remembered.
    pub fn revoked_count(&self) -> usize {
        self.revoked
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn is_revoked(&self, id: &Uuid) -> bool {
        self.revoked
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    /// Check signature and structure; expiry is checked by the caller so
    /// that the boundary (`now >= exp` is expired) is exact.
    fn decode_verified(&self, value: &str) -> Result<TokenClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<TokenClaims>(value, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .field("revoked", &self.revoked_count())
            .finish_non_exhaustive()
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, TokenError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| TokenError::Encoding(format!("timestamp out of range: {secs}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn service() -> TokenService {
        TokenService::new(&TokenService::generate_secret(), DEFAULT_TOKEN_TTL)
    }

    fn roles(names: &[&str]) -> BTreeSet<Role> {
        names.iter().copied().map(Role::from).collect()
    }

    #[test]
    fn issue_then_validate_round_trips() {
        let tokens = service();
        let token = tokens.issue("alice", &roles(&["USER", "AUDITOR"])).unwrap();

        let principal = tokens.validate(&token.value).unwrap();
        assert_eq!(principal.subject, "alice");
        assert_eq!(principal.roles, roles(&["USER", "AUDITOR"]));
        assert_eq!(principal.origin, ProviderKind::Token);
        assert!(principal.issued_token.is_none());
    }

    #[test]
    fn token_carries_ttl_policy() {
        let tokens = service();
        let token = tokens.issue("alice", &BTreeSet::new()).unwrap();
        assert_eq!(
            token.expires_at - token.issued_at,
            TimeDelta::seconds(DEFAULT_TOKEN_TTL.as_secs() as i64)
        );
    }

    #[test]
    fn tokens_are_unique() {
        let tokens = service();
        let now = Utc::now();
        let a = tokens.issue_at("alice", &BTreeSet::new(), now).unwrap();
        let b = tokens.issue_at("alice", &BTreeSet::new(), now).unwrap();
        assert_ne!(a.value, b.value);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = service();
        let issued = Utc::now() - TimeDelta::hours(2);
        let token = tokens.issue_at("alice", &BTreeSet::new(), issued).unwrap();

        assert_eq!(tokens.validate(&token.value), Err(TokenError::Expired));
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let tokens = service();
        let token = tokens.issue("alice", &BTreeSet::new()).unwrap();

        let just_before = token.expires_at - TimeDelta::seconds(1);
        assert!(tokens.validate_at(&token.value, just_before).is_ok());
        assert_eq!(
            tokens.validate_at(&token.value, token.expires_at),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn token_from_another_key_is_malformed() {
        let ours = service();
        let theirs = service();
        let token = theirs.issue("mallory", &roles(&["ADMIN"])).unwrap();

        assert_eq!(ours.validate(&token.value), Err(TokenError::Malformed));
    }

    #[test]
    fn expired_token_from_another_key_is_malformed() {
        let ours = service();
        let theirs = service();
        let issued = Utc::now() - TimeDelta::hours(2);
        let token = theirs.issue_at("mallory", &BTreeSet::new(), issued).unwrap();

        assert_eq!(ours.validate(&token.value), Err(TokenError::Malformed));
    }

    #[test]
    fn garbage_is_malformed() {
        let tokens = service();
        assert_eq!(tokens.validate(""), Err(TokenError::Malformed));
        assert_eq!(tokens.validate("not-a-token"), Err(TokenError::Malformed));
        assert_eq!(tokens.validate("a.b.c"), Err(TokenError::Malformed));
    }

    #[test]
    fn tampered_token_is_malformed() {
        let tokens = service();
        let token = tokens.issue("alice", &roles(&["USER"])).unwrap();
        let mut parts: Vec<&str> = token.value.split('.').collect();
        let forged_claims = tokens.issue("alice", &roles(&["ADMIN"])).unwrap();
        let forged_payload = forged_claims.value.split('.').nth(1).unwrap().to_string();
        parts[1] = &forged_payload;

        assert_eq!(tokens.validate(&parts.join(".")), Err(TokenError::Malformed));
    }

    #[test]
    fn revoked_token_is_rejected() {
        let tokens = service();
        let token = tokens.issue("alice", &BTreeSet::new()).unwrap();
        let other = tokens.issue("alice", &BTreeSet::new()).unwrap();

        tokens.revoke(&token.value).unwrap();
        tokens.revoke(&token.value).unwrap();

        assert_eq!(tokens.validate(&token.value), Err(TokenError::Revoked));
        assert!(tokens.validate(&other.value).is_ok());
        assert_eq!(tokens.revoked_count(), 1);
    }

    #[test]
    fn revoking_expired_token_is_noop() {
        let tokens = service();
        let issued = Utc::now() - TimeDelta::hours(2);
        let token = tokens.issue_at("alice", &BTreeSet::new(), issued).unwrap();

        tokens.revoke(&token.value).unwrap();
        assert_eq!(tokens.revoked_count(), 0);
    }

    #[test]
    fn generated_secrets_are_distinct() {
        let a = TokenService::generate_secret();
        let b = TokenService::generate_secret();
        assert_ne!(a, b);
        assert_ne!(a, [0u8; 32]);
    }

    #[test]
    fn expired_revocations_are_purged() {
        let tokens = TokenService::new(&TokenService::generate_secret(), Duration::from_secs(60));
        let start = Utc::now();
        let short_lived = tokens.issue_at("alice", &BTreeSet::new(), start).unwrap();
        tokens.revoke_at(&short_lived.value, start).unwrap();
        assert_eq!(tokens.revoked_count(), 1);

        let later = start + TimeDelta::seconds(61);
        let fresh = tokens.issue_at("bob", &BTreeSet::new(), later).unwrap();
        tokens.revoke_at(&fresh.value, later).unwrap();

        assert_eq!(tokens.revoked_count(), 1);
        assert_eq!(
            tokens.validate_at(&fresh.value, later),
            Err(TokenError::Revoked)
        );
    }

    #[test]
    fn revoking_garbage_fails() {
        let tokens = service();
        assert_eq!(tokens.revoke("nope"), Err(TokenError::Malformed));
    }

    #[test]
    fn debug_does_not_leak_token_value() {
        let tokens = service();
        let token = tokens.issue("alice", &BTreeSet::new()).unwrap();
        let debug = format!("{token:?}");
        assert!(!debug.contains(&token.value));
        assert!(debug.contains("alice"));
    }
}
