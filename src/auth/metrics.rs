// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process authentication counters.
//!
//! This is where the internal error classification ends up. It is exposed
//! only on the admin-gated `/metrics` endpoint.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use utoipa::ToSchema;

use super::principal::ProviderKind;
use super::AuthError;

const PROVIDER_KINDS: [ProviderKind; 3] =
    [ProviderKind::Domain, ProviderKind::Admin, ProviderKind::Token];

/// Authentication counters.
#[derive(Debug, Default)]
pub struct AuthMetrics {
    successes: [AtomicU64; PROVIDER_KINDS.len()],
    failures: [AtomicU64; AuthError::ALL.len()],
    internal_errors: AtomicU64,
}

/// Point-in-time copy of [`AuthMetrics`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AuthMetricsSnapshot {
    /// Successful authentications per provider.
    pub successes: BTreeMap<String, u64>,
    /// Failures per error code.
    pub failures: BTreeMap<String, u64>,
    /// Server-side faults during authentication.
    pub internal_errors: u64,
}

impl AuthMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a successful authentication.
    pub fn record_success(&self, origin: ProviderKind) {
        self.successes[provider_slot(origin)].fetch_add(1, Ordering::Relaxed);
    }

    /// Count a failure by classification.
    pub fn record_failure(&self, error: AuthError) {
        self.failures[failure_slot(error)].fetch_add(1, Ordering::Relaxed);
    }

    /// Count a server-side fault.
    pub fn record_internal_error(&self) {
        self.internal_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters.
    pub fn snapshot(&self) -> AuthMetricsSnapshot {
        let successes = PROVIDER_KINDS
            .iter()
            .zip(&self.successes)
            .map(|(k, n)| (k.as_str().to_string(), n.load(Ordering::Relaxed)))
            .collect();
        let failures = AuthError::ALL
            .iter()
            .zip(&self.failures)
            .map(|(e, n)| (e.error_code().to_string(), n.load(Ordering::Relaxed)))
            .collect();

        AuthMetricsSnapshot {
            successes,
            failures,
            internal_errors: self.internal_errors.load(Ordering::Relaxed),
        }
    }
}

/// Index into `PROVIDER_KINDS`.
const fn provider_slot(kind: ProviderKind) -> usize {
    match kind {
        ProviderKind::Domain => 0,
        ProviderKind::Admin => 1,
        ProviderKind::Token => 2,
    }
}

/// Index into `AuthError::ALL`.
const fn failure_slot(error: AuthError) -> usize {
    match error {
        AuthError::MissingCredential => 0,
        AuthError::UnsupportedCredentialKind => 1,
        AuthError::InvalidCredential => 2,
        AuthError::ExpiredToken => 3,
        AuthError::MalformedToken => 4,
        AuthError::ExternalServiceUnavailable => 5,
        AuthError::InsufficientRole => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_line_up_with_reported_order() {
        for (idx, kind) in PROVIDER_KINDS.into_iter().enumerate() {
            assert_eq!(provider_slot(kind), idx, "{kind}");
        }
        for (idx, error) in AuthError::ALL.into_iter().enumerate() {
            assert_eq!(failure_slot(error), idx, "{}", error.error_code());
        }
    }

    #[test]
    fn every_failure_has_its_own_counter() {
        let metrics = AuthMetrics::new();
        for error in AuthError::ALL {
            metrics.record_failure(error);
        }
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.failures.len(), AuthError::ALL.len());
        assert!(snapshot.failures.values().all(|n| *n == 1));
    }

    #[test]
    fn counts_by_classification() {
        let metrics = AuthMetrics::new();
        metrics.record_success(ProviderKind::Token);
        metrics.record_success(ProviderKind::Token);
        metrics.record_failure(AuthError::ExpiredToken);
        metrics.record_failure(AuthError::InsufficientRole);
        metrics.record_internal_error();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.successes["token"], 2);
        assert_eq!(snapshot.successes["domain"], 0);
        assert_eq!(snapshot.failures["expired_token"], 1);
        assert_eq!(snapshot.failures["insufficient_role"], 1);
        assert_eq!(snapshot.failures["missing_credential"], 0);
        assert_eq!(snapshot.internal_errors, 1);
    }

    #[test]
    fn snapshot_lists_every_code() {
        let snapshot = AuthMetrics::new().snapshot();
        assert_eq!(snapshot.successes.len(), 3);
        assert_eq!(snapshot.failures.len(), AuthError::ALL.len());
    }
}
