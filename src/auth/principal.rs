// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The authenticated identity attached to a request.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;
use super::token::Token;

/// Which provider established a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Username/password verified by the external identity service.
    Domain,
    /// The locally configured administrative credential.
    Admin,
    /// A token previously issued by the token service.
    Token,
}

impl ProviderKind {
    /// Stable lowercase name, used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Domain => "domain",
            ProviderKind::Admin => "admin",
            ProviderKind::Token => "token",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated identity.
///
/// Lives in the request extensions for the duration of one request and is
/// never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    /// Canonical subject identifier.
    pub subject: String,

    /// Roles granted to the subject.
    pub roles: BTreeSet<Role>,

    /// Provider that authenticated the subject.
    pub origin: ProviderKind,

    /// Token minted during this authentication, if any.
    ///
    /// Only domain logins mint a token; the login endpoint hands it back
    /// to the caller for use on subsequent requests.
    pub issued_token: Option<Token>,
}

impl Principal {
    /// Create a principal without an issued token.
    pub fn new(
        subject: impl Into<String>,
        roles: impl IntoIterator<Item = Role>,
        origin: ProviderKind,
    ) -> Self {
        Self {
            subject: subject.into(),
            roles: roles.into_iter().collect(),
            origin,
            issued_token: None,
        }
    }

    /// Attach the token minted for this principal.
    pub fn with_issued_token(mut self, token: Token) -> Self {
        self.issued_token = Some(token);
        self
    }

    /// Check whether the principal holds `role` (exact match).
    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }
}
