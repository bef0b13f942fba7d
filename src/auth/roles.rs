// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Roles carried by principals.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A role name attached to a principal.
///
/// Roles are opaque strings handed to us by the identity service or by
/// configuration. Comparison is exact: `ADMIN` and `admin` are different
/// roles. Which role designates an administrator is decided by
/// [`GuardConfig`](super::guard::GuardConfig), not by this type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    /// Create a role from its name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The role name as given.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Role {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Role {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_is_exact() {
        assert_eq!(Role::new("ADMIN"), Role::from("ADMIN"));
        assert_ne!(Role::new("ADMIN"), Role::new("admin"));
        assert_ne!(Role::new("ADMIN"), Role::new("ADMIN "));
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&Role::new("operator")).unwrap();
        assert_eq!(json, r#""operator""#);

        let role: Role = serde_json::from_str(r#""USER""#).unwrap();
        assert_eq!(role.as_str(), "USER");
    }
}
