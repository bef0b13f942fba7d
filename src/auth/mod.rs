// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Establishes a [`Principal`] for every request and gates management
//! endpoints on the administrator role.
//!
//! ## Auth Flow
//!
//! 1. Client sends `Authorization: Basic <user:secret>` or
//!    `Authorization: Bearer <token>`
//! 2. The credential extraction filter parses the header and asks the
//!    provider chain, in order:
//!    - domain provider (external identity service, mints a token)
//!    - admin provider (local admin credential, reserved username only)
//!    - token provider (tokens minted by the domain provider)
//! 3. On success the principal goes into the request extensions
//! 4. The management endpoint guard checks the admin role on management paths
//!
//! ## Security
//!
//! - Every endpoint requires authentication; no sessions are kept
//! - All authentication failures produce the same bare `401`
//! - Role failures on management endpoints produce a bare `403`
//! - Admin login never depends on the identity service

pub mod chain;
pub mod credential;
pub mod entry_point;
pub mod error;
pub mod external;
pub mod extractor;
pub mod guard;
pub mod metrics;
pub mod middleware;
pub mod principal;
pub mod providers;
pub mod roles;
pub mod token;

pub use chain::AuthenticationChain;
pub use credential::Credential;
pub use error::AuthError;
pub use extractor::Auth;
pub use guard::{GuardConfig, GuardState, MANAGEMENT_ENDPOINTS};
pub use metrics::AuthMetrics;
pub use middleware::FilterState;
pub use principal::{Principal, ProviderKind};
pub use roles::Role;
pub use token::{Token, TokenError, TokenService};
