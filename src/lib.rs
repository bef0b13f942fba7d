// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Auth Gateway - authentication front door for HTTP services
//!
//! Every request is authenticated by an ordered chain of credential providers
//! before it reaches a handler. Operational endpoints are further restricted
//! to the administrator role.
//!
//! ## Modules
//!
//! - `api` - HTTP routes, session and management handlers (Axum)
//! - `auth` - Credential extraction, provider chain, tokens and the admin guard
//! - `config` - Environment-driven configuration
//! - `state` - Shared application state

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod state;
