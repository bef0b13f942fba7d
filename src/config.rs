// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the [`GatewayConfig`] loaded
//! from them at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `ADMIN_ROLE` | Role name that designates an administrator | `ADMIN` |
//! | `ADMIN_USERNAME` | Reserved admin username | `admin` |
//! | `ADMIN_PASSWORD` | Admin secret | Required |
//! | `TOKEN_SIGNING_SECRET` | HMAC secret for issued tokens | Random per process |
//! | `TOKEN_TTL_SECS` | Token lifetime in seconds | `3600` |
//! | `IDENTITY_SERVICE_URL` | Base URL of the external identity service | Required |
//! | `IDENTITY_TIMEOUT_MS` | Bound on one identity check, retries included | `5000` |
//! | `IDENTITY_RETRIES` | Retries after the identity service is unavailable | `1` |
//! | `TLS_CERT_PATH` | PEM certificate chain (enables HTTPS with `TLS_KEY_PATH`) | Unset |
//! | `TLS_KEY_PATH` | PEM private key | Unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::auth::Role;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const ADMIN_ROLE_ENV: &str = "ADMIN_ROLE";
pub const ADMIN_USERNAME_ENV: &str = "ADMIN_USERNAME";
pub const ADMIN_PASSWORD_ENV: &str = "ADMIN_PASSWORD";
pub const TOKEN_SIGNING_SECRET_ENV: &str = "TOKEN_SIGNING_SECRET";
pub const TOKEN_TTL_SECS_ENV: &str = "TOKEN_TTL_SECS";
pub const IDENTITY_SERVICE_URL_ENV: &str = "IDENTITY_SERVICE_URL";
pub const IDENTITY_TIMEOUT_MS_ENV: &str = "IDENTITY_TIMEOUT_MS";
pub const IDENTITY_RETRIES_ENV: &str = "IDENTITY_RETRIES";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_ADMIN_ROLE: &str = "ADMIN";
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;
pub const DEFAULT_IDENTITY_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_IDENTITY_RETRIES: u32 = 1;

/// Minimum accepted length for `TOKEN_SIGNING_SECRET`.
pub const MIN_SIGNING_SECRET_LEN: usize = 32;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Certificate and key for HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Gateway configuration.
#[derive(Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// Role name that designates an administrator, compared verbatim.
    pub admin_role: Role,
    pub admin_username: String,
    pub admin_password: String,
    /// `None` means a random secret is generated at startup.
    pub token_signing_secret: Option<String>,
    pub token_ttl: Duration,
    pub identity_service_url: Url,
    pub identity_timeout: Duration,
    pub identity_retries: u32,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

impl GatewayConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let admin_password =
            get(ADMIN_PASSWORD_ENV).ok_or(ConfigError::Missing(ADMIN_PASSWORD_ENV))?;

        let identity_service_url = get(IDENTITY_SERVICE_URL_ENV)
            .ok_or(ConfigError::Missing(IDENTITY_SERVICE_URL_ENV))?;
        let identity_service_url =
            Url::parse(&identity_service_url).map_err(|e| ConfigError::Invalid {
                var: IDENTITY_SERVICE_URL_ENV,
                reason: e.to_string(),
            })?;

        let token_signing_secret = get(TOKEN_SIGNING_SECRET_ENV);
        if let Some(secret) = &token_signing_secret {
            if secret.len() < MIN_SIGNING_SECRET_LEN {
                return Err(ConfigError::Invalid {
                    var: TOKEN_SIGNING_SECRET_ENV,
                    reason: format!("must be at least {MIN_SIGNING_SECRET_LEN} bytes"),
                });
            }
        }

        let token_ttl_secs: u64 = parse_or(
            get(TOKEN_TTL_SECS_ENV),
            TOKEN_TTL_SECS_ENV,
            DEFAULT_TOKEN_TTL_SECS,
        )?;
        if token_ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                var: TOKEN_TTL_SECS_ENV,
                reason: "must be greater than zero".to_string(),
            });
        }

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing(TLS_KEY_PATH_ENV)),
            (None, Some(_)) => return Err(ConfigError::Missing(TLS_CERT_PATH_ENV)),
        };

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: LOG_FORMAT_ENV,
                    reason: format!("expected `json` or `pretty`, got `{other}`"),
                })
            }
        };

        Ok(Self {
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(get(PORT_ENV), PORT_ENV, DEFAULT_PORT)?,
            admin_role: Role::new(
                get(ADMIN_ROLE_ENV).unwrap_or_else(|| DEFAULT_ADMIN_ROLE.to_string()),
            ),
            admin_username: get(ADMIN_USERNAME_ENV)
                .unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string()),
            admin_password,
            token_signing_secret,
            token_ttl: Duration::from_secs(token_ttl_secs),
            identity_service_url,
            identity_timeout: Duration::from_millis(parse_or(
                get(IDENTITY_TIMEOUT_MS_ENV),
                IDENTITY_TIMEOUT_MS_ENV,
                DEFAULT_IDENTITY_TIMEOUT_MS,
            )?),
            identity_retries: parse_or(
                get(IDENTITY_RETRIES_ENV),
                IDENTITY_RETRIES_ENV,
                DEFAULT_IDENTITY_RETRIES,
            )?,
            tls,
            log_format,
        })
    }

    /// `host:port` to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Configuration with secrets replaced, for the `/env` endpoint.
    pub fn redacted(&self) -> BTreeMap<&'static str, String> {
        let mut view = BTreeMap::new();
        view.insert(HOST_ENV, self.host.clone());
        view.insert(PORT_ENV, self.port.to_string());
        view.insert(ADMIN_ROLE_ENV, self.admin_role.to_string());
        view.insert(ADMIN_USERNAME_ENV, self.admin_username.clone());
        view.insert(ADMIN_PASSWORD_ENV, "<redacted>".to_string());
        view.insert(
            TOKEN_SIGNING_SECRET_ENV,
            match self.token_signing_secret {
                Some(_) => "<redacted>",
                None => "<generated>",
            }
            .to_string(),
        );
        view.insert(TOKEN_TTL_SECS_ENV, self.token_ttl.as_secs().to_string());
        let mut identity_url = self.identity_service_url.clone();
        // Only fails for URLs that cannot carry credentials at all.
        let _ = identity_url.set_password(None);
        view.insert(IDENTITY_SERVICE_URL_ENV, identity_url.to_string());
        view.insert(
            IDENTITY_TIMEOUT_MS_ENV,
            self.identity_timeout.as_millis().to_string(),
        );
        view.insert(IDENTITY_RETRIES_ENV, self.identity_retries.to_string());
        if let Some(tls) = &self.tls {
            view.insert(TLS_CERT_PATH_ENV, tls.cert.display().to_string());
            view.insert(TLS_KEY_PATH_ENV, tls.key.display().to_string());
        }
        view.insert(
            LOG_FORMAT_ENV,
            match self.log_format {
                LogFormat::Pretty => "pretty",
                LogFormat::Json => "json",
            }
            .to_string(),
        );
        view
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.redacted()).finish()
    }
}

fn parse_or<T>(value: Option<String>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
    }
}
