// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup.
//! [`Config::from_vars`] takes an explicit map so tests never touch the
//! process environment.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `SUPABASE_URL` | Supabase project URL (JWKS issuer base) | Required |
//! | `JWKS_FETCH_TIMEOUT_SECS` | HTTP timeout for the startup key fetch | `10` |
//! | `JWKS_FETCH_ATTEMPTS` | Attempts for the startup key fetch | `1` |
//! | `JWT_LEEWAY_SECS` | Clock skew tolerance for `exp` / `nbf` | `0` |
//! | `JWT_ISSUER` | Expected `iss` claim | Not checked |
//! | `JWT_AUDIENCE` | Expected `aud` claim | Not checked |
//! | `ALLOWED_ORIGINS` | Comma-separated CORS origins, or `*` | `*` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use axum::http::HeaderValue;
use url::{Host, Url};

use crate::auth::jwks::DEFAULT_FETCH_TIMEOUT;
use crate::auth::token::DEFAULT_LEEWAY_SECS;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Supabase project URL, e.g. `https://<ref>.supabase.co`.
///
/// The signing key is fetched from `<SUPABASE_URL>/auth/v1/.well-known/jwks.json`.
/// Must be `https`, except for loopback hosts used in local development.
pub const SUPABASE_URL_ENV: &str = "SUPABASE_URL";

pub const JWKS_FETCH_TIMEOUT_ENV: &str = "JWKS_FETCH_TIMEOUT_SECS";
pub const JWKS_FETCH_ATTEMPTS_ENV: &str = "JWKS_FETCH_ATTEMPTS";
pub const JWT_LEEWAY_ENV: &str = "JWT_LEEWAY_SECS";
pub const JWT_ISSUER_ENV: &str = "JWT_ISSUER";
pub const JWT_AUDIENCE_ENV: &str = "JWT_AUDIENCE";
pub const ALLOWED_ORIGINS_ENV: &str = "ALLOWED_ORIGINS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// CORS origin policy.
#[derive(Debug, Clone, PartialEq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<HeaderValue>),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub supabase_url: Url,
    pub jwks_fetch_timeout: Duration,
    pub jwks_fetch_attempts: u32,
    pub jwt_leeway_secs: u64,
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,
    pub allowed_origins: AllowedOrigins,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    /// Load configuration from an explicit variable map.
    ///
    /// Empty values are treated as unset.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let supabase_url = get(vars, SUPABASE_URL_ENV)
            .ok_or(ConfigError::Missing(SUPABASE_URL_ENV))
            .and_then(parse_issuer_url)?;

        let jwks_fetch_attempts: u32 = parse_or(vars, JWKS_FETCH_ATTEMPTS_ENV, 1)?;
        if jwks_fetch_attempts == 0 {
            return Err(invalid(JWKS_FETCH_ATTEMPTS_ENV, "must be at least 1"));
        }

        let timeout_secs: u64 =
            parse_or(vars, JWKS_FETCH_TIMEOUT_ENV, DEFAULT_FETCH_TIMEOUT.as_secs())?;
        if timeout_secs == 0 {
            return Err(invalid(JWKS_FETCH_TIMEOUT_ENV, "must be at least 1"));
        }

        Ok(Self {
            host: get(vars, HOST_ENV).unwrap_or(DEFAULT_HOST).to_string(),
            port: parse_or(vars, PORT_ENV, DEFAULT_PORT)?,
            supabase_url,
            jwks_fetch_timeout: Duration::from_secs(timeout_secs),
            jwks_fetch_attempts,
            jwt_leeway_secs: parse_or(vars, JWT_LEEWAY_ENV, DEFAULT_LEEWAY_SECS)?,
            jwt_issuer: get(vars, JWT_ISSUER_ENV).map(str::to_owned),
            jwt_audience: get(vars, JWT_AUDIENCE_ENV).map(str::to_owned),
            allowed_origins: parse_allowed_origins(get(vars, ALLOWED_ORIGINS_ENV))?,
        })
    }
}

fn get<'a>(vars: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    vars.get(name).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        name,
        reason: reason.into(),
    }
}

fn parse_or<T>(
    vars: &HashMap<String, String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(vars, name) {
        Some(raw) => raw.parse().map_err(|e: T::Err| invalid(name, e.to_string())),
        None => Ok(default),
    }
}

fn parse_issuer_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| invalid(SUPABASE_URL_ENV, e.to_string()))?;

    match url.scheme() {
        "https" => Ok(url),
        "http" if is_loopback(&url) => Ok(url),
        "http" => Err(invalid(SUPABASE_URL_ENV, "must use https for non-local hosts")),
        other => Err(invalid(SUPABASE_URL_ENV, format!("unsupported scheme `{other}`"))),
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => domain == "localhost",
        Some(Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
        Some(Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
        None => false,
    }
}

fn parse_allowed_origins(raw: Option<&str>) -> Result<AllowedOrigins, ConfigError> {
    let Some(raw) = raw else {
        return Ok(AllowedOrigins::Any);
    };
    if raw == "*" {
        return Ok(AllowedOrigins::Any);
    }

    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|e| invalid(ALLOWED_ORIGINS_ENV, format!("`{origin}`: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(AllowedOrigins::List)
}
