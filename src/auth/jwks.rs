// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) resolution.
//!
//! ## Security
//!
//! - Only `kty = "EC"`, `crv = "P-256"` entries are eligible; every other
//!   entry is skipped, never used as a fallback
//! - A matching entry with undecodable coordinates is a hard failure
//! - The key is resolved once at startup; there is no background refresh
//!
//! ## Usage
//!
//! Call [`KeySetResolver::resolve`] with `SUPABASE_URL` in main.rs and hand
//! the result to the [`TokenAuthenticator`](super::TokenAuthenticator).

use std::time::Duration;

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::Deserialize;
use tracing::{info, warn};
use url::Url;

use super::error::KeySetError;
use super::key::{VerifiablePublicKey, CURVE_P256, KEY_TYPE_EC};

/// Key-set path under the issuer base URL.
pub const JWKS_PATH: &str = "/auth/v1/.well-known/jwks.json";

/// Default HTTP timeout for the key-set fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Delay before the first retry; doubles on each further attempt.
const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// One entry of the fetched key set.
///
/// Only `kty`, `crv`, `x` and `y` take part in selection. RSA and OKP entries
/// parse fine and are simply never selected.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteKeyDescriptor {
    #[serde(default)]
    pub kty: String,
    #[serde(default)]
    pub crv: Option<String>,
    #[serde(default)]
    pub x: Option<String>,
    #[serde(default)]
    pub y: Option<String>,
    #[serde(default)]
    pub kid: Option<String>,
    #[serde(default)]
    pub alg: Option<String>,
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,
}

impl RemoteKeyDescriptor {
    fn is_p256(&self) -> bool {
        self.kty == KEY_TYPE_EC && self.crv.as_deref() == Some(CURVE_P256)
    }
}

/// `{"keys": [...]}` as served by the identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct KeySetDocument {
    pub keys: Vec<RemoteKeyDescriptor>,
}

/// Fetches the issuer's key set and reconstructs its ES256 public key.
#[derive(Debug, Clone)]
pub struct KeySetResolver {
    client: reqwest::Client,
    max_attempts: u32,
    initial_backoff: Duration,
}

impl KeySetResolver {
    /// Create a resolver whose HTTP requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, KeySetError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KeySetError::Unreachable(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_attempts: 1,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
        })
    }

    /// Allow up to `attempts` fetches when the endpoint is unreachable.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Resolve the signing key published under `issuer_base_url`.
    ///
    /// Only [`KeySetError::Unreachable`] is retried. A document that parses
    /// but holds no usable key will not improve on a second fetch.
    pub async fn resolve(&self, issuer_base_url: &Url) -> Result<VerifiablePublicKey, KeySetError> {
        let jwks_url = jwks_url(issuer_base_url);
        let mut backoff = self.initial_backoff;
        let mut attempt = 1;

        loop {
            match self.fetch_key_set(&jwks_url).await {
                Ok(document) => {
                    let key = select_key(&document)?;
                    info!(
                        jwks_url = %jwks_url,
                        kid = key.key_id().unwrap_or("-"),
                        candidates = document.keys.len(),
                        "Resolved JWKS signing key"
                    );
                    return Ok(key);
                }
                Err(KeySetError::Unreachable(reason)) if attempt < self.max_attempts => {
                    warn!(
                        jwks_url = %jwks_url,
                        attempt,
                        max_attempts = self.max_attempts,
                        retry_in_ms = backoff.as_millis() as u64,
                        error = %reason,
                        "JWKS fetch failed, will retry"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Fetch and parse the key-set document.
    async fn fetch_key_set(&self, jwks_url: &str) -> Result<KeySetDocument, KeySetError> {
        let response = self
            .client
            .get(jwks_url)
            .send()
            .await
            .map_err(|e| KeySetError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(KeySetError::Unreachable(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| KeySetError::Unreachable(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| KeySetError::Malformed(e.to_string()))
    }
}

/// The key-set URL for an issuer base URL. A trailing slash is tolerated.
pub fn jwks_url(issuer_base_url: &Url) -> String {
    format!("{}{JWKS_PATH}", issuer_base_url.as_str().trim_end_matches('/'))
}

/// Pick the first EC P-256 entry and build its key.
pub fn select_key(document: &KeySetDocument) -> Result<VerifiablePublicKey, KeySetError> {
    let descriptor = document
        .keys
        .iter()
        .find(|k| k.is_p256())
        .ok_or(KeySetError::NoMatchingKey)?;

    let x = decode_coordinate("x", descriptor.x.as_deref())?;
    let y = decode_coordinate("y", descriptor.y.as_deref())?;

    let key = VerifiablePublicKey::from_coordinates(&x, &y)?;
    Ok(match &descriptor.kid {
        Some(kid) => key.with_key_id(kid.clone()),
        None => key,
    })
}

fn decode_coordinate(name: &str, encoded: Option<&str>) -> Result<Vec<u8>, KeySetError> {
    let encoded = encoded.ok_or_else(|| {
        KeySetError::Malformed(format!("matching key has no {name} coordinate"))
    })?;

    Base64UrlUnpadded::decode_vec(encoded)
        .map_err(|e| KeySetError::Malformed(format!("failed to decode {name} coordinate: {e}")))
}
