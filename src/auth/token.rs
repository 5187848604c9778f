// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token verification.
//!
//! Verification order:
//!
//! 1. Parse the envelope (three base64url segments, JSON header and payload)
//! 2. Pin the algorithm: the header must declare exactly `ES256`
//! 3. Check the signature with the held key
//! 4. Check `exp` / `nbf` against the supplied time
//! 5. Check `iss` / `aud` when configured
//! 6. Require a `sub`
//!
//! Nothing here performs I/O. The only shared state is the read-only key.

use std::sync::Arc;

use base64ct::{Base64UrlUnpadded, Encoding};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Validation};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::claims::{audience_claim, numeric_claim, string_claim, subject_claim, TokenClaims};
use super::error::AuthError;
use super::key::{VerifiablePublicKey, PINNED_ALGORITHM, PINNED_ALGORITHM_NAME};

/// Default clock skew tolerance: none.
pub const DEFAULT_LEEWAY_SECS: u64 = 0;

/// The part of the JOSE header read before the signature is trusted.
#[derive(Debug, Deserialize)]
struct JoseHeader {
    alg: String,
}

/// A token's header and payload, decoded but not yet trusted.
struct Envelope {
    header: JoseHeader,
    payload: Value,
}

/// Verifies bearer tokens against a single pinned ES256 key.
#[derive(Debug, Clone)]
pub struct TokenAuthenticator {
    key: Arc<VerifiablePublicKey>,
    leeway: i64,
    issuer: Option<String>,
    audience: Option<String>,
}

impl TokenAuthenticator {
    pub fn new(key: Arc<VerifiablePublicKey>) -> Self {
        Self {
            key,
            leeway: DEFAULT_LEEWAY_SECS as i64,
            issuer: None,
            audience: None,
        }
    }

    /// Tolerate clocks that disagree by up to `seconds`.
    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.leeway = i64::try_from(seconds).unwrap_or(i64::MAX);
        self
    }

    /// Require `iss` to equal `issuer`.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Require `aud` to contain `audience`.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn key(&self) -> &VerifiablePublicKey {
        &self.key
    }

    /// Verify `token` against the current time.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }

    /// Verify `token` as if the current time were `now` (Unix seconds).
    pub fn verify_at(&self, token: &str, now: i64) -> Result<TokenClaims, AuthError> {
        let envelope = parse_envelope(token)?;

        ensure_pinned_algorithm(&envelope.header.alg)?;
        self.verify_signature(token)?;

        let Value::Object(payload) = envelope.payload else {
            return Err(AuthError::InvalidClaims);
        };

        self.validate_time(&payload, now)?;
        self.validate_issuer(&payload)?;
        self.validate_audience(&payload)?;

        let sub = subject_claim(&payload)?;
        TokenClaims::from_verified(sub, payload)
    }

    /// Signature check only. Time and audience rules are applied by
    /// [`Self::verify_at`] so that they can run against an injected clock.
    fn verify_signature(&self, token: &str) -> Result<(), AuthError> {
        let mut validation = Validation::new(PINNED_ALGORITHM);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        decode::<Value>(token, self.key.decoding_key(), &validation)
            .map(|_| ())
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidAlgorithm | ErrorKind::MissingAlgorithm => {
                    AuthError::AlgorithmMismatch(PINNED_ALGORITHM_NAME.to_string())
                }
                // The envelope parse only read `alg` from the header, so a
                // JSON error is a mistyped field such as `kid` or `typ`.
                ErrorKind::Base64(_)
                | ErrorKind::Utf8(_)
                | ErrorKind::Json(_)
                | ErrorKind::InvalidToken => AuthError::MalformedToken,
                _ => AuthError::InvalidSignature,
            })
    }

    fn validate_time(&self, payload: &Map<String, Value>, now: i64) -> Result<(), AuthError> {
        if let Some(exp) = numeric_claim(payload, "exp")? {
            if now >= exp.saturating_add(self.leeway) {
                return Err(AuthError::TokenExpired);
            }
        }

        if let Some(nbf) = numeric_claim(payload, "nbf")? {
            if now.saturating_add(self.leeway) < nbf {
                return Err(AuthError::TokenNotYetValid);
            }
        }

        Ok(())
    }

    fn validate_issuer(&self, payload: &Map<String, Value>) -> Result<(), AuthError> {
        let Some(expected) = &self.issuer else {
            return Ok(());
        };

        match string_claim(payload, "iss")? {
            Some(iss) if &iss == expected => Ok(()),
            _ => Err(AuthError::InvalidIssuer),
        }
    }

    fn validate_audience(&self, payload: &Map<String, Value>) -> Result<(), AuthError> {
        let Some(expected) = &self.audience else {
            return Ok(());
        };

        if audience_claim(payload)?.iter().any(|aud| aud == expected) {
            Ok(())
        } else {
            Err(AuthError::InvalidAudience)
        }
    }
}

/// Reject any token whose header does not declare the pinned algorithm.
///
/// The comparison is exact: `none`, `HS256`, `es256` and every other value
/// fail here before any key material is touched.
pub fn ensure_pinned_algorithm(declared: &str) -> Result<(), AuthError> {
    if declared == PINNED_ALGORITHM_NAME {
        Ok(())
    } else {
        Err(AuthError::AlgorithmMismatch(declared.to_string()))
    }
}

fn parse_envelope(token: &str) -> Result<Envelope, AuthError> {
    let (signing_input, signature) = token.rsplit_once('.').ok_or(AuthError::MalformedToken)?;
    let (header, payload) = signing_input
        .split_once('.')
        .ok_or(AuthError::MalformedToken)?;

    if header.is_empty() || payload.is_empty() || payload.contains('.') {
        return Err(AuthError::MalformedToken);
    }

    let header: JoseHeader = decode_json_segment(header)?;
    let payload: Value = decode_json_segment(payload)?;
    Base64UrlUnpadded::decode_vec(signature).map_err(|_| AuthError::MalformedToken)?;

    Ok(Envelope { header, payload })
}

fn decode_json_segment<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, AuthError> {
    let bytes = Base64UrlUnpadded::decode_vec(segment).map_err(|_| AuthError::MalformedToken)?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::MalformedToken)
}
