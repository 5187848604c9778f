// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and authenticated identity representation.

use serde_json::{Map, Value};

use super::error::AuthError;

/// Claims of a verified Supabase access token.
///
/// Supabase tokens carry the standard registered claims plus `email`,
/// `role` and `session_id`. Everything else the provider adds (for example
/// `app_metadata`, `user_metadata`, `aal`) stays available in `extra`.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenClaims {
    /// Subject, the user's stable identity
    pub sub: String,
    pub iss: Option<String>,
    /// Audience, normalised to a list
    pub aud: Vec<String>,
    pub exp: Option<i64>,
    pub nbf: Option<i64>,
    pub iat: Option<i64>,
    pub email: Option<String>,
    /// Postgres role granted by Supabase (e.g. `authenticated`)
    pub role: Option<String>,
    pub session_id: Option<String>,
    /// The full decoded claim object
    pub extra: Map<String, Value>,
}

impl TokenClaims {
    /// Build from a payload whose signature and time claims were already
    /// checked.
    ///
    /// `iss`, `aud` and `iat` are only enforced when the authenticator is
    /// configured to check them; here a mistyped value is dropped.
    pub(crate) fn from_verified(
        sub: String,
        payload: Map<String, Value>,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            sub,
            iss: optional_string(&payload, "iss"),
            aud: audience_claim(&payload).unwrap_or_default(),
            exp: numeric_claim(&payload, "exp")?,
            nbf: numeric_claim(&payload, "nbf")?,
            iat: numeric_claim(&payload, "iat").ok().flatten(),
            email: optional_string(&payload, "email"),
            role: optional_string(&payload, "role"),
            session_id: optional_string(&payload, "session_id"),
            extra: payload,
        })
    }
}

/// Authenticated identity attached to a request.
///
/// This is the value the auth middleware stores in request extensions; the
/// type itself is the lookup key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    /// Canonical user ID (`sub` claim)
    pub user_id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub session_id: Option<String>,
    /// Token expiration (Unix timestamp), if the token had one
    pub expires_at: Option<i64>,
}

impl AuthenticatedIdentity {
    /// An identity carrying only a user ID.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
            role: None,
            session_id: None,
            expires_at: None,
        }
    }
}

impl From<TokenClaims> for AuthenticatedIdentity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
            session_id: claims.session_id,
            expires_at: claims.exp,
        }
    }
}

/// A NumericDate claim, rounded up to whole seconds.
///
/// Rounding up keeps `exp: 1000.75` valid through second 1000 and keeps
/// `nbf: 500.25` invalid until second 501.
pub(crate) fn numeric_claim(
    payload: &Map<String, Value>,
    name: &str,
) -> Result<Option<i64>, AuthError> {
    match payload.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.ceil() as i64))
            .map(Some)
            .ok_or(AuthError::InvalidClaims),
        Some(_) => Err(AuthError::InvalidClaims),
    }
}

/// A registered string claim; present with another type is an error.
pub(crate) fn string_claim(
    payload: &Map<String, Value>,
    name: &str,
) -> Result<Option<String>, AuthError> {
    match payload.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(AuthError::InvalidClaims),
    }
}

/// `aud` is either a single string or an array of strings.
pub(crate) fn audience_claim(payload: &Map<String, Value>) -> Result<Vec<String>, AuthError> {
    match payload.get("aud") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_owned)
                    .ok_or(AuthError::InvalidClaims)
            })
            .collect(),
        Some(_) => Err(AuthError::InvalidClaims),
    }
}

/// The `sub` claim, which must be a non-empty string.
pub(crate) fn subject_claim(payload: &Map<String, Value>) -> Result<String, AuthError> {
    match payload.get("sub") {
        Some(Value::String(sub)) if !sub.is_empty() => Ok(sub.clone()),
        _ => Err(AuthError::MissingSubject),
    }
}

/// Provider metadata is informational; a wrong type just drops it.
fn optional_string(payload: &Map<String, Value>, name: &str) -> Option<String> {
    payload.get(name).and_then(Value::as_str).map(str::to_owned)
}
