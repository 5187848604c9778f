// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Two families live here:
//!
//! - [`KeySetError`] is produced while resolving the signing key at startup
//!   and is always fatal.
//! - [`AuthError`] is produced per request and always becomes a 401. The
//!   variants are kept distinct for logs and tests, but the client only ever
//!   sees one of a handful of generic messages.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::ErrorBody;

/// Failure to obtain a verifiable key from the remote key set.
#[derive(Debug, thiserror::Error)]
pub enum KeySetError {
    /// Transport failure or non-success HTTP status
    #[error("JWKS endpoint unreachable: {0}")]
    Unreachable(String),
    /// Body is not a key set, or the matching key has bad coordinates
    #[error("JWKS document malformed: {0}")]
    Malformed(String),
    /// No EC P-256 key present in the key set
    #[error("no EC P-256 key found in JWKS response")]
    NoMatchingKey,
}

/// Per-request authentication failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No (or an empty) Authorization header
    #[error("Authorization header is required")]
    MissingAuthHeader,
    /// Token is not three base64url segments with JSON header and payload
    #[error("Token is malformed")]
    MalformedToken,
    /// Header declares an algorithm other than the pinned one
    #[error("Unexpected signing algorithm: {0}")]
    AlgorithmMismatch(String),
    /// Signature does not verify under the held key
    #[error("Token signature is invalid")]
    InvalidSignature,
    /// `exp` is in the past
    #[error("Token has expired")]
    TokenExpired,
    /// `nbf` is in the future
    #[error("Token is not yet valid")]
    TokenNotYetValid,
    /// `iss` does not match the configured issuer
    #[error("Token issuer is invalid")]
    InvalidIssuer,
    /// `aud` does not contain the configured audience
    #[error("Token audience is invalid")]
    InvalidAudience,
    /// Payload is not a claims object, or a registered claim has the wrong type
    #[error("Token claims are invalid")]
    InvalidClaims,
    /// `sub` absent, empty, or not a string
    #[error("Token subject is missing")]
    MissingSubject,
    /// Handler reached without the auth middleware having run
    #[error("Request is not authenticated")]
    NotAuthenticated,
}

impl AuthError {
    /// Stable identifier for logs and assertions. Never sent to clients.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::AlgorithmMismatch(_) => "algorithm_mismatch",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::TokenNotYetValid => "token_not_yet_valid",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::InvalidAudience => "invalid_audience",
            AuthError::InvalidClaims => "invalid_claims",
            AuthError::MissingSubject => "missing_subject",
            AuthError::NotAuthenticated => "not_authenticated",
        }
    }

    /// The message placed in the response body.
    ///
    /// Every failure of the token itself collapses to `Invalid token` so the
    /// response does not reveal which verification step rejected it.
    pub fn client_message(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "Missing authorization header",
            AuthError::InvalidClaims => "Invalid claims",
            AuthError::MissingSubject => "Invalid user ID",
            AuthError::NotAuthenticated => "User not authenticated",
            AuthError::MalformedToken
            | AuthError::AlgorithmMismatch(_)
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::TokenNotYetValid
            | AuthError::InvalidIssuer
            | AuthError::InvalidAudience => "Invalid token",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.client_message().to_string(),
        });
        (self.status_code(), body).into_response()
    }
}
