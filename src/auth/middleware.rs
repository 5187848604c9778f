// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Apply to a router subtree with
//! `route_layer(axum::middleware::from_fn_with_state(state, require_auth))`.
//! Every request reaching a handler behind it carries an
//! [`AuthenticatedIdentity`] in its extensions.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::{AuthError, AuthenticatedIdentity};
use crate::state::AppState;

/// Scheme prefix stripped from the Authorization header.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Authentication middleware function.
///
/// The rejection reason is logged but never returned; the client sees one
/// of the generic bodies from [`AuthError::client_message`].
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let verified = bearer_token(request.headers())
        .and_then(|token| state.authenticator.verify(token));

    match verified {
        Ok(claims) => {
            let identity = AuthenticatedIdentity::from(claims);
            debug!(user_id = %identity.user_id, "Authenticated request");
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => {
            debug!(
                error_code = e.error_code(),
                reason = %e,
                path = %request.uri().path(),
                "Rejected request"
            );
            e.into_response()
        }
    }
}

/// Pull the bearer token out of the request headers.
///
/// The `Bearer ` prefix is optional: a bare token is accepted as-is.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::MissingAuthHeader)?;

    let value = value.to_str().map_err(|_| AuthError::MalformedToken)?;
    Ok(value.strip_prefix(BEARER_PREFIX).unwrap_or(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &'static [u8]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_bytes(value).unwrap());
        headers
    }

    #[test]
    fn absent_header_is_missing() {
        assert_eq!(bearer_token(&HeaderMap::new()), Err(AuthError::MissingAuthHeader));
    }

    #[test]
    fn empty_header_is_missing() {
        assert_eq!(bearer_token(&headers(b"")), Err(AuthError::MissingAuthHeader));
    }

    #[test]
    fn bearer_prefix_is_stripped() {
        assert_eq!(bearer_token(&headers(b"Bearer abc.def.ghi")), Ok("abc.def.ghi"));
    }

    #[test]
    fn bare_token_is_tolerated() {
        assert_eq!(bearer_token(&headers(b"abc.def.ghi")), Ok("abc.def.ghi"));
    }

    #[test]
    fn bearer_with_nothing_after_yields_empty_token() {
        assert_eq!(bearer_token(&headers(b"Bearer ")), Ok(""));
    }

    #[test]
    fn opaque_header_bytes_are_malformed() {
        assert_eq!(bearer_token(&headers(b"Bearer \xfa\xfb")), Err(AuthError::MalformedToken));
    }
}
