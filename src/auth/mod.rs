// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Supabase bearer-token authentication for the Devboard API.
//!
//! ## Auth Flow
//!
//! 1. Frontend authenticates the user with Supabase
//! 2. Frontend sends `Authorization: Bearer <Supabase JWT>`
//! 3. API server:
//!    - At startup, fetches `<SUPABASE_URL>/auth/v1/.well-known/jwks.json`
//!      and keeps the first EC P-256 key
//!    - Per request, verifies algorithm (ES256 only), signature, `exp`/`nbf`
//!    - Extracts `sub` → canonical `user_id`
//!
//! ## Security
//!
//! - The header's `alg` is checked against the pinned algorithm before any
//!   cryptographic work
//! - Clients see generic 401 bodies; the precise reason only goes to logs
//! - The key is read-only after startup and shared without locks

pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod key;
pub mod middleware;
pub mod token;

#[cfg(test)]
pub(crate) mod test_keys;

pub use claims::{AuthenticatedIdentity, TokenClaims};
pub use error::{AuthError, KeySetError};
pub use extractor::Auth;
pub use jwks::KeySetResolver;
pub use key::VerifiablePublicKey;
pub use middleware::require_auth;
pub use token::TokenAuthenticator;
