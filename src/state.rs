// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::TokenAuthenticator;
use crate::config::AllowedOrigins;

#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<TokenAuthenticator>,
    pub allowed_origins: AllowedOrigins,
}

impl AppState {
    pub fn new(authenticator: TokenAuthenticator) -> Self {
        Self {
            authenticator: Arc::new(authenticator),
            allowed_origins: AllowedOrigins::Any,
        }
    }

    pub fn with_allowed_origins(mut self, origins: AllowedOrigins) -> Self {
        self.allowed_origins = origins;
        self
    }
}
