// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Devboard API - Profile Hosting Service
//!
//! This crate provides the authenticated HTTP surface of the Devboard
//! profile API: Supabase JWKS key resolution, ES256 bearer-token
//! verification, and the Axum middleware that hands a trusted user identity
//! to protected handlers.
//!
//! ## Modules
//!
//! - `api` - HTTP router and handlers (Axum)
//! - `auth` - Key resolution, token verification, request interception
//! - `config` - Environment configuration
//! - `telemetry` - Logging setup

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod state;
pub mod telemetry;
