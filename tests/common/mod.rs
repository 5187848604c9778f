// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Test signer and mocked Supabase JWKS endpoint.

#![allow(dead_code)]

use base64ct::{Base64UrlUnpadded, Encoding};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_FIXED_SIGNING};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const JWKS_PATH: &str = "/auth/v1/.well-known/jwks.json";

/// ES256 key pair standing in for the Supabase project key.
pub struct TestKeypair {
    pkcs8: Vec<u8>,
    x: String,
    y: String,
}

impl TestKeypair {
    pub fn generate() -> Self {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng)
            .expect("Failed to generate P-256 key");
        let key_pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8.as_ref(), &rng)
                .expect("Failed to parse generated key");
        let point = key_pair.public_key().as_ref();

        Self {
            pkcs8: pkcs8.as_ref().to_vec(),
            x: Base64UrlUnpadded::encode_string(&point[1..33]),
            y: Base64UrlUnpadded::encode_string(&point[33..65]),
        }
    }

    pub fn jwk(&self, kid: &str) -> Value {
        json!({
            "kty": "EC",
            "crv": "P-256",
            "kid": kid,
            "alg": "ES256",
            "use": "sig",
            "x": self.x,
            "y": self.y,
        })
    }

    pub fn sign(&self, claims: &Value) -> String {
        let mut header = Header::new(Algorithm::ES256);
        header.typ = Some("JWT".to_string());
        encode(&header, claims, &EncodingKey::from_ec_der(&self.pkcs8))
            .expect("Failed to sign token")
    }
}

/// Start a mock Supabase project serving `keys` at the JWKS path.
pub async fn mock_supabase(keys: Vec<Value>) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "keys": keys })))
        .mount(&server)
        .await;
    server
}

/// Flip the first signature character of a compact JWS.
pub fn tamper_signature(token: &str) -> String {
    let (signing_input, signature) = token.rsplit_once('.').expect("three segments");
    let replacement = if signature.starts_with('A') { 'B' } else { 'A' };
    format!("{signing_input}.{replacement}{}", &signature[1..])
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
