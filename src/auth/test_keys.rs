// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! P-256 key pairs and token builders shared by the auth unit tests.

use base64ct::{Base64UrlUnpadded, Encoding};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_FIXED_SIGNING};
use serde_json::{json, Value};

use super::key::VerifiablePublicKey;

/// Freshly generated ES256 signer.
pub(crate) struct TestSigner {
    pkcs8: Vec<u8>,
    x: Vec<u8>,
    y: Vec<u8>,
}

impl TestSigner {
    pub(crate) fn generate() -> Self {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng)
            .expect("Failed to generate P-256 key");
        let key_pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8.as_ref(), &rng)
                .expect("Failed to parse generated key");

        // Uncompressed SEC1 point: 0x04 || X || Y
        let point = key_pair.public_key().as_ref();
        assert_eq!(point.len(), 65);

        Self {
            pkcs8: pkcs8.as_ref().to_vec(),
            x: point[1..33].to_vec(),
            y: point[33..65].to_vec(),
        }
    }

    pub(crate) fn public_key(&self) -> VerifiablePublicKey {
        VerifiablePublicKey::from_coordinates(&self.x, &self.y).expect("valid test coordinates")
    }

    /// Big-endian affine coordinates, exactly 32 bytes each.
    pub(crate) fn coordinates(&self) -> (&[u8], &[u8]) {
        (&self.x, &self.y)
    }

    pub(crate) fn jwk(&self, kid: &str) -> Value {
        json!({
            "kty": "EC",
            "crv": "P-256",
            "kid": kid,
            "alg": "ES256",
            "use": "sig",
            "x": Base64UrlUnpadded::encode_string(&self.x),
            "y": Base64UrlUnpadded::encode_string(&self.y),
        })
    }

    /// The raw public point, as an attacker would see it in the JWKS.
    pub(crate) fn public_point(&self) -> Vec<u8> {
        let mut point = vec![0x04];
        point.extend_from_slice(&self.x);
        point.extend_from_slice(&self.y);
        point
    }

    pub(crate) fn sign(&self, claims: &Value) -> String {
        let mut header = Header::new(Algorithm::ES256);
        header.typ = Some("JWT".to_string());
        encode(&header, claims, &EncodingKey::from_ec_der(&self.pkcs8))
            .expect("Failed to sign token")
    }
}

/// Assemble a token from arbitrary header and payload JSON.
pub(crate) fn forge_token(header: &Value, claims: &Value, signature: &[u8]) -> String {
    format!(
        "{}.{}.{}",
        Base64UrlUnpadded::encode_string(header.to_string().as_bytes()),
        Base64UrlUnpadded::encode_string(claims.to_string().as_bytes()),
        Base64UrlUnpadded::encode_string(signature),
    )
}

/// Replace the first signature character so the decoded `r` value changes.
pub(crate) fn tamper_signature(token: &str) -> String {
    let (signing_input, signature) = token.rsplit_once('.').expect("three segments");
    let replacement = if signature.starts_with('A') { 'B' } else { 'A' };
    format!("{signing_input}.{replacement}{}", &signature[1..])
}

pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
