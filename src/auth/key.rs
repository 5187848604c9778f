// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The verifiable public key reconstructed from JWKS material.
//!
//! A [`VerifiablePublicKey`] is always an ES256 key on P-256. It is built once
//! at startup and never modified; picking up a rotated key means resolving a
//! new value.

use std::fmt;

use base64ct::{Base64UrlUnpadded, Encoding};
use jsonwebtoken::{Algorithm, DecodingKey};

use super::error::KeySetError;

/// The only signing algorithm accepted for bearer tokens.
pub const PINNED_ALGORITHM: Algorithm = Algorithm::ES256;

/// JOSE name of [`PINNED_ALGORITHM`] as it appears in a token header.
pub const PINNED_ALGORITHM_NAME: &str = "ES256";

/// JWK `kty` value for elliptic-curve keys.
pub const KEY_TYPE_EC: &str = "EC";

/// JWK `crv` value for the one supported curve.
pub const CURVE_P256: &str = "P-256";

/// Byte length of a P-256 field element.
pub const COORDINATE_LEN: usize = 32;

/// Immutable ES256 public key.
#[derive(Clone)]
pub struct VerifiablePublicKey {
    x: [u8; COORDINATE_LEN],
    y: [u8; COORDINATE_LEN],
    key_id: Option<String>,
    decoding_key: DecodingKey,
}

impl VerifiablePublicKey {
    /// Build a key from big-endian affine coordinates.
    ///
    /// Coordinates are treated as unsigned integers: leading zero bytes are
    /// ignored and shorter values are left-padded to the field width. The
    /// resulting point must lie on P-256.
    pub fn from_coordinates(x: &[u8], y: &[u8]) -> Result<Self, KeySetError> {
        let x = fixed_width("x", x)?;
        let y = fixed_width("y", y)?;
        ensure_on_curve(&x, &y)?;

        let decoding_key = DecodingKey::from_ec_components(
            &Base64UrlUnpadded::encode_string(&x),
            &Base64UrlUnpadded::encode_string(&y),
        )
        .map_err(|e| KeySetError::Malformed(format!("failed to create EC key: {e}")))?;

        Ok(Self {
            x,
            y,
            key_id: None,
            decoding_key,
        })
    }

    /// Attach the JWK `kid` the key was resolved from.
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    pub fn algorithm(&self) -> Algorithm {
        PINNED_ALGORITHM
    }

    pub fn curve(&self) -> &'static str {
        CURVE_P256
    }

    pub fn x(&self) -> &[u8; COORDINATE_LEN] {
        &self.x
    }

    pub fn y(&self) -> &[u8; COORDINATE_LEN] {
        &self.y
    }

    pub fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

/// Keys are equal when they name the same curve point.
impl PartialEq for VerifiablePublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl Eq for VerifiablePublicKey {}

impl fmt::Debug for VerifiablePublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifiablePublicKey")
            .field("algorithm", &PINNED_ALGORITHM)
            .field("curve", &CURVE_P256)
            .field("key_id", &self.key_id)
            .field("x", &Base64UrlUnpadded::encode_string(&self.x))
            .field("y", &Base64UrlUnpadded::encode_string(&self.y))
            .finish()
    }
}

fn ensure_on_curve(
    x: &[u8; COORDINATE_LEN],
    y: &[u8; COORDINATE_LEN],
) -> Result<(), KeySetError> {
    // Uncompressed SEC1 encoding: 0x04 || X || Y
    let mut point = Vec::with_capacity(1 + 2 * COORDINATE_LEN);
    point.push(0x04);
    point.extend_from_slice(x);
    point.extend_from_slice(y);

    p256::PublicKey::from_sec1_bytes(&point)
        .map(|_| ())
        .map_err(|_| KeySetError::Malformed("coordinates are not a point on P-256".to_string()))
}

fn fixed_width(name: &str, bytes: &[u8]) -> Result<[u8; COORDINATE_LEN], KeySetError> {
    let first_significant = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    let significant = &bytes[first_significant..];

    if significant.len() > COORDINATE_LEN {
        return Err(KeySetError::Malformed(format!(
            "{name} coordinate is {} bytes, expected at most {COORDINATE_LEN}",
            significant.len()
        )));
    }

    let mut out = [0u8; COORDINATE_LEN];
    out[COORDINATE_LEN - significant.len()..].copy_from_slice(significant);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_keys::TestSigner;

    /// A signer whose x coordinate has a leading zero byte.
    fn signer_with_short_x() -> TestSigner {
        loop {
            let signer = TestSigner::generate();
            if signer.coordinates().0[0] == 0 {
                return signer;
            }
        }
    }

    #[test]
    fn short_coordinates_are_left_padded() {
        let signer = signer_with_short_x();
        let (x, y) = signer.coordinates();

        let key = VerifiablePublicKey::from_coordinates(&x[1..], y).unwrap();
        assert_eq!(key, signer.public_key());
        assert_eq!(key.x()[0], 0);
    }

    #[test]
    fn fixed_width_pads_and_strips() {
        let padded = fixed_width("x", &[1, 2, 3]).unwrap();
        assert_eq!(&padded[29..], &[1, 2, 3]);
        assert!(padded[..29].iter().all(|b| *b == 0));

        let mut wide = vec![0u8; 4];
        wide.extend_from_slice(&[7u8; 32]);
        assert_eq!(fixed_width("x", &wide).unwrap(), [7u8; 32]);
    }

    #[test]
    fn leading_zeros_beyond_field_width_are_ignored() {
        let signer = TestSigner::generate();
        let (x, y) = signer.coordinates();
        let mut wide = vec![0u8; 4];
        wide.extend_from_slice(x);

        let key = VerifiablePublicKey::from_coordinates(&wide, y).unwrap();
        assert_eq!(key, signer.public_key());
    }

    #[test]
    fn oversized_coordinate_is_malformed() {
        let result = VerifiablePublicKey::from_coordinates(&[9u8; 33], &[1u8; 32]);
        assert!(matches!(
            result,
            Err(KeySetError::Malformed(msg)) if msg.contains("x coordinate")
        ));
    }

    #[test]
    fn off_curve_point_is_malformed() {
        let result = VerifiablePublicKey::from_coordinates(&[1u8; 32], &[2u8; 32]);
        assert!(matches!(
            result,
            Err(KeySetError::Malformed(msg)) if msg.contains("not a point on P-256")
        ));

        let signer = TestSigner::generate();
        let (x, y) = signer.coordinates();
        let mut flipped = y.to_vec();
        flipped[31] ^= 1;
        assert!(VerifiablePublicKey::from_coordinates(x, &flipped).is_err());
    }

    #[test]
    fn equality_ignores_key_id() {
        let signer = TestSigner::generate();
        let a = signer.public_key();
        let b = signer.public_key().with_key_id("kid-1");

        assert_eq!(a, b);
        assert_eq!(b.key_id(), Some("kid-1"));
        assert_eq!(a.algorithm(), Algorithm::ES256);
        assert_eq!(a.curve(), "P-256");
        assert_ne!(a, TestSigner::generate().public_key());
    }
}
