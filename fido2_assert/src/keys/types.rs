use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::KeyError;

/// Minimum accepted RSA modulus size in bits.
pub const RSA_MIN_MODULUS_BITS: usize = 2048;
/// Largest modulus the RS256 verifier handles.
pub const RSA_MAX_MODULUS_BITS: usize = 8192;

const EC_COORDINATE_LEN: usize = 32;
const SEC1_UNCOMPRESSED_TAG: u8 = 0x04;

/// COSE signature algorithms supported for assertions.
///
/// The serialized form is the lowercase JOSE-style name (`es256` / `rs256`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoseAlgorithm {
    /// ECDSA over P-256 with SHA-256 (COSE -7)
    #[default]
    Es256,
    /// RSASSA-PKCS1-v1_5 with SHA-256 (COSE -257)
    Rs256,
}

impl fmt::Display for CoseAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoseAlgorithm::Es256 => write!(f, "ES256"),
            CoseAlgorithm::Rs256 => write!(f, "RS256"),
        }
    }
}

impl FromStr for CoseAlgorithm {
    type Err = KeyError;

    /// Accepts `es256`/`ecdsa` and `rs256`/`rsa`, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "es256" | "ecdsa" => Ok(CoseAlgorithm::Es256),
            "rs256" | "rsa" => Ok(CoseAlgorithm::Rs256),
            _ => Err(KeyError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

/// Affine coordinates of a P-256 public point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcPoint {
    x: [u8; EC_COORDINATE_LEN],
    y: [u8; EC_COORDINATE_LEN],
}

impl EcPoint {
    pub fn x(&self) -> &[u8; EC_COORDINATE_LEN] {
        &self.x
    }

    pub fn y(&self) -> &[u8; EC_COORDINATE_LEN] {
        &self.y
    }

    /// SEC1 uncompressed encoding: `0x04 || x || y`.
    pub fn to_sec1_uncompressed(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + 2 * EC_COORDINATE_LEN);
        out.push(SEC1_UNCOMPRESSED_TAG);
        out.extend_from_slice(&self.x);
        out.extend_from_slice(&self.y);
        out
    }
}

/// RSA public key components, big-endian without leading zero bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaComponents {
    n: Vec<u8>,
    e: Vec<u8>,
}

impl RsaComponents {
    pub fn modulus(&self) -> &[u8] {
        &self.n
    }

    pub fn exponent(&self) -> &[u8] {
        &self.e
    }

    pub fn modulus_bits(&self) -> usize {
        bit_length(&self.n)
    }
}

/// Credential public key, tagged by the algorithm it verifies under.
///
/// Built once by [`KeyMaterial::ec`], [`KeyMaterial::ec_from_sec1`] or
/// [`KeyMaterial::rsa`] (or the loader in this module) and immutable after
/// that. The variant is the algorithm tag, so an EC point can never be
/// handed to the RSA verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyMaterial {
    Ec(EcPoint),
    Rsa(RsaComponents),
}

impl KeyMaterial {
    /// Builds an ES256 key from 32-byte affine coordinates.
    ///
    /// The point must lie on P-256 and must not be the identity.
    pub fn ec(x: &[u8], y: &[u8]) -> Result<Self, KeyError> {
        let x: [u8; EC_COORDINATE_LEN] = x.try_into().map_err(|_| {
            KeyError::InvalidEcKey(format!(
                "x coordinate must be {} bytes, got {}",
                EC_COORDINATE_LEN,
                x.len()
            ))
        })?;
        let y: [u8; EC_COORDINATE_LEN] = y.try_into().map_err(|_| {
            KeyError::InvalidEcKey(format!(
                "y coordinate must be {} bytes, got {}",
                EC_COORDINATE_LEN,
                y.len()
            ))
        })?;
        let point = EcPoint { x, y };
        p256::PublicKey::from_sec1_bytes(&point.to_sec1_uncompressed()).map_err(|_| {
            KeyError::InvalidEcKey("point is not on the P-256 curve".to_string())
        })?;
        Ok(KeyMaterial::Ec(point))
    }

    /// Builds an ES256 key from a SEC1 uncompressed point (65 bytes).
    pub fn ec_from_sec1(point: &[u8]) -> Result<Self, KeyError> {
        if point.len() != 1 + 2 * EC_COORDINATE_LEN || point[0] != SEC1_UNCOMPRESSED_TAG {
            return Err(KeyError::InvalidEcKey(format!(
                "expected a {}-byte uncompressed point, got {} bytes",
                1 + 2 * EC_COORDINATE_LEN,
                point.len()
            )));
        }
        Self::ec(
            &point[1..1 + EC_COORDINATE_LEN],
            &point[1 + EC_COORDINATE_LEN..],
        )
    }

    /// Builds an RS256 key from big-endian modulus and exponent.
    ///
    /// Leading zero bytes (as produced by DER INTEGER encoding) are stripped.
    pub fn rsa(n: &[u8], e: &[u8]) -> Result<Self, KeyError> {
        let n = strip_leading_zeros(n);
        let e = strip_leading_zeros(e);

        let bits = bit_length(n);
        if bits < RSA_MIN_MODULUS_BITS {
            return Err(KeyError::InvalidRsaKey(format!(
                "modulus is {} bits, at least {} required",
                bits, RSA_MIN_MODULUS_BITS
            )));
        }
        if bits > RSA_MAX_MODULUS_BITS {
            return Err(KeyError::InvalidRsaKey(format!(
                "modulus is {} bits, at most {} supported",
                bits, RSA_MAX_MODULUS_BITS
            )));
        }
        if e.is_empty() || e.len() > 4 || e[e.len() - 1] & 1 == 0 || e == [1] {
            return Err(KeyError::InvalidRsaKey(
                "public exponent must be an odd integer greater than 1".to_string(),
            ));
        }

        Ok(KeyMaterial::Rsa(RsaComponents {
            n: n.to_vec(),
            e: e.to_vec(),
        }))
    }

    /// The algorithm this key verifies under.
    pub fn algorithm(&self) -> CoseAlgorithm {
        match self {
            KeyMaterial::Ec(_) => CoseAlgorithm::Es256,
            KeyMaterial::Rsa(_) => CoseAlgorithm::Rs256,
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            KeyMaterial::Ec(_) => "EC P-256".to_string(),
            KeyMaterial::Rsa(rsa) => format!("RSA-{}", rsa.modulus_bits()),
        }
    }
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

fn bit_length(be: &[u8]) -> usize {
    let be = strip_leading_zeros(be);
    match be.first() {
        None => 0,
        Some(first) => (be.len() - 1) * 8 + (8 - first.leading_zeros() as usize),
    }
}
