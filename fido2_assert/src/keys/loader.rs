use std::path::Path;

use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::*;
use x509_parser::public_key::PublicKey;

use super::errors::KeyError;
use super::types::{CoseAlgorithm, KeyMaterial};
use crate::utils::read_blob;

const PEM_PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";

/// Loads a credential public key from a PEM or DER SubjectPublicKeyInfo file.
///
/// # Arguments
/// * `path` - Location of the encoded key
/// * `algorithm` - Algorithm the key is expected to verify under
///
/// # Errors
/// * `KeyError::Io` - If the file cannot be read
/// * `KeyError::Format` - If the content is not exactly one SubjectPublicKeyInfo
/// * `KeyError::TypeMismatch` - If the key type does not fit `algorithm`
/// * `KeyError::InvalidEcKey` / `KeyError::InvalidRsaKey` - If the key is not usable
pub fn load_public_key(
    path: impl AsRef<Path>,
    algorithm: CoseAlgorithm,
) -> Result<KeyMaterial, KeyError> {
    let body = read_blob(path.as_ref()).map_err(|e| KeyError::Io(e.to_string()))?;
    let key = parse_public_key(&body, algorithm)?;
    tracing::debug!(
        "Loaded {} public key from {}",
        key.describe(),
        path.as_ref().display()
    );
    Ok(key)
}

/// Parses a PEM or DER SubjectPublicKeyInfo into key material for `algorithm`.
pub fn parse_public_key(input: &[u8], algorithm: CoseAlgorithm) -> Result<KeyMaterial, KeyError> {
    let der = if looks_like_pem(input) {
        decode_pem(input)?
    } else {
        input.to_vec()
    };

    let (rest, spki) = SubjectPublicKeyInfo::from_der(&der)
        .map_err(|e| KeyError::Format(format!("Failed to parse SubjectPublicKeyInfo: {}", e)))?;
    if !rest.is_empty() {
        return Err(KeyError::Format(format!(
            "{} trailing bytes after SubjectPublicKeyInfo",
            rest.len()
        )));
    }

    match algorithm {
        CoseAlgorithm::Es256 => ec_key_from_spki(&spki),
        CoseAlgorithm::Rs256 => rsa_key_from_spki(&spki),
    }
}

fn looks_like_pem(input: &[u8]) -> bool {
    let trimmed = input
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .map(|start| &input[start..])
        .unwrap_or_default();
    trimmed.starts_with(b"-----BEGIN")
}

fn decode_pem(input: &[u8]) -> Result<Vec<u8>, KeyError> {
    let (_, pem) = parse_x509_pem(input)
        .map_err(|e| KeyError::Format(format!("Failed to decode PEM: {:?}", e)))?;

    if pem.label != PEM_PUBLIC_KEY_LABEL {
        return Err(KeyError::Format(format!(
            "Expected a '{}' PEM block, found '{}'",
            PEM_PUBLIC_KEY_LABEL, pem.label
        )));
    }
    Ok(pem.contents)
}

fn key_type_name(spki: &SubjectPublicKeyInfo) -> String {
    let oid = spki.algorithm.algorithm.as_bytes();
    if oid == oid_registry::OID_KEY_TYPE_EC_PUBLIC_KEY.as_bytes() {
        "an EC key".to_string()
    } else if oid == oid_registry::OID_PKCS1_RSAENCRYPTION.as_bytes() {
        "an RSA key".to_string()
    } else {
        format!("key type {}", spki.algorithm.algorithm)
    }
}

fn ec_key_from_spki(spki: &SubjectPublicKeyInfo) -> Result<KeyMaterial, KeyError> {
    if spki.algorithm.algorithm.as_bytes() != oid_registry::OID_KEY_TYPE_EC_PUBLIC_KEY.as_bytes() {
        return Err(KeyError::TypeMismatch {
            expected: CoseAlgorithm::Es256,
            found: key_type_name(spki),
        });
    }

    // The named curve travels in the algorithm parameters
    let curve = spki
        .algorithm
        .parameters
        .as_ref()
        .and_then(|params| params.as_oid().ok())
        .ok_or_else(|| KeyError::InvalidEcKey("Missing named curve parameter".to_string()))?;
    if curve.as_bytes() != oid_registry::OID_EC_P256.as_bytes() {
        return Err(KeyError::InvalidEcKey(format!(
            "Unsupported curve {}, only P-256 is accepted",
            curve
        )));
    }

    match spki.parsed() {
        Ok(PublicKey::EC(point)) => KeyMaterial::ec_from_sec1(point.data()),
        Ok(_) => Err(KeyError::InvalidEcKey(
            "Key body is not an EC point".to_string(),
        )),
        Err(e) => Err(KeyError::InvalidEcKey(format!(
            "Failed to decode EC point: {}",
            e
        ))),
    }
}

fn rsa_key_from_spki(spki: &SubjectPublicKeyInfo) -> Result<KeyMaterial, KeyError> {
    if spki.algorithm.algorithm.as_bytes() != oid_registry::OID_PKCS1_RSAENCRYPTION.as_bytes() {
        return Err(KeyError::TypeMismatch {
            expected: CoseAlgorithm::Rs256,
            found: key_type_name(spki),
        });
    }

    match spki.parsed() {
        Ok(PublicKey::RSA(rsa)) => KeyMaterial::rsa(rsa.modulus, rsa.exponent),
        Ok(_) => Err(KeyError::InvalidRsaKey(
            "Key body is not an RSAPublicKey".to_string(),
        )),
        Err(e) => Err(KeyError::InvalidRsaKey(format!(
            "Failed to decode RSAPublicKey: {}",
            e
        ))),
    }
}
