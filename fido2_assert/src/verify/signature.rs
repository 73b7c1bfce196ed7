use ring::signature::{self, RsaPublicKeyComponents, UnparsedPublicKey};

use super::errors::VerificationError;
use crate::keys::{CoseAlgorithm, KeyMaterial};

/// Verifies an assertion signature over `message` with `key`.
///
/// SHA-256 of `message` is computed by the verifier; ES256 signatures are
/// DER-encoded ECDSA (either s or its complement is accepted), RS256
/// signatures are raw PKCS#1 v1.5 blocks as long as the modulus.
///
/// # Arguments
/// * `message` - The signed bytes, normally a [`super::SignedMessage`]
/// * `signature` - Signature bytes as returned by the authenticator
/// * `key` - Credential public key
/// * `algorithm` - Algorithm the signature claims to use
///
/// # Errors
/// * `VerificationError::AlgorithmMismatch` - If `algorithm` is not the key's algorithm
/// * `VerificationError::InvalidSignature` - If the signature does not verify
pub fn verify_signature(
    message: &[u8],
    signature: &[u8],
    key: &KeyMaterial,
    algorithm: CoseAlgorithm,
) -> Result<(), VerificationError> {
    if key.algorithm() != algorithm {
        tracing::error!(
            "Refusing to verify {} signature with {} key",
            algorithm,
            key.describe()
        );
        return Err(VerificationError::AlgorithmMismatch {
            requested: algorithm,
            key: key.algorithm(),
        });
    }

    tracing::debug!("Decoded signature length: {}", signature.len());

    let result = match key {
        KeyMaterial::Ec(point) => {
            let public_key = point.to_sec1_uncompressed();
            UnparsedPublicKey::new(&signature::ECDSA_P256_SHA256_ASN1, &public_key)
                .verify(message, signature)
        }
        KeyMaterial::Rsa(rsa) => {
            let public_key = RsaPublicKeyComponents {
                n: rsa.modulus(),
                e: rsa.exponent(),
            };
            public_key.verify(&signature::RSA_PKCS1_2048_8192_SHA256, message, signature)
        }
    };

    match result {
        Ok(_) => {
            tracing::info!("{} signature verification successful", algorithm);
            Ok(())
        }
        Err(e) => {
            tracing::error!("{} signature verification failed: {:?}", algorithm, e);
            Err(VerificationError::InvalidSignature(format!(
                "{} signature did not verify against the {} key",
                algorithm,
                key.describe()
            )))
        }
    }
}
