use thiserror::Error;

use super::types::CoseAlgorithm;

/// Errors raised while selecting an algorithm or loading credential public keys.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// The requested algorithm name is not ES256/RS256 (or an alias of them)
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The key source could not be read
    #[error("Failed to read public key: {0}")]
    Io(String),

    /// The key source is not a parseable PEM/DER SubjectPublicKeyInfo
    #[error("Invalid public key encoding: {0}")]
    Format(String),

    /// The key parsed, but its type does not match the requested algorithm
    #[error("Key type mismatch: expected a key for {expected}, found {found}")]
    TypeMismatch {
        expected: CoseAlgorithm,
        found: String,
    },

    /// EC key that is not an uncompressed P-256 point
    #[error("Invalid EC key: {0}")]
    InvalidEcKey(String),

    /// RSA key with an unusable modulus or exponent
    #[error("Invalid RSA key: {0}")]
    InvalidRsaKey(String),
}
