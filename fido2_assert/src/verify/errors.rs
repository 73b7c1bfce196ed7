use thiserror::Error;

use crate::device::{FIDO_ERR_INVALID_ARGUMENT, FIDO_ERR_INVALID_PARAM, FIDO_ERR_INVALID_SIG};
use crate::keys::CoseAlgorithm;

/// Errors during cryptographic verification of an assertion.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// The requested algorithm does not match the key's tag. Raised before
    /// any cryptographic work.
    #[error("Algorithm mismatch: requested {requested}, key is {key}")]
    AlgorithmMismatch {
        requested: CoseAlgorithm,
        key: CoseAlgorithm,
    },

    /// The signature did not verify (bad signature, malformed DER, wrong
    /// length, unusable key)
    #[error("Signature verification failed: {0}")]
    InvalidSignature(String),

    /// Authenticator data could not be decoded for the strict policy check
    #[error("Invalid authenticator data: {0}")]
    AuthenticatorData(String),

    #[error("RP ID hash mismatch for '{0}'")]
    RelyingPartyMismatch(String),

    #[error("User presence requested but the UP flag is not set")]
    UserPresenceMissing,

    #[error("User verification requested but the UV flag is not set")]
    UserVerificationMissing,
}

impl VerificationError {
    /// `FIDO_ERR_*` numeric code.
    pub fn code(&self) -> i32 {
        match self {
            VerificationError::AlgorithmMismatch { .. } => FIDO_ERR_INVALID_ARGUMENT,
            VerificationError::InvalidSignature(_) => FIDO_ERR_INVALID_SIG,
            VerificationError::AuthenticatorData(_)
            | VerificationError::RelyingPartyMismatch(_)
            | VerificationError::UserPresenceMissing
            | VerificationError::UserVerificationMissing => FIDO_ERR_INVALID_PARAM,
        }
    }
}
