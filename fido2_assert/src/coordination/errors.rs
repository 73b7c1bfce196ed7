//! Error types for the end-to-end assertion flow

use std::fmt;

use thiserror::Error;

use crate::assertion::AssertionError;
use crate::device::DeviceError;
use crate::keys::KeyError;
use crate::verify::VerificationError;

/// Step of the assertion flow an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    SelectAlgorithm,
    ReadCredentialId,
    ReadPublicKey,
    SetClientDataHash,
    SetRelyingParty,
    AllowCredential,
    DeviceOpen,
    DeviceGetAssertion,
    DeviceClose,
    AssertionCount,
    CheckAuthenticatorData,
    AssertionVerify,
}

impl Stage {
    /// Label printed in diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::SelectAlgorithm => "type",
            Stage::ReadCredentialId => "read_blob",
            Stage::ReadPublicKey => "read_pubkey",
            Stage::SetClientDataHash => "set_clientdata_hash",
            Stage::SetRelyingParty => "set_rp",
            Stage::AllowCredential => "allow_cred",
            Stage::DeviceOpen => "dev_open",
            Stage::DeviceGetAssertion => "dev_get_assert",
            Stage::DeviceClose => "dev_close",
            Stage::AssertionCount => "assert_count",
            Stage::CheckAuthenticatorData => "check_authdata",
            Stage::AssertionVerify => "assert_verify",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while running an assertion end to end.
///
/// Every variant is fatal. The device has already been released by the
/// time any of them reaches the caller.
#[derive(Debug, Error)]
pub enum CoordinationError {
    /// Bad caller input (unknown algorithm, unreadable credential id file)
    #[error("{message}")]
    Input { stage: Stage, message: String },

    /// The credential public key could not be loaded
    #[error("{source}")]
    KeyLoad { stage: Stage, source: KeyError },

    /// The request builder rejected a value
    #[error("{source}")]
    Request {
        stage: Stage,
        source: AssertionError,
    },

    /// Opening, talking to or closing the device failed
    #[error("{source}")]
    Device { stage: Stage, source: DeviceError },

    /// The device returned other than exactly one assertion
    #[error("{count} signatures returned")]
    ProtocolCount { count: usize },

    /// The assertion did not verify
    #[error("{source}")]
    Verification {
        stage: Stage,
        source: VerificationError,
    },
}

impl CoordinationError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Input { stage, .. }
            | Self::KeyLoad { stage, .. }
            | Self::Request { stage, .. }
            | Self::Device { stage, .. }
            | Self::Verification { stage, .. } => *stage,
            Self::ProtocolCount { .. } => Stage::AssertionCount,
        }
    }

    /// Underlying numeric code, when the failing layer has one.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Request { source, .. } => Some(source.code()),
            Self::Device { source, .. } => Some(source.code()),
            Self::Verification { source, .. } => Some(source.code()),
            Self::Input { .. } | Self::KeyLoad { .. } | Self::ProtocolCount { .. } => None,
        }
    }

    /// One-line diagnostic: `<stage>: <message> (0x<code>)`.
    pub fn diagnostic(&self) -> String {
        match self.code() {
            Some(code) => format!("{}: {} (0x{:x})", self.stage(), self, code),
            None => format!("{}: {}", self.stage(), self),
        }
    }

    /// Log the error and return self
    pub fn log(self) -> Self {
        match &self {
            Self::Input { stage, message } => tracing::error!("{}: {}", stage, message),
            Self::KeyLoad { stage, source } => tracing::error!("{}: key error: {}", stage, source),
            Self::Request { stage, source } => {
                tracing::error!("{}: request error: {}", stage, source)
            }
            Self::Device { stage, source } => {
                tracing::error!("{}: device error: {}", stage, source)
            }
            Self::ProtocolCount { count } => {
                tracing::error!("Expected exactly one assertion, got {}", count)
            }
            Self::Verification { stage, source } => {
                tracing::error!("{}: verification error: {}", stage, source)
            }
        }
        self
    }
}
