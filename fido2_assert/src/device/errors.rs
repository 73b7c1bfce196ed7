use thiserror::Error;

use super::status::{
    FIDO_ERR_INTERNAL, FIDO_ERR_INVALID_ARGUMENT, FIDO_ERR_RX, FIDO_ERR_RX_INVALID_CBOR,
    FIDO_ERR_TX, status_name,
};

/// Errors reported by a device session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The device could not be opened (missing or unusable locator)
    #[error("Failed to open device {path}: {reason}")]
    Open { path: String, reason: String },

    /// A command could not be sent
    #[error("Transmit error: {0}")]
    Transport(String),

    /// No reply was received
    #[error("Receive error: {0}")]
    Receive(String),

    /// The reply was received but could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The authenticator answered with a non-zero CTAP status byte
    #[error("{name}", name = describe_status(.0))]
    Status(u8),

    /// The request was rejected before anything was sent
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The session has already been closed
    #[error("Device session is closed")]
    Closed,

    #[error("Internal error: {0}")]
    Internal(String),
}

fn describe_status(status: &u8) -> &'static str {
    status_name(*status)
}

impl DeviceError {
    /// Native numeric code: the CTAP status byte for authenticator errors,
    /// a negative `FIDO_ERR_*` code otherwise.
    pub fn code(&self) -> i32 {
        match self {
            DeviceError::Status(status) => i32::from(*status),
            DeviceError::Open { .. } | DeviceError::Internal(_) => FIDO_ERR_INTERNAL,
            DeviceError::Transport(_) => FIDO_ERR_TX,
            DeviceError::Receive(_) => FIDO_ERR_RX,
            DeviceError::InvalidResponse(_) => FIDO_ERR_RX_INVALID_CBOR,
            DeviceError::InvalidArgument(_) | DeviceError::Closed => FIDO_ERR_INVALID_ARGUMENT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::status::{CTAP2_ERR_NO_CREDENTIALS, CTAP2_ERR_PIN_REQUIRED};

    #[test]
    fn test_status_codes_pass_through() {
        assert_eq!(DeviceError::Status(CTAP2_ERR_NO_CREDENTIALS).code(), 0x2E);
        assert_eq!(DeviceError::Status(CTAP2_ERR_PIN_REQUIRED).code(), 0x36);
        assert_eq!(
            DeviceError::Status(CTAP2_ERR_NO_CREDENTIALS).to_string(),
            "FIDO_ERR_NO_CREDENTIALS"
        );
    }

    #[test]
    fn test_local_failures_use_negative_codes() {
        assert_eq!(DeviceError::Transport("x".into()).code(), -1);
        assert_eq!(DeviceError::Receive("x".into()).code(), -2);
        assert_eq!(DeviceError::InvalidResponse("x".into()).code(), -4);
        assert_eq!(DeviceError::Closed.code(), -7);
        assert_eq!(
            DeviceError::Open {
                path: "/nonexistent".into(),
                reason: "not found".into()
            }
            .code(),
            -9
        );
    }
}
