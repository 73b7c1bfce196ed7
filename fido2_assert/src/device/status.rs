//! CTAP status bytes and the `FIDO_ERR_*` codes used for failures that
//! never reach the authenticator.

pub const CTAP2_OK: u8 = 0x00;
pub const CTAP1_ERR_INVALID_COMMAND: u8 = 0x01;
pub const CTAP1_ERR_INVALID_LENGTH: u8 = 0x03;
pub const CTAP2_ERR_INVALID_CBOR: u8 = 0x12;
pub const CTAP2_ERR_MISSING_PARAMETER: u8 = 0x14;
pub const CTAP2_ERR_UNSUPPORTED_OPTION: u8 = 0x2B;
pub const CTAP2_ERR_NO_CREDENTIALS: u8 = 0x2E;
pub const CTAP2_ERR_NOT_ALLOWED: u8 = 0x30;
pub const CTAP2_ERR_PIN_INVALID: u8 = 0x31;
pub const CTAP2_ERR_PIN_AUTH_INVALID: u8 = 0x33;
pub const CTAP2_ERR_PIN_NOT_SET: u8 = 0x35;
pub const CTAP2_ERR_PIN_REQUIRED: u8 = 0x36;
pub const CTAP1_ERR_OTHER: u8 = 0x7F;

pub const FIDO_ERR_TX: i32 = -1;
pub const FIDO_ERR_RX: i32 = -2;
pub const FIDO_ERR_RX_INVALID_CBOR: i32 = -4;
pub const FIDO_ERR_INVALID_PARAM: i32 = -5;
pub const FIDO_ERR_INVALID_SIG: i32 = -6;
pub const FIDO_ERR_INVALID_ARGUMENT: i32 = -7;
pub const FIDO_ERR_INTERNAL: i32 = -9;

/// Short name of a CTAP status byte, as printed in diagnostics.
pub fn status_name(status: u8) -> &'static str {
    match status {
        CTAP2_OK => "FIDO_OK",
        CTAP1_ERR_INVALID_COMMAND => "FIDO_ERR_INVALID_COMMAND",
        CTAP1_ERR_INVALID_LENGTH => "FIDO_ERR_INVALID_LENGTH",
        CTAP2_ERR_INVALID_CBOR => "FIDO_ERR_INVALID_CBOR",
        CTAP2_ERR_MISSING_PARAMETER => "FIDO_ERR_MISSING_PARAMETER",
        CTAP2_ERR_UNSUPPORTED_OPTION => "FIDO_ERR_UNSUPPORTED_OPTION",
        CTAP2_ERR_NO_CREDENTIALS => "FIDO_ERR_NO_CREDENTIALS",
        CTAP2_ERR_NOT_ALLOWED => "FIDO_ERR_NOT_ALLOWED",
        CTAP2_ERR_PIN_INVALID => "FIDO_ERR_PIN_INVALID",
        CTAP2_ERR_PIN_AUTH_INVALID => "FIDO_ERR_PIN_AUTH_INVALID",
        CTAP2_ERR_PIN_NOT_SET => "FIDO_ERR_PIN_NOT_SET",
        CTAP2_ERR_PIN_REQUIRED => "FIDO_ERR_PIN_REQUIRED",
        CTAP1_ERR_OTHER => "FIDO_ERR_ERR_OTHER",
        _ => "FIDO_ERR_UNKNOWN",
    }
}
