//! fido2-assert - FIDO2/CTAP2 get-assertion flow
//!
//! This crate builds assertion requests, sends them to an authenticator
//! through a device session, and verifies the returned ES256 or RS256
//! signature against a known credential public key. A JSON-described
//! virtual authenticator stands in for hardware.

mod assertion;
mod config;
mod coordination;
pub mod device;
mod keys;
mod utils;
mod verify;

#[cfg(test)]
mod test_utils;

pub use assertion::{
    AUTH_DATA_MIN_LEN, AllowedCredential, AssertionEntry, AssertionError, AssertionOptions,
    AssertionRequest, AssertionResponse, AuthenticatorDataView, CLIENT_DATA_HASH_LEN,
    ClientDataHash, Transport, auth_data_flags,
};

pub use config::{ASSERT_CLIENT_DATA_HASH, ASSERT_RP_ID, DEFAULT_CLIENT_DATA_HASH, DEFAULT_RP_ID};

pub use coordination::{
    AssertionSettings, CoordinationError, Stage, build_request, run_assertion,
    run_assertion_with_key_file,
};

pub use device::{
    Authenticator, DeviceError, DeviceSession, OpenDevice, VirtualAuthenticator, VirtualSession,
};

pub use keys::{
    CoseAlgorithm, EcPoint, KeyError, KeyMaterial, RSA_MAX_MODULUS_BITS, RSA_MIN_MODULUS_BITS,
    RsaComponents, load_public_key, parse_public_key,
};

pub use utils::{UtilError, read_blob};

pub use verify::{SignedMessage, VerificationError, check_authenticator_data, verify_signature};
