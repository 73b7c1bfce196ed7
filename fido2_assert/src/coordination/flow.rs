use std::path::Path;

use super::errors::{CoordinationError, Stage};
use crate::assertion::{AssertionEntry, AssertionRequest, ClientDataHash};
use crate::config::{ASSERT_CLIENT_DATA_HASH, ASSERT_RP_ID, DEFAULT_CLIENT_DATA_HASH, DEFAULT_RP_ID};
use crate::device::{Authenticator, DeviceError, OpenDevice};
use crate::keys::{CoseAlgorithm, KeyMaterial, load_public_key};
use crate::utils::base64url_encode;
use crate::verify::{SignedMessage, check_authenticator_data, verify_signature};

/// Everything an assertion run needs apart from the key and the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionSettings {
    pub algorithm: CoseAlgorithm,
    pub client_data_hash: ClientDataHash,
    pub rp_id: String,
    /// Credential ids in the order they are offered to the device
    pub allowed_credentials: Vec<Vec<u8>>,
    pub user_presence: bool,
    pub user_verification: bool,
    pub pin: Option<String>,
    pub force_u2f: bool,
    /// Check rpIdHash and UP/UV flags before verifying the signature
    pub strict: bool,
}

impl Default for AssertionSettings {
    fn default() -> Self {
        Self {
            algorithm: CoseAlgorithm::Es256,
            client_data_hash: ClientDataHash::from(DEFAULT_CLIENT_DATA_HASH),
            rp_id: DEFAULT_RP_ID.to_string(),
            allowed_credentials: Vec::new(),
            user_presence: false,
            user_verification: false,
            pin: None,
            force_u2f: false,
            strict: false,
        }
    }
}

impl AssertionSettings {
    /// Defaults taken from `ASSERT_CLIENT_DATA_HASH` / `ASSERT_RP_ID`.
    pub fn from_env() -> Self {
        Self {
            client_data_hash: *ASSERT_CLIENT_DATA_HASH,
            rp_id: ASSERT_RP_ID.clone(),
            ..Self::default()
        }
    }
}

/// Builds the assertion request described by `settings`.
pub fn build_request(settings: &AssertionSettings) -> Result<AssertionRequest, CoordinationError> {
    let mut request = AssertionRequest::new();

    request
        .set_client_data_hash(settings.client_data_hash.as_bytes())
        .map_err(|source| CoordinationError::Request {
            stage: Stage::SetClientDataHash,
            source,
        })?;
    request
        .set_relying_party(&settings.rp_id)
        .map_err(|source| CoordinationError::Request {
            stage: Stage::SetRelyingParty,
            source,
        })?;
    for id in &settings.allowed_credentials {
        request
            .add_allowed_credential(id)
            .map_err(|source| CoordinationError::Request {
                stage: Stage::AllowCredential,
                source,
            })?;
    }
    request.set_options(settings.user_presence, settings.user_verification);

    Ok(request)
}

/// Loads the credential public key from `key_path`, then runs
/// [`run_assertion`].
pub fn run_assertion_with_key_file<A: Authenticator>(
    authenticator: &A,
    key_path: impl AsRef<Path>,
    device_path: &str,
    settings: &AssertionSettings,
) -> Result<AssertionEntry, CoordinationError> {
    let key = load_public_key(key_path, settings.algorithm).map_err(|source| {
        CoordinationError::KeyLoad {
            stage: Stage::ReadPublicKey,
            source,
        }
    })?;

    run_assertion(authenticator, &key, device_path, settings)
}

/// Runs one get-assertion round trip and verifies the result.
///
/// The device is opened, used and closed before the entry count is checked,
/// so a device that returns several assertions still completes the full
/// round trip. The device is closed on every error path.
///
/// # Arguments
/// * `authenticator` - Opens the device session
/// * `key` - Credential public key the signature must verify under
/// * `device_path` - Device locator
/// * `settings` - Request parameters and flow options
///
/// # Returns
/// * `Ok(AssertionEntry)` - The single verified assertion
/// * `Err(CoordinationError)` - The first failing stage
pub fn run_assertion<A: Authenticator>(
    authenticator: &A,
    key: &KeyMaterial,
    device_path: &str,
    settings: &AssertionSettings,
) -> Result<AssertionEntry, CoordinationError> {
    let request = build_request(settings)?;

    let device_error = |stage: Stage| {
        move |source: DeviceError| CoordinationError::Device { stage, source }
    };

    let mut device =
        OpenDevice::open(authenticator, device_path).map_err(device_error(Stage::DeviceOpen))?;
    if settings.force_u2f {
        device.force_u2f();
    }
    let response = device
        .get_assertion(&request, settings.pin.as_deref())
        .map_err(device_error(Stage::DeviceGetAssertion))?;
    device.close().map_err(device_error(Stage::DeviceClose))?;

    let entry = response
        .into_single()
        .map_err(|count| CoordinationError::ProtocolCount { count })?;
    tracing::debug!(
        "Assertion from credential {}",
        base64url_encode(entry.credential_id())
    );

    if settings.strict {
        check_authenticator_data(entry.authenticator_data(), &settings.rp_id, request.options())
            .map_err(|source| CoordinationError::Verification {
                stage: Stage::CheckAuthenticatorData,
                source,
            })?;
    }

    let message = SignedMessage::new(entry.authenticator_data(), &settings.client_data_hash);
    verify_signature(message.as_bytes(), entry.signature(), key, settings.algorithm).map_err(
        |source| CoordinationError::Verification {
            stage: Stage::AssertionVerify,
            source,
        },
    )?;

    tracing::info!("Assertion verified for '{}'", settings.rp_id);
    Ok(entry)
}
