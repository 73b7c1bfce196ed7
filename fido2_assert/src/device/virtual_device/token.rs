use std::collections::VecDeque;

use ring::rand::{SecureRandom, SystemRandom};
use ring::{digest, hmac};
use subtle::ConstantTimeEq;

use super::description::{DeviceDescription, StoredCredential};
use crate::assertion::{AssertionEntry, CLIENT_DATA_HASH_LEN, auth_data_flags};
use crate::device::ctap2::{
    CTAP2_CMD_GET_ASSERTION, CTAP2_CMD_GET_NEXT_ASSERTION, decode_get_assertion_command,
    encode_get_assertion_response,
};
use crate::device::status::{
    CTAP1_ERR_INVALID_COMMAND, CTAP1_ERR_INVALID_LENGTH, CTAP1_ERR_OTHER,
    CTAP2_ERR_NO_CREDENTIALS, CTAP2_ERR_NOT_ALLOWED, CTAP2_ERR_PIN_AUTH_INVALID,
    CTAP2_ERR_PIN_INVALID, CTAP2_ERR_PIN_NOT_SET, CTAP2_ERR_PIN_REQUIRED, CTAP2_ERR_UNSUPPORTED_OPTION,
};
use crate::keys::CoseAlgorithm;
use crate::utils::base64url_encode;

/// Length of `pinUvAuthParam` (truncated HMAC-SHA-256).
pub(crate) const PIN_UV_AUTH_PARAM_LEN: usize = 16;
const PIN_TOKEN_LEN: usize = 32;

/// `HMAC-SHA-256(pin_token, client_data_hash)[..16]`
pub(crate) fn pin_uv_auth_param(pin_token: &[u8], client_data_hash: &[u8]) -> Vec<u8> {
    let key = hmac::Key::new(hmac::HMAC_SHA256, pin_token);
    let tag = hmac::sign(&key, client_data_hash);
    tag.as_ref()[..PIN_UV_AUTH_PARAM_LEN].to_vec()
}

/// Assertions waiting to be fetched with `authenticatorGetNextAssertion`.
struct PendingAssertions {
    credentials: VecDeque<usize>,
    rp_id_hash: Vec<u8>,
    client_data_hash: Vec<u8>,
    flags: u8,
}

/// Software authenticator state: stored credentials, PIN, signature counter.
///
/// It answers raw command frames the way a CTAP2 token would, and exposes a
/// U2F authenticate operation for the legacy profile.
pub(crate) struct VirtualToken {
    credentials: Vec<StoredCredential>,
    pin: Option<String>,
    pin_token: Option<[u8; PIN_TOKEN_LEN]>,
    sign_count: u32,
    pending: Option<PendingAssertions>,
    rng: SystemRandom,
}

impl VirtualToken {
    pub fn from_description(description: &DeviceDescription) -> Result<Self, String> {
        let rng = SystemRandom::new();
        let credentials = description
            .credentials
            .iter()
            .enumerate()
            .map(|(i, cred)| {
                StoredCredential::from_description(cred, &rng)
                    .map_err(|e| format!("credential #{i}: {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            "Virtual token with {} credential(s), PIN {}",
            credentials.len(),
            if description.pin.is_some() { "set" } else { "not set" }
        );

        Ok(Self {
            credentials,
            pin: description.pin.clone(),
            pin_token: None,
            sign_count: description.sign_count,
            pending: None,
            rng,
        })
    }

    pub fn sign_count(&self) -> u32 {
        self.sign_count
    }

    /// Checks `pin` and hands out a fresh PIN token.
    ///
    /// The error is the CTAP status byte: `PIN_NOT_SET` when no PIN is
    /// configured, `PIN_INVALID` when it does not match.
    pub fn get_pin_token(&mut self, pin: &str) -> Result<[u8; PIN_TOKEN_LEN], u8> {
        let Some(expected) = &self.pin else {
            return Err(CTAP2_ERR_PIN_NOT_SET);
        };
        if !bool::from(pin.as_bytes().ct_eq(expected.as_bytes())) {
            tracing::warn!("Virtual token rejected PIN");
            return Err(CTAP2_ERR_PIN_INVALID);
        }

        let mut token = [0u8; PIN_TOKEN_LEN];
        self.rng.fill(&mut token).map_err(|_| CTAP1_ERR_OTHER)?;
        self.pin_token = Some(token);
        Ok(token)
    }

    /// Processes one CTAP2 command frame and returns the reply frame
    /// (status byte followed by the CBOR body on success).
    pub fn transact(&mut self, frame: &[u8]) -> Vec<u8> {
        let result = match frame.split_first() {
            Some((&CTAP2_CMD_GET_ASSERTION, body)) => self.get_assertion(body),
            Some((&CTAP2_CMD_GET_NEXT_ASSERTION, _)) => self.get_next_assertion(),
            Some((&command, _)) => {
                tracing::warn!("Virtual token: unsupported command 0x{:02x}", command);
                Err(CTAP1_ERR_INVALID_COMMAND)
            }
            None => Err(CTAP1_ERR_INVALID_LENGTH),
        };

        match result {
            Ok(reply) => reply,
            Err(status) => {
                tracing::debug!("Virtual token answers status 0x{:02x}", status);
                vec![status]
            }
        }
    }

    fn get_assertion(&mut self, body: &[u8]) -> Result<Vec<u8>, u8> {
        self.pending = None;
        let command = decode_get_assertion_command(body)?;
        if command.client_data_hash.len() != CLIENT_DATA_HASH_LEN {
            return Err(CTAP1_ERR_INVALID_LENGTH);
        }

        let user_verified = match &command.pin_uv_auth_param {
            Some(param) => {
                let Some(pin_token) = &self.pin_token else {
                    return Err(CTAP2_ERR_PIN_REQUIRED);
                };
                let expected = pin_uv_auth_param(pin_token, &command.client_data_hash);
                if !bool::from(param.as_slice().ct_eq(expected.as_slice())) {
                    return Err(CTAP2_ERR_PIN_AUTH_INVALID);
                }
                true
            }
            None => false,
        };

        if command.uv == Some(true) && !user_verified {
            return Err(if self.pin.is_some() {
                CTAP2_ERR_PIN_REQUIRED
            } else {
                CTAP2_ERR_UNSUPPORTED_OPTION
            });
        }

        let mut flags = 0;
        if command.up.unwrap_or(true) {
            flags |= auth_data_flags::UP;
        }
        if user_verified {
            flags |= auth_data_flags::UV;
        }

        let rp_id_hash = digest::digest(&digest::SHA256, command.rp_id.as_bytes())
            .as_ref()
            .to_vec();

        if !command.allow_list.is_empty() {
            let index = command
                .allow_list
                .iter()
                .find_map(|allowed| {
                    self.credentials
                        .iter()
                        .position(|c| c.id == allowed.id() && c.rp_id == command.rp_id)
                })
                .ok_or(CTAP2_ERR_NO_CREDENTIALS)?;

            let entry = self.sign_entry(index, &rp_id_hash, flags, &command.client_data_hash)?;
            return encode_get_assertion_response(&entry, None).map_err(|_| CTAP1_ERR_OTHER);
        }

        let mut matches: VecDeque<usize> = self
            .credentials
            .iter()
            .enumerate()
            .filter(|(_, c)| c.discoverable && c.rp_id == command.rp_id)
            .map(|(i, _)| i)
            .collect();
        let total = matches.len();
        let first = matches.pop_front().ok_or(CTAP2_ERR_NO_CREDENTIALS)?;

        let entry = self.sign_entry(first, &rp_id_hash, flags, &command.client_data_hash)?;
        let reply = encode_get_assertion_response(&entry, Some(total)).map_err(|_| CTAP1_ERR_OTHER)?;

        if !matches.is_empty() {
            self.pending = Some(PendingAssertions {
                credentials: matches,
                rp_id_hash,
                client_data_hash: command.client_data_hash,
                flags,
            });
        }
        Ok(reply)
    }

    fn get_next_assertion(&mut self) -> Result<Vec<u8>, u8> {
        let mut pending = self.pending.take().ok_or(CTAP2_ERR_NOT_ALLOWED)?;
        let index = pending
            .credentials
            .pop_front()
            .ok_or(CTAP2_ERR_NOT_ALLOWED)?;

        let entry = self.sign_entry(
            index,
            &pending.rp_id_hash,
            pending.flags,
            &pending.client_data_hash,
        )?;
        if !pending.credentials.is_empty() {
            self.pending = Some(pending);
        }
        encode_get_assertion_response(&entry, None).map_err(|_| CTAP1_ERR_OTHER)
    }

    /// U2F authenticate: returns `flags || counter || signature` for the key
    /// handle registered under `app_param`. Only ES256 credentials qualify.
    pub fn u2f_authenticate(
        &mut self,
        app_param: &[u8],
        challenge: &[u8],
        key_handle: &[u8],
    ) -> Result<Vec<u8>, u8> {
        let index = self
            .credentials
            .iter()
            .position(|c| {
                c.id == key_handle
                    && c.key.algorithm() == CoseAlgorithm::Es256
                    && digest::digest(&digest::SHA256, c.rp_id.as_bytes()).as_ref() == app_param
            })
            .ok_or(CTAP2_ERR_NO_CREDENTIALS)?;

        let entry = self.sign_entry(index, app_param, auth_data_flags::UP, challenge)?;
        let mut response = entry.authenticator_data()[app_param.len()..].to_vec();
        response.extend_from_slice(entry.signature());
        Ok(response)
    }

    fn sign_entry(
        &mut self,
        index: usize,
        rp_id_hash: &[u8],
        flags: u8,
        client_data_hash: &[u8],
    ) -> Result<AssertionEntry, u8> {
        let credential = self.credentials.get(index).ok_or(CTAP1_ERR_OTHER)?;
        let counter = self.sign_count.wrapping_add(1);

        let mut auth_data = rp_id_hash.to_vec();
        auth_data.push(flags);
        auth_data.extend_from_slice(&counter.to_be_bytes());

        let mut message = auth_data.clone();
        message.extend_from_slice(client_data_hash);

        let signature = credential.key.sign(&message, &self.rng).map_err(|e| {
            tracing::error!("Virtual token signing failed: {}", e);
            CTAP1_ERR_OTHER
        })?;

        tracing::debug!(
            "Virtual token signed with credential {} ({}), counter {}",
            base64url_encode(&credential.id),
            credential.key.algorithm(),
            counter
        );

        let mut entry = AssertionEntry::new(auth_data, signature, credential.id.clone());
        if let Some(user_id) = &credential.user_id {
            entry = entry.with_user_id(user_id.clone());
        }
        self.sign_count = counter;
        Ok(entry)
    }
}
