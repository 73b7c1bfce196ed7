//! Software authenticator described by a JSON file, usable wherever a real
//! device session is expected.

mod description;
mod token;

use ring::digest;

pub use description::{CredentialDescription, DeviceDescription};
use token::{VirtualToken, pin_uv_auth_param};

use super::ctap2::{decode_get_assertion_response, encode_get_assertion, encode_get_next_assertion};
use super::errors::DeviceError;
use super::session::{Authenticator, DeviceSession};
use super::status::{CTAP2_ERR_NO_CREDENTIALS, CTAP2_ERR_UNSUPPORTED_OPTION};
use crate::assertion::{AssertionEntry, AssertionRequest, AssertionResponse};

/// Opens [`VirtualSession`]s from device description files.
#[derive(Debug, Clone, Copy, Default)]
pub struct VirtualAuthenticator;

impl Authenticator for VirtualAuthenticator {
    type Session = VirtualSession;

    fn open(&self, path: &str) -> Result<VirtualSession, DeviceError> {
        let open_error = |reason: String| DeviceError::Open {
            path: path.to_string(),
            reason,
        };

        let body = std::fs::read_to_string(path).map_err(|e| open_error(e.to_string()))?;
        let description: DeviceDescription =
            serde_json::from_str(&body).map_err(|e| open_error(format!("invalid description: {e}")))?;

        VirtualSession::from_description(&description).map_err(|e| match e {
            DeviceError::InvalidArgument(reason) => open_error(reason),
            other => other,
        })
    }
}

/// An open session with a virtual token.
pub struct VirtualSession {
    token: VirtualToken,
    u2f: bool,
    closed: bool,
}

impl VirtualSession {
    /// Builds a session straight from a description, without a file.
    ///
    /// # Errors
    /// * `DeviceError::InvalidArgument` - If a credential cannot be decoded
    pub fn from_description(description: &DeviceDescription) -> Result<Self, DeviceError> {
        let token = VirtualToken::from_description(description).map_err(DeviceError::InvalidArgument)?;
        Ok(Self {
            token,
            u2f: false,
            closed: false,
        })
    }

    /// Current signature counter of the underlying token.
    pub fn sign_count(&self) -> u32 {
        self.token.sign_count()
    }

    pub fn is_u2f(&self) -> bool {
        self.u2f
    }

    fn ctap2_get_assertion(
        &mut self,
        request: &AssertionRequest,
        pin: Option<&str>,
        client_data_hash: &[u8],
    ) -> Result<AssertionResponse, DeviceError> {
        let pin_auth = match pin {
            Some(pin) => {
                let pin_token = self.token.get_pin_token(pin).map_err(DeviceError::Status)?;
                Some(pin_uv_auth_param(&pin_token, client_data_hash))
            }
            None => None,
        };

        let frame = encode_get_assertion(request, pin_auth.as_deref())?;
        let first = decode_get_assertion_response(&self.token.transact(&frame))?;

        let total = first.number_of_credentials.unwrap_or(1).max(1);
        let mut entries = Vec::with_capacity(total);
        entries.push(first.entry);
        for _ in 1..total {
            let next =
                decode_get_assertion_response(&self.token.transact(&encode_get_next_assertion()))?;
            entries.push(next.entry);
        }

        // A token may leave out the descriptor when the allow list had one entry
        if let [only] = request.allow_list() {
            for entry in entries.iter_mut().filter(|e| e.credential_id.is_empty()) {
                entry.credential_id = only.id().to_vec();
            }
        }

        Ok(AssertionResponse::new(entries))
    }

    fn u2f_get_assertion(
        &mut self,
        request: &AssertionRequest,
        rp_id: &str,
        client_data_hash: &[u8],
    ) -> Result<AssertionResponse, DeviceError> {
        if request.allow_list().is_empty() || request.options().user_verification {
            return Err(DeviceError::Status(CTAP2_ERR_UNSUPPORTED_OPTION));
        }

        let app_param = digest::digest(&digest::SHA256, rp_id.as_bytes());
        let mut last_error = DeviceError::Status(CTAP2_ERR_NO_CREDENTIALS);

        for cred in request.allow_list() {
            match self
                .token
                .u2f_authenticate(app_param.as_ref(), client_data_hash, cred.id())
            {
                Ok(response) => {
                    if response.len() < 5 {
                        return Err(DeviceError::InvalidResponse(
                            "short U2F authenticate response".to_string(),
                        ));
                    }
                    let mut auth_data = app_param.as_ref().to_vec();
                    auth_data.extend_from_slice(&response[..5]);
                    let entry =
                        AssertionEntry::new(auth_data, response[5..].to_vec(), cred.id().to_vec());
                    return Ok(AssertionResponse::new(vec![entry]));
                }
                Err(status) => {
                    tracing::debug!("U2F key handle rejected with status 0x{:02x}", status);
                    last_error = DeviceError::Status(status);
                }
            }
        }
        Err(last_error)
    }
}

impl DeviceSession for VirtualSession {
    fn force_u2f(&mut self) {
        self.u2f = true;
    }

    fn get_assertion(
        &mut self,
        request: &AssertionRequest,
        pin: Option<&str>,
    ) -> Result<AssertionResponse, DeviceError> {
        if self.closed {
            return Err(DeviceError::Closed);
        }
        let (Some(client_data_hash), Some(rp_id)) = (request.client_data_hash(), request.rp_id())
        else {
            return Err(DeviceError::InvalidArgument(
                "request needs a client data hash and a relying party".to_string(),
            ));
        };
        let client_data_hash = *client_data_hash.as_bytes();

        let response = if self.u2f {
            if pin.is_some() {
                tracing::debug!("Ignoring PIN in U2F mode");
            }
            self.u2f_get_assertion(request, rp_id, &client_data_hash)?
        } else {
            self.ctap2_get_assertion(request, pin, &client_data_hash)?
        };

        tracing::debug!("Virtual device returned {} assertion(s)", response.count());
        Ok(response)
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        self.closed = true;
        Ok(())
    }
}
