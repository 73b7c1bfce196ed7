use crate::assertion::ClientDataHash;

/// The exact byte sequence an authenticator signs for an assertion:
/// `authenticator_data || client_data_hash`.
///
/// Neither part is hashed here. The client-data hash is already a digest and
/// is appended untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedMessage(Vec<u8>);

impl SignedMessage {
    pub fn new(authenticator_data: &[u8], client_data_hash: &ClientDataHash) -> Self {
        let mut signed_data = Vec::with_capacity(authenticator_data.len() + 32);
        signed_data.extend_from_slice(authenticator_data);
        signed_data.extend_from_slice(client_data_hash.as_bytes());

        tracing::debug!("Signed data length: {}", signed_data.len());
        Self(signed_data)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for SignedMessage {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
