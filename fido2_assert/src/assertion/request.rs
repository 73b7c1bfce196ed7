use super::errors::AssertionError;
use super::types::{AllowedCredential, AssertionOptions, ClientDataHash, Transport};

/// A get-assertion request, filled in by the caller before it is handed to a
/// device session.
///
/// The builder methods only change internal state. The relying party is
/// fixed once set: a second `set_relying_party` call is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssertionRequest {
    client_data_hash: Option<ClientDataHash>,
    rp_id: Option<String>,
    allow_list: Vec<AllowedCredential>,
    options: AssertionOptions,
}

impl AssertionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the client-data hash.
    ///
    /// # Errors
    /// * `AssertionError::InvalidLength` - If `hash` is not exactly 32 bytes
    pub fn set_client_data_hash(&mut self, hash: &[u8]) -> Result<&mut Self, AssertionError> {
        self.client_data_hash = Some(ClientDataHash::try_from(hash)?);
        Ok(self)
    }

    /// Sets the relying party id (e.g. a hostname).
    ///
    /// # Errors
    /// * `AssertionError::InvalidArgument` - If `id` is empty or the relying
    ///   party has already been set to a different value
    pub fn set_relying_party(&mut self, id: &str) -> Result<&mut Self, AssertionError> {
        if id.is_empty() {
            return Err(AssertionError::InvalidArgument(
                "relying party id must not be empty".to_string(),
            ));
        }
        match &self.rp_id {
            Some(existing) if existing != id => {
                return Err(AssertionError::InvalidArgument(format!(
                    "relying party already set to '{}'",
                    existing
                )));
            }
            _ => self.rp_id = Some(id.to_string()),
        }
        Ok(self)
    }

    /// Appends a credential id to the allow list. Duplicates are kept.
    ///
    /// # Errors
    /// * `AssertionError::InvalidArgument` - If `id` is empty
    pub fn add_allowed_credential(&mut self, id: &[u8]) -> Result<&mut Self, AssertionError> {
        self.add_allowed_credential_with_transports(id, &[])
    }

    /// Appends a credential id together with transport hints.
    pub fn add_allowed_credential_with_transports(
        &mut self,
        id: &[u8],
        transports: &[Transport],
    ) -> Result<&mut Self, AssertionError> {
        if id.is_empty() {
            return Err(AssertionError::InvalidArgument(
                "credential id must not be empty".to_string(),
            ));
        }
        self.allow_list.push(AllowedCredential {
            id: id.to_vec(),
            transports: transports.to_vec(),
        });
        Ok(self)
    }

    /// Sets the user presence / user verification options. Last write wins.
    pub fn set_options(&mut self, user_presence: bool, user_verification: bool) -> &mut Self {
        self.options = AssertionOptions {
            user_presence,
            user_verification,
        };
        self
    }

    pub fn client_data_hash(&self) -> Option<&ClientDataHash> {
        self.client_data_hash.as_ref()
    }

    pub fn rp_id(&self) -> Option<&str> {
        self.rp_id.as_deref()
    }

    pub fn allow_list(&self) -> &[AllowedCredential] {
        &self.allow_list
    }

    pub fn options(&self) -> AssertionOptions {
        self.options
    }

    /// Both mandatory fields (client-data hash, relying party) are present.
    pub fn is_complete(&self) -> bool {
        self.client_data_hash.is_some() && self.rp_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_request_defaults() {
        let request = AssertionRequest::new();

        assert!(request.client_data_hash().is_none());
        assert!(request.rp_id().is_none());
        assert!(request.allow_list().is_empty());
        assert_eq!(request.options(), AssertionOptions::default());
        assert!(!request.options().user_presence);
        assert!(!request.options().user_verification);
        assert!(!request.is_complete());
    }

    #[test]
    fn test_set_client_data_hash() {
        let mut request = AssertionRequest::new();

        // Given a 32 byte hash, it is stored as-is
        request.set_client_data_hash(&[0x42; 32]).unwrap();
        assert_eq!(request.client_data_hash().unwrap().as_bytes(), &[0x42; 32]);

        // Wrong lengths are rejected and leave the previous value alone
        let result = request.set_client_data_hash(&[0x42; 20]);
        assert!(matches!(
            result,
            Err(AssertionError::InvalidLength {
                expected: 32,
                actual: 20,
                ..
            })
        ));
        assert_eq!(request.client_data_hash().unwrap().as_bytes(), &[0x42; 32]);
    }

    #[test]
    fn test_set_relying_party() {
        let mut request = AssertionRequest::new();

        let empty = request.set_relying_party("");
        assert!(matches!(empty, Err(AssertionError::InvalidArgument(_))));

        request.set_relying_party("localhost").unwrap();
        assert_eq!(request.rp_id(), Some("localhost"));

        // Setting the same value again is harmless, changing it is not
        assert!(request.set_relying_party("localhost").is_ok());
        let changed = request.set_relying_party("example.com");
        assert!(matches!(changed, Err(AssertionError::InvalidArgument(msg)) if msg.contains("localhost")));
        assert_eq!(request.rp_id(), Some("localhost"));
    }

    #[test]
    fn test_allowed_credentials_keep_insertion_order_and_duplicates() {
        let mut request = AssertionRequest::new();
        request
            .add_allowed_credential(b"cred-b")
            .unwrap()
            .add_allowed_credential(b"cred-a")
            .unwrap()
            .add_allowed_credential_with_transports(b"cred-b", &[Transport::Usb, Transport::Nfc])
            .unwrap();

        let ids: Vec<&[u8]> = request.allow_list().iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![&b"cred-b"[..], &b"cred-a"[..], &b"cred-b"[..]]);
        assert!(request.allow_list()[0].transports().is_empty());
        assert_eq!(
            request.allow_list()[2].transports(),
            &[Transport::Usb, Transport::Nfc]
        );
    }

    #[test]
    fn test_empty_credential_id_rejected() {
        let mut request = AssertionRequest::new();
        let result = request.add_allowed_credential(&[]);
        assert!(matches!(result, Err(AssertionError::InvalidArgument(_))));
        assert!(request.allow_list().is_empty());
    }

    #[test]
    fn test_set_options_last_write_wins() {
        let mut request = AssertionRequest::new();

        request.set_options(true, true);
        assert_eq!(
            request.options(),
            AssertionOptions {
                user_presence: true,
                user_verification: true
            }
        );

        request.set_options(false, true);
        assert!(!request.options().user_presence);
        assert!(request.options().user_verification);
    }

    #[test]
    fn test_is_complete() {
        let mut request = AssertionRequest::new();
        request.set_client_data_hash(&[0u8; 32]).unwrap();
        assert!(!request.is_complete());
        request.set_relying_party("localhost").unwrap();
        assert!(request.is_complete());
    }
}
