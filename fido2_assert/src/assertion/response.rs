/// One signed assertion returned by an authenticator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionEntry {
    pub(crate) authenticator_data: Vec<u8>,
    pub(crate) signature: Vec<u8>,
    pub(crate) credential_id: Vec<u8>,
    pub(crate) user_id: Option<Vec<u8>>,
}

impl AssertionEntry {
    pub fn new(authenticator_data: Vec<u8>, signature: Vec<u8>, credential_id: Vec<u8>) -> Self {
        Self {
            authenticator_data,
            signature,
            credential_id,
            user_id: None,
        }
    }

    pub fn with_user_id(mut self, user_id: Vec<u8>) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Raw authenticator data, exactly as signed.
    pub fn authenticator_data(&self) -> &[u8] {
        &self.authenticator_data
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Credential id reported by the device. Empty when the device did not
    /// echo one back.
    pub fn credential_id(&self) -> &[u8] {
        &self.credential_id
    }

    pub fn user_id(&self) -> Option<&[u8]> {
        self.user_id.as_deref()
    }
}

/// All assertions returned for one request, in device order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssertionResponse {
    entries: Vec<AssertionEntry>,
}

impl AssertionResponse {
    pub fn new(entries: Vec<AssertionEntry>) -> Self {
        Self { entries }
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[AssertionEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&AssertionEntry> {
        self.entries.get(index)
    }

    /// The only entry, or the actual entry count when there is not exactly one.
    pub fn into_single(mut self) -> Result<AssertionEntry, usize> {
        match self.entries.len() {
            1 => Ok(self.entries.remove(0)),
            n => Err(n),
        }
    }
}
