use super::errors::AssertionError;

/// Minimum authenticator data size: rpIdHash (32) + flags (1) + signCount (4).
pub const AUTH_DATA_MIN_LEN: usize = 37;

/// Flags for AuthenticatorData as defined in WebAuthn Level 2
pub mod auth_data_flags {
    /// User Present (UP) - Bit 0
    pub const UP: u8 = 1 << 0;
    /// User Verified (UV) - Bit 2
    pub const UV: u8 = 1 << 2;
    /// Backup Eligibility (BE) - Bit 3
    pub const BE: u8 = 1 << 3;
    /// Backup State (BS) - Bit 4
    pub const BS: u8 = 1 << 4;
    /// Attested Credential Data Present - Bit 6
    pub const AT: u8 = 1 << 6;
    /// Extension Data Present - Bit 7
    pub const ED: u8 = 1 << 7;
}

/// Read-only decoded view over authenticator data bytes.
///
/// Signature verification never uses this: it signs and verifies the raw
/// bytes. The view exists for logging and for the optional strict policy
/// check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatorDataView<'a> {
    pub rp_id_hash: &'a [u8],
    pub flags: u8,
    pub counter: u32,
    /// Attested credential data and extensions, undecoded
    pub trailing: &'a [u8],
}

impl<'a> AuthenticatorDataView<'a> {
    /// Decode the fixed-size header of authenticator data
    /// Format (minimum 37 bytes):
    /// - RP ID Hash (32 bytes)
    /// - Flags (1 byte)
    /// - Counter (4 bytes)
    /// - Optional: Attested Credential Data
    /// - Optional: Extensions
    pub fn parse(data: &'a [u8]) -> Result<Self, AssertionError> {
        if data.len() < AUTH_DATA_MIN_LEN {
            return Err(AssertionError::InvalidLength {
                field: "authenticator data",
                expected: AUTH_DATA_MIN_LEN,
                actual: data.len(),
            });
        }

        Ok(Self {
            rp_id_hash: &data[..32],
            flags: data[32],
            counter: u32::from_be_bytes([data[33], data[34], data[35], data[36]]),
            trailing: &data[AUTH_DATA_MIN_LEN..],
        })
    }

    pub fn is_user_present(&self) -> bool {
        (self.flags & auth_data_flags::UP) != 0
    }

    pub fn is_user_verified(&self) -> bool {
        (self.flags & auth_data_flags::UV) != 0
    }

    pub fn is_backup_eligible(&self) -> bool {
        (self.flags & auth_data_flags::BE) != 0
    }

    pub fn is_backed_up(&self) -> bool {
        (self.flags & auth_data_flags::BS) != 0
    }

    pub fn has_attested_credential_data(&self) -> bool {
        (self.flags & auth_data_flags::AT) != 0
    }

    pub fn has_extension_data(&self) -> bool {
        (self.flags & auth_data_flags::ED) != 0
    }

    pub(crate) fn log_details(&self) {
        tracing::debug!("User present: {}", self.is_user_present());
        tracing::debug!("User verified: {}", self.is_user_verified());
        tracing::debug!("Backup eligible: {}", self.is_backup_eligible());
        tracing::debug!("Backed up: {}", self.is_backed_up());
        tracing::debug!(
            "Attested credential data: {}",
            self.has_attested_credential_data()
        );
        tracing::debug!("Extension data: {}", self.has_extension_data());
        tracing::debug!("Sign count: {}", self.counter);
    }
}
