use std::fmt;

use super::errors::AssertionError;

pub const CLIENT_DATA_HASH_LEN: usize = 32;

/// SHA-256 digest of the client data, supplied by the caller.
///
/// Always exactly 32 bytes. It is signed as-is and never recomputed here.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientDataHash([u8; CLIENT_DATA_HASH_LEN]);

impl ClientDataHash {
    pub fn as_bytes(&self) -> &[u8; CLIENT_DATA_HASH_LEN] {
        &self.0
    }
}

impl From<[u8; CLIENT_DATA_HASH_LEN]> for ClientDataHash {
    fn from(bytes: [u8; CLIENT_DATA_HASH_LEN]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for ClientDataHash {
    type Error = AssertionError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let array: [u8; CLIENT_DATA_HASH_LEN] =
            bytes
                .try_into()
                .map_err(|_| AssertionError::InvalidLength {
                    field: "client data hash",
                    expected: CLIENT_DATA_HASH_LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self(array))
    }
}

impl AsRef<[u8]> for ClientDataHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for ClientDataHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClientDataHash(")?;
        for b in self.0 {
            write!(f, "{:02x}", b)?;
        }
        write!(f, ")")
    }
}

/// Transport hint attached to an allowed credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    Usb,
    Nfc,
    Ble,
    Internal,
}

impl Transport {
    pub fn as_str(self) -> &'static str {
        match self {
            Transport::Usb => "usb",
            Transport::Nfc => "nfc",
            Transport::Ble => "ble",
            Transport::Internal => "internal",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "usb" => Some(Transport::Usb),
            "nfc" => Some(Transport::Nfc),
            "ble" => Some(Transport::Ble),
            "internal" => Some(Transport::Internal),
            _ => None,
        }
    }
}

/// A credential the authenticator may use to answer the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedCredential {
    pub(crate) id: Vec<u8>,
    pub(crate) transports: Vec<Transport>,
}

impl AllowedCredential {
    pub fn id(&self) -> &[u8] {
        &self.id
    }

    pub fn transports(&self) -> &[Transport] {
        &self.transports
    }
}

/// User presence / user verification options of a request.
///
/// Both default to false. They are passed through independently: the
/// request layer does not enforce any combination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssertionOptions {
    pub user_presence: bool,
    pub user_verification: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_data_hash_length() {
        assert!(ClientDataHash::try_from(&[0u8; 32][..]).is_ok());

        let short = ClientDataHash::try_from(&[0u8; 31][..]);
        assert_eq!(
            short,
            Err(AssertionError::InvalidLength {
                field: "client data hash",
                expected: 32,
                actual: 31
            })
        );
        assert!(ClientDataHash::try_from(&[0u8; 33][..]).is_err());
        assert!(ClientDataHash::try_from(&[0u8; 0][..]).is_err());
    }

    #[test]
    fn test_client_data_hash_debug_is_hex() {
        let cdh = ClientDataHash::from([0xab; 32]);
        let debug = format!("{:?}", cdh);
        assert!(debug.starts_with("ClientDataHash(abab"));
        assert_eq!(debug.len(), "ClientDataHash()".len() + 64);
    }

    #[test]
    fn test_transport_names() {
        for t in [
            Transport::Usb,
            Transport::Nfc,
            Transport::Ble,
            Transport::Internal,
        ] {
            assert_eq!(Transport::from_name(t.as_str()), Some(t));
        }
        assert_eq!(Transport::from_name("hybrid"), None);
    }
}
