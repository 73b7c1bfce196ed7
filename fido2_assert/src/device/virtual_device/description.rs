use ring::rand::SystemRandom;
use ring::signature::{self, EcdsaKeyPair, RsaKeyPair};
use serde::{Deserialize, Serialize};

use crate::keys::CoseAlgorithm;
use crate::utils::base64url_decode;

/// On-disk description of a virtual authenticator.
///
/// ```json
/// {
///   "pin": "1234",
///   "signCount": 0,
///   "credentials": [
///     { "id": "<base64url>", "rpId": "localhost", "algorithm": "es256",
///       "privateKey": "<base64url PKCS#8>", "discoverable": true,
///       "userId": "<base64url>" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
    #[serde(default)]
    pub sign_count: u32,
    #[serde(default)]
    pub credentials: Vec<CredentialDescription>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDescription {
    /// base64url credential id
    pub id: String,
    pub rp_id: String,
    pub algorithm: CoseAlgorithm,
    /// base64url PKCS#8 private key
    pub private_key: String,
    #[serde(default)]
    pub discoverable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

pub(super) enum SigningKey {
    Es256(EcdsaKeyPair),
    Rs256(RsaKeyPair),
}

impl SigningKey {
    fn from_pkcs8(
        algorithm: CoseAlgorithm,
        der: &[u8],
        rng: &SystemRandom,
    ) -> Result<Self, String> {
        match algorithm {
            CoseAlgorithm::Es256 => {
                EcdsaKeyPair::from_pkcs8(&signature::ECDSA_P256_SHA256_ASN1_SIGNING, der, rng)
                    .map(SigningKey::Es256)
                    .map_err(|e| format!("invalid P-256 PKCS#8 key: {e}"))
            }
            CoseAlgorithm::Rs256 => RsaKeyPair::from_pkcs8(der)
                .map(SigningKey::Rs256)
                .map_err(|e| format!("invalid RSA PKCS#8 key: {e}")),
        }
    }

    pub(super) fn algorithm(&self) -> CoseAlgorithm {
        match self {
            SigningKey::Es256(_) => CoseAlgorithm::Es256,
            SigningKey::Rs256(_) => CoseAlgorithm::Rs256,
        }
    }

    /// Signs `message` (SHA-256 is applied by the algorithm).
    pub(super) fn sign(&self, message: &[u8], rng: &SystemRandom) -> Result<Vec<u8>, String> {
        match self {
            SigningKey::Es256(key_pair) => key_pair
                .sign(rng, message)
                .map(|sig| sig.as_ref().to_vec())
                .map_err(|e| format!("ECDSA signing failed: {e}")),
            SigningKey::Rs256(key_pair) => {
                let mut sig = vec![0u8; key_pair.public().modulus_len()];
                key_pair
                    .sign(&signature::RSA_PKCS1_SHA256, rng, message, &mut sig)
                    .map_err(|e| format!("RSA signing failed: {e}"))?;
                Ok(sig)
            }
        }
    }

    #[cfg(test)]
    pub(super) fn public_key_bytes(&self) -> &[u8] {
        use ring::signature::KeyPair;

        match self {
            SigningKey::Es256(key_pair) => key_pair.public_key().as_ref(),
            SigningKey::Rs256(key_pair) => key_pair.public_key().as_ref(),
        }
    }
}

/// A credential held by the virtual authenticator, with its key parsed.
pub(super) struct StoredCredential {
    pub id: Vec<u8>,
    pub rp_id: String,
    pub discoverable: bool,
    pub user_id: Option<Vec<u8>>,
    pub key: SigningKey,
}

impl StoredCredential {
    pub(super) fn from_description(
        description: &CredentialDescription,
        rng: &SystemRandom,
    ) -> Result<Self, String> {
        let id = base64url_decode(&description.id)
            .map_err(|e| format!("credential id: {e}"))?;
        if id.is_empty() {
            return Err("credential id must not be empty".to_string());
        }
        if description.rp_id.is_empty() {
            return Err("credential rpId must not be empty".to_string());
        }

        let der = base64url_decode(&description.private_key)
            .map_err(|e| format!("credential private key: {e}"))?;
        let key = SigningKey::from_pkcs8(description.algorithm, &der, rng)?;

        let user_id = description
            .user_id
            .as_deref()
            .map(base64url_decode)
            .transpose()
            .map_err(|e| format!("credential user id: {e}"))?;

        Ok(Self {
            id,
            rp_id: description.rp_id.clone(),
            discoverable: description.discoverable,
            user_id,
            key,
        })
    }
}
