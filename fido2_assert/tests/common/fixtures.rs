use base64::{Engine as _, engine::general_purpose};
use fido2_assert::device::{CredentialDescription, DeviceDescription};
use fido2_assert::{CoseAlgorithm, KeyMaterial, parse_public_key};
use ring::rand::SystemRandom;
use ring::signature::{ECDSA_P256_SHA256_ASN1_SIGNING, EcdsaKeyPair, KeyPair};
use std::path::PathBuf;
use tempfile::TempDir;

pub const RSA_2048_PRIVATE_KEY_PEM: &str = include_str!("../data/rsa_2048_private.pem");
pub const RSA_2048_PUBLIC_KEY_PEM: &str = include_str!("../data/rsa_2048_public.pem");

pub const TEST_RP_ID: &str = "localhost";
pub const TEST_PIN: &str = "4321";

/// A credential the virtual authenticator holds, plus its public key.
pub struct TestCredential {
    pub id: Vec<u8>,
    pub algorithm: CoseAlgorithm,
    pkcs8: Vec<u8>,
    public_key: KeyMaterial,
}

impl TestCredential {
    /// Fresh P-256 credential
    pub fn es256(id: &[u8]) -> Self {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &rng)
            .expect("Failed to generate P-256 key");
        let key_pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8.as_ref(), &rng)
                .expect("Failed to load generated key");
        let public_key = KeyMaterial::ec_from_sec1(key_pair.public_key().as_ref())
            .expect("Generated point must be valid");

        Self {
            id: id.to_vec(),
            algorithm: CoseAlgorithm::Es256,
            pkcs8: pkcs8.as_ref().to_vec(),
            public_key,
        }
    }

    /// RSA-2048 credential backed by the key in `tests/data`
    pub fn rs256(id: &[u8]) -> Self {
        let public_key = parse_public_key(RSA_2048_PUBLIC_KEY_PEM.as_bytes(), CoseAlgorithm::Rs256)
            .expect("Fixture RSA key must parse");

        Self {
            id: id.to_vec(),
            algorithm: CoseAlgorithm::Rs256,
            pkcs8: pem_body(RSA_2048_PRIVATE_KEY_PEM),
            public_key,
        }
    }

    pub fn public_key(&self) -> &KeyMaterial {
        &self.public_key
    }

    pub fn description(&self, discoverable: bool) -> CredentialDescription {
        CredentialDescription {
            id: general_purpose::URL_SAFE_NO_PAD.encode(&self.id),
            rp_id: TEST_RP_ID.to_string(),
            algorithm: self.algorithm,
            private_key: general_purpose::URL_SAFE_NO_PAD.encode(&self.pkcs8),
            discoverable,
            user_id: Some(general_purpose::URL_SAFE_NO_PAD.encode(b"user-handle")),
        }
    }
}

/// A device description written to a temporary file.
pub struct DeviceFile {
    _dir: TempDir,
    path: PathBuf,
}

impl DeviceFile {
    pub fn write(description: &DeviceDescription) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("device.json");
        let body = serde_json::to_vec_pretty(description).expect("Failed to serialize device");
        std::fs::write(&path, body).expect("Failed to write device file");
        Self { _dir: dir, path }
    }

    pub fn path(&self) -> &str {
        self.path.to_str().expect("Temp path must be UTF-8")
    }

    /// Writes an extra file next to the device description.
    pub fn sibling(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.path.with_file_name(name);
        std::fs::write(&path, contents).expect("Failed to write fixture file");
        path
    }
}

pub fn device_with(pin: Option<&str>, credentials: &[(&TestCredential, bool)]) -> DeviceDescription {
    DeviceDescription {
        pin: pin.map(str::to_string),
        sign_count: 0,
        credentials: credentials
            .iter()
            .map(|(cred, discoverable)| cred.description(*discoverable))
            .collect(),
    }
}

fn pem_body(pem: &str) -> Vec<u8> {
    let body: String = pem
        .lines()
        .filter(|line| !line.starts_with("-----"))
        .collect();
    general_purpose::STANDARD
        .decode(body)
        .expect("Fixture PEM must be base64")
}
