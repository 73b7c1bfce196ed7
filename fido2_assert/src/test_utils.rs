//! Key material and byte builders shared by the unit tests.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use ring::digest;
use ring::rand::SystemRandom;
use ring::signature::{self, EcdsaKeyPair, KeyPair, RsaKeyPair};

use crate::keys::{CoseAlgorithm, KeyMaterial, parse_public_key};
use crate::utils::base64url_encode;

pub(crate) const RSA_2048_PRIVATE_KEY_PEM: &str =
    include_str!("../tests/data/rsa_2048_private.pem");
pub(crate) const RSA_2048_PUBLIC_KEY_PEM: &str = include_str!("../tests/data/rsa_2048_public.pem");
pub(crate) const RSA_1024_PUBLIC_KEY_PEM: &str = include_str!("../tests/data/rsa_1024_public.pem");
pub(crate) const EC_P384_PUBLIC_KEY_PEM: &str = include_str!("../tests/data/ec_p384_public.pem");

/// DER prefix of a P-256 SubjectPublicKeyInfo, followed by the 65-byte point.
const P256_SPKI_PREFIX: [u8; 26] = [
    0x30, 0x59, 0x30, 0x13, 0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01, 0x06, 0x08, 0x2a,
    0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07, 0x03, 0x42, 0x00,
];

/// Order of the P-256 group.
const P256_ORDER: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xbc, 0xe6, 0xfa, 0xad, 0xa7, 0x17, 0x9e, 0x84, 0xf3, 0xb9, 0xca, 0xc2, 0xfc, 0x63, 0x25, 0x51,
];

/// A freshly generated P-256 signing key.
pub(crate) struct TestEcKey {
    pkcs8: Vec<u8>,
    key_pair: EcdsaKeyPair,
    rng: SystemRandom,
}

impl TestEcKey {
    pub(crate) fn generate() -> Self {
        let rng = SystemRandom::new();
        let pkcs8 =
            EcdsaKeyPair::generate_pkcs8(&signature::ECDSA_P256_SHA256_ASN1_SIGNING, &rng).unwrap();
        let key_pair = EcdsaKeyPair::from_pkcs8(
            &signature::ECDSA_P256_SHA256_ASN1_SIGNING,
            pkcs8.as_ref(),
            &rng,
        )
        .unwrap();
        Self {
            pkcs8: pkcs8.as_ref().to_vec(),
            key_pair,
            rng,
        }
    }

    /// DER ECDSA signature over SHA-256(message)
    pub(crate) fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.key_pair
            .sign(&self.rng, message)
            .unwrap()
            .as_ref()
            .to_vec()
    }

    /// Uncompressed SEC1 point
    pub(crate) fn public_key_bytes(&self) -> &[u8] {
        self.key_pair.public_key().as_ref()
    }

    pub(crate) fn key_material(&self) -> KeyMaterial {
        KeyMaterial::ec_from_sec1(self.public_key_bytes()).unwrap()
    }

    pub(crate) fn pkcs8_b64url(&self) -> String {
        base64url_encode(&self.pkcs8)
    }

    pub(crate) fn spki_pem(&self) -> String {
        pem_encode_public_key(&ec_spki_der(self.public_key_bytes()))
    }
}

pub(crate) fn ec_spki_der(point: &[u8]) -> Vec<u8> {
    let mut der = P256_SPKI_PREFIX.to_vec();
    der.extend_from_slice(point);
    der
}

pub(crate) fn pem_encode_public_key(der: &[u8]) -> String {
    let body = STANDARD.encode(der);
    let mut pem = String::from("-----BEGIN PUBLIC KEY-----\n");
    for line in body.as_bytes().chunks(64) {
        pem.push_str(std::str::from_utf8(line).unwrap());
        pem.push('\n');
    }
    pem.push_str("-----END PUBLIC KEY-----\n");
    pem
}

fn pem_contents(pem: &str) -> Vec<u8> {
    let (_, pem) = x509_parser::pem::parse_x509_pem(pem.as_bytes()).unwrap();
    pem.contents
}

pub(crate) fn rsa_2048_pkcs8_b64url() -> String {
    base64url_encode(&pem_contents(RSA_2048_PRIVATE_KEY_PEM))
}

pub(crate) fn rsa_2048_key_material() -> KeyMaterial {
    parse_public_key(RSA_2048_PUBLIC_KEY_PEM.as_bytes(), CoseAlgorithm::Rs256).unwrap()
}

/// PKCS#1 v1.5 SHA-256 signature under the fixed RSA-2048 test key
pub(crate) fn sign_rs256(message: &[u8]) -> Vec<u8> {
    let key_pair = RsaKeyPair::from_pkcs8(&pem_contents(RSA_2048_PRIVATE_KEY_PEM)).unwrap();
    let mut sig = vec![0u8; key_pair.public().modulus_len()];
    key_pair
        .sign(
            &signature::RSA_PKCS1_SHA256,
            &SystemRandom::new(),
            message,
            &mut sig,
        )
        .unwrap();
    sig
}

/// SHA-256(rp_id) || flags || counter (big-endian)
pub(crate) fn sample_auth_data(rp_id: &str, flags: u8, counter: u32) -> Vec<u8> {
    let mut data = digest::digest(&digest::SHA256, rp_id.as_bytes())
        .as_ref()
        .to_vec();
    data.push(flags);
    data.extend_from_slice(&counter.to_be_bytes());
    data
}

/// Rewrites a DER ECDSA P-256 signature (r, s) as (r, n - s).
pub(crate) fn negate_ecdsa_s(sig: &[u8]) -> Vec<u8> {
    assert_eq!(sig[0], 0x30);
    assert_eq!(sig[2], 0x02);
    let r_len = sig[3] as usize;
    let r = &sig[4..4 + r_len];
    assert_eq!(sig[4 + r_len], 0x02);
    let s_len = sig[5 + r_len] as usize;
    let s = &sig[6 + r_len..6 + r_len + s_len];

    let mut s_padded = [0u8; 32];
    let s_trimmed = &s[s.len().saturating_sub(32)..];
    s_padded[32 - s_trimmed.len()..].copy_from_slice(s_trimmed);

    let mut negated = [0u8; 32];
    let mut borrow = 0i16;
    for i in (0..32).rev() {
        let mut diff = P256_ORDER[i] as i16 - s_padded[i] as i16 - borrow;
        borrow = 0;
        if diff < 0 {
            diff += 256;
            borrow = 1;
        }
        negated[i] = diff as u8;
    }

    let encode_integer = |bytes: &[u8]| {
        let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
        let mut value = bytes[start..].to_vec();
        if value[0] & 0x80 != 0 {
            value.insert(0, 0x00);
        }
        let mut out = vec![0x02, value.len() as u8];
        out.extend_from_slice(&value);
        out
    };

    let mut body = encode_integer(r);
    body.extend_from_slice(&encode_integer(&negated));
    let mut out = vec![0x30, body.len() as u8];
    out.extend_from_slice(&body);
    out
}
