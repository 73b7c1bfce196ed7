//! Runs the demo-assert binary against virtual authenticator files.

use assert_cmd::Command;
use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use predicates::prelude::*;
use ring::rand::SystemRandom;
use ring::signature::{ECDSA_P256_SHA256_ASN1_SIGNING, EcdsaKeyPair, KeyPair};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// SubjectPublicKeyInfo prefix for an uncompressed P-256 point.
const P256_SPKI_PREFIX: [u8; 26] = [
    0x30, 0x59, 0x30, 0x13, 0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01, 0x06, 0x08, 0x2a,
    0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07, 0x03, 0x42, 0x00,
];

fn demo_assert() -> Command {
    let mut cmd = Command::cargo_bin("demo-assert").unwrap();
    cmd.env_remove("ASSERT_RP_ID")
        .env_remove("ASSERT_CLIENT_DATA_HASH")
        .env("RUST_LOG", "off");
    cmd
}

struct Credential {
    id: Vec<u8>,
    pkcs8: Vec<u8>,
    public_key: Vec<u8>,
}

impl Credential {
    fn generate(id: &[u8]) -> Self {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &rng).unwrap();
        let key_pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8.as_ref(), &rng)
                .unwrap();
        Self {
            id: id.to_vec(),
            pkcs8: pkcs8.as_ref().to_vec(),
            public_key: key_pair.public_key().as_ref().to_vec(),
        }
    }

    fn description(&self, discoverable: bool) -> serde_json::Value {
        json!({
            "id": URL_SAFE_NO_PAD.encode(&self.id),
            "rpId": "localhost",
            "algorithm": "es256",
            "privateKey": URL_SAFE_NO_PAD.encode(&self.pkcs8),
            "discoverable": discoverable,
        })
    }

    fn write_public_key(&self, dir: &Path, name: &str) -> PathBuf {
        let mut der = P256_SPKI_PREFIX.to_vec();
        der.extend_from_slice(&self.public_key);
        let body = STANDARD.encode(&der);
        let mut pem = String::from("-----BEGIN PUBLIC KEY-----\n");
        for line in body.as_bytes().chunks(64) {
            pem.push_str(std::str::from_utf8(line).unwrap());
            pem.push('\n');
        }
        pem.push_str("-----END PUBLIC KEY-----\n");

        let path = dir.join(name);
        fs::write(&path, pem).unwrap();
        path
    }

    fn write_id(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, &self.id).unwrap();
        path
    }
}

fn write_device(dir: &Path, pin: Option<&str>, credentials: Vec<serde_json::Value>) -> PathBuf {
    let mut device = json!({ "signCount": 0, "credentials": credentials });
    if let Some(pin) = pin {
        device["pin"] = json!(pin);
    }
    let path = dir.join("device.json");
    fs::write(&path, serde_json::to_vec_pretty(&device).unwrap()).unwrap();
    path
}

fn args(paths: &[&Path]) -> Vec<String> {
    paths.iter().map(|p| p.to_str().unwrap().to_string()).collect()
}

#[test]
fn test_help_lists_options() {
    demo_assert()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--strict"))
        .stdout(predicate::str::contains("-u"));
}

#[test]
fn test_discoverable_credential_verifies() {
    let temp = TempDir::new().unwrap();
    let cred = Credential::generate(b"cred-1");
    let pubkey = cred.write_public_key(temp.path(), "pubkey.pem");
    let device = write_device(temp.path(), None, vec![cred.description(true)]);

    demo_assert()
        .args(args(&[&pubkey, &device]))
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_allow_list_pin_and_strict_checks_verify() {
    let temp = TempDir::new().unwrap();
    let cred = Credential::generate(b"cred-allow");
    let pubkey = cred.write_public_key(temp.path(), "pubkey.pem");
    let cred_file = cred.write_id(temp.path(), "cred.bin");
    let device = write_device(temp.path(), Some("1234"), vec![cred.description(false)]);

    demo_assert()
        .args(["-t", "ecdsa", "-a"])
        .arg(&cred_file)
        .args(["-P", "1234", "-p", "-v", "--strict"])
        .args(args(&[&pubkey, &device]))
        .assert()
        .success();
}

#[test]
fn test_u2f_mode_verifies() {
    let temp = TempDir::new().unwrap();
    let cred = Credential::generate(b"u2f-key-handle");
    let pubkey = cred.write_public_key(temp.path(), "pubkey.pem");
    let cred_file = cred.write_id(temp.path(), "cred.bin");
    let device = write_device(temp.path(), None, vec![cred.description(false)]);

    demo_assert()
        .arg("-u")
        .arg("-a")
        .arg(&cred_file)
        .args(args(&[&pubkey, &device]))
        .assert()
        .success();
}

#[test]
fn test_unknown_algorithm_fails_at_type_stage() {
    let temp = TempDir::new().unwrap();
    let cred = Credential::generate(b"cred-1");
    let pubkey = cred.write_public_key(temp.path(), "pubkey.pem");
    let device = write_device(temp.path(), None, vec![cred.description(true)]);

    demo_assert()
        .args(["-t", "ed25519"])
        .args(args(&[&pubkey, &device]))
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("type:"));
}

#[test]
fn test_missing_credential_id_file_fails_at_read_blob() {
    let temp = TempDir::new().unwrap();
    let cred = Credential::generate(b"cred-1");
    let pubkey = cred.write_public_key(temp.path(), "pubkey.pem");
    let device = write_device(temp.path(), None, vec![cred.description(true)]);

    demo_assert()
        .arg("-a")
        .arg(temp.path().join("missing.bin"))
        .args(args(&[&pubkey, &device]))
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("read_blob:"));
}

#[test]
fn test_algorithm_key_mismatch_fails_at_read_pubkey() {
    let temp = TempDir::new().unwrap();
    let cred = Credential::generate(b"cred-1");
    let pubkey = cred.write_public_key(temp.path(), "pubkey.pem");
    let device = write_device(temp.path(), None, vec![cred.description(true)]);

    demo_assert()
        .args(["-t", "rs256"])
        .args(args(&[&pubkey, &device]))
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("read_pubkey:"));
}

#[test]
fn test_wrong_public_key_fails_verification() {
    let temp = TempDir::new().unwrap();
    let cred = Credential::generate(b"cred-1");
    let other = Credential::generate(b"cred-2");
    let pubkey = other.write_public_key(temp.path(), "other.pem");
    let device = write_device(temp.path(), None, vec![cred.description(true)]);

    demo_assert()
        .args(args(&[&pubkey, &device]))
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("assert_verify:"))
        .stderr(predicate::str::contains("(0xfffffffa)"));
}

#[test]
fn test_user_verification_without_pin_reports_status() {
    let temp = TempDir::new().unwrap();
    let cred = Credential::generate(b"cred-1");
    let pubkey = cred.write_public_key(temp.path(), "pubkey.pem");
    let device = write_device(temp.path(), Some("1234"), vec![cred.description(true)]);

    demo_assert()
        .arg("-v")
        .args(args(&[&pubkey, &device]))
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "dev_get_assert: FIDO_ERR_PIN_REQUIRED (0x36)",
        ));
}

#[test]
fn test_several_assertions_fail_count_check() {
    let temp = TempDir::new().unwrap();
    let first = Credential::generate(b"cred-1");
    let second = Credential::generate(b"cred-2");
    let pubkey = first.write_public_key(temp.path(), "pubkey.pem");
    let device = write_device(
        temp.path(),
        None,
        vec![first.description(true), second.description(true)],
    );

    demo_assert()
        .args(args(&[&pubkey, &device]))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("assert_count: 2 signatures returned"));
}

#[test]
fn test_missing_device_file_fails_at_open() {
    let temp = TempDir::new().unwrap();
    let cred = Credential::generate(b"cred-1");
    let pubkey = cred.write_public_key(temp.path(), "pubkey.pem");

    demo_assert()
        .arg(&pubkey)
        .arg(temp.path().join("no-device.json"))
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("dev_open:"));
}
