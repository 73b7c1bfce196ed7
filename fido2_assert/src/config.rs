use std::{env, sync::LazyLock};

use crate::assertion::ClientDataHash;
use crate::utils::base64url_decode;

/// Client-data hash sent with every assertion unless overridden.
///
/// This is a fixed test vector, not a digest of real client data.
pub const DEFAULT_CLIENT_DATA_HASH: [u8; 32] = [
    0xec, 0x8d, 0x8f, 0x78, 0x42, 0x4a, 0x2b, 0xb7, 0x82, 0x34, 0xaa, 0xca, 0x07, 0xa1, 0xf6, 0x56,
    0x42, 0x1c, 0xb6, 0xf6, 0xb3, 0x00, 0x86, 0x52, 0x35, 0x2d, 0xa2, 0x62, 0x4a, 0xbe, 0x89, 0x76,
];

pub const DEFAULT_RP_ID: &str = "localhost";

pub static ASSERT_CLIENT_DATA_HASH: LazyLock<ClientDataHash> =
    LazyLock::new(|| parse_client_data_hash(env::var("ASSERT_CLIENT_DATA_HASH").ok()));

pub static ASSERT_RP_ID: LazyLock<String> =
    LazyLock::new(|| parse_rp_id(env::var("ASSERT_RP_ID").ok()));

fn parse_client_data_hash(value: Option<String>) -> ClientDataHash {
    let default = ClientDataHash::from(DEFAULT_CLIENT_DATA_HASH);
    match value {
        None => default,
        Some(v) => match base64url_decode(&v)
            .ok()
            .and_then(|bytes| ClientDataHash::try_from(bytes.as_slice()).ok())
        {
            Some(cdh) => cdh,
            None => {
                tracing::warn!(
                    "Invalid ASSERT_CLIENT_DATA_HASH: {}. Using the default test vector",
                    v
                );
                default
            }
        },
    }
}

fn parse_rp_id(value: Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        Some(_) => {
            tracing::warn!("Empty ASSERT_RP_ID. Using default '{}'", DEFAULT_RP_ID);
            DEFAULT_RP_ID.to_string()
        }
        None => DEFAULT_RP_ID.to_string(),
    }
}
