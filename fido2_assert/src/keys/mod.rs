mod errors;
mod loader;
mod types;

pub use errors::KeyError;
pub use loader::{load_public_key, parse_public_key};
pub use types::{
    CoseAlgorithm, EcPoint, KeyMaterial, RSA_MAX_MODULUS_BITS, RSA_MIN_MODULUS_BITS,
    RsaComponents,
};
