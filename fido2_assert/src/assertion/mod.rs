mod auth_data;
mod errors;
mod request;
mod response;
mod types;

pub use auth_data::{AUTH_DATA_MIN_LEN, AuthenticatorDataView, auth_data_flags};
pub use errors::AssertionError;
pub use request::AssertionRequest;
pub use response::{AssertionEntry, AssertionResponse};
pub use types::{
    AllowedCredential, AssertionOptions, CLIENT_DATA_HASH_LEN, ClientDataHash, Transport,
};
