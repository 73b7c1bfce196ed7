mod errors;
mod message;
mod policy;
mod signature;

pub use errors::VerificationError;
pub use message::SignedMessage;
pub use policy::check_authenticator_data;
pub use signature::verify_signature;
