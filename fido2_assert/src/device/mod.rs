pub mod ctap2;
mod errors;
mod session;
pub mod status;
mod virtual_device;

pub use errors::DeviceError;
pub use session::{Authenticator, DeviceSession, OpenDevice};
pub use status::{
    FIDO_ERR_INTERNAL, FIDO_ERR_INVALID_ARGUMENT, FIDO_ERR_INVALID_PARAM, FIDO_ERR_INVALID_SIG,
    FIDO_ERR_RX, FIDO_ERR_TX,
};
pub use virtual_device::{
    CredentialDescription, DeviceDescription, VirtualAuthenticator, VirtualSession,
};
