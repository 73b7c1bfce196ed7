use thiserror::Error;

use crate::device::FIDO_ERR_INVALID_ARGUMENT;

/// Errors raised while building an assertion request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssertionError {
    /// A fixed-size field was given the wrong number of bytes
    #[error("Invalid length for {field}: expected {expected} bytes, got {actual}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A field was given a value it cannot hold (e.g. an empty id)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl AssertionError {
    /// `FIDO_ERR_*` code for the same rejection.
    pub fn code(&self) -> i32 {
        FIDO_ERR_INVALID_ARGUMENT
    }
}
