//! End-to-end assertion flow
//!
//! - `errors`: the stage-labelled top-level error
//! - `flow`: request building, device round trip and verification

mod errors;
mod flow;

pub use errors::{CoordinationError, Stage};
pub use flow::{AssertionSettings, build_request, run_assertion, run_assertion_with_key_file};
