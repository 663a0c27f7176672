//! Driver error taxonomy and the stable sentinel strings.

use alloc::string::String;
use thiserror::Error;

/// Returned for a malformed JSON Pointer. Stable.
pub const BAD_JSON_POINTER: &str = "wuffs_aux::DecodeJson: bad JSON Pointer";

/// Returned when a JSON Pointer fragment resolves to nothing. Stable.
pub const NO_MATCH: &str = "wuffs_aux::DecodeJson: no match";

/// Returned by the default
/// [`append_byte_string`](crate::DecodeJsonCallbacks::append_byte_string)
/// implementation. Stable.
pub const UNEXPECTED_BYTE_STRING: &str = "wuffs_aux::DecodeJson: unexpected JSON byte string";

/// Anything that stops a decode.
///
/// Every variant is terminal. Callback, I/O and decoder messages pass through
/// verbatim; driver-originated errors render with the `wuffs_aux::DecodeJson`
/// prefix the sentinels above use.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("{}", BAD_JSON_POINTER)]
    BadJsonPointer,
    #[error("{}", NO_MATCH)]
    NoMatch,
    /// An invariant of the driver itself failed; a bug, not an input defect.
    #[error("wuffs_aux::DecodeJson: internal error: {0}")]
    Internal(&'static str),
    /// A latched [`Input::copy_in`](crate::Input::copy_in) failure.
    #[error("{0}")]
    Io(String),
    /// A terminal status from the low-level decoder.
    #[error("{0}")]
    Decoder(String),
    /// A non-empty reply from a user callback.
    #[error("{0}")]
    Callback(String),
}
