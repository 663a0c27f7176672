//! The callback surface the event driver reports into.

use alloc::{
    string::{String, ToString},
    vec::Vec,
};

use crate::{error::UNEXPECTED_BYTE_STRING, input::Input, io_buffer::IoBuffer, token::Container};

/// What a decode call hands back.
///
/// `error_message` is empty on success. Driver-originated failures begin with
/// `"wuffs_aux::DecodeJson: "`; callback, I/O and low-level decoder messages
/// appear verbatim. `cursor_position` is the stream offset where processing
/// stopped: the end of the final accepted value, or the offending byte.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeJsonResult {
    pub error_message: String,
    pub cursor_position: u64,
}

impl DecodeJsonResult {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error_message.is_empty()
    }
}

/// Receives the event stream of a decode, in strict document order.
///
/// Each event method returns `Ok(())` to continue or `Err(message)` to stop
/// the decode; the message becomes the result's `error_message`. Inside an
/// object, keys arrive as ordinary text strings alternating with their
/// values; implementations that care track container state from `push` and
/// `pop`.
///
/// `append_byte_string` is only reached when a quirk lets the low-level
/// decoder produce strings that need not be UTF-8; the default rejects them
/// with [`UNEXPECTED_BYTE_STRING`], so byte strings are opt-in.
pub trait DecodeJsonCallbacks {
    fn push(&mut self, container: Container) -> Result<(), String>;
    fn pop(&mut self, container: Container) -> Result<(), String>;
    fn append_null(&mut self) -> Result<(), String>;
    fn append_bool(&mut self, value: bool) -> Result<(), String>;
    fn append_i64(&mut self, value: i64) -> Result<(), String>;
    fn append_f64(&mut self, value: f64) -> Result<(), String>;
    fn append_text_string(&mut self, value: String) -> Result<(), String>;

    fn append_byte_string(&mut self, value: Vec<u8>) -> Result<(), String> {
        let _ = value;
        Err(UNEXPECTED_BYTE_STRING.to_string())
    }

    /// Invoked exactly once, after the final result is known and before
    /// [`decode_json`](crate::decode_json) returns, so the callback can
    /// inspect or reclaim the input and its window.
    fn done(&mut self, result: &DecodeJsonResult, input: &mut dyn Input, buffer: &mut IoBuffer) {
        let _ = (result, input, buffer);
    }
}
