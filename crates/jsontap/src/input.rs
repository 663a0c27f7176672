//! Pull sources feeding the decode window.

use alloc::{
    string::{String, ToString},
    vec::Vec,
};

use crate::io_buffer::IoBuffer;

/// A pull-based byte source.
///
/// The driver asks once, up front, whether the input maintains its own
/// window; otherwise it allocates a private one and fills it through
/// [`copy_in`](Self::copy_in) whenever the tokenizer underflows. An input
/// signals end-of-stream by setting `closed` on the window; a non-empty error
/// is latched by the driver and surfaced on the next underflow.
pub trait Input {
    /// Hands the driver the input's own window, if it keeps one. The window
    /// comes back to the callback layer through
    /// [`DecodeJsonCallbacks::done`](crate::DecodeJsonCallbacks::done).
    fn bring_your_own_buffer(&mut self) -> Option<IoBuffer> {
        None
    }

    /// Appends bytes to the writable tail of `dst`.
    fn copy_in(&mut self, dst: &mut IoBuffer) -> Result<(), String>;
}

/// An input over an in-memory payload.
///
/// Brings its own window wrapping the whole payload, already closed, so the
/// driver never needs to pull.
#[derive(Debug)]
pub struct MemoryInput {
    payload: Vec<u8>,
}

impl MemoryInput {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

impl Input for MemoryInput {
    fn bring_your_own_buffer(&mut self) -> Option<IoBuffer> {
        Some(IoBuffer::closed_with(core::mem::take(&mut self.payload)))
    }

    fn copy_in(&mut self, _dst: &mut IoBuffer) -> Result<(), String> {
        Err("MemoryInput: this input brings its own buffer".to_string())
    }
}
