//! The contract between the event driver and a low-level token decoder.

use alloc::string::String;

use crate::{io_buffer::IoBuffer, token_buffer::TokenBuffer};

/// The outcome of one [`TokenDecoder::decode_tokens`] call.
///
/// `ShortRead` and `ShortWrite` are suspensions, not failures: the decoder
/// parked at a byte boundary and will resume when re-invoked with more input
/// or more token space. `Error` is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoderStatus {
    /// Decoding ran to completion (the top-level value and any trailing
    /// filler are fully tokenized).
    Ok,
    /// The byte window ran dry mid-stream; refill and re-invoke.
    ShortRead,
    /// The token ring is full; drain or compact it and re-invoke.
    ShortWrite,
    /// Terminal failure; the message propagates to the caller verbatim.
    Error(String),
}

/// A resumable byte-to-token decoder.
///
/// Implementations consume bytes from `source` (advancing `source.ri`) and
/// push [`Token`](crate::Token)s into `tokens`. At every return, the sum of
/// the emitted token lengths must equal the `ri` advance since the call
/// began: tokens never describe bytes that were not consumed, and consumed
/// bytes are always covered by tokens. A lexeme that cannot be split
/// (a literal, a number, an escape sequence) must be left unread when the
/// window ends mid-lexeme, so the driver can compact and refill around it.
pub trait TokenDecoder {
    /// Enables or disables a decoder-specific quirk. Unknown tags are
    /// ignored.
    fn set_quirk_enabled(&mut self, quirk: u32, enabled: bool);

    /// Decodes as many tokens as input and output space allow.
    fn decode_tokens(&mut self, tokens: &mut TokenBuffer, source: &mut IoBuffer) -> DecoderStatus;
}
