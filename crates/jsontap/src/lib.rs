//! A streaming, suspendable SAX-style JSON decoder with JSON Pointer
//! navigation.
//!
//! `jsontap` parses a JSON document into a flat stream of semantic events and
//! hands each event to a set of user callbacks. Input arrives through a
//! pull-based [`Input`], so arbitrarily large documents stream through a
//! single fixed-size byte window; an optional JSON Pointer (RFC 6901) lets
//! decoding begin at a subtree instead of the root, skipping everything
//! outside it without buffering the document.
//!
//! The decode pipeline has two stages. A low-level [`TokenDecoder`] turns
//! bytes into [`Token`]s describing contiguous source spans; either stage may
//! suspend (the tokenizer when it runs out of bytes or token space, the
//! driver when it needs to refill) and [`decode_json`] resumes both
//! transparently. The crate ships a resumable [`Tokenizer`], and the driver
//! accepts any [`TokenDecoder`] via [`decode_json_with`].
//!
//! ```rust
//! use jsontap::{decode_json, DecodeJsonCallbacks, MemoryInput};
//!
//! #[derive(Default)]
//! struct Sum {
//!     total: i64,
//! }
//!
//! impl DecodeJsonCallbacks for Sum {
//!     fn push(&mut self, _: jsontap::Container) -> Result<(), String> {
//!         Ok(())
//!     }
//!     fn pop(&mut self, _: jsontap::Container) -> Result<(), String> {
//!         Ok(())
//!     }
//!     fn append_null(&mut self) -> Result<(), String> {
//!         Ok(())
//!     }
//!     fn append_bool(&mut self, _: bool) -> Result<(), String> {
//!         Ok(())
//!     }
//!     fn append_i64(&mut self, value: i64) -> Result<(), String> {
//!         self.total += value;
//!         Ok(())
//!     }
//!     fn append_f64(&mut self, _: f64) -> Result<(), String> {
//!         Ok(())
//!     }
//!     fn append_text_string(&mut self, _: String) -> Result<(), String> {
//!         Ok(())
//!     }
//! }
//!
//! let mut sum = Sum::default();
//! let mut input = MemoryInput::new("[1, 2, 3]");
//! let result = decode_json(&mut sum, &mut input, &[], "");
//! assert!(result.is_ok());
//! assert_eq!(sum.total, 6);
//! assert_eq!(result.cursor_position, 9);
//! ```

#![no_std]
#![allow(missing_docs)]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod callbacks;
mod decoder;
mod driver;
mod error;
mod input;
mod io_buffer;
mod pointer;
mod token;
mod token_buffer;
mod tokenizer;

pub use callbacks::{DecodeJsonCallbacks, DecodeJsonResult};
pub use decoder::{DecoderStatus, TokenDecoder};
pub use driver::{decode_json, decode_json_with};
pub use error::{BAD_JSON_POINTER, DecodeError, NO_MATCH, UNEXPECTED_BYTE_STRING};
pub use input::{Input, MemoryInput};
pub use io_buffer::IoBuffer;
pub use token::{Container, LiteralValue, NumberRepr, StrConvert, Token, TokenValue};
pub use token_buffer::TokenBuffer;
pub use tokenizer::{
    QUIRK_ALLOW_BACKSLASH_X, QUIRK_ALLOW_COMMENT_BLOCK, QUIRK_ALLOW_COMMENT_LINE,
    QUIRK_ALLOW_INF_NAN_NUMBERS, Tokenizer,
};
