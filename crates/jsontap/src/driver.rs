//! The event driver: refill loop, pointer walker and main decode loop.

use alloc::{string::String, string::ToString, vec::Vec};
use core::ops::Range;

use crate::{
    callbacks::{DecodeJsonCallbacks, DecodeJsonResult},
    decoder::{DecoderStatus, TokenDecoder},
    error::DecodeError,
    input::Input,
    io_buffer::IoBuffer,
    pointer,
    token::{Container, LiteralValue, NumberRepr, StrConvert, Token, TokenValue},
    token_buffer::TokenBuffer,
    tokenizer::Tokenizer,
};

/// Window capacity when the input does not bring its own buffer.
const FALLBACK_IO_BUFFER_LEN: usize = 4096;
const TOKEN_BUFFER_LEN: usize = 256;

/// Per-call decode state: the two windows, the decoder, the input, and the
/// driver's own read cursor.
///
/// `cursor` indexes the next unconsumed byte in `io.data`. It trails `io.ri`
/// because the decoder reads ahead eagerly while the driver consumes
/// token-by-token; the two meet exactly when the token ring drains, which is
/// the only moment the driver refills.
struct TokenSource<'a, D: TokenDecoder + ?Sized, I: Input + ?Sized> {
    decoder: &'a mut D,
    input: &'a mut I,
    io: &'a mut IoBuffer,
    tokens: TokenBuffer,
    status: DecoderStatus,
    cursor: usize,
    io_error: Option<String>,
}

impl<'a, D: TokenDecoder + ?Sized, I: Input + ?Sized> TokenSource<'a, D, I> {
    fn new(decoder: &'a mut D, input: &'a mut I, io: &'a mut IoBuffer) -> Self {
        let cursor = io.ri;
        Self {
            decoder,
            input,
            io,
            tokens: TokenBuffer::new(TOKEN_BUFFER_LEN),
            status: DecoderStatus::Ok,
            cursor,
            io_error: None,
        }
    }
}

impl<D: TokenDecoder + ?Sized, I: Input + ?Sized> TokenSource<'_, D, I> {
    /// Returns the next token and the span of its source bytes, transparently
    /// resuming the decoder across short reads and short writes.
    fn next(&mut self) -> Result<(Token, Range<usize>), DecodeError> {
        while self.tokens.is_empty() {
            match &self.status {
                DecoderStatus::Ok => {}
                DecoderStatus::ShortWrite => self.tokens.compact(),
                DecoderStatus::ShortRead => {
                    if let Some(message) = self.io_error.take() {
                        return Err(DecodeError::Io(message));
                    }
                    if self.cursor != self.io.ri {
                        return Err(DecodeError::Internal("bad cursor_index"));
                    }
                    if self.io.closed {
                        return Err(DecodeError::Internal("io_buf is closed"));
                    }
                    self.io.compact();
                    if self.io.wi >= self.io.data.len() {
                        return Err(DecodeError::Internal("io_buf is full"));
                    }
                    self.cursor = self.io.ri;
                    if let Err(message) = self.input.copy_in(self.io) {
                        // Not fatal yet; surfaced on the next underflow.
                        self.io_error = Some(message);
                    }
                }
                DecoderStatus::Error(message) => {
                    return Err(DecodeError::Decoder(message.clone()));
                }
            }
            self.status = self.decoder.decode_tokens(&mut self.tokens, self.io);
        }
        let Some(token) = self.tokens.pop() else {
            return Err(DecodeError::Internal("bad token indexes"));
        };
        if self.io.ri < self.cursor || self.io.ri - self.cursor < token.len {
            return Err(DecodeError::Internal("bad token indexes"));
        }
        let span = self.cursor..self.cursor + token.len;
        self.cursor += token.len;
        Ok((token, span))
    }

    /// Rewinds the token returned by the immediately preceding [`next`]
    /// call, turning that call into a peek. Never valid across a decoder
    /// re-entry.
    fn unread(&mut self, token: &Token) {
        self.tokens.unread();
        self.cursor -= token.len;
    }
}

/// Appends the decoded form of a `\xHH` group span.
fn append_backslash_x(dst: &mut Vec<u8>, bytes: &[u8]) -> Result<(), DecodeError> {
    if bytes.len() % 4 != 0 {
        return Err(DecodeError::Internal("inconsistent base16 decoding"));
    }
    for group in bytes.chunks_exact(4) {
        let hi = (group[2] as char).to_digit(16);
        let lo = (group[3] as char).to_digit(16);
        match (&group[..2], hi, lo) {
            (b"\\x", Some(hi), Some(lo)) => dst.push((hi << 4 | lo) as u8),
            _ => return Err(DecodeError::Internal("inconsistent base16 decoding")),
        }
    }
    Ok(())
}

/// Appends the UTF-8 encoding of one scalar value.
fn append_code_point(dst: &mut Vec<u8>, cp: u32) -> Result<(), DecodeError> {
    let Some(c) = char::from_u32(cp) else {
        return Err(DecodeError::Internal("bad Unicode code point"));
    };
    let mut utf8 = [0u8; 4];
    dst.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    Ok(())
}

/// Descends exactly one pointer fragment into the current value.
///
/// On success the source is parked where the matched value's tokens begin;
/// anything that is not a container, or a container without the named member
/// or index, is a no-match.
fn walk_pointer_fragment<D, I>(
    src: &mut TokenSource<'_, D, I>,
    fragment: &str,
) -> Result<(), DecodeError>
where
    D: TokenDecoder + ?Sized,
    I: Input + ?Sized,
{
    loop {
        let (token, _) = src.next()?;
        match token.value {
            TokenValue::Filler => continue,
            TokenValue::Structure {
                push: true,
                container,
            } => {
                return match container {
                    Container::Object => walk_object(src, fragment),
                    Container::Array => walk_array(src, fragment),
                };
            }
            _ => return Err(DecodeError::NoMatch),
        }
    }
}

/// Alternates between decoding the next key and skipping its value, until
/// the key equals `fragment` or the object closes.
fn walk_object<D, I>(src: &mut TokenSource<'_, D, I>, fragment: &str) -> Result<(), DecodeError>
where
    D: TokenDecoder + ?Sized,
    I: Input + ?Sized,
{
    loop {
        let mut key: Vec<u8> = Vec::new();
        loop {
            let (token, span) = src.next()?;
            match token.value {
                TokenValue::Filler => continue,
                TokenValue::Structure { push: true, .. } => {
                    return Err(DecodeError::Internal("unexpected token"));
                }
                TokenValue::Structure { push: false, .. } => return Err(DecodeError::NoMatch),
                TokenValue::Str { convert, .. } => match convert {
                    StrConvert::Drop => {}
                    StrConvert::Copy => key.extend_from_slice(&src.io.data[span]),
                    StrConvert::BackslashX => append_backslash_x(&mut key, &src.io.data[span])?,
                },
                TokenValue::UnicodeCodePoint(cp) => append_code_point(&mut key, cp)?,
                _ => return Err(DecodeError::Internal("unexpected token")),
            }
            if token.continued {
                continue;
            }
            break;
        }
        if key == fragment.as_bytes() {
            return Ok(());
        }
        skip_value(src)?;
    }
}

/// Consumes one complete value (scalar or container) at the current point.
fn skip_value<D, I>(src: &mut TokenSource<'_, D, I>) -> Result<(), DecodeError>
where
    D: TokenDecoder + ?Sized,
    I: Input + ?Sized,
{
    let mut depth: u32 = 0;
    loop {
        let (token, _) = src.next()?;
        if token.continued || token.value == TokenValue::Filler {
            continue;
        }
        match token.value {
            TokenValue::Structure { push: true, .. } => {
                depth += 1;
                continue;
            }
            TokenValue::Structure { push: false, .. } => depth = depth.saturating_sub(1),
            _ => {}
        }
        if depth == 0 {
            return Ok(());
        }
    }
}

/// Skips list elements until the fragment's decimal index is reached, then
/// peeks to confirm a value follows.
fn walk_array<D, I>(src: &mut TokenSource<'_, D, I>, fragment: &str) -> Result<(), DecodeError>
where
    D: TokenDecoder + ?Sized,
    I: Input + ?Sized,
{
    if fragment.is_empty() || !fragment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DecodeError::NoMatch);
    }
    let mut remaining: u64 = fragment.parse().map_err(|_| DecodeError::NoMatch)?;
    if remaining > 0 {
        let mut depth: u32 = 0;
        loop {
            let (token, _) = src.next()?;
            if token.continued || token.value == TokenValue::Filler {
                continue;
            }
            match token.value {
                TokenValue::Structure { push: true, .. } => {
                    depth += 1;
                    continue;
                }
                TokenValue::Structure { push: false, .. } => {
                    if depth == 0 {
                        // The list closed before the index was reached.
                        return Err(DecodeError::NoMatch);
                    }
                    depth -= 1;
                }
                _ => {}
            }
            if depth > 0 {
                continue;
            }
            remaining -= 1;
            if remaining == 0 {
                break;
            }
        }
    }
    // The index may point one past the final element; peek to tell a value
    // from the closing bracket, leaving the token for the caller.
    loop {
        let (token, _) = src.next()?;
        if token.value == TokenValue::Filler {
            continue;
        }
        src.unread(&token);
        if matches!(token.value, TokenValue::Structure { push: false, .. }) {
            return Err(DecodeError::NoMatch);
        }
        return Ok(());
    }
}

/// Streams exactly one top-level value into the callbacks.
fn decode_one_value<C, D, I>(
    src: &mut TokenSource<'_, D, I>,
    callbacks: &mut C,
) -> Result<(), DecodeError>
where
    C: DecodeJsonCallbacks,
    D: TokenDecoder + ?Sized,
    I: Input + ?Sized,
{
    let mut depth: u32 = 0;
    let mut scratch: Vec<u8> = Vec::new();
    loop {
        let (token, span) = src.next()?;
        match token.value {
            TokenValue::Filler => continue,

            TokenValue::Structure {
                push: true,
                container,
            } => {
                callbacks.push(container).map_err(DecodeError::Callback)?;
                depth += 1;
                continue;
            }
            TokenValue::Structure {
                push: false,
                container,
            } => {
                let reply = callbacks.pop(container);
                depth = depth.saturating_sub(1);
                reply.map_err(DecodeError::Callback)?;
            }

            TokenValue::Str {
                convert,
                must_be_utf8,
            } => {
                match convert {
                    StrConvert::Drop => {}
                    StrConvert::Copy => scratch.extend_from_slice(&src.io.data[span]),
                    StrConvert::BackslashX => append_backslash_x(&mut scratch, &src.io.data[span])?,
                }
                if token.continued {
                    continue;
                }
                let payload = core::mem::take(&mut scratch);
                if must_be_utf8 {
                    let text = String::from_utf8(payload)
                        .map_err(|_| DecodeError::Internal("invalid UTF-8"))?;
                    callbacks
                        .append_text_string(text)
                        .map_err(DecodeError::Callback)?;
                } else {
                    callbacks
                        .append_byte_string(payload)
                        .map_err(DecodeError::Callback)?;
                }
            }

            TokenValue::UnicodeCodePoint(cp) => {
                append_code_point(&mut scratch, cp)?;
                if token.continued {
                    continue;
                }
                // A string run always terminates on its closing-quote token.
                return Err(DecodeError::Internal("unexpected token"));
            }

            TokenValue::Literal(literal) => {
                match literal {
                    LiteralValue::Null => callbacks.append_null(),
                    LiteralValue::False => callbacks.append_bool(false),
                    LiteralValue::True => callbacks.append_bool(true),
                }
                .map_err(DecodeError::Callback)?;
            }

            TokenValue::Number(repr) => {
                let value = match repr {
                    NumberRepr::Text {
                        integer_signed,
                        floating_point,
                    } => {
                        let text = core::str::from_utf8(&src.io.data[span])
                            .map_err(|_| DecodeError::Internal("unexpected token"))?;
                        let mut parsed = false;
                        if integer_signed {
                            if let Ok(v) = text.parse::<i64>() {
                                callbacks.append_i64(v).map_err(DecodeError::Callback)?;
                                parsed = true;
                            }
                        }
                        if !parsed && floating_point {
                            if let Ok(v) = text.parse::<f64>() {
                                callbacks.append_f64(v).map_err(DecodeError::Callback)?;
                                parsed = true;
                            }
                        }
                        if !parsed {
                            return Err(DecodeError::Internal("unexpected token"));
                        }
                        None
                    }
                    NumberRepr::NegInf => Some(0xFFF0_0000_0000_0000_u64),
                    NumberRepr::PosInf => Some(0x7FF0_0000_0000_0000_u64),
                    NumberRepr::NegNan => Some(0xFFFF_FFFF_FFFF_FFFF_u64),
                    NumberRepr::PosNan => Some(0x7FFF_FFFF_FFFF_FFFF_u64),
                };
                if let Some(bits) = value {
                    callbacks
                        .append_f64(f64::from_bits(bits))
                        .map_err(DecodeError::Callback)?;
                }
            }
        }

        // A value completed; the subtree root counts as depth zero.
        if depth == 0 {
            return Ok(());
        }
    }
}

fn drive<C, D, I>(
    src: &mut TokenSource<'_, D, I>,
    callbacks: &mut C,
    json_pointer: &str,
) -> Result<(), DecodeError>
where
    C: DecodeJsonCallbacks,
    D: TokenDecoder + ?Sized,
    I: Input + ?Sized,
{
    let bytes = json_pointer.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'/' {
            return Err(DecodeError::BadJsonPointer);
        }
        let Some((fragment, next)) = pointer::split_fragment(json_pointer, i + 1) else {
            return Err(DecodeError::BadJsonPointer);
        };
        i = next;
        walk_pointer_fragment(src, &fragment)?;
    }
    decode_one_value(src, callbacks)
}

/// Decodes one JSON document from `input`, reporting events into
/// `callbacks`.
///
/// `quirks` are forwarded in order to the built-in [`Tokenizer`];
/// `json_pointer` selects a subtree to decode, with the empty pointer
/// meaning the root. The walk and the decode share one pass over the stream:
/// nothing outside the selected subtree is reported or buffered.
///
/// All failures (malformed pointers, no-match, I/O, syntax, callback
/// vetoes) surface in the returned [`DecodeJsonResult`];
/// [`done`](DecodeJsonCallbacks::done) runs exactly once either way.
pub fn decode_json<C, I>(
    callbacks: &mut C,
    input: &mut I,
    quirks: &[u32],
    json_pointer: &str,
) -> DecodeJsonResult
where
    C: DecodeJsonCallbacks,
    I: Input,
{
    let mut tokenizer = Tokenizer::new();
    for &quirk in quirks {
        tokenizer.set_quirk_enabled(quirk, true);
    }
    decode_json_with(callbacks, &mut tokenizer, input, json_pointer)
}

/// [`decode_json`], but over a caller-supplied low-level decoder.
pub fn decode_json_with<C, D, I>(
    callbacks: &mut C,
    decoder: &mut D,
    input: &mut I,
    json_pointer: &str,
) -> DecodeJsonResult
where
    C: DecodeJsonCallbacks,
    D: TokenDecoder + ?Sized,
    I: Input,
{
    let mut io_buf = input
        .bring_your_own_buffer()
        .unwrap_or_else(|| IoBuffer::with_capacity(FALLBACK_IO_BUFFER_LEN));

    let (outcome, cursor) = {
        let mut src = TokenSource::new(decoder, input, &mut io_buf);
        let outcome = drive(&mut src, callbacks, json_pointer);
        (outcome, src.cursor)
    };

    let result = DecodeJsonResult {
        error_message: match outcome {
            Ok(()) => String::new(),
            Err(err) => err.to_string(),
        },
        cursor_position: io_buf.pos.saturating_add(cursor as u64),
    };
    callbacks.done(&result, input, &mut io_buf);
    result
}
