//! The built-in low-level JSON tokenizer.
//!
//! [`Tokenizer`] is a resumable byte-to-token state machine: it may park at
//! any byte boundary with a short read (window dry) or short write (token
//! ring full) and continue later from the same spot. Lexemes that cannot be
//! split (literals, numbers, escape sequences) are only consumed once fully
//! present in the window; string content and filler split freely into
//! continued fragments, which is what lets strings longer than the window
//! stream through it.

use alloc::{string::String, vec::Vec};

use crate::{
    decoder::{DecoderStatus, TokenDecoder},
    io_buffer::IoBuffer,
    token::{Container, LiteralValue, NumberRepr, StrConvert, Token, TokenValue},
    token_buffer::TokenBuffer,
};

const QUIRK_BASE: u32 = 0x6A74_0000;

/// Accept `\xHH` string escapes. Strings decoded under this quirk are byte
/// strings: they drop the must-be-UTF-8 guarantee and dispatch to
/// [`append_byte_string`](crate::DecodeJsonCallbacks::append_byte_string).
pub const QUIRK_ALLOW_BACKSLASH_X: u32 = QUIRK_BASE;

/// Accept `inf`, `infinity` and `nan` (case-insensitive, optional sign) as
/// number values.
pub const QUIRK_ALLOW_INF_NAN_NUMBERS: u32 = QUIRK_BASE + 1;

/// Accept `/* ... */` comments wherever whitespace is valid; they tokenize
/// as filler.
pub const QUIRK_ALLOW_COMMENT_BLOCK: u32 = QUIRK_BASE + 2;

/// Accept `// ...` comments wherever whitespace is valid; they tokenize as
/// filler.
pub const QUIRK_ALLOW_COMMENT_LINE: u32 = QUIRK_BASE + 3;

pub const BAD_INPUT: &str = "json: bad input";
pub const BAD_UTF_8: &str = "json: bad UTF-8";
pub const BAD_BACKSLASH_ESCAPE: &str = "json: bad backslash-escape";
pub const UNEXPECTED_EOF: &str = "json: unexpected end of input";
pub const UNSUPPORTED_NUMBER_LENGTH: &str = "json: unsupported number length";
pub const UNSUPPORTED_RECURSION_DEPTH: &str = "json: unsupported recursion depth";

const DEPTH_MAX: usize = 1024;
const NUMBER_LENGTH_MAX: usize = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Before the top-level value.
    Start,
    /// Array element position. `first` permits `]`.
    BeforeItem { first: bool },
    /// Object key position. `first` permits `}`.
    BeforeKey { first: bool },
    /// Between a key and its `:`.
    AfterKey,
    /// Between a `:` and the member value.
    BeforeMemberValue,
    /// After a complete value inside a container.
    AfterValue,
    /// Inside string content, past the opening quote.
    InString { is_key: bool },
    /// After the top-level value.
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comment {
    Line,
    Block { star: bool },
}

/// What one filler scan found.
enum Skipped {
    /// Emitted a filler token; re-enter the main loop.
    Filler,
    /// The next significant byte, not yet consumed.
    Byte(u8),
    /// Window dry, more input expected.
    ShortRead,
    /// Window dry and closed.
    ClosedEof,
}

enum Step {
    Go,
    Out(DecoderStatus),
}

fn fail(msg: &str) -> Step {
    Step::Out(DecoderStatus::Error(String::from(msg)))
}

/// Suspend for more input, or fail with `eof_msg` when none is coming.
fn starve(src: &IoBuffer, eof_msg: &str) -> Step {
    if src.closed {
        fail(eof_msg)
    } else {
        Step::Out(DecoderStatus::ShortRead)
    }
}

fn emit(tokens: &mut TokenBuffer, token: Token) {
    let pushed = tokens.push(token);
    debug_assert!(pushed, "token ring overflow");
}

#[derive(Debug, Default, Clone, Copy)]
struct Quirks {
    backslash_x: bool,
    inf_nan: bool,
    comment_block: bool,
    comment_line: bool,
}

/// A resumable JSON tokenizer implementing [`TokenDecoder`].
///
/// Validates the full grammar (single top-level value, strict commas and
/// colons, string UTF-8 and escapes, number syntax) so that downstream
/// consumers may assume well-formed structure. Nesting is capped at 1024
/// containers and numbers at 99 bytes.
#[derive(Debug)]
pub struct Tokenizer {
    state: State,
    stack: Vec<Container>,
    comment: Option<Comment>,
    quirks: Quirks,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: State::Start,
            stack: Vec::new(),
            comment: None,
            quirks: Quirks::default(),
        }
    }

    fn after_value_state(&self) -> State {
        if self.stack.is_empty() {
            State::End
        } else {
            State::AfterValue
        }
    }

    fn chain_must_be_utf8(&self) -> bool {
        !self.quirks.backslash_x
    }

    /// Consumes one contiguous run of whitespace (and comments, under the
    /// quirks), emitting a single filler token for it.
    fn skip_filler(&mut self, tokens: &mut TokenBuffer, src: &mut IoBuffer) -> Skipped {
        let start = src.ri;
        let outcome = loop {
            if src.ri >= src.wi {
                break if src.closed {
                    Skipped::ClosedEof
                } else {
                    Skipped::ShortRead
                };
            }
            let b = src.data[src.ri];
            match self.comment {
                Some(Comment::Line) => {
                    src.ri += 1;
                    if b == b'\n' {
                        self.comment = None;
                    }
                }
                Some(Comment::Block { star }) => {
                    src.ri += 1;
                    if star && b == b'/' {
                        self.comment = None;
                    } else {
                        self.comment = Some(Comment::Block { star: b == b'*' });
                    }
                }
                None => match b {
                    b' ' | b'\t' | b'\n' | b'\r' => src.ri += 1,
                    b'/' if self.quirks.comment_line || self.quirks.comment_block => {
                        if src.ri + 1 >= src.wi {
                            if src.closed {
                                break Skipped::Byte(b'/');
                            }
                            break Skipped::ShortRead;
                        }
                        match src.data[src.ri + 1] {
                            b'/' if self.quirks.comment_line => {
                                src.ri += 2;
                                self.comment = Some(Comment::Line);
                            }
                            b'*' if self.quirks.comment_block => {
                                src.ri += 2;
                                self.comment = Some(Comment::Block { star: false });
                            }
                            _ => break Skipped::Byte(b'/'),
                        }
                    }
                    _ => break Skipped::Byte(b),
                },
            }
        };
        if src.ri > start {
            emit(tokens, Token::filler(src.ri - start));
            return Skipped::Filler;
        }
        outcome
    }

    fn open_string(&mut self, is_key: bool, tokens: &mut TokenBuffer, src: &mut IoBuffer) {
        src.ri += 1;
        emit(
            tokens,
            Token {
                len: 1,
                continued: true,
                value: TokenValue::Str {
                    convert: StrConvert::Drop,
                    must_be_utf8: self.chain_must_be_utf8(),
                },
            },
        );
        self.state = State::InString { is_key };
    }

    fn pop_container(&mut self, tokens: &mut TokenBuffer, src: &mut IoBuffer) -> Step {
        let Some(container) = self.stack.pop() else {
            return fail(BAD_INPUT);
        };
        src.ri += 1;
        emit(
            tokens,
            Token {
                len: 1,
                continued: false,
                value: TokenValue::Structure {
                    push: false,
                    container,
                },
            },
        );
        self.state = self.after_value_state();
        Step::Go
    }

    /// Dispatches on the first byte of a value.
    fn lex_value(&mut self, b: u8, tokens: &mut TokenBuffer, src: &mut IoBuffer) -> Step {
        match b {
            b'{' | b'[' => {
                if self.stack.len() >= DEPTH_MAX {
                    return fail(UNSUPPORTED_RECURSION_DEPTH);
                }
                src.ri += 1;
                let container = if b == b'{' {
                    Container::Object
                } else {
                    Container::Array
                };
                self.stack.push(container);
                emit(
                    tokens,
                    Token {
                        len: 1,
                        continued: false,
                        value: TokenValue::Structure {
                            push: true,
                            container,
                        },
                    },
                );
                self.state = match container {
                    Container::Object => State::BeforeKey { first: true },
                    Container::Array => State::BeforeItem { first: true },
                };
                Step::Go
            }
            b'"' => {
                self.open_string(false, tokens, src);
                Step::Go
            }
            b'-' => {
                if self.quirks.inf_nan {
                    if src.ri + 1 >= src.wi {
                        return starve(src, BAD_INPUT);
                    }
                    if src.data[src.ri + 1].is_ascii_alphabetic() {
                        return self.lex_word(tokens, src);
                    }
                }
                self.lex_number(tokens, src)
            }
            b'0'..=b'9' => self.lex_number(tokens, src),
            b'+' if self.quirks.inf_nan => self.lex_word(tokens, src),
            b't' | b'f' | b'n' => self.lex_word(tokens, src),
            c if c.is_ascii_alphabetic() && self.quirks.inf_nan => self.lex_word(tokens, src),
            _ => fail(BAD_INPUT),
        }
    }

    /// Lexes `true` / `false` / `null`, plus the inf/nan words under the
    /// quirk. The whole word must be present in the window.
    fn lex_word(&mut self, tokens: &mut TokenBuffer, src: &mut IoBuffer) -> Step {
        let start = src.ri;
        let mut i = start;
        let mut negative = false;
        if matches!(src.data[i], b'+' | b'-') {
            negative = src.data[i] == b'-';
            i += 1;
        }
        let word_start = i;
        while i < src.wi && src.data[i].is_ascii_alphabetic() {
            i += 1;
            if i - word_start > 8 {
                return fail(BAD_INPUT);
            }
        }
        if i == src.wi && !src.closed {
            return Step::Out(DecoderStatus::ShortRead);
        }
        let word = &src.data[word_start..i];
        let signed = word_start != start;
        let value = match word {
            b"true" if !signed => TokenValue::Literal(LiteralValue::True),
            b"false" if !signed => TokenValue::Literal(LiteralValue::False),
            b"null" if !signed => TokenValue::Literal(LiteralValue::Null),
            _ if self.quirks.inf_nan
                && (word.eq_ignore_ascii_case(b"inf") || word.eq_ignore_ascii_case(b"infinity")) =>
            {
                TokenValue::Number(if negative {
                    NumberRepr::NegInf
                } else {
                    NumberRepr::PosInf
                })
            }
            _ if self.quirks.inf_nan && word.eq_ignore_ascii_case(b"nan") => {
                TokenValue::Number(if negative {
                    NumberRepr::NegNan
                } else {
                    NumberRepr::PosNan
                })
            }
            _ => return fail(BAD_INPUT),
        };
        emit(
            tokens,
            Token {
                len: i - start,
                continued: false,
                value,
            },
        );
        src.ri = i;
        self.state = self.after_value_state();
        Step::Go
    }

    /// Lexes one number. The whole lexeme must be present in the window; a
    /// window ending mid-number leaves it unread and suspends.
    fn lex_number(&mut self, tokens: &mut TokenBuffer, src: &mut IoBuffer) -> Step {
        let start = src.ri;
        let mut end = start;
        while end < src.wi && is_number_byte(src.data[end]) {
            end += 1;
            if end - start > NUMBER_LENGTH_MAX {
                return fail(UNSUPPORTED_NUMBER_LENGTH);
            }
        }
        if end == src.wi && !src.closed {
            return Step::Out(DecoderStatus::ShortRead);
        }
        let Some(integer_signed) = classify_number(&src.data[start..end]) else {
            return fail(BAD_INPUT);
        };
        emit(
            tokens,
            Token {
                len: end - start,
                continued: false,
                value: TokenValue::Number(NumberRepr::Text {
                    integer_signed,
                    floating_point: true,
                }),
            },
        );
        src.ri = end;
        self.state = self.after_value_state();
        Step::Go
    }

    /// One step of string content: the closing quote, one escape sequence,
    /// or one plain fragment up to the next quote, backslash, control byte
    /// or window end.
    fn step_string(&mut self, is_key: bool, tokens: &mut TokenBuffer, src: &mut IoBuffer) -> Step {
        if src.ri >= src.wi {
            return starve(src, UNEXPECTED_EOF);
        }
        match src.data[src.ri] {
            b'"' => {
                src.ri += 1;
                emit(
                    tokens,
                    Token {
                        len: 1,
                        continued: false,
                        value: TokenValue::Str {
                            convert: StrConvert::Drop,
                            must_be_utf8: self.chain_must_be_utf8(),
                        },
                    },
                );
                self.state = if is_key {
                    State::AfterKey
                } else {
                    self.after_value_state()
                };
                Step::Go
            }
            b'\\' => self.lex_escape(tokens, src),
            0x00..=0x1F => fail(BAD_INPUT),
            _ => {
                let start = src.ri;
                let mut end = start;
                while end < src.wi {
                    let c = src.data[end];
                    if c == b'"' || c == b'\\' || c < 0x20 {
                        break;
                    }
                    end += 1;
                }
                match core::str::from_utf8(&src.data[start..end]) {
                    Ok(_) => {
                        emit(
                            tokens,
                            Token {
                                len: end - start,
                                continued: true,
                                value: TokenValue::Str {
                                    convert: StrConvert::Copy,
                                    must_be_utf8: self.chain_must_be_utf8(),
                                },
                            },
                        );
                        src.ri = end;
                        Step::Go
                    }
                    Err(err) => {
                        let valid = err.valid_up_to();
                        if valid > 0 {
                            // Flush the valid prefix; the next step decides
                            // whether the remainder is an error or a refill.
                            emit(
                                tokens,
                                Token {
                                    len: valid,
                                    continued: true,
                                    value: TokenValue::Str {
                                        convert: StrConvert::Copy,
                                        must_be_utf8: self.chain_must_be_utf8(),
                                    },
                                },
                            );
                            src.ri += valid;
                            Step::Go
                        } else if err.error_len().is_some() || end < src.wi || src.closed {
                            fail(BAD_UTF_8)
                        } else {
                            // A multi-byte sequence runs off the window end;
                            // leave it unread.
                            Step::Out(DecoderStatus::ShortRead)
                        }
                    }
                }
            }
        }
    }

    /// Lexes one backslash escape. `src.data[src.ri]` is the backslash.
    fn lex_escape(&mut self, tokens: &mut TokenBuffer, src: &mut IoBuffer) -> Step {
        if src.wi - src.ri < 2 {
            return starve(src, UNEXPECTED_EOF);
        }
        let code_point = match src.data[src.ri + 1] {
            b'"' => Some(0x22),
            b'\\' => Some(0x5C),
            b'/' => Some(0x2F),
            b'b' => Some(0x08),
            b'f' => Some(0x0C),
            b'n' => Some(0x0A),
            b'r' => Some(0x0D),
            b't' => Some(0x09),
            _ => None,
        };
        if let Some(cp) = code_point {
            src.ri += 2;
            emit(
                tokens,
                Token {
                    len: 2,
                    continued: true,
                    value: TokenValue::UnicodeCodePoint(cp),
                },
            );
            return Step::Go;
        }
        match src.data[src.ri + 1] {
            b'u' => self.lex_unicode_escape(tokens, src),
            b'x' if self.quirks.backslash_x => {
                if src.wi - src.ri < 4 {
                    return starve(src, BAD_BACKSLASH_ESCAPE);
                }
                if hex(&src.data[src.ri + 2..src.ri + 4]).is_none() {
                    return fail(BAD_BACKSLASH_ESCAPE);
                }
                emit(
                    tokens,
                    Token {
                        len: 4,
                        continued: true,
                        value: TokenValue::Str {
                            convert: StrConvert::BackslashX,
                            must_be_utf8: false,
                        },
                    },
                );
                src.ri += 4;
                Step::Go
            }
            _ => fail(BAD_BACKSLASH_ESCAPE),
        }
    }

    /// Lexes `\uXXXX`, pairing surrogates into a single 12-byte token.
    fn lex_unicode_escape(&mut self, tokens: &mut TokenBuffer, src: &mut IoBuffer) -> Step {
        if src.wi - src.ri < 6 {
            return starve(src, BAD_BACKSLASH_ESCAPE);
        }
        let Some(cp) = hex(&src.data[src.ri + 2..src.ri + 6]) else {
            return fail(BAD_BACKSLASH_ESCAPE);
        };
        match cp {
            0xD800..=0xDBFF => {
                if src.wi - src.ri < 12 {
                    return starve(src, BAD_BACKSLASH_ESCAPE);
                }
                if src.data[src.ri + 6] != b'\\' || src.data[src.ri + 7] != b'u' {
                    return fail(BAD_BACKSLASH_ESCAPE);
                }
                let Some(lo) = hex(&src.data[src.ri + 8..src.ri + 12]) else {
                    return fail(BAD_BACKSLASH_ESCAPE);
                };
                if !(0xDC00..=0xDFFF).contains(&lo) {
                    return fail(BAD_BACKSLASH_ESCAPE);
                }
                let cp = 0x10000 + ((cp - 0xD800) << 10) + (lo - 0xDC00);
                emit(
                    tokens,
                    Token {
                        len: 12,
                        continued: true,
                        value: TokenValue::UnicodeCodePoint(cp),
                    },
                );
                src.ri += 12;
                Step::Go
            }
            0xDC00..=0xDFFF => fail(BAD_BACKSLASH_ESCAPE),
            _ => {
                emit(
                    tokens,
                    Token {
                        len: 6,
                        continued: true,
                        value: TokenValue::UnicodeCodePoint(cp),
                    },
                );
                src.ri += 6;
                Step::Go
            }
        }
    }

    /// One step of any non-string state: skip filler, then act on the next
    /// significant byte.
    fn step_structural(&mut self, tokens: &mut TokenBuffer, src: &mut IoBuffer) -> Step {
        let b = match self.skip_filler(tokens, src) {
            Skipped::Filler => return Step::Go,
            Skipped::ShortRead => return Step::Out(DecoderStatus::ShortRead),
            Skipped::ClosedEof => {
                return match self.state {
                    State::End => Step::Out(DecoderStatus::Ok),
                    _ => fail(UNEXPECTED_EOF),
                };
            }
            Skipped::Byte(b) => b,
        };
        match self.state {
            State::Start | State::BeforeMemberValue => self.lex_value(b, tokens, src),
            State::BeforeItem { first } => {
                if b == b']' {
                    if first {
                        self.pop_container(tokens, src)
                    } else {
                        fail(BAD_INPUT)
                    }
                } else {
                    self.lex_value(b, tokens, src)
                }
            }
            State::BeforeKey { first } => match b {
                b'"' => {
                    self.open_string(true, tokens, src);
                    Step::Go
                }
                b'}' if first => self.pop_container(tokens, src),
                _ => fail(BAD_INPUT),
            },
            State::AfterKey => {
                if b == b':' {
                    src.ri += 1;
                    emit(tokens, Token::filler(1));
                    self.state = State::BeforeMemberValue;
                    Step::Go
                } else {
                    fail(BAD_INPUT)
                }
            }
            State::AfterValue => {
                let Some(&top) = self.stack.last() else {
                    return fail(BAD_INPUT);
                };
                match b {
                    b',' => {
                        src.ri += 1;
                        emit(tokens, Token::filler(1));
                        self.state = match top {
                            Container::Object => State::BeforeKey { first: false },
                            Container::Array => State::BeforeItem { first: false },
                        };
                        Step::Go
                    }
                    b'}' if top == Container::Object => self.pop_container(tokens, src),
                    b']' if top == Container::Array => self.pop_container(tokens, src),
                    _ => fail(BAD_INPUT),
                }
            }
            State::End => fail(BAD_INPUT),
            State::InString { .. } => fail(BAD_INPUT),
        }
    }
}

impl TokenDecoder for Tokenizer {
    fn set_quirk_enabled(&mut self, quirk: u32, enabled: bool) {
        match quirk {
            QUIRK_ALLOW_BACKSLASH_X => self.quirks.backslash_x = enabled,
            QUIRK_ALLOW_INF_NAN_NUMBERS => self.quirks.inf_nan = enabled,
            QUIRK_ALLOW_COMMENT_BLOCK => self.quirks.comment_block = enabled,
            QUIRK_ALLOW_COMMENT_LINE => self.quirks.comment_line = enabled,
            _ => {}
        }
    }

    fn decode_tokens(&mut self, tokens: &mut TokenBuffer, source: &mut IoBuffer) -> DecoderStatus {
        loop {
            if tokens.is_full() {
                return DecoderStatus::ShortWrite;
            }
            let step = match self.state {
                State::InString { is_key } => self.step_string(is_key, tokens, source),
                _ => self.step_structural(tokens, source),
            };
            match step {
                Step::Go => {}
                Step::Out(status) => return status,
            }
        }
    }
}

fn is_number_byte(b: u8) -> bool {
    b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-')
}

/// Validates JSON number syntax; `Some(true)` for integers (no fraction, no
/// exponent).
fn classify_number(bytes: &[u8]) -> Option<bool> {
    let mut i = 0;
    if bytes.first() == Some(&b'-') {
        i += 1;
    }
    match bytes.get(i) {
        Some(b'0') => i += 1,
        Some(b'1'..=b'9') => {
            while matches!(bytes.get(i), Some(b'0'..=b'9')) {
                i += 1;
            }
        }
        _ => return None,
    }
    let mut integer = true;
    if bytes.get(i) == Some(&b'.') {
        integer = false;
        i += 1;
        if !matches!(bytes.get(i), Some(b'0'..=b'9')) {
            return None;
        }
        while matches!(bytes.get(i), Some(b'0'..=b'9')) {
            i += 1;
        }
    }
    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        integer = false;
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        if !matches!(bytes.get(i), Some(b'0'..=b'9')) {
            return None;
        }
        while matches!(bytes.get(i), Some(b'0'..=b'9')) {
            i += 1;
        }
    }
    (i == bytes.len()).then_some(integer)
}

fn hex(digits: &[u8]) -> Option<u32> {
    let mut value = 0u32;
    for &d in digits {
        value = (value << 4) | u32::from((d as char).to_digit(16)?);
    }
    Some(value)
}
