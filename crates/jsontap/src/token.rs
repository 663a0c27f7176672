//! Tokens exchanged between the low-level decoder and the event driver.

/// The kind of container a structure token opens or closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Object,
    Array,
}

/// How a string token's source span converts into assembled bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrConvert {
    /// The span carries no content (quotes, escape framing).
    Drop,
    /// The span is appended verbatim.
    Copy,
    /// The span is `\xHH` groups, four source bytes per content byte,
    /// base-16 decoded.
    BackslashX,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralValue {
    Null,
    False,
    True,
}

/// What a number token's span denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberRepr {
    /// The span is the number's text. `integer_signed` asks the driver to try
    /// an i64 parse first; `floating_point` permits an f64 fallback.
    Text {
        integer_signed: bool,
        floating_point: bool,
    },
    NegInf,
    PosInf,
    NegNan,
    PosNan,
}

/// The semantic category of a token, with its category-specific detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenValue {
    /// Insignificant bytes: whitespace, `:`, `,`, comments under quirks.
    Filler,
    Structure {
        push: bool,
        container: Container,
    },
    /// A fragment of a string value. `must_be_utf8` on the run's terminal
    /// token selects text-string dispatch over byte-string dispatch.
    Str {
        convert: StrConvert,
        must_be_utf8: bool,
    },
    /// A single Unicode scalar value, encoded in the span as an escape.
    UnicodeCodePoint(u32),
    Literal(LiteralValue),
    Number(NumberRepr),
}

/// One unit of the low-level decoder's output.
///
/// `len` is the exact number of source bytes the token stands for; the driver
/// advances its cursor by `len` per token consumed, so every source byte is
/// covered by exactly one token. `continued` marks a fragment whose semantic
/// value extends into the next token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub len: usize,
    pub continued: bool,
    pub value: TokenValue,
}

impl Token {
    #[must_use]
    pub fn filler(len: usize) -> Self {
        Self {
            len,
            continued: false,
            value: TokenValue::Filler,
        }
    }
}
