//! Error taxonomy and human-readable rendering.
//!
//! Both error sets are closed: every failure the engine can produce is one
//! of these variants, and the display strings are stable (tests pin them).

use thiserror::Error;

/// Errors raised by the lexers.
///
/// When `lex` returns one of these, the offset it was advancing points at
/// the offending byte.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexError {
    #[error("invalid char in json text.")]
    InvalidChar,

    #[error("invalid string in json text.")]
    InvalidString,

    #[error("invalid bytes in UTF8 string.")]
    StringInvalidUtf8,

    #[error("inside a string, '\\' occurs before a character which it may not.")]
    StringInvalidEscapedChar,

    #[error("invalid character inside string.")]
    StringInvalidJsonChar,

    #[error("invalid (non-hex) character occurs after '\\u' inside string.")]
    StringInvalidHexChar,

    #[error("malformed number, extra leading zeros are not allowed.")]
    LeadingZeros,

    #[error("malformed number, a digit is required after the minus sign.")]
    MissingIntegerAfterMinus,

    #[error("malformed number, a digit is required after the decimal point.")]
    MissingIntegerAfterDecimal,

    #[error("malformed number, a digit is required after the exponent.")]
    MissingIntegerAfterExponent,

    #[error("probable comment found in input text, comments are not enabled.")]
    UnallowedComment,

    // Reverse-scan mirrors of the number errors above.
    #[error("malformed number, a digit is required before the exponent.")]
    MissingIntegerBeforeExponent,

    #[error("malformed number, a digit is required before the decimal point.")]
    MissingIntegerBeforeDecimal,

    #[error("malformed number, an exponent is required before the plus sign.")]
    MissingExponentBeforePlus,
}

/// Errors raised by the parser cores.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error("trailing garbage")]
    TrailingGarbage,

    #[error("premature EOF")]
    PrematureEof,

    #[error("client cancelled parse via callback return value")]
    ClientCancelled,

    #[error("integer overflow")]
    IntegerOverflow,

    #[error("numeric (floating point) overflow")]
    DoubleOverflow,

    #[error("invalid object key (must be a string)")]
    KeyMustBeString,

    #[error("object key and value must be separated by a colon (':')")]
    MissingColon,

    #[error("unallowed token at this point in JSON text")]
    UnallowedToken,

    #[error("after array element, I expect ',' or ']'")]
    AfterArrayElement,

    #[error("after key and value, inside map, I expect ',' or '}}'")]
    AfterMapPair,

    // Reverse-variant mirrors of the two above.
    #[error("before array element, I expect ',' or '['")]
    BeforeArrayElement,

    #[error("before key and value, inside map, I expect ',' or '{{'")]
    BeforeMapPair,
}

const ARROW: &str = "                     (right here) ------^\n";

/// Build the error report string.
///
/// `kind` is `"parse"`, `"lexical"` or `"unknown"`; `offset` indexes into
/// `text`, the chunk the caller last fed. With `verbose`, a context window
/// of up to 30 bytes either side of the offset is appended, padded so the
/// arrow on the following line points at the offending byte; newlines
/// inside the window are flattened to spaces.
pub(crate) fn render_error(
    kind: &str,
    message: Option<&str>,
    text: &[u8],
    offset: usize,
    verbose: bool,
) -> String {
    let mut out = String::new();
    out.push_str(kind);
    out.push_str(" error");
    if let Some(message) = message {
        out.push_str(": ");
        out.push_str(message);
    }
    out.push('\n');

    if verbose {
        let spaces = if offset < 30 { 40 - offset } else { 10 };
        let start = offset.saturating_sub(30).min(text.len());
        let end = (offset + 30).min(text.len());

        // assemble the window as bytes so multi-byte sequences in the
        // input come through verbatim
        let mut window = vec![b' '; spaces];
        for &b in &text[start..end] {
            window.push(if b == b'\n' || b == b'\r' { b' ' } else { b });
        }
        out.push_str(&String::from_utf8_lossy(&window));
        out.push('\n');
        out.push_str(ARROW);
    }
    out
}
