//! The forward resumable lexer.
//!
//! The lexer consumes a chunk left-to-right and must be suspendable at any
//! byte boundary: when a chunk ends mid-token it returns
//! [`Lexed::NeedMore`] after recording exactly where inside the current
//! recognizer it stopped, and the next call re-enters at that point as if
//! the input had never been split.
//!
//! Each recognizer (keyword, string, number, comment) is written as a
//! small state machine whose states are its read points; recognizers keep
//! no locals across a potential suspension; everything needed after a
//! resume lives in [`State`]. Whenever a suspension occurs, the bytes of
//! the partial token are appended to a persistent buffer so that the
//! completed token's payload is contiguous no matter how many chunk
//! boundaries it crossed.

use crate::buf::Buf;
use crate::chars::{self, INVALID_JSON_CHAR, VALID_ESCAPE, VALID_HEX};
use crate::error::LexError;
use crate::token::Token;

/// Keyword residues after the dispatched first byte: `t` continues at 0,
/// `f` at 4, `n` at 9. NUL terminates each run.
const KEYWORD_RESIDUE: &[u8] = b"rue\0alse\0ull\0";

/// Outcome of one [`Lexer::lex`] call.
#[derive(Debug, PartialEq, Eq)]
pub enum Lexed<'a> {
    /// A complete token. `raw` is the token's source bytes, inside the
    /// caller's chunk on the fast path or inside the lexer's buffer if
    /// the token ever suspended, with the surrounding quotes already
    /// stripped for strings.
    Token { tok: Token, raw: &'a [u8] },
    /// The chunk ended before the next token completed; call again with
    /// more input.
    NeedMore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    /// Matching a keyword tail; `at` indexes [`KEYWORD_RESIDUE`].
    Keyword { at: u8 },
    Str(StrPos),
    Num(NumPos),
    Comment(CommentPos),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StrPos {
    /// Inside the body, scanning for something interesting.
    Scan,
    /// Just consumed a backslash.
    Escape,
    /// Inside `\uXXXX`, `left` hex digits still expected.
    Hex { left: u8 },
    /// Inside a multi-byte sequence, `left` continuation bytes expected.
    Utf8 { left: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumPos {
    Begin,
    AfterMinus,
    AfterZero,
    IntDigits,
    FracFirst,
    FracDigits,
    ExpSign,
    ExpFirst,
    ExpDigits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommentPos {
    /// Consumed the first `/`, deciding which comment form.
    Open,
    /// Inside `//`, running to end of line.
    Line,
    /// Inside `/* */`.
    Block,
    /// Inside `/* */`, just consumed a `*`.
    BlockStar,
}

/// Resumable tokenizer over byte chunks.
///
/// Invariant: `state == Start` exactly when the persistent buffer holds no
/// partial token.
#[derive(Debug, Clone)]
pub struct Lexer {
    state: State,
    /// The token the in-flight recognizer will emit if it completes;
    /// flips e.g. from `Str` to `StrWithEscapes` or `Integer` to `Double`
    /// as the recognizer learns more.
    result: Token,
    error: Option<LexError>,
    buf: Buf,
    allow_comments: bool,
    validate_utf8: bool,
}

impl Lexer {
    pub fn new(allow_comments: bool, validate_utf8: bool) -> Self {
        Self {
            state: State::Start,
            result: Token::Null,
            error: None,
            buf: Buf::new(),
            allow_comments,
            validate_utf8,
        }
    }

    /// The error that made the last `lex` call fail, if any.
    #[inline]
    pub fn last_error(&self) -> Option<LexError> {
        self.error
    }

    /// Forget any in-flight token and stored error. Buffer capacity is
    /// kept.
    pub fn reset(&mut self) {
        self.state = State::Start;
        self.error = None;
        self.buf.clear();
    }

    /// Lex the next token from `input` starting at `*offset`, advancing
    /// `*offset` past everything consumed.
    ///
    /// On an error the offset points at the offending byte and the error
    /// is also retained for [`Lexer::last_error`].
    pub fn lex<'a>(
        &'a mut self,
        input: &'a [u8],
        offset: &mut usize,
    ) -> Result<Lexed<'a>, LexError> {
        let mut entry_state = self.state;
        let mut start = *offset;

        if entry_state == State::Start {
            self.buf.clear();
        }

        let outcome: Result<Option<Token>, LexError> = 'outer: loop {
            match self.state {
                State::Start => loop {
                    if *offset >= input.len() {
                        break 'outer Ok(None);
                    }
                    let c = input[*offset];
                    *offset += 1;
                    match c {
                        b'{' => break 'outer Ok(Some(Token::LBrace)),
                        b'}' => break 'outer Ok(Some(Token::RBrace)),
                        b'[' => break 'outer Ok(Some(Token::LBracket)),
                        b']' => break 'outer Ok(Some(Token::RBracket)),
                        b',' => break 'outer Ok(Some(Token::Comma)),
                        b':' => break 'outer Ok(Some(Token::Colon)),
                        b'\t' | b'\n' | 0x0B | 0x0C | b'\r' | b' ' => start += 1,
                        b't' => {
                            self.result = Token::True;
                            self.state = State::Keyword { at: 0 };
                            continue 'outer;
                        }
                        b'f' => {
                            self.result = Token::False;
                            self.state = State::Keyword { at: 4 };
                            continue 'outer;
                        }
                        b'n' => {
                            self.result = Token::Null;
                            self.state = State::Keyword { at: 9 };
                            continue 'outer;
                        }
                        b'"' => {
                            self.result = Token::Str;
                            self.state = State::Str(StrPos::Scan);
                            continue 'outer;
                        }
                        b'-' | b'0'..=b'9' => {
                            // the number recognizer wants the first byte too
                            *offset -= 1;
                            self.result = Token::Integer;
                            self.state = State::Num(NumPos::Begin);
                            continue 'outer;
                        }
                        b'/' => {
                            if !self.allow_comments {
                                *offset -= 1;
                                break 'outer Err(LexError::UnallowedComment);
                            }
                            self.state = State::Comment(CommentPos::Open);
                            continue 'outer;
                        }
                        _ => break 'outer Err(LexError::InvalidChar),
                    }
                },
                State::Keyword { at } => break 'outer self.lex_keyword(input, offset, at),
                State::Str(pos) => break 'outer self.lex_string(input, offset, pos),
                State::Num(pos) => break 'outer self.lex_number(input, offset, pos),
                State::Comment(pos) => match self.lex_comment(input, offset, pos) {
                    Err(e) => break 'outer Err(e),
                    Ok(false) => break 'outer Ok(None),
                    Ok(true) => {
                        // a completed comment is not a token: behave as if
                        // we had returned and been re-entered fresh
                        self.buf.clear();
                        self.state = State::Start;
                        entry_state = State::Start;
                        start = *offset;
                    }
                },
            }
        };

        match outcome {
            Ok(None) => {
                self.buf.append(&input[start..*offset]);
                Ok(Lexed::NeedMore)
            }
            Ok(Some(tok)) => {
                let raw: &[u8] = if entry_state != State::Start {
                    self.buf.append(&input[start..*offset]);
                    self.state = State::Start;
                    self.buf.as_slice()
                } else {
                    self.state = State::Start;
                    &input[start..*offset]
                };
                let raw = if matches!(tok, Token::Str | Token::StrWithEscapes) {
                    &raw[1..raw.len() - 1]
                } else {
                    raw
                };
                Ok(Lexed::Token { tok, raw })
            }
            Err(e) => {
                if entry_state != State::Start {
                    self.buf.append(&input[start..*offset]);
                }
                self.state = State::Start;
                self.error = Some(e);
                Err(e)
            }
        }
    }

    /// Compute the next token's kind without consuming it.
    ///
    /// `Ok(None)` means the remaining input does not hold a complete
    /// token. Internal state, including the partial-token buffer, is
    /// restored afterwards.
    pub fn peek(&mut self, input: &[u8], mut offset: usize) -> Result<Option<Token>, LexError> {
        let state = self.state;
        let result = self.result;
        let buf_len = self.buf.len();

        let outcome = match self.lex(input, &mut offset) {
            Ok(Lexed::Token { tok, .. }) => Ok(Some(tok)),
            Ok(Lexed::NeedMore) => Ok(None),
            Err(e) => Err(e),
        };

        self.state = state;
        self.result = result;
        self.buf.truncate(buf_len);
        outcome
    }

    fn lex_keyword(
        &mut self,
        input: &[u8],
        offset: &mut usize,
        mut at: u8,
    ) -> Result<Option<Token>, LexError> {
        while KEYWORD_RESIDUE[at as usize] != 0 {
            if *offset >= input.len() {
                self.state = State::Keyword { at };
                return Ok(None);
            }
            let c = input[*offset];
            *offset += 1;
            if c != KEYWORD_RESIDUE[at as usize] {
                *offset -= 1;
                return Err(LexError::InvalidString);
            }
            at += 1;
        }
        Ok(Some(self.result))
    }

    fn lex_string(
        &mut self,
        input: &[u8],
        offset: &mut usize,
        mut pos: StrPos,
    ) -> Result<Option<Token>, LexError> {
        loop {
            match pos {
                StrPos::Scan => {
                    if *offset < input.len() {
                        *offset += chars::string_scan(&input[*offset..], self.validate_utf8);
                    }
                    if *offset >= input.len() {
                        self.state = State::Str(StrPos::Scan);
                        return Ok(None);
                    }
                    let c = input[*offset];
                    *offset += 1;
                    if c == b'"' {
                        return Ok(Some(self.result));
                    } else if c == b'\\' {
                        self.result = Token::StrWithEscapes;
                        pos = StrPos::Escape;
                    } else if chars::class(c) & INVALID_JSON_CHAR != 0 {
                        *offset -= 1;
                        return Err(LexError::StringInvalidJsonChar);
                    } else if self.validate_utf8 && c >= 0x80 {
                        let left = match c {
                            0xC0..=0xDF => 1,
                            0xE0..=0xEF => 2,
                            0xF0..=0xF7 => 3,
                            _ => return Err(LexError::StringInvalidUtf8),
                        };
                        pos = StrPos::Utf8 { left };
                    }
                }
                StrPos::Escape => {
                    if *offset >= input.len() {
                        self.state = State::Str(StrPos::Escape);
                        return Ok(None);
                    }
                    let c = input[*offset];
                    *offset += 1;
                    if c == b'u' {
                        pos = StrPos::Hex { left: 4 };
                    } else if chars::class(c) & VALID_ESCAPE != 0 {
                        pos = StrPos::Scan;
                    } else {
                        *offset -= 1;
                        return Err(LexError::StringInvalidEscapedChar);
                    }
                }
                StrPos::Hex { mut left } => {
                    while left > 0 {
                        if *offset >= input.len() {
                            self.state = State::Str(StrPos::Hex { left });
                            return Ok(None);
                        }
                        let c = input[*offset];
                        *offset += 1;
                        if chars::class(c) & VALID_HEX == 0 {
                            *offset -= 1;
                            return Err(LexError::StringInvalidHexChar);
                        }
                        left -= 1;
                    }
                    pos = StrPos::Scan;
                }
                StrPos::Utf8 { mut left } => {
                    while left > 0 {
                        if *offset >= input.len() {
                            self.state = State::Str(StrPos::Utf8 { left });
                            return Ok(None);
                        }
                        let c = input[*offset];
                        *offset += 1;
                        if c >> 6 != 0b10 {
                            return Err(LexError::StringInvalidUtf8);
                        }
                        left -= 1;
                    }
                    pos = StrPos::Scan;
                }
            }
        }
    }

    fn lex_number(
        &mut self,
        input: &[u8],
        offset: &mut usize,
        mut pos: NumPos,
    ) -> Result<Option<Token>, LexError> {
        // Numbers are the one entity we must read *past* to know they are
        // complete; the terminating byte is unread below. A number at the
        // very end of input stays suspended until `finish` settles it.
        loop {
            if *offset >= input.len() {
                self.state = State::Num(pos);
                return Ok(None);
            }
            let c = input[*offset];
            *offset += 1;
            pos = match pos {
                NumPos::Begin => {
                    if c == b'-' {
                        NumPos::AfterMinus
                    } else if c == b'0' {
                        NumPos::AfterZero
                    } else {
                        // dispatch guarantees a digit here
                        NumPos::IntDigits
                    }
                }
                NumPos::AfterMinus => {
                    if c == b'0' {
                        NumPos::AfterZero
                    } else if c.is_ascii_digit() {
                        NumPos::IntDigits
                    } else {
                        *offset -= 1;
                        return Err(LexError::MissingIntegerAfterMinus);
                    }
                }
                NumPos::AfterZero => {
                    if c.is_ascii_digit() {
                        *offset -= 1;
                        return Err(LexError::LeadingZeros);
                    } else if c == b'.' {
                        NumPos::FracFirst
                    } else if c == b'e' || c == b'E' {
                        NumPos::ExpSign
                    } else {
                        *offset -= 1;
                        return Ok(Some(self.result));
                    }
                }
                NumPos::IntDigits => {
                    if c.is_ascii_digit() {
                        NumPos::IntDigits
                    } else if c == b'.' {
                        NumPos::FracFirst
                    } else if c == b'e' || c == b'E' {
                        NumPos::ExpSign
                    } else {
                        *offset -= 1;
                        return Ok(Some(self.result));
                    }
                }
                NumPos::FracFirst => {
                    if c.is_ascii_digit() {
                        self.result = Token::Double;
                        NumPos::FracDigits
                    } else {
                        *offset -= 1;
                        return Err(LexError::MissingIntegerAfterDecimal);
                    }
                }
                NumPos::FracDigits => {
                    if c.is_ascii_digit() {
                        NumPos::FracDigits
                    } else if c == b'e' || c == b'E' {
                        NumPos::ExpSign
                    } else {
                        *offset -= 1;
                        return Ok(Some(self.result));
                    }
                }
                NumPos::ExpSign => {
                    if c == b'+' || c == b'-' {
                        NumPos::ExpFirst
                    } else if c.is_ascii_digit() {
                        self.result = Token::Double;
                        NumPos::ExpDigits
                    } else {
                        *offset -= 1;
                        return Err(LexError::MissingIntegerAfterExponent);
                    }
                }
                NumPos::ExpFirst => {
                    if c.is_ascii_digit() {
                        self.result = Token::Double;
                        NumPos::ExpDigits
                    } else {
                        *offset -= 1;
                        return Err(LexError::MissingIntegerAfterExponent);
                    }
                }
                NumPos::ExpDigits => {
                    if c.is_ascii_digit() {
                        NumPos::ExpDigits
                    } else {
                        *offset -= 1;
                        return Ok(Some(self.result));
                    }
                }
            };
        }
    }

    /// Returns `Ok(true)` when a comment completed, `Ok(false)` on
    /// suspension.
    fn lex_comment(
        &mut self,
        input: &[u8],
        offset: &mut usize,
        mut pos: CommentPos,
    ) -> Result<bool, LexError> {
        loop {
            if *offset >= input.len() {
                self.state = State::Comment(pos);
                return Ok(false);
            }
            let c = input[*offset];
            *offset += 1;
            pos = match pos {
                CommentPos::Open => {
                    if c == b'/' {
                        CommentPos::Line
                    } else if c == b'*' {
                        CommentPos::Block
                    } else {
                        return Err(LexError::InvalidChar);
                    }
                }
                CommentPos::Line => {
                    if c == b'\n' {
                        return Ok(true);
                    }
                    CommentPos::Line
                }
                CommentPos::Block => {
                    if c == b'*' {
                        CommentPos::BlockStar
                    } else {
                        CommentPos::Block
                    }
                }
                CommentPos::BlockStar => {
                    if c == b'/' {
                        return Ok(true);
                    }
                    // could be the star of `**/`; look at it again
                    *offset -= 1;
                    CommentPos::Block
                }
            };
        }
    }
}
