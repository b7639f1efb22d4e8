//! The reverse resumable lexer.
//!
//! Scans a chunk right-to-left. Chunks are fed tail-first: the first chunk
//! is the end of the document and each following chunk holds the bytes
//! just *before* the previous one. `*offset` therefore counts down from
//! `input.len()` toward zero, and a suspension happens at the left edge of
//! a chunk; the partial token's bytes are prepended to the persistent
//! buffer so the payload stays in source order.
//!
//! Recognizers are the mechanical mirrors of the forward ones. The
//! asymmetries that cannot be mirrored exactly:
//!
//! - a sign is only part of a number when its left neighbor proves it
//!   (an `e` makes it an exponent sign; anything else makes a `-` the
//!   leading minus and a `+` an error);
//! - a quote's role (delimiter vs escaped content) is decided by the
//!   parity of the backslash run to its left;
//! - escape sequences and UTF-8 are seen back-to-front mid-scan, so their
//!   validity is checked by one forward pass over the completed payload
//!   (which is contiguous by construction at that point);
//! - only `/* */` comments can be recognized right-to-left; a `//`
//!   comment's body is reached before its opener, so it cannot be.

use crate::buf::Buf;
use crate::chars::{self, INVALID_JSON_CHAR, NEEDS_FURTHER_PROCESSING, VALID_ESCAPE, VALID_HEX};
use crate::error::LexError;
use crate::lexer::Lexed;
use crate::token::Token;

/// Keyword residues after the dispatched last byte, reading leftward:
/// `true` and `false` share the final `e` and split on the next byte
/// (`u` continues at 0, `s` at 3); `null`'s final `l` continues at 7.
const REV_KEYWORD_RESIDUE: &[u8] = b"rt\0laf\0lun\0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Keyword(KwPos),
    Str(StrPos),
    Num(NumPos),
    Comment(CommentPos),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KwPos {
    /// Consumed a trailing `e`; the next byte decides `true` vs `false`.
    AfterE,
    /// Matching a residue; indexes [`REV_KEYWORD_RESIDUE`].
    At(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StrPos {
    /// Inside the body, moving left.
    Scan,
    /// Consumed a quote; counting the backslashes to its left to decide
    /// whether it was escaped. `any` records that at least one was seen.
    Backslashes { odd: bool, any: bool },
}

/// Number read points, mirroring the forward grammar
/// `'-'? int frac? exp?` read back-to-front:
/// `(digits [+-]? [eE])? (digits '.')? int_digits '-'?`.
///
/// `multi`/`zero` track, per digit run, whether the run has more than one
/// digit and whether its leftmost-so-far digit is `0`; whichever run turns
/// out to be the integer part is checked for leading zeros when it ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumPos {
    /// The rightmost digit run: exponent, fraction or integer part,
    /// whichever the bytes to the left reveal.
    RunA { multi: bool, zero: bool },
    /// Consumed a sign left of `RunA`; only an `e` neighbor keeps it.
    SignCheck { plus: bool, multi: bool, zero: bool },
    /// Consumed the `e`; at least one mantissa digit must precede it.
    PreE,
    /// The digit run left of the `e`: fraction or integer part.
    RunB { multi: bool, zero: bool },
    /// Consumed the `.`; at least one integer digit must precede it.
    IntReq,
    /// The integer-part digit run.
    IntRun { multi: bool, zero: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommentPos {
    /// Consumed the trailing `/`; a `*` must be next.
    Open,
    /// Inside `*/ ... `, looking for the opening `/*`.
    Body,
    /// Consumed a `*`; a `/` to its left opens the comment.
    BodyStar,
}

/// Resumable right-to-left tokenizer over tail-first byte chunks.
#[derive(Debug, Clone)]
pub struct ReverseLexer {
    state: State,
    result: Token,
    error: Option<LexError>,
    buf: Buf,
    allow_comments: bool,
    validate_utf8: bool,
}

impl ReverseLexer {
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

    #[inline]
    pub fn last_error(&self) -> Option<LexError> {
        self.error
    }

    pub fn reset(&mut self) {
        self.state = State::Start;
        self.error = None;
        self.buf.clear();
    }

    /// Lex the next token reading leftward from `*offset` (which starts at
    /// `input.len()` for a fresh chunk), decrementing `*offset` past
    /// everything consumed.
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
                    if *offset == 0 {
                        break 'outer Ok(None);
                    }
                    let c = input[*offset - 1];
                    *offset -= 1;
                    match c {
                        b'{' => break 'outer Ok(Some(Token::LBrace)),
                        b'}' => break 'outer Ok(Some(Token::RBrace)),
                        b'[' => break 'outer Ok(Some(Token::LBracket)),
                        b']' => break 'outer Ok(Some(Token::RBracket)),
                        b',' => break 'outer Ok(Some(Token::Comma)),
                        b':' => break 'outer Ok(Some(Token::Colon)),
                        b'\t' | b'\n' | 0x0B | 0x0C | b'\r' | b' ' => start -= 1,
                        b'e' => {
                            self.state = State::Keyword(KwPos::AfterE);
                            continue 'outer;
                        }
                        b'l' => {
                            self.result = Token::Null;
                            self.state = State::Keyword(KwPos::At(7));
                            continue 'outer;
                        }
                        b'"' => {
                            self.result = Token::Str;
                            self.state = State::Str(StrPos::Scan);
                            continue 'outer;
                        }
                        b'0'..=b'9' => {
                            self.result = Token::Integer;
                            self.state = State::Num(NumPos::RunA {
                                multi: false,
                                zero: c == b'0',
                            });
                            continue 'outer;
                        }
                        b'/' => {
                            if !self.allow_comments {
                                *offset += 1;
                                break 'outer Err(LexError::UnallowedComment);
                            }
                            self.state = State::Comment(CommentPos::Open);
                            continue 'outer;
                        }
                        _ => break 'outer Err(LexError::InvalidChar),
                    }
                },
                State::Keyword(pos) => break 'outer self.lex_keyword(input, offset, pos),
                State::Str(pos) => break 'outer self.lex_string(input, offset, pos),
                State::Num(pos) => break 'outer self.lex_number(input, offset, pos),
                State::Comment(pos) => match self.lex_comment(input, offset, pos) {
                    Err(e) => break 'outer Err(e),
                    Ok(false) => break 'outer Ok(None),
                    Ok(true) => {
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
                self.buf.prepend(&input[*offset..start]);
                Ok(Lexed::NeedMore)
            }
            Ok(Some(tok)) => {
                let raw: &[u8] = if entry_state != State::Start {
                    self.buf.prepend(&input[*offset..start]);
                    self.state = State::Start;
                    self.buf.as_slice()
                } else {
                    self.state = State::Start;
                    &input[*offset..start]
                };
                if matches!(tok, Token::Str | Token::StrWithEscapes) {
                    let body = &raw[1..raw.len() - 1];
                    if tok == Token::StrWithEscapes || self.validate_utf8 {
                        if let Err(e) = validate_string_body(body, self.validate_utf8) {
                            self.error = Some(e);
                            return Err(e);
                        }
                    }
                    return Ok(Lexed::Token { tok, raw: body });
                }
                Ok(Lexed::Token { tok, raw })
            }
            Err(e) => {
                if entry_state != State::Start {
                    self.buf.prepend(&input[*offset..start]);
                }
                self.state = State::Start;
                self.error = Some(e);
                Err(e)
            }
        }
    }

    /// Compute the next token's kind without consuming it. `offset` is a
    /// copy, so the caller's position is untouched; internal state is
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
        // a peek that suspended prepended partial bytes; drop them again
        if self.buf.len() > buf_len {
            let added = self.buf.len() - buf_len;
            let kept = self.buf.as_slice()[added..].to_vec();
            self.buf.clear();
            self.buf.append(&kept);
        }
        outcome
    }

    fn lex_keyword(
        &mut self,
        input: &[u8],
        offset: &mut usize,
        pos: KwPos,
    ) -> Result<Option<Token>, LexError> {
        let mut at = match pos {
            KwPos::AfterE => {
                if *offset == 0 {
                    self.state = State::Keyword(KwPos::AfterE);
                    return Ok(None);
                }
                let c = input[*offset - 1];
                *offset -= 1;
                match c {
                    b'u' => {
                        self.result = Token::True;
                        0
                    }
                    b's' => {
                        self.result = Token::False;
                        3
                    }
                    _ => {
                        *offset += 1;
                        return Err(LexError::InvalidString);
                    }
                }
            }
            KwPos::At(at) => at,
        };

        while REV_KEYWORD_RESIDUE[at as usize] != 0 {
            if *offset == 0 {
                self.state = State::Keyword(KwPos::At(at));
                return Ok(None);
            }
            let c = input[*offset - 1];
            *offset -= 1;
            if c != REV_KEYWORD_RESIDUE[at as usize] {
                *offset += 1;
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
                    // fast scan: stop only on quotes, backslashes and raw
                    // control bytes; UTF-8 is validated on completion
                    while *offset > 0
                        && chars::class(input[*offset - 1])
                            & (INVALID_JSON_CHAR | NEEDS_FURTHER_PROCESSING)
                            == 0
                    {
                        *offset -= 1;
                    }
                    if *offset == 0 {
                        self.state = State::Str(StrPos::Scan);
                        return Ok(None);
                    }
                    let c = input[*offset - 1];
                    *offset -= 1;
                    if c == b'"' {
                        pos = StrPos::Backslashes {
                            odd: false,
                            any: false,
                        };
                    } else if c == b'\\' {
                        // escapes the byte to its right (already consumed)
                        self.result = Token::StrWithEscapes;
                    } else {
                        // only control bytes stop the fast scan
                        return Err(LexError::StringInvalidJsonChar);
                    }
                }
                StrPos::Backslashes { mut odd, mut any } => {
                    loop {
                        if *offset == 0 {
                            self.state = State::Str(StrPos::Backslashes { odd, any });
                            return Ok(None);
                        }
                        if input[*offset - 1] != b'\\' {
                            break;
                        }
                        *offset -= 1;
                        odd = !odd;
                        any = true;
                        self.result = Token::StrWithEscapes;
                    }
                    if odd {
                        // the quote was escaped content; keep scanning
                        pos = StrPos::Scan;
                    } else if any {
                        // an even run of backslashes left of the opening
                        // quote sits outside the string
                        return Err(LexError::InvalidChar);
                    } else {
                        // bare quote: the opening delimiter
                        return Ok(Some(self.result));
                    }
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
        loop {
            if *offset == 0 {
                self.state = State::Num(pos);
                return Ok(None);
            }
            let c = input[*offset - 1];
            *offset -= 1;
            pos = match pos {
                NumPos::RunA { multi, zero } => {
                    if c.is_ascii_digit() {
                        NumPos::RunA {
                            multi: true,
                            zero: c == b'0',
                        }
                    } else if c == b'.' {
                        self.result = Token::Double;
                        NumPos::IntReq
                    } else if c == b'e' || c == b'E' {
                        self.result = Token::Double;
                        NumPos::PreE
                    } else if c == b'+' || c == b'-' {
                        NumPos::SignCheck {
                            plus: c == b'+',
                            multi,
                            zero,
                        }
                    } else {
                        *offset += 1;
                        return self.finish_int(multi, zero);
                    }
                }
                NumPos::SignCheck { plus, multi, zero } => {
                    if c == b'e' || c == b'E' {
                        self.result = Token::Double;
                        NumPos::PreE
                    } else if plus {
                        *offset += 1;
                        return Err(LexError::MissingExponentBeforePlus);
                    } else {
                        // a leading minus; the byte just read is not ours
                        *offset += 1;
                        return self.finish_int(multi, zero);
                    }
                }
                NumPos::PreE => {
                    if c.is_ascii_digit() {
                        NumPos::RunB {
                            multi: false,
                            zero: c == b'0',
                        }
                    } else {
                        *offset += 1;
                        return Err(LexError::MissingIntegerBeforeExponent);
                    }
                }
                NumPos::RunB { multi, zero } => {
                    if c.is_ascii_digit() {
                        NumPos::RunB {
                            multi: true,
                            zero: c == b'0',
                        }
                    } else if c == b'.' {
                        NumPos::IntReq
                    } else if c == b'-' {
                        return self.finish_int(multi, zero);
                    } else {
                        *offset += 1;
                        return self.finish_int(multi, zero);
                    }
                }
                NumPos::IntReq => {
                    if c.is_ascii_digit() {
                        NumPos::IntRun {
                            multi: false,
                            zero: c == b'0',
                        }
                    } else {
                        *offset += 1;
                        return Err(LexError::MissingIntegerBeforeDecimal);
                    }
                }
                NumPos::IntRun { multi, zero } => {
                    if c.is_ascii_digit() {
                        NumPos::IntRun {
                            multi: true,
                            zero: c == b'0',
                        }
                    } else if c == b'-' {
                        return self.finish_int(multi, zero);
                    } else {
                        *offset += 1;
                        return self.finish_int(multi, zero);
                    }
                }
            };
        }
    }

    /// End of the integer-part digit run: apply the leading-zero rule.
    fn finish_int(&self, multi: bool, zero: bool) -> Result<Option<Token>, LexError> {
        if multi && zero {
            Err(LexError::LeadingZeros)
        } else {
            Ok(Some(self.result))
        }
    }

    fn lex_comment(
        &mut self,
        input: &[u8],
        offset: &mut usize,
        mut pos: CommentPos,
    ) -> Result<bool, LexError> {
        loop {
            if *offset == 0 {
                self.state = State::Comment(pos);
                return Ok(false);
            }
            let c = input[*offset - 1];
            *offset -= 1;
            pos = match pos {
                CommentPos::Open => {
                    if c == b'*' {
                        CommentPos::Body
                    } else {
                        return Err(LexError::InvalidChar);
                    }
                }
                CommentPos::Body => {
                    if c == b'*' {
                        CommentPos::BodyStar
                    } else {
                        CommentPos::Body
                    }
                }
                CommentPos::BodyStar => {
                    if c == b'/' {
                        return Ok(true);
                    }
                    *offset += 1;
                    CommentPos::Body
                }
            };
        }
    }
}

/// One forward pass over a completed string body: escape characters, hex
/// digits after `\u`, and (optionally) UTF-8 structure.
fn validate_string_body(body: &[u8], validate_utf8: bool) -> Result<(), LexError> {
    let mut i = 0;
    while i < body.len() {
        let c = body[i];
        if c == b'\\' {
            let Some(&esc) = body.get(i + 1) else {
                return Err(LexError::StringInvalidEscapedChar);
            };
            if esc == b'u' {
                for k in 0..4 {
                    match body.get(i + 2 + k) {
                        Some(&h) if chars::class(h) & VALID_HEX != 0 => {}
                        _ => return Err(LexError::StringInvalidHexChar),
                    }
                }
                i += 6;
            } else if chars::class(esc) & VALID_ESCAPE != 0 {
                i += 2;
            } else {
                return Err(LexError::StringInvalidEscapedChar);
            }
        } else if validate_utf8 && c >= 0x80 {
            let left = match c {
                0xC0..=0xDF => 1,
                0xE0..=0xEF => 2,
                0xF0..=0xF7 => 3,
                _ => return Err(LexError::StringInvalidUtf8),
            };
            for k in 0..left {
                match body.get(i + 1 + k) {
                    Some(&b) if b >> 6 == 0b10 => {}
                    _ => return Err(LexError::StringInvalidUtf8),
                }
            }
            i += 1 + left;
        } else {
            i += 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(lexer: &mut ReverseLexer, input: &[u8]) -> Vec<(Token, Vec<u8>)> {
        let mut offset = input.len();
        let mut tokens = Vec::new();
        loop {
            match lexer.lex(input, &mut offset) {
                Ok(Lexed::Token { tok, raw }) => tokens.push((tok, raw.to_vec())),
                Ok(Lexed::NeedMore) => break,
                Err(e) => panic!("unexpected lex error: {e}"),
            }
        }
        tokens
    }

    #[test]
    fn test_tokens_arrive_tail_first() {
        let mut lexer = ReverseLexer::new(false, true);
        let tokens = lex_all(&mut lexer, b" [1] ");
        assert_eq!(
            tokens,
            vec![
                (Token::RBracket, b"]".to_vec()),
                (Token::Integer, b"1".to_vec()),
                (Token::LBracket, b"[".to_vec()),
            ]
        );
    }

    #[test]
    fn test_keywords_backward() {
        let mut lexer = ReverseLexer::new(false, true);
        let tokens = lex_all(&mut lexer, b" true false null ");
        let kinds: Vec<Token> = tokens.iter().map(|(t, _)| *t).collect();
        assert_eq!(kinds, vec![Token::Null, Token::False, Token::True]);
    }

    #[test]
    fn test_keyword_split_across_chunks() {
        let mut lexer = ReverseLexer::new(false, true);

        let mut offset = 3;
        assert_eq!(lexer.lex(b"lse", &mut offset), Ok(Lexed::NeedMore));

        // earlier bytes arrive in the next chunk
        let mut offset = 3;
        let lexed = lexer.lex(b" fa", &mut offset);
        assert_eq!(
            lexed,
            Ok(Lexed::Token {
                tok: Token::False,
                raw: b"false"
            })
        );
    }

    #[test]
    fn test_string_backward() {
        let mut lexer = ReverseLexer::new(false, true);
        let tokens = lex_all(&mut lexer, br#" "hello" "#);
        assert_eq!(tokens, vec![(Token::Str, b"hello".to_vec())]);
    }

    #[test]
    fn test_escaped_quote_is_content() {
        let mut lexer = ReverseLexer::new(false, true);
        let tokens = lex_all(&mut lexer, br#" "a\"b" "#);
        assert_eq!(
            tokens,
            vec![(Token::StrWithEscapes, br#"a\"b"#.to_vec())]
        );
    }

    #[test]
    fn test_escaped_backslash_then_quote_ends() {
        // source string "a\\": the final quote is a real delimiter
        let mut lexer = ReverseLexer::new(false, true);
        let tokens = lex_all(&mut lexer, br#" "a\\" "#);
        assert_eq!(
            tokens,
            vec![(Token::StrWithEscapes, br#"a\\"#.to_vec())]
        );
    }

    #[test]
    fn test_numbers_backward() {
        let mut lexer = ReverseLexer::new(false, true);
        let tokens = lex_all(&mut lexer, b" -17 3.5 2e-4 ");
        assert_eq!(
            tokens,
            vec![
                (Token::Double, b"2e-4".to_vec()),
                (Token::Double, b"3.5".to_vec()),
                (Token::Integer, b"-17".to_vec()),
            ]
        );
    }

    #[test]
    fn test_number_split_across_chunks() {
        let mut lexer = ReverseLexer::new(false, true);

        let mut offset = 2;
        assert_eq!(lexer.lex(b"25", &mut offset), Ok(Lexed::NeedMore));

        let mut offset = 4;
        let lexed = lexer.lex(b" 1.0", &mut offset);
        assert_eq!(
            lexed,
            Ok(Lexed::Token {
                tok: Token::Double,
                raw: b"1.025"
            })
        );
    }

    #[test]
    fn test_leading_zeros_backward() {
        let mut lexer = ReverseLexer::new(false, true);
        let mut offset = 4;
        assert_eq!(lexer.lex(b" 01 ", &mut offset), Err(LexError::LeadingZeros));
    }

    #[test]
    fn test_reverse_number_errors() {
        for (input, expect) in [
            (&b" e5 "[..], LexError::MissingIntegerBeforeExponent),
            (b" .5 ", LexError::MissingIntegerBeforeDecimal),
            (b" +5 ", LexError::MissingExponentBeforePlus),
        ] {
            let mut lexer = ReverseLexer::new(false, true);
            let mut offset = input.len();
            assert_eq!(lexer.lex(input, &mut offset), Err(expect), "input {input:?}");
        }
    }

    #[test]
    fn test_block_comment_backward() {
        let mut lexer = ReverseLexer::new(true, true);
        let tokens = lex_all(&mut lexer, b" 1 /* note */ ");
        assert_eq!(tokens, vec![(Token::Integer, b"1".to_vec())]);
    }

    #[test]
    fn test_comment_rejected_by_default() {
        let mut lexer = ReverseLexer::new(false, true);
        let mut offset = 8;
        assert_eq!(
            lexer.lex(b"/* x */ ", &mut offset),
            Err(LexError::UnallowedComment)
        );
    }

    #[test]
    fn test_utf8_validated_on_completion() {
        let mut lexer = ReverseLexer::new(false, true);
        let mut offset = 5;
        assert_eq!(
            lexer.lex(b" \"\xC3\x28\"", &mut offset),
            Err(LexError::StringInvalidUtf8)
        );

        let mut lexer = ReverseLexer::new(false, false);
        let mut offset = 5;
        assert_eq!(
            lexer.lex(b" \"\xC3\x28\"", &mut offset),
            Ok(Lexed::Token {
                tok: Token::Str,
                raw: b"\xC3\x28"
            })
        );
    }

    #[test]
    fn test_bad_escape_caught_on_completion() {
        let mut lexer = ReverseLexer::new(false, true);
        let mut offset = 7;
        assert_eq!(
            lexer.lex(br#" "a\x1""#, &mut offset),
            Err(LexError::StringInvalidEscapedChar)
        );
    }

    #[test]
    fn test_peek_is_non_destructive() {
        let mut lexer = ReverseLexer::new(false, true);
        let input = b" [1] ";
        assert_eq!(lexer.peek(input, input.len()), Ok(Some(Token::RBracket)));

        let mut offset = input.len();
        assert_eq!(
            lexer.lex(input, &mut offset),
            Ok(Lexed::Token {
                tok: Token::RBracket,
                raw: b"]"
            })
        );
    }
}
