//! The forward push parser.
//!
//! A pushdown automaton over the forward lexer's tokens. The caller feeds
//! byte chunks; the parser reports structure to a [`Handler`] as soon as
//! each token completes and returns as soon as the chunk is exhausted,
//! holding whatever state it needs to continue seamlessly with the next
//! chunk.

use crate::config::ParseConfig;
use crate::decode;
use crate::error::{ParseError, render_error};
use crate::events::{Handler, Status};
use crate::lexer::{Lexed, Lexer};
use crate::num;
use crate::state::{ParseState, StateStack};
use crate::token::Token;

/// A forward streaming parse in progress.
///
/// # Example
///
/// ```
/// use janus_json_core::{Handler, ParseConfig, Parser};
///
/// #[derive(Default)]
/// struct Counter {
///     strings: usize,
/// }
///
/// impl Handler for Counter {
///     fn string(&mut self, _bytes: &[u8]) -> bool {
///         self.strings += 1;
///         true
///     }
/// }
///
/// let mut parser = Parser::new(ParseConfig::default());
/// let mut counter = Counter::default();
/// assert!(parser.parse(&mut counter, br#"["a", "#).is_ok());
/// assert!(parser.parse(&mut counter, br#""b"]"#).is_ok());
/// assert!(parser.finish(&mut counter).is_ok());
/// assert_eq!(counter.strings, 2);
/// ```
#[derive(Debug)]
pub struct Parser {
    lexer: Lexer,
    stack: StateStack,
    decode_buf: Vec<u8>,
    config: ParseConfig,
    parse_error: Option<ParseError>,
    /// Cumulative bytes consumed from the logical stream.
    consumed: usize,
    /// Offset into the most recent chunk when `parse` last returned; used
    /// to anchor error rendering.
    chunk_offset: usize,
}

impl Parser {
    pub fn new(config: ParseConfig) -> Self {
        Self {
            lexer: Lexer::new(config.allow_comments, config.validate_utf8),
            stack: StateStack::new(),
            decode_buf: Vec::new(),
            config,
            parse_error: None,
            consumed: 0,
            chunk_offset: 0,
        }
    }

    /// Total bytes of the logical stream consumed so far. Non-decreasing;
    /// inside a callback it reflects the byte count through the token
    /// that triggered the callback.
    #[inline]
    pub fn bytes_consumed(&self) -> usize {
        self.consumed
    }

    /// The recorded parse-level error, if the handle is in that state.
    #[inline]
    pub fn parse_error(&self) -> Option<ParseError> {
        self.parse_error
    }

    /// The recorded lexical error, if the handle is in that state.
    #[inline]
    pub fn lex_error(&self) -> Option<crate::LexError> {
        self.lexer.last_error()
    }

    /// Return the handle to its initial state, keeping buffer capacity.
    pub fn reset(&mut self) {
        self.lexer.reset();
        self.stack.reset();
        self.decode_buf.clear();
        self.parse_error = None;
        self.consumed = 0;
        self.chunk_offset = 0;
    }

    /// Feed the next chunk of the document.
    pub fn parse<H: Handler>(&mut self, handler: &mut H, input: &[u8]) -> Status {
        let base = self.consumed;
        let mut offset = 0usize;
        let mut cont = true;

        loop {
            if !cont {
                if !self.config.resume_after_cancel {
                    self.stack.set(ParseState::ParseError);
                    self.parse_error = Some(ParseError::ClientCancelled);
                }
                self.consumed = base + offset;
                self.chunk_offset = offset;
                return Status::ClientCanceled;
            }
            match self.stack.current() {
                ParseState::ParseComplete => {
                    if self.config.allow_multiple_values {
                        self.stack.set(ParseState::GotValue);
                        continue;
                    }
                    if !self.config.allow_trailing_garbage && offset != input.len() {
                        match self.lexer.lex(input, &mut offset) {
                            Ok(Lexed::NeedMore) => {}
                            _ => {
                                self.stack.set(ParseState::ParseError);
                                self.parse_error = Some(ParseError::TrailingGarbage);
                            }
                        }
                        continue;
                    }
                    self.consumed = base + offset;
                    self.chunk_offset = offset;
                    return Status::Ok;
                }
                ParseState::ParseError | ParseState::LexicalError => {
                    self.consumed = base + offset;
                    self.chunk_offset = offset;
                    return Status::Error;
                }
                ParseState::Start
                | ParseState::GotValue
                | ParseState::MapNeedVal
                | ParseState::ArrayNeedVal
                | ParseState::ArrayStart => {
                    // A state to push for a container opener; pushed after
                    // the current frame's got-a-value transition so that
                    // frame already reflects the finished value when the
                    // container closes.
                    let mut push = None;
                    match self.lexer.lex(input, &mut offset) {
                        Ok(Lexed::NeedMore) => {
                            self.consumed = base + offset;
                            self.chunk_offset = offset;
                            return Status::Ok;
                        }
                        Err(_) => {
                            self.stack.set(ParseState::LexicalError);
                            continue;
                        }
                        Ok(Lexed::Token { tok, raw }) => match tok {
                            Token::Str => {
                                self.consumed = base + offset;
                                cont = handler.string(raw);
                            }
                            Token::StrWithEscapes => {
                                self.decode_buf.clear();
                                decode::unescape_into(&mut self.decode_buf, raw);
                                self.consumed = base + offset;
                                cont = handler.string(&self.decode_buf);
                            }
                            Token::True => {
                                self.consumed = base + offset;
                                cont = handler.boolean(true);
                            }
                            Token::False => {
                                self.consumed = base + offset;
                                cont = handler.boolean(false);
                            }
                            Token::Null => {
                                self.consumed = base + offset;
                                cont = handler.null();
                            }
                            Token::Integer => {
                                if handler.wants_raw_numbers() {
                                    self.consumed = base + offset;
                                    cont = handler.raw_number(raw);
                                } else {
                                    match num::parse_integer(raw) {
                                        Ok(value) => {
                                            self.consumed = base + offset;
                                            cont = handler.integer(value);
                                        }
                                        Err(e) => {
                                            self.stack.set(ParseState::ParseError);
                                            self.parse_error = Some(e);
                                            continue;
                                        }
                                    }
                                }
                            }
                            Token::Double => {
                                if handler.wants_raw_numbers() {
                                    self.consumed = base + offset;
                                    cont = handler.raw_number(raw);
                                } else {
                                    match num::parse_double(raw) {
                                        Ok(value) => {
                                            self.consumed = base + offset;
                                            cont = handler.double(value);
                                        }
                                        Err(e) => {
                                            self.stack.set(ParseState::ParseError);
                                            self.parse_error = Some(e);
                                            continue;
                                        }
                                    }
                                }
                            }
                            Token::LBrace => {
                                self.consumed = base + offset;
                                cont = handler.start_map();
                                push = Some(ParseState::MapStart);
                            }
                            Token::LBracket => {
                                self.consumed = base + offset;
                                cont = handler.start_array();
                                push = Some(ParseState::ArrayStart);
                            }
                            Token::RBracket => {
                                if self.stack.current() == ParseState::ArrayStart {
                                    self.consumed = base + offset;
                                    cont = handler.end_array();
                                    self.stack.pop();
                                    continue;
                                }
                                self.stack.set(ParseState::ParseError);
                                self.parse_error = Some(ParseError::UnallowedToken);
                                continue;
                            }
                            Token::RBrace | Token::Comma | Token::Colon => {
                                self.stack.set(ParseState::ParseError);
                                self.parse_error = Some(ParseError::UnallowedToken);
                                continue;
                            }
                        },
                    }
                    // got a value; the transition depends on this frame
                    match self.stack.current() {
                        ParseState::Start | ParseState::GotValue => {
                            self.stack.set(ParseState::ParseComplete)
                        }
                        ParseState::MapNeedVal => self.stack.set(ParseState::MapGotVal),
                        _ => self.stack.set(ParseState::ArrayGotVal),
                    }
                    if let Some(state) = push {
                        self.stack.push(state);
                    }
                }
                ParseState::MapStart | ParseState::MapNeedKey => {
                    // the only difference between the two: in MapStart a
                    // closing brace is still valid
                    match self.lexer.lex(input, &mut offset) {
                        Ok(Lexed::NeedMore) => {
                            self.consumed = base + offset;
                            self.chunk_offset = offset;
                            return Status::Ok;
                        }
                        Err(_) => {
                            self.stack.set(ParseState::LexicalError);
                        }
                        Ok(Lexed::Token { tok, raw }) => match tok {
                            Token::Str => {
                                self.consumed = base + offset;
                                cont = handler.map_key(raw);
                                self.stack.set(ParseState::MapSep);
                            }
                            Token::StrWithEscapes => {
                                self.decode_buf.clear();
                                decode::unescape_into(&mut self.decode_buf, raw);
                                self.consumed = base + offset;
                                cont = handler.map_key(&self.decode_buf);
                                self.stack.set(ParseState::MapSep);
                            }
                            Token::RBrace if self.stack.current() == ParseState::MapStart => {
                                self.consumed = base + offset;
                                cont = handler.end_map();
                                self.stack.pop();
                            }
                            _ => {
                                self.stack.set(ParseState::ParseError);
                                self.parse_error = Some(ParseError::KeyMustBeString);
                            }
                        },
                    }
                }
                ParseState::MapSep => match self.lexer.lex(input, &mut offset) {
                    Ok(Lexed::NeedMore) => {
                        self.consumed = base + offset;
                        self.chunk_offset = offset;
                        return Status::Ok;
                    }
                    Err(_) => {
                        self.stack.set(ParseState::LexicalError);
                    }
                    Ok(Lexed::Token { tok: Token::Colon, .. }) => {
                        self.stack.set(ParseState::MapNeedVal);
                    }
                    Ok(Lexed::Token { .. }) => {
                        self.stack.set(ParseState::ParseError);
                        self.parse_error = Some(ParseError::MissingColon);
                    }
                },
                ParseState::MapGotVal => match self.lexer.lex(input, &mut offset) {
                    Ok(Lexed::NeedMore) => {
                        self.consumed = base + offset;
                        self.chunk_offset = offset;
                        return Status::Ok;
                    }
                    Err(_) => {
                        self.stack.set(ParseState::LexicalError);
                    }
                    Ok(Lexed::Token { tok: Token::Comma, .. }) => {
                        self.stack.set(ParseState::MapNeedKey);
                    }
                    Ok(Lexed::Token { tok: Token::RBrace, .. }) => {
                        self.consumed = base + offset;
                        cont = handler.end_map();
                        self.stack.pop();
                    }
                    Ok(Lexed::Token { .. }) => {
                        self.stack.set(ParseState::ParseError);
                        self.parse_error = Some(ParseError::AfterMapPair);
                    }
                },
                ParseState::ArrayGotVal => match self.lexer.lex(input, &mut offset) {
                    Ok(Lexed::NeedMore) => {
                        self.consumed = base + offset;
                        self.chunk_offset = offset;
                        return Status::Ok;
                    }
                    Err(_) => {
                        self.stack.set(ParseState::LexicalError);
                    }
                    Ok(Lexed::Token { tok: Token::Comma, .. }) => {
                        self.stack.set(ParseState::ArrayNeedVal);
                    }
                    Ok(Lexed::Token { tok: Token::RBracket, .. }) => {
                        self.consumed = base + offset;
                        cont = handler.end_array();
                        self.stack.pop();
                    }
                    Ok(Lexed::Token { .. }) => {
                        self.stack.set(ParseState::ParseError);
                        self.parse_error = Some(ParseError::AfterArrayElement);
                    }
                },
            }
        }
    }

    /// Signal end of input.
    ///
    /// Internally parses a single space (enough to terminate a pending
    /// number token) and then judges the final state. The space does not
    /// count toward [`bytes_consumed`](Parser::bytes_consumed).
    pub fn finish<H: Handler>(&mut self, handler: &mut H) -> Status {
        let before = self.consumed;
        let status = self.parse(handler, b" ");
        self.consumed = before;
        if !status.is_ok() {
            return status;
        }
        match self.stack.current() {
            ParseState::ParseError | ParseState::LexicalError => Status::Error,
            ParseState::GotValue | ParseState::ParseComplete => Status::Ok,
            _ => {
                if !self.config.allow_partial_values {
                    self.stack.set(ParseState::ParseError);
                    self.parse_error = Some(ParseError::PrematureEof);
                    return Status::Error;
                }
                Status::Ok
            }
        }
    }

    /// Render the recorded error against `text`, the chunk most recently
    /// fed. `None` when the handle is not in an error state.
    ///
    /// With `verbose`, the report includes a context window around the
    /// offending byte and an arrow pointing at it.
    pub fn error_string(&self, text: &[u8], verbose: bool) -> Option<String> {
        match self.stack.current() {
            ParseState::ParseError => {
                let message = self.parse_error.map(|e| e.to_string());
                Some(render_error(
                    "parse",
                    message.as_deref(),
                    text,
                    self.chunk_offset,
                    verbose,
                ))
            }
            ParseState::LexicalError => {
                let message = self.lexer.last_error().map(|e| e.to_string());
                Some(render_error(
                    "lexical",
                    message.as_deref(),
                    text,
                    self.chunk_offset,
                    verbose,
                ))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LexError;

    #[derive(Debug, PartialEq)]
    enum Ev {
        Null,
        Bool(bool),
        Int(i64),
        Dbl(f64),
        Str(Vec<u8>),
        RawNum(Vec<u8>),
        StartMap,
        Key(Vec<u8>),
        EndMap,
        StartArr,
        EndArr,
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<Ev>,
        raw_numbers: bool,
        cancel_after: Option<usize>,
    }

    impl Recorder {
        fn tick(&mut self) -> bool {
            match &mut self.cancel_after {
                Some(0) => false,
                Some(n) => {
                    *n -= 1;
                    true
                }
                None => true,
            }
        }
    }

    impl Handler for Recorder {
        fn null(&mut self) -> bool {
            self.events.push(Ev::Null);
            self.tick()
        }
        fn boolean(&mut self, value: bool) -> bool {
            self.events.push(Ev::Bool(value));
            self.tick()
        }
        fn integer(&mut self, value: i64) -> bool {
            self.events.push(Ev::Int(value));
            self.tick()
        }
        fn double(&mut self, value: f64) -> bool {
            self.events.push(Ev::Dbl(value));
            self.tick()
        }
        fn wants_raw_numbers(&self) -> bool {
            self.raw_numbers
        }
        fn raw_number(&mut self, text: &[u8]) -> bool {
            self.events.push(Ev::RawNum(text.to_vec()));
            self.tick()
        }
        fn string(&mut self, bytes: &[u8]) -> bool {
            self.events.push(Ev::Str(bytes.to_vec()));
            self.tick()
        }
        fn start_map(&mut self) -> bool {
            self.events.push(Ev::StartMap);
            self.tick()
        }
        fn map_key(&mut self, key: &[u8]) -> bool {
            self.events.push(Ev::Key(key.to_vec()));
            self.tick()
        }
        fn end_map(&mut self) -> bool {
            self.events.push(Ev::EndMap);
            self.tick()
        }
        fn start_array(&mut self) -> bool {
            self.events.push(Ev::StartArr);
            self.tick()
        }
        fn end_array(&mut self) -> bool {
            self.events.push(Ev::EndArr);
            self.tick()
        }
    }

    fn parse_all(config: ParseConfig, input: &[u8]) -> (Recorder, Status) {
        let mut parser = Parser::new(config);
        let mut rec = Recorder::default();
        let status = parser.parse(&mut rec, input);
        if !status.is_ok() {
            return (rec, status);
        }
        let status = parser.finish(&mut rec);
        (rec, status)
    }

    #[test]
    fn test_array_of_scalars() {
        let (rec, status) = parse_all(ParseConfig::default(), br#"[1, "ab", null]"#);
        assert_eq!(status, Status::Ok);
        assert_eq!(
            rec.events,
            vec![
                Ev::StartArr,
                Ev::Int(1),
                Ev::Str(b"ab".to_vec()),
                Ev::Null,
                Ev::EndArr,
            ]
        );
    }

    #[test]
    fn test_map_split_across_chunks() {
        let mut parser = Parser::new(ParseConfig::default());
        let mut rec = Recorder::default();
        assert_eq!(parser.parse(&mut rec, br#"{"k"#), Status::Ok);
        assert_eq!(parser.parse(&mut rec, br#"":tr"#), Status::Ok);
        assert_eq!(parser.parse(&mut rec, br#"ue}"#), Status::Ok);
        assert_eq!(parser.finish(&mut rec), Status::Ok);
        assert_eq!(
            rec.events,
            vec![
                Ev::StartMap,
                Ev::Key(b"k".to_vec()),
                Ev::Bool(true),
                Ev::EndMap,
            ]
        );
    }

    #[test]
    fn test_empty_containers() {
        let (rec, status) = parse_all(ParseConfig::default(), b"[{}, []]");
        assert_eq!(status, Status::Ok);
        assert_eq!(
            rec.events,
            vec![
                Ev::StartArr,
                Ev::StartMap,
                Ev::EndMap,
                Ev::StartArr,
                Ev::EndArr,
                Ev::EndArr,
            ]
        );
    }

    #[test]
    fn test_escaped_string_decoded() {
        let (rec, status) = parse_all(ParseConfig::default(), br#""\u00e9""#);
        assert_eq!(status, Status::Ok);
        assert_eq!(rec.events, vec![Ev::Str(b"\xC3\xA9".to_vec())]);
    }

    #[test]
    fn test_leading_zeros_sets_lexical_error() {
        let mut parser = Parser::new(ParseConfig::default());
        let mut rec = Recorder::default();
        assert_eq!(parser.parse(&mut rec, b"01"), Status::Error);
        assert_eq!(parser.lex_error(), Some(LexError::LeadingZeros));
        assert_eq!(parser.bytes_consumed(), 1);
    }

    #[test]
    fn test_multiple_values() {
        let config = ParseConfig::new().with_allow_multiple_values(true);
        let (rec, status) = parse_all(config, br#"{"a":1}{"b":2}"#);
        assert_eq!(status, Status::Ok);
        assert_eq!(
            rec.events,
            vec![
                Ev::StartMap,
                Ev::Key(b"a".to_vec()),
                Ev::Int(1),
                Ev::EndMap,
                Ev::StartMap,
                Ev::Key(b"b".to_vec()),
                Ev::Int(2),
                Ev::EndMap,
            ]
        );
    }

    #[test]
    fn test_comments_flag() {
        let config = ParseConfig::new().with_allow_comments(true);
        let (rec, status) = parse_all(config, b"/*x*/ 42");
        assert_eq!(status, Status::Ok);
        assert_eq!(rec.events, vec![Ev::Int(42)]);

        let mut parser = Parser::new(ParseConfig::default());
        let mut rec = Recorder::default();
        assert_eq!(parser.parse(&mut rec, b"/*x*/ 42"), Status::Error);
        assert_eq!(parser.lex_error(), Some(LexError::UnallowedComment));
    }

    #[test]
    fn test_trailing_garbage() {
        let mut parser = Parser::new(ParseConfig::default());
        let mut rec = Recorder::default();
        assert_eq!(parser.parse(&mut rec, b"{} x"), Status::Error);
        assert_eq!(parser.parse_error(), Some(ParseError::TrailingGarbage));

        let config = ParseConfig::new().with_allow_trailing_garbage(true);
        let (_, status) = parse_all(config, b"{} x");
        assert_eq!(status, Status::Ok);
    }

    #[test]
    fn test_premature_eof() {
        let (_, status) = parse_all(ParseConfig::default(), br#"{"a":"#);
        assert_eq!(status, Status::Error);

        let config = ParseConfig::new().with_allow_partial_values(true);
        let (_, status) = parse_all(config, br#"{"a":"#);
        assert_eq!(status, Status::Ok);
    }

    #[test]
    fn test_number_at_end_resolved_by_finish() {
        let mut parser = Parser::new(ParseConfig::default());
        let mut rec = Recorder::default();
        assert_eq!(parser.parse(&mut rec, b"42"), Status::Ok);
        assert!(rec.events.is_empty());
        assert_eq!(parser.finish(&mut rec), Status::Ok);
        assert_eq!(rec.events, vec![Ev::Int(42)]);
        assert_eq!(parser.bytes_consumed(), 2);
    }

    #[test]
    fn test_integer_overflow() {
        let mut parser = Parser::new(ParseConfig::default());
        let mut rec = Recorder::default();
        assert_eq!(
            parser.parse(&mut rec, b"[9223372036854775808]"),
            Status::Error
        );
        assert_eq!(parser.parse_error(), Some(ParseError::IntegerOverflow));
    }

    #[test]
    fn test_double_overflow() {
        let mut parser = Parser::new(ParseConfig::default());
        let mut rec = Recorder::default();
        assert_eq!(parser.parse(&mut rec, b"[1e999]"), Status::Error);
        assert_eq!(parser.parse_error(), Some(ParseError::DoubleOverflow));
    }

    #[test]
    fn test_raw_numbers_suppress_parsing() {
        let mut parser = Parser::new(ParseConfig::default());
        let mut rec = Recorder {
            raw_numbers: true,
            ..Recorder::default()
        };
        // overflow never diagnosed in raw mode
        let status = parser.parse(&mut rec, b"[9223372036854775808, 1.5]");
        assert_eq!(status, Status::Ok);
        assert_eq!(parser.finish(&mut rec), Status::Ok);
        assert_eq!(
            rec.events,
            vec![
                Ev::StartArr,
                Ev::RawNum(b"9223372036854775808".to_vec()),
                Ev::RawNum(b"1.5".to_vec()),
                Ev::EndArr,
            ]
        );
    }

    #[test]
    fn test_cancel_poisons_without_resume() {
        let mut parser = Parser::new(ParseConfig::default());
        let mut rec = Recorder {
            cancel_after: Some(1),
            ..Recorder::default()
        };
        assert_eq!(parser.parse(&mut rec, b"[1, 2, 3]"), Status::ClientCanceled);
        assert_eq!(rec.events, vec![Ev::StartArr, Ev::Int(1)]);

        // handle is poisoned
        assert_eq!(parser.parse(&mut rec, b""), Status::Error);
        assert_eq!(parser.parse_error(), Some(ParseError::ClientCancelled));
    }

    #[test]
    fn test_cancel_resumes_with_flag() {
        let config = ParseConfig::new().with_resume_after_cancel(true);
        let mut parser = Parser::new(config);
        let mut rec = Recorder {
            cancel_after: Some(1),
            ..Recorder::default()
        };
        let input = b"[1, 2, 3]";
        assert_eq!(parser.parse(&mut rec, input), Status::ClientCanceled);

        // resume from the byte after the cancellation point
        rec.cancel_after = None;
        let rest = &input[parser.bytes_consumed()..];
        assert_eq!(parser.parse(&mut rec, rest), Status::Ok);
        assert_eq!(parser.finish(&mut rec), Status::Ok);
        assert_eq!(
            rec.events,
            vec![
                Ev::StartArr,
                Ev::Int(1),
                Ev::Int(2),
                Ev::Int(3),
                Ev::EndArr,
            ]
        );
    }

    #[test]
    fn test_error_string_rendering() {
        let mut parser = Parser::new(ParseConfig::default());
        let mut rec = Recorder::default();
        let input = b"[1, 2, x]";
        assert_eq!(parser.parse(&mut rec, input), Status::Error);

        let terse = parser.error_string(input, false).unwrap_or_default();
        assert_eq!(terse, "lexical error: invalid char in json text.\n");

        let verbose = parser.error_string(input, true).unwrap_or_default();
        assert!(verbose.contains("(right here) ------^"));
    }

    #[test]
    fn test_no_error_string_when_ok() {
        let parser = Parser::new(ParseConfig::default());
        assert!(parser.error_string(b"", true).is_none());
    }

    #[test]
    fn test_reset_reuses_handle() {
        let mut parser = Parser::new(ParseConfig::default());
        let mut rec = Recorder::default();
        assert_eq!(parser.parse(&mut rec, b"x"), Status::Error);

        parser.reset();
        let mut rec = Recorder::default();
        assert_eq!(parser.parse(&mut rec, b"true"), Status::Ok);
        assert_eq!(parser.finish(&mut rec), Status::Ok);
        assert_eq!(rec.events, vec![Ev::Bool(true)]);
        assert_eq!(parser.bytes_consumed(), 4);
    }

    #[test]
    fn test_deep_nesting_round_trip() {
        let mut doc = Vec::new();
        for _ in 0..64 {
            doc.extend_from_slice(b"[");
        }
        doc.extend_from_slice(b"0");
        for _ in 0..64 {
            doc.extend_from_slice(b"]");
        }
        let (rec, status) = parse_all(ParseConfig::default(), &doc);
        assert_eq!(status, Status::Ok);
        let opens = rec.events.iter().filter(|e| **e == Ev::StartArr).count();
        let closes = rec.events.iter().filter(|e| **e == Ev::EndArr).count();
        assert_eq!((opens, closes), (64, 64));
    }
}
