//! The reverse push parser.
//!
//! Consumes a document laid out tail-first: the first chunk fed is the
//! *end* of the JSON text, each later chunk the bytes just before it, and
//! every chunk is read right-to-left. The event stream is the structural
//! mirror of the forward parser's: `end_map`/`end_array` arrive first,
//! and inside an object each value arrives before its key.
//!
//! State codes are shared with the forward variant; only the walk order
//! differs. Closing braces open frames here (push), opening braces close
//! them (pop), and the map cycle runs value → `:` → key → `,`.

use crate::config::ParseConfig;
use crate::decode;
use crate::error::{ParseError, render_error};
use crate::events::{Handler, Status};
use crate::lexer::Lexed;
use crate::num;
use crate::rev_lexer::ReverseLexer;
use crate::state::{ParseState, StateStack};
use crate::token::Token;

/// A reverse streaming parse in progress.
///
/// # Example
///
/// ```
/// use janus_json_core::{Handler, ParseConfig, ReverseParser};
///
/// #[derive(Default)]
/// struct Keys {
///     keys: Vec<Vec<u8>>,
/// }
///
/// impl Handler for Keys {
///     fn map_key(&mut self, key: &[u8]) -> bool {
///         self.keys.push(key.to_vec());
///         true
///     }
/// }
///
/// let mut parser = ReverseParser::new(ParseConfig::default());
/// let mut keys = Keys::default();
/// // the document is `{"a":1}`, fed back-to-front
/// assert!(parser.parse(&mut keys, br#":1}"#).is_ok());
/// assert!(parser.parse(&mut keys, br#"{"a""#).is_ok());
/// assert!(parser.finish(&mut keys).is_ok());
/// assert_eq!(keys.keys, vec![b"a".to_vec()]);
/// ```
#[derive(Debug)]
pub struct ReverseParser {
    lexer: ReverseLexer,
    stack: StateStack,
    decode_buf: Vec<u8>,
    config: ParseConfig,
    parse_error: Option<ParseError>,
    /// Cumulative bytes consumed from the stream tail.
    consumed: usize,
    /// Offset into the most recent chunk when `parse` last returned
    /// (an index: everything to its right was consumed).
    chunk_offset: usize,
    /// Span of the last emitted token, measured in bytes from the stream
    /// tail: `.0` is the distance to the token's far edge, `.1` adds the
    /// payload length.
    token_span: (usize, usize),
}

impl ReverseParser {
    pub fn new(config: ParseConfig) -> Self {
        Self {
            lexer: ReverseLexer::new(config.allow_comments, config.validate_utf8),
            stack: StateStack::new(),
            decode_buf: Vec::new(),
            config,
            parse_error: None,
            consumed: 0,
            chunk_offset: 0,
            token_span: (0, 0),
        }
    }

    /// Total bytes consumed from the stream tail so far.
    #[inline]
    pub fn bytes_consumed(&self) -> usize {
        self.consumed
    }

    /// Source span of the last token that reached a callback, measured
    /// from the stream tail.
    #[inline]
    pub fn last_token_span(&self) -> (usize, usize) {
        self.token_span
    }

    #[inline]
    pub fn parse_error(&self) -> Option<ParseError> {
        self.parse_error
    }

    #[inline]
    pub fn lex_error(&self) -> Option<crate::LexError> {
        self.lexer.last_error()
    }

    pub fn reset(&mut self) {
        self.lexer.reset();
        self.stack.reset();
        self.decode_buf.clear();
        self.parse_error = None;
        self.consumed = 0;
        self.chunk_offset = 0;
        self.token_span = (0, 0);
    }

    /// Feed the next-earlier chunk of the document.
    pub fn parse<H: Handler>(&mut self, handler: &mut H, input: &[u8]) -> Status {
        let base = self.consumed;
        let mut offset = input.len();
        let mut cont = true;

        macro_rules! consumed {
            () => {
                base + (input.len() - offset)
            };
        }

        loop {
            if !cont {
                if !self.config.resume_after_cancel {
                    self.stack.set(ParseState::ParseError);
                    self.parse_error = Some(ParseError::ClientCancelled);
                }
                self.consumed = consumed!();
                self.chunk_offset = offset;
                return Status::ClientCanceled;
            }
            match self.stack.current() {
                ParseState::ParseComplete => {
                    if self.config.allow_multiple_values {
                        self.stack.set(ParseState::GotValue);
                        continue;
                    }
                    if !self.config.allow_trailing_garbage && offset != 0 {
                        match self.lexer.lex(input, &mut offset) {
                            Ok(Lexed::NeedMore) => {}
                            _ => {
                                self.stack.set(ParseState::ParseError);
                                self.parse_error = Some(ParseError::TrailingGarbage);
                            }
                        }
                        continue;
                    }
                    self.consumed = consumed!();
                    self.chunk_offset = offset;
                    return Status::Ok;
                }
                ParseState::ParseError | ParseState::LexicalError => {
                    self.consumed = consumed!();
                    self.chunk_offset = offset;
                    return Status::Error;
                }
                // in the reverse walk a map's value arrives while the
                // frame still reads MapStart, so MapStart admits values
                ParseState::Start
                | ParseState::GotValue
                | ParseState::MapNeedVal
                | ParseState::MapStart
                | ParseState::ArrayNeedVal
                | ParseState::ArrayStart => {
                    let mut push = None;
                    match self.lexer.lex(input, &mut offset) {
                        Ok(Lexed::NeedMore) => {
                            self.consumed = consumed!();
                            self.chunk_offset = offset;
                            return Status::Ok;
                        }
                        Err(_) => {
                            self.stack.set(ParseState::LexicalError);
                            continue;
                        }
                        Ok(Lexed::Token { tok, raw }) => match tok {
                            Token::Str => {
                                self.consumed = consumed!();
                                self.token_span = (self.consumed, self.consumed + raw.len());
                                cont = handler.string(raw);
                            }
                            Token::StrWithEscapes => {
                                self.decode_buf.clear();
                                decode::unescape_into(&mut self.decode_buf, raw);
                                self.consumed = consumed!();
                                self.token_span = (self.consumed, self.consumed + raw.len());
                                cont = handler.string(&self.decode_buf);
                            }
                            Token::True => {
                                self.consumed = consumed!();
                                self.token_span = (self.consumed, self.consumed + raw.len());
                                cont = handler.boolean(true);
                            }
                            Token::False => {
                                self.consumed = consumed!();
                                self.token_span = (self.consumed, self.consumed + raw.len());
                                cont = handler.boolean(false);
                            }
                            Token::Null => {
                                self.consumed = consumed!();
                                self.token_span = (self.consumed, self.consumed + raw.len());
                                cont = handler.null();
                            }
                            Token::Integer => {
                                if handler.wants_raw_numbers() {
                                    self.consumed = consumed!();
                                    self.token_span = (self.consumed, self.consumed + raw.len());
                                    cont = handler.raw_number(raw);
                                } else {
                                    match num::parse_integer(raw) {
                                        Ok(value) => {
                                            self.consumed = consumed!();
                                            self.token_span =
                                                (self.consumed, self.consumed + raw.len());
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
                                    self.consumed = consumed!();
                                    self.token_span = (self.consumed, self.consumed + raw.len());
                                    cont = handler.raw_number(raw);
                                } else {
                                    match num::parse_double(raw) {
                                        Ok(value) => {
                                            self.consumed = consumed!();
                                            self.token_span =
                                                (self.consumed, self.consumed + raw.len());
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
                            Token::RBrace => {
                                self.consumed = consumed!();
                                self.token_span = (self.consumed, self.consumed + raw.len());
                                cont = handler.end_map();
                                push = Some(ParseState::MapStart);
                            }
                            Token::RBracket => {
                                self.consumed = consumed!();
                                self.token_span = (self.consumed, self.consumed + raw.len());
                                cont = handler.end_array();
                                push = Some(ParseState::ArrayStart);
                            }
                            Token::LBracket => {
                                if self.stack.current() == ParseState::ArrayStart {
                                    self.consumed = consumed!();
                                    self.token_span = (self.consumed, self.consumed + raw.len());
                                    cont = handler.start_array();
                                    self.stack.pop();
                                    continue;
                                }
                                self.stack.set(ParseState::ParseError);
                                self.parse_error = Some(ParseError::UnallowedToken);
                                continue;
                            }
                            Token::LBrace => {
                                if self.stack.current() == ParseState::MapStart {
                                    self.consumed = consumed!();
                                    self.token_span = (self.consumed, self.consumed + raw.len());
                                    cont = handler.start_map();
                                    self.stack.pop();
                                    continue;
                                }
                                self.stack.set(ParseState::ParseError);
                                self.parse_error = Some(ParseError::UnallowedToken);
                                continue;
                            }
                            Token::Comma | Token::Colon => {
                                self.stack.set(ParseState::ParseError);
                                self.parse_error = Some(ParseError::UnallowedToken);
                                continue;
                            }
                        },
                    }
                    // got a value; in the reverse walk MapStart means the
                    // value side of a pair, so it advances to the separator
                    match self.stack.current() {
                        ParseState::Start | ParseState::GotValue => {
                            self.stack.set(ParseState::ParseComplete)
                        }
                        ParseState::MapNeedVal | ParseState::MapStart => {
                            self.stack.set(ParseState::MapSep)
                        }
                        _ => self.stack.set(ParseState::ArrayGotVal),
                    }
                    if let Some(state) = push {
                        self.stack.push(state);
                    }
                }
                ParseState::MapNeedKey => match self.lexer.lex(input, &mut offset) {
                    Ok(Lexed::NeedMore) => {
                        self.consumed = consumed!();
                        self.chunk_offset = offset;
                        return Status::Ok;
                    }
                    Err(_) => {
                        self.stack.set(ParseState::LexicalError);
                    }
                    Ok(Lexed::Token { tok: Token::Str, raw }) => {
                        self.consumed = consumed!();
                        self.token_span = (self.consumed, self.consumed + raw.len());
                        cont = handler.map_key(raw);
                        self.stack.set(ParseState::MapGotVal);
                    }
                    Ok(Lexed::Token {
                        tok: Token::StrWithEscapes,
                        raw,
                    }) => {
                        self.decode_buf.clear();
                        decode::unescape_into(&mut self.decode_buf, raw);
                        self.consumed = consumed!();
                        self.token_span = (self.consumed, self.consumed + raw.len());
                        cont = handler.map_key(&self.decode_buf);
                        self.stack.set(ParseState::MapGotVal);
                    }
                    Ok(Lexed::Token { .. }) => {
                        self.stack.set(ParseState::ParseError);
                        self.parse_error = Some(ParseError::KeyMustBeString);
                    }
                },
                ParseState::MapSep => match self.lexer.lex(input, &mut offset) {
                    Ok(Lexed::NeedMore) => {
                        self.consumed = consumed!();
                        self.chunk_offset = offset;
                        return Status::Ok;
                    }
                    Err(_) => {
                        self.stack.set(ParseState::LexicalError);
                    }
                    Ok(Lexed::Token { tok: Token::Colon, .. }) => {
                        self.stack.set(ParseState::MapNeedKey);
                    }
                    Ok(Lexed::Token { .. }) => {
                        self.stack.set(ParseState::ParseError);
                        self.parse_error = Some(ParseError::MissingColon);
                    }
                },
                // reached right after a key: `,` or the opening `{` is next
                ParseState::MapGotVal => match self.lexer.lex(input, &mut offset) {
                    Ok(Lexed::NeedMore) => {
                        self.consumed = consumed!();
                        self.chunk_offset = offset;
                        return Status::Ok;
                    }
                    Err(_) => {
                        self.stack.set(ParseState::LexicalError);
                    }
                    Ok(Lexed::Token { tok: Token::LBrace, raw }) => {
                        self.consumed = consumed!();
                        self.token_span = (self.consumed, self.consumed + raw.len());
                        cont = handler.start_map();
                        self.stack.pop();
                    }
                    Ok(Lexed::Token { tok: Token::Comma, .. }) => {
                        self.stack.set(ParseState::MapNeedVal);
                    }
                    Ok(Lexed::Token { .. }) => {
                        self.stack.set(ParseState::ParseError);
                        self.parse_error = Some(ParseError::BeforeMapPair);
                    }
                },
                ParseState::ArrayGotVal => match self.lexer.lex(input, &mut offset) {
                    Ok(Lexed::NeedMore) => {
                        self.consumed = consumed!();
                        self.chunk_offset = offset;
                        return Status::Ok;
                    }
                    Err(_) => {
                        self.stack.set(ParseState::LexicalError);
                    }
                    Ok(Lexed::Token {
                        tok: Token::LBracket,
                        raw,
                    }) => {
                        self.consumed = consumed!();
                        self.token_span = (self.consumed, self.consumed + raw.len());
                        cont = handler.start_array();
                        self.stack.pop();
                    }
                    Ok(Lexed::Token { tok: Token::Comma, .. }) => {
                        self.stack.set(ParseState::ArrayNeedVal);
                    }
                    Ok(Lexed::Token { .. }) => {
                        self.stack.set(ParseState::ParseError);
                        self.parse_error = Some(ParseError::BeforeArrayElement);
                    }
                },
            }
        }
    }

    /// Signal that the start of the document has been reached.
    ///
    /// Parses a single space (terminating a pending leftmost number) and
    /// judges the final state; the space does not count toward
    /// [`bytes_consumed`](ReverseParser::bytes_consumed).
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

    #[derive(Debug, PartialEq)]
    enum Ev {
        Null,
        Bool(bool),
        Int(i64),
        Dbl(f64),
        Str(Vec<u8>),
        StartMap,
        Key(Vec<u8>),
        EndMap,
        StartArr,
        EndArr,
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<Ev>,
    }

    impl Handler for Recorder {
        fn null(&mut self) -> bool {
            self.events.push(Ev::Null);
            true
        }
        fn boolean(&mut self, value: bool) -> bool {
            self.events.push(Ev::Bool(value));
            true
        }
        fn integer(&mut self, value: i64) -> bool {
            self.events.push(Ev::Int(value));
            true
        }
        fn double(&mut self, value: f64) -> bool {
            self.events.push(Ev::Dbl(value));
            true
        }
        fn string(&mut self, bytes: &[u8]) -> bool {
            self.events.push(Ev::Str(bytes.to_vec()));
            true
        }
        fn start_map(&mut self) -> bool {
            self.events.push(Ev::StartMap);
            true
        }
        fn map_key(&mut self, key: &[u8]) -> bool {
            self.events.push(Ev::Key(key.to_vec()));
            true
        }
        fn end_map(&mut self) -> bool {
            self.events.push(Ev::EndMap);
            true
        }
        fn start_array(&mut self) -> bool {
            self.events.push(Ev::StartArr);
            true
        }
        fn end_array(&mut self) -> bool {
            self.events.push(Ev::EndArr);
            true
        }
    }

    fn parse_whole(config: ParseConfig, doc: &[u8]) -> (Recorder, Status) {
        let mut parser = ReverseParser::new(config);
        let mut rec = Recorder::default();
        let status = parser.parse(&mut rec, doc);
        if !status.is_ok() {
            return (rec, status);
        }
        let status = parser.finish(&mut rec);
        (rec, status)
    }

    #[test]
    fn test_map_yields_value_then_key() {
        let (rec, status) = parse_whole(ParseConfig::default(), br#"{"k":true}"#);
        assert_eq!(status, Status::Ok);
        assert_eq!(
            rec.events,
            vec![
                Ev::EndMap,
                Ev::Bool(true),
                Ev::Key(b"k".to_vec()),
                Ev::StartMap,
            ]
        );
    }

    #[test]
    fn test_array_mirrored() {
        let (rec, status) = parse_whole(ParseConfig::default(), br#"[1, "ab", null]"#);
        assert_eq!(status, Status::Ok);
        assert_eq!(
            rec.events,
            vec![
                Ev::EndArr,
                Ev::Null,
                Ev::Str(b"ab".to_vec()),
                Ev::Int(1),
                Ev::StartArr,
            ]
        );
    }

    #[test]
    fn test_empty_containers() {
        let (rec, status) = parse_whole(ParseConfig::default(), b"[{}, []]");
        assert_eq!(status, Status::Ok);
        assert_eq!(
            rec.events,
            vec![
                Ev::EndArr,
                Ev::EndArr,
                Ev::StartArr,
                Ev::EndMap,
                Ev::StartMap,
                Ev::StartArr,
            ]
        );
    }

    #[test]
    fn test_nested_map() {
        let (rec, status) =
            parse_whole(ParseConfig::default(), br#"{"a":{"b":2},"c":3.5}"#);
        assert_eq!(status, Status::Ok);
        assert_eq!(
            rec.events,
            vec![
                Ev::EndMap,
                Ev::Dbl(3.5),
                Ev::Key(b"c".to_vec()),
                Ev::EndMap,
                Ev::Int(2),
                Ev::Key(b"b".to_vec()),
                Ev::StartMap,
                Ev::Key(b"a".to_vec()),
                Ev::StartMap,
            ]
        );
    }

    #[test]
    fn test_chunked_tail_first() {
        let mut parser = ReverseParser::new(ParseConfig::default());
        let mut rec = Recorder::default();
        // document: {"k":true}, fed back-to-front
        assert_eq!(parser.parse(&mut rec, b"ue}"), Status::Ok);
        assert_eq!(parser.parse(&mut rec, br#"":tr"#), Status::Ok);
        assert_eq!(parser.parse(&mut rec, br#"{"k"#), Status::Ok);
        assert_eq!(parser.finish(&mut rec), Status::Ok);
        assert_eq!(
            rec.events,
            vec![
                Ev::EndMap,
                Ev::Bool(true),
                Ev::Key(b"k".to_vec()),
                Ev::StartMap,
            ]
        );
    }

    #[test]
    fn test_bytes_consumed_counts_from_tail() {
        let mut parser = ReverseParser::new(ParseConfig::default());
        let mut rec = Recorder::default();
        assert_eq!(parser.parse(&mut rec, b"ue}"), Status::Ok);
        assert_eq!(parser.bytes_consumed(), 3);
        assert_eq!(parser.parse(&mut rec, br#"{"k":tr"#), Status::Ok);
        assert_eq!(parser.bytes_consumed(), 10);
    }

    #[test]
    fn test_token_span_of_last_emission() {
        let mut parser = ReverseParser::new(ParseConfig::default());
        let mut rec = Recorder::default();
        assert_eq!(parser.parse(&mut rec, br#"{"key":9}"#), Status::Ok);
        // last emitted token is the opening `{`, the whole text consumed
        assert_eq!(parser.last_token_span(), (9, 10));
    }

    #[test]
    fn test_number_at_document_start_needs_finish() {
        let mut parser = ReverseParser::new(ParseConfig::default());
        let mut rec = Recorder::default();
        assert_eq!(parser.parse(&mut rec, b"42"), Status::Ok);
        assert!(rec.events.is_empty());
        assert_eq!(parser.finish(&mut rec), Status::Ok);
        assert_eq!(rec.events, vec![Ev::Int(42)]);
    }

    #[test]
    fn test_trailing_garbage_on_the_left() {
        let mut parser = ReverseParser::new(ParseConfig::default());
        let mut rec = Recorder::default();
        assert_eq!(parser.parse(&mut rec, b"x {}"), Status::Error);
        assert_eq!(parser.parse_error(), Some(ParseError::TrailingGarbage));

        let config = ParseConfig::new().with_allow_trailing_garbage(true);
        let (_, status) = parse_whole(config, b"x {}");
        assert_eq!(status, Status::Ok);
    }

    #[test]
    fn test_multiple_values_tail_first() {
        let config = ParseConfig::new().with_allow_multiple_values(true);
        let (rec, status) = parse_whole(config, br#"{"a":1}{"b":2}"#);
        assert_eq!(status, Status::Ok);
        assert_eq!(
            rec.events,
            vec![
                Ev::EndMap,
                Ev::Int(2),
                Ev::Key(b"b".to_vec()),
                Ev::StartMap,
                Ev::EndMap,
                Ev::Int(1),
                Ev::Key(b"a".to_vec()),
                Ev::StartMap,
            ]
        );
    }

    #[test]
    fn test_premature_start_of_input() {
        let (_, status) = parse_whole(ParseConfig::default(), br#":1}"#);
        assert_eq!(status, Status::Error);

        let config = ParseConfig::new().with_allow_partial_values(true);
        let (_, status) = parse_whole(config, br#":1}"#);
        assert_eq!(status, Status::Ok);
    }

    #[test]
    fn test_missing_colon_reversed() {
        let mut parser = ReverseParser::new(ParseConfig::default());
        let mut rec = Recorder::default();
        assert_eq!(parser.parse(&mut rec, br#"{"k" true}"#), Status::Error);
        assert_eq!(parser.parse_error(), Some(ParseError::MissingColon));
    }

    #[test]
    fn test_key_must_be_string_reversed() {
        let mut parser = ReverseParser::new(ParseConfig::default());
        let mut rec = Recorder::default();
        // walking backward: value, colon, then a key that must be a string
        assert_eq!(parser.parse(&mut rec, br#"{1:2}"#), Status::Error);
        assert_eq!(parser.parse_error(), Some(ParseError::KeyMustBeString));
    }
}
