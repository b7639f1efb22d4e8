//! The event interface between the parser cores and client code.

/// Receiver for structural parse events.
///
/// Every method returns a continuation signal: `true` keeps parsing,
/// `false` cancels (see [`crate::ParseConfig::resume_after_cancel`] for
/// what happens next). All methods have default implementations that do
/// nothing and continue, so a handler only implements the events it cares
/// about; structure is validated either way.
///
/// String-ish payloads are byte slices rather than `&str`: with UTF-8
/// validation off, or with the decoder's lenient treatment of lone
/// surrogate halves, a payload is not guaranteed to be valid UTF-8.
///
/// # Numbers
///
/// By default numeric tokens are parsed and delivered through
/// [`integer`](Handler::integer) / [`double`](Handler::double). A handler
/// that wants the raw text instead (arbitrary precision, exact
/// round-tripping) overrides [`wants_raw_numbers`](Handler::wants_raw_numbers)
/// to return `true` and receives every number through
/// [`raw_number`](Handler::raw_number); `integer`/`double` are then never
/// called and overflow is never diagnosed.
#[allow(unused_variables)]
pub trait Handler {
    fn null(&mut self) -> bool {
        true
    }

    fn boolean(&mut self, value: bool) -> bool {
        true
    }

    fn integer(&mut self, value: i64) -> bool {
        true
    }

    fn double(&mut self, value: f64) -> bool {
        true
    }

    /// Route numbers to [`raw_number`](Handler::raw_number) instead of
    /// parsing them.
    fn wants_raw_numbers(&self) -> bool {
        false
    }

    /// The raw source text of a number token. Only called when
    /// [`wants_raw_numbers`](Handler::wants_raw_numbers) returns `true`.
    fn raw_number(&mut self, text: &[u8]) -> bool {
        true
    }

    /// A string value, quotes stripped and escapes decoded.
    fn string(&mut self, bytes: &[u8]) -> bool {
        true
    }

    fn start_map(&mut self) -> bool {
        true
    }

    /// An object key, quotes stripped and escapes decoded.
    fn map_key(&mut self, key: &[u8]) -> bool {
        true
    }

    fn end_map(&mut self) -> bool {
        true
    }

    fn start_array(&mut self) -> bool {
        true
    }

    fn end_array(&mut self) -> bool {
        true
    }
}

/// Outcome of a `parse` or `finish` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Status {
    /// The chunk was consumed (or the document completed) without error.
    /// More input may still be required.
    Ok,
    /// A callback returned `false`. With
    /// [`resume_after_cancel`](crate::ParseConfig::resume_after_cancel)
    /// the next call picks up after the cancellation point; without it the
    /// handle is poisoned.
    ClientCanceled,
    /// A lexical or parse error was recorded; see
    /// [`Parser::error_string`](crate::Parser::error_string).
    Error,
}

impl Status {
    #[inline]
    pub fn is_ok(self) -> bool {
        matches!(self, Status::Ok)
    }
}
