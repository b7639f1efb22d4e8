//! Parser options.
//!
//! All options default to off (and UTF-8 validation to on): the default
//! configuration accepts exactly one strict JSON value per handle.
//!
//! # Example
//!
//! ```
//! use janus_json_core::ParseConfig;
//!
//! let config = ParseConfig::new()
//!     .with_allow_comments(true)
//!     .with_allow_multiple_values(true);
//! assert!(config.allow_comments);
//! ```

/// Behavior switches for a parser handle.
///
/// Builder-style `const fn` setters allow assembling a configuration in
/// const context; the struct is `Copy` and is captured by the handle at
/// construction time.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseConfig {
    /// Permit `// ...` and `/* ... */` comments between tokens.
    pub allow_comments: bool,

    /// Validate that string bodies are well-formed UTF-8.
    ///
    /// On by default; turning it off skips the check entirely, which is
    /// measurably faster when the input is known to be clean.
    pub validate_utf8: bool,

    /// After a complete value, tolerate any remaining bytes instead of
    /// reporting "trailing garbage".
    pub allow_trailing_garbage: bool,

    /// After a complete value, accept further top-level values from the
    /// same stream.
    pub allow_multiple_values: bool,

    /// Treat end of input in the middle of a value as success rather than
    /// "premature EOF".
    pub allow_partial_values: bool,

    /// When a callback cancels the parse, leave the handle in a resumable
    /// state instead of poisoning it.
    pub resume_after_cancel: bool,
}

impl Default for ParseConfig {
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl ParseConfig {
    /// Strict single-document configuration.
    pub const DEFAULT: Self = Self {
        allow_comments: false,
        validate_utf8: true,
        allow_trailing_garbage: false,
        allow_multiple_values: false,
        allow_partial_values: false,
        resume_after_cancel: false,
    };

    #[inline]
    pub const fn new() -> Self {
        Self::DEFAULT
    }

    #[inline]
    pub const fn with_allow_comments(mut self, on: bool) -> Self {
        self.allow_comments = on;
        self
    }

    #[inline]
    pub const fn with_validate_utf8(mut self, on: bool) -> Self {
        self.validate_utf8 = on;
        self
    }

    #[inline]
    pub const fn with_allow_trailing_garbage(mut self, on: bool) -> Self {
        self.allow_trailing_garbage = on;
        self
    }

    #[inline]
    pub const fn with_allow_multiple_values(mut self, on: bool) -> Self {
        self.allow_multiple_values = on;
        self
    }

    #[inline]
    pub const fn with_allow_partial_values(mut self, on: bool) -> Self {
        self.allow_partial_values = on;
        self
    }

    #[inline]
    pub const fn with_resume_after_cancel(mut self, on: bool) -> Self {
        self.resume_after_cancel = on;
        self
    }
}
