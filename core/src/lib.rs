#![deny(
    unsafe_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]

//! Core engine of `janus-json`: a resumable, push-driven streaming JSON
//! parser that comes in two flavors sharing one state machine.
//!
//! The [`Parser`] consumes a document left-to-right as arbitrary byte
//! chunks; the [`ReverseParser`] consumes it right-to-left from tail-first
//! chunks, yielding each map entry value-before-key. Neither requires the
//! caller to buffer the document: a chunk boundary may fall anywhere,
//! even mid-string or between the bytes of a UTF-8 sequence, and the
//! lexers suspend and resume exactly there.
//!
//! Events are pushed into a caller-supplied [`Handler`]; any callback can
//! cancel the parse by returning `false`. Behavior switches (comments,
//! UTF-8 validation, multiple top-level values, ...) live on
//! [`ParseConfig`].

mod buf;
mod chars;
pub mod config;
mod decode;
mod error;
mod events;
mod lexer;
mod num;
mod parser;
mod rev_lexer;
mod rev_parser;
mod state;
mod token;

#[cfg(feature = "tokio")]
pub mod stream;

pub use config::ParseConfig;
pub use error::{LexError, ParseError};
pub use events::{Handler, Status};
pub use lexer::{Lexed, Lexer};
pub use parser::Parser;
pub use rev_lexer::ReverseLexer;
pub use rev_parser::ReverseParser;
pub use state::ParseState;
pub use token::Token;
