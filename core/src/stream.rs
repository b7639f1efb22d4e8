//! Async chunk feeding (feature `tokio`).
//!
//! The parser cores are synchronous; this adapter drains byte chunks from
//! a channel into one, so a network receive loop can hand off to a parse
//! task with backpressure provided by the channel.

use crate::events::{Handler, Status};
use crate::parser::Parser;
use crate::rev_parser::ReverseParser;

use tokio::sync::mpsc;

/// Feed every chunk from `rx` into `parser`, then finish.
///
/// Stops early and returns the non-ok status if a chunk fails or a
/// callback cancels.
///
/// # Example
///
/// ```ignore
/// let (tx, mut rx) = tokio::sync::mpsc::channel::<Vec<u8>>(32);
///
/// tokio::spawn(async move {
///     while let Some(packet) = socket.recv().await {
///         tx.send(packet).await?;
///     }
/// });
///
/// let mut parser = Parser::new(ParseConfig::default());
/// let status = drive(&mut parser, &mut handler, &mut rx).await;
/// ```
pub async fn drive<H: Handler>(
    parser: &mut Parser,
    handler: &mut H,
    rx: &mut mpsc::Receiver<Vec<u8>>,
) -> Status {
    while let Some(chunk) = rx.recv().await {
        let status = parser.parse(handler, &chunk);
        if !status.is_ok() {
            return status;
        }
    }
    parser.finish(handler)
}

/// [`drive`], for the reverse variant: chunks must arrive tail-first.
pub async fn drive_reverse<H: Handler>(
    parser: &mut ReverseParser,
    handler: &mut H,
    rx: &mut mpsc::Receiver<Vec<u8>>,
) -> Status {
    while let Some(chunk) = rx.recv().await {
        let status = parser.parse(handler, &chunk);
        if !status.is_ok() {
            return status;
        }
    }
    parser.finish(handler)
}
