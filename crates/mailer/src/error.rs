//! Mailer Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A delivery error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for delivery operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Delivery failures are classified into distinct user-facing causes;
/// none of them are retried automatically.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("smtp credentials not configured; set the smtp username and password")]
    MissingCredentials,
    #[display("invalid sender address: {_0}")]
    InvalidSender(#[error(not(source))] String),
    #[display("invalid recipient address: {_0}")]
    InvalidRecipient(#[error(not(source))] String),
    #[display("smtp authentication failed; check the configured email credentials")]
    Authentication,
    #[display("failed to connect to the smtp server; check the host and port settings")]
    Connection,
    #[display("smtp connection timed out; try again later")]
    Timeout,
    #[display("failed to build the email message: {_0}")]
    Message(#[error(not(source))] String),
    #[display("failed to send email: {_0}")]
    Send(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
