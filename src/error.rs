//! Server Error Types
//!
//! Startup-time failures only; per-request failures are mapped onto HTTP
//! responses in [`crate::routes`].

use derive_more::{Display, Error};

/// A server error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("configuration error: {_0}")]
    Config(#[error(not(source))] String),
    #[display("render engine initialisation failed: {_0}")]
    Render(#[error(not(source))] String),
    #[display("could not bind port {_0}: {_1}")]
    Bind(#[error(not(source))] u16, String),
    #[display("server error: {_0}")]
    Serve(#[error(not(source))] String),
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
