//! Render Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A render error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for render operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Every resolution strategy was exhausted without producing an
    /// executable that exists on disk.
    #[display("chrome/chromium executable could not be resolved")]
    ChromeNotFound,
    /// On-demand install failed; carries the cache directory and the
    /// installer's reason so an operator can act on it.
    #[display("chromium install into {} failed: {_1}", _0.display())]
    ChromeInstall(#[error(not(source))] PathBuf, String),
    /// The browser process could not be started.
    #[display("failed to launch chrome: {_0}")]
    Launch(#[error(not(source))] String),
    /// The document did not finish loading within the bounded wait.
    #[display("document load did not complete: {_0}")]
    Navigation(#[error(not(source))] String),
    /// Pagination/rasterization of the loaded document failed.
    #[display("pdf capture failed: {_0}")]
    Capture(#[error(not(source))] String),
    /// Embedded template asset missing or invalid.
    #[display("asset not found: {_0}")]
    AssetNotFound(#[error(not(source))] String),
    /// A document type outside invoice/receipt/quotation was supplied.
    #[display("unsupported document type: {_0}; expected one of invoice, receipt, quotation")]
    UnsupportedKind(#[error(not(source))] String),
    /// Template compilation or rendering failed.
    Template,
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    ///
    /// Nothing in the render pipeline is retried automatically; a failure
    /// at any step aborts the render after cleanup.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
