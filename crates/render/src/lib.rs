mod chrome;
pub mod document;
mod engine;
pub mod error;
pub mod format;
mod template;

pub use crate::chrome::ExecutableResolver;
pub use crate::document::{DEFAULT_INVOICE_TERMS, Document, DocumentKind, LineItem};
pub use crate::engine::PdfEngine;
pub use crate::format::CurrencyFormatter;
pub use crate::template::DocumentTemplate;
