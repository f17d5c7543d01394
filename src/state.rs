//! Shared application state.

use crate::error::{ErrorKind, Result};
use billkit_config::AppConfig;
use billkit_mailer::Mailer;
use billkit_render::{CurrencyFormatter, PdfEngine};
use std::sync::Arc;

/// Everything a request handler needs, cheap to clone.
///
/// The mailer is optional: the service renders and serves PDFs without
/// SMTP credentials, and only `/api/email/send` reports the missing
/// configuration.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub engine: Arc<PdfEngine>,
    pub mailer: Option<Arc<Mailer>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        let engine = match PdfEngine::new(&config.chrome, CurrencyFormatter::default()) {
            Ok(engine) => engine,
            Err(err) => exn::bail!(ErrorKind::Render(err.to_string())),
        };
        let mailer = match Mailer::new(&config.smtp) {
            Ok(mailer) => Some(Arc::new(mailer)),
            Err(err) => {
                tracing::warn!(error = %err, "email delivery disabled");
                None
            }
        };
        Ok(Self { config: Arc::new(config), engine: Arc::new(engine), mailer })
    }
}
