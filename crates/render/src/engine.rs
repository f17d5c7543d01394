//! Headless-chrome PDF rendering.
//!
//! One render is one isolated browser process: resolve an executable,
//! launch, load the staged markup, wait for layout to settle, capture an
//! A4-paginated PDF, and tear the process down on every exit path.
//! Process leakage is treated as a correctness bug, so teardown runs
//! whether the capture succeeded, timed out, or failed outright — and a
//! teardown failure is logged without masking the original error.
//!
//! No step is retried. A failure anywhere aborts the render and
//! propagates to the caller after cleanup.

use crate::chrome::ExecutableResolver;
use crate::document::Document;
use crate::error::{ErrorKind, Result};
use crate::format::CurrencyFormatter;
use crate::template::DocumentTemplate;
use billkit_config::{Branding, ChromeConfig};
use exn::ResultExt;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::io::Write;
use std::time::Duration;
use tracing::instrument;

/// Bounded wait for the page load event. Exceeding it is fatal for the
/// render, never retried.
const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);
/// Fixed pause after the load event so webfonts and asynchronous layout
/// finish before capture; the load event alone does not guarantee either.
const SETTLE_DELAY: Duration = Duration::from_millis(500);
/// Page viewport. Text is rasterized at 2x device pixel density (see
/// `--force-device-scale-factor` below) to keep it crisp.
const VIEWPORT: (u32, u32) = (1200, 1600);
/// A4 paper, in inches. Margins are zero: all margin control is
/// delegated to the document's own CSS.
const A4_WIDTH_IN: f64 = 8.27;
const A4_HEIGHT_IN: f64 = 11.69;

/// Flags that make headless rendering work inside restrictive container
/// environments (root execution, tiny /dev/shm, no GPU). The sandbox is
/// additionally disabled via the launch options.
const BROWSER_ARGS: &[&str] = &[
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--disable-software-rasterizer",
    "--disable-extensions",
    "--single-process",
    "--force-device-scale-factor=2",
];

/// Renders billing documents to PDF byte buffers.
///
/// Owns the compiled [`DocumentTemplate`] and the [`ExecutableResolver`];
/// the browser executable is re-resolved on every render so that a
/// completed install is picked up without restarting the process.
pub struct PdfEngine {
    resolver: ExecutableResolver,
    template: DocumentTemplate,
}

impl PdfEngine {
    pub fn new(chrome: &ChromeConfig, currency: CurrencyFormatter) -> Result<Self> {
        Ok(Self {
            resolver: ExecutableResolver::new(chrome),
            template: DocumentTemplate::new(currency)?,
        })
    }

    /// The underlying markup renderer, for callers that need the HTML
    /// itself (e.g. previews).
    pub fn template(&self) -> &DocumentTemplate {
        &self.template
    }

    /// Renders a document to a paginated A4 PDF. Ownership of the buffer
    /// transfers to the caller; the engine retains nothing.
    #[instrument(skip_all, fields(kind = %document.kind, number = %document.document_number))]
    pub fn render_document(&self, document: &Document, branding: &Branding) -> Result<Vec<u8>> {
        let markup = self.template.render(document, branding)?;
        self.render_markup(&markup)
    }

    /// Rasterizes arbitrary markup through an isolated browser process.
    pub fn render_markup(&self, markup: &str) -> Result<Vec<u8>> {
        let executable = self.resolver.resolve()?;
        // Never hand a dangling path to the process launcher.
        if !executable.exists() {
            exn::bail!(ErrorKind::ChromeNotFound);
        }
        let input = persist_markup(markup)?;
        let url = format!("file://{}", input.path().display());

        let browser = launch(&executable)?;
        let tab = match browser.new_tab() {
            Ok(tab) => tab,
            Err(err) => exn::bail!(ErrorKind::Launch(err.to_string())),
        };
        tab.set_default_timeout(NAVIGATION_TIMEOUT);

        let outcome = capture(&tab, &url);

        // Teardown runs on every exit path; a failure here is logged and
        // must not mask the capture outcome.
        if let Err(err) = tab.close(true) {
            tracing::warn!(error = %err, "failed to close tab during teardown");
        }
        drop(browser);

        let bytes = outcome?;
        tracing::debug!(bytes = bytes.len(), "pdf capture complete");
        Ok(bytes)
    }
}

/// Stages markup in a temporary `.html` file so the browser loads it via
/// a `file://` navigation. The handle keeps the file alive until capture
/// finishes.
fn persist_markup(markup: &str) -> Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("billkit-")
        .suffix(".html")
        .tempfile()
        .or_raise(|| ErrorKind::Io)?;
    file.write_all(markup.as_bytes()).or_raise(|| ErrorKind::Io)?;
    file.flush().or_raise(|| ErrorKind::Io)?;
    Ok(file)
}

fn launch(executable: &std::path::Path) -> Result<Browser> {
    let options = match LaunchOptions::default_builder()
        .path(Some(executable.to_path_buf()))
        .headless(true)
        .sandbox(false)
        .window_size(Some(VIEWPORT))
        .args(BROWSER_ARGS.iter().map(OsStr::new).collect())
        .build()
    {
        Ok(options) => options,
        Err(err) => exn::bail!(ErrorKind::Launch(err.to_string())),
    };
    match Browser::new(options) {
        Ok(browser) => Ok(browser),
        Err(err) => exn::bail!(ErrorKind::Launch(err.to_string())),
    }
}

fn capture(tab: &Tab, url: &str) -> Result<Vec<u8>> {
    if let Err(err) = tab.navigate_to(url) {
        exn::bail!(ErrorKind::Navigation(err.to_string()));
    }
    if let Err(err) = tab.wait_until_navigated() {
        exn::bail!(ErrorKind::Navigation(err.to_string()));
    }
    std::thread::sleep(SETTLE_DELAY);
    match tab.print_to_pdf(Some(pdf_options())) {
        Ok(bytes) if !bytes.is_empty() => Ok(bytes),
        Ok(_) => exn::bail!(ErrorKind::Capture("empty pdf buffer".to_string())),
        Err(err) => exn::bail!(ErrorKind::Capture(err.to_string())),
    }
}

fn pdf_options() -> PrintToPdfOptions {
    PrintToPdfOptions {
        landscape: Some(false),
        print_background: Some(true),
        paper_width: Some(A4_WIDTH_IN),
        paper_height: Some(A4_HEIGHT_IN),
        margin_top: Some(0.0),
        margin_bottom: Some(0.0),
        margin_left: Some(0.0),
        margin_right: Some(0.0),
        prefer_css_page_size: Some(false),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentKind, LineItem};
    use time::macros::date;

    fn invoice() -> Document {
        Document {
            kind: DocumentKind::Invoice,
            document_number: "INV-001".to_string(),
            date: date!(2026 - 08 - 07),
            customer_name: "Acme".to_string(),
            customer_phone: None,
            customer_email: None,
            customer_address: None,
            items: vec![LineItem {
                description: "Widget".to_string(),
                quantity: 2.0,
                unit_price: 1000.0,
                total: 2000.0,
            }],
            subtotal: 2000.0,
            discount: 0.0,
            tax_rate: 0.0,
            tax_amount: 0.0,
            total: 2000.0,
            notes: None,
        }
    }

    #[test]
    fn staged_markup_lands_in_an_html_file() {
        let file = persist_markup("<html><body>hello</body></html>").unwrap();
        assert_eq!(file.path().extension().and_then(|e| e.to_str()), Some("html"));
        assert_eq!(
            std::fs::read_to_string(file.path()).unwrap(),
            "<html><body>hello</body></html>"
        );
    }

    /// Requires a working Chrome/Chromium installation (or network access
    /// for the on-demand install). Run with: cargo test -- --ignored
    #[test]
    #[ignore]
    fn renders_invoice_to_single_page_a4_pdf() {
        let engine =
            PdfEngine::new(&billkit_config::ChromeConfig::default(), CurrencyFormatter::default())
                .unwrap();
        let pdf = engine.render_document(&invoice(), &billkit_config::Branding::default()).unwrap();
        assert!(pdf.len() > 4);
        assert_eq!(&pdf[..5], b"%PDF-");
    }

    /// Same markup rendered twice must paginate identically (content
    /// bytes may differ due to embedded timestamps).
    #[test]
    #[ignore]
    fn repeated_renders_produce_stable_page_counts() {
        let engine =
            PdfEngine::new(&billkit_config::ChromeConfig::default(), CurrencyFormatter::default())
                .unwrap();
        let markup = engine
            .template()
            .render(&invoice(), &billkit_config::Branding::default())
            .unwrap();
        let needle = b"/Type /Page";
        let pages = |pdf: &[u8]| pdf.windows(needle.len()).filter(|&w| w == &needle[..]).count();
        let first = engine.render_markup(&markup).unwrap();
        let second = engine.render_markup(&markup).unwrap();
        assert_eq!(pages(&first), pages(&second));
    }
}
