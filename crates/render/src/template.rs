//! HTML rendering for billing documents.
//!
//! Converts a [`Document`] plus [`Branding`] into a complete, self-styled
//! markup string using an [upon] template embedded at compile time. The
//! template is compiled eagerly at construction so that syntax errors
//! surface at startup rather than at render time, and the compiled
//! template is reused across every render.
//!
//! Rendering is pure and deterministic: the same document and branding
//! always produce byte-identical markup, missing optional fields degrade
//! to omitted sections, and all I/O happens elsewhere.
//!
//! Layout rules baked into the template and the parameter map:
//!
//! - column widths are fixed per document kind — receipts run
//!   4/38/10/15/16 plus a 17% BALANCE column, invoices and quotations run
//!   5/45/12/18/20 with no BALANCE column;
//! - the circular PAID stamp (branding name + `DD MON YYYY` date) appears
//!   on receipts only;
//! - the receipt BALANCE cell always shows currency-formatted zero,
//!   regardless of payment state;
//! - row numbering is 1-based input order, independent of row content.

use crate::document::{Document, DocumentKind};
use crate::error::{ErrorKind, Result};
use crate::format::{self, CurrencyFormatter};
use billkit_config::Branding;
use exn::{OptionExt, ResultExt};
use rust_embed::Embed;
use tracing::instrument;
use upon::{Engine, Template};

/// Embedded template assets, bundled into the binary at compile time.
#[derive(Embed)]
#[folder = "templates/"]
struct Assets;

const DOCUMENT_TEMPLATE: &str = "document.html";

/// Fixed table column widths (NO, DESCRIPTION, QTY, PRICE, TOTAL).
/// Receipts trade description width for the extra BALANCE column.
const RECEIPT_COLUMNS: [&str; 5] = ["4%", "38%", "10%", "15%", "16%"];
const STANDARD_COLUMNS: [&str; 5] = ["5%", "45%", "12%", "18%", "20%"];

/// Compiled document template with its formatting engine.
///
/// The [`CurrencyFormatter`] is injected at construction and exposed to
/// the template as the `currency` formatter, so an alternate currency or
/// locale is a constructor argument, never a template edit.
pub struct DocumentTemplate {
    engine: Engine<'static>,
    template: Template<'static>,
}

impl DocumentTemplate {
    /// Compiles the embedded template with the given currency formatter.
    pub fn new(currency: CurrencyFormatter) -> Result<Self> {
        let mut engine = Engine::new();
        formatters::configure(&mut engine, currency);
        let source = load_asset(DOCUMENT_TEMPLATE)?;
        let template = engine.compile(source).or_raise(|| ErrorKind::Template)?;
        Ok(Self { engine, template })
    }

    /// Renders the document to a complete HTML page.
    #[instrument(skip_all, fields(kind = %document.kind, number = %document.document_number))]
    pub fn render(&self, document: &Document, branding: &Branding) -> Result<String> {
        self.template
            .render(&self.engine, Self::parameters(document, branding))
            .to_string()
            .or_raise(|| ErrorKind::Template)
    }

    /// Builds the [`upon::Value`] map exposed to the template.
    ///
    /// All conditional sections are pre-resolved into booleans here so
    /// the template itself stays free of business logic.
    fn parameters(document: &Document, branding: &Branding) -> upon::Value {
        let is_receipt = document.kind == DocumentKind::Receipt;
        let cols = if is_receipt { RECEIPT_COLUMNS } else { STANDARD_COLUMNS };
        let rows = document
            .items
            .iter()
            .enumerate()
            .map(|(position, item)| {
                upon::value! {
                    index: (position + 1) as u64,
                    description: item.description.as_str(),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    total: item.total,
                    // Display convention of the receipt layout: the
                    // balance column always shows zero.
                    balance: 0.0_f64,
                }
            })
            .collect::<Vec<_>>();
        upon::value! {
            company: upon::value! {
                name: branding.name.as_str(),
                tagline: branding.tagline.as_str(),
                address: branding.address.as_str(),
                phone: branding.phone.as_str(),
                email: branding.email.as_str(),
            },
            title: document.kind.title(),
            number_label: format!("{} no", document.kind.label()),
            to_label: format!("{} to", document.kind.label()),
            number: document.document_number.as_str(),
            date_long: format::long_date(document.date),
            stamp_date: format::stamp_date(document.date),
            is_receipt: is_receipt,
            customer: upon::value! {
                name: document.customer_name.as_str(),
                has_phone: document.customer_phone.is_some(),
                phone: document.customer_phone.clone().unwrap_or_default(),
                has_email: document.customer_email.is_some(),
                email: document.customer_email.clone().unwrap_or_default(),
                has_address: document.customer_address.is_some(),
                address: document.customer_address.clone().unwrap_or_default(),
            },
            cols: upon::value! {
                no: cols[0],
                description: cols[1],
                qty: cols[2],
                price: cols[3],
                total: cols[4],
            },
            rows: rows,
            summary: upon::value! {
                subtotal: document.subtotal,
                has_discount: document.discount > 0.0,
                discount_pct: document.discount,
                discount_amount: document.discount_amount(),
                has_vat: document.tax_rate > 0.0,
                tax_rate: document.tax_rate,
                tax_amount: document.tax_amount,
                total: document.total,
            },
            terms: document.terms(),
        }
    }
}

fn load_asset(name: &str) -> Result<String> {
    let file = Assets::get(name).ok_or_raise(|| ErrorKind::AssetNotFound(name.to_string()))?;
    String::from_utf8(file.data.into_owned()).or_raise(|| ErrorKind::AssetNotFound(name.to_string()))
}

/// Custom [`upon`] formatters for monetary and bare-number output.
mod formatters {
    use crate::format::{self, CurrencyFormatter};
    use std::fmt::Write;
    use upon::{Engine, Value, fmt as upon_fmt};

    /// Registers the `currency` and `number` formatters on the engine.
    pub(crate) fn configure(engine: &mut Engine<'_>, currency: CurrencyFormatter) {
        engine.add_formatter("currency", move |f: &mut upon_fmt::Formatter<'_>, value: &Value| {
            match value {
                Value::Integer(n) => write!(f, "{}", currency.format(*n as f64))?,
                Value::Float(n) => write!(f, "{}", currency.format(*n))?,
                v => upon_fmt::default(f, v)?,
            };
            Ok(())
        });
        engine.add_formatter("number", |f: &mut upon_fmt::Formatter<'_>, value: &Value| {
            match value {
                Value::Integer(n) => write!(f, "{n}")?,
                Value::Float(n) => write!(f, "{}", format::plain_number(*n))?,
                v => upon_fmt::default(f, v)?,
            };
            Ok(())
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DEFAULT_INVOICE_TERMS, LineItem};
    use rstest::rstest;
    use time::macros::date;

    fn template() -> DocumentTemplate {
        DocumentTemplate::new(CurrencyFormatter::default()).expect("template compiles")
    }

    fn sample(kind: DocumentKind) -> Document {
        Document {
            kind,
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

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[rstest]
    #[case(DocumentKind::Invoice, 0)]
    #[case(DocumentKind::Quotation, 0)]
    #[case(DocumentKind::Receipt, 1)]
    fn stamp_appears_only_on_receipts(#[case] kind: DocumentKind, #[case] expected: usize) {
        let markup = template().render(&sample(kind), &Branding::default()).unwrap();
        assert_eq!(count(&markup, r#"<div class="stamp">"#), expected);
        assert_eq!(count(&markup, r#"<div class="paid-badge">PAID</div>"#), expected);
    }

    #[test]
    fn invoice_markup_matches_expected_content() {
        let markup = template().render(&sample(DocumentKind::Invoice), &Branding::default()).unwrap();
        assert!(markup.contains("INVOICE"));
        assert!(markup.contains("Invoice no : INV-001"));
        assert!(markup.contains("Invoice to :"));
        assert!(markup.contains("Widget"));
        assert!(markup.contains("<td>1</td>"));
        assert!(markup.contains("7 August 2026"));
        assert!(!markup.contains("BALANCE"));
        assert!(markup.contains("MK 2,000.00"));
    }

    #[rstest]
    #[case(DocumentKind::Invoice, "INVOICE")]
    #[case(DocumentKind::Quotation, "QUOTATION")]
    #[case(DocumentKind::Receipt, "RECEIPT")]
    fn title_follows_document_kind(#[case] kind: DocumentKind, #[case] title: &str) {
        let markup = template().render(&sample(kind), &Branding::default()).unwrap();
        assert!(markup.contains(&format!(r#"<div class="title-text">{title}</div>"#)));
    }

    #[test]
    fn rows_are_numbered_in_input_order() {
        let mut document = sample(DocumentKind::Invoice);
        document.items = (1..=4)
            .map(|n| LineItem {
                description: format!("Item {n}"),
                quantity: 1.0,
                unit_price: 10.0,
                total: 10.0,
            })
            .collect();
        let markup = template().render(&document, &Branding::default()).unwrap();
        assert_eq!(count(&markup, "<tr>"), 5); // header + 4 rows
        let mut previous = 0;
        for n in 1..=4 {
            let index = markup.find(&format!("<td>{n}</td>")).expect("row index rendered");
            let description = markup.find(&format!("Item {n}")).expect("description rendered");
            // Row n's index cell sits right before its own description,
            // and rows appear in input order.
            assert!(previous < index && index < description);
            previous = description;
        }
    }

    #[test]
    fn receipt_rows_carry_zero_balance_column() {
        let mut document = sample(DocumentKind::Receipt);
        document.items.push(LineItem {
            description: "Gadget".to_string(),
            quantity: 1.0,
            unit_price: 500.0,
            total: 500.0,
        });
        let markup = template().render(&document, &Branding::default()).unwrap();
        assert_eq!(count(&markup, ">BALANCE</th>"), 1);
        // One zero-balance cell per item row, regardless of totals.
        assert_eq!(count(&markup, r#"class="text-right balance">MK 0.00</td>"#), 2);
        assert!(markup.contains("07 AUG 2026"));
    }

    #[test]
    fn discount_row_only_when_discount_positive() {
        let mut document = sample(DocumentKind::Invoice);
        let markup = template().render(&document, &Branding::default()).unwrap();
        assert!(!markup.contains("Discount ("));

        document.discount = 10.0;
        let markup = template().render(&document, &Branding::default()).unwrap();
        assert!(markup.contains("Discount (10%) :"));
        // 2000 * 10 / 100, rendered with a leading minus sign.
        assert!(markup.contains("-MK 200.00"));
    }

    #[test]
    fn vat_row_shows_supplied_tax_amount_unmodified() {
        let mut document = sample(DocumentKind::Invoice);
        let markup = template().render(&document, &Branding::default()).unwrap();
        assert!(!markup.contains("VAT"));

        document.tax_rate = 16.5;
        // Deliberately inconsistent with tax_rate: must be displayed as-is.
        document.tax_amount = 123.45;
        let markup = template().render(&document, &Branding::default()).unwrap();
        assert!(markup.contains("VAT 16.5% :"));
        assert!(markup.contains("MK 123.45"));
    }

    #[test]
    fn customer_details_render_only_when_present() {
        let mut document = sample(DocumentKind::Invoice);
        let markup = template().render(&document, &Branding::default()).unwrap();
        assert_eq!(count(&markup, r#"<div class="customer-detail">"#), 0);

        document.customer_phone = Some("+265 999 000 111".to_string());
        document.customer_address = Some("Area 47, Lilongwe".to_string());
        let markup = template().render(&document, &Branding::default()).unwrap();
        assert_eq!(count(&markup, r#"<div class="customer-detail">"#), 2);
        assert!(markup.contains("+265 999 000 111"));
        assert!(markup.contains("Area 47, Lilongwe"));
    }

    #[test]
    fn terms_fall_back_for_invoices_only() {
        let invoice = template().render(&sample(DocumentKind::Invoice), &Branding::default()).unwrap();
        assert!(invoice.contains(DEFAULT_INVOICE_TERMS));

        let quotation = template().render(&sample(DocumentKind::Quotation), &Branding::default()).unwrap();
        assert!(!quotation.contains(DEFAULT_INVOICE_TERMS));

        let mut document = sample(DocumentKind::Invoice);
        document.notes = Some("Quote valid for 14 days.".to_string());
        let markup = template().render(&document, &Branding::default()).unwrap();
        assert!(markup.contains("Quote valid for 14 days."));
        assert!(!markup.contains(DEFAULT_INVOICE_TERMS));
    }

    #[test]
    fn rendering_is_deterministic() {
        let template = template();
        let document = sample(DocumentKind::Receipt);
        let branding = Branding::default();
        let first = template.render(&document, &branding).unwrap();
        let second = template.render(&document, &branding).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn branding_flows_into_header_and_stamp() {
        let branding = Branding::default().with_company(Some("NIGHT MARKET"));
        let markup = template().render(&sample(DocumentKind::Receipt), &branding).unwrap();
        assert_eq!(count(&markup, "NIGHT MARKET"), 2); // header + stamp
        assert!(markup.contains(&Branding::default().tagline));
    }
}
