//! The billing-document data model.
//!
//! A [`Document`] is an immutable snapshot of one invoice, receipt or
//! quotation as supplied by the caller. All monetary figures — including
//! `subtotal`, `tax_amount` and `total` — are trusted inputs: the
//! renderer displays whatever arithmetic it is handed and never
//! recomputes or validates it.

use crate::error::{Error, ErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::Date;

/// Terms substituted when an invoice carries no explicit notes. Other
/// document kinds default to an empty terms block.
pub const DEFAULT_INVOICE_TERMS: &str = "Please send payment within 30 days of receiving this \
    invoice. There will be 10% interest charge per month on late invoice.";

/// The three supported billing-document types.
///
/// The kind drives the rendered title, the table column layout (receipts
/// gain a BALANCE column) and whether the PAID stamp is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Invoice,
    Receipt,
    Quotation,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [Self::Invoice, Self::Receipt, Self::Quotation];

    /// Wire/filename form: `invoice`, `receipt`, `quotation`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::Receipt => "receipt",
            Self::Quotation => "quotation",
        }
    }

    /// Document heading: `INVOICE`, `RECEIPT`, `QUOTATION`.
    pub fn title(self) -> &'static str {
        match self {
            Self::Invoice => "INVOICE",
            Self::Receipt => "RECEIPT",
            Self::Quotation => "QUOTATION",
        }
    }

    /// Prose label used in `"<Label> no :"` and `"<Label> to :"`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Invoice => "Invoice",
            Self::Receipt => "Receipt",
            Self::Quotation => "Quotation",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "invoice" => Ok(Self::Invoice),
            "receipt" => Ok(Self::Receipt),
            "quotation" => Ok(Self::Quotation),
            other => exn::bail!(ErrorKind::UnsupportedKind(other.to_string())),
        }
    }
}

/// One billing document, immutable for the duration of a render.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(rename = "type")]
    pub kind: DocumentKind,
    /// Opaque display identifier; never parsed.
    pub document_number: String,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_address: Option<String>,
    /// Order is preserved and drives the 1-based row numbering.
    pub items: Vec<LineItem>,
    pub subtotal: f64,
    /// Discount percentage; `0` disables the discount row.
    #[serde(default)]
    pub discount: f64,
    /// Tax percentage; `0` disables the VAT row.
    #[serde(default)]
    pub tax_rate: f64,
    /// Pre-computed tax amount displayed as-is — never derived from
    /// `tax_rate` here.
    #[serde(default)]
    pub tax_amount: f64,
    pub total: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Document {
    /// The displayed discount amount: `subtotal * discount / 100`.
    pub fn discount_amount(&self) -> f64 {
        self.subtotal * self.discount / 100.0
    }

    /// Terms block: explicit notes win, invoices fall back to
    /// [`DEFAULT_INVOICE_TERMS`], everything else renders empty.
    pub fn terms(&self) -> &str {
        match (&self.notes, self.kind) {
            (Some(notes), _) => notes,
            (None, DocumentKind::Invoice) => DEFAULT_INVOICE_TERMS,
            (None, _) => "",
        }
    }
}

/// One table row. Carries no identity beyond its position; `total` is a
/// trusted input and not required to equal `quantity * unit_price`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub total: f64,
}

/// Serde support for the `date` field: accepts a plain ISO date
/// (`2026-08-07`) or an RFC 3339 timestamp (the date part is kept), and
/// serializes back to the plain ISO form.
mod iso_date {
    use serde::de::Error as DeError;
    use serde::{Deserialize, Deserializer, Serializer};
    use time::format_description::FormatItem;
    use time::format_description::well_known::Rfc3339;
    use time::macros::format_description;
    use time::{Date, OffsetDateTime};

    const ISO_DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if let Ok(date) = Date::parse(&raw, &ISO_DATE) {
            return Ok(date);
        }
        OffsetDateTime::parse(&raw, &Rfc3339).map(OffsetDateTime::date).map_err(|_| {
            DeError::custom(format!(
                "invalid date {raw:?}: expected YYYY-MM-DD or an RFC 3339 timestamp"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use time::macros::date;

    fn minimal(kind: &str) -> Document {
        serde_json::from_value(serde_json::json!({
            "type": kind,
            "documentNumber": "INV-001",
            "date": "2026-08-07",
            "customerName": "Acme",
            "items": [],
            "subtotal": 0.0,
            "total": 0.0,
        }))
        .expect("valid document")
    }

    #[test]
    fn deserializes_camel_case_payload() {
        let document: Document = serde_json::from_value(serde_json::json!({
            "type": "invoice",
            "documentNumber": "INV-001",
            "date": "2026-08-07T09:30:00Z",
            "customerName": "Acme",
            "customerEmail": "billing@acme.test",
            "items": [
                { "description": "Widget", "quantity": 2, "unitPrice": 1000, "total": 2000 }
            ],
            "subtotal": 2000,
            "discount": 0,
            "taxRate": 0,
            "taxAmount": 0,
            "total": 2000,
        }))
        .expect("valid document");
        assert_eq!(document.kind, DocumentKind::Invoice);
        assert_eq!(document.date, date!(2026 - 08 - 07));
        assert_eq!(document.customer_email.as_deref(), Some("billing@acme.test"));
        assert!(document.customer_phone.is_none());
        assert_eq!(document.items.len(), 1);
        assert_eq!(document.items[0].unit_price, 1000.0);
    }

    #[test]
    fn rejects_malformed_dates() {
        let result = serde_json::from_value::<Document>(serde_json::json!({
            "type": "invoice",
            "documentNumber": "INV-001",
            "date": "yesterday",
            "customerName": "Acme",
            "items": [],
            "subtotal": 0,
            "total": 0,
        }));
        assert!(result.is_err());
    }

    #[rstest]
    #[case("invoice", DocumentKind::Invoice)]
    #[case("Receipt", DocumentKind::Receipt)]
    #[case(" QUOTATION ", DocumentKind::Quotation)]
    fn parses_kind_case_insensitively(#[case] input: &str, #[case] expected: DocumentKind) {
        assert_eq!(input.parse::<DocumentKind>().unwrap(), expected);
    }

    #[test]
    fn rejects_unknown_kind() {
        assert!("memo".parse::<DocumentKind>().is_err());
    }

    #[test]
    fn invoice_without_notes_gets_default_terms() {
        assert_eq!(minimal("invoice").terms(), DEFAULT_INVOICE_TERMS);
        assert_eq!(minimal("quotation").terms(), "");
        assert_eq!(minimal("receipt").terms(), "");
        let mut document = minimal("quotation");
        document.notes = Some("Valid for 14 days.".to_string());
        assert_eq!(document.terms(), "Valid for 14 days.");
    }

    #[test]
    fn discount_amount_is_percentage_of_subtotal() {
        let mut document = minimal("invoice");
        document.subtotal = 2000.0;
        document.discount = 10.0;
        assert_eq!(document.discount_amount(), 200.0);
        document.discount = 0.0;
        assert_eq!(document.discount_amount(), 0.0);
    }
}
