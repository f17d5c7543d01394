//! Currency and date display formatting.
//!
//! Every monetary amount in a rendered document passes through a single
//! [`CurrencyFormatter`], and every date through one of the two fixed
//! display conventions below — the header's long form ("7 August 2026")
//! and the stamp's abbreviated uppercase form ("07 AUG 2026"). No other
//! formatting variants exist, so swapping the currency display is a
//! construction-time concern and never touches template logic.

use time::Date;
use time::format_description::FormatItem;
use time::macros::format_description;

/// Header date: `7 August 2026`.
const LONG_DATE: &[FormatItem<'static>] = format_description!("[day padding:none] [month repr:long] [year]");
/// Stamp date before uppercasing: `07 Aug 2026`.
const STAMP_DATE: &[FormatItem<'static>] = format_description!("[day] [month repr:short] [year]");

/// Formats amounts for display in a fixed currency.
///
/// Defaults to Malawian Kwacha conventions: symbol `MK`, grouped
/// thousands, always two decimals, sign ahead of the symbol
/// (`-MK 1,500.00`). Total for every finite input.
#[derive(Debug, Clone)]
pub struct CurrencyFormatter {
    symbol: String,
}

impl Default for CurrencyFormatter {
    fn default() -> Self {
        Self::new("MK")
    }
}

impl CurrencyFormatter {
    /// Creates a formatter with a different currency symbol.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self { symbol: symbol.into() }
    }

    pub fn format(&self, amount: f64) -> String {
        let amount = if amount.is_finite() { amount } else { 0.0 };
        // Round to cents first so that -0.004 does not render as "-MK 0.00".
        let cents = (amount.abs() * 100.0).round() as u64;
        let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
        format!("{sign}{} {}.{:02}", self.symbol, group_thousands(cents / 100), cents % 100)
    }
}

/// Insert comma separators: 21837 → "21,837"
fn group_thousands(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}

/// Header display form, e.g. `7 August 2026`.
pub fn long_date(date: Date) -> String {
    date.format(&LONG_DATE).unwrap_or_else(|_| date.to_string())
}

/// Stamp display form, e.g. `07 AUG 2026`.
pub fn stamp_date(date: Date) -> String {
    date.format(&STAMP_DATE).unwrap_or_else(|_| date.to_string()).to_uppercase()
}

/// Bare-number display for quantities and percentages: drops a trailing
/// `.0` (`2` stays `2`, `2.5` stays `2.5`), matching how the source
/// figures were entered.
pub fn plain_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use time::macros::date;

    #[rstest]
    #[case(0.0, "MK 0.00")]
    #[case(1.0, "MK 1.00")]
    #[case(2000.0, "MK 2,000.00")]
    #[case(1234567.89, "MK 1,234,567.89")]
    #[case(0.005, "MK 0.01")]
    #[case(-1500.0, "-MK 1,500.00")]
    #[case(-0.001, "MK 0.00")]
    fn formats_kwacha(#[case] amount: f64, #[case] expected: &str) {
        assert_eq!(CurrencyFormatter::default().format(amount), expected);
    }

    #[test]
    fn formats_with_substituted_symbol() {
        assert_eq!(CurrencyFormatter::new("$").format(19.99), "$ 19.99");
    }

    #[test]
    fn long_date_uses_unpadded_day_and_full_month() {
        assert_eq!(long_date(date!(2026 - 08 - 07)), "7 August 2026");
        assert_eq!(long_date(date!(2025 - 12 - 25)), "25 December 2025");
    }

    #[test]
    fn stamp_date_is_padded_and_uppercase() {
        assert_eq!(stamp_date(date!(2026 - 08 - 07)), "07 AUG 2026");
        assert_eq!(stamp_date(date!(2025 - 12 - 25)), "25 DEC 2025");
    }

    #[rstest]
    #[case(2.0, "2")]
    #[case(2.5, "2.5")]
    #[case(0.0, "0")]
    #[case(16.5, "16.5")]
    #[case(10.0, "10")]
    fn plain_number_trims_whole_values(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(plain_number(value), expected);
    }
}
