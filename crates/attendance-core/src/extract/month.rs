//! Pay-period month extraction

use super::patterns::PERIOD_PATTERN;
use super::{MatchSource, RecordText, Strategy};

pub const MONTH_PLACEHOLDER: &str = "MONTH_UNKNOWN";

/// Spanish month names, indexed by month number - 1
pub const MONTH_NAMES: [&str; 12] = [
    "ENERO",
    "FEBRERO",
    "MARZO",
    "ABRIL",
    "MAYO",
    "JUNIO",
    "JULIO",
    "AGOSTO",
    "SEPTIEMBRE",
    "OCTUBRE",
    "NOVIEMBRE",
    "DICIEMBRE",
];

pub(crate) const MONTH_CASCADE: &[Strategy] = &[Strategy {
    source: MatchSource::PeriodLabel,
    run: month_from_period_label,
}];

/// Map a numeric month (`"03"`, `"3"`) to its Spanish name
pub fn month_name(number: &str) -> Option<&'static str> {
    let n: usize = number.trim().parse().ok()?;
    if (1..=12).contains(&n) {
        Some(MONTH_NAMES[n - 1])
    } else {
        None
    }
}

/// First `Periodo desde DD/MM/YYYY` phrase with a valid month
fn month_from_period_label(record: &RecordText<'_>) -> Option<String> {
    for caps in PERIOD_PATTERN.captures_iter(record.text) {
        let raw = &caps[1];
        match month_name(raw) {
            Some(name) => return Some(name.to_string()),
            None => tracing::warn!(month = raw, "Malformed period date, month out of range"),
        }
    }
    None
}
