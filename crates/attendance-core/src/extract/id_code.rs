//! Identification code extraction
//!
//! Every candidate is normalized and checked against the employer exclusion
//! list before it is accepted; a rejected candidate lets the cascade move on
//! to the next occurrence or strategy.

use super::patterns::{COMBINED_PATTERN, ID_CODE_EXACT, ID_CODE_PATTERN, ID_LABEL_WORD};
use super::{MatchSource, RecordText, Strategy};

pub(crate) const ID_CASCADE: &[Strategy] = &[
    Strategy {
        source: MatchSource::CombinedPhrase,
        run: id_from_combined_phrase,
    },
    Strategy {
        source: MatchSource::BareToken,
        run: id_from_bare_token,
    },
    Strategy {
        source: MatchSource::LabeledLine,
        run: id_from_labeled_line,
    },
];

pub fn id_placeholder(segment_start: usize) -> String {
    format!("ID_UNKNOWN_{}", segment_start)
}

/// Strip thousands separators and uppercase the check character
pub fn normalize_id_code(raw: &str) -> String {
    raw.trim().replace('.', "").to_uppercase()
}

pub fn is_code_shaped(raw: &str) -> bool {
    ID_CODE_EXACT.is_match(raw.trim())
}

/// Raw code-shaped tokens in `haystack`, in order
pub(crate) fn code_tokens(haystack: &str) -> impl Iterator<Item = &str> {
    ID_CODE_PATTERN
        .captures_iter(haystack)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// First code-shaped token in `haystack` that is not excluded
pub(crate) fn first_accepted_code(record: &RecordText<'_>, haystack: &str) -> Option<String> {
    code_tokens(haystack)
        .map(normalize_id_code)
        .find(|code| record.accepts(code))
}

fn id_from_combined_phrase(record: &RecordText<'_>) -> Option<String> {
    COMBINED_PATTERN
        .captures_iter(record.text)
        .map(|caps| normalize_id_code(&caps[1]))
        .find(|code| record.accepts(code))
}

fn id_from_bare_token(record: &RecordText<'_>) -> Option<String> {
    first_accepted_code(record, record.text)
}

/// A label line whose code may have been broken across the line break
fn id_from_labeled_line(record: &RecordText<'_>) -> Option<String> {
    let lines = &record.lines;
    for (i, line) in lines.iter().enumerate() {
        if !ID_LABEL_WORD.is_match(line) {
            continue;
        }
        if let Some(code) = first_accepted_code(record, line) {
            return Some(code);
        }
        if let Some(next) = lines.get(i + 1) {
            let joined = format!("{}{}", line, next);
            if let Some(code) = first_accepted_code(record, &joined) {
                return Some(code);
            }
        }
    }
    None
}
