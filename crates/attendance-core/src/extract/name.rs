//! Worker name extraction and normalization

use super::id_code::{code_tokens, normalize_id_code};
use super::patterns::{
    BARE_WORKER_LABEL, CODE_THEN_NAME, COMBINED_PATTERN, NAME_LABEL_PATTERN,
    NAME_THEN_CODE, NON_NAME_LABEL, UPPERCASE_NAME_LINE,
};
use super::{MatchSource, RecordText, Strategy};
use crate::config::NameCaseStyle;

/// Lines scanned after the identification code by the positional fallback
pub const POSITIONAL_WINDOW: usize = 4;

pub(crate) const NAME_CASCADE: &[Strategy] = &[
    Strategy {
        source: MatchSource::CombinedPhrase,
        run: name_from_combined_phrase,
    },
    Strategy {
        source: MatchSource::NameLabel,
        run: name_from_label,
    },
    Strategy {
        source: MatchSource::LabelBlock,
        run: name_from_label_block,
    },
    Strategy {
        source: MatchSource::Positional,
        run: name_from_position,
    },
];

pub fn name_placeholder(segment_start: usize) -> String {
    format!("NAME_UNKNOWN_{}", segment_start)
}

/// Collapse whitespace, drop punctuation and apply the case style.
///
/// Returns `None` when nothing letter-like survives.
pub fn normalize_name(raw: &str, style: NameCaseStyle) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    let words: Vec<String> = cleaned
        .split_whitespace()
        .map(|word| match style {
            NameCaseStyle::Upper => word.to_uppercase(),
            NameCaseStyle::Title => title_case(word),
        })
        .collect();

    let name = words.join(" ");
    if name.chars().any(char::is_alphabetic) {
        Some(name)
    } else {
        None
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn plausible(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.chars().any(char::is_alphabetic) {
        Some(trimmed.to_string())
    } else {
        None
    }
}

fn name_from_combined_phrase(record: &RecordText<'_>) -> Option<String> {
    COMBINED_PATTERN
        .captures_iter(record.text)
        .filter(|caps| record.accepts(&normalize_id_code(&caps[1])))
        .find_map(|caps| plausible(&caps[2]))
}

fn name_from_label(record: &RecordText<'_>) -> Option<String> {
    NAME_LABEL_PATTERN
        .captures_iter(record.text)
        .find_map(|caps| plausible(&caps[1]))
}

/// `TRABAJADOR` alone on a line, then `<code> - <name>` on the next
fn name_from_label_block(record: &RecordText<'_>) -> Option<String> {
    let lines = &record.lines;
    for (i, line) in lines.iter().enumerate() {
        if !BARE_WORKER_LABEL.is_match(line) {
            continue;
        }
        let Some(next) = lines.get(i + 1) else {
            continue;
        };

        let split = CODE_THEN_NAME
            .captures(next)
            .map(|caps| (caps[1].to_string(), caps[2].to_string()))
            .or_else(|| {
                NAME_THEN_CODE
                    .captures(next)
                    .map(|caps| (caps[2].to_string(), caps[1].to_string()))
            });

        if let Some((code, name)) = split {
            if !record.accepts(&normalize_id_code(&code)) {
                continue;
            }
            if let Some(name) = plausible(&name) {
                return Some(name);
            }
        }
    }
    None
}

/// Uppercase lines following the line that carries the matched code
fn name_from_position(record: &RecordText<'_>) -> Option<String> {
    let id = record.id_hint.as_deref()?;
    let lines = &record.lines;
    let code_line = lines.iter().position(|line| {
        code_tokens(line).any(|token| normalize_id_code(token) == id)
    })?;

    let mut parts: Vec<&str> = Vec::new();
    for line in lines.iter().skip(code_line + 1).take(POSITIONAL_WINDOW) {
        if NON_NAME_LABEL.is_match(line) {
            break;
        }
        if UPPERCASE_NAME_LINE.is_match(line) {
            parts.push(line);
        } else if !parts.is_empty() {
            break;
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn test_normalize_upper() {
        assert_eq!(
            normalize_name("  Juan   Pérez,  Soto. ", NameCaseStyle::Upper).as_deref(),
            Some("JUAN PÉREZ SOTO")
        );
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(
            normalize_name("MARÍA JOSÉ o'higgins", NameCaseStyle::Title).as_deref(),
            Some("María José Ohiggins")
        );
    }

    #[test]
    fn test_normalize_rejects_punctuation_only() {
        assert_eq!(normalize_name(" -- : ", NameCaseStyle::Upper), None);
        assert_eq!(normalize_name("1234", NameCaseStyle::Upper), None);
    }

    #[test]
    fn test_combined_phrase_name() {
        let none = HashSet::new();
        let record = RecordText::new("Trabajador RUT: 12.599.237-4 Nombre: Juan Perez\n", &none);
        assert_eq!(name_from_combined_phrase(&record).as_deref(), Some("Juan Perez"));
    }

    #[test]
    fn test_combined_phrase_ignores_excluded_code() {
        let employer: HashSet<String> = ["12599237-4".to_string()].into_iter().collect();
        let record = RecordText::new("Trabajador RUT: 12.599.237-4 Nombre: Juan Perez", &employer);
        assert_eq!(name_from_combined_phrase(&record), None);
    }

    #[test]
    fn test_name_label() {
        let none = HashSet::new();
        let record = RecordText::new("RUT 12.599.237-4\nNombre:   ANA SOTO\nCargo: Operaria", &none);
        assert_eq!(name_from_label(&record).as_deref(), Some("ANA SOTO"));
    }

    #[test]
    fn test_name_label_skips_empty_value() {
        let none = HashSet::new();
        let record = RecordText::new("Nombre:\nNombre: ANA SOTO", &none);
        assert_eq!(name_from_label(&record).as_deref(), Some("ANA SOTO"));
    }

    #[test]
    fn test_label_block_code_first() {
        let none = HashSet::new();
        let record = RecordText::new("EMPRESA LTDA\nTRABAJADOR\n12.599.237-4 - JUAN PEREZ\n", &none);
        assert_eq!(name_from_label_block(&record).as_deref(), Some("JUAN PEREZ"));
    }

    #[test]
    fn test_label_block_name_first() {
        let none = HashSet::new();
        let record = RecordText::new("Empleado:\nANA SOTO - 9.876.543-2", &none);
        assert_eq!(name_from_label_block(&record).as_deref(), Some("ANA SOTO"));
    }

    #[test]
    fn test_positional_collects_multiline_name() {
        let none = HashSet::new();
        let mut record = RecordText::new(
            "RUT 12.599.237-4\nJUAN ANDRÉS\nPÉREZ SOTO\nDEPARTAMENTO VENTAS",
            &none,
        );
        record.id_hint = Some("12599237-4".to_string());
        assert_eq!(name_from_position(&record).as_deref(), Some("JUAN ANDRÉS PÉREZ SOTO"));
    }

    #[test]
    fn test_positional_stops_at_label() {
        let none = HashSet::new();
        let mut record = RecordText::new("12.599.237-4\nSUCURSAL\nJUAN PEREZ", &none);
        record.id_hint = Some("12599237-4".to_string());
        assert_eq!(name_from_position(&record), None);
    }

    #[test]
    fn test_positional_window_is_bounded() {
        let none = HashSet::new();
        let mut record = RecordText::new("12.599.237-4\n1\n2\n3\n4\nJUAN PEREZ", &none);
        record.id_hint = Some("12599237-4".to_string());
        assert_eq!(name_from_position(&record), None);
    }

    #[test]
    fn test_positional_needs_id() {
        let none = HashSet::new();
        let record = RecordText::new("12.599.237-4\nJUAN PEREZ", &none);
        assert_eq!(name_from_position(&record), None);
    }
}
