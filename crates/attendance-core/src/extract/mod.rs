//! Field extraction from a record's raw text
//!
//! Each field is recovered by a cascade: an ordered list of strategies,
//! most structured first. The first strategy producing a plausible value
//! wins; when none does, the field falls back to a deterministic
//! placeholder derived from the segment start.

pub mod id_code;
pub mod month;
pub mod name;
pub mod patterns;

use crate::config::{NameCaseStyle, SplitterConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub use id_code::{id_placeholder, normalize_id_code};
pub use month::{month_name, MONTH_PLACEHOLDER};
pub use name::{name_placeholder, normalize_name};

/// Which strategy produced a field value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    /// `Trabajador RUT: … Nombre: …` on one line
    CombinedPhrase,
    /// `Periodo desde DD/MM/YYYY`
    PeriodLabel,
    /// `Nombre: …`
    NameLabel,
    /// Code-shaped token anywhere in the text
    BareToken,
    /// Label word plus a code, possibly broken across two lines
    LabeledLine,
    /// Bare worker label followed by a `code - name` line
    LabelBlock,
    /// Uppercase lines following the identification code
    Positional,
    Placeholder,
}

impl MatchSource {
    pub fn confidence(self) -> Confidence {
        match self {
            MatchSource::CombinedPhrase | MatchSource::PeriodLabel => Confidence::High,
            MatchSource::NameLabel | MatchSource::LabeledLine | MatchSource::LabelBlock => {
                Confidence::Medium
            }
            MatchSource::BareToken | MatchSource::Positional => Confidence::Low,
            MatchSource::Placeholder => Confidence::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    None,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValue {
    pub value: String,
    pub source: MatchSource,
}

impl FieldValue {
    fn matched(value: String, source: MatchSource) -> Self {
        Self { value, source }
    }

    fn placeholder(value: String) -> Self {
        Self {
            value,
            source: MatchSource::Placeholder,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.source == MatchSource::Placeholder
    }

    pub fn confidence(&self) -> Confidence {
        self.source.confidence()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub month: FieldValue,
    pub id_code: FieldValue,
    pub full_name: FieldValue,
}

impl ExtractedFields {
    /// Weakest confidence across the three fields
    pub fn confidence(&self) -> Confidence {
        self.month
            .confidence()
            .min(self.id_code.confidence())
            .min(self.full_name.confidence())
    }
}

/// Raw text of one record plus the context strategies need
pub struct RecordText<'a> {
    pub text: &'a str,
    /// Trimmed, non-empty lines
    pub lines: Vec<&'a str>,
    pub exclusions: &'a HashSet<String>,
    /// Identification code already found, for positional name lookup
    pub id_hint: Option<String>,
}

impl<'a> RecordText<'a> {
    pub fn new(text: &'a str, exclusions: &'a HashSet<String>) -> Self {
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        Self {
            text,
            lines,
            exclusions,
            id_hint: None,
        }
    }

    /// A normalized code is acceptable unless it is on the exclusion list
    pub fn accepts(&self, code: &str) -> bool {
        !self.exclusions.contains(code)
    }
}

/// One step of a cascade
pub(crate) struct Strategy {
    pub source: MatchSource,
    pub run: fn(&RecordText<'_>) -> Option<String>,
}

/// Try strategies in order; the first value surviving `accept` wins.
///
/// `accept` normalizes a raw candidate or rejects it as implausible, in
/// which case the cascade moves on to the next strategy.
pub(crate) fn run_cascade<F>(
    strategies: &[Strategy],
    record: &RecordText<'_>,
    mut accept: F,
) -> Option<FieldValue>
where
    F: FnMut(String) -> Option<String>,
{
    strategies.iter().find_map(|strategy| {
        (strategy.run)(record)
            .and_then(&mut accept)
            .map(|value| FieldValue::matched(value, strategy.source))
    })
}

/// Configured extractor shared by all segments of a run
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    exclusions: HashSet<String>,
    name_case_style: NameCaseStyle,
}

impl FieldExtractor {
    pub fn new(config: &SplitterConfig) -> Self {
        Self {
            exclusions: config.normalized_exclusions(),
            name_case_style: config.name_case_style,
        }
    }

    pub fn extract(&self, raw_text: &str, segment_start: usize) -> ExtractedFields {
        let mut record = RecordText::new(raw_text, &self.exclusions);

        let month = run_cascade(month::MONTH_CASCADE, &record, Some)
            .unwrap_or_else(|| FieldValue::placeholder(MONTH_PLACEHOLDER.to_string()));

        let id_code = run_cascade(id_code::ID_CASCADE, &record, Some)
            .unwrap_or_else(|| FieldValue::placeholder(id_placeholder(segment_start)));

        if !id_code.is_placeholder() {
            record.id_hint = Some(id_code.value.clone());
        }

        let full_name = run_cascade(name::NAME_CASCADE, &record, |raw| {
            normalize_name(&raw, self.name_case_style)
        })
        .unwrap_or_else(|| FieldValue::placeholder(name_placeholder(segment_start)));

        tracing::debug!(
            segment_start,
            month = %month.value,
            month_source = ?month.source,
            id_code = %id_code.value,
            id_source = ?id_code.source,
            name = %full_name.value,
            name_source = ?full_name.source,
            "Extracted record fields"
        );

        ExtractedFields {
            month,
            id_code,
            full_name,
        }
    }
}
