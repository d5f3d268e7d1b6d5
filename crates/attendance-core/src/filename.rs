//! Output filename construction and collision handling

use crate::extract::ExtractedFields;
use std::collections::{HashMap, HashSet};

pub const FILENAME_PREFIX: &str = "ASISTENCIA";
pub const FILENAME_EXTENSION: &str = ".pdf";

/// Characters never allowed in archive entry names
pub const ILLEGAL_CHARS: &[char] = &['\\', '/', ':', '"', '*', '?', '<', '>', '|'];

/// `ASISTENCIA_<MONTH>_<ID_CODE>_<NAME>.pdf`, whitespace as underscores and
/// illegal characters removed. Total: placeholders keep it non-empty.
pub fn build_filename(fields: &ExtractedFields) -> String {
    let stem = format!(
        "{}_{}_{}_{}",
        FILENAME_PREFIX, fields.month.value, fields.id_code.value, fields.full_name.value
    );
    format!("{}{}", sanitize(&stem), FILENAME_EXTENSION)
}

fn sanitize(stem: &str) -> String {
    stem.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| !ILLEGAL_CHARS.contains(c) && !c.is_control())
        .collect()
}

/// Hands out unique filenames within one run.
///
/// The first occurrence keeps its name; later ones get `_2`, `_3`, …
/// inserted before the extension.
#[derive(Debug, Default)]
pub struct FilenameRegistry {
    used: HashSet<String>,
    next_suffix: HashMap<String, usize>,
}

impl FilenameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the unique name and whether it had to be changed
    pub fn claim(&mut self, filename: String) -> (String, bool) {
        if self.used.insert(filename.clone()) {
            return (filename, false);
        }

        let stem = filename
            .strip_suffix(FILENAME_EXTENSION)
            .unwrap_or(&filename)
            .to_string();
        let suffix = self.next_suffix.entry(filename.clone()).or_insert(2);
        loop {
            let candidate = format!("{}_{}{}", stem, suffix, FILENAME_EXTENSION);
            *suffix += 1;
            if self.used.insert(candidate.clone()) {
                return (candidate, true);
            }
        }
    }
}
