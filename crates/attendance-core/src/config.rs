//! Run configuration
//!
//! Every option has a default so partial JSON files deserialize cleanly.

use crate::error::SplitError;
use crate::extract::id_code::{is_code_shaped, normalize_id_code};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::str::FromStr;

/// How pages are grouped into worker records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SegmentationMode {
    /// Consecutive page pairs: detail page + signature page
    #[default]
    Paired,
    /// One page every two, starting at `stride_offset`
    SingleStride,
}

impl FromStr for SegmentationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "paired" => Ok(Self::Paired),
            "single-stride" => Ok(Self::SingleStride),
            other => Err(format!(
                "unknown segmentation mode '{}' (expected paired or single-stride)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NameCaseStyle {
    #[default]
    Upper,
    Title,
}

impl FromStr for NameCaseStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "upper" => Ok(Self::Upper),
            "title" => Ok(Self::Title),
            other => Err(format!(
                "unknown name case style '{}' (expected upper or title)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterConfig {
    pub segmentation_mode: SegmentationMode,
    pub stride_offset: usize,
    /// Identification codes that never identify a worker (e.g. the employer's)
    pub employer_id_exclusion_list: BTreeSet<String>,
    /// Skip records whose identification code could not be found
    pub strict_mode: bool,
    pub name_case_style: NameCaseStyle,
}

impl SplitterConfig {
    pub fn from_json(json: &str) -> Result<Self, SplitError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SplitError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, SplitError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            SplitError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), SplitError> {
        for code in &self.employer_id_exclusion_list {
            if !is_code_shaped(code) {
                return Err(SplitError::ConfigError(format!(
                    "excluded id '{}' is not a valid identification code",
                    code
                )));
            }
        }
        Ok(())
    }

    /// Exclusion list in the same normalized form the extractor produces
    pub fn normalized_exclusions(&self) -> HashSet<String> {
        self.employer_id_exclusion_list
            .iter()
            .map(|code| normalize_id_code(code))
            .collect()
    }
}
