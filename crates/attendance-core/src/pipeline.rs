//! Run orchestration: segment, extract, name, slice, package
//!
//! A run is split in two steps mirroring the review flow: [`Splitter::plan`]
//! produces the preview listing without touching page content beyond text,
//! and [`Splitter::build_archive`] slices and packages the planned records.

use crate::archive;
use crate::config::SplitterConfig;
use crate::document::{PageSource, PdfDocument};
use crate::error::SplitError;
use crate::extract::{Confidence, ExtractedFields, FieldExtractor, MatchSource};
use crate::filename::{build_filename, FilenameRegistry};
use crate::segment::{segment, Segment};
use serde::Serialize;

/// Separator placed between page texts of one segment
pub const PAGE_SEPARATOR: &str = "\n";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRecord {
    pub filename: String,
    pub segment: Segment,
    pub fields: ExtractedFields,
    /// Filename received a numeric suffix to stay unique
    pub renamed: bool,
}

/// One row of the review table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewRow {
    /// 1-indexed first page of the record
    pub start_page: usize,
    pub month: String,
    pub id_code: String,
    pub name: String,
    pub filename: String,
    pub month_source: MatchSource,
    pub id_source: MatchSource,
    pub name_source: MatchSource,
    pub confidence: Confidence,
    pub renamed: bool,
}

impl From<&OutputRecord> for PreviewRow {
    fn from(record: &OutputRecord) -> Self {
        Self {
            start_page: record.segment.start + 1,
            month: record.fields.month.value.clone(),
            id_code: record.fields.id_code.value.clone(),
            name: record.fields.full_name.value.clone(),
            filename: record.filename.clone(),
            month_source: record.fields.month.source,
            id_source: record.fields.id_code.source,
            name_source: record.fields.full_name.source,
            confidence: record.fields.confidence(),
            renamed: record.renamed,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total_pages: usize,
    pub segments: usize,
    pub records: usize,
    /// Segments with no usable text on any page
    pub skipped_empty: usize,
    /// Start pages (1-indexed) of segments dropped by strict mode
    pub skipped_strict: Vec<usize>,
    pub pages_without_text: usize,
    pub collisions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitPlan {
    pub records: Vec<OutputRecord>,
    pub summary: RunSummary,
}

impl SplitPlan {
    pub fn preview(&self) -> Vec<PreviewRow> {
        self.records.iter().map(PreviewRow::from).collect()
    }
}

pub struct SplitOutput {
    pub plan: SplitPlan,
    pub archive: Vec<u8>,
}

pub struct Splitter {
    config: SplitterConfig,
    extractor: FieldExtractor,
}

impl Splitter {
    pub fn new(config: SplitterConfig) -> Result<Self, SplitError> {
        config.validate()?;
        let extractor = FieldExtractor::new(&config);
        Ok(Self { config, extractor })
    }

    /// Extract fields for every segment and assign unique filenames
    pub fn plan(&self, source: &dyn PageSource) -> SplitPlan {
        let total_pages = source.page_count();
        let segments = segment(
            total_pages,
            self.config.segmentation_mode,
            self.config.stride_offset,
        );

        let mut summary = RunSummary {
            total_pages,
            segments: segments.len(),
            ..RunSummary::default()
        };
        let mut registry = FilenameRegistry::new();
        let mut records = Vec::with_capacity(segments.len());

        for seg in segments {
            let (raw_text, missing) = segment_text(source, seg);
            summary.pages_without_text += missing;

            if raw_text.trim().is_empty() {
                tracing::debug!(start = seg.start, end = seg.end, "Skipping segment without text");
                summary.skipped_empty += 1;
                continue;
            }

            let fields = self.extractor.extract(&raw_text, seg.start);

            if self.config.strict_mode && fields.id_code.is_placeholder() {
                tracing::warn!(
                    start_page = seg.start + 1,
                    "Strict mode: no identification code, skipping record"
                );
                summary.skipped_strict.push(seg.start + 1);
                continue;
            }

            let (filename, renamed) = registry.claim(build_filename(&fields));
            if renamed {
                tracing::info!(%filename, start_page = seg.start + 1, "Resolved filename collision");
                summary.collisions += 1;
            }

            records.push(OutputRecord {
                filename,
                segment: seg,
                fields,
                renamed,
            });
        }

        summary.records = records.len();
        tracing::info!(
            total_pages = summary.total_pages,
            segments = summary.segments,
            records = summary.records,
            skipped_empty = summary.skipped_empty,
            skipped_strict = summary.skipped_strict.len(),
            collisions = summary.collisions,
            "Planned split"
        );

        SplitPlan { records, summary }
    }

    /// Slice every planned record and seal them into one archive.
    ///
    /// Any slicing failure aborts the whole archive.
    pub fn build_archive(
        &self,
        source: &dyn PageSource,
        plan: &SplitPlan,
    ) -> Result<Vec<u8>, SplitError> {
        let mut entries = Vec::with_capacity(plan.records.len());
        for record in &plan.records {
            let bytes = source.slice(record.segment)?;
            entries.push((record.filename.as_str(), bytes));
        }

        archive::build_archive(
            entries
                .iter()
                .map(|(name, bytes)| (*name, bytes.as_slice())),
        )
    }

    /// Load `pdf_bytes`, plan, and package in one call
    pub fn run(&self, pdf_bytes: &[u8]) -> Result<SplitOutput, SplitError> {
        let document = PdfDocument::load(pdf_bytes)?;
        tracing::info!(pages = document.page_count(), "Loaded document");

        let plan = self.plan(&document);
        let archive = self.build_archive(&document, &plan)?;
        Ok(SplitOutput { plan, archive })
    }
}

/// Concatenated text of a segment's pages and the number of pages whose
/// text could not be read
fn segment_text(source: &dyn PageSource, seg: Segment) -> (String, usize) {
    let mut missing = 0;
    let mut pages = Vec::with_capacity(seg.page_count());

    for index in seg.pages() {
        match source.page_text(index) {
            Ok(text) if !text.trim().is_empty() => pages.push(text),
            Ok(_) => missing += 1,
            Err(e) => {
                tracing::warn!(page = index + 1, error = %e, "Page text unavailable");
                missing += 1;
            }
        }
    }

    (pages.join(PAGE_SEPARATOR), missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SegmentationMode;
    use pretty_assertions::assert_eq;

    /// In-memory pages; slicing returns the page indices as bytes
    struct FakeSource {
        pages: Vec<Option<&'static str>>,
    }

    impl PageSource for FakeSource {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn page_text(&self, index: usize) -> Result<String, SplitError> {
            self.pages[index]
                .map(str::to_string)
                .ok_or_else(|| SplitError::OperationError("garbled".into()))
        }

        fn slice(&self, segment: Segment) -> Result<Vec<u8>, SplitError> {
            Ok(segment.pages().map(|p| p as u8).collect())
        }
    }

    const JUAN: &str = "Periodo desde 01/03/2025\nTrabajador RUT: 12.599.237-4 Nombre: Juan Perez";
    const ANA: &str = "Periodo desde 01/03/2025\nTrabajador RUT: 98.765.432-1 Nombre: Ana Soto";

    fn splitter(config: SplitterConfig) -> Splitter {
        Splitter::new(config).unwrap()
    }

    #[test]
    fn test_plan_paired_records() {
        let source = FakeSource {
            pages: vec![Some(JUAN), Some("firma"), Some(ANA), Some("firma")],
        };
        let plan = splitter(SplitterConfig::default()).plan(&source);

        let names: Vec<&str> = plan.records.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "ASISTENCIA_MARZO_12599237-4_JUAN_PEREZ.pdf",
                "ASISTENCIA_MARZO_98765432-1_ANA_SOTO.pdf",
            ]
        );
        let preview = plan.preview();
        assert_eq!(preview[0].start_page, 1);
        assert_eq!(preview[1].start_page, 3);
        assert_eq!(plan.summary.records, 2);
    }

    #[test]
    fn test_empty_segments_are_skipped() {
        let source = FakeSource {
            pages: vec![Some(JUAN), Some(""), Some("  "), None],
        };
        let plan = splitter(SplitterConfig::default()).plan(&source);
        assert_eq!(plan.records.len(), 1);
        assert_eq!(plan.summary.skipped_empty, 1);
        assert_eq!(plan.summary.pages_without_text, 3);
    }

    #[test]
    fn test_placeholder_record_when_no_code() {
        let source = FakeSource {
            pages: vec![Some(JUAN), None, Some("Periodo desde 01/03/2025\nsin datos"), None],
        };
        let plan = splitter(SplitterConfig::default()).plan(&source);
        assert_eq!(plan.records.len(), 2);
        assert_eq!(
            plan.records[1].filename,
            "ASISTENCIA_MARZO_ID_UNKNOWN_2_NAME_UNKNOWN_2.pdf"
        );
    }

    #[test]
    fn test_strict_mode_skips_and_reports() {
        let source = FakeSource {
            pages: vec![Some("sin datos"), None, Some(ANA), None],
        };
        let config = SplitterConfig {
            strict_mode: true,
            ..SplitterConfig::default()
        };
        let plan = splitter(config).plan(&source);
        assert_eq!(plan.records.len(), 1);
        assert_eq!(plan.summary.skipped_strict, vec![1]);
    }

    #[test]
    fn test_collisions_get_suffix() {
        let source = FakeSource {
            pages: vec![Some(JUAN), None, Some(JUAN), None],
        };
        let s = splitter(SplitterConfig::default());
        let plan = s.plan(&source);
        assert_eq!(
            plan.records[1].filename,
            "ASISTENCIA_MARZO_12599237-4_JUAN_PEREZ_2.pdf"
        );
        assert!(plan.records[1].renamed);
        assert!(plan.preview()[1].renamed);
        assert_eq!(plan.summary.collisions, 1);

        let archive = s.build_archive(&source, &plan).unwrap();
        assert!(!archive.is_empty());
    }

    #[test]
    fn test_single_stride_mode() {
        let source = FakeSource {
            pages: vec![Some("firma"), Some(JUAN), Some("firma"), Some(ANA)],
        };
        let config = SplitterConfig {
            segmentation_mode: SegmentationMode::SingleStride,
            stride_offset: 1,
            ..SplitterConfig::default()
        };
        let plan = splitter(config).plan(&source);
        let segments: Vec<Segment> = plan.records.iter().map(|r| r.segment).collect();
        assert_eq!(segments, vec![Segment::single(1), Segment::single(3)]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = SplitterConfig::default();
        config.employer_id_exclusion_list.insert("nope".into());
        assert!(Splitter::new(config).is_err());
    }
}
