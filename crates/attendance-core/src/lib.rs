//! Attendance book splitting
//!
//! Splits a multi-page attendance-book PDF into one file per worker,
//! named after the pay-period month, the worker's identification code and
//! their full name, and packages the results into a ZIP archive.
//!
//! - [`segment`]: positional grouping of pages into worker records
//! - [`extract`]: strategy cascades recovering month, id code and name
//! - [`pipeline::Splitter`]: preview planning and archive assembly

pub mod archive;
pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod filename;
pub mod pipeline;
pub mod segment;
mod text;

pub use archive::{build_archive, write_archive, DEFAULT_ARCHIVE_NAME};
pub use config::{NameCaseStyle, SegmentationMode, SplitterConfig};
pub use document::{PageSource, PdfDocument};
pub use error::SplitError;
pub use extract::{Confidence, ExtractedFields, FieldExtractor, FieldValue, MatchSource};
pub use filename::build_filename;
pub use pipeline::{OutputRecord, PreviewRow, RunSummary, SplitOutput, SplitPlan, Splitter};
pub use segment::Segment;
