//! PDF access: per-page text and page-range slicing
//!
//! The pipeline only talks to [`PageSource`]; [`PdfDocument`] is the lopdf
//! backed implementation.

use crate::error::SplitError;
use crate::segment::Segment;
use crate::text;
use lopdf::{Document, ObjectId};
use std::collections::{BTreeMap, HashSet};

/// Read access to an ordered sequence of pages (0-indexed)
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Visible text of one page, best-effort. An `Err` means the page text
    /// is unavailable; callers treat it as an empty page.
    fn page_text(&self, index: usize) -> Result<String, SplitError>;

    /// New standalone PDF holding exactly the pages of `segment`
    fn slice(&self, segment: Segment) -> Result<Vec<u8>, SplitError>;
}

/// Parsed PDF, loaded once per run
pub struct PdfDocument {
    doc: Document,
    pages: BTreeMap<u32, ObjectId>,
}

impl PdfDocument {
    pub fn load(bytes: &[u8]) -> Result<Self, SplitError> {
        let doc =
            Document::load_mem(bytes).map_err(|e| SplitError::DocumentUnreadable(e.to_string()))?;
        let pages = doc.get_pages();
        Ok(Self { doc, pages })
    }

    fn page_id(&self, index: usize) -> Result<ObjectId, SplitError> {
        self.pages
            .get(&(index as u32 + 1))
            .copied()
            .ok_or_else(|| {
                SplitError::InvalidRange(format!(
                    "Page {} does not exist (document has {} pages)",
                    index + 1,
                    self.pages.len()
                ))
            })
    }
}

impl PageSource for PdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Result<String, SplitError> {
        let page_id = self.page_id(index)?;
        text::page_text(&self.doc, page_id)
    }

    /// Keeps only the segment's pages, then drops unreferenced objects
    fn slice(&self, segment: Segment) -> Result<Vec<u8>, SplitError> {
        let page_count = self.pages.len();
        if segment.end >= page_count {
            return Err(SplitError::InvalidRange(format!(
                "Segment {}-{} exceeds document ({} pages)",
                segment.start + 1,
                segment.end + 1,
                page_count
            )));
        }

        let keep: HashSet<u32> = segment.page_numbers().into_iter().collect();
        let mut to_delete: Vec<u32> = (1..=page_count as u32)
            .filter(|p| !keep.contains(p))
            .collect();

        let mut new_doc = self.doc.clone();

        // Delete in reverse order to keep page numbers stable
        to_delete.reverse();
        for page_number in to_delete {
            new_doc.delete_pages(&[page_number]);
        }

        new_doc.prune_objects();
        new_doc.compress();

        let mut buffer = Vec::new();
        new_doc
            .save_to(&mut buffer)
            .map_err(|e| SplitError::OperationError(format!("Save failed: {}", e)))?;

        Ok(buffer)
    }
}
