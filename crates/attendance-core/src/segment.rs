//! Positional record segmentation
//!
//! Record boundaries in attendance books follow a fixed page-count
//! convention, so segmentation never looks at page content.

use crate::config::SegmentationMode;
use serde::{Deserialize, Serialize};

/// Contiguous, inclusive range of 0-indexed pages holding one worker record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
}

impl Segment {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn single(page: usize) -> Self {
        Self::new(page, page)
    }

    pub fn page_count(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn pages(&self) -> std::ops::RangeInclusive<usize> {
        self.start..=self.end
    }

    /// 1-indexed page numbers, as used by lopdf and shown to users
    pub fn page_numbers(&self) -> Vec<u32> {
        self.pages().map(|p| p as u32 + 1).collect()
    }
}

/// Partition `page_count` pages into ordered, non-overlapping segments
pub fn segment(page_count: usize, mode: SegmentationMode, stride_offset: usize) -> Vec<Segment> {
    match mode {
        SegmentationMode::Paired => (0..page_count)
            .step_by(2)
            .map(|start| Segment::new(start, (start + 1).min(page_count - 1)))
            .collect(),
        SegmentationMode::SingleStride => (stride_offset..page_count)
            .step_by(2)
            .map(Segment::single)
            .collect(),
    }
}
