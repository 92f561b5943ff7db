//! Accelerable segments: instruction sub-ranges of a cloudlet.

use crate::kind::AcceleratorType;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use vfab_common::{CloudletId, SegmentId, SimTime};

/// Longest segment, in MI, whose instruction count fits in a `u64`.
pub const MAX_SEGMENT_LENGTH: u64 = u64::MAX / 1_000_000;

/// A contiguous instruction range `[index, index + length)` of one cloudlet,
/// tagged with the accelerator type that can run it.
///
/// Lengths are in millions of instructions (MI).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccelerableSegment {
    id: SegmentId,
    cloudlet: CloudletId,
    index: u64,
    length: u64,
    kind: AcceleratorType,
    finished_length_so_far: u64,
    started_at: Option<SimTime>,
    finished_at: Option<SimTime>,
}

impl AccelerableSegment {
    /// Creates an unstarted segment.
    pub fn new(
        id: SegmentId,
        cloudlet: CloudletId,
        index: u64,
        length: u64,
        kind: AcceleratorType,
    ) -> Self {
        Self {
            id,
            cloudlet,
            index,
            length,
            kind,
            finished_length_so_far: 0,
            started_at: None,
            finished_at: None,
        }
    }

    /// Returns the segment id (unique within its cloudlet).
    pub fn id(&self) -> SegmentId {
        self.id
    }

    /// Returns the owning cloudlet.
    pub fn cloudlet(&self) -> CloudletId {
        self.cloudlet
    }

    /// Returns `"<segment>-<cloudlet>"`, unique across cloudlets.
    pub fn unique_id(&self) -> String {
        format!("{}-{}", self.id, self.cloudlet)
    }

    /// Returns the first instruction index.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Returns the length in MI.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Returns the instruction range covered.
    pub fn range(&self) -> Range<u64> {
        self.index..self.index.saturating_add(self.length)
    }

    /// Returns `true` if the two ranges share at least one instruction.
    pub fn overlaps(&self, other: &AccelerableSegment) -> bool {
        let (a, b) = (self.range(), other.range());
        a.start < b.end && b.start < a.end
    }

    /// Returns the required accelerator type.
    pub fn kind(&self) -> AcceleratorType {
        self.kind
    }

    /// Returns the MI completed so far.
    pub fn finished_length_so_far(&self) -> u64 {
        self.finished_length_so_far
    }

    /// Returns `true` once all of a non-empty segment has run.
    pub fn is_finished(&self) -> bool {
        self.length > 0 && self.finished_length_so_far >= self.length
    }

    /// Returns when execution started, if it has.
    pub fn started_at(&self) -> Option<SimTime> {
        self.started_at
    }

    /// Returns when execution finished, if it has.
    pub fn finished_at(&self) -> Option<SimTime> {
        self.finished_at
    }

    /// Records progress, never exceeding the segment length.
    pub fn set_finished_length(&mut self, finished: u64) {
        self.finished_length_so_far = finished.min(self.length);
    }

    /// Records the start of execution.
    pub fn mark_started(&mut self, at: SimTime) {
        self.started_at = Some(at);
    }

    /// Marks the segment fully executed at `at`.
    pub fn mark_finished(&mut self, at: SimTime) {
        self.finished_length_so_far = self.length;
        self.finished_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(id: u32, index: u64, length: u64) -> AccelerableSegment {
        AccelerableSegment::new(
            SegmentId::from_raw(id),
            CloudletId::from_raw(9),
            index,
            length,
            AcceleratorType::Fft,
        )
    }

    #[test]
    fn unique_id_joins_segment_and_cloudlet() {
        assert_eq!(seg(2, 0, 1).unique_id(), "2-9");
    }

    #[test]
    fn overlap_is_half_open() {
        assert!(seg(0, 0, 10).overlaps(&seg(1, 5, 10)));
        assert!(seg(1, 5, 10).overlaps(&seg(0, 0, 10)));
        assert!(!seg(0, 0, 10).overlaps(&seg(1, 10, 5)));
        assert!(seg(0, 0, 10).overlaps(&seg(1, 2, 3)));
    }

    #[test]
    fn progress_is_clamped_to_length() {
        let mut s = seg(0, 0, 10);
        s.set_finished_length(25);
        assert_eq!(s.finished_length_so_far(), 10);
        assert!(s.is_finished());
    }

    #[test]
    fn empty_segment_is_never_finished() {
        let s = seg(0, 0, 0);
        assert!(!s.is_finished());
    }

    #[test]
    fn mark_finished_fills_length() {
        let mut s = seg(0, 0, 48);
        s.mark_started(SimTime::ZERO);
        s.mark_finished(SimTime::from_secs(1.0));
        assert_eq!(s.finished_length_so_far(), 48);
        assert_eq!(s.finished_at(), Some(SimTime::from_secs(1.0)));
    }
}
