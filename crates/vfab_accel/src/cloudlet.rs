//! Cloudlets with accelerable segments.

use crate::error::WorkloadError;
use crate::kind::AcceleratorType;
use crate::segment::{AccelerableSegment, MAX_SEGMENT_LENGTH};
use serde::{Deserialize, Serialize};
use vfab_common::{CloudletId, IdGenerator, SegmentId, SimTime};

/// A VM workload of `length` MI, parts of which may be offloaded.
///
/// Segments never overlap; the remainder of the instruction range is the
/// non-accelerable part and runs on the VM's CPU.
#[derive(Debug, Clone)]
pub struct AccelerableCloudlet {
    id: CloudletId,
    length: u64,
    segments: Vec<AccelerableSegment>,
    segment_ids: IdGenerator<SegmentId>,
}

impl AccelerableCloudlet {
    /// Creates a cloudlet with no segments.
    pub fn new(id: CloudletId, length: u64) -> Self {
        Self {
            id,
            length,
            segments: Vec::new(),
            segment_ids: IdGenerator::default(),
        }
    }

    /// Returns the cloudlet id.
    pub fn id(&self) -> CloudletId {
        self.id
    }

    /// Returns the total length in MI.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Returns the segments in insertion order.
    pub fn segments(&self) -> &[AccelerableSegment] {
        &self.segments
    }

    /// Sum of all segment lengths.
    pub fn accelerable_length(&self) -> u64 {
        self.segments.iter().map(AccelerableSegment::length).sum()
    }

    /// Length of the part that always runs on the CPU.
    pub fn non_accelerable_length(&self) -> u64 {
        self.length.saturating_sub(self.accelerable_length())
    }

    /// Adds a new segment covering `[index, index + length)`.
    ///
    /// On failure the segment list is left unchanged.
    pub fn add_segment(
        &mut self,
        index: u64,
        length: u64,
        kind: AcceleratorType,
    ) -> Result<SegmentId, WorkloadError> {
        let id = SegmentId::from_raw(self.segment_ids.peek());
        self.insert_segment(AccelerableSegment::new(id, self.id, index, length, kind))?;
        self.segment_ids.next_id();
        Ok(id)
    }

    /// Inserts a prebuilt segment, rejecting duplicates, overlaps, and
    /// ranges past the end of the cloudlet.
    pub fn insert_segment(&mut self, segment: AccelerableSegment) -> Result<(), WorkloadError> {
        let cloudlet = self.id;
        if segment.cloudlet() != cloudlet {
            return Err(WorkloadError::WrongCloudlet {
                cloudlet,
                found: segment.cloudlet(),
            });
        }
        if segment.length() > MAX_SEGMENT_LENGTH {
            return Err(WorkloadError::TooLong {
                cloudlet,
                length: segment.length(),
                max: MAX_SEGMENT_LENGTH,
            });
        }
        let range = segment.range();
        if range.end > self.length {
            return Err(WorkloadError::OutOfRange {
                cloudlet,
                index: range.start,
                end: range.end,
                length: self.length,
            });
        }
        if self.segments.iter().any(|s| s.id() == segment.id()) {
            return Err(WorkloadError::DuplicateSegment {
                cloudlet,
                segment: segment.id(),
            });
        }
        if let Some(existing) = self.segments.iter().find(|s| s.overlaps(&segment)) {
            return Err(WorkloadError::Overlap {
                cloudlet,
                existing: existing.id(),
                index: range.start,
                end: range.end,
            });
        }
        if segment.id().as_raw() >= self.segment_ids.peek() {
            self.segment_ids = IdGenerator::starting_at(segment.id().as_raw() + 1);
        }
        self.segments.push(segment);
        Ok(())
    }

    /// Moves the segments out, leaving the cloudlet with none.
    pub fn take_segments(&mut self) -> Vec<AccelerableSegment> {
        std::mem::take(&mut self.segments)
    }
}

/// A cloudlet's reported execution window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CloudletSummary {
    /// The cloudlet.
    pub cloudlet: CloudletId,
    /// Total length in MI.
    pub length: u64,
    /// Earliest start over all parts.
    pub started_at: SimTime,
    /// Latest finish over all parts.
    pub finished_at: SimTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cloudlet() -> AccelerableCloudlet {
        AccelerableCloudlet::new(CloudletId::from_raw(0), 100)
    }

    #[test]
    fn overlapping_segment_is_rejected() {
        let mut c = cloudlet();
        c.add_segment(0, 10, AcceleratorType::Fft).unwrap();
        let err = c.add_segment(5, 10, AcceleratorType::Fft).unwrap_err();
        assert!(matches!(err, WorkloadError::Overlap { .. }));
        assert_eq!(c.segments().len(), 1);
    }

    #[test]
    fn segment_too_long_to_count_is_rejected() {
        let mut c = AccelerableCloudlet::new(CloudletId::from_raw(0), u64::MAX);
        let err = c
            .add_segment(0, MAX_SEGMENT_LENGTH + 1, AcceleratorType::Fft)
            .unwrap_err();
        assert!(matches!(err, WorkloadError::TooLong { .. }));
        assert!(c.segments().is_empty());
        c.add_segment(0, MAX_SEGMENT_LENGTH, AcceleratorType::Fft)
            .unwrap();
    }

    #[test]
    fn adjacent_segments_are_fine() {
        let mut c = cloudlet();
        let a = c.add_segment(0, 10, AcceleratorType::Fft).unwrap();
        let b = c.add_segment(10, 10, AcceleratorType::Encryption).unwrap();
        assert_ne!(a, b);
        assert_eq!(c.accelerable_length(), 20);
        assert_eq!(c.non_accelerable_length(), 80);
    }

    #[test]
    fn rejected_add_does_not_consume_an_id() {
        let mut c = cloudlet();
        c.add_segment(0, 10, AcceleratorType::Fft).unwrap();
        c.add_segment(5, 10, AcceleratorType::Fft).unwrap_err();
        let next = c.add_segment(20, 5, AcceleratorType::Fft).unwrap();
        assert_eq!(next.as_raw(), 1);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut c = cloudlet();
        let seg = AccelerableSegment::new(
            SegmentId::from_raw(3),
            c.id(),
            0,
            5,
            AcceleratorType::Fft,
        );
        c.insert_segment(seg.clone()).unwrap();
        let dup = AccelerableSegment::new(
            SegmentId::from_raw(3),
            c.id(),
            50,
            5,
            AcceleratorType::Fft,
        );
        assert!(matches!(
            c.insert_segment(dup),
            Err(WorkloadError::DuplicateSegment { .. })
        ));
        assert_eq!(c.add_segment(60, 1, AcceleratorType::Fft).unwrap().as_raw(), 4);
    }

    #[test]
    fn out_of_range_is_rejected() {
        let mut c = cloudlet();
        assert!(matches!(
            c.add_segment(95, 10, AcceleratorType::Fft),
            Err(WorkloadError::OutOfRange { .. })
        ));
    }

    #[test]
    fn foreign_segment_is_rejected() {
        let mut c = cloudlet();
        let seg = AccelerableSegment::new(
            SegmentId::from_raw(0),
            CloudletId::from_raw(7),
            0,
            5,
            AcceleratorType::Fft,
        );
        assert!(matches!(
            c.insert_segment(seg),
            Err(WorkloadError::WrongCloudlet { .. })
        ));
    }

    #[test]
    fn take_segments_empties_the_list() {
        let mut c = cloudlet();
        c.add_segment(0, 10, AcceleratorType::Fft).unwrap();
        let taken = c.take_segments();
        assert_eq!(taken.len(), 1);
        assert!(c.segments().is_empty());
    }
}
