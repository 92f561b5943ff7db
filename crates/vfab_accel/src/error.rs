//! Errors for workload construction, the netlist catalog, and accelerator submission.

use crate::segment::AccelerableSegment;
use vfab_common::{AcceleratorId, CloudletId, SegmentId};

/// Rejected workload or catalog edits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkloadError {
    /// The new segment's range intersects an existing one.
    #[error("segment [{index}, {end}) overlaps segment {existing} of cloudlet {cloudlet}")]
    Overlap {
        /// The cloudlet being edited.
        cloudlet: CloudletId,
        /// The segment already covering part of the range.
        existing: SegmentId,
        /// Start of the rejected range.
        index: u64,
        /// End (exclusive) of the rejected range.
        end: u64,
    },

    /// A segment with this id is already present.
    #[error("cloudlet {cloudlet} already has segment {segment}")]
    DuplicateSegment {
        /// The cloudlet being edited.
        cloudlet: CloudletId,
        /// The duplicated id.
        segment: SegmentId,
    },

    /// The segment extends past the end of the cloudlet.
    #[error("segment [{index}, {end}) exceeds cloudlet {cloudlet} of length {length}")]
    OutOfRange {
        /// The cloudlet being edited.
        cloudlet: CloudletId,
        /// Start of the rejected range.
        index: u64,
        /// End (exclusive) of the rejected range.
        end: u64,
        /// The cloudlet's length.
        length: u64,
    },

    /// The segment would belong to a different cloudlet.
    #[error("segment belongs to cloudlet {found}, not {cloudlet}")]
    WrongCloudlet {
        /// The cloudlet being edited.
        cloudlet: CloudletId,
        /// The cloudlet named by the segment.
        found: CloudletId,
    },

    /// The segment's instruction count does not fit in a `u64`.
    #[error("segment of {length} MI in cloudlet {cloudlet} exceeds the {max} MI limit")]
    TooLong {
        /// The cloudlet being edited.
        cloudlet: CloudletId,
        /// The rejected length.
        length: u64,
        /// The longest accepted length.
        max: u64,
    },

    /// A catalog entry with this accelerator id already exists.
    #[error("accelerator {0} is already in the catalog")]
    DuplicateAccelerator(AcceleratorId),

    /// The netlist would occupy no regions or no time slots.
    #[error("netlist for accelerator {0} needs at least one region and one slot")]
    EmptyNetlist(AcceleratorId),
}

/// Submission to an accelerator failed.
#[derive(Debug, thiserror::Error)]
pub enum AcceleratorError {
    /// The accelerator is already running a segment. The rejected segment is handed back.
    #[error("accelerator {accelerator} is busy")]
    Busy {
        /// The busy accelerator.
        accelerator: AcceleratorId,
        /// The segment that was not accepted.
        segment: Box<AccelerableSegment>,
    },

    /// The segment is longer than [`crate::segment::MAX_SEGMENT_LENGTH`]. The
    /// rejected segment is handed back.
    #[error("accelerator {accelerator} cannot run a segment longer than {max} MI")]
    TooLong {
        /// The rejecting accelerator.
        accelerator: AcceleratorId,
        /// The longest accepted length.
        max: u64,
        /// The segment that was not accepted.
        segment: Box<AccelerableSegment>,
    },
}
