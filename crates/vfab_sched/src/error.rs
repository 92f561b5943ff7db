//! Scheduling failures reported to the caller.

use vfab_common::TaskId;

/// A batch the scheduler cannot place at all.
///
/// Deadline misses are not errors; they are reported through
/// [`ScheduleOutcome::deadlines_met`](crate::ScheduleOutcome::deadlines_met).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    /// There are no regions to schedule onto.
    #[error("no reconfigurable regions available")]
    NoRegions,

    /// A task needs more adjacent regions than exist in total.
    #[error("task {task} needs {required} regions but only {available} exist")]
    Unplaceable {
        /// The task that cannot be placed.
        task: TaskId,
        /// Regions it needs.
        required: usize,
        /// Regions in the whole system.
        available: usize,
    },
}
