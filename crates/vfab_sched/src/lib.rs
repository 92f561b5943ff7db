//! Spatio-temporal scheduling of configuration tasks onto reconfigurable regions.
//!
//! A batch of [`ConfigurationTask`]s is mapped onto a `time x region`
//! [`ScheduleMatrix`] so that every task holds a contiguous block of
//! `region_count` regions for `exec_time` consecutive slots.
//!
//! # Pipeline
//!
//! 1. **Seed**: sort by deadline and place first-fit (deadlines not enforced)
//! 2. **Anneal**: swap pairs in the task order, re-place with deadlines
//!    enforced, and keep the best feasible makespan
//!
//! # Usage
//!
//! ```
//! use vfab_common::{AcceleratorId, TaskId};
//! use vfab_sched::{AnnealingScheduler, ConfigurationTask, RegionScheduler};
//!
//! let tasks: Vec<_> = (1..=3)
//!     .map(|i| ConfigurationTask {
//!         id: TaskId::from_raw(i),
//!         accelerator: AcceleratorId::from_raw(0),
//!         region_count: 2,
//!         exec_time: 1,
//!         deadline: 3,
//!     })
//!     .collect();
//! let outcome = AnnealingScheduler::default().schedule(4, &tasks).unwrap();
//! assert!(outcome.completion_time <= 2);
//! ```

#![warn(missing_docs)]

pub mod anneal;
pub mod error;
mod greedy;
pub mod matrix;
pub mod task;

pub use anneal::{AnnealingParams, AnnealingScheduler};
pub use error::ScheduleError;
pub use matrix::ScheduleMatrix;
pub use task::ConfigurationTask;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A region scheduler: a pure function from a task batch to a schedule.
pub trait RegionScheduler {
    /// Schedules `tasks` onto `region_count` global region columns.
    fn schedule(
        &self,
        region_count: usize,
        tasks: &[ConfigurationTask],
    ) -> Result<ScheduleOutcome, ScheduleError>;
}

/// The result of one scheduling run, with search statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOutcome {
    /// The chosen schedule.
    pub solution: ScheduleMatrix,
    /// Completion time of `solution`, in slots.
    pub completion_time: usize,
    /// Completion time of the EDF seed, in slots.
    pub initial_completion_time: usize,
    /// Slot horizon used for the search (sum of execution times + 1).
    pub t_max: usize,
    /// Outer annealing iterations performed.
    pub iterations: usize,
    /// Consecutive outer iterations without improvement when the search stopped.
    pub stall_count: usize,
    /// Wall-clock time spent scheduling.
    pub duration: Duration,
    /// Whether `solution` finishes every task by its deadline.
    pub deadlines_met: bool,
}
