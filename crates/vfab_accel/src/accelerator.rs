//! The rate-based accelerator execution model.
//!
//! An [`Accelerator`] runs one [`AccelerableSegment`] at a time. Progress is
//! not simulated cycle by cycle: each call to [`Accelerator::advance`] retires
//! `concurrency * mflops * elapsed * 1e6` instructions for the time elapsed
//! since the previous call, after the segment's input transfer has finished.

use crate::error::AcceleratorError;
use crate::kind::AcceleratorType;
use crate::segment::{AccelerableSegment, MAX_SEGMENT_LENGTH};
use serde::{Deserialize, Serialize};
use vfab_common::{AcceleratorId, Clocked, Frequency, SimTime};

/// Instructions per MI.
const INSTRUCTIONS_PER_MI: f64 = 1e6;

/// The immutable description of an accelerator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceleratorSpec {
    /// Catalog id.
    pub id: AcceleratorId,
    /// Function implemented.
    pub kind: AcceleratorType,
    /// Throughput of one lane, in millions of operations per second.
    pub mflops: f64,
    /// Parallel lanes.
    pub concurrency: u32,
    /// Accelerator clock.
    pub clock: Frequency,
}

impl AcceleratorSpec {
    /// Effective rate in MI per second.
    pub fn rate(&self) -> f64 {
        self.mflops * f64::from(self.concurrency)
    }
}

/// Whether an accelerator is running a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcceleratorStatus {
    /// No segment bound.
    Idle,
    /// Running a segment.
    Busy,
}

/// The running record of one segment on one accelerator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentExecution {
    /// When the segment was submitted.
    pub arrival: SimTime,
    /// Input transfer delay before compute starts.
    pub transfer_time: SimTime,
    /// Time of the last progress update.
    pub last_processed: SimTime,
    /// Instructions still to retire.
    pub remaining_instructions: u64,
    /// Instructions in the whole segment.
    pub total_instructions: u64,
    /// When the last instruction retired.
    pub finished_at: Option<SimTime>,
    /// The finish time implied by the last wakeup handed out. Reaching it
    /// completes the segment even if rounding left instructions behind.
    pub expected_finish: SimTime,
}

impl SegmentExecution {
    fn compute_start(&self) -> SimTime {
        self.arrival + self.transfer_time
    }
}

/// The outcome of one [`Accelerator::advance`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    /// Delay until the accelerator next needs attention, or [`SimTime::NEVER`].
    pub next_wakeup: SimTime,
    /// The segment that finished during this call, handed back to the caller.
    pub completed: Option<AccelerableSegment>,
}

/// One accelerator instance: a spec plus `IDLE`/`BUSY` runtime state.
#[derive(Debug, Clone)]
pub struct Accelerator {
    spec: AcceleratorSpec,
    status: AcceleratorStatus,
    segment: Option<AccelerableSegment>,
    execution: Option<SegmentExecution>,
}

impl Accelerator {
    /// Creates an idle accelerator.
    pub fn new(spec: AcceleratorSpec) -> Self {
        Self {
            spec,
            status: AcceleratorStatus::Idle,
            segment: None,
            execution: None,
        }
    }

    /// Returns the spec.
    pub fn spec(&self) -> &AcceleratorSpec {
        &self.spec
    }

    /// Returns the current status.
    pub fn status(&self) -> AcceleratorStatus {
        self.status
    }

    /// Returns the segment being run, if any.
    pub fn current_segment(&self) -> Option<&AccelerableSegment> {
        self.segment.as_ref()
    }

    /// Returns the most recent execution record, kept after completion.
    pub fn execution(&self) -> Option<&SegmentExecution> {
        self.execution.as_ref()
    }

    /// Binds `segment` and starts its execution at `now`.
    ///
    /// Returns a rough completion estimate of
    /// `transfer_time + length / (mflops * concurrency)`. A busy accelerator,
    /// or a segment too long to count in instructions, rejects the submission
    /// and hands the segment back.
    pub fn submit(
        &mut self,
        mut segment: AccelerableSegment,
        transfer_time: SimTime,
        now: SimTime,
    ) -> Result<SimTime, AcceleratorError> {
        if self.status == AcceleratorStatus::Busy {
            return Err(AcceleratorError::Busy {
                accelerator: self.spec.id,
                segment: Box::new(segment),
            });
        }
        let remaining_mi = segment.length() - segment.finished_length_so_far();
        let per_mi = INSTRUCTIONS_PER_MI as u64;
        let (Some(total), Some(remaining)) = (
            segment.length().checked_mul(per_mi),
            remaining_mi.checked_mul(per_mi),
        ) else {
            return Err(AcceleratorError::TooLong {
                accelerator: self.spec.id,
                max: MAX_SEGMENT_LENGTH,
                segment: Box::new(segment),
            });
        };
        let estimate = transfer_time + SimTime::from_secs(remaining_mi as f64 / self.spec.rate());

        segment.mark_started(now);
        self.execution = Some(SegmentExecution {
            arrival: now,
            transfer_time,
            last_processed: now,
            remaining_instructions: remaining,
            total_instructions: total,
            finished_at: None,
            expected_finish: now + estimate,
        });
        self.segment = Some(segment);
        self.status = AcceleratorStatus::Busy;
        Ok(estimate)
    }

    /// Advances the bound segment to `now`.
    ///
    /// Compute time accrues only after the input transfer has completed.
    /// Returns [`SimTime::NEVER`] when idle. Otherwise the delay to the
    /// estimated finish, but never less than `min_granularity`.
    ///
    /// A call at or past the finish time implied by the previous wakeup
    /// completes the segment. At large `now` the wakeup can fall below the
    /// resolution of the clock, and the elapsed time alone would never retire
    /// the last instructions.
    pub fn advance(&mut self, now: SimTime, min_granularity: SimTime) -> Progress {
        let (Some(exec), Some(segment)) = (self.execution.as_mut(), self.segment.as_mut()) else {
            return Progress {
                next_wakeup: SimTime::NEVER,
                completed: None,
            };
        };

        let rate = self.spec.rate();
        let from = exec.last_processed.max(exec.compute_start());
        let elapsed = now.saturating_since(from).as_secs();
        let retired = (rate * elapsed * INSTRUCTIONS_PER_MI).round() as u64;
        exec.remaining_instructions = exec.remaining_instructions.saturating_sub(retired);
        if now >= exec.expected_finish {
            exec.remaining_instructions = 0;
        }
        exec.last_processed = exec.last_processed.max(now);

        let done_mi = (exec.total_instructions - exec.remaining_instructions)
            / INSTRUCTIONS_PER_MI as u64;
        segment.set_finished_length(done_mi);

        if exec.remaining_instructions == 0 {
            exec.finished_at = Some(now);
            segment.mark_finished(now);
            log::trace!(
                "accelerator {} finished segment {} at {}",
                self.spec.id,
                segment.unique_id(),
                now
            );
            self.status = AcceleratorStatus::Idle;
            return Progress {
                next_wakeup: SimTime::NEVER,
                completed: self.segment.take(),
            };
        }

        let transfer_left = exec.compute_start().saturating_since(now);
        let compute_left =
            SimTime::from_secs(exec.remaining_instructions as f64 / (rate * INSTRUCTIONS_PER_MI));
        let remaining = transfer_left + compute_left;
        exec.expected_finish = now + remaining;
        Progress {
            next_wakeup: remaining.max(min_granularity),
            completed: None,
        }
    }
}

impl Clocked for Accelerator {
    fn clock(&self) -> Frequency {
        self.spec.clock
    }
}
