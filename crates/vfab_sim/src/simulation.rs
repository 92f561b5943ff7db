//! The simulation driver.

use crate::queue::EventQueue;
use serde::{Deserialize, Serialize};
use vfab_accel::AccelerableCloudlet;
use vfab_common::{AcceleratorId, SimTime};
use vfab_coord::{Coordinator, CoordinatorError, Event, EventKernel, ExecutionReport};
use vfab_sched::{AnnealingScheduler, RegionScheduler};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Time of the last processed event.
    pub final_time: SimTime,
    /// Events handled by the coordinator.
    pub events_processed: u64,
    /// Whether the time limit stopped the run with events still pending.
    pub stopped_by_limit: bool,
}

/// Couples a [`Coordinator`] with an [`EventQueue`] and runs it to completion.
pub struct Simulation<S: RegionScheduler = AnnealingScheduler> {
    queue: EventQueue<Event>,
    coordinator: Coordinator<S>,
    time_limit: Option<SimTime>,
    events_processed: u64,
}

impl<S: RegionScheduler> Simulation<S> {
    /// Creates a simulation at time zero with no time limit.
    pub fn new(coordinator: Coordinator<S>) -> Self {
        Self {
            queue: EventQueue::new(),
            coordinator,
            time_limit: None,
            events_processed: 0,
        }
    }

    /// Stops the run before the first event later than `limit`.
    pub fn with_time_limit(mut self, limit: SimTime) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Returns the current simulated time.
    pub fn now(&self) -> SimTime {
        self.queue.now()
    }

    /// Returns the coordinator.
    pub fn coordinator(&self) -> &Coordinator<S> {
        &self.coordinator
    }

    /// Submits a cloudlet at the current time.
    pub fn submit_cloudlet(&mut self, cloudlet: AccelerableCloudlet) -> Result<(), CoordinatorError> {
        self.coordinator.submit_cloudlet(&mut self.queue, cloudlet)
    }

    /// Submits a batch of accelerator requests at the current time.
    pub fn submit_requests(&mut self, accelerators: Vec<AcceleratorId>) -> Result<(), CoordinatorError> {
        self.coordinator.submit_requests(&mut self.queue, accelerators)
    }

    /// Runs until no event is pending or the time limit is reached.
    ///
    /// When the queue empties, segments no fabric will serve are handed to
    /// the CPU and the run continues.
    pub fn run(&mut self) -> Result<RunSummary, CoordinatorError> {
        loop {
            while let Some(next) = self.queue.peek_time() {
                if self.time_limit.is_some_and(|limit| next > limit) {
                    log::warn!(
                        "time limit reached at {}, {} events pending",
                        self.queue.now(),
                        self.queue.len()
                    );
                    return Ok(self.summary(true));
                }
                let Some((_, event)) = self.queue.pop() else {
                    break;
                };
                log::trace!("{}: {event:?}", self.queue.now());
                self.coordinator.handle(&mut self.queue, event)?;
                self.events_processed += 1;
            }
            if !self.coordinator.drain(&mut self.queue) {
                break;
            }
        }
        let summary = self.summary(false);
        log::info!(
            "simulation finished at {} after {} events",
            summary.final_time,
            summary.events_processed
        );
        Ok(summary)
    }

    /// Collects the coordinator's records.
    pub fn report(&self) -> ExecutionReport {
        self.coordinator.report()
    }

    fn summary(&self, stopped_by_limit: bool) -> RunSummary {
        RunSummary {
            final_time: self.queue.now(),
            events_processed: self.events_processed,
            stopped_by_limit,
        }
    }
}
