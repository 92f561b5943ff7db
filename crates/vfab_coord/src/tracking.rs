//! Per-cloudlet completion tracking.

use vfab_accel::CloudletSummary;
use vfab_common::{CloudletId, SimTime};

/// Merges the execution windows of every part of one cloudlet.
#[derive(Debug, Clone)]
pub(crate) struct CloudletTracker {
    id: CloudletId,
    length: u64,
    outstanding: usize,
    started_at: Option<SimTime>,
    finished_at: Option<SimTime>,
}

impl CloudletTracker {
    /// Tracks a cloudlet with `parts` parts still to finish.
    pub(crate) fn new(id: CloudletId, length: u64, parts: usize) -> Self {
        Self {
            id,
            length,
            outstanding: parts,
            started_at: None,
            finished_at: None,
        }
    }

    /// Records one finished part. Returns the summary once every part is done.
    pub(crate) fn finish_part(
        &mut self,
        started_at: SimTime,
        finished_at: SimTime,
    ) -> Option<CloudletSummary> {
        self.started_at = Some(self.started_at.map_or(started_at, |s| s.min(started_at)));
        self.finished_at = Some(self.finished_at.map_or(finished_at, |f| f.max(finished_at)));
        self.outstanding = self.outstanding.saturating_sub(1);
        self.summary()
    }

    /// Returns the summary if nothing is outstanding.
    pub(crate) fn summary(&self) -> Option<CloudletSummary> {
        if self.outstanding > 0 {
            return None;
        }
        Some(CloudletSummary {
            cloudlet: self.id,
            length: self.length,
            started_at: self.started_at.unwrap_or(SimTime::ZERO),
            finished_at: self.finished_at.unwrap_or(SimTime::ZERO),
        })
    }
}
