//! Read-only execution records for presentation code.

use serde::{Deserialize, Serialize};
use vfab_accel::{AccelerableSegment, AcceleratorType, CloudletSummary};
use vfab_common::{
    AcceleratorId, Address, CloudletId, FpgaId, RegionId, SegmentId, SimTime, TaskId, VFpgaId,
};
use vfab_fabric::UtilizationSnapshot;
use vfab_sched::ScheduleOutcome;
use vfab_vfpga::{TwinRole, VirtualFpga};

/// Where a segment ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "on")]
pub enum Placement {
    /// On a virtual FPGA.
    Fpga {
        /// The hosting fabric.
        fpga: FpgaId,
        /// The instance.
        vfpga: VFpgaId,
    },
    /// On the VM's CPU, after the accelerated path was unavailable.
    Cpu,
}

/// One finished segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    /// The owning cloudlet.
    pub cloudlet: CloudletId,
    /// The segment id within the cloudlet.
    pub segment: SegmentId,
    /// Required accelerator type.
    pub kind: AcceleratorType,
    /// Length in MI.
    pub length: u64,
    /// MI completed, equal to `length` for every finished segment.
    pub finished_length: u64,
    /// Start of execution.
    pub started_at: SimTime,
    /// End of execution.
    pub finished_at: SimTime,
    /// Where it ran.
    pub placement: Placement,
}

impl SegmentRecord {
    pub(crate) fn new(
        segment: &AccelerableSegment,
        fallback_start: SimTime,
        finished_at: SimTime,
        placement: Placement,
    ) -> Self {
        Self {
            cloudlet: segment.cloudlet(),
            segment: segment.id(),
            kind: segment.kind(),
            length: segment.length(),
            finished_length: segment.finished_length_so_far(),
            started_at: segment.started_at().unwrap_or(fallback_start),
            finished_at: segment.finished_at().unwrap_or(finished_at),
            placement,
        }
    }

    /// Returns `"<segment>-<cloudlet>"`.
    pub fn unique_id(&self) -> String {
        format!("{}-{}", self.segment, self.cloudlet)
    }

    /// Execution time in seconds.
    pub fn execution_time(&self) -> SimTime {
        self.finished_at.saturating_since(self.started_at)
    }
}

/// One virtual FPGA, live or destroyed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VFpgaRecord {
    /// Instance id.
    pub vfpga: VFpgaId,
    /// Scheduling task it realized.
    pub task: TaskId,
    /// Hosting fabric.
    pub fpga: FpgaId,
    /// Bound accelerator.
    pub accelerator: AcceleratorId,
    /// Regions held.
    pub regions: Vec<RegionId>,
    /// Role in a spanning task.
    pub role: TwinRole,
    /// Address while live.
    pub address: Option<Address>,
    /// Bitstream load time.
    pub configuration_time: SimTime,
    /// When configuration completed.
    pub created_at: Option<SimTime>,
    /// When it finished.
    pub destroyed_at: Option<SimTime>,
    /// Unique id of the segment it ran.
    pub segment: Option<String>,
}

impl From<&VirtualFpga> for VFpgaRecord {
    fn from(v: &VirtualFpga) -> Self {
        use vfab_common::Addressable;
        Self {
            vfpga: v.id(),
            task: v.task(),
            fpga: v.fpga(),
            accelerator: v.accelerator_id(),
            regions: v.regions(),
            role: v.role(),
            address: v.address(),
            configuration_time: v.configuration_time(),
            created_at: v.created_at(),
            destroyed_at: v.destroyed_at(),
            segment: v.executed_segment().map(AccelerableSegment::unique_id),
        }
    }
}

/// Everything a run produced, in one serializable value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Finished segments in completion order.
    pub segments: Vec<SegmentRecord>,
    /// Finished cloudlets in completion order.
    pub cloudlets: Vec<CloudletSummary>,
    /// Every virtual FPGA created.
    pub vfpgas: Vec<VFpgaRecord>,
    /// Per-instance resource shares, in instance order.
    pub utilization: Vec<(VFpgaId, UtilizationSnapshot)>,
    /// The most recent schedule.
    pub schedule: Option<ScheduleOutcome>,
}
