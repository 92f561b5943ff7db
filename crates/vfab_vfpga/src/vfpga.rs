//! Virtual FPGA instances.

use serde::{Deserialize, Serialize};
use vfab_accel::{AccelerableSegment, Accelerator, Progress};
use vfab_common::{
    AcceleratorId, Address, Addressable, Arena, Clocked, FpgaId, Frequency, RegionId, SimTime,
    TaskId, VFpgaId,
};

/// Arena holding every virtual FPGA of a run, live or destroyed.
pub type VFpgaArena = Arena<VFpgaId, VirtualFpga>;

/// Binds one row of a fabric's tile table to the fabric region that backs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMapping {
    /// Row in the manager's tile table (and availability bitmap, after the static offset).
    pub row: usize,
    /// Region claimed from the configuration manager.
    pub region: RegionId,
}

/// The regions one virtual FPGA holds on one fabric.
pub type RegionMapping = Vec<BlockMapping>;

/// Lifecycle of a virtual FPGA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VFpgaState {
    /// Regions claimed, bitstream loading.
    Configuring,
    /// Configured and waiting for a segment.
    Ready,
    /// Running a segment.
    Busy,
    /// No segment matched; torn down at the next advance.
    Idle,
    /// Work done and timestamps final; regions not yet reclaimed.
    Finishing,
    /// Regions reclaimed.
    Destroyed,
}

/// How a virtual FPGA takes part in a task that spans several fabrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TwinRole {
    /// The only instance of its task.
    Single,
    /// The first-ready instance of a spanning task; it runs the segment.
    Primary,
    /// Holds regions for a spanning task whose primary runs the segment.
    Secondary,
}

/// A configured accelerator instance occupying regions on one fabric.
#[derive(Debug, Clone)]
pub struct VirtualFpga {
    id: VFpgaId,
    task: TaskId,
    fpga: FpgaId,
    accelerator: Accelerator,
    mapping: RegionMapping,
    state: VFpgaState,
    role: TwinRole,
    address: Option<Address>,
    holds_pll: bool,
    configuration_time: SimTime,
    created_at: Option<SimTime>,
    destroyed_at: Option<SimTime>,
    output: Option<AccelerableSegment>,
    executed: Option<AccelerableSegment>,
}

impl VirtualFpga {
    /// Creates an instance in the [`VFpgaState::Configuring`] state.
    pub fn new(
        id: VFpgaId,
        task: TaskId,
        fpga: FpgaId,
        accelerator: Accelerator,
        mapping: RegionMapping,
        configuration_time: SimTime,
    ) -> Self {
        Self {
            id,
            task,
            fpga,
            accelerator,
            mapping,
            state: VFpgaState::Configuring,
            role: TwinRole::Single,
            address: None,
            holds_pll: false,
            configuration_time,
            created_at: None,
            destroyed_at: None,
            output: None,
            executed: None,
        }
    }

    /// Returns the instance id.
    pub fn id(&self) -> VFpgaId {
        self.id
    }

    /// Returns the scheduling task this instance realizes.
    ///
    /// Instances of a task spanning several fabrics share this id.
    pub fn task(&self) -> TaskId {
        self.task
    }

    /// Returns the hosting fabric.
    pub fn fpga(&self) -> FpgaId {
        self.fpga
    }

    /// Returns the bound accelerator.
    pub fn accelerator(&self) -> &Accelerator {
        &self.accelerator
    }

    /// Returns the catalog id of the bound accelerator.
    pub fn accelerator_id(&self) -> AcceleratorId {
        self.accelerator.spec().id
    }

    /// Returns the row-to-region mapping.
    pub fn mapping(&self) -> &[BlockMapping] {
        &self.mapping
    }

    /// Returns the fabric regions held.
    pub fn regions(&self) -> Vec<RegionId> {
        self.mapping.iter().map(|m| m.region).collect()
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> VFpgaState {
        self.state
    }

    /// Returns `true` until the regions have been reclaimed.
    pub fn is_live(&self) -> bool {
        self.state != VFpgaState::Destroyed
    }

    /// Returns the twin role.
    pub fn role(&self) -> TwinRole {
        self.role
    }

    /// Sets the twin role.
    pub fn set_role(&mut self, role: TwinRole) {
        self.role = role;
    }

    /// Returns whether a PLL was granted at creation.
    pub fn holds_pll(&self) -> bool {
        self.holds_pll
    }

    pub(crate) fn set_holds_pll(&mut self, holds: bool) {
        self.holds_pll = holds;
    }

    /// Assigns the address payloads for this instance are delivered to.
    pub fn set_address(&mut self, address: Address) {
        self.address = Some(address);
    }

    /// Returns the bitstream load time.
    pub fn configuration_time(&self) -> SimTime {
        self.configuration_time
    }

    /// Returns when configuration completed.
    pub fn created_at(&self) -> Option<SimTime> {
        self.created_at
    }

    /// Returns when the instance finished.
    pub fn destroyed_at(&self) -> Option<SimTime> {
        self.destroyed_at
    }

    /// Returns the segment this instance ran, once it has finished.
    pub fn executed_segment(&self) -> Option<&AccelerableSegment> {
        self.executed.as_ref()
    }

    /// Takes the finished segment for delivery to the requester.
    pub fn take_output(&mut self) -> Option<AccelerableSegment> {
        self.output.take()
    }

    pub(crate) fn mark_created(&mut self, at: SimTime) {
        self.created_at = Some(at);
        self.state = VFpgaState::Ready;
    }

    /// Marks a ready instance idle because no waiting segment matched it.
    pub fn mark_idle(&mut self) {
        if self.state == VFpgaState::Ready {
            self.state = VFpgaState::Idle;
        }
    }

    /// Hands `segment` to the accelerator.
    ///
    /// A rejected segment is handed back in the error.
    pub fn submit(
        &mut self,
        segment: AccelerableSegment,
        transfer_time: SimTime,
        now: SimTime,
    ) -> Result<SimTime, vfab_accel::AcceleratorError> {
        let estimate = self.accelerator.submit(segment, transfer_time, now)?;
        self.state = VFpgaState::Busy;
        Ok(estimate)
    }

    /// Advances the accelerator. A finished segment moves into the output buffer.
    pub(crate) fn advance(&mut self, now: SimTime, min_granularity: SimTime) -> Progress {
        let progress = self.accelerator.advance(now, min_granularity);
        if let Some(segment) = &progress.completed {
            self.executed = Some(segment.clone());
            self.output = Some(segment.clone());
        }
        progress
    }

    /// Stamps the terminal timestamps and moves to [`VFpgaState::Finishing`].
    pub fn finish(&mut self, at: SimTime) {
        self.destroyed_at = Some(at);
        self.state = VFpgaState::Finishing;
    }

    /// Copies a twin's creation, configuration and destruction timestamps.
    pub fn adopt_timestamps(&mut self, primary: &VirtualFpga) {
        self.created_at = primary.created_at;
        self.configuration_time = primary.configuration_time;
        self.destroyed_at = primary.destroyed_at;
    }

    pub(crate) fn mark_destroyed(&mut self) {
        self.state = VFpgaState::Destroyed;
    }
}

impl Addressable for VirtualFpga {
    fn address(&self) -> Option<Address> {
        self.address
    }
}

impl Clocked for VirtualFpga {
    fn clock(&self) -> Frequency {
        self.accelerator.clock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vfab_accel::{AcceleratorSpec, AcceleratorType};
    use vfab_common::{AcceleratorId, CloudletId, SegmentId};

    fn vfpga() -> VirtualFpga {
        let accelerator = Accelerator::new(AcceleratorSpec {
            id: AcceleratorId::from_raw(0),
            kind: AcceleratorType::Fft,
            mflops: 400.0,
            concurrency: 40,
            clock: Frequency::from_mhz(75.0),
        });
        VirtualFpga::new(
            VFpgaId::from_raw(0),
            TaskId::from_raw(1),
            FpgaId::from_raw(0),
            accelerator,
            vec![BlockMapping {
                row: 0,
                region: RegionId::from_raw(1),
            }],
            SimTime::from_secs(0.5),
        )
    }

    #[test]
    fn starts_configuring() {
        let v = vfpga();
        assert_eq!(v.state(), VFpgaState::Configuring);
        assert_eq!(v.regions(), vec![RegionId::from_raw(1)]);
        assert_eq!(v.clock().mhz(), 75.0);
        assert!(v.address().is_none());
    }

    #[test]
    fn idle_only_from_ready() {
        let mut v = vfpga();
        v.mark_idle();
        assert_eq!(v.state(), VFpgaState::Configuring);
        v.mark_created(SimTime::from_secs(1.0));
        v.mark_idle();
        assert_eq!(v.state(), VFpgaState::Idle);
    }

    #[test]
    fn finished_segment_lands_in_output() {
        let mut v = vfpga();
        v.mark_created(SimTime::ZERO);
        let seg = AccelerableSegment::new(
            SegmentId::from_raw(0),
            CloudletId::from_raw(0),
            0,
            48,
            AcceleratorType::Fft,
        );
        v.submit(seg, SimTime::ZERO, SimTime::ZERO).unwrap();
        assert_eq!(v.state(), VFpgaState::Busy);
        let p = v.advance(SimTime::from_secs(1.0), SimTime::ZERO);
        assert!(p.completed.is_some());
        assert_eq!(v.take_output().unwrap().finished_length_so_far(), 48);
        assert!(v.take_output().is_none());
        assert!(v.executed_segment().is_some());
    }

    #[test]
    fn twin_adopts_primary_timestamps() {
        let mut primary = vfpga();
        primary.mark_created(SimTime::from_secs(2.0));
        primary.finish(SimTime::from_secs(5.0));
        let mut twin = vfpga();
        twin.adopt_timestamps(&primary);
        assert_eq!(twin.created_at(), Some(SimTime::from_secs(2.0)));
        assert_eq!(twin.destroyed_at(), Some(SimTime::from_secs(5.0)));
    }
}
