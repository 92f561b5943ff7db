//! The per-fabric virtual FPGA lifecycle manager.
//!
//! A [`VFpgaManager`] owns one fabric's [`ConfigurationManager`] and turns
//! that fabric's [`TileTable`] into reconfiguration requests, one task at a
//! time, as rows free up. A call to [`VFpgaManager::advance`] runs three
//! phases in order:
//!
//! 1. [`step`](VFpgaManager::step): advance every live accelerator and stamp
//!    finished or idle instances
//! 2. [`reclaim`](VFpgaManager::reclaim): release the regions of every
//!    finished instance
//! 3. [`scan`](VFpgaManager::scan): request reconfiguration for the next
//!    scheduled task of each free row
//!
//! The coordinator calls the phases separately when a task spans several
//! fabrics, so that all twins are stamped before any of them is reclaimed.

use crate::tiles::TileTable;
use crate::vfpga::{BlockMapping, VFpgaArena, VFpgaState, VirtualFpga};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use vfab_accel::Accelerator;
use vfab_common::{Clocked, FpgaId, InternalError, SimTime, TaskId, VFpgaId, VfabResult};
use vfab_fabric::{ConfigurationManager, UtilizationSnapshot};

/// A request to configure `task` on the rows it holds on one fabric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconfigurationRequest {
    /// The fabric to configure.
    pub fpga: FpgaId,
    /// The scheduled task.
    pub task: TaskId,
    /// Tile rows the task holds on this fabric, ascending.
    pub rows: Vec<usize>,
}

impl ReconfigurationRequest {
    /// Number of regions to claim.
    pub fn region_count(&self) -> usize {
        self.rows.len()
    }
}

/// Result of [`VFpgaManager::step`].
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Earliest accelerator wakeup delay, or [`SimTime::NEVER`].
    pub next_wakeup: SimTime,
    /// Instances that finished (or were idle) during this step.
    pub finished: Vec<VFpgaId>,
}

/// Result of a full [`VFpgaManager::advance`].
#[derive(Debug, Clone, PartialEq)]
pub struct AdvanceReport {
    /// Earliest accelerator wakeup delay, or [`SimTime::NEVER`].
    pub next_wakeup: SimTime,
    /// Instances whose regions were reclaimed.
    pub destroyed: Vec<VFpgaId>,
    /// Reconfiguration requests emitted by the scan.
    pub requests: Vec<ReconfigurationRequest>,
}

/// Tracks the virtual FPGAs of one fabric.
#[derive(Debug, Clone)]
pub struct VFpgaManager {
    config: ConfigurationManager,
    tiles: TileTable,
    /// Fabric region index of each tile row.
    dynamic: Vec<usize>,
    /// Row availability, indexed by fabric region.
    available: Vec<bool>,
    configuring: Vec<VFpgaId>,
    live: Vec<VFpgaId>,
    destroyed: Vec<VFpgaId>,
    requested: BTreeSet<TaskId>,
    instantiated: BTreeSet<TaskId>,
}

impl VFpgaManager {
    /// Wraps a partitioned configuration manager whose static regions are set.
    pub fn new(config: ConfigurationManager) -> Self {
        let dynamic = config
            .regions()
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.is_static())
            .map(|(i, _)| i)
            .collect();
        let available = config.regions().iter().map(|r| r.is_available()).collect();
        Self {
            config,
            tiles: TileTable::default(),
            dynamic,
            available,
            configuring: Vec::new(),
            live: Vec::new(),
            destroyed: Vec::new(),
            requested: BTreeSet::new(),
            instantiated: BTreeSet::new(),
        }
    }

    /// Returns the managed fabric's id.
    pub fn fpga_id(&self) -> FpgaId {
        self.config.fpga_id()
    }

    /// Returns the configuration manager.
    pub fn config(&self) -> &ConfigurationManager {
        &self.config
    }

    /// Returns the configuration manager for mutation.
    pub fn config_mut(&mut self) -> &mut ConfigurationManager {
        &mut self.config
    }

    /// Number of regions, static and dynamic.
    pub fn total_region_count(&self) -> usize {
        self.available.len()
    }

    /// Number of dynamic regions, which is the number of tile rows.
    pub fn reconfigurable_region_count(&self) -> usize {
        self.dynamic.len()
    }

    /// Installs this fabric's slice of a new schedule.
    pub fn load_tiles(&mut self, tiles: TileTable) {
        log::debug!(
            "fpga {}: loaded {} rows x {} slots",
            self.fpga_id(),
            tiles.row_count(),
            tiles.slot_count()
        );
        self.tiles = tiles;
    }

    /// Returns the current tile table.
    pub fn tiles(&self) -> &TileTable {
        &self.tiles
    }

    /// Returns the availability bitmap, indexed by fabric region.
    pub fn available_blocks(&self) -> &[bool] {
        &self.available
    }

    /// Instances registered and not yet reclaimed.
    pub fn live(&self) -> &[VFpgaId] {
        &self.live
    }

    /// Instances whose regions were reclaimed.
    pub fn destroyed(&self) -> &[VFpgaId] {
        &self.destroyed
    }

    /// Every instance this manager has created, in any state.
    pub fn all(&self) -> impl Iterator<Item = VFpgaId> + '_ {
        self.configuring
            .iter()
            .chain(&self.live)
            .chain(&self.destroyed)
            .copied()
    }

    /// Returns `true` while anything scheduled on this fabric remains to do.
    pub fn has_pending_work(&self) -> bool {
        !self.configuring.is_empty()
            || !self.live.is_empty()
            || !self.requested.is_empty()
            || self
                .tiles
                .tasks()
                .iter()
                .any(|t| !self.instantiated.contains(t))
    }

    fn row_free(&self, row: usize) -> bool {
        self.dynamic
            .get(row)
            .and_then(|&i| self.available.get(i))
            .copied()
            .unwrap_or(false)
    }

    fn set_row(&mut self, row: usize, free: bool) {
        if let Some(&i) = self.dynamic.get(row) {
            self.available[i] = free;
        }
    }

    /// Advances every live instance to `now`.
    ///
    /// Instances whose accelerator finished its segment, and idle instances,
    /// are stamped with `now` and move to [`VFpgaState::Finishing`].
    pub fn step(
        &mut self,
        now: SimTime,
        arena: &mut VFpgaArena,
        min_granularity: SimTime,
    ) -> StepReport {
        let mut next_wakeup = SimTime::NEVER;
        let mut finished = Vec::new();
        for &id in &self.live {
            let vfpga = &mut arena[id];
            match vfpga.state() {
                VFpgaState::Idle => {
                    vfpga.finish(now);
                    finished.push(id);
                }
                VFpgaState::Ready | VFpgaState::Busy => {
                    let progress = vfpga.advance(now, min_granularity);
                    next_wakeup = next_wakeup.min(progress.next_wakeup);
                    if progress.completed.is_some() {
                        vfpga.finish(now);
                        finished.push(id);
                    }
                }
                VFpgaState::Configuring | VFpgaState::Finishing | VFpgaState::Destroyed => {}
            }
        }
        StepReport {
            next_wakeup,
            finished,
        }
    }

    /// Releases the regions, rows and clock of every finishing instance.
    pub fn reclaim(&mut self, arena: &mut VFpgaArena) -> VfabResult<Vec<VFpgaId>> {
        let (done, keep): (Vec<VFpgaId>, Vec<VFpgaId>) = self
            .live
            .iter()
            .copied()
            .partition(|&id| arena[id].state() == VFpgaState::Finishing);
        self.live = keep;

        for &id in &done {
            let vfpga = &mut arena[id];
            for &BlockMapping { row, region } in vfpga.mapping() {
                self.config
                    .deallocate(region)
                    .map_err(|e| InternalError::new(format!("reclaiming vfpga {id}: {e}")))?;
                self.set_row(row, true);
            }
            self.config.clocks_mut().release(id);
            vfpga.mark_destroyed();
            self.destroyed.push(id);
            log::info!(
                "fpga {}: vfpga {} destroyed, {} regions released",
                self.fpga_id(),
                id,
                vfpga.mapping().len()
            );
        }
        Ok(done)
    }

    /// Emits one request for the next unconfigured task of each free row.
    ///
    /// A task is requested only when every row it holds on this fabric is
    /// free, and at most once until its configuration resolves.
    pub fn scan(&mut self) -> Vec<ReconfigurationRequest> {
        let mut requests = Vec::new();
        for row in 0..self.tiles.row_count() {
            if !self.row_free(row) {
                continue;
            }
            let Some(task) = self
                .tiles
                .row(row)
                .iter()
                .flatten()
                .copied()
                .find(|t| !self.instantiated.contains(t))
            else {
                continue;
            };
            if self.requested.contains(&task) {
                continue;
            }
            let rows = self.tiles.rows_of(task);
            if !rows.iter().all(|&r| self.row_free(r)) {
                log::trace!("fpga {}: task {task} waits for rows {rows:?}", self.fpga_id());
                continue;
            }
            self.requested.insert(task);
            log::debug!(
                "fpga {}: reconfiguration requested for task {task} on rows {rows:?}",
                self.fpga_id()
            );
            requests.push(ReconfigurationRequest {
                fpga: self.fpga_id(),
                task,
                rows,
            });
        }
        requests
    }

    /// Runs [`step`](Self::step), [`reclaim`](Self::reclaim) and
    /// [`scan`](Self::scan) in that order.
    pub fn advance(
        &mut self,
        now: SimTime,
        arena: &mut VFpgaArena,
        min_granularity: SimTime,
    ) -> VfabResult<AdvanceReport> {
        let step = self.step(now, arena, min_granularity);
        let destroyed = self.reclaim(arena)?;
        let requests = self.scan();
        Ok(AdvanceReport {
            next_wakeup: step.next_wakeup,
            destroyed,
            requests,
        })
    }

    /// Claims fabric regions for a requested task and creates its instance.
    ///
    /// Returns `None` on an allocation shortfall. The task then becomes
    /// eligible for a new request on a later scan.
    pub fn configure(
        &mut self,
        request: &ReconfigurationRequest,
        accelerator: Accelerator,
        configuration_time: SimTime,
        arena: &mut VFpgaArena,
    ) -> Option<VFpgaId> {
        let owner = arena.next_id();
        let Some(regions) = self
            .config
            .allocate(owner, request.region_count(), false)
        else {
            log::debug!(
                "fpga {}: not enough free regions for task {}, retrying later",
                self.fpga_id(),
                request.task
            );
            self.requested.remove(&request.task);
            return None;
        };

        let mapping = request
            .rows
            .iter()
            .zip(regions)
            .map(|(&row, region)| BlockMapping { row, region })
            .collect();
        for &row in &request.rows {
            self.set_row(row, false);
        }
        self.instantiated.insert(request.task);

        let id = arena.alloc(VirtualFpga::new(
            owner,
            request.task,
            self.fpga_id(),
            accelerator,
            mapping,
            configuration_time,
        ));
        self.configuring.push(id);
        Some(id)
    }

    /// Registers a configured instance: marks its rows, stamps its creation
    /// time and assigns its clock domain.
    pub fn on_reconfiguration_complete(
        &mut self,
        id: VFpgaId,
        arena: &mut VFpgaArena,
        now: SimTime,
    ) -> VfabResult<()> {
        let pos = self
            .configuring
            .iter()
            .position(|&v| v == id)
            .ok_or_else(|| {
                InternalError::new(format!(
                    "vfpga {id} is not being configured on fpga {}",
                    self.fpga_id()
                ))
            })?;
        self.configuring.remove(pos);

        let vfpga = arena
            .get_mut(id)
            .ok_or_else(|| InternalError::new(format!("unknown vfpga {id}")))?;
        for m in vfpga.mapping() {
            self.set_row(m.row, false);
        }
        let clocks = self.config.clocks_mut();
        let holds_pll = clocks.acquire(id, vfpga.clock()) && clocks.holds_pll(id);
        vfpga.set_holds_pll(holds_pll);
        vfpga.mark_created(now);
        self.requested.remove(&vfpga.task());
        self.live.push(id);

        log::info!(
            "fpga {}: vfpga {} created for task {} (configuration {})",
            self.fpga_id(),
            id,
            vfpga.task(),
            vfpga.configuration_time()
        );
        Ok(())
    }

    /// Summarizes the resources `vfpga` holds on this fabric.
    pub fn utilization(&self, vfpga: &VirtualFpga) -> UtilizationSnapshot {
        self.config.utilization(&vfpga.regions(), vfpga.holds_pll())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vfab_accel::{AccelerableSegment, AcceleratorSpec, AcceleratorType};
    use vfab_common::{AcceleratorId, CloudletId, Frequency, SegmentId};
    use vfab_fabric::{ConfigurationPort, Fpga, GridPartition, ResourceKind, Resources};
    use vfab_sched::{AnnealingParams, AnnealingScheduler, ConfigurationTask, RegionScheduler};

    const GRANULARITY: SimTime = SimTime::ZERO;

    fn manager(statics: usize) -> VFpgaManager {
        let fpga = Fpga::builder(FpgaId::from_raw(0))
            .capacity(Resources {
                logic_elements: 4_000,
                block_ram: 40,
                plls: 1,
                ..Resources::default()
            })
            .clock(Frequency::from_mhz(100.0))
            .build();
        let mut cm = ConfigurationManager::new(fpga, ConfigurationPort::default());
        cm.partition(&GridPartition::new(2, 2)).unwrap();
        cm.initialize_static_regions(statics).unwrap();
        VFpgaManager::new(cm)
    }

    fn accelerator(mhz: f64) -> Accelerator {
        Accelerator::new(AcceleratorSpec {
            id: AcceleratorId::from_raw(0),
            kind: AcceleratorType::ImageProcessing,
            mflops: 400.0,
            concurrency: 40,
            clock: Frequency::from_mhz(mhz),
        })
    }

    fn tiles(region_count: usize, tasks: u32) -> TileTable {
        let tasks: Vec<_> = (1..=tasks)
            .map(|i| ConfigurationTask {
                id: TaskId::from_raw(i),
                accelerator: AcceleratorId::from_raw(0),
                region_count: 2,
                exec_time: 1,
                deadline: 3,
            })
            .collect();
        let params = AnnealingParams {
            seed: Some(1),
            ..AnnealingParams::default()
        };
        let outcome = AnnealingScheduler::new(params)
            .schedule(region_count, &tasks)
            .unwrap();
        TileTable::slice(&outcome.solution, 0, region_count)
    }

    fn segment() -> AccelerableSegment {
        AccelerableSegment::new(
            SegmentId::from_raw(0),
            CloudletId::from_raw(0),
            0,
            48,
            AcceleratorType::ImageProcessing,
        )
    }

    fn configure_all(
        mgr: &mut VFpgaManager,
        arena: &mut VFpgaArena,
        requests: &[ReconfigurationRequest],
        now: SimTime,
    ) -> Vec<VFpgaId> {
        requests
            .iter()
            .map(|req| {
                let id = mgr
                    .configure(req, accelerator(100.0), SimTime::ZERO, arena)
                    .unwrap();
                mgr.on_reconfiguration_complete(id, arena, now).unwrap();
                id
            })
            .collect()
    }

    #[test]
    fn bitmap_mirrors_static_regions() {
        let mgr = manager(1);
        assert_eq!(mgr.total_region_count(), 4);
        assert_eq!(mgr.reconfigurable_region_count(), 3);
        assert_eq!(mgr.available_blocks(), &[false, true, true, true]);
    }

    #[test]
    fn scan_requests_each_task_once() {
        let mut mgr = manager(0);
        let mut arena = VFpgaArena::new();
        mgr.load_tiles(tiles(4, 3));

        let report = mgr.advance(SimTime::ZERO, &mut arena, GRANULARITY).unwrap();
        assert_eq!(report.requests.len(), 2);
        assert!(report.requests.iter().all(|r| r.region_count() == 2));
        assert_ne!(report.requests[0].task, report.requests[1].task);

        let again = mgr.advance(SimTime::ZERO, &mut arena, GRANULARITY).unwrap();
        assert!(again.requests.is_empty());
    }

    #[test]
    fn freed_rows_are_rescanned_in_the_same_advance() {
        let mut mgr = manager(0);
        let mut arena = VFpgaArena::new();
        mgr.load_tiles(tiles(4, 3));

        let first = mgr.advance(SimTime::ZERO, &mut arena, GRANULARITY).unwrap();
        let ids = configure_all(&mut mgr, &mut arena, &first.requests, SimTime::ZERO);
        assert_eq!(mgr.live().len(), 2);
        assert_eq!(mgr.config().available_region_count(), 0);

        arena[ids[0]]
            .submit(segment(), SimTime::ZERO, SimTime::ZERO)
            .unwrap();
        arena[ids[1]].mark_idle();

        let report = mgr
            .advance(SimTime::from_secs(1.0), &mut arena, GRANULARITY)
            .unwrap();
        assert_eq!(report.destroyed.len(), 2);
        assert_eq!(report.requests.len(), 1);
        assert_eq!(mgr.config().available_region_count(), 4);
        assert_eq!(mgr.destroyed().len(), 2);
        assert_eq!(arena[ids[0]].state(), VFpgaState::Destroyed);
        assert_eq!(
            arena[ids[0]].executed_segment().unwrap().finished_length_so_far(),
            48
        );
        assert_eq!(arena[ids[1]].destroyed_at(), Some(SimTime::from_secs(1.0)));
    }

    #[test]
    fn busy_instance_reports_its_wakeup() {
        let mut mgr = manager(0);
        let mut arena = VFpgaArena::new();
        mgr.load_tiles(tiles(4, 1));
        let first = mgr.advance(SimTime::ZERO, &mut arena, GRANULARITY).unwrap();
        let ids = configure_all(&mut mgr, &mut arena, &first.requests, SimTime::ZERO);
        arena[ids[0]]
            .submit(segment(), SimTime::ZERO, SimTime::ZERO)
            .unwrap();

        let report = mgr.advance(SimTime::ZERO, &mut arena, GRANULARITY).unwrap();
        approx::assert_relative_eq!(report.next_wakeup.as_secs(), 48.0 / 16_000.0);
        assert!(mgr.has_pending_work());
    }

    #[test]
    fn allocation_shortfall_releases_the_request() {
        let mut mgr = manager(0);
        let mut arena = VFpgaArena::new();
        mgr.load_tiles(tiles(4, 1));
        let first = mgr.advance(SimTime::ZERO, &mut arena, GRANULARITY).unwrap();
        let request = first.requests[0].clone();

        let blocker = mgr
            .config_mut()
            .allocate(VFpgaId::from_raw(99), 3, false)
            .unwrap();
        assert!(mgr
            .configure(&request, accelerator(100.0), SimTime::ZERO, &mut arena)
            .is_none());
        assert!(arena.is_empty());

        for region in blocker {
            mgr.config_mut().deallocate(region).unwrap();
        }
        let retry = mgr.advance(SimTime::ZERO, &mut arena, GRANULARITY).unwrap();
        assert_eq!(retry.requests, vec![request]);
    }

    #[test]
    fn completion_of_unknown_instance_is_an_internal_error() {
        let mut mgr = manager(0);
        let mut arena = VFpgaArena::new();
        assert!(mgr
            .on_reconfiguration_complete(VFpgaId::from_raw(0), &mut arena, SimTime::ZERO)
            .is_err());
    }

    #[test]
    fn pll_granted_for_non_master_clock_and_released() {
        let mut mgr = manager(0);
        let mut arena = VFpgaArena::new();
        mgr.load_tiles(tiles(4, 1));
        let first = mgr.advance(SimTime::ZERO, &mut arena, GRANULARITY).unwrap();
        let id = mgr
            .configure(&first.requests[0], accelerator(50.0), SimTime::ZERO, &mut arena)
            .unwrap();
        mgr.on_reconfiguration_complete(id, &mut arena, SimTime::ZERO)
            .unwrap();
        assert!(arena[id].holds_pll());
        assert_eq!(mgr.config().clocks().plls_in_use(), 1);

        let snapshot = mgr.utilization(&arena[id]);
        assert_eq!(snapshot.region_count, 2);
        assert!(snapshot.holds_pll);
        assert!(snapshot.percent_for(ResourceKind::LogicElements) > 0.0);

        arena[id].mark_idle();
        mgr.advance(SimTime::ZERO, &mut arena, GRANULARITY).unwrap();
        assert_eq!(mgr.config().clocks().plls_in_use(), 0);
        assert!(!mgr.has_pending_work());
    }
}
