//! The unified coordinator.
//!
//! A [`Coordinator`] receives accelerator request batches and cloudlets. It
//! schedules each batch over the regions of every fabric, hands each
//! [`VFpgaManager`] its slice of the solution, and then drives segments
//! through `waiting -> submitted -> finished`. When no fabric can serve a
//! segment it runs on the VM's CPU instead, so every submitted instruction
//! is eventually executed.

use crate::address::{AddressProvider, Endpoint, RoutingTable};
use crate::error::CoordinatorError;
use crate::event::{Event, Payload};
use crate::kernel::EventKernel;
use crate::report::{ExecutionReport, Placement, SegmentRecord, VFpgaRecord};
use crate::tracking::CloudletTracker;
use std::collections::{BTreeMap, VecDeque};
use vfab_accel::{
    AccelerableCloudlet, AccelerableSegment, AcceleratorError, CloudletSummary, NetlistStore,
};
use vfab_common::{
    AcceleratorId, Address, Addressable, CloudletId, FpgaId, IdGenerator, InternalError,
    SegmentId, SimTime, TaskId, VFpgaId,
};
use vfab_sched::{AnnealingScheduler, ConfigurationTask, RegionScheduler, ScheduleOutcome};
use vfab_vfpga::{TileTable, TwinRole, VFpgaArena, VFpgaManager, VFpgaState};

/// Runtime parameters of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinatorConfig {
    /// Lower bound on any accelerator wakeup delay.
    pub min_time_between_events: SimTime,
    /// MIPS of one VM processing element.
    pub vm_mips: f64,
    /// Processing elements of the VM.
    pub vm_pes: u32,
    /// Input transfer delay applied to every segment sent to a virtual FPGA.
    pub transfer_time: SimTime,
}

impl CoordinatorConfig {
    /// CPU throughput in MI per second.
    pub fn cpu_rate(&self) -> f64 {
        self.vm_mips * f64::from(self.vm_pes)
    }

    fn cpu_time(&self, length: u64) -> SimTime {
        SimTime::from_secs(length as f64 / self.cpu_rate())
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            min_time_between_events: SimTime::from_secs(0.01),
            vm_mips: 1000.0,
            vm_pes: 1,
            transfer_time: SimTime::ZERO,
        }
    }
}

/// Readiness of the instances realizing one task.
#[derive(Debug, Clone, Default)]
struct TwinGroup {
    expected: usize,
    ready: Vec<VFpgaId>,
}

/// Orchestrates scheduling, reconfiguration and segment execution across fabrics.
pub struct Coordinator<S: RegionScheduler = AnnealingScheduler> {
    config: CoordinatorConfig,
    scheduler: S,
    nodes: Vec<VFpgaManager>,
    arena: VFpgaArena,
    store: NetlistStore,
    task_ids: IdGenerator<TaskId>,
    task_accelerators: BTreeMap<TaskId, AcceleratorId>,
    twins: BTreeMap<TaskId, TwinGroup>,
    pending_batches: VecDeque<Vec<AcceleratorId>>,
    batch_active: bool,
    next_update: Option<SimTime>,
    waiting: VecDeque<AccelerableSegment>,
    submitted: Vec<(CloudletId, SegmentId)>,
    on_cpu: BTreeMap<(CloudletId, SegmentId), AccelerableSegment>,
    cpu_started: BTreeMap<CloudletId, SimTime>,
    finished: Vec<SegmentRecord>,
    cloudlets: BTreeMap<CloudletId, CloudletTracker>,
    finished_cloudlets: Vec<CloudletSummary>,
    addresses: Box<dyn AddressProvider>,
    routes: RoutingTable,
    address: Address,
    last_outcome: Option<ScheduleOutcome>,
}

impl<S: RegionScheduler> Coordinator<S> {
    /// Creates a coordinator over `nodes` and assigns addresses to itself and
    /// to every configuration manager.
    pub fn new(
        config: CoordinatorConfig,
        scheduler: S,
        mut nodes: Vec<VFpgaManager>,
        store: NetlistStore,
        mut addresses: Box<dyn AddressProvider>,
    ) -> Result<Self, CoordinatorError> {
        let mut routes = RoutingTable::default();
        let address = addresses
            .request_address()
            .ok_or(CoordinatorError::AddressesExhausted)?;
        routes.register(address, Endpoint::Coordinator);
        for node in &mut nodes {
            let addr = addresses
                .request_address()
                .ok_or(CoordinatorError::AddressesExhausted)?;
            node.config_mut().set_address(addr);
            routes.register(addr, Endpoint::ConfigurationManager(node.fpga_id()));
        }
        log::info!(
            "coordinator at {address} managing {} fpgas, {} reconfigurable regions",
            nodes.len(),
            nodes
                .iter()
                .map(VFpgaManager::reconfigurable_region_count)
                .sum::<usize>()
        );
        Ok(Self {
            config,
            scheduler,
            nodes,
            arena: VFpgaArena::new(),
            store,
            task_ids: IdGenerator::starting_at(1),
            task_accelerators: BTreeMap::new(),
            twins: BTreeMap::new(),
            pending_batches: VecDeque::new(),
            batch_active: false,
            next_update: None,
            waiting: VecDeque::new(),
            submitted: Vec::new(),
            on_cpu: BTreeMap::new(),
            cpu_started: BTreeMap::new(),
            finished: Vec::new(),
            cloudlets: BTreeMap::new(),
            finished_cloudlets: Vec::new(),
            addresses,
            routes,
            address,
            last_outcome: None,
        })
    }

    /// Returns the runtime parameters.
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Returns the per-fabric managers.
    pub fn nodes(&self) -> &[VFpgaManager] {
        &self.nodes
    }

    /// Returns the virtual FPGA arena.
    pub fn vfpgas(&self) -> &VFpgaArena {
        &self.arena
    }

    /// Sum of reconfigurable regions over all fabrics.
    pub fn total_region_count(&self) -> usize {
        self.nodes
            .iter()
            .map(VFpgaManager::reconfigurable_region_count)
            .sum()
    }

    /// Segments waiting for a virtual FPGA.
    pub fn waiting_segments(&self) -> impl Iterator<Item = &AccelerableSegment> {
        self.waiting.iter()
    }

    /// Number of segments running on virtual FPGAs.
    pub fn submitted_count(&self) -> usize {
        self.submitted.len()
    }

    /// Finished segments in completion order.
    pub fn finished_segments(&self) -> &[SegmentRecord] {
        &self.finished
    }

    /// Finished cloudlets in completion order.
    pub fn finished_cloudlets(&self) -> &[CloudletSummary] {
        &self.finished_cloudlets
    }

    /// The most recent schedule.
    pub fn last_outcome(&self) -> Option<&ScheduleOutcome> {
        self.last_outcome.as_ref()
    }

    /// One record per virtual FPGA ever created.
    pub fn vfpga_records(&self) -> Vec<VFpgaRecord> {
        self.arena.values().map(VFpgaRecord::from).collect()
    }

    /// Resource shares of every virtual FPGA ever created.
    pub fn utilization(&self) -> Vec<(VFpgaId, vfab_fabric::UtilizationSnapshot)> {
        self.arena
            .iter()
            .filter_map(|(id, v)| {
                let node = self.nodes.iter().find(|n| n.fpga_id() == v.fpga())?;
                Some((id, node.utilization(v)))
            })
            .collect()
    }

    /// Collects every report into one value.
    pub fn report(&self) -> ExecutionReport {
        ExecutionReport {
            segments: self.finished.clone(),
            cloudlets: self.finished_cloudlets.clone(),
            vfpgas: self.vfpga_records(),
            utilization: self.utilization(),
            schedule: self.last_outcome.clone(),
        }
    }

    /// Accepts a cloudlet: its non-accelerable part starts on the CPU now and
    /// its segments join the waiting queue.
    pub fn submit_cloudlet<K: EventKernel<Event>>(
        &mut self,
        kernel: &mut K,
        mut cloudlet: AccelerableCloudlet,
    ) -> Result<(), CoordinatorError> {
        let id = cloudlet.id();
        if self.cloudlets.contains_key(&id) {
            return Err(CoordinatorError::DuplicateCloudlet(id));
        }
        let cpu_length = cloudlet.non_accelerable_length();
        let segments = cloudlet.take_segments();
        let parts = segments.len() + usize::from(cpu_length > 0);
        let tracker = CloudletTracker::new(id, cloudlet.length(), parts);
        if let Some(summary) = tracker.summary() {
            self.complete_cloudlet(summary);
            return Ok(());
        }
        self.cloudlets.insert(id, tracker);

        if cpu_length > 0 {
            self.cpu_started.insert(id, kernel.now());
            kernel.schedule_at(
                self.config.cpu_time(cpu_length),
                Event::CpuPortionFinished {
                    cloudlet: id,
                    segment: None,
                },
            );
        }
        log::info!(
            "cloudlet {id}: {} MI on cpu, {} segments submitted",
            cpu_length,
            segments.len()
        );
        for segment in segments {
            if self.nodes.is_empty() {
                self.run_on_cpu(kernel, segment);
            } else {
                self.waiting.push_back(segment);
            }
        }
        Ok(())
    }

    /// Queues a batch of accelerator requests for scheduling.
    pub fn submit_requests<K: EventKernel<Event>>(
        &mut self,
        kernel: &mut K,
        accelerators: Vec<AcceleratorId>,
    ) -> Result<(), CoordinatorError> {
        if let Some(&unknown) = accelerators
            .iter()
            .find(|&&id| self.store.find(id).is_none())
        {
            return Err(CoordinatorError::UnknownAccelerator(unknown));
        }
        log::info!("received a batch of {} accelerator requests", accelerators.len());
        self.pending_batches.push_back(accelerators);
        if !self.batch_active {
            kernel.schedule_at(SimTime::ZERO, Event::ScheduleBatch);
        }
        Ok(())
    }

    /// Handles one kernel event.
    pub fn handle<K: EventKernel<Event>>(
        &mut self,
        kernel: &mut K,
        event: Event,
    ) -> Result<(), CoordinatorError> {
        match event {
            Event::ScheduleBatch => self.schedule_batch(kernel),
            Event::UpdateProcessing => {
                let now = kernel.now();
                if self.next_update.is_some_and(|t| t <= now) {
                    self.next_update = None;
                }
                self.update_processing(kernel)
            }
            Event::Deliver { to, payload } => self.deliver(kernel, to, payload),
            Event::ReconfigurationFinished { fpga, vfpga } => {
                self.reconfiguration_finished(kernel, fpga, vfpga)
            }
            Event::CpuPortionFinished { cloudlet, segment } => {
                self.cpu_portion_finished(kernel.now(), cloudlet, segment);
                Ok(())
            }
        }
    }

    /// Sends every still-waiting segment to the CPU once nothing else can
    /// serve it. Returns `true` if any work was scheduled.
    pub fn drain<K: EventKernel<Event>>(&mut self, kernel: &mut K) -> bool {
        if self.batch_active || !self.pending_batches.is_empty() || self.waiting.is_empty() {
            return false;
        }
        log::warn!(
            "{} segments left without a virtual FPGA, running them on the cpu",
            self.waiting.len()
        );
        self.divert_waiting(kernel);
        true
    }

    fn schedule_batch<K: EventKernel<Event>>(
        &mut self,
        kernel: &mut K,
    ) -> Result<(), CoordinatorError> {
        if self.batch_active {
            return Ok(());
        }
        let Some(batch) = self.pending_batches.pop_front() else {
            return Ok(());
        };

        if self.nodes.is_empty() {
            log::warn!("no fpgas available, running the batch on the cpu");
            self.divert_waiting(kernel);
            return self.schedule_next_batch(kernel);
        }

        let mut tasks = Vec::with_capacity(batch.len());
        for accelerator in batch {
            let netlist = self
                .store
                .find(accelerator)
                .ok_or(CoordinatorError::UnknownAccelerator(accelerator))?;
            let task = ConfigurationTask {
                id: self.task_ids.next_id(),
                accelerator,
                region_count: netlist.region_count,
                exec_time: netlist.exec_time,
                deadline: netlist.deadline,
            };
            tasks.push(task);
        }

        let region_count = self.total_region_count();
        let outcome = match self.scheduler.schedule(region_count, &tasks) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("region scheduling failed ({e}), running the batch on the cpu");
                self.divert_waiting(kernel);
                return self.schedule_next_batch(kernel);
            }
        };
        log::info!(
            "scheduled {} tasks: completion {} slots (seed {}), {} iterations in {:?}",
            tasks.len(),
            outcome.completion_time,
            outcome.initial_completion_time,
            outcome.iterations,
            outcome.duration
        );
        if !outcome.deadlines_met {
            log::warn!("no schedule meets every deadline, running the seed schedule");
        }

        let mut first = 0;
        for node in &mut self.nodes {
            let count = node.reconfigurable_region_count();
            node.load_tiles(TileTable::slice(&outcome.solution, first, count));
            first += count;
        }
        for task in &tasks {
            self.task_accelerators.insert(task.id, task.accelerator);
            let expected = self
                .nodes
                .iter()
                .filter(|n| n.tiles().contains(task.id))
                .count();
            self.twins.insert(
                task.id,
                TwinGroup {
                    expected,
                    ready: Vec::new(),
                },
            );
        }

        self.last_outcome = Some(outcome);
        self.batch_active = true;
        self.request_update(kernel, SimTime::ZERO);
        Ok(())
    }

    fn schedule_next_batch<K: EventKernel<Event>>(
        &mut self,
        kernel: &mut K,
    ) -> Result<(), CoordinatorError> {
        if !self.pending_batches.is_empty() {
            kernel.schedule_at(SimTime::ZERO, Event::ScheduleBatch);
        }
        Ok(())
    }

    fn request_update<K: EventKernel<Event>>(&mut self, kernel: &mut K, delay: SimTime) {
        let now = kernel.now();
        let at = now + delay;
        if let Some(pending) = self.next_update {
            if pending >= now && pending <= at {
                return;
            }
        }
        self.next_update = Some(at);
        kernel.schedule_at(delay, Event::UpdateProcessing);
    }

    fn update_processing<K: EventKernel<Event>>(
        &mut self,
        kernel: &mut K,
    ) -> Result<(), CoordinatorError> {
        let now = kernel.now();
        let granularity = self.config.min_time_between_events;

        let mut next_wakeup = SimTime::NEVER;
        let mut finished = Vec::new();
        for node in &mut self.nodes {
            let step = node.step(now, &mut self.arena, granularity);
            next_wakeup = next_wakeup.min(step.next_wakeup);
            finished.extend(step.finished);
        }

        for &id in &finished {
            self.reconcile_twins(id)?;
        }

        let mut destroyed = Vec::new();
        for node in &mut self.nodes {
            destroyed.extend(node.reclaim(&mut self.arena)?);
        }
        for id in destroyed {
            self.teardown(kernel, id);
        }

        let mut requests = Vec::new();
        for node in &mut self.nodes {
            requests.extend(node.scan());
        }
        for request in requests {
            let Some(node) = self.nodes.iter().find(|n| n.fpga_id() == request.fpga) else {
                return Err(CoordinatorError::UnknownFpga(request.fpga));
            };
            let Some(to) = node.config().address() else {
                return Err(InternalError::new(format!(
                    "fpga {} has no configuration address",
                    request.fpga
                ))
                .into());
            };
            let accelerator = self.task_accelerators.get(&request.task).copied().ok_or_else(|| {
                InternalError::new(format!("task {} has no accelerator", request.task))
            })?;
            let netlist = self
                .store
                .find(accelerator)
                .ok_or(CoordinatorError::UnknownAccelerator(accelerator))?;
            kernel.schedule_at(
                SimTime::ZERO,
                Event::Deliver {
                    to,
                    payload: Payload::ConfigureRegions {
                        bitstream: netlist.bitstream(),
                        request,
                    },
                },
            );
        }

        if self.batch_active && self.nodes.iter().all(|n| !n.has_pending_work()) {
            self.batch_active = false;
            self.twins.clear();
            self.task_accelerators.clear();
            log::info!("batch complete at {now}");
            if self.pending_batches.is_empty() && !self.waiting.is_empty() {
                log::warn!(
                    "{} segments still waiting after the batch drained, running them on the cpu",
                    self.waiting.len()
                );
                self.divert_waiting(kernel);
            }
            self.schedule_next_batch(kernel)?;
        }

        if next_wakeup.is_finite() {
            self.request_update(kernel, next_wakeup);
        }
        Ok(())
    }

    /// Copies a finished primary's timestamps to every twin and stamps the
    /// twins finished, before any of them is reclaimed.
    fn reconcile_twins(&mut self, id: VFpgaId) -> Result<(), CoordinatorError> {
        let primary = self.arena[id].clone();
        if primary.role() != TwinRole::Primary {
            return Ok(());
        }
        let Some(group) = self.twins.get(&primary.task()) else {
            return Ok(());
        };
        for &twin_id in &group.ready {
            if twin_id == id {
                continue;
            }
            let twin = &mut self.arena[twin_id];
            if twin.task() != primary.task() {
                let err = InternalError::new(format!(
                    "vfpga {twin_id} is filed under task {} but realizes task {}",
                    primary.task(),
                    twin.task()
                ));
                log::error!("{err}");
                return Err(err.into());
            }
            if matches!(twin.state(), VFpgaState::Finishing | VFpgaState::Destroyed) {
                continue;
            }
            twin.adopt_timestamps(&primary);
            if let Some(at) = primary.destroyed_at() {
                twin.finish(at);
            }
        }
        Ok(())
    }

    fn teardown<K: EventKernel<Event>>(&mut self, kernel: &mut K, id: VFpgaId) {
        let vfpga = &mut self.arena[id];
        if let Some(addr) = vfpga.address() {
            self.routes.unregister(addr);
            self.addresses.release_address(addr);
        }
        if vfpga.role() == TwinRole::Secondary {
            return;
        }
        let segment = vfpga.take_output();
        kernel.schedule_at(
            SimTime::ZERO,
            Event::Deliver {
                to: self.address,
                payload: Payload::SegmentOutput { vfpga: id, segment },
            },
        );
    }

    fn deliver<K: EventKernel<Event>>(
        &mut self,
        kernel: &mut K,
        to: Address,
        payload: Payload,
    ) -> Result<(), CoordinatorError> {
        let Some(endpoint) = self.routes.resolve(to) else {
            log::warn!("no route to {to}, dropping {} payload", payload.kind());
            return Ok(());
        };
        match (endpoint, payload) {
            (Endpoint::ConfigurationManager(fpga), Payload::ConfigureRegions { bitstream, request }) => {
                let netlist = self
                    .store
                    .find(bitstream.accelerator)
                    .ok_or(CoordinatorError::UnknownAccelerator(bitstream.accelerator))?;
                let node = self
                    .nodes
                    .iter_mut()
                    .find(|n| n.fpga_id() == fpga)
                    .ok_or(CoordinatorError::UnknownFpga(fpga))?;
                let configuration_time = node.config().configuration_time(bitstream.size_mb);
                match node.configure(&request, netlist.instantiate(), configuration_time, &mut self.arena) {
                    Some(vfpga) => {
                        log::debug!(
                            "fpga {fpga}: loading {} MB bitstream for task {} into vfpga {vfpga}",
                            bitstream.size_mb,
                            request.task
                        );
                        kernel.schedule_at(
                            configuration_time,
                            Event::ReconfigurationFinished { fpga, vfpga },
                        );
                    }
                    None => {
                        let retry = self.config.min_time_between_events;
                        self.request_update(kernel, retry);
                    }
                }
            }
            (Endpoint::Coordinator, Payload::VFpgaReady { vfpga }) => {
                self.vfpga_ready(kernel, vfpga)?;
            }
            (Endpoint::VFpga(vfpga), Payload::SegmentInput { segment }) => {
                let now = kernel.now();
                match self.arena[vfpga].submit(segment, self.config.transfer_time, now) {
                    Ok(estimate) => {
                        log::debug!("vfpga {vfpga}: segment accepted, estimated {estimate}");
                        self.request_update(kernel, SimTime::ZERO);
                    }
                    Err(AcceleratorError::Busy { segment, .. }) => {
                        log::warn!("vfpga {vfpga} is busy, segment {} requeued", segment.unique_id());
                        self.submitted
                            .retain(|&key| key != (segment.cloudlet(), segment.id()));
                        self.waiting.push_front(*segment);
                    }
                    Err(AcceleratorError::TooLong { segment, max, .. }) => {
                        log::warn!(
                            "segment {} exceeds {max} MI, running it on the cpu",
                            segment.unique_id()
                        );
                        self.submitted
                            .retain(|&key| key != (segment.cloudlet(), segment.id()));
                        self.run_on_cpu(kernel, *segment);
                        let task = self.arena[vfpga].task();
                        let ready = self
                            .twins
                            .get(&task)
                            .map_or_else(|| vec![vfpga], |g| g.ready.clone());
                        for id in ready {
                            self.arena[id].mark_idle();
                        }
                        self.request_update(kernel, SimTime::ZERO);
                    }
                }
            }
            (Endpoint::Coordinator, Payload::SegmentOutput { vfpga, segment }) => {
                self.segment_output(kernel.now(), vfpga, segment);
            }
            (endpoint, payload) => {
                log::warn!("{endpoint:?} does not accept {} payloads", payload.kind());
            }
        }
        Ok(())
    }

    fn reconfiguration_finished<K: EventKernel<Event>>(
        &mut self,
        kernel: &mut K,
        fpga: FpgaId,
        vfpga: VFpgaId,
    ) -> Result<(), CoordinatorError> {
        let now = kernel.now();
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.fpga_id() == fpga)
            .ok_or(CoordinatorError::UnknownFpga(fpga))?;
        node.on_reconfiguration_complete(vfpga, &mut self.arena, now)?;

        let addr = self
            .addresses
            .request_address()
            .ok_or(CoordinatorError::AddressesExhausted)?;
        self.arena[vfpga].set_address(addr);
        self.routes.register(addr, Endpoint::VFpga(vfpga));
        log::debug!("vfpga {vfpga} reachable at {addr}");

        kernel.schedule_at(
            SimTime::ZERO,
            Event::Deliver {
                to: self.address,
                payload: Payload::VFpgaReady { vfpga },
            },
        );
        Ok(())
    }

    /// Dispatches the first matching waiting segment once every twin of the
    /// task is ready; otherwise marks the instances idle.
    fn vfpga_ready<K: EventKernel<Event>>(
        &mut self,
        kernel: &mut K,
        vfpga: VFpgaId,
    ) -> Result<(), CoordinatorError> {
        let task = self.arena[vfpga].task();
        let group = self.twins.entry(task).or_insert_with(|| TwinGroup {
            expected: 1,
            ready: Vec::new(),
        });
        group.ready.push(vfpga);
        if group.ready.len() < group.expected {
            log::debug!(
                "vfpga {vfpga} ready, task {task} waits for {} more fabrics",
                group.expected - group.ready.len()
            );
            return Ok(());
        }

        let ready = group.ready.clone();
        let primary = ready[0];
        if ready.len() > 1 {
            for &id in &ready {
                let role = if id == primary {
                    TwinRole::Primary
                } else {
                    TwinRole::Secondary
                };
                self.arena[id].set_role(role);
            }
        }

        let kind = self.arena[primary].accelerator().spec().kind;
        let Some(pos) = self.waiting.iter().position(|s| s.kind() == kind) else {
            log::warn!("vfpga {primary} remains idle: no waiting {kind} segment");
            for &id in &ready {
                self.arena[id].mark_idle();
            }
            self.request_update(kernel, SimTime::ZERO);
            return Ok(());
        };
        let Some(segment) = self.waiting.remove(pos) else {
            return Ok(());
        };
        let to = self.arena[primary].address().ok_or_else(|| {
            InternalError::new(format!("vfpga {primary} is ready without an address"))
        })?;
        log::info!(
            "segment {} dispatched to vfpga {primary} at {to}",
            segment.unique_id()
        );
        self.submitted.push((segment.cloudlet(), segment.id()));
        kernel.schedule_at(
            SimTime::ZERO,
            Event::Deliver {
                to,
                payload: Payload::SegmentInput { segment },
            },
        );
        Ok(())
    }

    fn segment_output(&mut self, now: SimTime, vfpga: VFpgaId, segment: Option<AccelerableSegment>) {
        let instance = &self.arena[vfpga];
        let Some(segment) = segment else {
            log::info!(
                "vfpga {vfpga} destroyed without processing a segment (created {})",
                instance.created_at().unwrap_or(now)
            );
            return;
        };
        let placement = Placement::Fpga {
            fpga: instance.fpga(),
            vfpga,
        };
        self.submitted
            .retain(|&key| key != (segment.cloudlet(), segment.id()));
        let record = SegmentRecord::new(&segment, now, now, placement);
        log::info!(
            "segment {} finished on vfpga {vfpga} in {}",
            record.unique_id(),
            record.execution_time()
        );
        self.finish_segment(record);
    }

    fn run_on_cpu<K: EventKernel<Event>>(&mut self, kernel: &mut K, mut segment: AccelerableSegment) {
        segment.mark_started(kernel.now());
        let delay = self.config.cpu_time(segment.length());
        let (cloudlet, id) = (segment.cloudlet(), segment.id());
        log::debug!("segment {} runs on the cpu for {delay}", segment.unique_id());
        self.on_cpu.insert((cloudlet, id), segment);
        kernel.schedule_at(
            delay,
            Event::CpuPortionFinished {
                cloudlet,
                segment: Some(id),
            },
        );
    }

    fn divert_waiting<K: EventKernel<Event>>(&mut self, kernel: &mut K) {
        while let Some(segment) = self.waiting.pop_front() {
            self.run_on_cpu(kernel, segment);
        }
    }

    fn cpu_portion_finished(&mut self, now: SimTime, cloudlet: CloudletId, segment: Option<SegmentId>) {
        match segment {
            Some(id) => {
                let Some(mut segment) = self.on_cpu.remove(&(cloudlet, id)) else {
                    log::warn!("cpu finished unknown segment {id}-{cloudlet}");
                    return;
                };
                segment.mark_finished(now);
                self.finish_segment(SegmentRecord::new(&segment, now, now, Placement::Cpu));
            }
            None => {
                let started = self.cpu_started.remove(&cloudlet).unwrap_or(now);
                let Some(tracker) = self.cloudlets.get_mut(&cloudlet) else {
                    return;
                };
                if let Some(summary) = tracker.finish_part(started, now) {
                    self.cloudlets.remove(&cloudlet);
                    self.complete_cloudlet(summary);
                }
            }
        }
    }

    fn finish_segment(&mut self, record: SegmentRecord) {
        let cloudlet = record.cloudlet;
        let window = (record.started_at, record.finished_at);
        self.finished.push(record);
        if let Some(tracker) = self.cloudlets.get_mut(&cloudlet) {
            if let Some(summary) = tracker.finish_part(window.0, window.1) {
                self.cloudlets.remove(&cloudlet);
                self.complete_cloudlet(summary);
            }
        }
    }

    fn complete_cloudlet(&mut self, summary: CloudletSummary) {
        log::info!(
            "cloudlet {} finished: {} to {}",
            summary.cloudlet,
            summary.started_at,
            summary.finished_at
        );
        self.finished_cloudlets.push(summary);
    }
}
