//! Builds runtime components from a validated [`ScenarioConfig`].

use std::path::PathBuf;

use vfab_accel::{AccelerableCloudlet, AcceleratorSpec, Netlist, NetlistStore};
use vfab_common::{AcceleratorId, CloudletId, FpgaId, Frequency, SimTime};
use vfab_config::{FpgaConfig, ScenarioConfig, DEFAULT_CONFIG_FILE};
use vfab_coord::{Coordinator, CoordinatorConfig, SequentialAddresses};
use vfab_fabric::{ConfigurationManager, ConfigurationPort, Fpga, GridPartition};
use vfab_sched::{AnnealingParams, AnnealingScheduler};
use vfab_sim::Simulation;
use vfab_vfpga::VFpgaManager;

use crate::GlobalArgs;

type BoxError = Box<dyn std::error::Error>;

/// Resolves the scenario path: `--config` if given, else `./vfab.toml`.
pub fn config_path(global: &GlobalArgs) -> PathBuf {
    global
        .config
        .as_ref()
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from)
}

/// Loads the scenario named by the global arguments.
pub fn load(global: &GlobalArgs) -> Result<ScenarioConfig, BoxError> {
    let path = config_path(global);
    log::debug!("loading scenario from {}", path.display());
    Ok(vfab_config::load_config_file(&path)?)
}

/// Partitions one fabric and reserves its static regions.
pub fn build_fabric(id: u32, config: &FpgaConfig) -> Result<ConfigurationManager, BoxError> {
    let fpga = Fpga::builder(FpgaId::from_raw(id))
        .device(config.brand.clone(), config.model.clone())
        .capacity(config.capacity())
        .clock(Frequency::from_mhz(config.clock_mhz))
        .floorplan(config.length, config.width)
        .build();
    let port = ConfigurationPort::new(
        config.configuration.bus_width,
        Frequency::from_mhz(config.configuration.clock_mhz),
    )?;
    let mut cm = ConfigurationManager::new(fpga, port);
    cm.partition(&GridPartition::new(
        config.partition.rows,
        config.partition.cols,
    ))?;
    cm.initialize_static_regions(config.partition.static_regions)?;
    Ok(cm)
}

/// Builds one lifecycle manager per configured fabric.
pub fn build_nodes(config: &ScenarioConfig) -> Result<Vec<VFpgaManager>, BoxError> {
    config
        .fpgas
        .iter()
        .zip(0u32..)
        .map(|(fpga, id)| Ok(VFpgaManager::new(build_fabric(id, fpga)?)))
        .collect()
}

/// Builds the netlist catalog.
pub fn build_store(config: &ScenarioConfig) -> Result<NetlistStore, BoxError> {
    let mut store = NetlistStore::new();
    for accel in &config.accelerators {
        store.add(Netlist {
            accelerator: AcceleratorSpec {
                id: AcceleratorId::from_raw(accel.id),
                kind: accel.kind,
                mflops: accel.mflops,
                concurrency: accel.concurrency,
                clock: Frequency::from_mhz(accel.clock_mhz),
            },
            region_count: accel.regions,
            exec_time: accel.exec_time,
            deadline: accel.deadline,
            bitstream_mb: accel.bitstream_mb,
        })?;
    }
    Ok(store)
}

/// Builds the cloudlets, rejecting overlapping or out-of-range segments.
pub fn build_cloudlets(config: &ScenarioConfig) -> Result<Vec<AccelerableCloudlet>, BoxError> {
    let mut cloudlets = Vec::with_capacity(config.cloudlets.len());
    for (cfg, id) in config.cloudlets.iter().zip(0u32..) {
        let mut cloudlet = AccelerableCloudlet::new(CloudletId::from_raw(id), cfg.length);
        for segment in &cfg.segments {
            cloudlet.add_segment(segment.index, segment.length, segment.kind)?;
        }
        cloudlets.push(cloudlet);
    }
    Ok(cloudlets)
}

/// Annealing parameters, with `seed` overriding the scenario's seed.
pub fn annealing_params(config: &ScenarioConfig, seed: Option<u64>) -> AnnealingParams {
    AnnealingParams {
        temperature: config.scheduler.temperature,
        cooling_rate: config.scheduler.cooling_rate,
        iteration_threshold: config.scheduler.iteration_threshold,
        seed: seed.or(config.scheduler.seed),
    }
}

/// Coordinator runtime parameters.
pub fn coordinator_config(config: &ScenarioConfig) -> CoordinatorConfig {
    let sim = &config.simulation;
    CoordinatorConfig {
        min_time_between_events: SimTime::from_secs(sim.min_time_between_events),
        vm_mips: sim.vm_mips,
        vm_pes: sim.vm_pes,
        transfer_time: SimTime::from_secs(sim.transfer_time),
    }
}

/// Builds a simulation with every cloudlet and request batch submitted.
pub fn build_simulation(config: &ScenarioConfig, seed: Option<u64>) -> Result<Simulation, BoxError> {
    let coordinator = Coordinator::new(
        coordinator_config(config),
        AnnealingScheduler::new(annealing_params(config, seed)),
        build_nodes(config)?,
        build_store(config)?,
        Box::new(SequentialAddresses::default()),
    )?;
    let mut sim = Simulation::new(coordinator);
    if let Some(limit) = config.simulation.time_limit {
        sim = sim.with_time_limit(SimTime::from_secs(limit));
    }
    for cloudlet in build_cloudlets(config)? {
        sim.submit_cloudlet(cloudlet)?;
    }
    for batch in config.batches() {
        sim.submit_requests(batch.into_iter().map(AcceleratorId::from_raw).collect())?;
    }
    Ok(sim)
}
