//! Configuration types deserialized from `vfab.toml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vfab_accel::AcceleratorType;
use vfab_fabric::Resources;

/// The top-level scenario parsed from `vfab.toml`.
///
/// Every section is optional. An empty file describes a run with no fabrics
/// and no work.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScenarioConfig {
    /// Kernel and VM settings.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Annealing parameters.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Physical FPGAs, in id order.
    #[serde(default)]
    pub fpgas: Vec<FpgaConfig>,
    /// The netlist catalog.
    #[serde(default)]
    pub accelerators: Vec<AcceleratorConfig>,
    /// Accelerator requests, grouped into batches by [`RequestConfig::batch`].
    #[serde(default)]
    pub requests: Vec<RequestConfig>,
    /// The cloudlet workload, in id order.
    #[serde(default)]
    pub cloudlets: Vec<CloudletConfig>,
}

impl ScenarioConfig {
    /// Looks up a catalog entry by id.
    pub fn accelerator(&self, id: u32) -> Option<&AcceleratorConfig> {
        self.accelerators.iter().find(|a| a.id == id)
    }

    /// Expands the requests into catalog ids per batch, in ascending batch order.
    pub fn batches(&self) -> Vec<Vec<u32>> {
        let mut batches: BTreeMap<usize, Vec<u32>> = BTreeMap::new();
        for request in &self.requests {
            batches
                .entry(request.batch)
                .or_default()
                .extend(std::iter::repeat(request.accelerator).take(request.count));
        }
        batches.into_values().collect()
    }
}

/// Settings of the event loop and the VM's CPU.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    /// Minimum delay between accelerator wakeups, in seconds.
    #[serde(default = "default_min_time_between_events")]
    pub min_time_between_events: f64,
    /// MIPS of one VM processing element.
    #[serde(default = "default_vm_mips")]
    pub vm_mips: f64,
    /// Processing elements of the VM.
    #[serde(default = "default_vm_pes")]
    pub vm_pes: u32,
    /// Input transfer delay per segment, in seconds.
    #[serde(default)]
    pub transfer_time: f64,
    /// Stop before the first event later than this, in seconds.
    #[serde(default)]
    pub time_limit: Option<f64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            min_time_between_events: default_min_time_between_events(),
            vm_mips: default_vm_mips(),
            vm_pes: default_vm_pes(),
            transfer_time: 0.0,
            time_limit: None,
        }
    }
}

fn default_min_time_between_events() -> f64 {
    0.01
}

fn default_vm_mips() -> f64 {
    1000.0
}

fn default_vm_pes() -> u32 {
    1
}

/// Simulated-annealing parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
    /// Initial temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Geometric cooling factor, in `(0, 1)`.
    #[serde(default = "default_cooling_rate")]
    pub cooling_rate: f64,
    /// Non-improving steps before the search stops.
    #[serde(default = "default_iteration_threshold")]
    pub iteration_threshold: usize,
    /// RNG seed for reproducible runs.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            cooling_rate: default_cooling_rate(),
            iteration_threshold: default_iteration_threshold(),
            seed: None,
        }
    }
}

fn default_temperature() -> f64 {
    10_000.0
}

fn default_cooling_rate() -> f64 {
    0.001
}

fn default_iteration_threshold() -> usize {
    6
}

/// One physical FPGA.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FpgaConfig {
    /// Vendor name.
    #[serde(default)]
    pub brand: String,
    /// Device model.
    #[serde(default)]
    pub model: String,
    /// Logic element capacity.
    #[serde(default)]
    pub logic_elements: u64,
    /// Memory register capacity.
    #[serde(default)]
    pub memory_registers: u64,
    /// Block RAM capacity.
    #[serde(default)]
    pub block_ram: u64,
    /// DSP slice capacity.
    #[serde(default)]
    pub dsp: u64,
    /// I/O pin capacity.
    #[serde(default)]
    pub io: u64,
    /// Transceiver capacity.
    #[serde(default)]
    pub transceivers: u64,
    /// PLL capacity.
    #[serde(default)]
    pub plls: u64,
    /// Fabric master clock in MHz.
    #[serde(default = "default_clock_mhz")]
    pub clock_mhz: f64,
    /// Floorplan length.
    #[serde(default = "default_extent")]
    pub length: u32,
    /// Floorplan width.
    #[serde(default = "default_extent")]
    pub width: u32,
    /// Region grid.
    pub partition: PartitionConfig,
    /// Configuration port.
    #[serde(default)]
    pub configuration: PortConfig,
}

impl FpgaConfig {
    /// The capacities as a [`Resources`] value.
    pub fn capacity(&self) -> Resources {
        Resources {
            logic_elements: self.logic_elements,
            memory_registers: self.memory_registers,
            block_ram: self.block_ram,
            dsp: self.dsp,
            io: self.io,
            transceivers: self.transceivers,
            plls: self.plls,
        }
    }
}

fn default_clock_mhz() -> f64 {
    100.0
}

fn default_extent() -> u32 {
    1
}

/// Grid partitioning of one fabric.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PartitionConfig {
    /// Region rows.
    pub rows: u32,
    /// Region columns.
    pub cols: u32,
    /// Leading regions reserved as static.
    #[serde(default)]
    pub static_regions: usize,
}

impl PartitionConfig {
    /// Total regions in the grid.
    pub fn region_count(&self) -> usize {
        self.rows as usize * self.cols as usize
    }
}

/// The partial-reconfiguration port of one fabric.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PortConfig {
    /// Port width in bits.
    #[serde(default = "default_bus_width")]
    pub bus_width: u32,
    /// Port clock in MHz.
    #[serde(default = "default_clock_mhz")]
    pub clock_mhz: f64,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            bus_width: default_bus_width(),
            clock_mhz: default_clock_mhz(),
        }
    }
}

fn default_bus_width() -> u32 {
    32
}

/// One netlist catalog entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AcceleratorConfig {
    /// Catalog id, referenced by requests.
    pub id: u32,
    /// Function implemented.
    #[serde(rename = "type")]
    pub kind: AcceleratorType,
    /// Throughput of one lane, in millions of operations per second.
    pub mflops: f64,
    /// Parallel lanes.
    pub concurrency: u32,
    /// Accelerator clock in MHz.
    #[serde(default = "default_clock_mhz")]
    pub clock_mhz: f64,
    /// Contiguous regions needed.
    pub regions: usize,
    /// Estimated execution time in slots.
    pub exec_time: usize,
    /// Deadline in slots.
    pub deadline: usize,
    /// Bitstream size in megabytes.
    #[serde(default)]
    pub bitstream_mb: f64,
}

/// `count` copies of one accelerator, requested as part of batch `batch`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RequestConfig {
    /// Catalog id.
    pub accelerator: u32,
    /// Copies requested.
    #[serde(default = "default_count")]
    pub count: usize,
    /// Batch number. Entries sharing a number are scheduled together.
    #[serde(default)]
    pub batch: usize,
}

fn default_count() -> usize {
    1
}

/// One cloudlet and its accelerable segments.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CloudletConfig {
    /// Total length in MI.
    pub length: u64,
    /// Accelerable segments.
    #[serde(default)]
    pub segments: Vec<SegmentConfig>,
}

/// One accelerable segment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SegmentConfig {
    /// First instruction, in MI.
    pub index: u64,
    /// Length in MI.
    pub length: u64,
    /// Required accelerator type.
    #[serde(rename = "type")]
    pub kind: AcceleratorType,
}
