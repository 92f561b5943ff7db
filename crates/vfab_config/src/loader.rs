//! Scenario file loading and validation.

use crate::error::ConfigError;
use crate::types::{AcceleratorConfig, FpgaConfig, ScenarioConfig};
use std::collections::BTreeSet;
use std::path::Path;
use vfab_accel::MAX_SEGMENT_LENGTH;
use vfab_fabric::SUPPORTED_BUS_WIDTHS;

/// File name looked up in a scenario directory.
pub const DEFAULT_CONFIG_FILE: &str = "vfab.toml";

/// Loads and validates `<dir>/vfab.toml`.
pub fn load_config(dir: &Path) -> Result<ScenarioConfig, ConfigError> {
    load_config_file(&dir.join(DEFAULT_CONFIG_FILE))
}

/// Loads and validates a scenario from an explicit path.
pub fn load_config_file(path: &Path) -> Result<ScenarioConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a scenario from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<ScenarioConfig, ConfigError> {
    let config: ScenarioConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn invalid(msg: String) -> ConfigError {
    ConfigError::ValidationError(msg)
}

// NaN fails both.
fn positive(x: f64) -> bool {
    x > 0.0
}

fn non_negative(x: f64) -> bool {
    x >= 0.0
}

/// Checks cross-field consistency that serde cannot express.
fn validate_config(config: &ScenarioConfig) -> Result<(), ConfigError> {
    let sim = &config.simulation;
    if !non_negative(sim.min_time_between_events) {
        return Err(invalid(
            "simulation.min_time_between_events must be non-negative".to_string(),
        ));
    }
    if !positive(sim.vm_mips) || sim.vm_pes == 0 {
        return Err(invalid(
            "simulation.vm_mips and simulation.vm_pes must be positive".to_string(),
        ));
    }
    if !non_negative(sim.transfer_time) {
        return Err(invalid(
            "simulation.transfer_time must be non-negative".to_string(),
        ));
    }

    let sched = &config.scheduler;
    if !(sched.cooling_rate > 0.0 && sched.cooling_rate < 1.0) {
        return Err(invalid(format!(
            "scheduler.cooling_rate {} is outside (0, 1)",
            sched.cooling_rate
        )));
    }
    if !positive(sched.temperature) {
        return Err(invalid("scheduler.temperature must be positive".to_string()));
    }

    for (i, fpga) in config.fpgas.iter().enumerate() {
        validate_fpga(i, fpga)?;
    }

    let mut ids = BTreeSet::new();
    for accel in &config.accelerators {
        if !ids.insert(accel.id) {
            return Err(invalid(format!("duplicate accelerator id {}", accel.id)));
        }
        validate_accelerator(accel)?;
    }

    for request in &config.requests {
        if !ids.contains(&request.accelerator) {
            return Err(invalid(format!(
                "request names unknown accelerator {}",
                request.accelerator
            )));
        }
    }

    for (i, cloudlet) in config.cloudlets.iter().enumerate() {
        for segment in &cloudlet.segments {
            if segment.length == 0 {
                return Err(invalid(format!("cloudlets[{i}]: zero-length segment")));
            }
            if segment.length > MAX_SEGMENT_LENGTH {
                return Err(invalid(format!(
                    "cloudlets[{i}]: segment of {} MI exceeds the {MAX_SEGMENT_LENGTH} MI limit",
                    segment.length
                )));
            }
        }
    }
    Ok(())
}

fn validate_fpga(i: usize, fpga: &FpgaConfig) -> Result<(), ConfigError> {
    let partition = &fpga.partition;
    if partition.rows == 0 || partition.cols == 0 {
        return Err(invalid(format!(
            "fpgas[{i}]: partition grid {}x{} has a zero dimension",
            partition.rows, partition.cols
        )));
    }
    if partition.static_regions >= partition.region_count() {
        return Err(invalid(format!(
            "fpgas[{i}]: {} static regions leave none of {} reconfigurable",
            partition.static_regions,
            partition.region_count()
        )));
    }
    if !SUPPORTED_BUS_WIDTHS.contains(&fpga.configuration.bus_width) {
        return Err(invalid(format!(
            "fpgas[{i}]: unsupported bus width {} (expected one of {:?})",
            fpga.configuration.bus_width, SUPPORTED_BUS_WIDTHS
        )));
    }
    if !positive(fpga.clock_mhz) || !positive(fpga.configuration.clock_mhz) {
        return Err(invalid(format!("fpgas[{i}]: clocks must be positive")));
    }
    Ok(())
}

fn validate_accelerator(accel: &AcceleratorConfig) -> Result<(), ConfigError> {
    if !positive(accel.mflops) || accel.concurrency == 0 {
        return Err(invalid(format!(
            "accelerator {}: mflops and concurrency must be positive",
            accel.id
        )));
    }
    if accel.regions == 0 || accel.exec_time == 0 {
        return Err(invalid(format!(
            "accelerator {}: regions and exec_time must be positive",
            accel.id
        )));
    }
    if !positive(accel.clock_mhz) || !non_negative(accel.bitstream_mb) {
        return Err(invalid(format!(
            "accelerator {}: invalid clock or bitstream size",
            accel.id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vfab_accel::AcceleratorType;

    const SCENARIO: &str = r#"
[simulation]
vm_mips = 2000
vm_pes = 2
transfer_time = 0.05

[scheduler]
seed = 7

[[fpgas]]
brand = "Intel"
model = "Stratix V"
logic_elements = 4000
block_ram = 40
plls = 2
length = 100
width = 100

[fpgas.partition]
rows = 2
cols = 2
static_regions = 1

[fpgas.configuration]
bus_width = 16

[[accelerators]]
id = 0
type = "image_processing"
mflops = 400
concurrency = 40
regions = 2
exec_time = 1
deadline = 3
bitstream_mb = 2.5

[[requests]]
accelerator = 0
count = 3

[[cloudlets]]
length = 1000

[[cloudlets.segments]]
index = 0
length = 48
type = "image_processing"
"#;

    fn with(find: &str, replace: &str) -> Result<ScenarioConfig, ConfigError> {
        load_config_from_str(&SCENARIO.replace(find, replace))
    }

    #[test]
    fn parse_full_scenario() {
        let config = load_config_from_str(SCENARIO).unwrap();
        assert_eq!(config.simulation.vm_pes, 2);
        assert_eq!(config.simulation.transfer_time, 0.05);
        assert_eq!(config.simulation.min_time_between_events, 0.01);
        assert_eq!(config.scheduler.seed, Some(7));
        assert_eq!(config.scheduler.iteration_threshold, 6);

        let fpga = &config.fpgas[0];
        assert_eq!(fpga.partition.region_count(), 4);
        assert_eq!(fpga.configuration.bus_width, 16);
        assert_eq!(fpga.configuration.clock_mhz, 100.0);
        assert_eq!(fpga.capacity().plls, 2);

        let accel = config.accelerator(0).unwrap();
        assert_eq!(accel.kind, AcceleratorType::ImageProcessing);
        assert_eq!(config.batches(), vec![vec![0, 0, 0]]);
        assert_eq!(config.cloudlets[0].segments[0].length, 48);
    }

    #[test]
    fn empty_scenario_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert!(config.fpgas.is_empty());
        assert_eq!(config.simulation.vm_mips, 1000.0);
        assert_eq!(config.scheduler.temperature, 10_000.0);
        assert_eq!(config.scheduler.cooling_rate, 0.001);
        assert!(config.batches().is_empty());
    }

    #[test]
    fn requests_group_by_batch() {
        let config = load_config_from_str(
            r#"
[[accelerators]]
id = 1
type = "fft"
mflops = 10
concurrency = 1
regions = 1
exec_time = 1
deadline = 2

[[requests]]
accelerator = 1
batch = 2

[[requests]]
accelerator = 1
count = 2
"#,
        )
        .unwrap();
        assert_eq!(config.batches(), vec![vec![1, 1], vec![1]]);
    }

    #[test]
    fn zero_grid_dimension_is_rejected() {
        let err = with("rows = 2", "rows = 0").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn all_static_regions_is_rejected() {
        let err = with("static_regions = 1", "static_regions = 4").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn unsupported_bus_width_is_rejected() {
        let err = with("bus_width = 16", "bus_width = 24").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn cooling_rate_must_be_a_fraction() {
        let err = with("seed = 7", "seed = 7\ncooling_rate = 1.0").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn unknown_request_accelerator_is_rejected() {
        let err = with("accelerator = 0", "accelerator = 5").unwrap_err();
        assert!(format!("{err}").contains("unknown accelerator 5"));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let err = with("concurrency = 40", "concurrency = 0").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn unknown_accelerator_type_is_a_parse_error() {
        let err = with("type = \"image_processing\"\nmflops", "type = \"crypto\"\nmflops")
            .unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn overlong_segment_is_rejected() {
        let err = with("length = 48", "length = 18446744073710").unwrap_err();
        assert!(format!("{err}").contains("exceeds"));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), SCENARIO).unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.fpgas.len(), 1);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
