//! `vfab check`: validate a scenario without running it.

use crate::{scenario, GlobalArgs};

/// Runs the `vfab check` command.
///
/// Loads and validates the scenario, then builds every fabric, the catalog
/// and the workload so construction errors surface too.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = scenario::load(global)?;
    let nodes = scenario::build_nodes(&config)?;
    let store = scenario::build_store(&config)?;
    let cloudlets = scenario::build_cloudlets(&config)?;

    if !global.quiet {
        let regions: usize = nodes.iter().map(|n| n.reconfigurable_region_count()).sum();
        let segments: usize = cloudlets.iter().map(|c| c.segments().len()).sum();
        println!(
            "ok: {} fpgas ({regions} reconfigurable regions), {} accelerators, {} batches, {} cloudlets ({segments} segments)",
            nodes.len(),
            store.len(),
            config.batches().len(),
            cloudlets.len(),
        );
    }
    Ok(0)
}
