//! `vfab run`: simulate a scenario end to end.

use crate::{render, scenario, GlobalArgs, ReportFormat, RunArgs};
use vfab_common::SimTime;

/// Runs the `vfab run` command.
///
/// Returns exit code 0 when every cloudlet finished, 1 when the time limit
/// cut the run short.
pub fn run(args: &RunArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let mut config = scenario::load(global)?;
    if let Some(limit) = args.time_limit {
        config.simulation.time_limit = Some(limit);
    }
    let mut sim = scenario::build_simulation(&config, args.seed)?;
    let summary = sim.run()?;
    let report = sim.report();

    match args.format {
        ReportFormat::Text => {
            print!("{}", render::report(&report));
            if global.verbose {
                if let Some(outcome) = sim.coordinator().last_outcome() {
                    print!("\n{}", render::schedule(outcome));
                }
            }
            if !global.quiet {
                println!(
                    "\nfinished at {} after {} events",
                    summary.final_time, summary.events_processed
                );
            }
        }
        ReportFormat::Json => {
            let value = serde_json::json!({
                "summary": summary,
                "report": report,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    if summary.stopped_by_limit {
        log::warn!(
            "stopped by the time limit at {}",
            config
                .simulation
                .time_limit
                .map_or(SimTime::NEVER, SimTime::from_secs)
        );
        return Ok(1);
    }
    Ok(0)
}
