//! `vfab schedule`: run only the region scheduler over the scenario's batches.

use crate::{render, scenario, GlobalArgs, ReportFormat, ScheduleArgs};
use vfab_common::{AcceleratorId, IdGenerator, TaskId};
use vfab_config::ScenarioConfig;
use vfab_sched::{AnnealingScheduler, ConfigurationTask, RegionScheduler, ScheduleOutcome};

/// Reconfigurable regions over every configured fabric.
fn region_count(config: &ScenarioConfig) -> usize {
    config
        .fpgas
        .iter()
        .map(|f| f.partition.region_count() - f.partition.static_regions)
        .sum()
}

/// Turns each request batch into scheduling tasks, numbering tasks from 1.
fn batch_tasks(config: &ScenarioConfig) -> Vec<Vec<ConfigurationTask>> {
    let mut ids: IdGenerator<TaskId> = IdGenerator::starting_at(1);
    config
        .batches()
        .into_iter()
        .map(|batch| {
            batch
                .into_iter()
                .filter_map(|accel| config.accelerator(accel))
                .map(|accel| ConfigurationTask {
                    id: ids.next_id(),
                    accelerator: AcceleratorId::from_raw(accel.id),
                    region_count: accel.regions,
                    exec_time: accel.exec_time,
                    deadline: accel.deadline,
                })
                .collect()
        })
        .collect()
}

/// Runs the `vfab schedule` command.
pub fn run(args: &ScheduleArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = scenario::load(global)?;
    let scheduler = AnnealingScheduler::new(scenario::annealing_params(&config, args.seed));
    let regions = region_count(&config);

    let mut outcomes: Vec<ScheduleOutcome> = Vec::new();
    for tasks in batch_tasks(&config) {
        outcomes.push(scheduler.schedule(regions, &tasks)?);
    }

    match args.format {
        ReportFormat::Text => {
            for (i, outcome) in outcomes.iter().enumerate() {
                if !global.quiet {
                    println!("== batch {i} over {regions} regions ==");
                }
                print!("{}", render::schedule(outcome));
            }
        }
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&outcomes)?),
    }
    Ok(if outcomes.iter().all(|o| o.deadlines_met) { 0 } else { 1 })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tasks_are_numbered_across_batches() {
        let config = vfab_config::load_config_from_str(
            r#"
[[fpgas]]
[fpgas.partition]
rows = 2
cols = 2
static_regions = 1

[[accelerators]]
id = 0
type = "encryption"
mflops = 1
concurrency = 1
regions = 2
exec_time = 3
deadline = 5

[[requests]]
accelerator = 0
count = 2

[[requests]]
accelerator = 0
batch = 1
"#,
        )
        .unwrap();
        assert_eq!(region_count(&config), 3);
        let batches = batch_tasks(&config);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 2);
        assert_eq!(batches[1][0].id, TaskId::from_raw(3));
        assert_eq!(batches[1][0].region_count, 2);
    }
}
