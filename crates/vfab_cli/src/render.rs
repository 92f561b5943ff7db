//! Text rendering of execution reports.

use std::fmt::Write;

use vfab_coord::{ExecutionReport, Placement};
use vfab_fabric::ResourceKind;
use vfab_sched::ScheduleOutcome;

/// Renders schedule statistics and the occupancy matrix.
pub fn schedule(outcome: &ScheduleOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "completion {} slots (seed schedule {}), T_max {}",
        outcome.completion_time, outcome.initial_completion_time, outcome.t_max
    );
    let _ = writeln!(
        out,
        "{} iterations, {} stalls, {:?}, deadlines {}",
        outcome.iterations,
        outcome.stall_count,
        outcome.duration,
        if outcome.deadlines_met { "met" } else { "missed" }
    );
    let _ = write!(out, "{}", outcome.solution);
    out
}

/// Renders every table of a finished run.
pub fn report(report: &ExecutionReport) -> String {
    let mut out = String::new();

    if let Some(outcome) = &report.schedule {
        let _ = writeln!(out, "== schedule ==");
        out.push_str(&schedule(outcome));
        out.push('\n');
    }

    let _ = writeln!(out, "== segments ==");
    let _ = writeln!(
        out,
        "{:<10} {:<18} {:>8} {:>12} {:>12}  placement",
        "segment", "type", "MI", "start", "finish"
    );
    for s in &report.segments {
        let placement = match s.placement {
            Placement::Fpga { fpga, vfpga } => format!("fpga {fpga} / vfpga {vfpga}"),
            Placement::Cpu => "cpu".to_string(),
        };
        let _ = writeln!(
            out,
            "{:<10} {:<18} {:>8} {:>12} {:>12}  {placement}",
            s.unique_id(),
            s.kind.to_string(),
            s.finished_length,
            s.started_at.to_string(),
            s.finished_at.to_string()
        );
    }

    let _ = writeln!(out, "\n== cloudlets ==");
    for c in &report.cloudlets {
        let _ = writeln!(
            out,
            "cloudlet {:<4} {:>8} MI  {} -> {}",
            c.cloudlet, c.length, c.started_at, c.finished_at
        );
    }

    let _ = writeln!(out, "\n== virtual fpgas ==");
    for v in &report.vfpgas {
        let regions: Vec<String> = v.regions.iter().map(ToString::to_string).collect();
        let _ = writeln!(
            out,
            "vfpga {:<4} task {:<4} fpga {:<3} regions [{}] {:?} config {} created {} destroyed {} segment {}",
            v.vfpga,
            v.task,
            v.fpga,
            regions.join(","),
            v.role,
            v.configuration_time,
            v.created_at.map_or_else(|| "-".to_string(), |t| t.to_string()),
            v.destroyed_at.map_or_else(|| "-".to_string(), |t| t.to_string()),
            v.segment.as_deref().unwrap_or("-")
        );
    }

    let _ = writeln!(out, "\n== utilization ==");
    for (vfpga, snap) in &report.utilization {
        let shares: Vec<String> = ResourceKind::ALL
            .iter()
            .map(|&kind| format!("{kind} {:.1}%", snap.percent_for(kind)))
            .collect();
        let _ = writeln!(
            out,
            "vfpga {vfpga:<4} {} regions  {}  pll {}",
            snap.region_count,
            shares.join("  "),
            if snap.holds_pll { "yes" } else { "no" }
        );
    }
    out
}
