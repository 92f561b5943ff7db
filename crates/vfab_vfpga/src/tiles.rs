//! One fabric's slice of a global schedule.

use serde::{Deserialize, Serialize};
use std::fmt;
use vfab_common::TaskId;
use vfab_sched::ScheduleMatrix;

/// `rows[dynamic region][slot]` of task ids for one fabric.
///
/// Row `r` is the fabric's `r`-th dynamic region. Column `0` is slot 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TileTable {
    rows: Vec<Vec<Option<TaskId>>>,
}

impl TileTable {
    /// Cuts the global columns `first_region..first_region + count` out of a solution.
    pub fn slice(solution: &ScheduleMatrix, first_region: usize, count: usize) -> Self {
        let rows = (first_region..first_region + count)
            .map(|region| solution.column(region))
            .collect();
        Self { rows }
    }

    /// Returns the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the number of slots.
    pub fn slot_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Returns one row's tiles in slot order.
    pub fn row(&self, row: usize) -> &[Option<TaskId>] {
        self.rows.get(row).map_or(&[], Vec::as_slice)
    }

    /// Returns the rows that hold `task` in any slot, in ascending order.
    pub fn rows_of(&self, task: TaskId) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.contains(&Some(task)))
            .map(|(i, _)| i)
            .collect()
    }

    /// Returns `true` if any tile names `task`.
    pub fn contains(&self, task: TaskId) -> bool {
        self.rows.iter().any(|row| row.contains(&Some(task)))
    }

    /// Iterates over every distinct task id, in first-seen order.
    pub fn tasks(&self) -> Vec<TaskId> {
        let mut seen = Vec::new();
        for task in self.rows.iter().flatten().flatten() {
            if !seen.contains(task) {
                seen.push(*task);
            }
        }
        seen
    }
}

impl fmt::Display for TileTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            let cells: Vec<String> = row
                .iter()
                .map(|t| t.map_or_else(|| "0".to_string(), |t| t.to_string()))
                .collect();
            writeln!(f, "{}", cells.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vfab_common::AcceleratorId;
    use vfab_sched::{AnnealingParams, AnnealingScheduler, ConfigurationTask, RegionScheduler};

    fn solution() -> ScheduleMatrix {
        let tasks: Vec<_> = (1..=3)
            .map(|i| ConfigurationTask {
                id: TaskId::from_raw(i),
                accelerator: AcceleratorId::from_raw(0),
                region_count: 2,
                exec_time: 1,
                deadline: 3,
            })
            .collect();
        let params = AnnealingParams {
            seed: Some(7),
            ..AnnealingParams::default()
        };
        AnnealingScheduler::new(params)
            .schedule(4, &tasks)
            .unwrap()
            .solution
    }

    #[test]
    fn slices_partition_the_columns() {
        let sol = solution();
        let left = TileTable::slice(&sol, 0, 2);
        let right = TileTable::slice(&sol, 2, 2);
        assert_eq!(left.row_count(), 2);
        assert_eq!(right.row_count(), 2);
        assert_eq!(left.slot_count(), sol.slots());

        let mut all = left.tasks();
        all.extend(right.tasks());
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn rows_of_finds_every_row_of_a_task() {
        let sol = solution();
        let table = TileTable::slice(&sol, 0, 4);
        for task in table.tasks() {
            assert_eq!(table.rows_of(task).len(), 2);
        }
    }

    #[test]
    fn empty_table_has_no_rows() {
        let table = TileTable::default();
        assert_eq!(table.slot_count(), 0);
        assert!(table.row(3).is_empty());
        assert!(!table.contains(TaskId::from_raw(1)));
    }
}
