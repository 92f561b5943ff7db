//! The time x region schedule matrix.
//!
//! Rows are time slots (slot 1 is row 0), columns are global region
//! positions. A cell holds the id of the task occupying it, or `None`.

use crate::task::ConfigurationTask;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use vfab_common::{InternalError, TaskId, VfabResult};

/// A `slots x regions` occupancy grid of task ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleMatrix {
    slots: usize,
    regions: usize,
    cells: Vec<Option<TaskId>>,
}

impl ScheduleMatrix {
    /// Creates an empty matrix.
    pub fn new(slots: usize, regions: usize) -> Self {
        Self {
            slots,
            regions,
            cells: vec![None; slots * regions],
        }
    }

    /// Number of time slots.
    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Number of region columns.
    pub fn regions(&self) -> usize {
        self.regions
    }

    /// Returns the task at `(slot, region)`, both 0-based.
    pub fn get(&self, slot: usize, region: usize) -> Option<TaskId> {
        if slot >= self.slots || region >= self.regions {
            return None;
        }
        self.cells[slot * self.regions + region]
    }

    /// Returns `true` if every cell of the block is free and inside the matrix.
    pub fn is_block_free(&self, slot: usize, region: usize, len: usize, width: usize) -> bool {
        if slot + len > self.slots || region + width > self.regions {
            return false;
        }
        (slot..slot + len).all(|t| {
            (region..region + width).all(|r| self.cells[t * self.regions + r].is_none())
        })
    }

    /// Writes `task` into every cell of the block.
    pub(crate) fn fill_block(
        &mut self,
        slot: usize,
        region: usize,
        len: usize,
        width: usize,
        task: TaskId,
    ) {
        for t in slot..slot + len {
            for r in region..region + width {
                self.cells[t * self.regions + r] = Some(task);
            }
        }
    }

    /// Number of slots up to and including the last occupied one; 0 if empty.
    pub fn completion_time(&self) -> usize {
        self.cells
            .iter()
            .rposition(Option::is_some)
            .map_or(0, |i| i / self.regions + 1)
    }

    /// Returns the schedule of one region column, indexed by slot.
    pub fn column(&self, region: usize) -> Vec<Option<TaskId>> {
        (0..self.slots).map(|t| self.get(t, region)).collect()
    }

    /// Returns the 1-based last slot occupied by each task.
    pub fn finish_slots(&self) -> BTreeMap<TaskId, usize> {
        let mut out = BTreeMap::new();
        for (i, cell) in self.cells.iter().enumerate() {
            if let Some(id) = cell {
                let slot = i / self.regions + 1;
                let e = out.entry(*id).or_insert(slot);
                *e = (*e).max(slot);
            }
        }
        out
    }

    /// Returns `true` if every task finishes by its deadline.
    pub fn meets_deadlines(&self, tasks: &[ConfigurationTask]) -> bool {
        let finish = self.finish_slots();
        tasks
            .iter()
            .all(|t| finish.get(&t.id).is_some_and(|&f| f <= t.deadline))
    }

    /// Checks that each task occupies exactly one `exec_time x region_count`
    /// rectangle and that no unknown ids appear.
    pub fn check_invariants(&self, tasks: &[ConfigurationTask]) -> VfabResult<()> {
        let mut cells: BTreeMap<TaskId, Vec<(usize, usize)>> = BTreeMap::new();
        for t in 0..self.slots {
            for r in 0..self.regions {
                if let Some(id) = self.get(t, r) {
                    cells.entry(id).or_default().push((t, r));
                }
            }
        }
        for task in tasks {
            let Some(owned) = cells.remove(&task.id) else {
                return Err(InternalError::new(format!("task {} is not scheduled", task.id)));
            };
            let (t0, r0) = owned[0];
            let expected = task.exec_time * task.region_count;
            let rectangle = owned.len() == expected
                && owned.iter().all(|&(t, r)| {
                    (t0..t0 + task.exec_time).contains(&t)
                        && (r0..r0 + task.region_count).contains(&r)
                });
            if !rectangle {
                return Err(InternalError::new(format!(
                    "task {} does not occupy a contiguous {}x{} block",
                    task.id, task.exec_time, task.region_count
                )));
            }
        }
        if let Some(id) = cells.keys().next() {
            return Err(InternalError::new(format!("unknown task {id} in schedule")));
        }
        Ok(())
    }
}

impl fmt::Display for ScheduleMatrix {
    /// Renders one line per region (highest first) with a slot axis underneath.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let time = self.completion_time();
        for r in (0..self.regions).rev() {
            write!(f, "b ={:>3}|", r + 1)?;
            for t in 0..time {
                let v = self.get(t, r).map_or(0, |id| id.as_raw());
                write!(f, "{v:>5}")?;
            }
            writeln!(f)?;
        }
        write!(f, "  T   |")?;
        for t in 1..=time {
            write!(f, "{t:>5}")?;
        }
        writeln!(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vfab_common::AcceleratorId;

    fn task(id: u32, regions: usize, time: usize) -> ConfigurationTask {
        ConfigurationTask {
            id: TaskId::from_raw(id),
            accelerator: AcceleratorId::from_raw(0),
            region_count: regions,
            exec_time: time,
            deadline: 10,
        }
    }

    #[test]
    fn empty_matrix_has_zero_completion() {
        assert_eq!(ScheduleMatrix::new(4, 4).completion_time(), 0);
    }

    #[test]
    fn completion_time_is_last_occupied_slot() {
        let mut m = ScheduleMatrix::new(5, 3);
        m.fill_block(2, 1, 2, 1, TaskId::from_raw(1));
        assert_eq!(m.completion_time(), 4);
    }

    #[test]
    fn block_free_respects_bounds() {
        let mut m = ScheduleMatrix::new(3, 3);
        assert!(m.is_block_free(0, 0, 3, 3));
        assert!(!m.is_block_free(1, 0, 3, 1));
        m.fill_block(0, 1, 1, 1, TaskId::from_raw(1));
        assert!(!m.is_block_free(0, 0, 1, 2));
        assert!(m.is_block_free(1, 0, 2, 3));
    }

    #[test]
    fn invariants_accept_rectangles() {
        let mut m = ScheduleMatrix::new(4, 4);
        m.fill_block(0, 0, 2, 2, TaskId::from_raw(1));
        m.fill_block(0, 2, 1, 2, TaskId::from_raw(2));
        assert!(m.check_invariants(&[task(1, 2, 2), task(2, 2, 1)]).is_ok());
    }

    #[test]
    fn invariants_reject_split_tasks() {
        let mut m = ScheduleMatrix::new(4, 4);
        m.fill_block(0, 0, 1, 1, TaskId::from_raw(1));
        m.fill_block(0, 2, 1, 1, TaskId::from_raw(1));
        assert!(m.check_invariants(&[task(1, 2, 1)]).is_err());
    }

    #[test]
    fn finish_slots_and_deadlines() {
        let mut m = ScheduleMatrix::new(4, 2);
        m.fill_block(1, 0, 2, 1, TaskId::from_raw(1));
        assert_eq!(m.finish_slots()[&TaskId::from_raw(1)], 3);
        let mut t = task(1, 1, 2);
        assert!(m.meets_deadlines(&[t]));
        t.deadline = 2;
        assert!(!m.meets_deadlines(&[t]));
    }

    #[test]
    fn column_extracts_one_region() {
        let mut m = ScheduleMatrix::new(3, 2);
        m.fill_block(1, 1, 1, 1, TaskId::from_raw(4));
        assert_eq!(m.column(1), vec![None, Some(TaskId::from_raw(4)), None]);
    }

    #[test]
    fn display_renders_table() {
        let mut m = ScheduleMatrix::new(2, 2);
        m.fill_block(0, 0, 1, 2, TaskId::from_raw(1));
        let text = format!("{m}");
        assert_eq!(text, "b =  2|    1\nb =  1|    1\n  T   |    1\n");
    }

    #[test]
    fn serde_roundtrip_keeps_free_cells() {
        let mut m = ScheduleMatrix::new(2, 3);
        m.fill_block(1, 1, 1, 2, TaskId::from_raw(3));
        let json = serde_json::to_string(&m).unwrap();
        let back: ScheduleMatrix = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
        assert_eq!(back.get(0, 1), None);
        assert_eq!(back.get(1, 2), Some(TaskId::from_raw(3)));
    }
}
