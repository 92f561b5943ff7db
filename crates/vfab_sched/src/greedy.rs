//! First-fit placement of an ordered task list.

use crate::matrix::ScheduleMatrix;
use crate::task::ConfigurationTask;
use vfab_common::TaskId;

/// Why a greedy pass could not produce a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlacementFailure {
    /// The task's earliest fit would finish after its deadline.
    Deadline(TaskId),
    /// The task fits nowhere within the slot horizon, or occupies no cells.
    NoFit(TaskId),
}

/// Places `tasks` in order, each at the earliest slot and then the lowest
/// region position where its whole block is free.
///
/// With `enforce_deadlines`, the pass stops at the first task whose earliest
/// fit would end after its deadline. The seed pass runs without it.
pub(crate) fn allocate(
    tasks: &[ConfigurationTask],
    regions: usize,
    t_max: usize,
    enforce_deadlines: bool,
) -> Result<ScheduleMatrix, PlacementFailure> {
    let mut matrix = ScheduleMatrix::new(t_max, regions);
    for task in tasks {
        let (slot, pos) = first_fit(&matrix, task, enforce_deadlines)?;
        matrix.fill_block(slot, pos, task.exec_time, task.region_count, task.id);
    }
    Ok(matrix)
}

fn first_fit(
    matrix: &ScheduleMatrix,
    task: &ConfigurationTask,
    enforce_deadlines: bool,
) -> Result<(usize, usize), PlacementFailure> {
    if task.region_count == 0 || task.exec_time == 0 || task.region_count > matrix.regions() {
        return Err(PlacementFailure::NoFit(task.id));
    }
    for slot in 0..matrix.slots() {
        // slot is 0-based; the task would end in 1-based slot `slot + exec_time`
        if enforce_deadlines && slot + task.exec_time > task.deadline {
            return Err(PlacementFailure::Deadline(task.id));
        }
        let last_pos = matrix.regions() - task.region_count;
        for pos in 0..=last_pos {
            if matrix.is_block_free(slot, pos, task.exec_time, task.region_count) {
                return Ok((slot, pos));
            }
        }
    }
    Err(PlacementFailure::NoFit(task.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vfab_common::AcceleratorId;

    fn task(id: u32, regions: usize, time: usize, deadline: usize) -> ConfigurationTask {
        ConfigurationTask {
            id: TaskId::from_raw(id),
            accelerator: AcceleratorId::from_raw(0),
            region_count: regions,
            exec_time: time,
            deadline,
        }
    }

    #[test]
    fn packs_side_by_side_then_later() {
        let tasks = [task(1, 2, 1, 3), task(2, 2, 1, 3), task(3, 2, 1, 3)];
        let m = allocate(&tasks, 4, 4, true).unwrap();
        assert_eq!(m.get(0, 0), Some(TaskId::from_raw(1)));
        assert_eq!(m.get(0, 2), Some(TaskId::from_raw(2)));
        assert_eq!(m.get(1, 0), Some(TaskId::from_raw(3)));
        assert_eq!(m.completion_time(), 2);
        assert!(m.check_invariants(&tasks).is_ok());
    }

    #[test]
    fn fills_gaps_first_fit() {
        let tasks = [task(1, 3, 2, 9), task(2, 1, 1, 9), task(3, 1, 1, 9)];
        let m = allocate(&tasks, 4, 5, true).unwrap();
        assert_eq!(m.get(0, 3), Some(TaskId::from_raw(2)));
        assert_eq!(m.get(1, 3), Some(TaskId::from_raw(3)));
        assert_eq!(m.completion_time(), 2);
    }

    #[test]
    fn deadline_enforced_only_when_asked() {
        let tasks = [task(1, 2, 2, 2), task(2, 2, 1, 1)];
        assert_eq!(
            allocate(&tasks, 2, 4, true),
            Err(PlacementFailure::Deadline(TaskId::from_raw(2)))
        );
        let seed = allocate(&tasks, 2, 4, false).unwrap();
        assert_eq!(seed.completion_time(), 3);
        assert!(!seed.meets_deadlines(&tasks));
    }

    #[test]
    fn too_wide_task_does_not_fit() {
        let tasks = [task(1, 5, 1, 9)];
        assert_eq!(
            allocate(&tasks, 4, 2, false),
            Err(PlacementFailure::NoFit(TaskId::from_raw(1)))
        );
    }

    #[test]
    fn zero_sized_task_does_not_fit() {
        assert_eq!(
            allocate(&[task(1, 2, 0, 9)], 4, 2, false),
            Err(PlacementFailure::NoFit(TaskId::from_raw(1)))
        );
        assert_eq!(
            allocate(&[task(2, 0, 1, 9)], 4, 2, false),
            Err(PlacementFailure::NoFit(TaskId::from_raw(2)))
        );
    }
}
