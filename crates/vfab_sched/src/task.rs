//! Configuration tasks: one scheduling request per accelerator request.

use serde::{Deserialize, Serialize};
use vfab_common::{AcceleratorId, TaskId};

/// A request to occupy `region_count` adjacent regions for `exec_time` slots,
/// finishing no later than slot `deadline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationTask {
    /// Task id; also the value written into schedule cells.
    pub id: TaskId,
    /// The accelerator this task will instantiate.
    pub accelerator: AcceleratorId,
    /// Adjacent regions required.
    pub region_count: usize,
    /// Time slots required.
    pub exec_time: usize,
    /// Last slot (1-based) the task may occupy.
    pub deadline: usize,
}
