//! Per-virtual-FPGA resource utilization snapshots.

use crate::resources::{ResourceKind, Resources};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vfab_common::FpgaId;

/// The share of one fabric held by one virtual FPGA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilizationSnapshot {
    /// The hosting fabric.
    pub fpga: FpgaId,
    /// Number of regions held.
    pub region_count: usize,
    /// Sum of the held regions' resources.
    pub resources: Resources,
    /// Held resources as a percentage of the fabric's capacity.
    pub percent: BTreeMap<ResourceKind, f64>,
    /// Whether the instance is clocked by a PLL.
    pub holds_pll: bool,
}

impl UtilizationSnapshot {
    /// Returns the utilization percentage for one resource kind.
    pub fn percent_for(&self, kind: ResourceKind) -> f64 {
        self.percent.get(&kind).copied().unwrap_or(0.0)
    }
}
