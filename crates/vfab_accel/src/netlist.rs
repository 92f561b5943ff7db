//! The netlist catalog: per-accelerator region, time and bitstream templates.

use crate::accelerator::{Accelerator, AcceleratorSpec};
use crate::error::WorkloadError;
use crate::kind::AcceleratorType;
use serde::{Deserialize, Serialize};
use vfab_common::AcceleratorId;

/// A catalog entry binding an accelerator to its scheduling template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Netlist {
    /// The accelerator this netlist implements.
    pub accelerator: AcceleratorSpec,
    /// Contiguous regions needed.
    pub region_count: usize,
    /// Estimated execution time in slots.
    pub exec_time: usize,
    /// Deadline in slots, relative to the batch start.
    pub deadline: usize,
    /// Bitstream size in megabytes.
    pub bitstream_mb: f64,
}

impl Netlist {
    /// Creates a fresh, idle accelerator instance from this template.
    pub fn instantiate(&self) -> Accelerator {
        Accelerator::new(self.accelerator.clone())
    }

    /// Returns the partial bitstream that configures this netlist.
    pub fn bitstream(&self) -> Bitstream {
        Bitstream {
            accelerator: self.accelerator.id,
            size_mb: self.bitstream_mb,
        }
    }
}

/// A partial bitstream, identified by the accelerator it configures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bitstream {
    /// The accelerator it configures.
    pub accelerator: AcceleratorId,
    /// Size in megabytes.
    pub size_mb: f64,
}

/// An ordered catalog of netlists, keyed by accelerator id.
#[derive(Debug, Clone, Default)]
pub struct NetlistStore {
    netlists: Vec<Netlist>,
}

impl NetlistStore {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a netlist. Accelerator ids must be unique, and the netlist must
    /// need at least one region for at least one slot.
    pub fn add(&mut self, netlist: Netlist) -> Result<(), WorkloadError> {
        let id = netlist.accelerator.id;
        if netlist.region_count == 0 || netlist.exec_time == 0 {
            return Err(WorkloadError::EmptyNetlist(id));
        }
        if self.netlists.iter().any(|n| n.accelerator.id == id) {
            return Err(WorkloadError::DuplicateAccelerator(id));
        }
        self.netlists.push(netlist);
        Ok(())
    }

    /// Returns a copy of the entry for `id`.
    ///
    /// Callers get their own copy so per-request edits never reach the
    /// shared catalog.
    pub fn find(&self, id: AcceleratorId) -> Option<Netlist> {
        self.netlists
            .iter()
            .find(|n| n.accelerator.id == id)
            .cloned()
    }

    /// Returns the first catalog id implementing `kind`.
    pub fn find_by_type(&self, kind: AcceleratorType) -> Option<AcceleratorId> {
        self.netlists
            .iter()
            .find(|n| n.accelerator.kind == kind)
            .map(|n| n.accelerator.id)
    }

    /// Iterates over the catalog in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Netlist> {
        self.netlists.iter()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.netlists.len()
    }

    /// Returns `true` if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.netlists.is_empty()
    }
}
