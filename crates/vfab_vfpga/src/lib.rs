//! Virtual FPGA instances and their per-fabric lifecycle manager.
//!
//! Every [`VirtualFpga`] of a run lives in one [`VFpgaArena`] and is referred
//! to by [`VFpgaId`](vfab_common::VFpgaId) everywhere else. Each physical
//! fabric gets a [`VFpgaManager`] that consumes its [`TileTable`] slice of the
//! global schedule, claims regions, advances accelerators and reclaims
//! regions when instances finish.

#![warn(missing_docs)]

pub mod manager;
pub mod tiles;
pub mod vfpga;

pub use manager::{AdvanceReport, ReconfigurationRequest, StepReport, VFpgaManager};
pub use tiles::TileTable;
pub use vfpga::{BlockMapping, RegionMapping, TwinRole, VFpgaArena, VFpgaState, VirtualFpga};
