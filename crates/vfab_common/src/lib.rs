//! Shared foundational types used across the vfab FPGA-as-a-service simulator.
//!
//! This crate provides opaque id newtypes and the [`define_id!`] macro that
//! declares them, a dense append-only [`Arena`], a run-scoped [`IdGenerator`],
//! simulated time ([`SimTime`]), frequency values, and the internal error type
//! used to report invariant violations.

#![warn(missing_docs)]

pub mod address;
pub mod arena;
pub mod frequency;
pub mod id_gen;
pub mod ids;
pub mod result;
pub mod time;

pub use address::{Address, Addressable, Clocked};
pub use arena::{Arena, ArenaId};
pub use frequency::Frequency;
pub use id_gen::IdGenerator;
pub use ids::{AcceleratorId, CloudletId, FpgaId, PllId, RegionId, SegmentId, TaskId, VFpgaId};
pub use result::{InternalError, VfabResult};
pub use time::SimTime;
