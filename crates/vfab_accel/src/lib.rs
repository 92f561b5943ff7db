//! Workloads and the accelerator execution model.
//!
//! A VM workload is an [`AccelerableCloudlet`] whose instruction range may
//! contain non-overlapping [`AccelerableSegment`]s. Each segment names the
//! [`AcceleratorType`] that can run it. An [`Accelerator`] executes one
//! segment at a time with a rate model of `mflops * concurrency` MI per
//! second. The [`NetlistStore`] maps accelerator ids to the region, time and
//! bitstream templates the scheduler needs.

#![warn(missing_docs)]

pub mod accelerator;
pub mod cloudlet;
pub mod error;
pub mod kind;
pub mod netlist;
pub mod segment;

pub use accelerator::{
    Accelerator, AcceleratorSpec, AcceleratorStatus, Progress, SegmentExecution,
};
pub use cloudlet::{AccelerableCloudlet, CloudletSummary};
pub use error::{AcceleratorError, WorkloadError};
pub use kind::AcceleratorType;
pub use netlist::{Bitstream, Netlist, NetlistStore};
pub use segment::{AccelerableSegment, MAX_SEGMENT_LENGTH};
