//! The unified coordinator of the vfab simulator.
//!
//! The [`Coordinator`] owns every fabric's [`VFpgaManager`](vfab_vfpga::VFpgaManager),
//! the global virtual FPGA arena and the netlist catalog. It runs the region
//! scheduler over each request batch, routes [`Payload`]s between components
//! by [`Address`](vfab_common::Address), and moves accelerable segments from
//! the waiting queue onto virtual FPGAs or, when none can serve them, onto the
//! VM's CPU.
//!
//! The coordinator is driven by an [`EventKernel`]: it never blocks, and
//! every continuation is an [`Event`] scheduled on the kernel.

#![warn(missing_docs)]

pub mod address;
pub mod coordinator;
pub mod error;
pub mod event;
pub mod kernel;
pub mod report;
mod tracking;

pub use address::{AddressProvider, Endpoint, RoutingTable, SequentialAddresses};
pub use coordinator::{Coordinator, CoordinatorConfig};
pub use error::CoordinatorError;
pub use event::{Event, Payload};
pub use kernel::EventKernel;
pub use report::{ExecutionReport, Placement, SegmentRecord, VFpgaRecord};
