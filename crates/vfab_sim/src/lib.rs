//! Discrete-event kernel and driver for the vfab simulator.
//!
//! [`EventQueue`] is a minimal kernel: a binary heap of events ordered by
//! simulated time and then by scheduling order. [`Simulation`] pops events
//! and hands them to a [`Coordinator`](vfab_coord::Coordinator) until nothing
//! is left to do.
//!
//! # Usage
//!
//! ```ignore
//! let mut sim = Simulation::new(coordinator);
//! sim.submit_cloudlet(cloudlet)?;
//! sim.submit_requests(vec![AcceleratorId::from_raw(0)])?;
//! let summary = sim.run()?;
//! println!("finished at {}", summary.final_time);
//! ```

#![warn(missing_docs)]

pub mod queue;
pub mod simulation;

pub use queue::EventQueue;
pub use simulation::{RunSummary, Simulation};
