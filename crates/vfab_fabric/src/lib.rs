//! Fabric model and region management for the vfab simulator.
//!
//! A physical [`Fpga`] is carved into [`Region`]s by a [`PartitionPolicy`]
//! such as [`GridPartition`]. The [`ConfigurationManager`] then owns those
//! regions together with a 2-D [`OccupancyMap`], and performs partial
//! reconfiguration by claiming and releasing dynamic regions.
//!
//! # Usage
//!
//! ```
//! use vfab_common::{FpgaId, VFpgaId};
//! use vfab_fabric::{ConfigurationManager, ConfigurationPort, Fpga, GridPartition, Resources};
//!
//! let fpga = Fpga::builder(FpgaId::from_raw(0))
//!     .capacity(Resources { logic_elements: 4_000, ..Resources::default() })
//!     .build();
//! let mut cm = ConfigurationManager::new(fpga, ConfigurationPort::default());
//! cm.partition(&GridPartition::new(2, 2)).unwrap();
//! cm.initialize_static_regions(1).unwrap();
//!
//! let regions = cm.allocate(VFpgaId::from_raw(0), 2, false).unwrap();
//! assert_eq!(regions.len(), 2);
//! assert!(cm.allocate(VFpgaId::from_raw(1), 2, false).is_none());
//! ```

#![warn(missing_docs)]

pub mod clock;
pub mod error;
pub mod fpga;
pub mod manager;
pub mod occupancy;
pub mod partition;
pub mod port;
pub mod region;
pub mod resources;
pub mod utilization;

pub use clock::ClockManager;
pub use error::FabricError;
pub use fpga::{Fpga, FpgaBuilder};
pub use manager::ConfigurationManager;
pub use occupancy::{Cell, OccupancyMap};
pub use partition::{GridPartition, PartitionPolicy};
pub use port::{ConfigurationPort, SUPPORTED_BUS_WIDTHS};
pub use region::{Rect, Region, RegionBuilder};
pub use resources::{ResourceKind, Resources};
pub use utilization::UtilizationSnapshot;
