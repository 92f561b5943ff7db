//! Error types for fabric partitioning and region management.
//!
//! An allocation shortfall is not an error: [`ConfigurationManager::allocate`]
//! returns `None` and the caller retries later. These variants cover misuse
//! of the fabric API.
//!
//! [`ConfigurationManager::allocate`]: crate::ConfigurationManager::allocate

use vfab_common::{FpgaId, RegionId};

/// Errors from partitioning, static-region setup, and region release.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FabricError {
    /// A grid policy was given a zero dimension.
    #[error("partition grid must be non-empty, got {rows}x{cols}")]
    EmptyGrid {
        /// Requested rows.
        rows: u32,
        /// Requested columns.
        cols: u32,
    },

    /// The fabric already has regions.
    #[error("fpga {fpga} is already partitioned")]
    AlreadyPartitioned {
        /// The fabric in question.
        fpga: FpgaId,
    },

    /// Static regions were requested a second time, or after dynamic allocation began.
    #[error("static regions of fpga {fpga} must be initialized once, before any allocation")]
    StaticInitOrder {
        /// The fabric in question.
        fpga: FpgaId,
    },

    /// More static regions were requested than the fabric has available.
    #[error("fpga {fpga} has {available} available regions, cannot make {requested} static")]
    TooManyStaticRegions {
        /// The fabric in question.
        fpga: FpgaId,
        /// Requested static count.
        requested: usize,
        /// Available dynamic regions.
        available: usize,
    },

    /// A region index outside the fabric.
    #[error("region {region} does not exist on fpga {fpga}")]
    UnknownRegion {
        /// The fabric in question.
        fpga: FpgaId,
        /// The offending region.
        region: RegionId,
    },

    /// A static region cannot be released.
    #[error("region {region} on fpga {fpga} is static")]
    StaticRegion {
        /// The fabric in question.
        fpga: FpgaId,
        /// The offending region.
        region: RegionId,
    },

    /// The region was released while already free.
    #[error("region {region} on fpga {fpga} is not allocated")]
    NotAllocated {
        /// The fabric in question.
        fpga: FpgaId,
        /// The offending region.
        region: RegionId,
    },

    /// The configuration port does not support this bus width.
    #[error("unsupported configuration bus width {width}")]
    UnsupportedBusWidth {
        /// The rejected width, in bits.
        width: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_not_allocated() {
        let err = FabricError::NotAllocated {
            fpga: FpgaId::from_raw(1),
            region: RegionId::from_raw(4),
        };
        assert_eq!(format!("{err}"), "region 4 on fpga 1 is not allocated");
    }

    #[test]
    fn display_bus_width() {
        let err = FabricError::UnsupportedBusWidth { width: 12 };
        assert_eq!(format!("{err}"), "unsupported configuration bus width 12");
    }
}
