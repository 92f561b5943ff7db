//! Partitioning strategies that carve a fabric into regions.

use crate::error::FabricError;
use crate::fpga::Fpga;
use crate::occupancy::OccupancyMap;
use crate::region::{Rect, RegionBuilder};
use crate::resources::Resources;

/// A strategy for dividing an FPGA into regions.
///
/// Implementations add regions to `fpga` and return the occupancy map that
/// mirrors their layout.
pub trait PartitionPolicy {
    /// Partitions `fpga`, which must not have any regions yet.
    fn partition(&self, fpga: &mut Fpga) -> Result<OccupancyMap, FabricError>;
}

/// A uniform grid of `rows x cols` equally sized regions.
///
/// Each region gets `capacity / (rows * cols)` of logic, registers, DSP and
/// I/O, one block RAM, and no transceivers or PLLs; those stay with the
/// fabric's shared pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPartition {
    /// Number of grid rows.
    pub rows: u32,
    /// Number of grid columns.
    pub cols: u32,
}

impl GridPartition {
    /// Creates a grid policy.
    pub fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }
}

impl PartitionPolicy for GridPartition {
    fn partition(&self, fpga: &mut Fpga) -> Result<OccupancyMap, FabricError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(FabricError::EmptyGrid {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if !fpga.regions().is_empty() {
            return Err(FabricError::AlreadyPartitioned { fpga: fpga.id() });
        }

        let count = u64::from(self.rows) * u64::from(self.cols);
        let share = fpga.capacity().split(count);
        let width = (fpga.width() / self.cols).max(1);
        let length = (fpga.length() / self.rows).max(1);

        for r in 0..self.rows {
            for c in 0..self.cols {
                let builder = RegionBuilder::new()
                    .resources(Resources {
                        block_ram: 1,
                        transceivers: 0,
                        plls: 0,
                        ..share
                    })
                    .shape(Rect {
                        x: width * c,
                        y: length * r,
                        width: width - 1,
                        length: length - 1,
                    });
                fpga.add_region(builder);
            }
        }

        log::debug!(
            "partitioned fpga {} into a {}x{} grid",
            fpga.id(),
            self.rows,
            self.cols
        );
        Ok(OccupancyMap::new(self.rows as usize, self.cols as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vfab_common::FpgaId;

    fn fpga() -> Fpga {
        Fpga::builder(FpgaId::from_raw(0))
            .capacity(Resources {
                logic_elements: 1_200,
                memory_registers: 2_400,
                block_ram: 50,
                dsp: 120,
                io: 48,
                transceivers: 4,
                plls: 4,
            })
            .floorplan(44, 33)
            .build()
    }

    #[test]
    fn grid_creates_rows_times_cols_regions() {
        let mut f = fpga();
        let map = GridPartition::new(4, 3).partition(&mut f).unwrap();
        assert_eq!(f.regions().len(), 12);
        assert_eq!((map.rows(), map.cols()), (4, 3));
    }

    #[test]
    fn each_region_gets_an_even_share() {
        let mut f = fpga();
        GridPartition::new(2, 2).partition(&mut f).unwrap();
        for region in f.regions() {
            assert_eq!(region.resources().logic_elements, 300);
            assert_eq!(region.resources().dsp, 30);
            assert_eq!(region.resources().block_ram, 1);
            assert_eq!(region.resources().transceivers, 0);
            assert_eq!(region.resources().plls, 0);
        }
        assert_eq!(f.available_resources().plls, 4);
    }

    #[test]
    fn region_rectangles_tile_the_floorplan() {
        let mut f = fpga();
        GridPartition::new(4, 3).partition(&mut f).unwrap();
        let last = f.regions()[11].shape();
        assert_eq!((last.x, last.y), (22, 33));
        assert_eq!((last.width, last.length), (10, 10));
    }

    #[test]
    fn zero_dimension_is_rejected() {
        let mut f = fpga();
        let err = GridPartition::new(0, 3).partition(&mut f).unwrap_err();
        assert!(matches!(err, FabricError::EmptyGrid { .. }));
    }

    #[test]
    fn partitioning_twice_is_rejected() {
        let mut f = fpga();
        GridPartition::new(1, 1).partition(&mut f).unwrap();
        let err = GridPartition::new(1, 1).partition(&mut f).unwrap_err();
        assert!(matches!(err, FabricError::AlreadyPartitioned { .. }));
    }
}
