//! The 2-D occupancy map mirroring a fabric's region layout.

use serde::{Deserialize, Serialize};
use std::fmt;
use vfab_common::{RegionId, VFpgaId};

/// The state of one occupancy-map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    /// The region is free.
    Free,
    /// The region is a static region (rendered as `-1`).
    Static,
    /// The region hosts the given virtual FPGA.
    Occupied(VFpgaId),
}

/// A `rows x cols` grid; region `i` lives at `(i / cols, i % cols)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyMap {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl OccupancyMap {
    /// Creates an all-free map.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Cell::Free; rows * cols],
        }
    }

    /// Returns the number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns the `(row, col)` of a region, or `None` if it is off the map.
    pub fn position(&self, region: RegionId) -> Option<(usize, usize)> {
        let i = region.as_raw() as usize;
        if self.cols == 0 || i >= self.cells.len() {
            return None;
        }
        Some((i / self.cols, i % self.cols))
    }

    /// Returns the cell for a region.
    pub fn get(&self, region: RegionId) -> Option<Cell> {
        self.cells.get(region.as_raw() as usize).copied()
    }

    pub(crate) fn set(&mut self, region: RegionId, cell: Cell) {
        if let Some(slot) = self.cells.get_mut(region.as_raw() as usize) {
            *slot = cell;
        }
    }

    /// Returns the cell at `(row, col)`.
    pub fn at(&self, row: usize, col: usize) -> Option<Cell> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells.get(row * self.cols + col).copied()
    }
}

impl fmt::Display for OccupancyMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.cols.max(1)) {
            let line: Vec<String> = row
                .iter()
                .map(|c| match c {
                    Cell::Free => format!("{:>4}", 0),
                    Cell::Static => format!("{:>4}", -1),
                    Cell::Occupied(id) => format!("{:>4}", format!("v{id}")),
                })
                .collect();
            writeln!(f, "{}", line.join(""))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_is_row_major() {
        let map = OccupancyMap::new(4, 3);
        assert_eq!(map.position(RegionId::from_raw(0)), Some((0, 0)));
        assert_eq!(map.position(RegionId::from_raw(5)), Some((1, 2)));
        assert_eq!(map.position(RegionId::from_raw(11)), Some((3, 2)));
        assert_eq!(map.position(RegionId::from_raw(12)), None);
    }

    #[test]
    fn set_and_read_back() {
        let mut map = OccupancyMap::new(2, 2);
        map.set(RegionId::from_raw(3), Cell::Occupied(VFpgaId::from_raw(9)));
        assert_eq!(map.at(1, 1), Some(Cell::Occupied(VFpgaId::from_raw(9))));
        assert_eq!(map.get(RegionId::from_raw(0)), Some(Cell::Free));
    }

    #[test]
    fn display_uses_sentinels() {
        let mut map = OccupancyMap::new(1, 3);
        map.set(RegionId::from_raw(0), Cell::Static);
        map.set(RegionId::from_raw(2), Cell::Occupied(VFpgaId::from_raw(4)));
        assert_eq!(format!("{map}"), "  -1   0  v4\n");
    }
}
