//! Physical FPGA descriptions.

use crate::region::{Region, RegionBuilder};
use crate::resources::Resources;
use serde::{Deserialize, Serialize};
use vfab_common::{Clocked, FpgaId, Frequency, RegionId};

/// A physical FPGA: fixed capacities plus the regions carved out of them.
///
/// Capacities are read-only once built. Regions can only be added through
/// [`add_region`](Fpga::add_region), which clamps each request to what is
/// still free, so the sum over regions never exceeds the capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fpga {
    id: FpgaId,
    brand: String,
    model: String,
    capacity: Resources,
    clock: Frequency,
    length: u32,
    width: u32,
    regions: Vec<Region>,
}

impl Fpga {
    /// Starts a builder for an FPGA with the given id.
    pub fn builder(id: FpgaId) -> FpgaBuilder {
        FpgaBuilder::new(id)
    }

    /// Returns the FPGA's id.
    pub fn id(&self) -> FpgaId {
        self.id
    }

    /// Returns the vendor name.
    pub fn brand(&self) -> &str {
        &self.brand
    }

    /// Returns the device model.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the fixed resource capacity.
    pub fn capacity(&self) -> &Resources {
        &self.capacity
    }

    /// Returns the floorplan length, in rows.
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Returns the floorplan width, in columns.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the regions in declaration order.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub(crate) fn regions_mut(&mut self) -> &mut [Region] {
        &mut self.regions
    }

    /// Returns the capacity not yet granted to any region.
    pub fn available_resources(&self) -> Resources {
        let used: Resources = self.regions.iter().map(Region::resources).sum();
        self.capacity.saturating_sub(&used)
    }

    /// Adds a region built from `builder`, granting at most what is still free.
    pub fn add_region(&mut self, builder: RegionBuilder) -> RegionId {
        let id = RegionId::from_raw(self.regions.len() as u32);
        let region = builder.build(id, &self.available_resources());
        self.regions.push(region);
        id
    }
}

impl Clocked for Fpga {
    fn clock(&self) -> Frequency {
        self.clock
    }
}

/// Builder for [`Fpga`].
#[derive(Debug, Clone)]
pub struct FpgaBuilder {
    id: FpgaId,
    brand: String,
    model: String,
    capacity: Resources,
    clock: Frequency,
    length: u32,
    width: u32,
}

impl FpgaBuilder {
    fn new(id: FpgaId) -> Self {
        Self {
            id,
            brand: String::new(),
            model: String::new(),
            capacity: Resources::default(),
            clock: Frequency::from_mhz(100.0),
            length: 1,
            width: 1,
        }
    }

    /// Sets vendor and model names.
    pub fn device(mut self, brand: impl Into<String>, model: impl Into<String>) -> Self {
        self.brand = brand.into();
        self.model = model.into();
        self
    }

    /// Sets the resource capacity.
    pub fn capacity(mut self, capacity: Resources) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the fabric clock.
    pub fn clock(mut self, clock: Frequency) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the floorplan dimensions.
    pub fn floorplan(mut self, length: u32, width: u32) -> Self {
        self.length = length;
        self.width = width;
        self
    }

    /// Finishes the FPGA with no regions.
    pub fn build(self) -> Fpga {
        Fpga {
            id: self.id,
            brand: self.brand,
            model: self.model,
            capacity: self.capacity,
            clock: self.clock,
            length: self.length,
            width: self.width,
            regions: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stratix_v() -> Fpga {
        Fpga::builder(FpgaId::from_raw(0))
            .device("Intel", "Stratix V")
            .capacity(Resources {
                logic_elements: 325_000,
                memory_registers: 356_000,
                block_ram: 600,
                dsp: 1_800,
                io: 450,
                transceivers: 12,
                plls: 16,
            })
            .clock(Frequency::from_mhz(150.0))
            .floorplan(44, 33)
            .build()
    }

    #[test]
    fn fresh_fpga_has_full_capacity_available() {
        let fpga = stratix_v();
        assert_eq!(fpga.available_resources(), *fpga.capacity());
        assert!(fpga.regions().is_empty());
        assert_eq!(fpga.clock().mhz(), 150.0);
    }

    #[test]
    fn add_region_reduces_available() {
        let mut fpga = stratix_v();
        fpga.add_region(RegionBuilder::new().logic_elements(25_000).dsp(100));
        let avail = fpga.available_resources();
        assert_eq!(avail.logic_elements, 300_000);
        assert_eq!(avail.dsp, 1_700);
    }

    #[test]
    fn regions_never_exceed_capacity() {
        let mut fpga = stratix_v();
        for _ in 0..20 {
            fpga.add_region(RegionBuilder::new().logic_elements(30_000).dsp(200));
        }
        let used: Resources = fpga.regions().iter().map(Region::resources).sum();
        assert!(used.fits_within(fpga.capacity()));
        assert_eq!(fpga.available_resources().logic_elements, 0);
    }
}
