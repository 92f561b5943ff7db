//! The fabric manager: region occupancy and partial reconfiguration.
//!
//! [`ConfigurationManager`] exclusively owns one fabric's regions, occupancy
//! map, clock manager, and configuration port. Allocation is all-or-nothing:
//! either exactly the requested number of regions is claimed, or nothing
//! changes and `None` is returned.

use crate::clock::ClockManager;
use crate::error::FabricError;
use crate::fpga::Fpga;
use crate::occupancy::{Cell, OccupancyMap};
use crate::partition::PartitionPolicy;
use crate::port::ConfigurationPort;
use crate::region::Region;
use crate::resources::{ResourceKind, Resources};
use crate::utilization::UtilizationSnapshot;
use vfab_common::{Address, Addressable, Clocked, FpgaId, RegionId, SimTime, VFpgaId};

/// Owns and allocates the regions of one physical FPGA.
#[derive(Debug, Clone)]
pub struct ConfigurationManager {
    fpga: Fpga,
    map: OccupancyMap,
    clocks: ClockManager,
    port: ConfigurationPort,
    address: Option<Address>,
    static_initialized: bool,
    allocations: usize,
}

impl ConfigurationManager {
    /// Wraps an unpartitioned FPGA.
    pub fn new(fpga: Fpga, port: ConfigurationPort) -> Self {
        let clocks = ClockManager::new(fpga.clock(), fpga.capacity().plls as usize);
        Self {
            fpga,
            map: OccupancyMap::new(0, 0),
            clocks,
            port,
            address: None,
            static_initialized: false,
            allocations: 0,
        }
    }

    /// Applies a partitioning policy and allocates the matching occupancy map.
    pub fn partition(&mut self, policy: &dyn PartitionPolicy) -> Result<(), FabricError> {
        self.map = policy.partition(&mut self.fpga)?;
        Ok(())
    }

    /// Marks the first `count` available dynamic regions static and occupied.
    ///
    /// Must be called at most once, before any dynamic allocation.
    pub fn initialize_static_regions(&mut self, count: usize) -> Result<(), FabricError> {
        let fpga = self.fpga.id();
        if self.static_initialized || self.allocations > 0 {
            return Err(FabricError::StaticInitOrder { fpga });
        }
        let candidates: Vec<RegionId> = self
            .fpga
            .regions()
            .iter()
            .filter(|r| r.is_available() && !r.is_static())
            .map(Region::id)
            .take(count)
            .collect();
        if candidates.len() < count {
            return Err(FabricError::TooManyStaticRegions {
                fpga,
                requested: count,
                available: candidates.len(),
            });
        }
        for id in candidates {
            self.fpga.regions_mut()[id.as_raw() as usize].mark_static();
            self.map.set(id, Cell::Static);
        }
        self.static_initialized = true;
        log::debug!("fpga {fpga}: {count} static regions reserved");
        Ok(())
    }

    /// Claims `required` dynamic regions for `owner`, in declaration order.
    ///
    /// With `allow_replace`, occupied dynamic regions count as claimable and
    /// are taken over. Returns `None` without touching any state if fewer
    /// than `required` regions qualify.
    pub fn allocate(
        &mut self,
        owner: VFpgaId,
        required: usize,
        allow_replace: bool,
    ) -> Option<Vec<RegionId>> {
        let chosen: Vec<RegionId> = self
            .fpga
            .regions()
            .iter()
            .filter(|r| !r.is_static() && (r.is_available() || allow_replace))
            .map(Region::id)
            .take(required)
            .collect();
        if required == 0 || chosen.len() < required {
            log::trace!(
                "fpga {}: {} regions requested, {} claimable",
                self.fpga.id(),
                required,
                chosen.len()
            );
            return None;
        }
        for &id in &chosen {
            self.fpga.regions_mut()[id.as_raw() as usize].set_available(false);
            self.map.set(id, Cell::Occupied(owner));
        }
        self.allocations += 1;
        Some(chosen)
    }

    /// Releases one region back to the free pool.
    pub fn deallocate(&mut self, region: RegionId) -> Result<(), FabricError> {
        let fpga = self.fpga.id();
        let r = self
            .fpga
            .regions_mut()
            .get_mut(region.as_raw() as usize)
            .ok_or(FabricError::UnknownRegion { fpga, region })?;
        if r.is_static() {
            return Err(FabricError::StaticRegion { fpga, region });
        }
        if r.is_available() {
            return Err(FabricError::NotAllocated { fpga, region });
        }
        r.set_available(true);
        self.map.set(region, Cell::Free);
        Ok(())
    }

    /// Time to load a bitstream of `size_mb` megabytes.
    pub fn configuration_time(&self, size_mb: f64) -> SimTime {
        self.port.configuration_time(size_mb)
    }

    /// Returns the id of the managed FPGA.
    pub fn fpga_id(&self) -> FpgaId {
        self.fpga.id()
    }

    /// Returns the managed FPGA.
    pub fn fpga(&self) -> &Fpga {
        &self.fpga
    }

    /// Returns the regions in declaration order.
    pub fn regions(&self) -> &[Region] {
        self.fpga.regions()
    }

    /// Returns the occupancy map.
    pub fn occupancy(&self) -> &OccupancyMap {
        &self.map
    }

    /// Returns the clock manager.
    pub fn clocks(&self) -> &ClockManager {
        &self.clocks
    }

    /// Returns the clock manager for mutation.
    pub fn clocks_mut(&mut self) -> &mut ClockManager {
        &mut self.clocks
    }

    /// Number of static regions.
    pub fn static_region_count(&self) -> usize {
        self.regions().iter().filter(|r| r.is_static()).count()
    }

    /// Number of dynamic (reassignable) regions.
    pub fn dynamic_region_count(&self) -> usize {
        self.regions().len() - self.static_region_count()
    }

    /// Number of dynamic regions currently free.
    pub fn available_region_count(&self) -> usize {
        self.regions()
            .iter()
            .filter(|r| !r.is_static() && r.is_available())
            .count()
    }

    /// Assigns the address under which this manager receives payloads.
    pub fn set_address(&mut self, address: Address) {
        self.address = Some(address);
    }

    /// Summarizes the resources held by `regions` as shares of this fabric.
    pub fn utilization(&self, regions: &[RegionId], holds_pll: bool) -> UtilizationSnapshot {
        let held: Resources = regions
            .iter()
            .filter_map(|id| self.regions().get(id.as_raw() as usize))
            .map(Region::resources)
            .sum();
        let capacity = self.fpga.capacity();
        let percent = ResourceKind::ALL
            .iter()
            .map(|&kind| (kind, held.percent_of(capacity, kind)))
            .collect();
        UtilizationSnapshot {
            fpga: self.fpga.id(),
            region_count: regions.len(),
            resources: held,
            percent,
            holds_pll,
        }
    }
}

impl Addressable for ConfigurationManager {
    fn address(&self) -> Option<Address> {
        self.address
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::GridPartition;
    use vfab_common::Frequency;

    fn manager(rows: u32, cols: u32, statics: usize) -> ConfigurationManager {
        let fpga = Fpga::builder(FpgaId::from_raw(0))
            .capacity(Resources {
                logic_elements: 4_000,
                memory_registers: 8_000,
                block_ram: 40,
                dsp: 400,
                io: 100,
                transceivers: 4,
                plls: 2,
            })
            .clock(Frequency::from_mhz(150.0))
            .floorplan(40, 40)
            .build();
        let mut cm = ConfigurationManager::new(fpga, ConfigurationPort::default());
        cm.partition(&GridPartition::new(rows, cols)).unwrap();
        cm.initialize_static_regions(statics).unwrap();
        cm
    }

    fn v(n: u32) -> VFpgaId {
        VFpgaId::from_raw(n)
    }

    #[test]
    fn static_regions_are_first_and_marked() {
        let cm = manager(2, 2, 1);
        assert!(cm.regions()[0].is_static());
        assert_eq!(cm.occupancy().at(0, 0), Some(Cell::Static));
        assert_eq!(cm.dynamic_region_count(), 3);
        assert_eq!(cm.available_region_count(), 3);
    }

    #[test]
    fn static_init_twice_fails() {
        let mut cm = manager(2, 2, 1);
        let err = cm.initialize_static_regions(1).unwrap_err();
        assert!(matches!(err, FabricError::StaticInitOrder { .. }));
    }

    #[test]
    fn static_init_after_allocation_fails() {
        let fpga = Fpga::builder(FpgaId::from_raw(0))
            .capacity(Resources::default())
            .build();
        let mut cm = ConfigurationManager::new(fpga, ConfigurationPort::default());
        cm.partition(&GridPartition::new(2, 2)).unwrap();
        cm.allocate(v(0), 1, false).unwrap();
        assert!(cm.initialize_static_regions(1).is_err());
    }

    #[test]
    fn too_many_static_regions_fails() {
        let fpga = Fpga::builder(FpgaId::from_raw(0)).build();
        let mut cm = ConfigurationManager::new(fpga, ConfigurationPort::default());
        cm.partition(&GridPartition::new(1, 2)).unwrap();
        let err = cm.initialize_static_regions(3).unwrap_err();
        assert!(matches!(
            err,
            FabricError::TooManyStaticRegions { available: 2, .. }
        ));
    }

    #[test]
    fn allocate_claims_in_order_and_writes_owner() {
        let mut cm = manager(2, 2, 1);
        let got = cm.allocate(v(7), 2, false).unwrap();
        assert_eq!(got, vec![RegionId::from_raw(1), RegionId::from_raw(2)]);
        assert_eq!(cm.occupancy().at(0, 1), Some(Cell::Occupied(v(7))));
        assert_eq!(cm.occupancy().at(1, 0), Some(Cell::Occupied(v(7))));
        assert_eq!(cm.available_region_count(), 1);
    }

    #[test]
    fn allocate_on_full_fabric_changes_nothing() {
        let mut cm = manager(2, 2, 0);
        cm.allocate(v(0), 4, false).unwrap();
        let regions_before = cm.regions().to_vec();
        let map_before = cm.occupancy().clone();
        assert!(cm.allocate(v(1), 1, false).is_none());
        assert_eq!(cm.regions(), regions_before.as_slice());
        assert_eq!(cm.occupancy(), &map_before);
    }

    #[test]
    fn allocate_is_all_or_nothing() {
        let mut cm = manager(2, 2, 1);
        cm.allocate(v(0), 2, false).unwrap();
        assert!(cm.allocate(v(1), 2, false).is_none());
        assert_eq!(cm.available_region_count(), 1);
    }

    #[test]
    fn allocate_with_replace_takes_occupied_regions() {
        let mut cm = manager(2, 2, 1);
        cm.allocate(v(0), 3, false).unwrap();
        let got = cm.allocate(v(1), 2, true).unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(cm.occupancy().at(0, 1), Some(Cell::Occupied(v(1))));
        assert_eq!(cm.occupancy().at(1, 1), Some(Cell::Occupied(v(0))));
    }

    #[test]
    fn allocate_zero_regions_is_none() {
        let mut cm = manager(2, 2, 0);
        assert!(cm.allocate(v(0), 0, false).is_none());
    }

    #[test]
    fn deallocate_round_trip_restores_state() {
        let mut cm = manager(2, 2, 1);
        let regions_before = cm.regions().to_vec();
        let map_before = cm.occupancy().clone();
        let got = cm.allocate(v(3), 2, false).unwrap();
        for id in got {
            cm.deallocate(id).unwrap();
        }
        assert_eq!(cm.regions(), regions_before.as_slice());
        assert_eq!(cm.occupancy(), &map_before);
    }

    #[test]
    fn deallocate_free_or_static_region_fails() {
        let mut cm = manager(2, 2, 1);
        assert!(matches!(
            cm.deallocate(RegionId::from_raw(0)),
            Err(FabricError::StaticRegion { .. })
        ));
        assert!(matches!(
            cm.deallocate(RegionId::from_raw(1)),
            Err(FabricError::NotAllocated { .. })
        ));
        assert!(matches!(
            cm.deallocate(RegionId::from_raw(9)),
            Err(FabricError::UnknownRegion { .. })
        ));
    }

    #[test]
    fn utilization_reports_percentages() {
        let mut cm = manager(2, 2, 0);
        let got = cm.allocate(v(0), 2, false).unwrap();
        let snap = cm.utilization(&got, false);
        assert_eq!(snap.region_count, 2);
        assert_eq!(snap.resources.logic_elements, 2_000);
        assert_eq!(snap.percent_for(ResourceKind::LogicElements), 50.0);
        assert_eq!(snap.percent_for(ResourceKind::Plls), 0.0);
    }

    #[test]
    fn address_is_assignable() {
        let mut cm = manager(1, 1, 0);
        assert!(cm.address().is_none());
        cm.set_address(Address::from_raw(5));
        assert_eq!(cm.address(), Some(Address::from_raw(5)));
    }
}
