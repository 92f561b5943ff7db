//! Reconfigurable regions of a fabric.

use crate::resources::Resources;
use serde::{Deserialize, Serialize};
use vfab_common::RegionId;

/// The rectangular footprint of a region on the fabric floorplan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge, in fabric columns.
    pub x: u32,
    /// Bottom edge, in fabric rows.
    pub y: u32,
    /// Horizontal extent (inclusive offset from `x`).
    pub width: u32,
    /// Vertical extent (inclusive offset from `y`).
    pub length: u32,
}

/// A fixed-capacity partition of one fabric.
///
/// Static regions are claimed once during initialization and never become
/// available again. Dynamic regions toggle between available and occupied as
/// virtual FPGAs come and go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    id: RegionId,
    resources: Resources,
    shape: Rect,
    is_static: bool,
    is_available: bool,
}

impl Region {
    /// Returns the region's index within its fabric.
    pub fn id(&self) -> RegionId {
        self.id
    }

    /// Returns the resources reserved for this region.
    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    /// Returns the region's floorplan footprint.
    pub fn shape(&self) -> Rect {
        self.shape
    }

    /// Returns `true` for a static (permanently claimed) region.
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Returns `true` if the region can be claimed.
    pub fn is_available(&self) -> bool {
        self.is_available
    }

    pub(crate) fn set_available(&mut self, available: bool) {
        self.is_available = available;
    }

    pub(crate) fn mark_static(&mut self) {
        self.is_static = true;
        self.is_available = false;
    }
}

/// Builds a [`Region`], clamping every requested resource to what the fabric
/// still has free.
#[derive(Debug, Clone, Default)]
pub struct RegionBuilder {
    requested: Resources,
    shape: Rect,
}

impl RegionBuilder {
    /// Starts a builder with nothing requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the given resources in one go.
    pub fn resources(mut self, requested: Resources) -> Self {
        self.requested = requested;
        self
    }

    /// Requests logic elements.
    pub fn logic_elements(mut self, n: u64) -> Self {
        self.requested.logic_elements = n;
        self
    }

    /// Requests block RAM tiles.
    pub fn block_ram(mut self, n: u64) -> Self {
        self.requested.block_ram = n;
        self
    }

    /// Requests DSP slices.
    pub fn dsp(mut self, n: u64) -> Self {
        self.requested.dsp = n;
        self
    }

    /// Sets the floorplan footprint.
    pub fn shape(mut self, shape: Rect) -> Self {
        self.shape = shape;
        self
    }

    /// Finishes the region, granting `min(requested, available)` of each resource.
    pub fn build(self, id: RegionId, available: &Resources) -> Region {
        Region {
            id,
            resources: self.requested.clamp_to(available),
            shape: self.shape,
            is_static: false,
            is_available: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_clamps_to_available() {
        let available = Resources {
            logic_elements: 50,
            dsp: 10,
            ..Resources::default()
        };
        let region = RegionBuilder::new()
            .logic_elements(80)
            .dsp(4)
            .block_ram(1)
            .build(RegionId::from_raw(0), &available);
        assert_eq!(region.resources().logic_elements, 50);
        assert_eq!(region.resources().dsp, 4);
        assert_eq!(region.resources().block_ram, 0);
    }

    #[test]
    fn new_region_is_dynamic_and_available() {
        let region = RegionBuilder::new().build(RegionId::from_raw(3), &Resources::default());
        assert!(!region.is_static());
        assert!(region.is_available());
        assert_eq!(region.id().as_raw(), 3);
    }

    #[test]
    fn mark_static_makes_unavailable() {
        let mut region = RegionBuilder::new().build(RegionId::from_raw(0), &Resources::default());
        region.mark_static();
        assert!(region.is_static());
        assert!(!region.is_available());
    }
}
