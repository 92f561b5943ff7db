//! The configuration port through which bitstreams are loaded.

use crate::error::FabricError;
use serde::{Deserialize, Serialize};
use vfab_common::{Frequency, SimTime};

/// Bus widths (in bits) a configuration port may have.
pub const SUPPORTED_BUS_WIDTHS: [u32; 8] = [4, 8, 16, 32, 64, 128, 256, 512];

/// A configuration port: bus width plus the clock driving it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationPort {
    bus_width: u32,
    clock: Frequency,
}

impl ConfigurationPort {
    /// Creates a port, rejecting widths outside [`SUPPORTED_BUS_WIDTHS`].
    pub fn new(bus_width: u32, clock: Frequency) -> Result<Self, FabricError> {
        if !SUPPORTED_BUS_WIDTHS.contains(&bus_width) {
            return Err(FabricError::UnsupportedBusWidth { width: bus_width });
        }
        Ok(Self { bus_width, clock })
    }

    /// Returns the bus width in bits.
    pub fn bus_width(&self) -> u32 {
        self.bus_width
    }

    /// Returns the port clock.
    pub fn clock(&self) -> Frequency {
        self.clock
    }

    /// Time to stream a bitstream of `size_mb` megabytes through the port.
    ///
    /// One bus word is transferred per port clock cycle.
    pub fn configuration_time(&self, size_mb: f64) -> SimTime {
        let cycles = size_mb * 8.0 * 1e6 / f64::from(self.bus_width);
        SimTime::from_secs(cycles / self.clock.hz())
    }
}

impl Default for ConfigurationPort {
    /// A 32-bit port at 100 MHz.
    fn default() -> Self {
        Self {
            bus_width: 32,
            clock: Frequency::from_mhz(100.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rejects_odd_width() {
        let err = ConfigurationPort::new(24, Frequency::from_mhz(100.0)).unwrap_err();
        assert_eq!(err, FabricError::UnsupportedBusWidth { width: 24 });
    }

    #[test]
    fn configuration_time_scales_with_width() {
        let narrow = ConfigurationPort::new(8, Frequency::from_mhz(100.0)).unwrap();
        let wide = ConfigurationPort::new(32, Frequency::from_mhz(100.0)).unwrap();
        // 10 MB = 8e7 bits
        assert_relative_eq!(narrow.configuration_time(10.0).as_secs(), 0.1);
        assert_relative_eq!(wide.configuration_time(10.0).as_secs(), 0.025);
    }
}
