//! Clock frequencies for fabrics, accelerators, and configuration ports.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A frequency value stored in Hertz.
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frequency(f64);

impl Frequency {
    /// Creates a frequency from a value in megahertz.
    pub fn from_mhz(mhz: f64) -> Self {
        Self(mhz * 1_000_000.0)
    }

    /// Returns the frequency in Hertz.
    pub fn hz(&self) -> f64 {
        self.0
    }

    /// Returns the frequency in megahertz.
    pub fn mhz(&self) -> f64 {
        self.0 / 1_000_000.0
    }
}

impl fmt::Debug for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frequency({self})")
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hz = self.0;
        if hz >= 1_000_000_000.0 {
            write!(f, "{}GHz", hz / 1_000_000_000.0)
        } else if hz >= 1_000_000.0 {
            write!(f, "{}MHz", hz / 1_000_000.0)
        } else if hz >= 1_000.0 {
            write!(f, "{}KHz", hz / 1_000.0)
        } else {
            write!(f, "{hz}Hz")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mhz_round_trip() {
        let f = Frequency::from_mhz(150.0);
        assert_eq!(f.hz(), 150_000_000.0);
        assert_eq!(f.mhz(), 150.0);
    }

    #[test]
    fn display_selects_best_unit() {
        assert_eq!(format!("{}", Frequency::from_mhz(150.0)), "150MHz");
        assert_eq!(format!("{}", Frequency::from_mhz(1000.0)), "1GHz");
        assert_eq!(format!("{}", Frequency(250_000.0)), "250KHz");
        assert_eq!(format!("{}", Frequency(500.0)), "500Hz");
    }
}
