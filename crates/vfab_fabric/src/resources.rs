//! Fabric resource quantities.
//!
//! A [`Resources`] value is used both for an FPGA's fixed capacity and for the
//! slice granted to one region. Arithmetic saturates so a derived quantity can
//! never go negative.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

/// The resource types a fabric offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Logic elements (LUT/ALM equivalents).
    LogicElements,
    /// Memory registers (flip-flops).
    MemoryRegisters,
    /// Block RAM tiles.
    BlockRam,
    /// DSP slices.
    Dsp,
    /// I/O pins.
    Io,
    /// High-speed transceivers.
    Transceivers,
    /// Phase-locked loops.
    Plls,
}

impl ResourceKind {
    /// Every resource kind, in reporting order.
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::LogicElements,
        ResourceKind::MemoryRegisters,
        ResourceKind::BlockRam,
        ResourceKind::Dsp,
        ResourceKind::Io,
        ResourceKind::Transceivers,
        ResourceKind::Plls,
    ];
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::LogicElements => "LE",
            ResourceKind::MemoryRegisters => "REG",
            ResourceKind::BlockRam => "BRAM",
            ResourceKind::Dsp => "DSP",
            ResourceKind::Io => "IO",
            ResourceKind::Transceivers => "XCVR",
            ResourceKind::Plls => "PLL",
        };
        f.write_str(name)
    }
}

/// A quantity of each fabric resource type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    /// Logic elements.
    pub logic_elements: u64,
    /// Memory registers.
    pub memory_registers: u64,
    /// Block RAM tiles.
    pub block_ram: u64,
    /// DSP slices.
    pub dsp: u64,
    /// I/O pins.
    pub io: u64,
    /// Transceivers.
    pub transceivers: u64,
    /// PLLs.
    pub plls: u64,
}

impl Resources {
    /// Returns the quantity of one resource kind.
    pub fn get(&self, kind: ResourceKind) -> u64 {
        match kind {
            ResourceKind::LogicElements => self.logic_elements,
            ResourceKind::MemoryRegisters => self.memory_registers,
            ResourceKind::BlockRam => self.block_ram,
            ResourceKind::Dsp => self.dsp,
            ResourceKind::Io => self.io,
            ResourceKind::Transceivers => self.transceivers,
            ResourceKind::Plls => self.plls,
        }
    }

    /// Sets the quantity of one resource kind.
    pub fn set(&mut self, kind: ResourceKind, value: u64) {
        let slot = match kind {
            ResourceKind::LogicElements => &mut self.logic_elements,
            ResourceKind::MemoryRegisters => &mut self.memory_registers,
            ResourceKind::BlockRam => &mut self.block_ram,
            ResourceKind::Dsp => &mut self.dsp,
            ResourceKind::Io => &mut self.io,
            ResourceKind::Transceivers => &mut self.transceivers,
            ResourceKind::Plls => &mut self.plls,
        };
        *slot = value;
    }

    /// Applies `f` to every resource kind pairwise.
    fn zip_with(&self, other: &Resources, f: impl Fn(u64, u64) -> u64) -> Resources {
        let mut out = Resources::default();
        for kind in ResourceKind::ALL {
            out.set(kind, f(self.get(kind), other.get(kind)));
        }
        out
    }

    /// Subtracts `other` from each resource, clamping at zero.
    pub fn saturating_sub(&self, other: &Resources) -> Resources {
        self.zip_with(other, u64::saturating_sub)
    }

    /// Takes the per-resource minimum of `self` and `limit`.
    pub fn clamp_to(&self, limit: &Resources) -> Resources {
        self.zip_with(limit, u64::min)
    }

    /// Returns `true` if no resource exceeds the matching quantity in `capacity`.
    pub fn fits_within(&self, capacity: &Resources) -> bool {
        ResourceKind::ALL
            .iter()
            .all(|&k| self.get(k) <= capacity.get(k))
    }

    /// Divides each resource evenly into `parts` shares (rounding down).
    pub fn split(&self, parts: u64) -> Resources {
        let mut out = Resources::default();
        if parts == 0 {
            return out;
        }
        for kind in ResourceKind::ALL {
            out.set(kind, self.get(kind) / parts);
        }
        out
    }

    /// Returns `self[kind]` as a percentage of `capacity[kind]`, or 0 for an empty capacity.
    pub fn percent_of(&self, capacity: &Resources, kind: ResourceKind) -> f64 {
        let cap = capacity.get(kind);
        if cap == 0 {
            0.0
        } else {
            self.get(kind) as f64 * 100.0 / cap as f64
        }
    }
}

impl Add for Resources {
    type Output = Resources;

    fn add(self, rhs: Resources) -> Resources {
        self.zip_with(&rhs, u64::saturating_add)
    }
}

impl Sum for Resources {
    fn sum<I: Iterator<Item = Resources>>(iter: I) -> Resources {
        iter.fold(Resources::default(), |acc, r| acc + r)
    }
}

impl<'a> Sum<&'a Resources> for Resources {
    fn sum<I: Iterator<Item = &'a Resources>>(iter: I) -> Resources {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Resources {
        Resources {
            logic_elements: 100,
            memory_registers: 200,
            block_ram: 10,
            dsp: 8,
            io: 40,
            transceivers: 4,
            plls: 2,
        }
    }

    #[test]
    fn split_rounds_down() {
        let s = sample().split(3);
        assert_eq!(s.logic_elements, 33);
        assert_eq!(s.plls, 0);
    }

    #[test]
    fn split_by_zero_is_empty() {
        assert_eq!(sample().split(0), Resources::default());
    }

    #[test]
    fn saturating_sub_never_underflows() {
        let small = Resources {
            dsp: 1,
            ..Resources::default()
        };
        let diff = small.saturating_sub(&sample());
        assert_eq!(diff, Resources::default());
    }

    #[test]
    fn clamp_takes_minimum() {
        let want = Resources {
            logic_elements: 500,
            dsp: 3,
            ..Resources::default()
        };
        let got = want.clamp_to(&sample());
        assert_eq!(got.logic_elements, 100);
        assert_eq!(got.dsp, 3);
    }

    #[test]
    fn sum_and_fits_within() {
        let parts = vec![sample().split(2), sample().split(2)];
        let total: Resources = parts.iter().sum();
        assert!(total.fits_within(&sample()));
        assert!(!(total + sample()).fits_within(&sample()));
    }

    #[test]
    fn percent_of_handles_zero_capacity() {
        let r = sample();
        assert_eq!(r.percent_of(&Resources::default(), ResourceKind::Dsp), 0.0);
        assert_eq!(r.split(2).percent_of(&r, ResourceKind::LogicElements), 50.0);
    }

    #[test]
    fn serde_roundtrip() {
        let json = serde_json::to_string(&sample()).unwrap();
        let back: Resources = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample());
    }
}
