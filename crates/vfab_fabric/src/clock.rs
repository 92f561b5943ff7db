//! Per-fabric clock domains backed by a bounded PLL pool.

use std::collections::BTreeMap;
use vfab_common::{Frequency, VFpgaId};

/// Hands out clock domains to virtual FPGAs on one fabric.
///
/// A virtual FPGA running at the master clock needs no PLL. All virtual FPGAs
/// running at the same non-master frequency share one PLL. At most
/// `max_plls` distinct non-master frequencies can be live at once.
#[derive(Debug, Clone)]
pub struct ClockManager {
    master: Frequency,
    max_plls: usize,
    /// Frequency (in whole Hz) to the virtual FPGAs clocked by it.
    domains: BTreeMap<u64, Vec<VFpgaId>>,
}

impl ClockManager {
    /// Creates a clock manager for a fabric with the given master clock and PLL count.
    pub fn new(master: Frequency, max_plls: usize) -> Self {
        Self {
            master,
            max_plls,
            domains: BTreeMap::new(),
        }
    }

    fn key(clock: Frequency) -> u64 {
        clock.hz().round() as u64
    }

    fn is_master(&self, clock: Frequency) -> bool {
        Self::key(clock) == Self::key(self.master)
    }

    /// Returns the fabric's master clock.
    pub fn master(&self) -> Frequency {
        self.master
    }

    /// Returns the number of PLLs currently generating a clock.
    pub fn plls_in_use(&self) -> usize {
        let master = Self::key(self.master);
        self.domains.keys().filter(|&&hz| hz != master).count()
    }

    /// Returns the size of the PLL pool.
    pub fn max_plls(&self) -> usize {
        self.max_plls
    }

    /// Registers `vfpga` in the `clock` domain.
    ///
    /// Returns `false` if the instance is already registered, or if the
    /// frequency needs a fresh PLL and the pool is exhausted.
    pub fn acquire(&mut self, vfpga: VFpgaId, clock: Frequency) -> bool {
        if self.domains.values().any(|members| members.contains(&vfpga)) {
            return false;
        }
        let key = Self::key(clock);
        let needs_new_pll = !self.is_master(clock) && !self.domains.contains_key(&key);
        if needs_new_pll && self.plls_in_use() >= self.max_plls {
            log::debug!("no PLL left for vfpga {vfpga} at {clock}");
            return false;
        }
        self.domains.entry(key).or_default().push(vfpga);
        true
    }

    /// Removes `vfpga` from its clock domain. Returns `false` if it held none.
    pub fn release(&mut self, vfpga: VFpgaId) -> bool {
        let Some((&key, members)) = self
            .domains
            .iter_mut()
            .find(|(_, members)| members.contains(&vfpga))
        else {
            return false;
        };
        members.retain(|&m| m != vfpga);
        if members.is_empty() {
            self.domains.remove(&key);
        }
        true
    }

    /// Returns `true` if `vfpga` is clocked by a PLL rather than the master clock.
    pub fn holds_pll(&self, vfpga: VFpgaId) -> bool {
        let master = Self::key(self.master);
        self.domains
            .iter()
            .any(|(&hz, members)| hz != master && members.contains(&vfpga))
    }
}
