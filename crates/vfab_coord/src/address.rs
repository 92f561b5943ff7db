//! Address assignment and the routing table.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;
use vfab_common::{Address, FpgaId, VFpgaId};

/// Hands out addresses for components that receive payloads.
pub trait AddressProvider {
    /// Returns a fresh address, or `None` when the pool is exhausted.
    fn request_address(&mut self) -> Option<Address>;

    /// Returns an address to the pool.
    fn release_address(&mut self, address: Address);
}

/// Assigns consecutive addresses from a base, reusing released ones first.
#[derive(Debug, Clone)]
pub struct SequentialAddresses {
    base: u32,
    size: u32,
    next: u32,
    released: BTreeSet<u32>,
}

impl SequentialAddresses {
    /// Creates a pool of `size` addresses starting at `base`.
    pub fn new(base: Ipv4Addr, size: u32) -> Self {
        Self {
            base: u32::from(base),
            size,
            next: 0,
            released: BTreeSet::new(),
        }
    }
}

impl Default for SequentialAddresses {
    /// `10.0.0.1` through `10.0.255.254`.
    fn default() -> Self {
        Self::new(Ipv4Addr::new(10, 0, 0, 1), 65_534)
    }
}

impl AddressProvider for SequentialAddresses {
    fn request_address(&mut self) -> Option<Address> {
        if let Some(offset) = self.released.pop_first() {
            return Some(Address::from_raw(self.base + offset));
        }
        if self.next >= self.size {
            return None;
        }
        let offset = self.next;
        self.next += 1;
        Some(Address::from_raw(self.base + offset))
    }

    fn release_address(&mut self, address: Address) {
        let raw = address.as_raw();
        if raw >= self.base && raw - self.base < self.next {
            self.released.insert(raw - self.base);
        }
    }
}

/// The component a routed payload is handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endpoint {
    /// The coordinator itself.
    Coordinator,
    /// The configuration manager of one fabric.
    ConfigurationManager(FpgaId),
    /// A live virtual FPGA.
    VFpga(VFpgaId),
}

/// Maps addresses to the endpoints that own them.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    routes: BTreeMap<Address, Endpoint>,
}

impl RoutingTable {
    /// Registers `endpoint` under `address`, replacing any previous owner.
    pub fn register(&mut self, address: Address, endpoint: Endpoint) {
        self.routes.insert(address, endpoint);
    }

    /// Removes the route for `address`.
    pub fn unregister(&mut self, address: Address) -> Option<Endpoint> {
        self.routes.remove(&address)
    }

    /// Looks up the owner of `address`.
    pub fn resolve(&self, address: Address) -> Option<Endpoint> {
        self.routes.get(&address).copied()
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no route is registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses_are_sequential_from_base() {
        let mut pool = SequentialAddresses::new(Ipv4Addr::new(192, 168, 1, 10), 4);
        let a = pool.request_address().unwrap();
        let b = pool.request_address().unwrap();
        assert_eq!(a.to_string(), "192.168.1.10");
        assert_eq!(b.to_string(), "192.168.1.11");
    }

    #[test]
    fn released_addresses_are_reused_first() {
        let mut pool = SequentialAddresses::new(Ipv4Addr::new(10, 0, 0, 1), 4);
        let a = pool.request_address().unwrap();
        pool.request_address().unwrap();
        pool.release_address(a);
        assert_eq!(pool.request_address(), Some(a));
    }

    #[test]
    fn pool_exhausts() {
        let mut pool = SequentialAddresses::new(Ipv4Addr::new(10, 0, 0, 1), 1);
        assert!(pool.request_address().is_some());
        assert!(pool.request_address().is_none());
    }

    #[test]
    fn foreign_address_is_not_pooled() {
        let mut pool = SequentialAddresses::new(Ipv4Addr::new(10, 0, 0, 1), 2);
        pool.release_address(Address::from_raw(7));
        assert_eq!(pool.request_address().unwrap().to_string(), "10.0.0.1");
    }

    #[test]
    fn routes_register_and_unregister() {
        let mut table = RoutingTable::default();
        let addr = Address::from_raw(1);
        table.register(addr, Endpoint::VFpga(VFpgaId::from_raw(3)));
        assert_eq!(
            table.resolve(addr),
            Some(Endpoint::VFpga(VFpgaId::from_raw(3)))
        );
        assert_eq!(table.unregister(addr), Some(Endpoint::VFpga(VFpgaId::from_raw(3))));
        assert!(table.is_empty());
    }
}
