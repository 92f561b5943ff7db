//! Opaque component addresses and the capability traits built on them.

use crate::frequency::Frequency;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// An opaque address handed out by the routing substrate.
///
/// The simulator core never inspects the value; it only compares addresses
/// and uses them as routing-table keys. `Display` renders dotted-quad form.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Address(u32);

impl Address {
    /// Creates an address from its raw value.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Ipv4Addr::from(self.0))
    }
}

/// A component that payloads can be delivered to.
pub trait Addressable {
    /// Returns the component's address, or `None` before one is assigned.
    fn address(&self) -> Option<Address>;
}

/// A component driven by a clock.
pub trait Clocked {
    /// Returns the component's clock frequency.
    fn clock(&self) -> Frequency;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_dotted_quad() {
        let addr = Address::from_raw(u32::from(Ipv4Addr::new(192, 168, 0, 7)));
        assert_eq!(format!("{addr}"), "192.168.0.7");
    }
}
