#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![doc = "Distance-pair transport over a shared multi-drop bus."]
#![doc = ""]
#![doc = "The sensing node packs its two channel distances into a fixed two-byte frame"]
#![doc = "tagged with its own address; the display node accepts only frames whose"]
#![doc = "address passes its filter and stores the pair in a tear-free atomic cell."]

use core::fmt;

pub mod cell;
pub mod error;
pub mod filter;
pub mod frame;
pub mod port;

pub use cell::PairCell;
pub use error::LinkError;
pub use filter::AddressFilter;
pub use frame::{BusFrame, RawFrame};
pub use port::{Delivery, RxPort, Transmit, TxPort};

/// Highest standard (11-bit) identifier.
pub const MAX_STANDARD_ID: u16 = 0x7ff;

/// Logical sender address of a node on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(u16);

impl Address {
    /// Address used by the measuring node for distance reports.
    pub const SENSOR_NODE: Address = Address(0x103);
    /// Address reserved for the display node (no return traffic is sent).
    pub const DISPLAY_NODE: Address = Address(0x104);

    /// Validate a raw identifier.
    ///
    /// # Errors
    ///
    /// Returns `Err(LinkError::InvalidAddress)` if `id` exceeds 11 bits.
    pub const fn new(id: u16) -> Result<Self, LinkError> {
        if id > MAX_STANDARD_ID {
            return Err(LinkError::InvalidAddress(id));
        }
        Ok(Address(id))
    }

    /// Raw identifier.
    pub const fn id(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#05x}", self.0)
    }
}

/// Two independently measured distances in centimeters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DistancePair {
    /// Sensor A distance (cm), frame byte 0.
    pub sensor_a: u8,
    /// Sensor B distance (cm), frame byte 1.
    pub sensor_b: u8,
}

impl DistancePair {
    /// Construct a pair.
    pub const fn new(sensor_a: u8, sensor_b: u8) -> Self {
        DistancePair { sensor_a, sensor_b }
    }

    /// Payload bytes in frame order.
    pub const fn to_bytes(self) -> [u8; 2] {
        [self.sensor_a, self.sensor_b]
    }

    /// Pair from payload bytes in frame order.
    pub const fn from_bytes(bytes: [u8; 2]) -> Self {
        DistancePair::new(bytes[0], bytes[1])
    }
}

impl fmt::Display for DistancePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(A: {} cm, B: {} cm)", self.sensor_a, self.sensor_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_validation() {
        assert_eq!(Address::new(0x103), Ok(Address::SENSOR_NODE));
        assert_eq!(Address::new(0x7ff).map(Address::id), Ok(0x7ff));
        assert_eq!(Address::new(0x800), Err(LinkError::InvalidAddress(0x800)));
    }

    #[test]
    fn test_node_addresses_are_disjoint() {
        assert_ne!(Address::SENSOR_NODE, Address::DISPLAY_NODE);
    }

    #[test]
    fn test_address_display() {
        assert_eq!(Address::SENSOR_NODE.to_string(), "0x103");
    }

    #[test]
    fn test_pair_byte_order() {
        let pair = DistancePair::new(45, 80);
        assert_eq!(pair.to_bytes(), [45, 80]);
        assert_eq!(DistancePair::from_bytes([45, 80]), pair);
    }
}
