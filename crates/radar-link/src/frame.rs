//! Wire form and typed form of a distance report.

use core::fmt;

use crate::{Address, DistancePair, LinkError};

/// Payload length of a distance report.
pub const PAYLOAD_LEN: u8 = 2;

/// A classic bus frame as it travels on the wire: identifier, length, 8 data bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame {
    /// Standard identifier of the sender.
    pub id: u16,
    /// Data length code.
    pub dlc: u8,
    /// Data bytes; only the first `dlc` are meaningful.
    pub data: [u8; 8],
}

impl RawFrame {
    /// Build a raw frame from a payload slice of at most 8 bytes.
    ///
    /// Longer payloads are truncated to 8 bytes.
    pub fn new(id: u16, payload: &[u8]) -> Self {
        let len = payload.len().min(8);
        let mut data = [0u8; 8];
        data[..len].copy_from_slice(&payload[..len]);
        RawFrame {
            id,
            dlc: len as u8,
            data,
        }
    }

    /// Meaningful data bytes.
    pub fn payload(&self) -> &[u8] {
        &self.data[..usize::from(self.dlc.min(8))]
    }
}

/// A distance report: two payload bytes tagged with the sender address.
///
/// Frames are built fresh for each transmission and are never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFrame {
    sender: Address,
    pair: DistancePair,
}

impl BusFrame {
    /// Construct a report.
    pub const fn new(sender: Address, pair: DistancePair) -> Self {
        BusFrame { sender, pair }
    }

    /// Sender address.
    pub const fn sender(&self) -> Address {
        self.sender
    }

    /// Reported distances.
    pub const fn pair(&self) -> DistancePair {
        self.pair
    }

    /// Encode for the wire.
    pub fn to_raw(&self) -> RawFrame {
        RawFrame::new(self.sender.id(), &self.pair.to_bytes())
    }

    /// Decode a wire frame.
    ///
    /// # Errors
    ///
    /// Returns `Err(LinkError::InvalidAddress)` for identifiers beyond 11 bits and
    /// `Err(LinkError::Malformed)` if the frame does not carry exactly two bytes.
    pub fn from_raw(raw: &RawFrame) -> Result<Self, LinkError> {
        let sender = Address::new(raw.id)?;
        if raw.dlc != PAYLOAD_LEN {
            return Err(LinkError::Malformed {
                id: raw.id,
                dlc: raw.dlc,
            });
        }
        Ok(BusFrame {
            sender,
            pair: DistancePair::from_bytes([raw.data[0], raw.data[1]]),
        })
    }
}

impl fmt::Display for BusFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.sender, self.pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let frame = BusFrame::new(Address::SENSOR_NODE, DistancePair::new(45, 80));
        let raw = frame.to_raw();
        assert_eq!(raw.id, 0x103);
        assert_eq!(raw.dlc, 2);
        assert_eq!(raw.data, [45, 80, 0, 0, 0, 0, 0, 0]);
        assert_eq!(raw.payload(), &[45, 80]);
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let raw = RawFrame::new(0x103, &[1, 2, 3]);
        assert_eq!(
            BusFrame::from_raw(&raw),
            Err(LinkError::Malformed { id: 0x103, dlc: 3 })
        );
        let empty = RawFrame::new(0x103, &[]);
        assert!(matches!(BusFrame::from_raw(&empty), Err(LinkError::Malformed { dlc: 0, .. })));
    }

    #[test]
    fn test_decode_rejects_extended_identifier() {
        let raw = RawFrame::new(0xffff, &[1, 2]);
        assert_eq!(BusFrame::from_raw(&raw), Err(LinkError::InvalidAddress(0xffff)));
    }

    #[test]
    fn test_decode_extremes() {
        let raw = RawFrame::new(0x103, &[0, 255]);
        let frame = BusFrame::from_raw(&raw).unwrap();
        assert_eq!(frame.sender(), Address::SENSOR_NODE);
        assert_eq!(frame.pair(), DistancePair::new(0, 255));
    }

    #[test]
    fn test_raw_frame_truncates_long_payload() {
        let raw = RawFrame::new(0x10, &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(raw.dlc, 8);
        assert_eq!(raw.payload(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    }
}
