//! Acceptance filtering of incoming frames.

use crate::{Address, MAX_STANDARD_ID, RawFrame};

/// Identifier/mask acceptance filter.
///
/// A frame passes when `frame.id & mask == id & mask`. With the full 11-bit
/// mask this is an exact match on a single sender address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressFilter {
    id: u16,
    mask: u16,
}

impl AddressFilter {
    /// Accept exactly one sender.
    pub const fn exact(sender: Address) -> Self {
        AddressFilter {
            id: sender.id(),
            mask: MAX_STANDARD_ID,
        }
    }

    /// Accept every identifier that agrees with `sender` on the bits set in `mask`.
    pub const fn masked(sender: Address, mask: u16) -> Self {
        AddressFilter {
            id: sender.id(),
            mask: mask & MAX_STANDARD_ID,
        }
    }

    /// Whether a frame with this identifier is delivered.
    pub const fn accepts_id(&self, id: u16) -> bool {
        // Bits above the standard identifier never match a configured filter.
        id <= MAX_STANDARD_ID && (id & self.mask) == (self.id & self.mask)
    }

    /// Whether this frame is delivered.
    pub const fn accepts(&self, frame: &RawFrame) -> bool {
        self.accepts_id(frame.id)
    }
}
