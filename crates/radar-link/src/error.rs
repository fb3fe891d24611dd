//! This module defines the error types used by the `radar-link` crate.

use thiserror::Error;

/// Error type for bus transport operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LinkError {
    /// The identifier does not fit an 11-bit standard frame.
    #[error("invalid bus address {0:#x}: standard identifiers are 11 bits")]
    InvalidAddress(u16),
    /// The frame passed the filter but its payload is not a distance pair.
    #[error("malformed frame from {id:#x}: expected 2 data bytes, got {dlc}")]
    Malformed {
        /// Identifier of the offending frame.
        id: u16,
        /// Data length code it carried.
        dlc: u8,
    },
    /// Every transmit mailbox is occupied; the frame was dropped.
    #[error("transmit mailbox full")]
    MailboxFull,
    /// The bus is no longer reachable.
    #[error("bus disconnected")]
    Disconnected,
}
