//! This module defines the error types used by the `radar-feedback` crate.

use embedded_hal::digital::ErrorKind;
use thiserror::Error;

/// Error type for interpretation and output operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FeedbackError {
    /// A retuned ladder would break the ordering of tiers.
    #[error("invalid threshold ladder: {0}")]
    InvalidLadder(&'static str),
    /// An output pin could not be driven.
    #[error("output pin error: {0:?}")]
    Pin(ErrorKind),
}
