#![warn(missing_docs)]

//! Error types for the ranging library.

use core::fmt;

use embedded_hal::digital::ErrorKind;

/// Errors that can occur while driving an ultrasonic channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangingError {
    /// A trigger was requested while a measurement cycle was still in flight.
    Busy(&'static str),
    /// The trigger line could not be driven.
    TriggerPin(ErrorKind),
    /// The configuration cannot produce a measurement.
    InvalidConfig(&'static str),
}

impl fmt::Display for RangingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangingError::Busy(msg) => write!(f, "Ranger busy: {}", msg),
            RangingError::TriggerPin(kind) => write!(f, "Trigger pin error: {:?}", kind),
            RangingError::InvalidConfig(msg) => write!(f, "Invalid ranger configuration: {}", msg),
        }
    }
}

impl core::error::Error for RangingError {}
