#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![doc = "A `no_std` echo-pulse timing engine for ultrasonic rangers."]
#![doc = ""]
#![doc = "This crate converts a rising/falling edge pair captured on a free-running 16-bit,"]
#![doc = "1 MHz timer into a centimeter distance, and publishes the result through a"]
#![doc = "single-writer atomic cell that readers can poll from any context."]

use core::fmt;

pub mod cell;
pub mod error;
pub mod ranger;

pub use cell::{Sample, SampleCell};
pub use error::RangingError;
pub use ranger::{EchoRanger, EdgeOutcome, Phase, PollOutcome, RangerConfig};

/// Largest value of the 16-bit capture counter.
pub const MAX_TICKS: u16 = u16::MAX;

/// Largest distance a single byte can carry (cm).
pub const MAX_DISTANCE_CM: u8 = u8::MAX;

/// Monotonic instant with microsecond resolution.
pub type Instant = fugit::TimerInstantU64<1_000_000>;

/// Duration with microsecond resolution.
pub type Duration = fugit::TimerDurationU64<1_000_000>;

/// Source of monotonic time used for trigger and echo deadlines.
pub trait Monotonic {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// Polarity of a captured transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Low to high transition (echo pulse start).
    Rising,
    /// High to low transition (echo pulse end).
    Falling,
}

/// Identifies one ultrasonic channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// First sensor, carried in byte 0 of the bus frame.
    A,
    /// Second sensor, carried in byte 1 of the bus frame.
    B,
}

impl Channel {
    /// Both channels in frame order.
    pub const ALL: [Channel; 2] = [Channel::A, Channel::B];

    /// Position of this channel in the frame payload.
    pub const fn index(self) -> usize {
        match self {
            Channel::A => 0,
            Channel::B => 1,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::A => write!(f, "sensor A"),
            Channel::B => write!(f, "sensor B"),
        }
    }
}

/// One timestamped edge delivered by the capture hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeEvent {
    /// Channel the edge was captured on.
    pub channel: Channel,
    /// Polarity of the edge.
    pub edge: Edge,
    /// Counter value latched at the edge.
    pub timer_ticks: u16,
}

impl EdgeEvent {
    /// Construct a new edge event.
    pub const fn new(channel: Channel, edge: Edge, timer_ticks: u16) -> Self {
        EdgeEvent {
            channel,
            edge,
            timer_ticks,
        }
    }
}

/// Input-capture unit of a hardware timer, one per channel.
///
/// The unit latches the counter on the configured polarity and raises an
/// interrupt that ends up in [`EchoRanger::on_edge`] while listening.
pub trait EdgeCapture {
    /// Select which transition is latched next.
    fn set_polarity(&mut self, edge: Edge);
    /// Enable capture interrupts.
    fn listen(&mut self);
    /// Disable capture interrupts.
    fn unlisten(&mut self);
    /// Reset the free-running counter to zero.
    fn reset_counter(&mut self);
}

/// Number of timer ticks between two captures, accounting for one counter wrap.
///
/// Equal captures give `0`. When `falling < rising` the counter is assumed to
/// have wrapped exactly once, so the result is `(MAX_TICKS - rising) + falling`.
pub const fn tick_delta(rising: u16, falling: u16) -> u16 {
    if falling >= rising {
        falling - rising
    } else {
        // falling < rising, so the sum stays below MAX_TICKS.
        (MAX_TICKS - rising) + falling
    }
}

/// Convert an echo pulse width in microseconds into centimeters.
///
/// Sound travels 0.034 cm/µs and the pulse covers the round trip, so the
/// distance is `floor(ticks * 0.034 / 2)`, computed here as `ticks * 17 / 1000`.
/// Values past one byte saturate at [`MAX_DISTANCE_CM`].
pub const fn ticks_to_cm(ticks: u16) -> u8 {
    let cm = (ticks as u32) * 17 / 1000;
    if cm > MAX_DISTANCE_CM as u32 {
        MAX_DISTANCE_CM
    } else {
        cm as u8
    }
}
