//! Host stand-ins for the hardware both nodes talk to.

pub mod echo;
pub mod panel;
pub mod world;

use radar_ranging::{Instant, Monotonic};

/// Microsecond clock shared by the trigger tasks and the echo threads.
#[derive(Debug, Clone, Copy)]
pub struct HostClock {
    origin: std::time::Instant,
}

impl HostClock {
    pub fn new() -> Self {
        HostClock {
            origin: std::time::Instant::now(),
        }
    }

    pub fn micros(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }
}

impl Default for HostClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Monotonic for HostClock {
    fn now(&self) -> Instant {
        Instant::from_ticks(self.micros())
    }
}
