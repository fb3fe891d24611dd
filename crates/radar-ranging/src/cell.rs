//! Single-writer atomic publication of the latest distance sample.

use core::sync::atomic::{AtomicU16, Ordering};

const FRESH: u16 = 1 << 8;
const DISTANCE_MASK: u16 = 0x00ff;

/// The last completed measurement of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sample {
    /// Last measured distance (cm).
    pub distance_cm: u8,
    /// `false` before the first measurement and after too many missed echoes.
    pub fresh: bool,
}

impl Sample {
    /// Value to put on the wire: the distance when fresh, `0` otherwise.
    ///
    /// A channel without a usable echo reads as an obstacle at zero distance.
    pub const fn wire_cm(&self) -> u8 {
        if self.fresh { self.distance_cm } else { 0 }
    }
}

/// Tear-free cell written by exactly one ranger and read by any number of tasks.
///
/// The distance byte and the freshness flag share one `AtomicU16`, so a
/// reader never observes a distance from one cycle paired with the flag of
/// another.
#[derive(Debug)]
pub struct SampleCell(AtomicU16);

impl SampleCell {
    /// An empty cell: distance 0, not fresh.
    pub const fn new() -> Self {
        SampleCell(AtomicU16::new(0))
    }

    /// Store a completed measurement and mark it fresh.
    pub fn publish(&self, distance_cm: u8) {
        self.0.store(FRESH | u16::from(distance_cm), Ordering::Release);
    }

    /// Keep the last distance but flag it as stale.
    pub fn mark_stale(&self) {
        self.0.fetch_and(!FRESH, Ordering::AcqRel);
    }

    /// Read the current sample.
    pub fn load(&self) -> Sample {
        let raw = self.0.load(Ordering::Acquire);
        Sample {
            distance_cm: (raw & DISTANCE_MASK) as u8,
            fresh: raw & FRESH != 0,
        }
    }
}

impl Default for SampleCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_cell_is_not_fresh() {
        let cell = SampleCell::new();
        assert_eq!(cell.load(), Sample { distance_cm: 0, fresh: false });
        assert_eq!(cell.load().wire_cm(), 0);
    }

    #[test]
    fn test_publish_then_stale_keeps_distance() {
        let cell = SampleCell::new();
        cell.publish(142);
        assert_eq!(cell.load(), Sample { distance_cm: 142, fresh: true });
        assert_eq!(cell.load().wire_cm(), 142);

        cell.mark_stale();
        assert_eq!(cell.load(), Sample { distance_cm: 142, fresh: false });
        assert_eq!(cell.load().wire_cm(), 0);

        cell.publish(255);
        assert_eq!(cell.load().wire_cm(), 255);
    }

    #[test]
    fn test_concurrent_reader_never_sees_torn_sample() {
        use std::sync::Arc;

        let cell = Arc::new(SampleCell::new());
        let writer = {
            let cell = Arc::clone(&cell);
            std::thread::spawn(move || {
                for round in 0..20_000u32 {
                    // Even distances are always published fresh.
                    cell.publish(((round % 128) * 2) as u8);
                }
            })
        };
        for _ in 0..20_000 {
            let s = cell.load();
            assert!(s.distance_cm % 2 == 0);
            assert!(s.fresh || s.distance_cm == 0);
        }
        writer.join().unwrap();
    }
}
