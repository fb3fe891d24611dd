//! Receive buffer for the latest accepted distance pair.

use core::sync::atomic::{AtomicU16, Ordering};

use crate::DistancePair;

/// Tear-free single-writer cell holding both distances of the last accepted frame.
///
/// Both bytes are packed into one `AtomicU16` so readers never combine
/// sensor A from one frame with sensor B from another.
#[derive(Debug)]
pub struct PairCell(AtomicU16);

impl PairCell {
    /// A cell holding `(0, 0)`.
    pub const fn new() -> Self {
        PairCell(AtomicU16::new(0))
    }

    /// Replace the stored pair.
    pub fn store(&self, pair: DistancePair) {
        self.0.store(u16::from_le_bytes(pair.to_bytes()), Ordering::Release);
    }

    /// Read the stored pair.
    pub fn load(&self) -> DistancePair {
        DistancePair::from_bytes(self.0.load(Ordering::Acquire).to_le_bytes())
    }
}

impl Default for PairCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_load() {
        let cell = PairCell::new();
        assert_eq!(cell.load(), DistancePair::new(0, 0));
        cell.store(DistancePair::new(45, 80));
        assert_eq!(cell.load(), DistancePair::new(45, 80));
        cell.store(DistancePair::new(255, 0));
        assert_eq!(cell.load(), DistancePair::new(255, 0));
    }

    #[test]
    fn test_reader_never_sees_mixed_frames() {
        use std::sync::Arc;

        let cell = Arc::new(PairCell::new());
        let writer = {
            let cell = Arc::clone(&cell);
            std::thread::spawn(move || {
                for i in 0..20_000u32 {
                    let v = (i % 256) as u8;
                    cell.store(DistancePair::new(v, v));
                }
            })
        };
        for _ in 0..20_000 {
            let pair = cell.load();
            assert_eq!(pair.sensor_a, pair.sensor_b);
        }
        writer.join().unwrap();
    }
}
