use radar_link::DistancePair;

/// Which sensor a selected distance came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Frame byte 0.
    SensorA,
    /// Frame byte 1.
    SensorB,
}

/// The distance every output is driven from during one evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    /// Selected raw sample (cm).
    pub raw_cm: u8,
    /// Same sample in meters.
    pub meters: f32,
    /// Sensor it came from.
    pub source: Source,
}

/// Picks the closer of the two reported obstacles.
pub struct DistanceSelector;

impl DistanceSelector {
    /// Smaller of the two samples; a tie resolves to sensor B, which carries the same value.
    pub fn select(pair: DistancePair) -> Selection {
        let (raw_cm, source) = if pair.sensor_a < pair.sensor_b {
            (pair.sensor_a, Source::SensorA)
        } else {
            (pair.sensor_b, Source::SensorB)
        };
        Selection {
            raw_cm,
            meters: f32::from(raw_cm) / 100.0,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    const EPSILON: f32 = 1e-6;

    #[test]
    fn test_select_smaller() {
        let s = DistanceSelector::select(DistancePair::new(45, 80));
        assert_eq!(s.raw_cm, 45);
        assert_eq!(s.source, Source::SensorA);
        assert!((s.meters - 0.45).abs() < EPSILON);

        let s = DistanceSelector::select(DistancePair::new(200, 7));
        assert_eq!(s.raw_cm, 7);
        assert_eq!(s.source, Source::SensorB);
    }

    #[test]
    fn test_select_tie_returns_common_value() {
        let s = DistanceSelector::select(DistancePair::new(120, 120));
        assert_eq!(s.raw_cm, 120);
        assert!((s.meters - 1.2).abs() < EPSILON);
    }

    #[test]
    fn test_select_is_min_for_all_pairs() {
        for a in (0..=255u8).step_by(5) {
            for b in (0..=255u8).step_by(7) {
                let s = DistanceSelector::select(DistancePair::new(a, b));
                assert_eq!(s.raw_cm, a.min(b));
            }
        }
    }
}
