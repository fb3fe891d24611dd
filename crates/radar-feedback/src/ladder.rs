//! Distance thresholds mapped to LED and buzzer behavior.
//!
//! The ladder has seven tiers ordered by upper bound. A distance belongs to
//! the first tier whose bound it does not exceed, so boundaries are inclusive
//! on the closer tier and every input lands in exactly one tier.

use std::fmt;
use std::time::Duration;

use crate::{BuzzerMode, FeedbackError, LedPattern};

/// Number of tiers in a ladder.
pub const TIER_COUNT: usize = 7;

/// Upper bounds (m) of every tier except the last, closest first.
pub const STANDARD_BOUNDS_M: [f32; TIER_COUNT - 1] = [0.3, 0.5, 0.7, 0.9, 1.1, 1.3];

/// Buzzer half-periods (ms) of the toggling tiers, closest first.
pub const STANDARD_HALF_PERIODS_MS: [u64; TIER_COUNT - 2] = [50, 100, 300, 400, 600];

/// Named proximity zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    RedFull,
    Red,
    YellowFull,
    Yellow,
    GreenFull,
    Green,
    Clear,
}

impl Zone {
    /// Zones in ladder order, closest first.
    pub const ALL: [Zone; TIER_COUNT] = [
        Zone::RedFull,
        Zone::Red,
        Zone::YellowFull,
        Zone::Yellow,
        Zone::GreenFull,
        Zone::Green,
        Zone::Clear,
    ];
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Zone::RedFull => "red (full)",
            Zone::Red => "red",
            Zone::YellowFull => "yellow (full)",
            Zone::Yellow => "yellow",
            Zone::GreenFull => "green (full)",
            Zone::Green => "green",
            Zone::Clear => "clear",
        };
        f.write_str(name)
    }
}

/// One rung of the ladder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuationTier {
    pub zone: Zone,
    /// Inclusive upper bound in meters; the last tier is unbounded.
    pub upper_bound_m: f32,
    pub leds: LedPattern,
    pub buzzer: BuzzerMode,
}

impl ActuationTier {
    /// The farthest tier: silent buzzer and the warning glyph.
    pub fn is_clear(&self) -> bool {
        self.zone == Zone::Clear
    }
}

/// Ordered mapping from distance to outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdLadder {
    tiers: [ActuationTier; TIER_COUNT],
}

impl ThresholdLadder {
    /// Ladder with the standard bounds and buzzer periods.
    pub fn standard() -> Self {
        Self::build(
            STANDARD_BOUNDS_M,
            STANDARD_HALF_PERIODS_MS.map(Duration::from_millis),
        )
    }

    /// Ladder with custom bounds (closest first) and toggle half-periods
    /// (closest toggling tier first).
    ///
    /// # Errors
    ///
    /// Returns `FeedbackError::InvalidLadder` unless bounds are finite,
    /// positive and strictly increasing, and half-periods are non-zero and
    /// strictly increasing with distance.
    pub fn retuned(
        bounds_m: [f32; TIER_COUNT - 1],
        half_periods: [Duration; TIER_COUNT - 2],
    ) -> Result<Self, FeedbackError> {
        if bounds_m.iter().any(|b| !b.is_finite() || *b <= 0.0) {
            return Err(FeedbackError::InvalidLadder(
                "bounds must be finite and positive",
            ));
        }
        if bounds_m.windows(2).any(|w| w[0] >= w[1]) {
            return Err(FeedbackError::InvalidLadder(
                "bounds must be strictly increasing",
            ));
        }
        if half_periods.iter().any(Duration::is_zero) {
            return Err(FeedbackError::InvalidLadder("half-periods must be non-zero"));
        }
        if half_periods.windows(2).any(|w| w[0] >= w[1]) {
            return Err(FeedbackError::InvalidLadder(
                "half-periods must grow with distance",
            ));
        }
        Ok(Self::build(bounds_m, half_periods))
    }

    fn build(
        bounds_m: [f32; TIER_COUNT - 1],
        half_periods: [Duration; TIER_COUNT - 2],
    ) -> Self {
        let tiers = core::array::from_fn(|i| {
            let upper_bound_m = bounds_m.get(i).copied().unwrap_or(f32::INFINITY);
            let buzzer = match i {
                0 => BuzzerMode::Continuous,
                i if i == TIER_COUNT - 1 => BuzzerMode::Silent,
                i => BuzzerMode::Toggle(half_periods[i - 1]),
            };
            ActuationTier {
                zone: Zone::ALL[i],
                upper_bound_m,
                // Closest tier lights the whole bar.
                leds: LedPattern::from_lit((TIER_COUNT - i) as u8),
                buzzer,
            }
        });
        ThresholdLadder { tiers }
    }

    /// Tier for a distance in meters.
    ///
    /// Total over `f32`: negative values fall into the closest tier, NaN and
    /// anything past the last bound into the farthest.
    pub fn classify(&self, meters: f32) -> &ActuationTier {
        let last = &self.tiers[TIER_COUNT - 1];
        if meters.is_nan() {
            return last;
        }
        self.tiers
            .iter()
            .find(|tier| meters <= tier.upper_bound_m)
            .unwrap_or(last)
    }

    /// All tiers, closest first.
    pub fn tiers(&self) -> &[ActuationTier; TIER_COUNT] {
        &self.tiers
    }
}

impl Default for ThresholdLadder {
    fn default() -> Self {
        Self::standard()
    }
}
