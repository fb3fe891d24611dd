//! This crate turns a pair of distance samples into operator feedback.
//!
//! A [`DistanceSelector`] picks the closer obstacle, a [`ThresholdLadder`]
//! maps it to an [`ActuationTier`], and the drivers in [`leds`], [`buzzer`]
//! and [`display`] put that tier on the hardware. All three outputs are
//! meant to be driven from the same [`Actuation`] so they never disagree.

pub mod buzzer;
pub mod display;
pub mod error;
pub mod ladder;
pub mod leds;
pub mod selector;

pub use buzzer::{BuzzerDriver, BuzzerMode};
pub use display::{DigitDisplay, DigitFrame, DigitSlot, Digits, DisplayContent, SegmentBus};
pub use error::FeedbackError;
pub use ladder::{ActuationTier, ThresholdLadder, Zone};
pub use leds::{GpioBank, Led, LedDriver, LedPattern};
pub use selector::{DistanceSelector, Selection, Source};

use radar_link::DistancePair;

/// Everything the outputs need for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Actuation {
    pub pair: DistancePair,
    pub selection: Selection,
    pub tier: ActuationTier,
    pub display: DisplayContent,
}

impl Actuation {
    /// Select, classify and format one received pair.
    pub fn evaluate(pair: DistancePair, ladder: &ThresholdLadder) -> Self {
        let selection = DistanceSelector::select(pair);
        let tier = *ladder.classify(selection.meters);
        Actuation {
            pair,
            selection,
            tier,
            display: DisplayContent::new(&selection, &tier),
        }
    }
}
