//! Two-digit multiplexed seven-segment display.
//!
//! Only one digit is enabled at a time. The caller alternates between the two
//! [`DigitFrame`]s of a [`DisplayContent`], holding each one for a few
//! milliseconds, which persistence of vision turns into a steady reading of
//! the form `d.d` meters.

use std::fmt;

use crate::{ActuationTier, Selection};

/// Segment patterns for 0..=9, bit 0 = segment a through bit 6 = segment g.
pub const SEGMENT_DIGITS: [u8; 10] = [0x3f, 0x06, 0x5b, 0x4f, 0x66, 0x6d, 0x7d, 0x07, 0x7f, 0x67];

/// Single bottom bar shown on both digits when nothing is close.
pub const WARNING_GLYPH: u8 = 0x08;

/// Segment pattern for a decimal digit; values past 9 wrap.
pub const fn encode_digit(digit: u8) -> u8 {
    SEGMENT_DIGITS[(digit % 10) as usize]
}

/// Segment lines, digit enables and decimal point of the display.
pub trait SegmentBus {
    /// Drive the seven segment lines from a pattern.
    fn write_segments(&mut self, pattern: u8);
    /// Drive the decimal point line.
    fn set_decimal_point(&mut self, on: bool);
    /// Enable or disable one digit's common line.
    fn set_digit_enable(&mut self, slot: DigitSlot, on: bool);
}

/// Position on the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigitSlot {
    /// Left digit, followed by the decimal point.
    Tens,
    /// Right digit.
    Units,
}

/// Decimal digits of a raw centimeter sample as shown on the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Digits {
    pub tens: u8,
    pub units: u8,
}

impl Digits {
    /// `tens = (cm / 100) % 10`, `units = (cm / 10) % 10`.
    pub const fn from_cm(raw_cm: u8) -> Self {
        Digits {
            tens: (raw_cm / 100) % 10,
            units: (raw_cm / 10) % 10,
        }
    }
}

/// What the display shows for one selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayContent {
    Numeric(Digits),
    Warning,
}

impl DisplayContent {
    /// Content for a selection and the tier it was classified into.
    pub fn new(selection: &Selection, tier: &ActuationTier) -> Self {
        if tier.is_clear() {
            DisplayContent::Warning
        } else {
            DisplayContent::Numeric(Digits::from_cm(selection.raw_cm))
        }
    }

    /// Frames to multiplex, tens first.
    ///
    /// In numeric mode the decimal point separates the digits; in warning
    /// mode it stays dark.
    pub fn frames(&self) -> [DigitFrame; 2] {
        match *self {
            DisplayContent::Numeric(Digits { tens, units }) => [
                DigitFrame::new(DigitSlot::Tens, encode_digit(tens), true),
                DigitFrame::new(DigitSlot::Units, encode_digit(units), false),
            ],
            DisplayContent::Warning => [
                DigitFrame::new(DigitSlot::Tens, WARNING_GLYPH, false),
                DigitFrame::new(DigitSlot::Units, WARNING_GLYPH, false),
            ],
        }
    }
}

impl fmt::Display for DisplayContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayContent::Numeric(d) => write!(f, "{}.{}", d.tens, d.units),
            DisplayContent::Warning => f.write_str("__"),
        }
    }
}

/// One digit worth of display state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitFrame {
    pub slot: DigitSlot,
    pub segments: u8,
    pub decimal_point: bool,
}

impl DigitFrame {
    pub const fn new(slot: DigitSlot, segments: u8, decimal_point: bool) -> Self {
        DigitFrame {
            slot,
            segments,
            decimal_point,
        }
    }
}

/// Multiplexing driver over a [`SegmentBus`].
pub struct DigitDisplay<S> {
    bus: S,
}

impl<S: SegmentBus> DigitDisplay<S> {
    /// Take the bus with both digits disabled.
    pub fn new(mut bus: S) -> Self {
        bus.set_digit_enable(DigitSlot::Tens, false);
        bus.set_digit_enable(DigitSlot::Units, false);
        DigitDisplay { bus }
    }

    /// Load `frame` onto the segment lines, then enable its digit.
    pub fn show(&mut self, frame: &DigitFrame) {
        self.bus.write_segments(frame.segments);
        self.bus.set_decimal_point(frame.decimal_point);
        self.bus.set_digit_enable(frame.slot, true);
    }

    /// Disable the digit of `frame`.
    pub fn hide(&mut self, frame: &DigitFrame) {
        self.bus.set_digit_enable(frame.slot, false);
    }

    /// Show and hide both frames of `content` once, calling `hold` while
    /// each digit is lit.
    pub fn refresh(&mut self, content: &DisplayContent, mut hold: impl FnMut()) {
        for frame in content.frames() {
            self.show(&frame);
            hold();
            self.hide(&frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DistanceSelector, ThresholdLadder};
    use radar_link::DistancePair;

    #[derive(Default)]
    struct Lines {
        segments: u8,
        dp: bool,
        tens: bool,
        units: bool,
        log: Vec<(DigitSlot, u8, bool)>,
    }

    impl SegmentBus for Lines {
        fn write_segments(&mut self, pattern: u8) {
            self.segments = pattern;
        }
        fn set_decimal_point(&mut self, on: bool) {
            self.dp = on;
        }
        fn set_digit_enable(&mut self, slot: DigitSlot, on: bool) {
            match slot {
                DigitSlot::Tens => self.tens = on,
                DigitSlot::Units => self.units = on,
            }
            assert!(!(self.tens && self.units), "both digits enabled");
            if on {
                self.log.push((slot, self.segments, self.dp));
            }
        }
    }

    fn content(a: u8, b: u8) -> DisplayContent {
        let ladder = ThresholdLadder::standard();
        let selection = DistanceSelector::select(DistancePair::new(a, b));
        DisplayContent::new(&selection, ladder.classify(selection.meters))
    }

    #[test]
    fn test_digits_from_cm() {
        assert_eq!(Digits::from_cm(45), Digits { tens: 0, units: 4 });
        assert_eq!(Digits::from_cm(128), Digits { tens: 1, units: 2 });
        assert_eq!(Digits::from_cm(0), Digits { tens: 0, units: 0 });
        assert_eq!(Digits::from_cm(255), Digits { tens: 2, units: 5 });

        for v in 0..=255u8 {
            let d = Digits::from_cm(v);
            assert_eq!((d.tens, d.units), (v / 100 % 10, v / 10 % 10), "{v} cm");
        }
    }

    #[test]
    fn test_encode_digit_table() {
        assert_eq!(encode_digit(0), 0x3f);
        assert_eq!(encode_digit(4), 0x66);
        assert_eq!(encode_digit(8), 0x7f);
        assert_eq!(encode_digit(12), encode_digit(2));
    }

    #[test]
    fn test_numeric_content_for_close_obstacle() {
        let c = content(45, 80);
        assert_eq!(c, DisplayContent::Numeric(Digits { tens: 0, units: 4 }));
        assert_eq!(c.to_string(), "0.4");
        assert_eq!(
            c.frames(),
            [
                DigitFrame::new(DigitSlot::Tens, 0x3f, true),
                DigitFrame::new(DigitSlot::Units, 0x66, false),
            ]
        );
    }

    #[test]
    fn test_warning_content_when_clear() {
        assert_eq!(content(255, 255), DisplayContent::Warning);
        assert_eq!(content(131, 200), DisplayContent::Warning);
        // 1.3 m is still inside the last numeric tier.
        assert_eq!(content(130, 200), DisplayContent::Numeric(Digits { tens: 1, units: 3 }));
        for frame in DisplayContent::Warning.frames() {
            assert_eq!(frame.segments, WARNING_GLYPH);
            assert!(!frame.decimal_point);
        }
    }

    #[test]
    fn test_refresh_multiplexes_one_digit_at_a_time() {
        let mut display = DigitDisplay::new(Lines::default());
        let mut holds = 0;
        display.refresh(&content(45, 80), || holds += 1);
        display.refresh(&DisplayContent::Warning, || holds += 1);
        assert_eq!(holds, 4);
        assert_eq!(
            display.bus.log,
            vec![
                (DigitSlot::Tens, 0x3f, true),
                (DigitSlot::Units, 0x66, false),
                (DigitSlot::Tens, WARNING_GLYPH, false),
                (DigitSlot::Units, WARNING_GLYPH, false),
            ]
        );
        assert!(!display.bus.tens && !display.bus.units);
    }
}
