//! Seven-LED proximity bar spread over two GPIO banks.

use std::fmt;

/// Output register of one GPIO bank.
///
/// `write` must apply `set` and `reset` in a single register access so the
/// LEDs of a bank never show a half-updated pattern.
pub trait GpioBank {
    /// Drive the `set` bits high and the `reset` bits low.
    fn write(&mut self, set: u16, reset: u16);
}

/// GPIO bank an LED is wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bank {
    A,
    B,
}

/// One LED of the bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Led {
    Green1,
    Green2,
    Green3,
    Blue1,
    Blue2,
    Red1,
    Red2,
}

impl Led {
    /// Lighting order, farthest zone first.
    pub const ORDER: [Led; 7] = [
        Led::Green1,
        Led::Green2,
        Led::Green3,
        Led::Blue1,
        Led::Blue2,
        Led::Red1,
        Led::Red2,
    ];

    /// Bank and pin mask the LED is wired to.
    pub const fn pin(self) -> (Bank, u16) {
        match self {
            Led::Green1 => (Bank::A, 1 << 6),
            Led::Green2 => (Bank::A, 1 << 7),
            Led::Blue2 => (Bank::A, 1 << 8),
            Led::Red1 => (Bank::A, 1 << 9),
            Led::Red2 => (Bank::A, 1 << 10),
            Led::Green3 => (Bank::B, 1 << 14),
            Led::Blue1 => (Bank::B, 1 << 15),
        }
    }

    const fn rank(self) -> u8 {
        match self {
            Led::Green1 => 0,
            Led::Green2 => 1,
            Led::Green3 => 2,
            Led::Blue1 => 3,
            Led::Blue2 => 4,
            Led::Red1 => 5,
            Led::Red2 => 6,
        }
    }
}

/// All LED pins on bank A.
pub const BANK_A_MASK: u16 = (1 << 6) | (1 << 7) | (1 << 8) | (1 << 9) | (1 << 10);
/// All LED pins on bank B.
pub const BANK_B_MASK: u16 = (1 << 14) | (1 << 15);

/// A bar pattern: the first `n` LEDs of [`Led::ORDER`] lit, the rest dark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LedPattern(u8);

impl LedPattern {
    /// Number of patterns, one per ladder tier.
    pub const COUNT: u8 = 7;

    /// Pattern with `lit` LEDs on, or `None` outside `1..=7`.
    pub const fn new(lit: u8) -> Option<Self> {
        if lit >= 1 && lit <= Self::COUNT {
            Some(LedPattern(lit))
        } else {
            None
        }
    }

    pub(crate) const fn from_lit(lit: u8) -> Self {
        LedPattern(lit)
    }

    /// Number of lit LEDs, also used as the pattern id.
    pub const fn lit(self) -> u8 {
        self.0
    }

    /// Whether `led` is on in this pattern.
    pub const fn is_lit(self, led: Led) -> bool {
        led.rank() < self.0
    }

    /// `(set, reset)` masks for `bank`. Every LED pin of the bank appears in
    /// exactly one of the two.
    pub fn masks(self, bank: Bank) -> (u16, u16) {
        let all = match bank {
            Bank::A => BANK_A_MASK,
            Bank::B => BANK_B_MASK,
        };
        let set = Led::ORDER
            .iter()
            .filter(|led| self.is_lit(**led))
            .filter_map(|led| match led.pin() {
                (b, mask) if b == bank => Some(mask),
                _ => None,
            })
            .fold(0, |acc, mask| acc | mask);
        (set, all & !set)
    }
}

impl fmt::Display for LedPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for led in Led::ORDER {
            f.write_str(if self.is_lit(led) { "●" } else { "○" })?;
        }
        Ok(())
    }
}

/// Drives the bar through its two banks.
pub struct LedDriver<A, B> {
    bank_a: A,
    bank_b: B,
    current: Option<LedPattern>,
}

impl<A: GpioBank, B: GpioBank> LedDriver<A, B> {
    /// Driver with all LEDs switched off.
    pub fn new(mut bank_a: A, mut bank_b: B) -> Self {
        bank_a.write(0, BANK_A_MASK);
        bank_b.write(0, BANK_B_MASK);
        LedDriver {
            bank_a,
            bank_b,
            current: None,
        }
    }

    /// Show `pattern`. Returns `true` when it differs from the previous one.
    pub fn apply(&mut self, pattern: LedPattern) -> bool {
        let (set_a, reset_a) = pattern.masks(Bank::A);
        let (set_b, reset_b) = pattern.masks(Bank::B);
        self.bank_a.write(set_a, reset_a);
        self.bank_b.write(set_b, reset_b);

        let changed = self.current != Some(pattern);
        if changed {
            tracing::debug!("LED bar {}", pattern);
        }
        self.current = Some(pattern);
        changed
    }

    /// Pattern last applied, if any.
    pub fn current(&self) -> Option<LedPattern> {
        self.current
    }
}
