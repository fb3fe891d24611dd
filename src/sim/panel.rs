//! Receiver panel outputs. Each device mirrors its pin levels onto the
//! blackboard, where the dashboard and the tests read them back.

use std::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin, StatefulOutputPin};
use radar_feedback::{DigitSlot, GpioBank, SegmentBus};

use crate::blackboard::{Blackboard, LatchedDigit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankId {
    A,
    B,
}

/// One GPIO port's output data register.
pub struct LedBank {
    id: BankId,
    bb: Blackboard,
}

impl LedBank {
    pub fn new(id: BankId, bb: Blackboard) -> Self {
        LedBank { id, bb }
    }
}

impl GpioBank for LedBank {
    fn write(&mut self, set: u16, reset: u16) {
        let mut g = self.bb.write();
        let odr = match self.id {
            BankId::A => &mut g.led_bank_a,
            BankId::B => &mut g.led_bank_b,
        };
        *odr = (*odr | set) & !reset;
    }
}

/// Buzzer output pin.
pub struct BuzzerPin {
    bb: Blackboard,
}

impl BuzzerPin {
    pub fn new(bb: Blackboard) -> Self {
        BuzzerPin { bb }
    }
}

impl ErrorType for BuzzerPin {
    type Error = Infallible;
}

impl OutputPin for BuzzerPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.bb.write().buzzer_on = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.bb.write().buzzer_on = true;
        Ok(())
    }
}

impl StatefulOutputPin for BuzzerPin {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.bb.read().buzzer_on)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.bb.read().buzzer_on)
    }
}

/// Fault indicator LED.
pub struct FaultPin {
    bb: Blackboard,
}

impl FaultPin {
    pub fn new(bb: Blackboard) -> Self {
        FaultPin { bb }
    }
}

impl ErrorType for FaultPin {
    type Error = Infallible;
}

impl OutputPin for FaultPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.bb.write().fault_led = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.bb.write().fault_led = true;
        Ok(())
    }
}

/// Segment, decimal point and digit-enable lines of the display.
///
/// Enabling a digit latches the current segment lines into it; the latched
/// value stays visible on the dashboard the way persistence of vision keeps
/// a multiplexed digit visible on the real panel.
pub struct SegmentLines {
    bb: Blackboard,
    segments: u8,
    decimal_point: bool,
}

impl SegmentLines {
    pub fn new(bb: Blackboard) -> Self {
        SegmentLines {
            bb,
            segments: 0,
            decimal_point: false,
        }
    }
}

impl SegmentBus for SegmentLines {
    fn write_segments(&mut self, pattern: u8) {
        self.segments = pattern;
    }

    fn set_decimal_point(&mut self, on: bool) {
        self.decimal_point = on;
    }

    fn set_digit_enable(&mut self, slot: DigitSlot, on: bool) {
        if !on {
            return;
        }
        let index = match slot {
            DigitSlot::Tens => 0,
            DigitSlot::Units => 1,
        };
        self.bb.write().digits[index] = LatchedDigit {
            segments: self.segments,
            decimal_point: self.decimal_point,
        };
    }
}
