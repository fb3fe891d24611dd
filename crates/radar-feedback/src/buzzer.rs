//! Buzzer output driven by the active ladder tier.

use std::time::Duration;

use embedded_hal::digital::{Error as _, StatefulOutputPin};

use crate::FeedbackError;

/// What the buzzer does in one ladder tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuzzerMode {
    /// Held on.
    Continuous,
    /// Inverted every half period.
    Toggle(Duration),
    /// Held off.
    Silent,
}

/// Buzzer on a single output pin.
pub struct BuzzerDriver<P> {
    pin: P,
}

impl<P: StatefulOutputPin> BuzzerDriver<P> {
    /// Take the pin and switch the buzzer off.
    ///
    /// # Errors
    ///
    /// Returns `FeedbackError::Pin` if the pin cannot be driven.
    pub fn new(mut pin: P) -> Result<Self, FeedbackError> {
        pin.set_low().map_err(|e| FeedbackError::Pin(e.kind()))?;
        Ok(BuzzerDriver { pin })
    }

    /// Apply `mode` once. Returns how long to wait before the next step, or
    /// `None` when the output is held and the caller may re-evaluate at will.
    ///
    /// # Errors
    ///
    /// Returns `FeedbackError::Pin` if the pin cannot be driven.
    pub fn step(&mut self, mode: BuzzerMode) -> Result<Option<Duration>, FeedbackError> {
        match mode {
            BuzzerMode::Continuous => {
                self.pin.set_high().map_err(|e| FeedbackError::Pin(e.kind()))?;
                Ok(None)
            }
            BuzzerMode::Toggle(half_period) => {
                self.pin.toggle().map_err(|e| FeedbackError::Pin(e.kind()))?;
                Ok(Some(half_period))
            }
            BuzzerMode::Silent => {
                self.pin.set_low().map_err(|e| FeedbackError::Pin(e.kind()))?;
                Ok(None)
            }
        }
    }

    /// Whether the buzzer output is currently high.
    ///
    /// # Errors
    ///
    /// Returns `FeedbackError::Pin` if the pin state cannot be read.
    pub fn is_sounding(&mut self) -> Result<bool, FeedbackError> {
        self.pin.is_set_high().map_err(|e| FeedbackError::Pin(e.kind()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::{ErrorType, OutputPin};

    #[derive(Default)]
    struct Pin {
        high: bool,
    }

    impl ErrorType for Pin {
        type Error = Infallible;
    }

    impl OutputPin for Pin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high = false;
            Ok(())
        }
        fn set_high(&mut self) -> Result<(), Infallible> {
            self.high = true;
            Ok(())
        }
    }

    impl StatefulOutputPin for Pin {
        fn is_set_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.high)
        }
        fn is_set_low(&mut self) -> Result<bool, Infallible> {
            Ok(!self.high)
        }
    }

    #[test]
    fn test_starts_silent() {
        let mut buzzer = BuzzerDriver::new(Pin { high: true }).unwrap();
        assert!(!buzzer.is_sounding().unwrap());
    }

    #[test]
    fn test_toggle_alternates_and_reports_period() {
        let mut buzzer = BuzzerDriver::new(Pin::default()).unwrap();
        let mode = BuzzerMode::Toggle(Duration::from_millis(50));
        let mut levels = Vec::new();
        for _ in 0..4 {
            assert_eq!(buzzer.step(mode).unwrap(), Some(Duration::from_millis(50)));
            levels.push(buzzer.is_sounding().unwrap());
        }
        assert_eq!(levels, [true, false, true, false]);
    }

    #[test]
    fn test_continuous_and_silent_hold() {
        let mut buzzer = BuzzerDriver::new(Pin::default()).unwrap();
        for _ in 0..3 {
            assert_eq!(buzzer.step(BuzzerMode::Continuous).unwrap(), None);
            assert!(buzzer.is_sounding().unwrap());
        }
        assert_eq!(buzzer.step(BuzzerMode::Silent).unwrap(), None);
        assert!(!buzzer.is_sounding().unwrap());
    }
}
