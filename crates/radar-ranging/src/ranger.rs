//! Per-channel echo-pulse state machine.

use embedded_hal::digital::{Error as _, OutputPin};

use crate::cell::{Sample, SampleCell};
use crate::error::RangingError;
use crate::{Channel, Duration, Edge, EdgeCapture, EdgeEvent, Instant, tick_delta, ticks_to_cm};

/// Timing parameters of a ranger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangerConfig {
    /// Width of the active trigger pulse.
    pub pulse_width: Duration,
    /// Longest time to wait for the echo to finish once the pulse has ended.
    pub echo_timeout: Duration,
    /// Consecutive timeouts after which the published sample goes stale.
    pub max_missed_cycles: u8,
}

impl RangerConfig {
    /// Construct a configuration.
    ///
    /// # Errors
    ///
    /// Returns `Err(RangingError::InvalidConfig)` if the pulse width is zero, if
    /// the echo timeout does not exceed the pulse width, or if
    /// `max_missed_cycles` is zero.
    pub fn new(
        pulse_width: Duration,
        echo_timeout: Duration,
        max_missed_cycles: u8,
    ) -> Result<Self, RangingError> {
        if pulse_width.ticks() == 0 {
            return Err(RangingError::InvalidConfig("pulse width must be positive"));
        }
        if echo_timeout <= pulse_width {
            return Err(RangingError::InvalidConfig(
                "echo timeout must exceed the pulse width",
            ));
        }
        if max_missed_cycles == 0 {
            return Err(RangingError::InvalidConfig(
                "at least one missed cycle must be tolerated",
            ));
        }
        Ok(RangerConfig {
            pulse_width,
            echo_timeout,
            max_missed_cycles,
        })
    }
}

impl Default for RangerConfig {
    fn default() -> Self {
        RangerConfig {
            pulse_width: Duration::micros(10),
            echo_timeout: Duration::millis(40),
            max_missed_cycles: 3,
        }
    }
}

/// Measurement phase of a ranger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No measurement in flight; a trigger may be issued.
    Idle,
    /// Triggered; waiting for the echo to start.
    ArmedRising,
    /// Echo started; waiting for it to end.
    WaitingFalling,
}

/// Result of a housekeeping [`EchoRanger::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Nothing in flight.
    Idle,
    /// The trigger pulse is still being held.
    Pulsing,
    /// The trigger pulse just ended and capture is armed.
    PulseEnded,
    /// Waiting for edges, deadline not reached yet.
    Waiting,
    /// The echo deadline passed and the cycle was abandoned.
    TimedOut {
        /// Consecutive cycles missed so far.
        missed: u8,
        /// Whether the published sample has been marked stale.
        stale: bool,
    },
}

/// Result of feeding one capture event to a ranger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOutcome {
    /// The edge did not belong to this channel or phase and changed nothing.
    Ignored,
    /// Echo start latched.
    RisingCaptured {
        /// Counter value at the rising edge.
        ticks: u16,
    },
    /// Echo end latched and a new distance published.
    Completed {
        /// Echo pulse width in timer ticks.
        diff_ticks: u16,
        /// Resulting distance (cm).
        distance_cm: u8,
    },
}

/// Echo-pulse timing engine for one ultrasonic channel.
///
/// The ranger owns the channel's trigger line and capture unit. Its only
/// externally visible result is the [`SampleCell`] it publishes to, which is
/// written once per completed rising/falling cycle.
pub struct EchoRanger<'a, P, C> {
    channel: Channel,
    trigger: P,
    capture: C,
    output: &'a SampleCell,
    config: RangerConfig,
    phase: Phase,
    rising_ticks: u16,
    pulse_deadline: Option<Instant>,
    echo_deadline: Option<Instant>,
    missed: u8,
}

impl<'a, P, C> EchoRanger<'a, P, C>
where
    P: OutputPin,
    C: EdgeCapture,
{
    /// Create an idle ranger, driving the trigger line low and disarming capture.
    ///
    /// # Errors
    ///
    /// Returns `Err(RangingError::TriggerPin)` if the trigger line cannot be driven.
    pub fn new(
        channel: Channel,
        mut trigger: P,
        mut capture: C,
        output: &'a SampleCell,
        config: RangerConfig,
    ) -> Result<Self, RangingError> {
        trigger
            .set_low()
            .map_err(|e| RangingError::TriggerPin(e.kind()))?;
        capture.unlisten();
        capture.set_polarity(Edge::Rising);

        Ok(EchoRanger {
            channel,
            trigger,
            capture,
            output,
            config,
            phase: Phase::Idle,
            rising_ticks: 0,
            pulse_deadline: None,
            echo_deadline: None,
            missed: 0,
        })
    }

    /// Channel served by this ranger.
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Current measurement phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Last published sample.
    pub fn sample(&self) -> Sample {
        self.output.load()
    }

    /// Consecutive cycles that ended in a timeout.
    pub fn missed_cycles(&self) -> u8 {
        self.missed
    }

    /// Start a measurement by raising the trigger line.
    ///
    /// The line is released by the first [`poll`](Self::poll) at or after
    /// `now + pulse_width`, which also arms rising-edge capture.
    ///
    /// # Errors
    ///
    /// Returns `Err(RangingError::Busy)` if a cycle is still in flight, or
    /// `Err(RangingError::TriggerPin)` if the line cannot be driven.
    pub fn trigger(&mut self, now: Instant) -> Result<(), RangingError> {
        if self.phase != Phase::Idle {
            return Err(RangingError::Busy("measurement cycle in flight"));
        }
        self.trigger
            .set_high()
            .map_err(|e| RangingError::TriggerPin(e.kind()))?;
        self.pulse_deadline = Some(now + self.config.pulse_width);
        self.echo_deadline = None;
        self.phase = Phase::ArmedRising;
        Ok(())
    }

    /// Housekeeping tick: end the trigger pulse and enforce the echo deadline.
    ///
    /// # Errors
    ///
    /// Returns `Err(RangingError::TriggerPin)` if the trigger line cannot be released.
    pub fn poll(&mut self, now: Instant) -> Result<PollOutcome, RangingError> {
        if let Some(deadline) = self.pulse_deadline {
            if now < deadline {
                return Ok(PollOutcome::Pulsing);
            }
            self.end_pulse(now)?;
            return Ok(PollOutcome::PulseEnded);
        }

        match (self.phase, self.echo_deadline) {
            (Phase::Idle, _) => Ok(PollOutcome::Idle),
            (_, Some(deadline)) if now >= deadline => Ok(self.expire()),
            _ => Ok(PollOutcome::Waiting),
        }
    }

    /// Feed one capture event. This is the only operation that publishes a distance.
    ///
    /// Edges from another channel, edges arriving while the trigger pulse is
    /// still high, and edges that do not match the expected phase are ignored.
    pub fn on_edge(&mut self, event: EdgeEvent) -> EdgeOutcome {
        if event.channel != self.channel || self.pulse_deadline.is_some() {
            return EdgeOutcome::Ignored;
        }

        match (self.phase, event.edge) {
            (Phase::ArmedRising, Edge::Rising) => {
                self.rising_ticks = event.timer_ticks;
                self.capture.set_polarity(Edge::Falling);
                self.phase = Phase::WaitingFalling;
                EdgeOutcome::RisingCaptured {
                    ticks: event.timer_ticks,
                }
            }
            (Phase::WaitingFalling, Edge::Falling) => {
                self.capture.reset_counter();
                let diff_ticks = tick_delta(self.rising_ticks, event.timer_ticks);
                let distance_cm = ticks_to_cm(diff_ticks);

                self.capture.unlisten();
                self.capture.set_polarity(Edge::Rising);
                self.phase = Phase::Idle;
                self.echo_deadline = None;
                self.missed = 0;
                self.output.publish(distance_cm);

                EdgeOutcome::Completed {
                    diff_ticks,
                    distance_cm,
                }
            }
            _ => EdgeOutcome::Ignored,
        }
    }

    fn end_pulse(&mut self, now: Instant) -> Result<(), RangingError> {
        self.trigger
            .set_low()
            .map_err(|e| RangingError::TriggerPin(e.kind()))?;
        self.pulse_deadline = None;
        self.capture.set_polarity(Edge::Rising);
        self.capture.listen();
        self.echo_deadline = Some(now + self.config.echo_timeout);
        Ok(())
    }

    fn expire(&mut self) -> PollOutcome {
        self.capture.unlisten();
        self.capture.set_polarity(Edge::Rising);
        self.phase = Phase::Idle;
        self.echo_deadline = None;
        self.missed = self.missed.saturating_add(1);

        let stale = self.missed >= self.config.max_missed_cycles;
        if stale {
            self.output.mark_stale();
        }
        PollOutcome::TimedOut {
            missed: self.missed,
            stale,
        }
    }
}
