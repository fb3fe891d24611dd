//! Ultrasonic front end: trigger line, echo physics and timer capture.
//!
//! A falling edge on the trigger line sends a ping to the channel's echo
//! thread. The thread works out when the echo line would rise and fall,
//! sleeps until each instant with a `SpinSleeper`, and delivers the edge to
//! the ranger the way a capture interrupt would: only while the capture unit
//! is listening for that polarity, stamped with the free-running 16-bit
//! counter.

use std::convert::Infallible;
use std::sync::{Arc, Weak};
use std::sync::mpsc;
use std::time::Duration;

use embedded_hal::digital::{ErrorType, OutputPin};
use parking_lot::Mutex;
use radar_ranging::{Channel, EchoRanger, Edge, EdgeCapture, EdgeEvent, EdgeOutcome};
use spin_sleep::SpinSleeper;
use tracing::{debug, info, trace};

use super::HostClock;
use super::world::ChannelWorld;

/// Delay between the end of the trigger pulse and the echo line rising.
pub const SENSOR_LATENCY_US: u64 = 460;

/// Farthest obstacle the transducer reports.
pub const MAX_RANGE_CM: f32 = 400.0;

/// Speed of sound, in cm per 1000 µs.
const SOUND_CM_PER_MS: f32 = 34.0;

pub type SimRanger = EchoRanger<'static, TriggerLine, CaptureUnit>;
pub type SharedRanger = Arc<Mutex<SimRanger>>;

/// Width of the echo pulse for an obstacle at `distance_cm`, rounded up to
/// whole microseconds.
pub fn echo_width_us(distance_cm: f32) -> u64 {
    let cm = distance_cm.clamp(0.0, MAX_RANGE_CM);
    (cm * 2_000.0 / SOUND_CM_PER_MS).ceil() as u64
}

/// When the echo line rises and falls for a ping sent at `ping_us`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoPlan {
    pub rise_us: u64,
    pub fall_us: u64,
}

impl EchoPlan {
    pub fn new(ping_us: u64, distance_cm: f32) -> Self {
        let rise_us = ping_us + SENSOR_LATENCY_US;
        EchoPlan {
            rise_us,
            fall_us: rise_us + echo_width_us(distance_cm),
        }
    }
}

/// Trigger output of one sensor.
pub struct TriggerLine {
    high: bool,
    clock: HostClock,
    pings: mpsc::Sender<u64>,
}

impl TriggerLine {
    pub fn new(clock: HostClock, pings: mpsc::Sender<u64>) -> Self {
        TriggerLine {
            high: false,
            clock,
            pings,
        }
    }
}

impl ErrorType for TriggerLine {
    type Error = Infallible;
}

impl OutputPin for TriggerLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.high {
            // A gone echo thread just means nobody answers.
            let _ = self.pings.send(self.clock.micros());
        }
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high = true;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CaptureState {
    pub listening: bool,
    pub polarity: Edge,
    /// Host time at which the counter last read zero.
    pub epoch_us: u64,
}

impl CaptureState {
    /// Counter value latched for `edge` at `at_us`, if the unit would latch it.
    pub fn latch(&self, edge: Edge, at_us: u64) -> Option<u16> {
        (self.listening && self.polarity == edge)
            .then(|| at_us.wrapping_sub(self.epoch_us) as u16)
    }
}

/// Input-capture unit of one channel. Clones share the same registers.
#[derive(Clone)]
pub struct CaptureUnit {
    clock: HostClock,
    state: Arc<Mutex<CaptureState>>,
}

impl CaptureUnit {
    pub fn new(clock: HostClock) -> Self {
        CaptureUnit {
            clock,
            state: Arc::new(Mutex::new(CaptureState {
                listening: false,
                polarity: Edge::Rising,
                epoch_us: clock.micros(),
            })),
        }
    }

    pub fn latch(&self, edge: Edge, at_us: u64) -> Option<u16> {
        self.state.lock().latch(edge, at_us)
    }
}

impl EdgeCapture for CaptureUnit {
    fn set_polarity(&mut self, edge: Edge) {
        self.state.lock().polarity = edge;
    }

    fn listen(&mut self) {
        self.state.lock().listening = true;
    }

    fn unlisten(&mut self) {
        self.state.lock().listening = false;
    }

    fn reset_counter(&mut self) {
        self.state.lock().epoch_us = self.clock.micros();
    }
}

/// Everything the echo thread of one channel needs.
pub struct EchoFrontEnd {
    pub channel: Channel,
    pub world: ChannelWorld,
    pub clock: HostClock,
    pub capture: CaptureUnit,
    pub pings: mpsc::Receiver<u64>,
}

impl EchoFrontEnd {
    /// Spawn the echo thread. It ends once the ranger, and with it the
    /// trigger line, is dropped.
    pub fn spawn(self, ranger: &SharedRanger) -> std::io::Result<std::thread::JoinHandle<()>> {
        let ranger = Arc::downgrade(ranger);
        std::thread::Builder::new()
            .name(format!("echo-{}", self.channel.index()))
            .spawn(move || self.run(&ranger))
    }

    fn run(self, ranger: &Weak<Mutex<SimRanger>>) {
        info!(channel = %self.channel, "Echo thread started.");
        let sleeper = SpinSleeper::new(100_000);
        let mut pings = 0u64;

        while let Ok(ping_us) = self.pings.recv() {
            pings += 1;
            if self.world.drops(pings) {
                debug!(channel = %self.channel, ping = pings, "echo lost");
                continue;
            }
            let distance_cm = self
                .world
                .profile
                .distance_cm(Duration::from_micros(ping_us));
            let plan = EchoPlan::new(ping_us, distance_cm);

            self.sleep_until(&sleeper, plan.rise_us);
            self.deliver(ranger, Edge::Rising, plan.rise_us);
            self.sleep_until(&sleeper, plan.fall_us);
            if let Some(EdgeOutcome::Completed { distance_cm: measured, .. }) =
                self.deliver(ranger, Edge::Falling, plan.fall_us)
            {
                trace!(channel = %self.channel, actual = distance_cm, measured, "echo measured");
            }
        }
        info!(channel = %self.channel, "Trigger line gone; echo thread stopped.");
    }

    fn sleep_until(&self, sleeper: &SpinSleeper, at_us: u64) {
        let now = self.clock.micros();
        if at_us > now {
            sleeper.sleep(Duration::from_micros(at_us - now));
        }
    }

    fn deliver(
        &self,
        ranger: &Weak<Mutex<SimRanger>>,
        edge: Edge,
        at_us: u64,
    ) -> Option<EdgeOutcome> {
        let ranger = ranger.upgrade()?;
        // The ranger arms capture while holding its lock; latch under it too.
        let mut ranger = ranger.lock();
        let ticks = self.capture.latch(edge, at_us)?;
        Some(ranger.on_edge(EdgeEvent::new(self.channel, edge, ticks)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::world::ObstacleProfile;
    use radar_ranging::{Instant, PollOutcome, RangerConfig, SampleCell, ticks_to_cm};

    #[test]
    fn test_echo_width_measures_back_to_same_distance() {
        for cm in 0..=255u8 {
            let ticks = echo_width_us(f32::from(cm)) as u16;
            assert_eq!(ticks_to_cm(ticks), cm, "cm = {cm}");
        }
        assert_eq!(echo_width_us(1_000.0), echo_width_us(MAX_RANGE_CM));
        assert_eq!(echo_width_us(-5.0), 0);
    }

    #[test]
    fn test_capture_latches_only_when_armed() {
        let state = CaptureState { listening: false, polarity: Edge::Rising, epoch_us: 1_000 };
        assert_eq!(state.latch(Edge::Rising, 1_500), None);

        let armed = CaptureState { listening: true, ..state };
        assert_eq!(armed.latch(Edge::Rising, 1_500), Some(500));
        assert_eq!(armed.latch(Edge::Falling, 1_500), None);
        // The 16-bit counter wraps every 65536 µs.
        assert_eq!(armed.latch(Edge::Rising, 1_000 + 65_536 + 7), Some(7));
    }

    fn leak_cell() -> &'static SampleCell {
        Box::leak(Box::new(SampleCell::new()))
    }

    /// One full cycle driven by hand: trigger, release, then both edges as
    /// the echo thread would deliver them.
    fn run_cycle(
        ranger: &mut SimRanger,
        capture: &CaptureUnit,
        pings: &mpsc::Receiver<u64>,
        distance_cm: f32,
    ) -> EdgeOutcome {
        let now = Instant::from_ticks(0);
        ranger.trigger(now).unwrap();
        assert_eq!(ranger.poll(now + radar_ranging::Duration::micros(10)).unwrap(), PollOutcome::PulseEnded);
        let ping_us = pings.try_recv().expect("falling trigger edge sends a ping");

        let plan = EchoPlan::new(ping_us, distance_cm);
        let rise = capture.latch(Edge::Rising, plan.rise_us).unwrap();
        ranger.on_edge(EdgeEvent::new(Channel::A, Edge::Rising, rise));
        let fall = capture.latch(Edge::Falling, plan.fall_us).unwrap();
        ranger.on_edge(EdgeEvent::new(Channel::A, Edge::Falling, fall))
    }

    #[test]
    fn test_front_end_measures_distance() {
        let clock = HostClock::new();
        let (tx, rx) = mpsc::channel();
        let capture = CaptureUnit::new(clock);
        let cell = leak_cell();
        let mut ranger = EchoRanger::new(
            Channel::A,
            TriggerLine::new(clock, tx),
            capture.clone(),
            cell,
            RangerConfig::default(),
        )
        .unwrap();

        for cm in [45.0, 3.0, 130.0, 255.0, 390.0] {
            let outcome = run_cycle(&mut ranger, &capture, &rx, cm);
            let expected = (cm as u32).min(255) as u8;
            assert!(matches!(outcome, EdgeOutcome::Completed { distance_cm, .. } if distance_cm == expected));
            assert_eq!(cell.load().wire_cm(), expected);
            assert!(!capture.state.lock().listening);
        }
    }

    #[test]
    fn test_front_end_across_counter_wrap() {
        let clock = HostClock::new();
        let (tx, rx) = mpsc::channel();
        let capture = CaptureUnit::new(clock);
        let cell = leak_cell();
        let mut ranger = EchoRanger::new(
            Channel::A,
            TriggerLine::new(clock, tx),
            capture.clone(),
            cell,
            RangerConfig::default(),
        )
        .unwrap();

        // Pretend the counter was last reset just under one period ago, so
        // the rising edge latches near the top and the falling edge wraps.
        capture.state.lock().epoch_us = clock.micros().wrapping_sub(65_000);
        let outcome = run_cycle(&mut ranger, &capture, &rx, 100.0);
        match outcome {
            // One tick is lost to the `MAX - rising + falling` wrap formula.
            EdgeOutcome::Completed { distance_cm, .. } => assert!((99..=100).contains(&distance_cm)),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_echo_thread_end_to_end() {
        let clock = HostClock::new();
        let (tx, rx) = mpsc::channel();
        let capture = CaptureUnit::new(clock);
        let cell = leak_cell();
        let ranger: SharedRanger = Arc::new(Mutex::new(
            EchoRanger::new(
                Channel::B,
                TriggerLine::new(clock, tx),
                capture.clone(),
                cell,
                RangerConfig::default(),
            )
            .unwrap(),
        ));
        let front_end = EchoFrontEnd {
            channel: Channel::B,
            world: ChannelWorld {
                profile: ObstacleProfile::Fixed { distance_cm: 80.0 },
                dropout_every: 0,
            },
            clock,
            capture,
            pings: rx,
        };
        let handle = front_end.spawn(&ranger).unwrap();

        {
            let mut r = ranger.lock();
            let now = radar_ranging::Monotonic::now(&clock);
            r.trigger(now).unwrap();
            r.poll(now + radar_ranging::Duration::micros(10)).unwrap();
        }
        // 80 cm is about 5 ms of echo; give the thread ample time.
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while !cell.load().fresh && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(cell.load().wire_cm(), 80);

        drop(ranger);
        handle.join().unwrap();
    }
}
