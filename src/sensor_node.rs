//! Sensor node: two ranger trigger loops and the periodic distance report.

use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use parking_lot::Mutex;
use radar_link::{DistancePair, LinkError, Transmit, TxPort};
use radar_ranging::{
    Channel, EchoRanger, Monotonic, PollOutcome, RangingError, SampleCell,
};
use spin_sleep::SpinSleeper;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use crate::blackboard::Blackboard;
use crate::config::{SensorNodeSettings, WorldSettings};
use crate::sim::HostClock;
use crate::sim::echo::{CaptureUnit, EchoFrontEnd, SharedRanger, TriggerLine};

pub struct SensorNode {
    rangers: [SharedRanger; 2],
    cells: &'static [SampleCell; 2],
    port: TxPort,
    clock: HostClock,
    trigger_period: Duration,
    tx_period: Duration,
    pulse_width: Duration,
}

impl SensorNode {
    /// Build both rangers and start their echo threads.
    pub fn start(
        settings: &SensorNodeSettings,
        world: &WorldSettings,
        cells: &'static [SampleCell; 2],
        clock: HostClock,
    ) -> anyhow::Result<Self> {
        let config = settings.ranger_config()?;
        let port = TxPort::new(settings.address()?);

        let build = |channel: Channel| -> anyhow::Result<SharedRanger> {
            let (ping_tx, ping_rx) = mpsc::channel();
            let capture = CaptureUnit::new(clock);
            let ranger = EchoRanger::new(
                channel,
                TriggerLine::new(clock, ping_tx),
                capture.clone(),
                &cells[channel.index()],
                config,
            )?;
            let ranger = Arc::new(Mutex::new(ranger));

            let world = match channel {
                Channel::A => world.sensor_a.clone(),
                Channel::B => world.sensor_b.clone(),
            };
            info!(%channel, ?world, "Spawning echo thread...");
            EchoFrontEnd {
                channel,
                world,
                clock,
                capture,
                pings: ping_rx,
            }
            .spawn(&ranger)?;
            Ok(ranger)
        };
        let rangers = [build(Channel::A)?, build(Channel::B)?];

        Ok(SensorNode {
            rangers,
            cells,
            port,
            clock,
            trigger_period: settings.trigger_period(),
            tx_period: settings.tx_period(),
            pulse_width: settings.pulse_width(),
        })
    }

    pub async fn run<T: Transmit>(self, bus: T, bb: Blackboard) -> anyhow::Result<()> {
        info!(sender = %self.port.sender(), "Sensor node started.");
        let [ranger_a, ranger_b] = self.rangers;
        tokio::try_join!(
            trigger_loop(Channel::A, ranger_a, self.clock, self.trigger_period, self.pulse_width),
            trigger_loop(Channel::B, ranger_b, self.clock, self.trigger_period, self.pulse_width),
            transmit_loop(self.cells, self.port, bus, bb, self.tx_period),
        )?;
        Ok(())
    }
}

/// Fire one measurement per period. Each tick first lets the ranger expire a
/// cycle whose echo never finished, then triggers, then releases the pulse.
/// The pulse is far below the timer wheel's 1 ms resolution, so it is held
/// with a spin sleep instead of a tokio sleep.
async fn trigger_loop(
    channel: Channel,
    ranger: SharedRanger,
    clock: HostClock,
    period: Duration,
    pulse_width: Duration,
) -> anyhow::Result<()> {
    info!(%channel, ?period, "Trigger task started.");
    let mut tick = tokio::time::interval(period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let sleeper = SpinSleeper::new(100_000);

    loop {
        tick.tick().await;
        {
            let mut r = ranger.lock();
            let now = clock.now();
            if let PollOutcome::TimedOut { missed, stale } = r.poll(now)? {
                warn!(%channel, missed, stale, "Echo timed out; cycle abandoned.");
            }
            match r.trigger(now) {
                Ok(()) => trace!(%channel, "triggered"),
                Err(RangingError::Busy(why)) => debug!(%channel, why, "Trigger skipped."),
                Err(e) => return Err(e.into()),
            }
        }
        sleeper.sleep(pulse_width);
        ranger.lock().poll(clock.now())?;
    }
}

/// Report both channels every period. A full mailbox drops the report; the
/// next period carries fresher data anyway.
async fn transmit_loop<T: Transmit>(
    cells: &'static [SampleCell; 2],
    port: TxPort,
    mut bus: T,
    bb: Blackboard,
    period: Duration,
) -> anyhow::Result<()> {
    info!(?period, "Transmit task started.");
    let mut tick = tokio::time::interval(period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tick.tick().await;
        let samples = cells.each_ref().map(SampleCell::load);
        let pair = DistancePair::new(samples[0].wire_cm(), samples[1].wire_cm());

        match port.send(pair, &mut bus) {
            Ok(frame) => {
                trace!(%frame, "report queued");
                let mut g = bb.write();
                g.samples = samples;
                g.tx_pair = pair;
                g.tx_sent += 1;
            }
            Err(LinkError::MailboxFull) => {
                debug!(%pair, "Mailboxes full; report dropped.");
                let mut g = bb.write();
                g.samples = samples;
                g.tx_dropped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
}
