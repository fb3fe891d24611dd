//! Display node: receives distance reports and drives the operator panel.
//!
//! One evaluation task turns the receive buffer into an [`Actuation`] every
//! tick and publishes it on a watch channel. The buzzer, display and
//! telemetry tasks all read that same value, so every output reflects the
//! same selected distance.

use std::sync::Arc;
use std::time::Duration;

use embedded_hal::digital::{Error as _, OutputPin, StatefulOutputPin};
use parking_lot::Mutex;
use radar_feedback::{
    Actuation, BuzzerDriver, DigitDisplay, GpioBank, LedDriver, SegmentBus, ThresholdLadder,
};
use radar_link::{Delivery, PairCell, RawFrame, RxPort};
use tokio::sync::{broadcast, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, trace, warn};

use crate::blackboard::{Blackboard, raise_fault, snapshot, touch_rx};
use crate::config::{DisplayNodeSettings, DisplayTiming};
use crate::sim::panel::{BankId, BuzzerPin, FaultPin, LedBank, SegmentLines};

pub const FAULT_MALFORMED: &str = "malformed frame";
pub const FAULT_OVERRUN: &str = "receive overrun";
pub const FAULT_SILENT: &str = "bus silent";

/// Latching fault LED shared by every task that can detect a fault.
pub struct FaultIndicator<F> {
    pin: Arc<Mutex<F>>,
    bb: Blackboard,
}

impl<F> Clone for FaultIndicator<F> {
    fn clone(&self) -> Self {
        FaultIndicator {
            pin: Arc::clone(&self.pin),
            bb: Arc::clone(&self.bb),
        }
    }
}

impl<F: OutputPin> FaultIndicator<F> {
    pub fn new(mut pin: F, bb: Blackboard) -> anyhow::Result<Self> {
        pin.set_low()
            .map_err(|e| anyhow::anyhow!("fault pin: {:?}", e.kind()))?;
        Ok(FaultIndicator {
            pin: Arc::new(Mutex::new(pin)),
            bb,
        })
    }

    /// Record `fault` and light the LED. Never fails; the pipeline keeps going.
    pub fn raise(&self, fault: &str) {
        if raise_fault(&self.bb, fault) {
            warn!(fault, "Fault raised.");
        }
        if let Err(e) = self.pin.lock().set_high() {
            error!(kind = ?e.kind(), "Could not drive fault indicator.");
        }
    }
}

/// Outputs of the panel.
pub struct Panel<A, B, P, S, F> {
    pub leds: LedDriver<A, B>,
    pub buzzer: BuzzerDriver<P>,
    pub display: DigitDisplay<S>,
    pub fault: FaultIndicator<F>,
}

impl Panel<LedBank, LedBank, BuzzerPin, SegmentLines, FaultPin> {
    /// The simulated panel, mirrored onto the blackboard.
    pub fn simulated(bb: &Blackboard) -> anyhow::Result<Self> {
        Ok(Panel {
            leds: LedDriver::new(
                LedBank::new(BankId::A, bb.clone()),
                LedBank::new(BankId::B, bb.clone()),
            ),
            buzzer: BuzzerDriver::new(BuzzerPin::new(bb.clone()))?,
            display: DigitDisplay::new(SegmentLines::new(bb.clone())),
            fault: FaultIndicator::new(FaultPin::new(bb.clone()), bb.clone())?,
        })
    }
}

pub struct DisplayNode<A, B, P, S, F> {
    port: RxPort<'static>,
    ladder: ThresholdLadder,
    timing: DisplayTiming,
    panel: Panel<A, B, P, S, F>,
}

impl<A, B, P, S, F> DisplayNode<A, B, P, S, F>
where
    A: GpioBank + Send + 'static,
    B: GpioBank + Send + 'static,
    P: StatefulOutputPin + Send + 'static,
    S: SegmentBus + Send + 'static,
    F: OutputPin + Send + 'static,
{
    pub fn new(
        settings: &DisplayNodeSettings,
        buffer: &'static PairCell,
        panel: Panel<A, B, P, S, F>,
    ) -> anyhow::Result<Self> {
        // The display node never transmits, but its address must still be valid.
        settings.address()?;
        Ok(DisplayNode {
            port: RxPort::new(settings.filter()?, buffer),
            ladder: settings.ladder()?,
            timing: settings.timing(),
            panel,
        })
    }

    pub async fn run(
        self,
        frames: broadcast::Receiver<Arc<RawFrame>>,
        bb: Blackboard,
    ) -> anyhow::Result<()> {
        info!(?self.timing, "Display node started.");
        let DisplayNode {
            port,
            ladder,
            timing,
            panel,
        } = self;
        let Panel {
            leds,
            buzzer,
            display,
            fault,
        } = panel;

        let initial = Actuation::evaluate(port.latest(), &ladder);
        let (act_tx, act_rx) = watch::channel(initial);

        tokio::try_join!(
            rx_task(frames, port, bb.clone(), fault.clone()),
            eval_task(port, ladder, leds, act_tx, bb.clone(), timing.eval_period),
            buzzer_task(act_rx.clone(), buzzer, timing.buzzer_start_delay),
            display_task(act_rx.clone(), display, timing.digit_hold),
            telemetry_task(act_rx, timing.telemetry_period),
            watchdog(bb, fault, timing.link_timeout),
        )?;
        Ok(())
    }
}

/// Sole writer of the receive buffer.
async fn rx_task<F: OutputPin>(
    mut frames: broadcast::Receiver<Arc<RawFrame>>,
    port: RxPort<'static>,
    bb: Blackboard,
    fault: FaultIndicator<F>,
) -> anyhow::Result<()> {
    info!("Receive task started.");
    loop {
        match frames.recv().await {
            Ok(raw) => match port.on_frame(&raw) {
                Ok(Delivery::Accepted(pair)) => {
                    trace!(%pair, "report received");
                    touch_rx(&bb, pair);
                }
                Ok(Delivery::Filtered) => trace!(id = raw.id, "frame filtered"),
                Err(e) => {
                    warn!(error = %e, id = raw.id, "Undeliverable frame.");
                    fault.raise(FAULT_MALFORMED);
                }
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Receive buffer overrun.");
                fault.raise(FAULT_OVERRUN);
            }
            Err(broadcast::error::RecvError::Closed) => {
                info!("Bus closed; receive task stopped.");
                return Ok(());
            }
        }
    }
}

/// Select and classify once per tick; drive the LEDs and publish the result.
async fn eval_task<A: GpioBank, B: GpioBank>(
    port: RxPort<'static>,
    ladder: ThresholdLadder,
    mut leds: LedDriver<A, B>,
    act_tx: watch::Sender<Actuation>,
    bb: Blackboard,
    period: Duration,
) -> anyhow::Result<()> {
    info!(?period, "Evaluation task started.");
    let mut tick = tokio::time::interval(period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut zone = None;

    loop {
        tick.tick().await;
        let act = Actuation::evaluate(port.latest(), &ladder);
        leds.apply(act.tier.leds);

        let changed = act_tx.send_if_modified(|current| {
            if *current == act {
                false
            } else {
                *current = act;
                true
            }
        });
        if changed || zone.is_none() {
            if zone != Some(act.tier.zone) {
                info!(zone = %act.tier.zone, selected_cm = act.selection.raw_cm, "Zone changed.");
                zone = Some(act.tier.zone);
            }
            let mut g = bb.write();
            g.zone = Some(act.tier.zone);
            g.selected_cm = act.selection.raw_cm;
            g.display = Some(act.display);
        }
    }
}

async fn buzzer_task<P: StatefulOutputPin>(
    mut act_rx: watch::Receiver<Actuation>,
    mut buzzer: BuzzerDriver<P>,
    start_delay: Duration,
) -> anyhow::Result<()> {
    tokio::time::sleep(start_delay).await;
    info!("Buzzer task started.");
    loop {
        let mode = act_rx.borrow_and_update().tier.buzzer;
        match buzzer.step(mode)? {
            Some(half_period) => tokio::time::sleep(half_period).await,
            // Held level: nothing to do until the evaluation changes.
            None => {
                if act_rx.changed().await.is_err() {
                    return Ok(());
                }
            }
        }
    }
}

/// Multiplex the two digits, one hold period each.
async fn display_task<S: SegmentBus>(
    act_rx: watch::Receiver<Actuation>,
    mut display: DigitDisplay<S>,
    hold: Duration,
) -> anyhow::Result<()> {
    info!(?hold, "Display task started.");
    loop {
        let content = act_rx.borrow().display;
        for frame in content.frames() {
            display.show(&frame);
            tokio::time::sleep(hold).await;
            display.hide(&frame);
        }
    }
}

async fn telemetry_task(act_rx: watch::Receiver<Actuation>, period: Duration) -> anyhow::Result<()> {
    info!(?period, "Telemetry task started.");
    let mut tick = tokio::time::interval(period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tick.tick().await;
        let act = *act_rx.borrow();
        info!(
            distance_m = %format_args!("{:.1}", act.selection.meters),
            zone = %act.tier.zone,
            pair = %act.pair,
            display = %act.display,
            "telemetry"
        );
    }
}

/// Raise a fault when no report has been accepted for `timeout`.
async fn watchdog<F: OutputPin>(
    bb: Blackboard,
    fault: FaultIndicator<F>,
    timeout: Duration,
) -> anyhow::Result<()> {
    info!(?timeout, "Link watchdog started.");
    let mut tick = tokio::time::interval(Duration::from_millis(25));
    loop {
        tick.tick().await;
        let last_rx_ts = snapshot(&bb).last_rx_ts;
        let age = last_rx_ts.elapsed();
        if age > timeout {
            debug!(?age, "No report within link timeout.");
            fault.raise(FAULT_SILENT);
        }
    }
}
