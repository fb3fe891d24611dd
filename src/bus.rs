//! Simulated shared bus: transmit mailboxes drained onto a broadcast wire.

use std::sync::Arc;
use std::time::Duration;

use radar_link::{LinkError, RawFrame, Transmit};
use tokio::sync::{broadcast, mpsc};
use tracing::{info, trace};

/// Broadcast topic with bounded capacity.
/// `T` must be `Send + Sync` because we hop across threads.
#[derive(Debug, Clone)]
pub struct Topic<T> {
    tx: broadcast::Sender<Arc<T>>,
}

impl<T: Send + Sync + 'static> Topic<T> {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, msg: T) {
        let _ = self.tx.send(Arc::new(msg));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<T>> {
        self.tx.subscribe()
    }
}

/// A node's bus controller. Frames wait in a fixed number of mailboxes
/// until the wire takes them.
#[derive(Debug, Clone)]
pub struct CanController {
    mailboxes: mpsc::Sender<RawFrame>,
}

impl Transmit for CanController {
    fn try_transmit(&mut self, frame: &RawFrame) -> Result<(), LinkError> {
        self.mailboxes.try_send(*frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => LinkError::MailboxFull,
            mpsc::error::TrySendError::Closed(_) => LinkError::Disconnected,
        })
    }
}

/// The wire side of the bus.
pub struct Wire {
    pending: mpsc::Receiver<RawFrame>,
    topic: Topic<RawFrame>,
    frame_time: Duration,
}

impl Wire {
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<RawFrame>> {
        self.topic.subscribe()
    }

    /// Move queued frames onto the wire, one per frame time, until every
    /// controller is gone.
    pub async fn run(mut self) -> anyhow::Result<()> {
        info!("Bus wire started.");
        while let Some(frame) = self.pending.recv().await {
            tokio::time::sleep(self.frame_time).await;
            trace!(id = frame.id, dlc = frame.dlc, "frame on wire");
            self.topic.publish(frame);
        }
        info!("All bus controllers dropped; wire stopped.");
        Ok(())
    }
}

/// Unrelated traffic sharing the wire, which the display node must filter out.
pub async fn chatter<T: Transmit>(mut controller: T, id: u16, period: Duration) -> anyhow::Result<()> {
    if period.is_zero() {
        return Ok(());
    }
    info!(id, ?period, "Chatter node started.");
    let mut tick = tokio::time::interval(period);
    let mut counter = 0u8;
    loop {
        tick.tick().await;
        counter = counter.wrapping_add(1);
        match controller.try_transmit(&RawFrame::new(id, &[counter; 8])) {
            Ok(()) | Err(LinkError::MailboxFull) => {}
            Err(e) => return Err(e.into()),
        }
    }
}

/// A bus with `mailboxes` transmit slots shared by all controllers cloned from
/// the returned one, and a broadcast wire every node can listen on.
pub fn bus(mailboxes: usize, topic_capacity: usize, frame_time: Duration) -> (CanController, Wire) {
    let (tx, rx) = mpsc::channel(mailboxes.max(1));
    let controller = CanController { mailboxes: tx };
    let wire = Wire {
        pending: rx,
        topic: Topic::new(topic_capacity.max(1)),
        frame_time,
    };
    (controller, wire)
}
