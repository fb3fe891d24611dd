//! Sending and receiving ends of the distance link.

use crate::{AddressFilter, Address, BusFrame, DistancePair, LinkError, PairCell, RawFrame};

/// Non-blocking access to a bus controller's transmit mailboxes.
pub trait Transmit {
    /// Queue a frame for transmission.
    ///
    /// Implementations must not block: when no mailbox is free they return
    /// `Err(LinkError::MailboxFull)` and drop the frame.
    fn try_transmit(&mut self, frame: &RawFrame) -> Result<(), LinkError>;
}

impl<T: Transmit + ?Sized> Transmit for &mut T {
    fn try_transmit(&mut self, frame: &RawFrame) -> Result<(), LinkError> {
        (**self).try_transmit(frame)
    }
}

/// Sending end: stamps every report with this node's address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxPort {
    sender: Address,
}

impl TxPort {
    /// Sending end for `sender`.
    pub const fn new(sender: Address) -> Self {
        TxPort { sender }
    }

    /// Address stamped on outgoing frames.
    pub const fn sender(&self) -> Address {
        self.sender
    }

    /// Build a fresh frame for `pair` and queue it.
    ///
    /// A failed attempt is not retried here; the next periodic send carries
    /// newer data anyway.
    ///
    /// # Errors
    ///
    /// Propagates the controller error, typically `LinkError::MailboxFull`.
    pub fn send<T: Transmit + ?Sized>(
        &self,
        pair: DistancePair,
        bus: &mut T,
    ) -> Result<BusFrame, LinkError> {
        let frame = BusFrame::new(self.sender, pair);
        bus.try_transmit(&frame.to_raw())?;
        Ok(frame)
    }
}

/// What happened to a received frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Frame accepted and stored.
    Accepted(DistancePair),
    /// Frame rejected by the address filter; nothing changed.
    Filtered,
}

/// Receiving end: filters frames and stores accepted pairs.
#[derive(Debug, Clone, Copy)]
pub struct RxPort<'a> {
    filter: AddressFilter,
    buffer: &'a PairCell,
}

impl<'a> RxPort<'a> {
    /// Receiving end writing accepted pairs into `buffer`.
    pub const fn new(filter: AddressFilter, buffer: &'a PairCell) -> Self {
        RxPort { filter, buffer }
    }

    /// Handle one frame from the wire. The only writer of the receive buffer.
    ///
    /// # Errors
    ///
    /// Returns the decode error for a frame that passed the filter but is not
    /// a valid distance report. The buffer keeps its previous pair.
    pub fn on_frame(&self, raw: &RawFrame) -> Result<Delivery, LinkError> {
        if !self.filter.accepts(raw) {
            return Ok(Delivery::Filtered);
        }
        let frame = BusFrame::from_raw(raw)?;
        self.buffer.store(frame.pair());
        Ok(Delivery::Accepted(frame.pair()))
    }

    /// Most recently accepted pair.
    pub fn latest(&self) -> DistancePair {
        self.buffer.load()
    }
}
