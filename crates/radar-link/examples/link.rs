use radar_link::{
    Address, AddressFilter, Delivery, DistancePair, LinkError, PairCell, RawFrame, RxPort,
    Transmit, TxPort,
};

/// Three transmit mailboxes that nothing drains until asked.
struct Mailboxes(Vec<RawFrame>);

impl Transmit for Mailboxes {
    fn try_transmit(&mut self, frame: &RawFrame) -> Result<(), LinkError> {
        if self.0.len() >= 3 {
            return Err(LinkError::MailboxFull);
        }
        self.0.push(*frame);
        Ok(())
    }
}

fn main() {
    static BUFFER: PairCell = PairCell::new();
    let tx = TxPort::new(Address::SENSOR_NODE);
    let rx = RxPort::new(AddressFilter::exact(Address::SENSOR_NODE), &BUFFER);
    let mut mailboxes = Mailboxes(Vec::new());

    for (a, b) in [(45, 80), (44, 81), (43, 82), (42, 83)] {
        match tx.send(DistancePair::new(a, b), &mut mailboxes) {
            Ok(frame) => println!("queued  {frame}"),
            Err(e) => println!("dropped ({e})"),
        }
    }

    // Unrelated traffic shares the wire.
    let mut wire: Vec<RawFrame> = mailboxes.0.drain(..).collect();
    wire.insert(1, RawFrame::new(0x1a0, &[0xde, 0xad, 0xbe, 0xef]));
    wire.push(RawFrame::new(0x103, &[7]));

    for raw in &wire {
        match rx.on_frame(raw) {
            Ok(Delivery::Accepted(pair)) => println!("accepted {pair} from {:#05x}", raw.id),
            Ok(Delivery::Filtered) => println!("filtered frame from {:#05x}", raw.id),
            Err(e) => println!("fault: {e}"),
        }
    }
    println!("latest: {}", rx.latest());
}
