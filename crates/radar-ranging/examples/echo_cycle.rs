use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};
use radar_ranging::{
    Channel, Edge, EdgeCapture, EdgeEvent, EdgeOutcome, EchoRanger, Instant, RangerConfig,
    SampleCell,
};

struct PrintPin;

impl ErrorType for PrintPin {
    type Error = Infallible;
}

impl OutputPin for PrintPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        println!("  trigger -> low");
        Ok(())
    }
    fn set_high(&mut self) -> Result<(), Self::Error> {
        println!("  trigger -> high");
        Ok(())
    }
}

struct PrintCapture;

impl EdgeCapture for PrintCapture {
    fn set_polarity(&mut self, edge: Edge) {
        println!("  capture polarity {:?}", edge);
    }
    fn listen(&mut self) {
        println!("  capture armed");
    }
    fn unlisten(&mut self) {
        println!("  capture disarmed");
    }
    fn reset_counter(&mut self) {
        println!("  counter reset");
    }
}

fn main() {
    static CELL: SampleCell = SampleCell::new();
    let mut ranger = EchoRanger::new(
        Channel::A,
        PrintPin,
        PrintCapture,
        &CELL,
        RangerConfig::default(),
    )
    .expect("infallible pins");

    // Obstacles at a few distances; the last echo straddles the counter wrap.
    let echoes: [(u16, u16); 4] = [(120, 1_885), (300, 4_711), (9_000, 17_000), (65_000, 2_000)];

    for (i, (rise, fall)) in echoes.into_iter().enumerate() {
        let t0 = Instant::from_ticks(i as u64 * 60_000);
        println!("cycle {i}:");
        ranger.trigger(t0).expect("ranger idle");
        ranger
            .poll(t0 + radar_ranging::Duration::micros(10))
            .expect("pulse released");

        ranger.on_edge(EdgeEvent::new(Channel::A, Edge::Rising, rise));
        if let EdgeOutcome::Completed { diff_ticks, distance_cm } =
            ranger.on_edge(EdgeEvent::new(Channel::A, Edge::Falling, fall))
        {
            println!("  echo {diff_ticks} µs -> {distance_cm} cm");
        }
        println!("  published: {:?}", ranger.sample());
    }
}
