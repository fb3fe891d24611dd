use radar_feedback::{Actuation, BuzzerMode, ThresholdLadder};
use radar_link::DistancePair;

fn main() {
    let ladder = ThresholdLadder::standard();

    println!("{:>6}  {:<14} {:<8} {:<10} display", "cm", "zone", "leds", "buzzer");
    for cm in (0..=150u8).step_by(10).chain([200, 255]) {
        let act = Actuation::evaluate(DistancePair::new(cm, 255), &ladder);
        let buzzer = match act.tier.buzzer {
            BuzzerMode::Continuous => "on".to_string(),
            BuzzerMode::Toggle(p) => format!("{} ms", p.as_millis()),
            BuzzerMode::Silent => "off".to_string(),
        };
        println!(
            "{:>6}  {:<14} {}  {:<10} {}",
            cm,
            act.tier.zone.to_string(),
            act.tier.leds,
            buzzer,
            act.display
        );
    }
}
