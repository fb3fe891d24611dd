use parking_lot::RwLock;
use radar_feedback::{DisplayContent, Zone};
use radar_link::DistancePair;
use radar_ranging::Sample;
use std::sync::Arc;
use tokio::time::Instant;

/// Segment lines latched into one digit the last time it was enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatchedDigit {
    pub segments: u8,
    pub decimal_point: bool,
}

#[derive(Debug, Clone)]
pub struct State {
    // Sensor node
    pub samples: [Sample; 2],
    pub tx_pair: DistancePair,
    pub tx_sent: u64,
    pub tx_dropped: u64,

    // Display node
    pub rx_pair: DistancePair,
    pub rx_frames: u64,
    pub last_rx_ts: Instant,
    pub zone: Option<Zone>,
    pub selected_cm: u8,
    pub display: Option<DisplayContent>,
    pub led_bank_a: u16,
    pub led_bank_b: u16,
    pub buzzer_on: bool,
    pub digits: [LatchedDigit; 2],
    pub fault_led: bool,
    pub faults: Vec<String>,
}

impl Default for State {
    fn default() -> Self {
        State {
            samples: [Sample::default(); 2],
            tx_pair: DistancePair::default(),
            tx_sent: 0,
            tx_dropped: 0,
            rx_pair: DistancePair::default(),
            rx_frames: 0,
            last_rx_ts: Instant::now(),
            zone: None,
            selected_cm: 0,
            display: None,
            led_bank_a: 0,
            led_bank_b: 0,
            buzzer_on: false,
            digits: [LatchedDigit::default(); 2],
            fault_led: false,
            faults: Vec::new(),
        }
    }
}

pub type Blackboard = Arc<RwLock<State>>;

pub fn snapshot(bb: &Blackboard) -> State {
    (*bb.read()).clone()
}

pub fn touch_rx(bb: &Blackboard, pair: DistancePair) {
    let mut g = bb.write();
    g.rx_pair = pair;
    g.rx_frames += 1;
    g.last_rx_ts = Instant::now();
}

/// Record a fault once. Returns `true` if it was not already present.
pub fn raise_fault(bb: &Blackboard, msg: &str) -> bool {
    let mut g = bb.write();
    if g.faults.iter().any(|s| s == msg) {
        return false;
    }
    g.faults.push(msg.to_string());
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raise_fault_deduplicates() {
        let bb: Blackboard = Arc::default();
        assert!(raise_fault(&bb, "bus silent"));
        assert!(!raise_fault(&bb, "bus silent"));
        assert!(raise_fault(&bb, "malformed frame"));
        assert_eq!(snapshot(&bb).faults, vec!["bus silent", "malformed frame"]);
    }

    #[test]
    fn test_touch_rx_counts_frames() {
        let bb: Blackboard = Arc::default();
        touch_rx(&bb, DistancePair::new(1, 2));
        touch_rx(&bb, DistancePair::new(3, 4));
        let s = snapshot(&bb);
        assert_eq!(s.rx_frames, 2);
        assert_eq!(s.rx_pair, DistancePair::new(3, 4));
    }
}
