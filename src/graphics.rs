use macroquad::prelude::*;
use radar_feedback::leds::Bank;
use radar_feedback::{Led, Zone};
use tracing::info;

use crate::blackboard::{Blackboard, LatchedDigit, State, snapshot};
use crate::config::VisualizationSettings;

pub fn window_conf(settings: &VisualizationSettings) -> Conf {
    Conf {
        window_title: "Reverse Radar Panel".to_string(),
        window_width: settings.window_width,
        window_height: settings.window_height,
        high_dpi: true,
        ..Default::default()
    }
}

const UNLIT: Color = Color::new(0.25, 0.25, 0.25, 1.0);
const PANEL: Color = Color::new(0.12, 0.12, 0.14, 1.0);

const DIGIT_W: f32 = 60.0;
const DIGIT_H: f32 = 110.0;
const SEGMENT_T: f32 = 10.0;

fn led_color(led: Led) -> Color {
    match led {
        Led::Green1 | Led::Green2 | Led::Green3 => GREEN,
        Led::Blue1 | Led::Blue2 => BLUE,
        Led::Red1 | Led::Red2 => RED,
    }
}

fn zone_color(zone: Option<Zone>) -> Color {
    match zone {
        Some(Zone::RedFull | Zone::Red) => RED,
        Some(Zone::YellowFull | Zone::Yellow) => YELLOW,
        Some(Zone::GreenFull | Zone::Green) => GREEN,
        Some(Zone::Clear) => DARKGREEN,
        None => UNLIT,
    }
}

fn led_is_on(state: &State, led: Led) -> bool {
    let (bank, mask) = led.pin();
    let odr = match bank {
        Bank::A => state.led_bank_a,
        Bank::B => state.led_bank_b,
    };
    odr & mask != 0
}

/// Segment rectangles (x, y, w, h) relative to the digit origin, a through g.
fn segment_rects() -> [(f32, f32, f32, f32); 7] {
    let (w, h, t) = (DIGIT_W, DIGIT_H, SEGMENT_T);
    let half = h / 2.0;
    let upright = half - 1.5 * t;
    [
        (t, 0.0, w - 2.0 * t, t),
        (w - t, t, t, upright),
        (w - t, half + 0.5 * t, t, upright),
        (t, h - t, w - 2.0 * t, t),
        (0.0, half + 0.5 * t, t, upright),
        (0.0, t, t, upright),
        (t, half - 0.5 * t, w - 2.0 * t, t),
    ]
}

fn draw_digit(x: f32, y: f32, digit: LatchedDigit) {
    for (bit, (dx, dy, w, h)) in segment_rects().into_iter().enumerate() {
        let lit = digit.segments & (1 << bit) != 0;
        draw_rectangle(x + dx, y + dy, w, h, if lit { RED } else { UNLIT });
    }
    let dp = if digit.decimal_point { RED } else { UNLIT };
    draw_circle(x + DIGIT_W + 8.0, y + DIGIT_H - 5.0, 5.0, dp);
}

fn draw_panel(state: &State) {
    clear_background(PANEL);

    for (i, led) in Led::ORDER.into_iter().enumerate() {
        let color = if led_is_on(state, led) { led_color(led) } else { UNLIT };
        draw_circle(60.0 + i as f32 * 50.0, 60.0, 18.0, color);
    }

    draw_digit(60.0, 120.0, state.digits[0]);
    draw_digit(150.0, 120.0, state.digits[1]);

    let buzzer = if state.buzzer_on { ORANGE } else { UNLIT };
    draw_circle(330.0, 175.0, 28.0, buzzer);
    draw_text("BUZZER", 300.0, 225.0, 20.0, LIGHTGRAY);

    let fault = if state.fault_led { MAROON } else { UNLIT };
    draw_circle(430.0, 175.0, 14.0, fault);
    draw_text("FAULT", 405.0, 225.0, 20.0, LIGHTGRAY);

    draw_rectangle(500.0, 140.0, 160.0, 70.0, zone_color(state.zone));
    let zone = state.zone.map_or_else(|| "-".to_string(), |z| z.to_string());
    draw_text(&zone, 510.0, 182.0, 24.0, BLACK);

    let lines = [
        format!(
            "sensor A: {} cm{}   sensor B: {} cm{}",
            state.samples[0].distance_cm,
            if state.samples[0].fresh { "" } else { " (stale)" },
            state.samples[1].distance_cm,
            if state.samples[1].fresh { "" } else { " (stale)" },
        ),
        format!(
            "tx {}  sent {}  dropped {}",
            state.tx_pair, state.tx_sent, state.tx_dropped
        ),
        format!(
            "rx {}  frames {}  selected {} cm  display {}",
            state.rx_pair,
            state.rx_frames,
            state.selected_cm,
            state.display.map_or_else(|| "-".to_string(), |d| d.to_string()),
        ),
        format!("faults: {}", state.faults.join(", ")),
    ];
    for (i, line) in lines.iter().enumerate() {
        draw_text(line, 20.0, 290.0 + i as f32 * 26.0, 20.0, LIGHTGRAY);
    }
}

pub async fn run_dashboard(bb: Blackboard) {
    info!("Dashboard loop starting...");
    loop {
        let state = snapshot(&bb);
        draw_panel(&state);
        next_frame().await
    }
}
