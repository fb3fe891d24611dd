use std::time::Duration;

use anyhow::Context;
use config::{Config, ConfigError, Environment, File, FileFormat};
use radar_feedback::ThresholdLadder;
use radar_feedback::ladder::{STANDARD_BOUNDS_M, STANDARD_HALF_PERIODS_MS, TIER_COUNT};
use radar_link::{Address, AddressFilter};
use radar_ranging::RangerConfig;
use serde::Deserialize;
use tracing::{error, info};

use crate::sim::world::{ChannelWorld, ObstacleProfile};

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
const ENV_PREFIX: &str = "RADAR";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sensor_node: SensorNodeSettings,
    pub display_node: DisplayNodeSettings,
    pub bus: BusSettings,
    pub world: WorldSettings,
    pub visualization: VisualizationSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SensorNodeSettings {
    /// Identifier stamped on every distance report.
    pub address: u16,
    pub trigger_period_ms: u64,
    pub tx_period_ms: u64,
    pub pulse_width_us: u64,
    pub echo_timeout_ms: u64,
    pub max_missed_cycles: u8,
}

impl Default for SensorNodeSettings {
    fn default() -> Self {
        SensorNodeSettings {
            address: Address::SENSOR_NODE.id(),
            trigger_period_ms: 60,
            tx_period_ms: 60,
            pulse_width_us: 10,
            echo_timeout_ms: 40,
            max_missed_cycles: 3,
        }
    }
}

impl SensorNodeSettings {
    pub fn address(&self) -> anyhow::Result<Address> {
        Address::new(self.address).context("sensor_node.address")
    }

    pub fn ranger_config(&self) -> anyhow::Result<RangerConfig> {
        RangerConfig::new(
            radar_ranging::Duration::micros(self.pulse_width_us),
            radar_ranging::Duration::millis(self.echo_timeout_ms),
            self.max_missed_cycles,
        )
        .context("sensor_node ranger timing")
    }

    pub fn trigger_period(&self) -> Duration {
        Duration::from_millis(self.trigger_period_ms)
    }

    pub fn tx_period(&self) -> Duration {
        Duration::from_millis(self.tx_period_ms)
    }

    pub fn pulse_width(&self) -> Duration {
        Duration::from_micros(self.pulse_width_us)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayNodeSettings {
    /// Reserved identifier of the display node; nothing is sent under it.
    pub address: u16,
    /// The one sender whose reports are accepted; the filter is an exact match.
    pub accept_address: u16,
    pub eval_period_ms: u64,
    pub buzzer_start_delay_ms: u64,
    pub digit_hold_ms: u64,
    pub telemetry_period_ms: u64,
    pub link_timeout_ms: u64,
    pub ladder: LadderSettings,
}

impl Default for DisplayNodeSettings {
    fn default() -> Self {
        DisplayNodeSettings {
            address: Address::DISPLAY_NODE.id(),
            accept_address: Address::SENSOR_NODE.id(),
            eval_period_ms: 1,
            buzzer_start_delay_ms: 200,
            digit_hold_ms: 7,
            telemetry_period_ms: 60,
            link_timeout_ms: 500,
            ladder: LadderSettings::default(),
        }
    }
}

impl DisplayNodeSettings {
    pub fn address(&self) -> anyhow::Result<Address> {
        Address::new(self.address).context("display_node.address")
    }

    pub fn filter(&self) -> anyhow::Result<AddressFilter> {
        let id = Address::new(self.accept_address).context("display_node.accept_address")?;
        Ok(AddressFilter::exact(id))
    }

    pub fn ladder(&self) -> anyhow::Result<ThresholdLadder> {
        self.ladder.build().context("display_node.ladder")
    }

    pub fn timing(&self) -> DisplayTiming {
        DisplayTiming {
            eval_period: Duration::from_millis(self.eval_period_ms.max(1)),
            buzzer_start_delay: Duration::from_millis(self.buzzer_start_delay_ms),
            digit_hold: Duration::from_millis(self.digit_hold_ms.max(1)),
            telemetry_period: Duration::from_millis(self.telemetry_period_ms.max(1)),
            link_timeout: Duration::from_millis(self.link_timeout_ms),
        }
    }
}

/// Task periods of the display node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayTiming {
    pub eval_period: Duration,
    pub buzzer_start_delay: Duration,
    pub digit_hold: Duration,
    pub telemetry_period: Duration,
    pub link_timeout: Duration,
}

impl Default for DisplayTiming {
    fn default() -> Self {
        DisplayNodeSettings::default().timing()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LadderSettings {
    pub bounds_m: [f32; TIER_COUNT - 1],
    pub half_periods_ms: [u64; TIER_COUNT - 2],
}

impl Default for LadderSettings {
    fn default() -> Self {
        LadderSettings {
            bounds_m: STANDARD_BOUNDS_M,
            half_periods_ms: STANDARD_HALF_PERIODS_MS,
        }
    }
}

impl LadderSettings {
    pub fn build(&self) -> Result<ThresholdLadder, radar_feedback::FeedbackError> {
        if *self == LadderSettings::default() {
            return Ok(ThresholdLadder::standard());
        }
        ThresholdLadder::retuned(
            self.bounds_m,
            self.half_periods_ms.map(Duration::from_millis),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BusSettings {
    /// Transmit mailboxes of the sensor node's controller.
    pub mailboxes: usize,
    pub topic_capacity: usize,
    /// Time one frame occupies the wire.
    pub frame_time_us: u64,
    /// Unrelated traffic sharing the wire; a period of 0 disables it.
    pub chatter_id: u16,
    pub chatter_period_ms: u64,
}

impl Default for BusSettings {
    fn default() -> Self {
        BusSettings {
            mailboxes: 3,
            topic_capacity: 16,
            frame_time_us: 250,
            chatter_id: 0x1a0,
            chatter_period_ms: 25,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    pub sensor_a: ChannelWorld,
    pub sensor_b: ChannelWorld,
}

impl Default for WorldSettings {
    fn default() -> Self {
        WorldSettings {
            sensor_a: ChannelWorld {
                profile: ObstacleProfile::Sweep {
                    near_cm: 10.0,
                    far_cm: 180.0,
                    period_ms: 12_000,
                },
                dropout_every: 0,
            },
            sensor_b: ChannelWorld {
                profile: ObstacleProfile::Fixed { distance_cm: 150.0 },
                dropout_every: 0,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VisualizationSettings {
    pub enabled: bool,
    pub window_width: i32,
    pub window_height: i32,
}

impl Default for VisualizationSettings {
    fn default() -> Self {
        VisualizationSettings {
            enabled: true,
            window_width: 720,
            window_height: 420,
        }
    }
}

/// Load `config/default.toml` (optional) overlaid with `RADAR__*` variables.
pub fn load_settings() -> Result<Settings, ConfigError> {
    info!("Loading configuration from {} and {}__* variables", DEFAULT_CONFIG_PATH, ENV_PREFIX);

    let settings = Config::builder()
        .add_source(File::new(DEFAULT_CONFIG_PATH, FileFormat::Toml).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .and_then(|config| config.try_deserialize::<Settings>());

    match settings {
        Ok(settings) => {
            info!(?settings, "Configuration loaded");
            Ok(settings)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(text: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_match_reference_timing() {
        let settings = Settings::default();
        assert_eq!(settings.sensor_node.address().unwrap(), Address::SENSOR_NODE);
        assert_eq!(settings.sensor_node.ranger_config().unwrap(), RangerConfig::default());
        assert_eq!(settings.sensor_node.tx_period(), Duration::from_millis(60));
        assert_eq!(settings.display_node.ladder().unwrap(), ThresholdLadder::standard());

        let timing = settings.display_node.timing();
        assert_eq!(timing.digit_hold, Duration::from_millis(7));
        assert_eq!(timing.buzzer_start_delay, Duration::from_millis(200));
        assert_eq!(settings.bus.mailboxes, 3);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings = from_toml(
            r#"
            [sensor_node]
            tx_period_ms = 100

            [display_node.ladder]
            bounds_m = [0.2, 0.4, 0.6, 0.8, 1.0, 1.2]

            [world.sensor_b]
            dropout_every = 4
            [world.sensor_b.profile]
            kind = "sweep"
            near_cm = 20
            far_cm = 90.5
            period_ms = 3000

            [visualization]
            enabled = false
            "#,
        );
        assert_eq!(settings.sensor_node.tx_period_ms, 100);
        assert_eq!(settings.sensor_node.trigger_period_ms, 60);
        assert!(!settings.visualization.enabled);
        assert_eq!(settings.world.sensor_b.dropout_every, 4);
        assert_eq!(
            settings.world.sensor_b.profile,
            ObstacleProfile::Sweep { near_cm: 20.0, far_cm: 90.5, period_ms: 3000 }
        );

        let ladder = settings.display_node.ladder().unwrap();
        assert_eq!(ladder.classify(1.1).zone, radar_feedback::Zone::Green);
    }

    #[test]
    fn test_invalid_values_are_rejected_at_startup() {
        let settings = from_toml(
            r#"
            [sensor_node]
            address = 0x900
            max_missed_cycles = 0

            [display_node.ladder]
            half_periods_ms = [600, 400, 300, 100, 50]
            "#,
        );
        assert!(settings.sensor_node.address().is_err());
        assert!(settings.sensor_node.ranger_config().is_err());
        assert!(settings.display_node.ladder().is_err());
    }

    #[test]
    fn test_receive_filter_is_exact_match() {
        let settings = from_toml(
            r#"
            [display_node]
            accept_address = 0x103
            accept_mask = 0x7fe
            "#,
        );
        let filter = settings.display_node.filter().unwrap();
        assert!(filter.accepts_id(0x103));
        assert!(!filter.accepts_id(0x102));

        let buffer = radar_link::PairCell::new();
        let port = radar_link::RxPort::new(filter, &buffer);
        let delivery = port
            .on_frame(&radar_link::RawFrame::new(0x102, &[7, 7]))
            .unwrap();
        assert_eq!(delivery, radar_link::Delivery::Filtered);
        assert_eq!(buffer.load(), radar_link::DistancePair::new(0, 0));
    }
}
