mod blackboard; // shared state read by the dashboard
mod bus;
mod config;
mod display_node;
mod graphics;
mod sensor_node;
mod sim;

use std::time::Duration;

use blackboard::Blackboard;
use display_node::{DisplayNode, Panel};
use radar_link::PairCell;
use radar_ranging::SampleCell;
use sensor_node::SensorNode;
use sim::HostClock;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Published by the rangers, read by the transmit task.
static SAMPLES: [SampleCell; 2] = [SampleCell::new(), SampleCell::new()];

/// Written by the display node's receive task only.
static RX_BUFFER: PairCell = PairCell::new();

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let settings = config::load_settings()?;
    let bb: Blackboard = Blackboard::default();
    let tokio_rt = tokio::runtime::Runtime::new()?;

    if !settings.visualization.enabled {
        info!("Reverse radar started headless.");
        return tokio_rt.block_on(run(settings, bb));
    }

    info!("Reverse radar started. Spawning simulation and opening the dashboard...");
    let conf = graphics::window_conf(&settings.visualization);
    tokio_rt.spawn({
        let bb = bb.clone();
        async move {
            match run(settings, bb).await {
                Ok(()) => info!("Simulation finished."),
                Err(e) => error!("Simulation failed: {:?}", e),
            }
        }
    });
    macroquad::Window::from_config(conf, graphics::run_dashboard(bb));
    Ok(())
}

async fn run(settings: config::Settings, bb: Blackboard) -> anyhow::Result<()> {
    let clock = HostClock::new();
    let (controller, wire) = bus::bus(
        settings.bus.mailboxes,
        settings.bus.topic_capacity,
        Duration::from_micros(settings.bus.frame_time_us),
    );
    let frames = wire.subscribe();

    info!("Starting sensor node...");
    let sensor = SensorNode::start(&settings.sensor_node, &settings.world, &SAMPLES, clock)?;

    info!("Starting display node...");
    let display = DisplayNode::new(&settings.display_node, &RX_BUFFER, Panel::simulated(&bb)?)?;

    tokio::try_join!(
        wire.run(),
        sensor.run(controller.clone(), bb.clone()),
        bus::chatter(
            controller,
            settings.bus.chatter_id,
            Duration::from_millis(settings.bus.chatter_period_ms),
        ),
        display.run(frames, bb),
    )?;
    Ok(())
}
