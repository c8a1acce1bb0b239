//! Annotation Loop Demo
//!
//! Wires the synthetic camera, capture scheduler, channel, and correlator
//! against an in-process loopback service, runs for a few seconds, and
//! prints the display updates it produced.
//!
//! Run with: cargo run --bin annotation_loop [config_path]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use channel::{ChannelManager, ChannelOptions, MockTransport};
use capture::{CaptureScheduler, FrameEncoder, SyntheticCamera};
use config_loader::ConfigLoader;
use contracts::{
    ClientBlueprint, ConnectionState, DisplaySink, FrameSource, SendSlot, WireEnvelope,
    EVENT_BOUNDING_BOX, EVENT_FRAME,
};
use overlay::{BufferDisplay, Correlator};
use rate_control::PaceController;
use serde_json::json;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Annotation Loop Demo");

    let blueprint = load_blueprint()?;
    info!(endpoint = %blueprint.channel.endpoint, "Blueprint loaded");

    // ==== Stage 1: Loopback service ====
    let transport = MockTransport::new();
    transport.set_reply(|envelope: &WireEnvelope| {
        if envelope.event != EVENT_FRAME {
            return None;
        }
        Some(WireEnvelope::new(
            EVENT_BOUNDING_BOX,
            json!({
                "x": 40, "y": 30, "w": 100, "h": 80,
                "colorRectangle": [255, 64, 64],
                "orientation": "front",
                "text4User": "person detected",
                "textFacDis": "1.8 m"
            }),
        ))
    });

    // ==== Stage 2: Channel ====
    let manager = ChannelManager::spawn(transport, ChannelOptions::from(&blueprint.channel));
    let handle = manager.handle();

    // ==== Stage 3: Camera, pacing, correlation ====
    let camera = SyntheticCamera::acquire(&blueprint.camera)?;
    let metadata = camera.metadata();

    let (pace, pace_rx) = PaceController::new(blueprint.capture.initial_fps);
    let slot = Arc::new(SendSlot::new());
    let display = Arc::new(BufferDisplay::new());

    let canvas_height = contracts::capture_target_height(
        metadata.width,
        metadata.height,
        blueprint.capture.target_width,
    );
    let correlator = Arc::new(Correlator::new(
        Arc::clone(&slot),
        pace,
        Arc::clone(&display) as Arc<dyn DisplaySink>,
        metadata,
        blueprint.capture.target_width,
        canvas_height,
    ));
    correlator.attach(&handle);

    // ==== Stage 4: Connect and stream ====
    handle.connect();
    let mut state_rx = handle.state_changes();
    while *state_rx.borrow() != ConnectionState::Connected {
        state_rx.changed().await?;
    }
    info!("Channel connected, streaming frames");

    let scheduler = CaptureScheduler::start(
        Arc::new(camera),
        FrameEncoder::from_config(&blueprint.capture),
        handle.clone(),
        pace_rx,
        Arc::clone(&slot),
    );

    tokio::time::sleep(Duration::from_secs(3)).await;

    // ==== Stage 5: Teardown and report ====
    let frames_sent = scheduler.frames_sent();
    scheduler.shutdown().await;
    drop(handle);
    manager.shutdown().await;

    println!("\n=== Demo Results ===");
    println!("Frames sent: {frames_sent}");
    println!("Results received: {}", correlator.results_received());
    println!("Final frame rate: {} fps", correlator.current_fps());
    if let Some((last, mean)) = correlator.latency_stats() {
        println!("Round trip: {}", overlay::format_latency(last, mean));
    }
    if let Some(update) = display.last() {
        println!("Last display update:");
        println!("  {}", update.geometry_line);
        println!("  {}", update.latency_line);
        println!("  {}", update.camera_line);
    }

    Ok(())
}

fn load_blueprint() -> Result<ClientBlueprint, Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    if path.exists() {
        Ok(ConfigLoader::load_from_path(&path)?)
    } else {
        info!(path = %path.display(), "Config not found, using built-in defaults");
        Ok(ConfigLoader::load_from_str(
            r#"
[channel]
endpoint = "ws://127.0.0.1:5000/stream"

[camera]
width = 640
height = 480
frame_rate = 30.0

[display]
sink = "buffer"
"#,
            config_loader::ConfigFormat::Toml,
        )?)
    }
}
