//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    channel: ChannelInfo,
    camera: CameraInfo,
    capture: CaptureInfo,
    display_sink: String,
}

#[derive(Serialize)]
struct ChannelInfo {
    endpoint: String,
    max_reconnect_attempts: u32,
    reconnect_delay_ms: u64,
}

#[derive(Serialize)]
struct CameraInfo {
    device_id: String,
    label: String,
    width: u32,
    height: u32,
    frame_rate: f64,
}

#[derive(Serialize)]
struct CaptureInfo {
    target_width: u32,
    target_height: u32,
    jpeg_quality: u8,
    initial_fps: u32,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint);
    }

    Ok(())
}

fn build_config_info(blueprint: &contracts::ClientBlueprint) -> ConfigInfo {
    let target_height = contracts::capture_target_height(
        blueprint.camera.width,
        blueprint.camera.height,
        blueprint.capture.target_width,
    );

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        channel: ChannelInfo {
            endpoint: blueprint.channel.endpoint.clone(),
            max_reconnect_attempts: blueprint.channel.max_reconnect_attempts,
            reconnect_delay_ms: blueprint.channel.reconnect_delay_ms,
        },
        camera: CameraInfo {
            device_id: blueprint.camera.device_id.clone(),
            label: blueprint.camera.label.clone(),
            width: blueprint.camera.width,
            height: blueprint.camera.height,
            frame_rate: blueprint.camera.frame_rate,
        },
        capture: CaptureInfo {
            target_width: blueprint.capture.target_width,
            target_height,
            jpeg_quality: blueprint.capture.jpeg_quality,
            initial_fps: blueprint.capture.initial_fps,
        },
        display_sink: format!("{:?}", blueprint.display.sink),
    }
}

fn print_config_info(blueprint: &contracts::ClientBlueprint) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                 Annostream Configuration                      ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📡 Channel");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Endpoint: {}", blueprint.channel.endpoint);
    println!(
        "   └─ Reconnect: up to {} attempts, {} ms apart",
        blueprint.channel.max_reconnect_attempts, blueprint.channel.reconnect_delay_ms
    );

    println!("\n🎥 Camera");
    println!("   ├─ Device: {}", blueprint.camera.device_id);
    println!("   ├─ Label: {}", blueprint.camera.label);
    println!(
        "   └─ Mode: {}x{} @ {} fps",
        blueprint.camera.width, blueprint.camera.height, blueprint.camera.frame_rate
    );

    let target_height = contracts::capture_target_height(
        blueprint.camera.width,
        blueprint.camera.height,
        blueprint.capture.target_width,
    );
    println!("\n🎞  Capture");
    println!(
        "   ├─ Wire frame: {}x{}",
        blueprint.capture.target_width, target_height
    );
    println!("   ├─ JPEG quality: {}", blueprint.capture.jpeg_quality);
    println!("   └─ Initial rate: {} fps", blueprint.capture.initial_fps);

    println!("\n🖥  Display");
    println!("   └─ Sink: {:?}", blueprint.display.sink);

    println!();
}
