//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Validate config path
    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    // Load and parse configuration
    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(ref endpoint) = args.endpoint {
        info!(endpoint = %endpoint, "Overriding service endpoint from CLI");
        blueprint.channel.endpoint = endpoint.clone();
    }

    info!(
        endpoint = %blueprint.channel.endpoint,
        camera = %blueprint.camera.device_id,
        target_width = blueprint.capture.target_width,
        initial_fps = blueprint.capture.initial_fps,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    // Build pipeline configuration
    let pipeline_config = PipelineConfig {
        blueprint,
        max_frames: if args.max_frames == 0 {
            None
        } else {
            Some(args.max_frames)
        },
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
        mock: args.mock,
    };

    // Create and run pipeline
    let pipeline = Pipeline::new(pipeline_config);

    // Setup graceful shutdown handler
    let shutdown_signal = setup_shutdown_signal();

    info!("Starting pipeline...");

    // Run pipeline with shutdown signal
    tokio::select! {
        result = pipeline.run() => {
            match result {
                Ok(stats) => {
                    info!(
                        frames_sent = stats.summary.frames_sent,
                        results_received = stats.summary.results_received,
                        duration_secs = stats.duration.as_secs_f64(),
                        throughput = format!("{:.2}", stats.throughput_fps()),
                        "Pipeline completed successfully"
                    );

                    // Print detailed statistics
                    stats.print_summary();
                }
                Err(e) => {
                    return Err(e).context("Pipeline execution failed");
                }
            }
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping pipeline...");
        }
    }

    info!("Annostream finished");
    Ok(())
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &contracts::ClientBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Channel:");
    println!("  Endpoint: {}", blueprint.channel.endpoint);
    println!(
        "  Reconnect: {} attempts, {} ms apart",
        blueprint.channel.max_reconnect_attempts, blueprint.channel.reconnect_delay_ms
    );

    println!("\nCamera:");
    println!(
        "  {} ({}) {}x{} @ {} fps",
        blueprint.camera.label,
        blueprint.camera.device_id,
        blueprint.camera.width,
        blueprint.camera.height,
        blueprint.camera.frame_rate
    );

    let target_height = contracts::capture_target_height(
        blueprint.camera.width,
        blueprint.camera.height,
        blueprint.capture.target_width,
    );
    println!("\nCapture:");
    println!(
        "  Wire frames: {}x{} JPEG q{}",
        blueprint.capture.target_width, target_height, blueprint.capture.jpeg_quality
    );
    println!("  Initial rate: {} fps", blueprint.capture.initial_fps);

    println!("\nDisplay: {:?}", blueprint.display.sink);
    println!();
}
