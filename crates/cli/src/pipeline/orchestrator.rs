//! Pipeline orchestrator - coordinates all components.
//!
//! Supports the real WebSocket service and an in-process mock loopback
//! selected at runtime with `--mock`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use channel::{ChannelHandle, ChannelManager, ChannelOptions, MockTransport, Transport, WsTransport};
use capture::{CaptureScheduler, FrameEncoder, SyntheticCamera};
use contracts::{
    capture_target_height, ClientBlueprint, ConnectionState, DisplayKind, DisplaySink,
    FrameSource, SendSlot, WireEnvelope, EVENT_BOUNDING_BOX, EVENT_CONNECT, EVENT_FRAME,
};
use observability::RunMetricsAggregator;
use overlay::{BufferDisplay, Correlator, LogDisplay};
use rate_control::PaceController;
use serde_json::json;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::CliError;

use super::PipelineStats;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The client blueprint configuration
    pub blueprint: ClientBlueprint,

    /// Maximum number of frames to send (None = unlimited)
    pub max_frames: Option<u64>,

    /// Run timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,

    /// Use the in-process loopback service instead of the endpoint
    pub mock: bool,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion
    pub async fn run(self) -> Result<PipelineStats> {
        if self.config.mock {
            self.run_mock().await
        } else {
            self.run_service().await
        }
    }

    /// Run against the configured WebSocket service
    async fn run_service(self) -> Result<PipelineStats> {
        let endpoint = self.config.blueprint.channel.endpoint.clone();
        info!(endpoint = %endpoint, "Connecting to annotation service");
        let transport = WsTransport::new(endpoint);
        self.run_with_transport(transport).await
    }

    /// Run against the in-process loopback service
    async fn run_mock(self) -> Result<PipelineStats> {
        info!("Running in MOCK mode (no annotation service required)");
        let transport = MockTransport::new();
        transport.set_reply(mock_annotation_reply);
        self.run_with_transport(transport).await
    }

    /// Common pipeline logic shared between service and mock modes
    async fn run_with_transport<T: Transport>(&self, transport: T) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Acquire camera
        let camera = SyntheticCamera::acquire(&blueprint.camera)
            .context("Failed to acquire camera")?;
        let metadata = camera.metadata();
        let source: Arc<dyn FrameSource> = Arc::new(camera);

        // Spawn the channel supervisor
        let manager = ChannelManager::spawn(transport, ChannelOptions::from(&blueprint.channel));
        let handle = manager.handle();

        // Rate controller, correlation slot, display, correlator
        let (pace, pace_rx) = PaceController::new(blueprint.capture.initial_fps);
        let slot = Arc::new(SendSlot::new());

        let display: Arc<dyn DisplaySink> = match blueprint.display.sink {
            DisplayKind::Log => Arc::new(LogDisplay::new()),
            DisplayKind::Buffer => Arc::new(BufferDisplay::new()),
        };

        let canvas_height =
            capture_target_height(metadata.width, metadata.height, blueprint.capture.target_width);
        let correlator = Arc::new(Correlator::new(
            Arc::clone(&slot),
            pace,
            display,
            metadata,
            blueprint.capture.target_width,
            canvas_height,
        ));
        let _subscription = correlator.attach(&handle);

        // Every handshake after the first one is a reconnect
        let connects = Arc::new(AtomicU64::new(0));
        {
            let connects = Arc::clone(&connects);
            handle.on(EVENT_CONNECT, move |_| {
                connects.fetch_add(1, Ordering::Relaxed);
            });
        }

        // Connect before the first tick fires
        handle.connect();
        wait_until_connected(&handle, &blueprint.channel.endpoint).await?;
        info!("Annotation service connected");

        // Start the paced capture loop
        let scheduler = CaptureScheduler::start(
            source,
            FrameEncoder::from_config(&blueprint.capture),
            handle.clone(),
            pace_rx,
            Arc::clone(&slot),
        );

        info!(
            max_frames = ?self.config.max_frames,
            timeout = ?self.config.timeout,
            "Pipeline running"
        );

        // Run until the frame budget or timeout is hit
        let deadline = self.config.timeout.map(|t| Instant::now() + t);
        loop {
            sleep(Duration::from_millis(50)).await;

            if let Some(max) = self.config.max_frames {
                if scheduler.frames_sent() >= max {
                    info!(frames = scheduler.frames_sent(), "Reached max frames limit");
                    break;
                }
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    warn!("Run timeout reached");
                    break;
                }
            }
        }

        // Shutdown: capture loop first, then the channel
        info!("Shutting down pipeline...");
        let frames_sent = scheduler.frames_sent();
        let frames_dropped = scheduler.frames_dropped();
        scheduler.shutdown().await;
        drop(handle);
        manager.shutdown().await;

        // Collect statistics
        let mut aggregator = RunMetricsAggregator::new();
        aggregator.frames_sent = frames_sent;
        aggregator.frames_dropped = frames_dropped;
        aggregator.results_received = correlator.results_received();
        aggregator.reconnects = connects.load(Ordering::Relaxed).saturating_sub(1);
        aggregator.rate_changes = correlator.rate_changes();
        for latency in correlator.latency_samples() {
            aggregator.latency_stats.push(latency);
        }

        let stats = PipelineStats {
            duration: start_time.elapsed(),
            summary: aggregator.summary(correlator.current_fps()),
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            frames_sent = stats.summary.frames_sent,
            results_received = stats.summary.results_received,
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }
}

/// Wait for the channel to reach Connected.
///
/// Fails when the supervisor exhausts its reconnect attempts and settles
/// back to Disconnected.
async fn wait_until_connected(handle: &ChannelHandle, endpoint: &str) -> Result<()> {
    let mut state_rx = handle.state_changes();
    let mut seen_connecting = false;

    loop {
        let state = *state_rx.borrow();
        match state {
            ConnectionState::Connected => return Ok(()),
            ConnectionState::Connecting => seen_connecting = true,
            ConnectionState::Disconnected if seen_connecting => {
                return Err(CliError::service_connection(
                    endpoint,
                    "reconnect attempts exhausted",
                )
                .into());
            }
            ConnectionState::Disconnected => {}
        }
        state_rx
            .changed()
            .await
            .context("Channel supervisor exited unexpectedly")?;
    }
}

/// Loopback reply: one static annotation per frame
fn mock_annotation_reply(envelope: &WireEnvelope) -> Option<WireEnvelope> {
    if envelope.event != EVENT_FRAME {
        return None;
    }
    Some(WireEnvelope::new(
        EVENT_BOUNDING_BOX,
        json!({
            "x": 24,
            "y": 36,
            "w": 120,
            "h": 96,
            "colorRectangle": [255, 64, 64],
            "orientation": "front",
            "text4User": "person detected",
            "textFacDis": "1.8 m",
        }),
    ))
}
