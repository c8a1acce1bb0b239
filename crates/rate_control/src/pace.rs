//! Pacing controller.

use std::time::Duration;

use metrics::gauge;
use tokio::sync::watch;
use tracing::debug;

use crate::policy::{period_for_fps, target_fps};
use crate::window::LatencyWindow;

/// Stateful pacing controller.
///
/// Owns the latency window and publishes the current tick period through
/// a watch channel. The scheduler re-reads the period on every tick, so a
/// rate change takes effect when the next tick is armed, never mid-tick.
#[derive(Debug)]
pub struct PaceController {
    window: LatencyWindow,
    fps: u32,
    rate_changes: u64,
    period_tx: watch::Sender<Duration>,
}

impl PaceController {
    /// Create a controller at the given initial frame rate.
    ///
    /// Returns the controller and the receiver the scheduler paces itself by.
    pub fn new(initial_fps: u32) -> (Self, watch::Receiver<Duration>) {
        let (period_tx, period_rx) = watch::channel(period_for_fps(initial_fps));
        gauge!("annostream_target_fps").set(f64::from(initial_fps));
        (
            Self {
                window: LatencyWindow::new(),
                fps: initial_fps,
                rate_changes: 0,
                period_tx,
            },
            period_rx,
        )
    }

    /// Record one round-trip latency sample and re-evaluate the frame rate.
    ///
    /// Publishes a new period only when the target fps actually changes.
    /// Returns the target fps in effect after this sample.
    pub fn record(&mut self, latency_ms: f64) -> u32 {
        self.window.record(latency_ms);
        let mean = self.window.mean();
        let fps = target_fps(mean);

        if fps != self.fps {
            debug!(
                previous_fps = self.fps,
                fps,
                mean_latency_ms = mean,
                "frame rate adjusted"
            );
            self.fps = fps;
            self.rate_changes += 1;
            gauge!("annostream_target_fps").set(f64::from(fps));
            // Receiver may be gone during shutdown; nothing to pace then.
            let _ = self.period_tx.send(period_for_fps(fps));
        }

        fps
    }

    /// Current target frame rate
    pub fn current_fps(&self) -> u32 {
        self.fps
    }

    /// How many times the target frame rate has changed
    pub fn rate_changes(&self) -> u64 {
        self.rate_changes
    }

    /// Mean latency over all samples so far, in milliseconds
    pub fn mean_latency_ms(&self) -> f64 {
        self.window.mean()
    }

    /// Most recent latency sample, in milliseconds
    pub fn last_latency_ms(&self) -> Option<f64> {
        self.window.last()
    }

    /// Number of samples recorded
    pub fn sample_count(&self) -> usize {
        self.window.len()
    }

    /// Copy of every latency sample recorded so far
    pub fn latency_samples(&self) -> Vec<f64> {
        self.window.samples().to_vec()
    }
}
