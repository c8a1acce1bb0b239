//! Paced frame transmission loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use channel::ChannelHandle;
use contracts::{FramePayload, FrameSource, SendSlot, EVENT_FRAME};
use metrics::counter;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, instrument, trace, warn};

use crate::encoder::FrameEncoder;

/// Drives the capture tick loop.
///
/// One frame per tick: grab, encode, stamp the send slot, send. The tick
/// period is re-read from the pace receiver each time the next tick is
/// armed, so rate changes never cut a tick short. Ticks run sequentially
/// on one task and cannot overlap.
pub struct CaptureScheduler;

impl CaptureScheduler {
    pub fn start(
        source: Arc<dyn FrameSource>,
        encoder: FrameEncoder,
        channel: ChannelHandle,
        pace_rx: watch::Receiver<Duration>,
        slot: Arc<SendSlot>,
    ) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let frames_sent = Arc::new(AtomicU64::new(0));
        let frames_dropped = Arc::new(AtomicU64::new(0));

        let sent = Arc::clone(&frames_sent);
        let dropped = Arc::clone(&frames_dropped);
        let task = tokio::spawn(async move {
            tick_loop(source, encoder, channel, pace_rx, slot, shutdown_rx, sent, dropped).await;
        });

        SchedulerHandle {
            shutdown_tx,
            task,
            frames_sent,
            frames_dropped,
        }
    }
}

/// Handle to a running capture loop
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
    frames_sent: Arc<AtomicU64>,
    frames_dropped: Arc<AtomicU64>,
}

impl SchedulerHandle {
    /// Frames successfully handed to the channel so far
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent.load(Ordering::Relaxed)
    }

    /// Frames refused by the channel (not connected) so far
    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped.load(Ordering::Relaxed)
    }

    /// Signal the loop to stop. Idempotent.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Stop and wait for the loop to exit
    #[instrument(name = "scheduler_shutdown", skip(self))]
    pub async fn shutdown(self) {
        self.stop();
        if let Err(e) = self.task.await {
            error!(error = ?e, "capture loop panicked");
        }
        debug!("capture scheduler shutdown complete");
    }
}

async fn tick_loop(
    source: Arc<dyn FrameSource>,
    encoder: FrameEncoder,
    channel: ChannelHandle,
    pace_rx: watch::Receiver<Duration>,
    slot: Arc<SendSlot>,
    mut shutdown_rx: watch::Receiver<bool>,
    frames_sent: Arc<AtomicU64>,
    frames_dropped: Arc<AtomicU64>,
) {
    debug!("capture loop started");

    loop {
        // Period is re-read each iteration; a pace change applies to the
        // next tick, never the one in flight.
        let period = *pace_rx.borrow();
        tokio::select! {
            _ = sleep(period) => {}
            changed = shutdown_rx.changed() => {
                // A dropped handle counts as a stop signal
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
                continue;
            }
        }

        let Some(frame) = source.current_frame() else {
            trace!("no frame available, tick skipped");
            continue;
        };

        let encoded = match encoder.encode(&frame) {
            Ok(encoded) => encoded,
            Err(e) => {
                counter!("annostream_encode_failures_total").increment(1);
                warn!(error = %e, "frame encode failed, tick skipped");
                continue;
            }
        };

        let payload = match serde_json::to_value(FramePayload {
            frame: encoded.data,
        }) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "frame payload serialize failed, tick skipped");
                continue;
            }
        };

        // Stamp first so a fast round trip still finds its send time
        slot.stamp(Instant::now());
        if channel.send(EVENT_FRAME, payload) {
            frames_sent.fetch_add(1, Ordering::Relaxed);
            counter!("annostream_frames_sent_total").increment(1);
        } else {
            frames_dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    debug!("capture loop stopped");
}
