//! Result correlation and overlay redraw.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use channel::{ChannelHandle, SubscriptionId};
use contracts::{
    AnnotationResult, CameraMetadata, DisplaySink, DisplayUpdate, SendSlot, EVENT_BOUNDING_BOX,
};
use image::RgbaImage;
use metrics::{counter, histogram};
use rate_control::PaceController;
use tracing::{debug, warn};

use crate::{render, text};

/// Pairs inbound annotation results with the latest send stamp.
///
/// Each result updates the latency window through the pace controller,
/// replaces the displayed bounding box, and redraws the overlay canvas.
/// Results arriving before any frame was sent skip the latency update
/// but are still displayed.
pub struct Correlator {
    slot: Arc<SendSlot>,
    pace: Mutex<PaceController>,
    current: Mutex<Option<AnnotationResult>>,
    canvas: Mutex<RgbaImage>,
    display: Arc<dyn DisplaySink>,
    camera: CameraMetadata,
    results_received: AtomicU64,
}

impl Correlator {
    pub fn new(
        slot: Arc<SendSlot>,
        pace: PaceController,
        display: Arc<dyn DisplaySink>,
        camera: CameraMetadata,
        canvas_width: u32,
        canvas_height: u32,
    ) -> Self {
        Self {
            slot,
            pace: Mutex::new(pace),
            current: Mutex::new(None),
            canvas: Mutex::new(RgbaImage::new(canvas_width, canvas_height)),
            display,
            camera,
            results_received: AtomicU64::new(0),
        }
    }

    /// Subscribe to bounding-box events on the channel
    pub fn attach(self: &Arc<Self>, channel: &ChannelHandle) -> SubscriptionId {
        let correlator = Arc::clone(self);
        channel.on(EVENT_BOUNDING_BOX, move |value| {
            match serde_json::from_value::<AnnotationResult>(value) {
                Ok(result) => correlator.handle_result(result, Instant::now()),
                Err(e) => warn!(error = %e, "malformed annotation payload ignored"),
            }
        })
    }

    /// Process one annotation result received at `received_at`
    pub fn handle_result(&self, result: AnnotationResult, received_at: Instant) {
        self.results_received.fetch_add(1, Ordering::Relaxed);
        counter!("annostream_results_received_total").increment(1);

        let latency_line = match self.slot.last_send() {
            Some(sent_at) => {
                let latency_ms =
                    received_at.saturating_duration_since(sent_at).as_secs_f64() * 1000.0;
                histogram!("annostream_round_trip_ms").record(latency_ms);
                let mut pace = self.pace.lock().expect("pace lock poisoned");
                pace.record(latency_ms);
                text::format_latency(latency_ms, pace.mean_latency_ms())
            }
            None => {
                debug!("result before first send, latency not measured");
                "N/A".to_string()
            }
        };

        {
            let mut canvas = self.canvas.lock().expect("canvas lock poisoned");
            render::clear(&mut canvas);
            render::stroke_rect(
                &mut canvas,
                result.x,
                result.y,
                result.w,
                result.h,
                result.color,
            );
        }

        self.display.update(&DisplayUpdate {
            orientation: or_na(&result.orientation),
            text_for_user: or_na(&result.text_for_user),
            text_face_distance: or_na(&result.text_face_distance),
            latency_line,
            geometry_line: text::format_geometry(&result),
            camera_line: text::format_camera(&self.camera),
        });

        *self.current.lock().expect("result lock poisoned") = Some(result);
    }

    /// The result currently on display
    pub fn current(&self) -> Option<AnnotationResult> {
        self.current.lock().expect("result lock poisoned").clone()
    }

    /// Copy of the overlay canvas
    pub fn canvas_snapshot(&self) -> RgbaImage {
        self.canvas.lock().expect("canvas lock poisoned").clone()
    }

    pub fn results_received(&self) -> u64 {
        self.results_received.load(Ordering::Relaxed)
    }

    /// Frame rate currently targeted by the pace controller
    pub fn current_fps(&self) -> u32 {
        self.pace.lock().expect("pace lock poisoned").current_fps()
    }

    /// (last, mean) latency in milliseconds, when any was measured
    pub fn latency_stats(&self) -> Option<(f64, f64)> {
        let pace = self.pace.lock().expect("pace lock poisoned");
        pace.last_latency_ms().map(|last| (last, pace.mean_latency_ms()))
    }

    /// Frame rate changes the pace controller has applied so far
    pub fn rate_changes(&self) -> u64 {
        self.pace.lock().expect("pace lock poisoned").rate_changes()
    }

    /// Copy of every measured round-trip latency, oldest first
    pub fn latency_samples(&self) -> Vec<f64> {
        self.pace
            .lock()
            .expect("pace lock poisoned")
            .latency_samples()
    }
}

fn or_na(value: &str) -> String {
    if value.is_empty() {
        "N/A".to_string()
    } else {
        value.to_string()
    }
}
