//! Latency → frame rate policy.

use std::time::Duration;

/// Select a target frame rate from the mean round-trip latency.
///
/// Thresholds are exclusive: a mean of exactly 100ms still allows 20 fps,
/// and exactly 50ms still allows 30 fps.
pub fn target_fps(mean_latency_ms: f64) -> u32 {
    if mean_latency_ms > 100.0 {
        15
    } else if mean_latency_ms > 50.0 {
        20
    } else {
        30
    }
}

/// Tick period for a frame rate
pub fn period_for_fps(fps: u32) -> Duration {
    Duration::from_millis(1000 / u64::from(fps.max(1)))
}
