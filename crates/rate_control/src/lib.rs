//! # Rate Control
//!
//! Latency-adaptive frame pacing.
//!
//! The transmission rate reacts to round-trip latency: every inference
//! result updates a latency window, and the window's running mean selects
//! the next target frame rate. Consumers observe the resulting tick period
//! through a `tokio::sync::watch` channel.
//!
//! Core layers:
//! - `window`: append-only latency sample window (pure functions over state)
//! - `policy`: mean latency → target fps mapping
//! - `pace`: stateful controller publishing the tick period

mod pace;
mod policy;
mod window;

pub use pace::PaceController;
pub use policy::{period_for_fps, target_fps};
pub use window::LatencyWindow;
