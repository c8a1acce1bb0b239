//! # Overlay
//!
//! Annotation results rendered over the live view.
//!
//! The [`Correlator`] consumes inbound bounding-box results, pairs each
//! one with the most recent send timestamp to measure round-trip latency,
//! feeds the rate controller, and redraws the transparent overlay canvas.
//! Only the newest result is ever shown.

mod correlator;
mod display;
mod render;
mod text;

pub use correlator::Correlator;
pub use display::{BufferDisplay, LogDisplay};
pub use render::{clear, stroke_rect, LINE_WIDTH};
pub use text::{format_camera, format_geometry, format_latency};
