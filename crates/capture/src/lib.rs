//! # Capture
//!
//! Frame acquisition, encoding, and paced transmission.
//!
//! - [`SyntheticCamera`]: deterministic test-pattern frame source
//! - [`FrameEncoder`]: downscale + JPEG + base64 wire encoding
//! - [`CaptureScheduler`]: tick loop stamping and sending frames over the
//!   channel at the pace published by the rate controller

mod encoder;
mod scheduler;
mod synthetic;

pub use encoder::FrameEncoder;
pub use scheduler::{CaptureScheduler, SchedulerHandle};
pub use synthetic::SyntheticCamera;
