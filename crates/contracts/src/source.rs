//! FrameSource trait - capture device abstraction
//!
//! Decouples the scheduler from concrete camera implementations. Real device
//! backends and the synthetic test-pattern camera implement the same trait.

use crate::{CameraMetadata, RawFrame};

/// Live frame surface
///
/// Acquisition (device open, permission, settings negotiation) happens in the
/// implementation's constructor; once built, the source must answer
/// `current_frame` synchronously at any time.
pub trait FrameSource: Send + Sync {
    /// Settings snapshot captured at acquisition
    fn metadata(&self) -> CameraMetadata;

    /// Read the most recent frame
    ///
    /// Returns `None` while the device has not produced a frame yet; the
    /// scheduler treats that tick as a no-op.
    fn current_frame(&self) -> Option<RawFrame>;
}
