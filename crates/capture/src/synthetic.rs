//! Synthetic test-pattern camera.

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use contracts::{CameraMetadata, CameraPrefs, ClientError, FrameSource, PixelFormat, RawFrame};
use tracing::{info, instrument};

/// Frame source producing a moving gradient pattern.
///
/// Deterministic: frame N always renders the same pixels, so tests can
/// rely on successive frames differing.
pub struct SyntheticCamera {
    metadata: CameraMetadata,
    tick: AtomicU64,
}

impl SyntheticCamera {
    /// Open a synthetic device matching the requested preferences.
    #[instrument(name = "camera_acquire", skip(prefs), fields(device_id = %prefs.device_id))]
    pub fn acquire(prefs: &CameraPrefs) -> Result<Self, ClientError> {
        if prefs.width == 0 || prefs.height == 0 {
            return Err(ClientError::device(format!(
                "invalid capture dimensions {}x{}",
                prefs.width, prefs.height
            )));
        }
        if prefs.frame_rate <= 0.0 {
            return Err(ClientError::device(format!(
                "invalid frame rate {}",
                prefs.frame_rate
            )));
        }

        let metadata = CameraMetadata {
            width: prefs.width,
            height: prefs.height,
            frame_rate: prefs.frame_rate,
            device_id: prefs.device_id.clone(),
            label: prefs.label.clone(),
        };

        match serde_json::to_string(&metadata) {
            Ok(snapshot) => info!(settings = %snapshot, "camera acquired"),
            Err(_) => info!(device_id = %metadata.device_id, "camera acquired"),
        }

        Ok(Self {
            metadata,
            tick: AtomicU64::new(0),
        })
    }

    fn render(&self, tick: u64) -> Vec<u8> {
        let (w, h) = (self.metadata.width, self.metadata.height);
        let mut data = Vec::with_capacity((w * h * 3) as usize);
        let phase = (tick % 256) as u32;

        for y in 0..h {
            for x in 0..w {
                data.push(((x + phase) % 256) as u8);
                data.push(((y + phase) % 256) as u8);
                data.push((phase % 256) as u8);
            }
        }
        data
    }
}

impl FrameSource for SyntheticCamera {
    fn metadata(&self) -> CameraMetadata {
        self.metadata.clone()
    }

    fn current_frame(&self) -> Option<RawFrame> {
        let tick = self.tick.fetch_add(1, Ordering::Relaxed);
        Some(RawFrame {
            width: self.metadata.width,
            height: self.metadata.height,
            format: PixelFormat::Rgb8,
            data: Bytes::from(self.render(tick)),
        })
    }
}
