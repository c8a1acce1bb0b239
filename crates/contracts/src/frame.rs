//! Frame and camera data structures.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Pixel layout of a raw frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    Rgb8,
    Rgba8,
}

impl PixelFormat {
    /// Bytes per pixel
    pub fn stride(self) -> usize {
        match self {
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }
}

/// One raw frame read from the capture source
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Frame width in pixels
    pub width: u32,

    /// Frame height in pixels
    pub height: u32,

    /// Pixel layout of `data`
    pub format: PixelFormat,

    /// Raw pixel data (zero-copy)
    pub data: Bytes,
}

impl RawFrame {
    /// Expected byte length for the declared dimensions and format
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.stride()
    }
}

/// One downsampled, transmittable frame
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    /// Base64-encoded JPEG bytes
    pub data: String,

    /// Width after downsampling
    pub width: u32,

    /// Height after downsampling (aspect preserved)
    pub height: u32,
}

/// Requested camera settings, applied at acquisition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraPrefs {
    /// Ideal width
    #[serde(default = "default_camera_width")]
    pub width: u32,

    /// Ideal height
    #[serde(default = "default_camera_height")]
    pub height: u32,

    /// Ideal frame rate (Hz)
    #[serde(default = "default_camera_frame_rate")]
    pub frame_rate: f64,

    /// Device identifier
    #[serde(default = "default_device_id")]
    pub device_id: String,

    /// Human-readable device label
    #[serde(default = "default_device_label")]
    pub label: String,
}

fn default_camera_width() -> u32 {
    1920
}

fn default_camera_height() -> u32 {
    1080
}

fn default_camera_frame_rate() -> f64 {
    30.0
}

fn default_device_id() -> String {
    "synthetic-0".to_string()
}

fn default_device_label() -> String {
    "Synthetic test pattern".to_string()
}

impl Default for CameraPrefs {
    fn default() -> Self {
        Self {
            width: default_camera_width(),
            height: default_camera_height(),
            frame_rate: default_camera_frame_rate(),
            device_id: default_device_id(),
            label: default_device_label(),
        }
    }
}

/// Snapshot of the acquired device settings; immutable after acquisition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraMetadata {
    /// Actual width
    pub width: u32,

    /// Actual height
    pub height: u32,

    /// Actual frame rate (Hz)
    pub frame_rate: f64,

    /// Device identifier
    pub device_id: String,

    /// Human-readable device label
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_stride() {
        assert_eq!(PixelFormat::Rgb8.stride(), 3);
        assert_eq!(PixelFormat::Rgba8.stride(), 4);
    }

    #[test]
    fn test_expected_len() {
        let frame = RawFrame {
            width: 4,
            height: 2,
            format: PixelFormat::Rgb8,
            data: Bytes::from(vec![0u8; 24]),
        };
        assert_eq!(frame.expected_len(), frame.data.len());
    }

    #[test]
    fn test_camera_prefs_defaults() {
        let prefs = CameraPrefs::default();
        assert_eq!(prefs.width, 1920);
        assert_eq!(prefs.height, 1080);
        assert_eq!(prefs.frame_rate, 30.0);
    }
}
