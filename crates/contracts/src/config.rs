//! ClientBlueprint - Config Loader output
//!
//! Describes the complete client configuration: channel endpoint and
//! reconnection tunables, camera acquisition preferences, capture encoding
//! settings, display routing.

use serde::{Deserialize, Serialize};

use crate::CameraPrefs;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete client configuration blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Channel settings
    pub channel: ChannelConfig,

    /// Camera acquisition preferences
    #[serde(default)]
    pub camera: CameraPrefs,

    /// Capture/encoding settings
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Display routing
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Channel settings: endpoint plus the two reconnection tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Remote endpoint (ws:// or wss://)
    pub endpoint: String,

    /// Consecutive failed reconnection attempts before giving up
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    /// Fixed delay between reconnection attempts (not a backoff; tunable)
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

fn default_reconnect_delay_ms() -> u64 {
    2000
}

/// Capture/encoding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Fixed width frames are downsampled to before transmission
    #[serde(default = "default_target_width")]
    pub target_width: u32,

    /// JPEG quality, 1-100
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Sampling rate before the first latency feedback arrives
    #[serde(default = "default_initial_fps")]
    pub initial_fps: u32,
}

fn default_target_width() -> u32 {
    330
}

fn default_jpeg_quality() -> u8 {
    40
}

fn default_initial_fps() -> u32 {
    30
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            target_width: default_target_width(),
            jpeg_quality: default_jpeg_quality(),
            initial_fps: default_initial_fps(),
        }
    }
}

/// Display routing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Where textual metrics go
    #[serde(default)]
    pub sink: DisplayKind,
}

/// Display sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayKind {
    /// Structured log lines via tracing
    #[default]
    Log,
    /// In-memory buffer (tests, demos)
    Buffer,
}

/// Height of the downsampled capture target, aspect preserved
///
/// The overlay canvas must use these dimensions, not the native camera
/// resolution.
pub fn capture_target_height(source_width: u32, source_height: u32, target_width: u32) -> u32 {
    let w = source_width.max(1);
    ((source_height as f64 / w as f64) * target_width as f64).round() as u32
}

impl ClientBlueprint {
    /// Downsampled height for this blueprint's camera and capture settings
    pub fn capture_target_height(&self) -> u32 {
        capture_target_height(self.camera.width, self.camera.height, self.capture.target_width)
    }
}
