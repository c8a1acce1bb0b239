//! Configuration validation.
//!
//! Rules:
//! - channel.endpoint non-empty, ws:// or wss:// scheme
//! - max_reconnect_attempts >= 1
//! - reconnect_delay_ms > 0
//! - camera dimensions and frame rate > 0
//! - capture.target_width > 0, no wider than the camera
//! - jpeg_quality in 1..=100
//! - initial_fps one of the controller's output rates (15 / 20 / 30)

use contracts::{ClientBlueprint, ClientError};

/// Validate a ClientBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &ClientBlueprint) -> Result<(), ClientError> {
    validate_channel(blueprint)?;
    validate_camera(blueprint)?;
    validate_capture(blueprint)?;
    Ok(())
}

fn validate_channel(blueprint: &ClientBlueprint) -> Result<(), ClientError> {
    let channel = &blueprint.channel;

    if channel.endpoint.is_empty() {
        return Err(ClientError::config_validation(
            "channel.endpoint",
            "endpoint cannot be empty",
        ));
    }

    if !channel.endpoint.starts_with("ws://") && !channel.endpoint.starts_with("wss://") {
        return Err(ClientError::config_validation(
            "channel.endpoint",
            format!(
                "endpoint must use ws:// or wss:// scheme, got '{}'",
                channel.endpoint
            ),
        ));
    }

    if channel.max_reconnect_attempts == 0 {
        return Err(ClientError::config_validation(
            "channel.max_reconnect_attempts",
            "must be >= 1",
        ));
    }

    if channel.reconnect_delay_ms == 0 {
        return Err(ClientError::config_validation(
            "channel.reconnect_delay_ms",
            "must be > 0",
        ));
    }

    Ok(())
}

fn validate_camera(blueprint: &ClientBlueprint) -> Result<(), ClientError> {
    let camera = &blueprint.camera;

    if camera.width == 0 || camera.height == 0 {
        return Err(ClientError::config_validation(
            "camera.width / camera.height",
            format!(
                "dimensions must be > 0, got {}x{}",
                camera.width, camera.height
            ),
        ));
    }

    if camera.frame_rate <= 0.0 {
        return Err(ClientError::config_validation(
            "camera.frame_rate",
            format!("frame_rate must be > 0, got {}", camera.frame_rate),
        ));
    }

    Ok(())
}

fn validate_capture(blueprint: &ClientBlueprint) -> Result<(), ClientError> {
    let capture = &blueprint.capture;

    if capture.target_width == 0 {
        return Err(ClientError::config_validation(
            "capture.target_width",
            "must be > 0",
        ));
    }

    if capture.target_width > blueprint.camera.width {
        return Err(ClientError::config_validation(
            "capture.target_width",
            format!(
                "target_width ({}) cannot exceed camera width ({})",
                capture.target_width, blueprint.camera.width
            ),
        ));
    }

    if capture.jpeg_quality == 0 || capture.jpeg_quality > 100 {
        return Err(ClientError::config_validation(
            "capture.jpeg_quality",
            format!("must be in 1..=100, got {}", capture.jpeg_quality),
        ));
    }

    if !matches!(capture.initial_fps, 15 | 20 | 30) {
        return Err(ClientError::config_validation(
            "capture.initial_fps",
            format!("must be one of 15, 20, 30; got {}", capture.initial_fps),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        CameraPrefs, CaptureConfig, ChannelConfig, ConfigVersion, DisplayConfig,
    };

    fn minimal_blueprint() -> ClientBlueprint {
        ClientBlueprint {
            version: ConfigVersion::V1,
            channel: ChannelConfig {
                endpoint: "ws://127.0.0.1:5000/stream".into(),
                max_reconnect_attempts: 5,
                reconnect_delay_ms: 2000,
            },
            camera: CameraPrefs::default(),
            capture: CaptureConfig::default(),
            display: DisplayConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        let bp = minimal_blueprint();
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_empty_endpoint() {
        let mut bp = minimal_blueprint();
        bp.channel.endpoint = String::new();
        let result = validate(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("endpoint cannot be empty"), "got: {err}");
    }

    #[test]
    fn test_non_ws_scheme() {
        let mut bp = minimal_blueprint();
        bp.channel.endpoint = "http://127.0.0.1:5000".into();
        let result = validate(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("ws://"), "got: {err}");
    }

    #[test]
    fn test_zero_reconnect_attempts() {
        let mut bp = minimal_blueprint();
        bp.channel.max_reconnect_attempts = 0;
        assert!(validate(&bp).is_err());
    }

    #[test]
    fn test_zero_reconnect_delay() {
        let mut bp = minimal_blueprint();
        bp.channel.reconnect_delay_ms = 0;
        assert!(validate(&bp).is_err());
    }

    #[test]
    fn test_invalid_camera_dimensions() {
        let mut bp = minimal_blueprint();
        bp.camera.width = 0;
        let result = validate(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("dimensions"), "got: {err}");
    }

    #[test]
    fn test_target_width_wider_than_camera() {
        let mut bp = minimal_blueprint();
        bp.camera.width = 320;
        bp.camera.height = 240;
        bp.capture.target_width = 640;
        let result = validate(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("cannot exceed"), "got: {err}");
    }

    #[test]
    fn test_invalid_jpeg_quality() {
        let mut bp = minimal_blueprint();
        bp.capture.jpeg_quality = 0;
        assert!(validate(&bp).is_err());
    }

    #[test]
    fn test_invalid_initial_fps() {
        let mut bp = minimal_blueprint();
        bp.capture.initial_fps = 25;
        let result = validate(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("15, 20, 30"), "got: {err}");
    }
}
