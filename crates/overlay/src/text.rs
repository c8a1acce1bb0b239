//! Status line formatting.

use contracts::{AnnotationResult, CameraMetadata};

/// Latency readout, millisecond precision to three places
pub fn format_latency(last_ms: f64, avg_ms: f64) -> String {
    format!("Last={last_ms:.3} ms, Avg={avg_ms:.3} ms")
}

/// Bounding box geometry readout
pub fn format_geometry(result: &AnnotationResult) -> String {
    format!(
        "x: {}, y: {}, width: {}, height: {}",
        result.x, result.y, result.w, result.h
    )
}

/// Active camera readout
pub fn format_camera(camera: &CameraMetadata) -> String {
    format!(
        "{} ({}) {}x{} @ {} fps",
        camera.label, camera.device_id, camera.width, camera.height, camera.frame_rate
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_formatting() {
        assert_eq!(
            format_latency(42.0, 42.0),
            "Last=42.000 ms, Avg=42.000 ms"
        );
        assert_eq!(
            format_latency(7.1239, 12.5),
            "Last=7.124 ms, Avg=12.500 ms"
        );
    }

    #[test]
    fn test_geometry_formatting() {
        let result = AnnotationResult {
            x: 10,
            y: 20,
            w: 30,
            h: 40,
            color: [255, 0, 0],
            orientation: String::new(),
            text_for_user: String::new(),
            text_face_distance: String::new(),
        };
        assert_eq!(format_geometry(&result), "x: 10, y: 20, width: 30, height: 40");
    }
}
