//! Wire encoding of raw frames.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use contracts::{
    capture_target_height, CaptureConfig, ClientError, EncodedFrame, PixelFormat, RawFrame,
};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage, RgbaImage};

/// Downscales a raw frame to the target width (aspect preserved),
/// compresses it as JPEG, and emits the base64 wire form.
#[derive(Debug, Clone)]
pub struct FrameEncoder {
    target_width: u32,
    jpeg_quality: u8,
}

impl FrameEncoder {
    pub fn new(target_width: u32, jpeg_quality: u8) -> Self {
        Self {
            target_width,
            jpeg_quality,
        }
    }

    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::new(config.target_width, config.jpeg_quality)
    }

    pub fn encode(&self, frame: &RawFrame) -> Result<EncodedFrame, ClientError> {
        if frame.data.len() != frame.expected_len() {
            return Err(ClientError::encode(format!(
                "frame buffer is {} bytes, expected {}",
                frame.data.len(),
                frame.expected_len()
            )));
        }

        let rgb = self.to_rgb(frame)?;
        let target_height = capture_target_height(frame.width, frame.height, self.target_width);
        let resized = image::imageops::resize(
            &rgb,
            self.target_width,
            target_height,
            FilterType::Triangle,
        );

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(Cursor::new(&mut jpeg), self.jpeg_quality)
            .encode_image(&resized)
            .map_err(|e| ClientError::encode(format!("jpeg encode failed: {e}")))?;

        Ok(EncodedFrame {
            data: BASE64.encode(&jpeg),
            width: self.target_width,
            height: target_height,
        })
    }

    fn to_rgb(&self, frame: &RawFrame) -> Result<RgbImage, ClientError> {
        let pixels = frame.data.to_vec();
        match frame.format {
            PixelFormat::Rgb8 => RgbImage::from_raw(frame.width, frame.height, pixels)
                .ok_or_else(|| ClientError::encode("rgb buffer does not match dimensions")),
            PixelFormat::Rgba8 => {
                let rgba = RgbaImage::from_raw(frame.width, frame.height, pixels)
                    .ok_or_else(|| ClientError::encode("rgba buffer does not match dimensions"))?;
                Ok(DynamicImage::ImageRgba8(rgba).to_rgb8())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn rgb_frame(width: u32, height: u32) -> RawFrame {
        RawFrame {
            width,
            height,
            format: PixelFormat::Rgb8,
            data: Bytes::from(vec![128u8; (width * height * 3) as usize]),
        }
    }

    #[test]
    fn test_encode_produces_scaled_jpeg() {
        let encoder = FrameEncoder::new(4, 40);
        let encoded = encoder.encode(&rgb_frame(8, 4)).unwrap();

        assert_eq!(encoded.width, 4);
        assert_eq!(encoded.height, 2);

        let jpeg = BASE64.decode(&encoded.data).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.width(), 4);
        assert_eq!(decoded.height(), 2);
    }

    #[test]
    fn test_encode_rejects_short_buffer() {
        let encoder = FrameEncoder::new(4, 40);
        let frame = RawFrame {
            width: 8,
            height: 4,
            format: PixelFormat::Rgb8,
            data: Bytes::from(vec![0u8; 10]),
        };
        assert!(encoder.encode(&frame).is_err());
    }

    #[test]
    fn test_encode_rgba_input() {
        let encoder = FrameEncoder::new(4, 40);
        let frame = RawFrame {
            width: 8,
            height: 4,
            format: PixelFormat::Rgba8,
            data: Bytes::from(vec![200u8; 8 * 4 * 4]),
        };
        let encoded = encoder.encode(&frame).unwrap();
        assert_eq!(encoded.width, 4);
    }
}
