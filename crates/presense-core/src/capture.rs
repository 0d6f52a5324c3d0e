//! Frame capture & encode — a mirrored JPEG of the current video frame.
//!
//! The encoded image is always flipped horizontally so it matches the
//! selfie-mirrored preview; there is no non-mirrored path. Both the
//! single-shot and live paths share this transformation unchanged.

use image::codecs::jpeg::JpegEncoder;
use image::{imageops, RgbImage};
use presense_hw::RawFrame;
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("no frame available yet")]
    FrameUnavailable,
    #[error("frame geometry mismatch: {width}x{height} with {len} bytes")]
    BadGeometry { width: u32, height: u32, len: usize },
    #[error("jpeg encoding failed: {0}")]
    Jpeg(#[from] image::ImageError),
}

/// Renders frames onto a retained canvas and encodes the canvas as JPEG.
pub struct FrameEncoder {
    canvas: Option<RgbImage>,
    quality: u8,
}

impl FrameEncoder {
    pub fn new(quality: u8) -> Self {
        Self {
            canvas: None,
            quality,
        }
    }

    /// Draw the frame mirrored onto the canvas and encode it.
    ///
    /// A frame whose dimensions are not yet available (stream still
    /// negotiating) leaves the canvas untouched; the previous contents
    /// are re-encoded instead. Only a canvas that has never held a
    /// frame fails, with [`EncodeError::FrameUnavailable`].
    pub fn encode_mirrored(&mut self, frame: &RawFrame) -> Result<Vec<u8>, EncodeError> {
        if frame.width > 0 && frame.height > 0 {
            let image = RgbImage::from_raw(frame.width, frame.height, frame.data.clone())
                .ok_or(EncodeError::BadGeometry {
                    width: frame.width,
                    height: frame.height,
                    len: frame.data.len(),
                })?;
            self.canvas = Some(imageops::flip_horizontal(&image));
        }

        let canvas = self.canvas.as_ref().ok_or(EncodeError::FrameUnavailable)?;
        let mut out = Cursor::new(Vec::new());
        JpegEncoder::new_with_quality(&mut out, self.quality).encode_image(canvas)?;
        Ok(out.into_inner())
    }

    /// Current canvas dimensions, once a frame has been drawn.
    pub fn canvas_dimensions(&self) -> Option<(u32, u32)> {
        self.canvas.as_ref().map(|c| c.dimensions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: u32, height: u32, data: Vec<u8>) -> RawFrame {
        RawFrame {
            data,
            width,
            height,
            timestamp: std::time::Instant::now(),
            sequence: 0,
        }
    }

    /// 32x32 frame, left half red, right half blue.
    fn half_and_half() -> RawFrame {
        let mut data = Vec::with_capacity(32 * 32 * 3);
        for _y in 0..32 {
            for x in 0..32 {
                if x < 16 {
                    data.extend_from_slice(&[255, 0, 0]);
                } else {
                    data.extend_from_slice(&[0, 0, 255]);
                }
            }
        }
        frame(32, 32, data)
    }

    #[test]
    fn test_encode_produces_jpeg() {
        let mut encoder = FrameEncoder::new(85);
        let jpeg = encoder.encode_mirrored(&half_and_half()).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "missing JPEG SOI marker");
    }

    #[test]
    fn test_encode_is_mirrored() {
        // The red left half of the source must land on the right of the
        // encoded output.
        let mut encoder = FrameEncoder::new(85);
        let jpeg = encoder.encode_mirrored(&half_and_half()).unwrap();

        let decoded = image::load_from_memory(&jpeg).unwrap().to_rgb8();
        let left = decoded.get_pixel(4, 16);
        let right = decoded.get_pixel(27, 16);
        assert!(left[2] > left[0], "left should be blue after mirror: {left:?}");
        assert!(right[0] > right[2], "right should be red after mirror: {right:?}");
    }

    #[test]
    fn test_dimensionless_frame_keeps_canvas() {
        let mut encoder = FrameEncoder::new(85);
        encoder.encode_mirrored(&half_and_half()).unwrap();
        assert_eq!(encoder.canvas_dimensions(), Some((32, 32)));

        // Stream still negotiating: no dimensions yet.
        let jpeg = encoder.encode_mirrored(&frame(0, 0, Vec::new())).unwrap();
        assert_eq!(encoder.canvas_dimensions(), Some((32, 32)));
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_empty_canvas_is_unavailable() {
        let mut encoder = FrameEncoder::new(85);
        let result = encoder.encode_mirrored(&frame(0, 0, Vec::new()));
        assert!(matches!(result, Err(EncodeError::FrameUnavailable)));
    }

    #[test]
    fn test_geometry_mismatch() {
        let mut encoder = FrameEncoder::new(85);
        let result = encoder.encode_mirrored(&frame(4, 4, vec![0u8; 5]));
        assert!(matches!(result, Err(EncodeError::BadGeometry { .. })));
    }
}
