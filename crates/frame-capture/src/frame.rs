//! Video frame types and decoding

use std::io::Cursor;

use image::{ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::FrameError;

/// Identifiers tying a frame to one monitored participant
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIds {
    pub meeting_id: String,
    pub participant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl SessionIds {
    pub fn new(meeting_id: impl Into<String>, participant_id: impl Into<String>) -> Self {
        Self {
            meeting_id: meeting_id.into(),
            participant_id: participant_id.into(),
            user_id: None,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// Metadata carried alongside every frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameMetadata {
    /// Capture timestamp (milliseconds, monotonic per session)
    pub timestamp_ms: u64,
    /// Frame sequence number
    #[serde(default)]
    pub sequence: u32,
    /// Session the frame belongs to
    #[serde(default)]
    pub session: SessionIds,
}

impl FrameMetadata {
    pub fn at(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            ..Default::default()
        }
    }
}

/// Decoded RGB video frame
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    data: Vec<u8>,
    width: u32,
    height: u32,
    metadata: FrameMetadata,
}

impl VideoFrame {
    /// Create a frame from raw RGB data
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        metadata: FrameMetadata,
    ) -> Result<Self, FrameError> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(FrameError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            metadata,
        })
    }

    /// Solid-color frame, mostly useful for fixtures
    pub fn filled(width: u32, height: u32, rgb: [u8; 3], metadata: FrameMetadata) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self {
            data,
            width,
            height,
            metadata,
        }
    }

    /// Decode an encoded image (JPEG, PNG, WebP...) into an RGB frame
    pub fn decode(bytes: &[u8], metadata: FrameMetadata) -> Result<Self, FrameError> {
        if bytes.is_empty() {
            return Err(FrameError::Empty);
        }

        let img = image::load_from_memory(bytes)?;
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        debug!(width, height, timestamp_ms = metadata.timestamp_ms, "Decoded frame");

        Ok(Self {
            data: rgb.into_raw(),
            width,
            height,
            metadata,
        })
    }

    /// Encode the frame losslessly as PNG
    pub fn encode_png(&self) -> Result<Vec<u8>, FrameError> {
        let img = self.to_rgb_image()?;
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png)
            .map_err(|e| FrameError::Encode(e.to_string()))?;
        Ok(out.into_inner())
    }

    /// View the pixels as an `image` buffer for model preprocessing
    pub fn to_rgb_image(&self) -> Result<RgbImage, FrameError> {
        RgbImage::from_raw(self.width, self.height, self.data.clone()).ok_or(
            FrameError::BufferSize {
                expected: self.width as usize * self.height as usize * 3,
                actual: self.data.len(),
            },
        )
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn metadata(&self) -> &FrameMetadata {
        &self.metadata
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.metadata.timestamp_ms
    }

    /// Get pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.data[idx], self.data[idx + 1], self.data[idx + 2]])
    }

    /// Convert to grayscale
    pub fn to_grayscale(&self) -> Vec<u8> {
        self.data
            .chunks_exact(3)
            // Luminance formula: 0.299*R + 0.587*G + 0.114*B
            .map(|p| (p[0] as f32 * 0.299 + p[1] as f32 * 0.587 + p[2] as f32 * 0.114) as u8)
            .collect()
    }

    /// Crop a region of the frame, clamped to the frame bounds
    pub fn crop(&self, x: u32, y: u32, w: u32, h: u32) -> Option<VideoFrame> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let w = w.min(self.width - x);
        let h = h.min(self.height - y);
        if w == 0 || h == 0 {
            return None;
        }

        let mut cropped = Vec::with_capacity(w as usize * h as usize * 3);
        for row in y..(y + h) {
            let start = (row as usize * self.width as usize + x as usize) * 3;
            let end = start + w as usize * 3;
            cropped.extend_from_slice(&self.data[start..end]);
        }

        Some(VideoFrame {
            data: cropped,
            width: w,
            height: h,
            metadata: self.metadata.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn gradient(width: u32, height: u32) -> VideoFrame {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let pixel = [(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8];
                data.extend_from_slice(&pixel);
            }
        }
        VideoFrame::new(data, width, height, FrameMetadata::at(42)).unwrap()
    }

    #[test]
    fn test_png_round_trip_is_pixel_identical() {
        let frame = gradient(32, 24);
        let png = frame.encode_png().unwrap();

        let decoded = VideoFrame::decode(&png, FrameMetadata::at(42)).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err =
            VideoFrame::decode(b"definitely not an image", FrameMetadata::default()).unwrap_err();
        assert!(matches!(err, FrameError::Decode(_)));
    }

    #[test]
    fn test_decode_empty_fails() {
        assert!(matches!(
            VideoFrame::decode(&[], FrameMetadata::default()),
            Err(FrameError::Empty)
        ));
    }

    #[test]
    fn test_new_rejects_wrong_buffer_size() {
        let err = VideoFrame::new(vec![0; 10], 2, 2, FrameMetadata::default()).unwrap_err();
        assert!(matches!(err, FrameError::BufferSize { expected: 12, actual: 10 }));
    }

    #[test]
    fn test_get_pixel_bounds() {
        let frame = VideoFrame::filled(4, 4, [10, 20, 30], FrameMetadata::default());
        assert_eq!(frame.get_pixel(3, 3), Some([10, 20, 30]));
        assert_eq!(frame.get_pixel(4, 0), None);
    }

    #[test]
    fn test_grayscale_white() {
        let frame = VideoFrame::filled(2, 2, [255, 255, 255], FrameMetadata::default());
        assert!(frame.to_grayscale().iter().all(|&v| v >= 254));
    }

    #[test]
    fn test_crop_clamps_to_bounds() {
        let frame = gradient(10, 10);
        let cropped = frame.crop(8, 8, 5, 5).unwrap();
        assert_eq!((cropped.width(), cropped.height()), (2, 2));
        assert_eq!(cropped.get_pixel(0, 0), frame.get_pixel(8, 8));
        assert!(frame.crop(10, 0, 1, 1).is_none());
    }

    proptest! {
        #[test]
        fn prop_crop_never_exceeds_frame(
            x in 0u32..20,
            y in 0u32..20,
            w in 0u32..30,
            h in 0u32..30,
        ) {
            let frame = gradient(16, 12);
            if let Some(c) = frame.crop(x, y, w, h) {
                prop_assert!(x + c.width() <= frame.width());
                prop_assert!(y + c.height() <= frame.height());
                prop_assert_eq!(c.data().len(), (c.width() * c.height() * 3) as usize);
            }
        }
    }
}
