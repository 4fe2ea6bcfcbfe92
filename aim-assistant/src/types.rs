//! Frame and image types shared by the capture, detection and engagement stages

use crate::error::{AssistError, Result};
use blobtrack::Point;
use image::RgbImage;

/// Channel order of raw frame bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    RGB,
    BGR,
    RGBA,
    BGRA,
    Grayscale,
}

/// Raw pixel buffer as delivered by a frame source
#[derive(Debug, Clone)]
pub struct ImageData {
    /// Raw pixel data, row-major, no padding
    pub data: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Pixel format
    pub format: ImageFormat,
}

impl ImageData {
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: ImageFormat) -> Self {
        Self {
            data,
            width,
            height,
            format,
        }
    }

    /// Wrap an `image` RGB buffer
    pub fn from_rgb_image(img: RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            data: img.into_raw(),
            width,
            height,
            format: ImageFormat::RGB,
        }
    }

    /// Get number of channels
    pub fn channels(&self) -> u32 {
        match self.format {
            ImageFormat::RGB | ImageFormat::BGR => 3,
            ImageFormat::RGBA | ImageFormat::BGRA => 4,
            ImageFormat::Grayscale => 1,
        }
    }

    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.channels() as usize
    }

    /// Validate image data consistency
    pub fn validate(&self) -> bool {
        self.data.len() == self.expected_len()
    }

    pub fn ensure_valid(&self) -> Result<()> {
        if self.validate() {
            Ok(())
        } else {
            Err(AssistError::InvalidFrame {
                expected: self.expected_len(),
                actual: self.data.len(),
            })
        }
    }

    /// Pixel at (x, y) as [r, g, b]; grayscale is replicated.
    ///
    /// The caller guarantees the buffer is valid and the coordinate in range.
    pub fn rgb_at(&self, x: u32, y: u32) -> [u8; 3] {
        let channels = self.channels() as usize;
        let idx = (y as usize * self.width as usize + x as usize) * channels;
        let px = &self.data[idx..idx + channels];
        match self.format {
            ImageFormat::RGB | ImageFormat::RGBA => [px[0], px[1], px[2]],
            ImageFormat::BGR | ImageFormat::BGRA => [px[2], px[1], px[0]],
            ImageFormat::Grayscale => [px[0], px[0], px[0]],
        }
    }
}

/// One captured frame with its screen anchor
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: ImageData,
    /// Screen coordinates of the frame's top-left pixel
    pub anchor: (i32, i32),
}

impl Frame {
    pub fn new(image: ImageData, anchor: (i32, i32)) -> Self {
        Self { image, anchor }
    }

    /// Aim origin in capture-local coordinates: the frame centre
    pub fn aim_origin(&self) -> Point {
        Point::new(
            (self.image.width / 2) as f32,
            (self.image.height / 2) as f32,
        )
    }

    /// Convert a capture-local point to screen coordinates
    pub fn to_screen(&self, p: Point) -> (f32, f32) {
        (p.x + self.anchor.0 as f32, p.y + self.anchor.1 as f32)
    }
}
