//! Color-threshold blob detector
//!
//! Pipeline per frame: convert to HSV (OpenCV 8-bit scale, hue in 0..=179),
//! threshold into a binary mask, label 8-connected components, then keep
//! components that are large enough and roughly as wide as they are tall.
//! Partially occluded or merged blobs fail the aspect-ratio window.

use crate::detector_trait::TargetDetector;
use crate::types::{ImageData, ImageFormat};
use blobtrack::Observation;
use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};

/// Calibration for the color-blob detector
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Inclusive lower HSV bound
    pub hsv_lower: [u8; 3],
    /// Inclusive upper HSV bound
    pub hsv_upper: [u8; 3],
    /// Blobs with fewer pixels than this are discarded
    pub min_area: f32,
    pub min_aspect_ratio: f32,
    pub max_aspect_ratio: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            hsv_lower: [83, 92, 80],
            hsv_upper: [133, 255, 255],
            min_area: 400.0,
            min_aspect_ratio: 0.6,
            max_aspect_ratio: 1.4,
        }
    }
}

/// Convert one RGB pixel to HSV on the OpenCV 8-bit scale
pub fn rgb_to_hsv([r, g, b]: [u8; 3]) -> [u8; 3] {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v == 0.0 { 0.0 } else { 255.0 * diff / v };

    let mut h = if diff == 0.0 {
        0.0
    } else if v == r {
        60.0 * (g - b) / diff
    } else if v == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }

    [
        ((h / 2.0).round() as u32 % 180) as u8,
        s.round() as u8,
        v as u8,
    ]
}

#[derive(Debug, Clone)]
struct BlobAccumulator {
    count: u64,
    sum_x: f64,
    sum_y: f64,
    min_x: u32,
    max_x: u32,
    min_y: u32,
    max_y: u32,
}

impl BlobAccumulator {
    fn new(x: u32, y: u32) -> Self {
        Self {
            count: 0,
            sum_x: 0.0,
            sum_y: 0.0,
            min_x: x,
            max_x: x,
            min_y: y,
            max_y: y,
        }
    }

    fn add(&mut self, x: u32, y: u32) {
        self.count += 1;
        self.sum_x += x as f64;
        self.sum_y += y as f64;
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }

    fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }
}

/// Fixed color-threshold detector
#[derive(Debug, Clone)]
pub struct ColorBlobDetector {
    config: DetectorConfig,
}

impl ColorBlobDetector {
    pub fn new(config: DetectorConfig) -> Self {
        log::info!(
            "Creating ColorBlobDetector: hsv {:?}..={:?}, min_area={}, aspect [{}, {}]",
            config.hsv_lower,
            config.hsv_upper,
            config.min_area,
            config.min_aspect_ratio,
            config.max_aspect_ratio
        );
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    fn in_range(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| hsv[c] >= self.config.hsv_lower[c] && hsv[c] <= self.config.hsv_upper[c])
    }

    /// Binary mask of in-range pixels (255) over background (0).
    ///
    /// The caller must pass a validated, non-grayscale image.
    pub fn mask(&self, image: &ImageData) -> GrayImage {
        GrayImage::from_fn(image.width, image.height, |x, y| {
            if self.in_range(rgb_to_hsv(image.rgb_at(x, y))) {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        })
    }

    /// Every blob at or above the minimum area, flagged for shape acceptance
    ///
    /// Blobs are reported in the raster order of their first pixel.
    pub fn detect_all(&self, image: &ImageData) -> Vec<Observation> {
        if image.format == ImageFormat::Grayscale {
            log::warn!("Grayscale frame carries no color, skipping detection");
            return Vec::new();
        }
        if let Err(e) = image.ensure_valid() {
            log::warn!("Skipping detection: {}", e);
            return Vec::new();
        }
        if image.width == 0 || image.height == 0 {
            return Vec::new();
        }

        let mask = self.mask(image);
        let labels = connected_components(&mask, Connectivity::Eight, Luma([0u8]));

        let mut blobs: Vec<Option<BlobAccumulator>> = Vec::new();
        let mut first_seen: Vec<usize> = Vec::new();
        for (x, y, label) in labels.enumerate_pixels() {
            let label = label[0] as usize;
            if label == 0 {
                continue;
            }
            if label >= blobs.len() {
                blobs.resize(label + 1, None);
            }
            let blob = blobs[label].get_or_insert_with(|| {
                first_seen.push(label);
                BlobAccumulator::new(x, y)
            });
            blob.add(x, y);
        }

        let observations: Vec<Observation> = first_seen
            .into_iter()
            .filter_map(|label| blobs[label].as_ref())
            .filter(|blob| blob.count as f32 >= self.config.min_area)
            .map(|blob| {
                let area = blob.count as f32;
                let ratio = blob.width() as f32 / blob.height() as f32;
                let shape_ok =
                    ratio >= self.config.min_aspect_ratio && ratio <= self.config.max_aspect_ratio;
                let cx = (blob.sum_x / blob.count as f64) as f32;
                let cy = (blob.sum_y / blob.count as f64) as f32;
                Observation::new(cx, cy, area).with_aspect_ratio(ratio, shape_ok)
            })
            .collect();

        log::debug!(
            "Detector found {} blobs above min area ({} shape-accepted)",
            observations.len(),
            observations.iter().filter(|o| o.shape_ok).count()
        );
        observations
    }
}

impl TargetDetector for ColorBlobDetector {
    fn detect(&self, image: &ImageData) -> Vec<Observation> {
        let mut observations = self.detect_all(image);
        observations.retain(|o| o.shape_ok);
        observations
    }

    fn name(&self) -> &str {
        "color-blob"
    }
}

impl Default for ColorBlobDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}
