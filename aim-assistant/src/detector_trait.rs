/// Detector interface consumed by the engagement loop
///
/// A detector turns one raw frame into blob observations. Implementations are
/// stateless with respect to time: the same frame always yields the same
/// observations.
use crate::types::ImageData;
use blobtrack::Observation;

/// Common interface for frame-local target detectors
pub trait TargetDetector {
    /// Detect targets in a single frame. Invalid frames yield no observations.
    fn detect(&self, image: &ImageData) -> Vec<Observation>;

    /// Get the detector name (for logging/debugging)
    fn name(&self) -> &str;

    /// Detect targets in a frame that may be unavailable
    fn detect_frame(&self, image: Option<&ImageData>) -> Vec<Observation> {
        image.map(|img| self.detect(img)).unwrap_or_default()
    }
}
