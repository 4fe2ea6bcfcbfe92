//! Planar points and per-frame blob observations

use std::fmt;

/// Point in capture-local pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn squared_distance_to(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance between two points
    pub fn distance_to(&self, other: &Point) -> f32 {
        self.squared_distance_to(other).sqrt()
    }

    /// Vector from `origin` to this point
    pub fn offset_from(&self, origin: &Point) -> (f32, f32) {
        (self.x - origin.x, self.y - origin.y)
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// One detected blob in one frame
///
/// Observations are produced fresh by the detector every frame and are never
/// persisted; the tracker only reads `position` and `area`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Area centroid of the blob
    pub position: Point,
    /// Blob area in pixels
    pub area: f32,
    /// Bounding-box width / height
    pub aspect_ratio: f32,
    /// Whether the aspect ratio fell inside the accepted window
    pub shape_ok: bool,
}

impl Observation {
    pub fn new(x: f32, y: f32, area: f32) -> Self {
        Self {
            position: Point::new(x, y),
            area,
            aspect_ratio: 1.0,
            shape_ok: true,
        }
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: f32, shape_ok: bool) -> Self {
        self.aspect_ratio = aspect_ratio;
        self.shape_ok = shape_ok;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.squared_distance_to(&b), 25.0);
        assert_abs_diff_eq!(a.distance_to(&b), 5.0, epsilon = 1e-6);
    }

    #[test]
    fn test_offset_and_translate() {
        let origin = Point::new(400.0, 320.0);
        let p = Point::new(450.0, 300.0);
        assert_eq!(p.offset_from(&origin), (50.0, -20.0));

        let moved = p.translated(-50.0, 20.0);
        assert_eq!(moved, origin);
    }

    #[test]
    fn test_observation_defaults() {
        let obs = Observation::new(10.0, 20.0, 400.0);
        assert!(obs.shape_ok);
        assert_eq!(obs.position, Point::new(10.0, 20.0));

        let obs = obs.with_aspect_ratio(2.0, false);
        assert!(!obs.shape_ok);
        assert_eq!(obs.aspect_ratio, 2.0);
    }
}
