//! Shared types for the blobline detection pipeline.

use serde::{Deserialize, Serialize};

/// Errors that can occur when configuring or running the detection
/// pipeline.
///
/// Programming-invariant violations inside the tracer are deliberately
/// not represented here: they panic instead of returning an error,
/// because a wrong polygon would be silent corruption.
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    /// Detector configuration is invalid.
    #[error("invalid detector configuration: {0}")]
    InvalidConfig(String),
}

/// A 2D point in pixel or physical coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// A vertex on the pixel grid, in integer grid-corner coordinates.
///
/// Contour vertices sit on the corners *between* pixels, so a mask of
/// width `w` produces vertices with `x` ranging over `0..=w`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPoint {
    /// Horizontal grid-corner position.
    pub x: i64,
    /// Vertical grid-corner position.
    pub y: i64,
}

impl GridPoint {
    /// Create a new grid point.
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Convert to a floating-point [`Point`].
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_point(self) -> Point {
        Point::new(self.x as f64, self.y as f64)
    }
}

/// A closed rectilinear polygon in integer pixel-grid coordinates.
///
/// Produced by the tracer, one per outer contour. The ring is implicitly
/// closed: the edge from the last vertex back to the first is part of the
/// boundary but the first vertex is not repeated at the end. No three
/// consecutive vertices (including across the wrap-around edge) are
/// collinear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPolygon(Vec<GridPoint>);

impl RawPolygon {
    /// Create a polygon from a vertex ring.
    #[must_use]
    pub const fn new(points: Vec<GridPoint>) -> Self {
        Self(points)
    }

    /// Returns `true` if the polygon has no vertices.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of vertices.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a slice of all vertices.
    #[must_use]
    pub fn points(&self) -> &[GridPoint] {
        &self.0
    }

    /// Consumes the polygon and returns the underlying vertex vector.
    #[must_use]
    pub fn into_points(self) -> Vec<GridPoint> {
        self.0
    }
}

/// A sequence of connected floating-point points.
///
/// Used for simplified contours (closed by convention, wrap edge implied)
/// and for calibrated physical-space boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline(Vec<Point>);

impl Polyline {
    /// Create a new polyline from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the polyline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the polyline.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Point> {
        self.0.first()
    }

    /// Returns the last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Point> {
        self.0.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the polyline and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }
}

/// Mask dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Configuration for the detection pipeline.
///
/// All parameters have sensible defaults matching the values the detector
/// ships with. Construction is unvalidated; [`validate`](Self::validate)
/// is called at the pipeline entry points and rejects out-of-range values
/// before any geometry is produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Target spacing, in pixels, of the uniform resampling pass applied
    /// to each raw contour before simplification. Values `<= 0` skip
    /// resampling and feed the raw vertices to the simplifier directly.
    pub resample_interval: f64,

    /// Ramer-Douglas-Peucker simplification tolerance in pixels. Higher
    /// values remove more points, producing simpler contours.
    pub epsilon: f64,

    /// Physical size of one pixel along each spatial axis (x, y).
    pub calibration: [f64; 2],

    /// Pixel offset of the processed crop within the full image (x, y).
    /// Added to each vertex before calibration is applied.
    pub origin: [i64; 2],
}

impl DetectorConfig {
    /// Default resampling interval in pixels.
    pub const DEFAULT_RESAMPLE_INTERVAL: f64 = 2.0;

    /// Default simplification tolerance in pixels.
    pub const DEFAULT_EPSILON: f64 = 0.5;

    /// Check the configuration for out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::InvalidConfig`] if `epsilon` is negative or
    /// non-finite, `resample_interval` is non-finite, or any calibration
    /// component is not strictly positive and finite.
    pub fn validate(&self) -> Result<(), DetectError> {
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(DetectError::InvalidConfig(format!(
                "epsilon must be finite and non-negative, got {}",
                self.epsilon,
            )));
        }
        if !self.resample_interval.is_finite() {
            return Err(DetectError::InvalidConfig(format!(
                "resample_interval must be finite, got {}",
                self.resample_interval,
            )));
        }
        for (axis, &c) in ["x", "y"].iter().zip(&self.calibration) {
            if !c.is_finite() || c <= 0.0 {
                return Err(DetectError::InvalidConfig(format!(
                    "calibration[{axis}] must be finite and positive, got {c}",
                )));
            }
        }
        Ok(())
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            resample_interval: Self::DEFAULT_RESAMPLE_INTERVAL,
            epsilon: Self::DEFAULT_EPSILON,
            calibration: [1.0, 1.0],
            origin: [0, 0],
        }
    }
}

/// One detected region: the final output unit of the pipeline.
///
/// Carries the calibrated physical-space boundary, the quality scalar
/// supplied by the caller's oracle, and the frame index the detection
/// was tagged with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Boundary vertices in physical coordinates, closed by convention.
    pub boundary: Vec<Point>,
    /// Externally computed quality value, carried through opaquely.
    pub quality: f64,
    /// Index of the time frame this region was detected in.
    pub frame: usize,
}

/// Result of running the detection pipeline with all intermediate stage
/// outputs preserved.
///
/// Each field captures the output of one logical pipeline stage, enabling
/// callers to inspect or display every step of the processing chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedDetection {
    /// Dimensions of the traced mask in pixels.
    pub dimensions: Dimensions,
    /// Stage 1: raw rectilinear contours, one per foreground blob.
    pub polygons: Vec<RawPolygon>,
    /// Stage 2: resampled + simplified contours in pixel space.
    pub simplified: Vec<Polyline>,
    /// Stage 3: calibrated regions with quality and frame index.
    pub regions: Vec<Region>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- Point tests ---

    #[test]
    fn point_new() {
        let p = Point::new(3.0, 4.0);
        assert!((p.x - 3.0).abs() < f64::EPSILON);
        assert!((p.y - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance_squared(b) - 25.0).abs() < f64::EPSILON);
        assert!((a.distance(b) - 5.0).abs() < f64::EPSILON);
    }

    // --- GridPoint tests ---

    #[test]
    fn grid_point_to_point() {
        let g = GridPoint::new(-3, 7);
        assert_eq!(g.to_point(), Point::new(-3.0, 7.0));
    }

    // --- RawPolygon tests ---

    #[test]
    fn raw_polygon_accessors() {
        let ring = vec![
            GridPoint::new(0, 0),
            GridPoint::new(4, 0),
            GridPoint::new(4, 4),
            GridPoint::new(0, 4),
        ];
        let poly = RawPolygon::new(ring.clone());
        assert_eq!(poly.len(), 4);
        assert!(!poly.is_empty());
        assert_eq!(poly.points(), &ring);
        assert_eq!(poly.into_points(), ring);
    }

    // --- Polyline tests ---

    #[test]
    fn polyline_first_and_last() {
        let pl = Polyline::new(vec![
            Point::new(1.0, 2.0),
            Point::new(3.0, 4.0),
            Point::new(5.0, 6.0),
        ]);
        assert_eq!(pl.len(), 3);
        assert_eq!(pl.first(), Some(&Point::new(1.0, 2.0)));
        assert_eq!(pl.last(), Some(&Point::new(5.0, 6.0)));
    }

    #[test]
    fn polyline_empty() {
        let pl = Polyline::new(vec![]);
        assert!(pl.is_empty());
        assert!(pl.first().is_none());
        assert!(pl.last().is_none());
    }

    // --- DetectorConfig tests ---

    #[test]
    fn config_defaults() {
        let config = DetectorConfig::default();
        assert!((config.resample_interval - 2.0).abs() < f64::EPSILON);
        assert!((config.epsilon - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.calibration, [1.0, 1.0]);
        assert_eq!(config.origin, [0, 0]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_rejects_negative_epsilon() {
        let config = DetectorConfig {
            epsilon: -0.1,
            ..DetectorConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DetectError::InvalidConfig(_)),
        ));
    }

    #[test]
    fn config_rejects_nan_interval() {
        let config = DetectorConfig {
            resample_interval: f64::NAN,
            ..DetectorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_rejects_zero_calibration() {
        let config = DetectorConfig {
            calibration: [0.0, 1.0],
            ..DetectorConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("calibration[x]"), "got: {err}");
    }

    #[test]
    fn config_accepts_non_positive_interval() {
        // Zero or negative interval means "skip resampling", not an error.
        let config = DetectorConfig {
            resample_interval: 0.0,
            ..DetectorConfig::default()
        };
        assert!(config.validate().is_ok());
        let config = DetectorConfig {
            resample_interval: -1.0,
            ..DetectorConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    // --- Serde round-trip tests ---

    #[test]
    fn config_serde_round_trip() {
        let config = DetectorConfig {
            resample_interval: 1.5,
            epsilon: 0.25,
            calibration: [0.2, 0.2],
            origin: [10, -4],
        };
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: DetectorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn region_serde_round_trip() {
        let region = Region {
            boundary: vec![Point::new(0.5, 0.5), Point::new(2.0, 0.5)],
            quality: 0.93,
            frame: 7,
        };
        let json = serde_json::to_string(&region).unwrap();
        let deserialized: Region = serde_json::from_str(&json).unwrap();
        assert_eq!(region, deserialized);
    }

    #[test]
    fn staged_detection_serde_round_trip() {
        let staged = StagedDetection {
            dimensions: Dimensions {
                width: 5,
                height: 5,
            },
            polygons: vec![RawPolygon::new(vec![
                GridPoint::new(1, 1),
                GridPoint::new(4, 1),
                GridPoint::new(4, 4),
                GridPoint::new(1, 4),
            ])],
            simplified: vec![Polyline::new(vec![Point::new(1.0, 1.0)])],
            regions: vec![],
        };
        let json = serde_json::to_string(&staged).unwrap();
        let deserialized: StagedDetection = serde_json::from_str(&json).unwrap();
        assert_eq!(staged, deserialized);
    }
}
