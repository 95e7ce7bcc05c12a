//! Pipeline diagnostics: counts and ratios for each detection stage.
//!
//! These metrics are permanent instrumentation intended for parameter
//! tuning: how many contours a mask produced, how hard the simplifier
//! worked, how many regions survived. They are exposed by the accessor
//! methods of the incremental [`pipeline`](crate::pipeline) stages and
//! printed by the bench CLI.

use serde::{Deserialize, Serialize};

use crate::types::{Polyline, RawPolygon};

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Contour tracing metrics.
    Trace {
        /// Number of traced outer contours.
        polygon_count: usize,
        /// Total vertex count across all contours.
        vertex_count: usize,
        /// Smallest per-contour vertex count (0 when no contours).
        min_vertices: usize,
        /// Largest per-contour vertex count (0 when no contours).
        max_vertices: usize,
        /// Mean per-contour vertex count (0.0 when no contours).
        mean_vertices: f64,
    },
    /// Resampling + simplification metrics.
    Simplify {
        /// Resampling interval in pixels (non-positive = skipped).
        resample_interval: f64,
        /// Reduction tolerance in pixels.
        epsilon: f64,
        /// Total vertex count entering the stage.
        points_before: usize,
        /// Total vertex count leaving the stage.
        points_after: usize,
        /// Fraction of input points removed (0.0 when the input was
        /// empty).
        reduction_ratio: f64,
    },
    /// Calibration metrics.
    Calibrate {
        /// Number of emitted regions.
        region_count: usize,
        /// Frame index the regions were tagged with.
        frame: usize,
    },
}

/// Summary statistics over a set of traced contours.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContourStats {
    /// Total vertex count.
    pub total: usize,
    /// Smallest per-contour vertex count (0 when empty).
    pub min: usize,
    /// Largest per-contour vertex count (0 when empty).
    pub max: usize,
    /// Mean per-contour vertex count (0.0 when empty).
    pub mean: f64,
}

/// Compute vertex-count statistics for a set of traced contours.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn polygon_stats(polygons: &[RawPolygon]) -> ContourStats {
    if polygons.is_empty() {
        return ContourStats {
            total: 0,
            min: 0,
            max: 0,
            mean: 0.0,
        };
    }
    let counts: Vec<usize> = polygons.iter().map(RawPolygon::len).collect();
    let total: usize = counts.iter().sum();
    ContourStats {
        total,
        min: counts.iter().copied().min().unwrap_or(0),
        max: counts.iter().copied().max().unwrap_or(0),
        mean: total as f64 / polygons.len() as f64,
    }
}

/// Total point count across a set of polylines.
#[must_use]
pub fn total_points(polylines: &[Polyline]) -> usize {
    polylines.iter().map(Polyline::len).sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{GridPoint, Point};

    #[test]
    fn stats_for_empty_set() {
        let stats = polygon_stats(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.min, 0);
        assert_eq!(stats.max, 0);
        assert!((stats.mean - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stats_for_mixed_sizes() {
        let square = RawPolygon::new(vec![
            GridPoint::new(0, 0),
            GridPoint::new(1, 0),
            GridPoint::new(1, 1),
            GridPoint::new(0, 1),
        ]);
        let hexagon = RawPolygon::new(vec![
            GridPoint::new(0, 0),
            GridPoint::new(2, 0),
            GridPoint::new(2, 1),
            GridPoint::new(1, 1),
            GridPoint::new(1, 2),
            GridPoint::new(0, 2),
        ]);
        let stats = polygon_stats(&[square, hexagon]);
        assert_eq!(stats.total, 10);
        assert_eq!(stats.min, 4);
        assert_eq!(stats.max, 6);
        assert!((stats.mean - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn total_points_sums_polylines() {
        let polylines = vec![
            Polyline::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]),
            Polyline::new(vec![Point::new(0.0, 0.0)]),
        ];
        assert_eq!(total_points(&polylines), 3);
    }

    #[test]
    fn metrics_serde_round_trip() {
        let metrics = StageMetrics::Simplify {
            resample_interval: 2.0,
            epsilon: 0.5,
            points_before: 120,
            points_after: 16,
            reduction_ratio: 0.866,
        };
        let json = serde_json::to_string(&metrics).unwrap();
        let deserialized: StageMetrics = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            deserialized,
            StageMetrics::Simplify {
                points_before: 120,
                points_after: 16,
                ..
            },
        ));
    }
}
