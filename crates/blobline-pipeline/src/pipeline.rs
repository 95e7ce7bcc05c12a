//! Incremental detection pipeline: advance stage-by-stage, inspecting
//! each intermediate result before continuing.
//!
//! Unlike [`crate::detect`], which runs the entire pipeline in one call,
//! [`Detection`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use blobline_pipeline::{BinaryMask, DetectError, Detection, DetectorConfig};
//! # fn run(mask: BinaryMask) -> Result<(), DetectError> {
//! let staged = Detection::new(mask, DetectorConfig::default())
//!     .trace()?
//!     .simplify()
//!     .calibrate(0, |_| 1.0)
//!     .into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next stage, making
//! it a compile-time error to skip stages or run them out of order. The
//! caller can inspect the current stage's output and its
//! [`StageMetrics`] at any point before advancing.

use crate::diagnostics::{self, StageMetrics};
use crate::mask::BinaryMask;
use crate::types::{
    DetectError, DetectorConfig, Dimensions, Polyline, RawPolygon, Region, StagedDetection,
};

/// Incremental detection pipeline entry point.
///
/// Created via [`Detection::new`], which stores the mask and config
/// without doing any processing.
pub struct Detection;

impl Detection {
    /// Create a new pipeline from a mask and config.
    ///
    /// No processing is performed; call [`trace`](Pending::trace) to
    /// begin.
    #[allow(clippy::new_ret_no_self)]
    pub const fn new(mask: BinaryMask, config: DetectorConfig) -> Pending {
        Pending { config, mask }
    }
}

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
#[must_use = "pipeline stages are consumed by advancing — call .trace() to continue"]
pub struct Pending {
    config: DetectorConfig,
    mask: BinaryMask,
}

impl Pending {
    /// The mask waiting to be traced.
    #[must_use]
    pub const fn mask(&self) -> &BinaryMask {
        &self.mask
    }

    /// Validate the config and trace the mask, advancing to [`Traced`].
    ///
    /// A mask with no foreground produces a `Traced` stage with zero
    /// polygons; that is a valid outcome, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::InvalidConfig`] if the configuration is
    /// out of range.
    pub fn trace(self) -> Result<Traced, DetectError> {
        self.config.validate()?;
        let dimensions = Dimensions {
            width: self.mask.width(),
            height: self.mask.height(),
        };
        let polygons = crate::contour::trace(&self.mask);
        Ok(Traced {
            config: self.config,
            dimensions,
            polygons,
        })
    }
}

// ───────────────────────── Stage 1: Traced ───────────────────────────

/// Pipeline state after contour tracing.
#[must_use = "pipeline stages are consumed by advancing — call .simplify() to continue"]
pub struct Traced {
    config: DetectorConfig,
    dimensions: Dimensions,
    polygons: Vec<RawPolygon>,
}

impl Traced {
    /// The traced outer contours.
    #[must_use]
    pub fn polygons(&self) -> &[RawPolygon] {
        &self.polygons
    }

    /// Mask dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Tracing metrics for diagnostics.
    #[must_use]
    pub fn metrics(&self) -> StageMetrics {
        let stats = diagnostics::polygon_stats(&self.polygons);
        StageMetrics::Trace {
            polygon_count: self.polygons.len(),
            vertex_count: stats.total,
            min_vertices: stats.min,
            max_vertices: stats.max,
            mean_vertices: stats.mean,
        }
    }

    /// Advance to the simplification stage.
    pub fn simplify(self) -> Simplified {
        let reduced = crate::simplify::simplify_polygons(
            &self.polygons,
            self.config.resample_interval,
            self.config.epsilon,
        );
        Simplified {
            config: self.config,
            dimensions: self.dimensions,
            polygons: self.polygons,
            reduced,
        }
    }
}

// ───────────────────────── Stage 2: Simplified ───────────────────────

/// Pipeline state after resampling and simplification.
#[must_use = "pipeline stages are consumed by advancing — call .calibrate() to continue"]
pub struct Simplified {
    config: DetectorConfig,
    dimensions: Dimensions,
    polygons: Vec<RawPolygon>,
    reduced: Vec<Polyline>,
}

impl Simplified {
    /// The simplified pixel-space contours.
    #[must_use]
    pub fn simplified(&self) -> &[Polyline] {
        &self.reduced
    }

    /// Simplification metrics for diagnostics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn metrics(&self) -> StageMetrics {
        let points_before = diagnostics::polygon_stats(&self.polygons).total;
        let points_after = diagnostics::total_points(&self.reduced);
        let reduction_ratio = if points_before > 0 {
            1.0 - (points_after as f64 / points_before as f64)
        } else {
            0.0
        };
        StageMetrics::Simplify {
            resample_interval: self.config.resample_interval,
            epsilon: self.config.epsilon,
            points_before,
            points_after,
            reduction_ratio,
        }
    }

    /// Advance to the calibration stage, the final pipeline step.
    ///
    /// `quality` is invoked once per pixel-space contour; its value is
    /// carried into the emitted [`Region`] unchanged.
    pub fn calibrate<F>(self, frame: usize, quality: F) -> Calibrated
    where
        F: FnMut(&Polyline) -> f64,
    {
        let regions = crate::calibrate::calibrate_regions(&self.reduced, &self.config, frame, quality);
        Calibrated {
            dimensions: self.dimensions,
            polygons: self.polygons,
            simplified: self.reduced,
            regions,
            frame,
        }
    }
}

// ───────────────────────── Stage 3: Calibrated ───────────────────────

/// Pipeline state after calibration — the final stage.
#[must_use = "call .into_result() to extract the StagedDetection"]
pub struct Calibrated {
    dimensions: Dimensions,
    polygons: Vec<RawPolygon>,
    simplified: Vec<Polyline>,
    regions: Vec<Region>,
    frame: usize,
}

impl Calibrated {
    /// The emitted regions.
    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Calibration metrics for diagnostics.
    #[must_use]
    pub fn metrics(&self) -> StageMetrics {
        StageMetrics::Calibrate {
            region_count: self.regions.len(),
            frame: self.frame,
        }
    }

    /// Consume the pipeline and return the full [`StagedDetection`].
    #[must_use]
    pub fn into_result(self) -> StagedDetection {
        StagedDetection {
            dimensions: self.dimensions,
            polygons: self.polygons,
            simplified: self.simplified,
            regions: self.regions,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn block_mask() -> BinaryMask {
        BinaryMask::from_fn(5, 5, |x, y| (1..4).contains(&x) && (1..4).contains(&y))
    }

    #[test]
    fn pending_exposes_mask() {
        let pending = Detection::new(block_mask(), DetectorConfig::default());
        assert_eq!(pending.mask().width(), 5);
        assert_eq!(pending.mask().count_foreground(), 9);
    }

    #[test]
    fn trace_rejects_invalid_config() {
        let config = DetectorConfig {
            epsilon: -1.0,
            ..DetectorConfig::default()
        };
        let result = Detection::new(block_mask(), config).trace();
        assert!(matches!(result, Err(DetectError::InvalidConfig(_))));
    }

    #[test]
    fn traced_exposes_polygons_and_dimensions() {
        let traced = Detection::new(block_mask(), DetectorConfig::default())
            .trace()
            .unwrap();
        assert_eq!(traced.polygons().len(), 1);
        assert_eq!(
            traced.dimensions(),
            Dimensions {
                width: 5,
                height: 5,
            },
        );
        assert!(matches!(
            traced.metrics(),
            StageMetrics::Trace {
                polygon_count: 1,
                vertex_count: 4,
                ..
            },
        ));
    }

    #[test]
    fn empty_mask_traces_to_zero_polygons() {
        let traced = Detection::new(BinaryMask::new(4, 4), DetectorConfig::default())
            .trace()
            .unwrap();
        assert!(traced.polygons().is_empty());
    }

    #[test]
    fn simplified_exposes_contours_and_metrics() {
        let simplified = Detection::new(block_mask(), DetectorConfig::default())
            .trace()
            .unwrap()
            .simplify();
        assert_eq!(simplified.simplified().len(), 1);
        assert!(matches!(
            simplified.metrics(),
            StageMetrics::Simplify { points_before: 4, .. },
        ));
    }

    #[test]
    fn calibrated_exposes_regions_and_frame() {
        let calibrated = Detection::new(block_mask(), DetectorConfig::default())
            .trace()
            .unwrap()
            .simplify()
            .calibrate(3, |_| 0.9);
        assert_eq!(calibrated.regions().len(), 1);
        assert_eq!(calibrated.regions()[0].frame, 3);
        assert!(matches!(
            calibrated.metrics(),
            StageMetrics::Calibrate {
                region_count: 1,
                frame: 3,
            },
        ));
    }

    #[test]
    fn chained_pipeline_matches_one_shot_detect() {
        let mask = block_mask();
        let config = DetectorConfig::default();

        let staged = Detection::new(mask.clone(), config.clone())
            .trace()
            .unwrap()
            .simplify()
            .calibrate(1, |_| 0.5)
            .into_result();

        let one_shot = crate::detect_staged(&mask, &config, 1, |_| 0.5).unwrap();
        assert_eq!(staged, one_shot);
    }
}
