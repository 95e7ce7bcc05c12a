//! blobline-pipeline: mask-to-region detection core (sans-IO).
//!
//! Converts a thresholded probability mask into calibrated detected
//! regions through: contour tracing -> resampling + simplification ->
//! coordinate calibration.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! rasters and returns structured data. Running an external classifier,
//! reading its project files, and displaying results all live outside
//! this crate; its only collaborators are the [`BinaryMask`] it
//! receives, the quality oracle closure it calls back, and the
//! calibration parameters in [`DetectorConfig`].
//!
//! One call processes exactly one 2D frame to completion: no suspension
//! points, no blocking, no shared state. Frames are independent, so
//! callers may run any number of [`detect`] invocations concurrently on
//! their own masks without locking.

pub mod calibrate;
pub mod contour;
pub mod diagnostics;
pub mod mask;
mod outline;
pub mod pipeline;
pub mod simplify;
pub mod types;

pub use contour::trace;
pub use mask::{BinaryMask, ProbabilityMap};
pub use pipeline::Detection;
pub use types::{
    DetectError, DetectorConfig, Dimensions, GridPoint, Point, Polyline, RawPolygon, Region,
    StagedDetection,
};

/// Run the full detection pipeline on one frame's mask.
///
/// Traces the outer boundary of every foreground blob, simplifies each
/// contour per the config's resampling interval and tolerance, remaps
/// the result into physical coordinates, and tags each region with the
/// quality value returned by `quality` (called once per pixel-space
/// contour) and the given frame index.
///
/// A mask with no foreground produces an empty list; degenerate regions
/// (boundaries that simplified below 3 vertices) are emitted as-is and
/// left for the caller to filter.
///
/// # Errors
///
/// Returns [`DetectError::InvalidConfig`] if the configuration is out of
/// range. See [`DetectorConfig::validate`].
pub fn detect<F>(
    mask: &BinaryMask,
    config: &DetectorConfig,
    frame: usize,
    quality: F,
) -> Result<Vec<Region>, DetectError>
where
    F: FnMut(&Polyline) -> f64,
{
    config.validate()?;
    let polygons = contour::trace(mask);
    let simplified =
        simplify::simplify_polygons(&polygons, config.resample_interval, config.epsilon);
    Ok(calibrate::calibrate_regions(
        &simplified,
        config,
        frame,
        quality,
    ))
}

/// Run the full detection pipeline, preserving every intermediate stage
/// output.
///
/// Same processing as [`detect`], but the returned [`StagedDetection`]
/// also carries the raw traced polygons and the simplified pixel-space
/// contours, for inspection or display.
///
/// # Errors
///
/// Returns [`DetectError::InvalidConfig`] if the configuration is out of
/// range.
pub fn detect_staged<F>(
    mask: &BinaryMask,
    config: &DetectorConfig,
    frame: usize,
    quality: F,
) -> Result<StagedDetection, DetectError>
where
    F: FnMut(&Polyline) -> f64,
{
    config.validate()?;
    let dimensions = Dimensions {
        width: mask.width(),
        height: mask.height(),
    };
    let polygons = contour::trace(mask);
    let simplified =
        simplify::simplify_polygons(&polygons, config.resample_interval, config.epsilon);
    let regions = calibrate::calibrate_regions(&simplified, config, frame, quality);
    Ok(StagedDetection {
        dimensions,
        polygons,
        simplified,
        regions,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn detect_empty_mask_returns_no_regions() {
        let mask = BinaryMask::new(8, 8);
        let regions = detect(&mask, &DetectorConfig::default(), 0, |_| 1.0).unwrap();
        assert!(regions.is_empty());
    }

    #[test]
    fn detect_rejects_invalid_config() {
        let mask = BinaryMask::new(8, 8);
        let config = DetectorConfig {
            epsilon: f64::NAN,
            ..DetectorConfig::default()
        };
        let result = detect(&mask, &config, 0, |_| 1.0);
        assert!(matches!(result, Err(DetectError::InvalidConfig(_))));
    }

    #[test]
    fn detect_single_block_yields_one_region() {
        let mask = BinaryMask::from_fn(5, 5, |x, y| (1..4).contains(&x) && (1..4).contains(&y));
        // Resampling disabled so the boundary stays on the pixel grid.
        let config = DetectorConfig {
            resample_interval: 0.0,
            ..DetectorConfig::default()
        };
        let regions = detect(&mask, &config, 9, |_| 0.75).unwrap();
        assert_eq!(regions.len(), 1);
        let region = &regions[0];
        assert_eq!(region.frame, 9);
        assert!((region.quality - 0.75).abs() < f64::EPSILON);
        assert_eq!(region.boundary.len(), 4);

        let mut coords: Vec<(i64, i64)> = region
            .boundary
            .iter()
            .map(|p| (p.x.round() as i64, p.y.round() as i64))
            .collect();
        coords.sort_unstable();
        assert_eq!(coords, vec![(1, 1), (1, 4), (4, 1), (4, 4)]);
    }

    #[test]
    fn detect_applies_calibration_and_origin() {
        let mask = BinaryMask::from_fn(3, 3, |x, y| x == 1 && y == 1);
        let config = DetectorConfig {
            resample_interval: 0.0,
            calibration: [0.5, 0.25],
            origin: [100, 200],
            ..DetectorConfig::default()
        };
        let regions = detect(&mask, &config, 0, |_| 1.0).unwrap();
        assert_eq!(regions.len(), 1);
        for p in &regions[0].boundary {
            // Vertices of the unit square around pixel (1, 1), shifted
            // by the origin and scaled per axis.
            assert!(p.x >= 0.5 * 101.0 && p.x <= 0.5 * 102.0, "x = {}", p.x);
            assert!(p.y >= 0.25 * 201.0 && p.y <= 0.25 * 202.0, "y = {}", p.y);
        }
    }

    #[test]
    fn quality_oracle_runs_once_per_contour() {
        let mut mask = BinaryMask::new(10, 10);
        for (bx, by) in [(1_u32, 1_u32), (6, 6)] {
            for dy in 0..2 {
                for dx in 0..2 {
                    mask.set(bx + dx, by + dy, true);
                }
            }
        }
        let mut calls = 0;
        let regions = detect(&mask, &DetectorConfig::default(), 0, |_| {
            calls += 1;
            f64::from(calls)
        })
        .unwrap();
        assert_eq!(calls, 2);
        assert_eq!(regions.len(), 2);
        assert!((regions[0].quality - 1.0).abs() < f64::EPSILON);
        assert!((regions[1].quality - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn detect_staged_preserves_intermediates() {
        let mask = BinaryMask::from_fn(5, 5, |x, y| (1..4).contains(&x) && (1..4).contains(&y));
        let staged = detect_staged(&mask, &DetectorConfig::default(), 2, |_| 1.0).unwrap();
        assert_eq!(
            staged.dimensions,
            Dimensions {
                width: 5,
                height: 5,
            },
        );
        assert_eq!(staged.polygons.len(), 1);
        assert_eq!(staged.simplified.len(), 1);
        assert_eq!(staged.regions.len(), 1);
    }

    #[test]
    fn detect_staged_matches_detect() {
        let mask = BinaryMask::from_fn(12, 12, |x, y| (x * 7 + y * 3) % 5 < 2);
        let config = DetectorConfig::default();
        let regions = detect(&mask, &config, 5, |c| c.len() as f64).unwrap();
        let staged = detect_staged(&mask, &config, 5, |c| c.len() as f64).unwrap();
        assert_eq!(regions, staged.regions);
    }
}
