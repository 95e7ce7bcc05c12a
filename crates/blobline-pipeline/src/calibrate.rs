//! Coordinate remapping: pixel space into calibrated physical space.
//!
//! Traced and simplified contours are in pixel coordinates relative to
//! the cropped frame the mask was cut from. The remapper shifts each
//! vertex by the crop origin and scales by the physical pixel size:
//! `physical_d = calibration[d] * (origin[d] + v_d)`. It is a pure linear
//! transform with no clamping or rounding beyond native floating-point
//! precision.
//!
//! Region quality is not computed here: the caller supplies an oracle
//! (typically the maximum probability inside the contour) and the value
//! is carried through opaquely.

use crate::types::{DetectorConfig, Point, Polyline, Region};

/// Map a pixel-space contour into physical coordinates.
#[must_use = "returns the remapped vertices"]
#[allow(clippy::cast_precision_loss)]
pub fn remap(polyline: &Polyline, calibration: [f64; 2], origin: [i64; 2]) -> Vec<Point> {
    polyline
        .points()
        .iter()
        .map(|p| {
            Point::new(
                calibration[0] * (origin[0] as f64 + p.x),
                calibration[1] * (origin[1] as f64 + p.y),
            )
        })
        .collect()
}

/// Assemble one [`Region`] per simplified contour: remap the boundary,
/// query the caller's quality oracle, and tag with the frame index.
#[must_use = "returns the calibrated regions"]
pub fn calibrate_regions<F>(
    simplified: &[Polyline],
    config: &DetectorConfig,
    frame: usize,
    mut quality: F,
) -> Vec<Region>
where
    F: FnMut(&Polyline) -> f64,
{
    simplified
        .iter()
        .map(|contour| Region {
            boundary: remap(contour, config.calibration, config.origin),
            quality: quality(contour),
            frame,
        })
        .collect()
}
