//! Contour simplification: uniform resampling followed by
//! Ramer-Douglas-Peucker reduction.
//!
//! Raw traced contours have one vertex per rasterization corner, so their
//! vertex density depends on how the shape happened to rasterize. The
//! resampling pass first redistributes vertices at a fixed spacing along
//! the closed boundary, making the tolerance-based reduction behave
//! consistently regardless of the source density. A non-positive
//! resampling interval skips that pass and reduces the raw vertices
//! directly.
//!
//! Distances in the reduction step are measured to the chord *segment*,
//! not the infinite line: points projecting beyond an endpoint use the
//! distance to that endpoint.

use crate::types::{Point, Polyline, RawPolygon};

/// Simplify one traced contour.
///
/// Resamples the closed boundary at approximately `resample_interval`
/// pixels per vertex (skipped when `resample_interval <= 0`), then
/// reduces the result with tolerance `epsilon`. The output is closed by
/// convention (wrap edge implied) and may degenerate to fewer than 3
/// points for near-zero-area inputs; callers must be prepared to filter
/// such results.
#[must_use = "returns the simplified contour"]
pub fn simplify(polygon: &RawPolygon, resample_interval: f64, epsilon: f64) -> Polyline {
    let raw: Vec<Point> = polygon.points().iter().map(|p| p.to_point()).collect();
    let points = if resample_interval > 0.0 {
        resample_closed(&raw, resample_interval)
    } else {
        raw
    };
    reduce(&points, epsilon)
}

/// Simplify multiple contours, applying [`simplify`] to each
/// independently.
#[must_use = "returns the simplified contours"]
pub fn simplify_polygons(
    polygons: &[RawPolygon],
    resample_interval: f64,
    epsilon: f64,
) -> Vec<Polyline> {
    polygons
        .iter()
        .map(|p| simplify(p, resample_interval, epsilon))
        .collect()
}

/// Redistribute vertices uniformly along a closed boundary.
///
/// The number of output vertices is the perimeter divided by `interval`,
/// rounded, so the actual spacing is as close to `interval` as an exact
/// closure allows. Inputs with fewer than 3 vertices are returned
/// unchanged.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn resample_closed(points: &[Point], interval: f64) -> Vec<Point> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }
    let edge = |i: usize| (points[i], points[(i + 1) % n]);
    let perimeter: f64 = (0..n)
        .map(|i| {
            let (a, b) = edge(i);
            a.distance(b)
        })
        .sum();
    if perimeter <= 0.0 {
        return points.to_vec();
    }

    let count = ((perimeter / interval).round().max(1.0)) as usize;
    let step = perimeter / count as f64;

    let mut out = Vec::with_capacity(count);
    let mut i = 0;
    let (mut a, mut b) = edge(0);
    let mut edge_start = 0.0;
    let mut edge_len = a.distance(b);
    for k in 0..count {
        let s = k as f64 * step;
        while s > edge_start + edge_len && i + 1 < n {
            i += 1;
            edge_start += edge_len;
            (a, b) = edge(i);
            edge_len = a.distance(b);
        }
        let t = if edge_len > 0.0 {
            (s - edge_start) / edge_len
        } else {
            0.0
        };
        out.push(lerp(a, b, t));
    }
    out
}

/// Reduce an open point sequence with the Ramer-Douglas-Peucker
/// algorithm. Endpoints are always kept; sequences with fewer than 3
/// points are returned unchanged.
fn reduce(points: &[Point], epsilon: f64) -> Polyline {
    if points.len() < 3 {
        return Polyline::new(points.to_vec());
    }

    let mut kept = vec![false; points.len()];
    kept[0] = true;
    kept[points.len() - 1] = true;

    rdp_recurse(points, 0, points.len() - 1, epsilon, &mut kept);

    let reduced: Vec<Point> = points
        .iter()
        .zip(&kept)
        .filter(|&(_, k)| *k)
        .map(|(&p, _)| p)
        .collect();

    Polyline::new(reduced)
}

/// Recursive step of the Ramer-Douglas-Peucker algorithm.
///
/// Finds the point between `start` and `end` farthest from the chord
/// segment between them (ties resolve to the first point in scan order).
/// If that distance exceeds `epsilon`, the point is kept and both
/// sub-ranges are processed recursively.
fn rdp_recurse(points: &[Point], start: usize, end: usize, epsilon: f64, kept: &mut [bool]) {
    if end <= start + 1 {
        return;
    }

    let mut max_dist = 0.0;
    let mut max_idx = start;

    for i in (start + 1)..end {
        let d = segment_distance(points[i], points[start], points[end]);
        if d > max_dist {
            max_dist = d;
            max_idx = i;
        }
    }

    if max_dist > epsilon {
        kept[max_idx] = true;
        rdp_recurse(points, start, max_idx, epsilon, kept);
        rdp_recurse(points, max_idx, end, epsilon, kept);
    }
}

/// Distance from point `p` to the segment `v`-`w`.
///
/// The projection parameter is clamped to `[0, 1]`, so points projecting
/// outside the segment measure to the nearest endpoint. When `v` and `w`
/// coincide, this is the distance to that point.
fn segment_distance(p: Point, v: Point, w: Point) -> f64 {
    let l2 = v.distance_squared(w);
    if l2 == 0.0 {
        return p.distance(v);
    }
    let t = ((p.x - v.x) * (w.x - v.x) + (p.y - v.y) * (w.y - v.y)) / l2;
    if t < 0.0 {
        p.distance(v)
    } else if t > 1.0 {
        p.distance(w)
    } else {
        p.distance(lerp(v, w, t))
    }
}

/// Linear interpolation between two points.
fn lerp(a: Point, b: Point, t: f64) -> Point {
    Point::new(t.mul_add(b.x - a.x, a.x), t.mul_add(b.y - a.y, a.y))
}
