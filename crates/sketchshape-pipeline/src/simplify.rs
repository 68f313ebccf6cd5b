//! Polygon approximation of contours (Douglas-Peucker).
//!
//! Reduces a contour to the points that deviate from the chord between
//! their neighbours by more than a tolerance. Only the resulting vertex
//! count is used downstream, by [`crate::classify`].
//!
//! Distance to a chord is the perpendicular distance when the point
//! projects strictly inside the chord, and the distance to the nearer
//! chord end otherwise. For a closed contour the first chord starts and
//! ends at the same point, so the first split lands on the point
//! farthest from it. Both ends are always kept, which means a closed
//! contour keeps its repeated end point.

use crate::types::{Point, Polyline};

/// Approximate a single polyline within `tolerance`.
///
/// A tolerance of zero or less returns the polyline unchanged.
/// Polylines with fewer than 3 points are returned unchanged.
#[must_use = "returns the approximated polyline"]
pub fn approximate_polygon(polyline: &Polyline, tolerance: f64) -> Polyline {
    let points = polyline.points();
    if tolerance <= 0.0 || points.len() < 3 {
        return polyline.clone();
    }

    let last = points.len() - 1;
    let mut kept = vec![false; points.len()];
    kept[0] = true;
    kept[last] = true;

    // Explicit stack: contours from large rasters run to thousands of points.
    let mut pending = vec![(0, last)];
    while let Some((start, end)) = pending.pop() {
        if end <= start + 1 {
            continue;
        }

        let mut max_dist = 0.0;
        let mut max_idx = start;
        for (i, &p) in points.iter().enumerate().take(end).skip(start + 1) {
            let d = chord_distance(p, points[start], points[end]);
            if d > max_dist {
                max_dist = d;
                max_idx = i;
            }
        }

        if max_dist > tolerance {
            kept[max_idx] = true;
            pending.push((max_idx, end));
            pending.push((start, max_idx));
        }
    }

    let approximated: Vec<Point> = points
        .iter()
        .zip(&kept)
        .filter(|&(_, k)| *k)
        .map(|(&p, _)| p)
        .collect();

    Polyline::new(approximated)
}

/// Approximate multiple polylines, each independently.
#[must_use = "returns the approximated polylines"]
pub fn approximate_polygons(polylines: &[Polyline], tolerance: f64) -> Vec<Polyline> {
    polylines
        .iter()
        .map(|pl| approximate_polygon(pl, tolerance))
        .collect()
}

/// Distance from `p` to the chord `a`-`b`.
///
/// Perpendicular distance to the line when `p` projects strictly between
/// `a` and `b`; otherwise the distance to the nearer of `a` and `b`.
fn chord_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;

    let along_from_a = (p.x - a.x).mul_add(dx, (p.y - a.y) * dy);
    let along_from_b = -(p.x - b.x).mul_add(dx, (p.y - b.y) * dy);

    if along_from_a > 0.0 && along_from_b > 0.0 {
        // Projection is inside the chord, so it has non-zero length.
        let cross = dx.mul_add(a.y - p.y, -(dy * (a.x - p.x)));
        cross.abs() / dx.hypot(dy)
    } else {
        p.distance(a).min(p.distance(b))
    }
}
