//! Contour tracing: extract iso-level polylines from an intensity field.
//!
//! This module defines the [`ContourTracer`] trait for pluggable contour
//! tracing algorithms and the [`ContourTracerKind`] enum for selecting
//! which algorithm to use at runtime.
//!
//! # Marching squares
//!
//! Every 2x2 block of pixels is a cell. Corners strictly above the level
//! are "high". Each cell emits zero, one or two line segments whose end
//! points are linearly interpolated along the cell edges. Saddle cells
//! (two diagonal high corners) connect the low corners, so dark regions
//! touching only at a corner are traced as one.
//!
//! Segments are then stitched by matching end points exactly. A contour
//! that returns to its start is closed and repeats its first point at
//! the end; one that runs into the image border stays open. Contours are
//! returned in the order their first segment was found (row-major scan).
//!
//! Points use `x` for the column and `y` for the row.

use std::collections::{HashMap, VecDeque};

use crate::types::{IntensityImage, Point, Polyline};

/// Selects which contour tracing algorithm to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContourTracerKind {
    /// Marching squares with linear interpolation.
    #[default]
    MarchingSquares,
}

/// Trait for contour tracing strategies.
///
/// Input: an intensity field and an iso-level.
/// Output: every polyline along which the field crosses the level.
pub trait ContourTracer {
    /// Trace contours in the given field at `level`.
    fn trace(&self, field: &IntensityImage, level: f64) -> Vec<Polyline>;
}

impl ContourTracer for ContourTracerKind {
    fn trace(&self, field: &IntensityImage, level: f64) -> Vec<Polyline> {
        match *self {
            Self::MarchingSquares => marching_squares(field, level),
        }
    }
}

/// A directed segment between two cell-edge crossings.
type Segment = (Point, Point);

/// Hashable identity of a point. Matching is exact.
type PointKey = (u64, u64);

fn key(p: Point) -> PointKey {
    (p.x.to_bits(), p.y.to_bits())
}

fn marching_squares(field: &IntensityImage, level: f64) -> Vec<Polyline> {
    assemble(&cell_segments(field, level))
}

/// Fraction along an edge from `from` to `to` at which `level` is crossed.
#[allow(clippy::float_cmp)]
fn fraction(from: f64, to: f64, level: f64) -> f64 {
    if from == to {
        0.0
    } else {
        (level - from) / (to - from)
    }
}

/// Emit the segments of every cell, scanning rows top to bottom and
/// columns left to right.
fn cell_segments(field: &IntensityImage, level: f64) -> Vec<Segment> {
    let (width, height) = field.dimensions();
    let value = |col: u32, row: u32| field.get_pixel(col, row).0[0];
    let mut segments = Vec::new();

    for r0 in 0..height.saturating_sub(1) {
        let r1 = r0 + 1;
        for c0 in 0..width.saturating_sub(1) {
            let c1 = c0 + 1;
            let ul = value(c0, r0);
            let ur = value(c1, r0);
            let ll = value(c0, r1);
            let lr = value(c1, r1);

            if [ul, ur, ll, lr].iter().any(|v| v.is_nan()) {
                continue;
            }

            let case = u8::from(ul > level)
                | (u8::from(ur > level) << 1)
                | (u8::from(ll > level) << 2)
                | (u8::from(lr > level) << 3);
            if case == 0 || case == 15 {
                continue;
            }

            let (fr0, fr1, fc0, fc1) = (f64::from(r0), f64::from(r1), f64::from(c0), f64::from(c1));
            let top = Point::new(fc0 + fraction(ul, ur, level), fr0);
            let bottom = Point::new(fc0 + fraction(ll, lr, level), fr1);
            let left = Point::new(fc0, fr0 + fraction(ul, ll, level));
            let right = Point::new(fc1, fr0 + fraction(ur, lr, level));

            match case {
                1 => segments.push((top, left)),
                2 => segments.push((right, top)),
                3 => segments.push((right, left)),
                4 => segments.push((left, bottom)),
                5 => segments.push((top, bottom)),
                6 => {
                    segments.push((right, top));
                    segments.push((left, bottom));
                }
                7 => segments.push((right, bottom)),
                8 => segments.push((bottom, right)),
                9 => {
                    segments.push((top, left));
                    segments.push((bottom, right));
                }
                10 => segments.push((bottom, top)),
                11 => segments.push((bottom, left)),
                12 => segments.push((left, right)),
                13 => segments.push((top, right)),
                14 => segments.push((left, top)),
                _ => {}
            }
        }
    }

    segments
}

/// Stitch directed segments into polylines.
///
/// `starts` maps the first point of each open contour to its slot and
/// `ends` the last point. A segment extends the contour ending at its
/// start and/or the one starting at its end; when it joins two different
/// contours the older one absorbs the newer one so output order follows
/// discovery order.
fn assemble(segments: &[Segment]) -> Vec<Polyline> {
    let mut contours: Vec<Option<VecDeque<Point>>> = Vec::new();
    let mut starts: HashMap<PointKey, usize> = HashMap::new();
    let mut ends: HashMap<PointKey, usize> = HashMap::new();

    for &(from, to) in segments {
        if key(from) == key(to) {
            continue;
        }

        let tail = starts.remove(&key(to));
        let head = ends.remove(&key(from));

        match (tail, head) {
            (Some(tail), Some(head)) if tail == head => {
                // Closing a loop.
                if let Some(contour) = contours[head].as_mut() {
                    contour.push_back(to);
                }
            }
            (Some(tail), Some(head)) if tail > head => {
                // Tail is newer: append it to head.
                let Some(tail_points) = contours[tail].take() else {
                    continue;
                };
                if let Some(contour) = contours[head].as_mut() {
                    contour.extend(tail_points);
                    register(contour, head, &mut starts, &mut ends);
                }
            }
            (Some(tail), Some(head)) => {
                // Head is newer: prepend it to tail.
                let Some(head_points) = contours[head].take() else {
                    continue;
                };
                if let Some(first) = head_points.front() {
                    starts.remove(&key(*first));
                }
                if let Some(contour) = contours[tail].as_mut() {
                    for p in head_points.into_iter().rev() {
                        contour.push_front(p);
                    }
                    register(contour, tail, &mut starts, &mut ends);
                }
            }
            (None, None) => {
                let id = contours.len();
                contours.push(Some(VecDeque::from([from, to])));
                starts.insert(key(from), id);
                ends.insert(key(to), id);
            }
            (Some(tail), None) => {
                if let Some(contour) = contours[tail].as_mut() {
                    contour.push_front(from);
                }
                starts.insert(key(from), tail);
            }
            (None, Some(head)) => {
                if let Some(contour) = contours[head].as_mut() {
                    contour.push_back(to);
                }
                ends.insert(key(to), head);
            }
        }
    }

    contours
        .into_iter()
        .flatten()
        .map(|points| Polyline::new(points.into()))
        .collect()
}

fn register(
    contour: &VecDeque<Point>,
    id: usize,
    starts: &mut HashMap<PointKey, usize>,
    ends: &mut HashMap<PointKey, usize>,
) {
    if let (Some(&first), Some(&last)) = (contour.front(), contour.back()) {
        starts.insert(key(first), id);
        ends.insert(key(last), id);
    }
}
