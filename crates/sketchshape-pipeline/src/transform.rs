//! Point transforms applied to table geometry before drawing.
//!
//! This module defines the [`PointTransform`] trait and the
//! [`TransformKind`] enum so the orientation stages can be chosen from
//! configuration, plus [`TransformPipeline`] which applies an ordered
//! list of them to every point of every subpath.
//!
//! The standard pipeline is mirror followed by a 180 degree rotation.
//! Composed, the two stages leave `x` unchanged and negate `y`; see
//! [`flip_vertical`].

use serde::{Deserialize, Serialize};

use crate::types::{Path, Point, Polyline, Subpath};

/// A single orientation stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    /// Mirror horizontally: `(x, y) -> (-x, y)`.
    Mirror,
    /// Rotate by 180 degrees about the origin: `(x, y) -> (-x, -y)`.
    Rotate180,
}

impl TransformKind {
    /// Mirror, then rotate 180 degrees.
    pub const STANDARD: [Self; 2] = [Self::Mirror, Self::Rotate180];
}

/// Trait for point transforms.
pub trait PointTransform {
    /// Transform one point.
    fn apply(&self, point: Point) -> Point;
}

impl PointTransform for TransformKind {
    fn apply(&self, point: Point) -> Point {
        match *self {
            Self::Mirror => Point::new(-point.x, point.y),
            Self::Rotate180 => Point::new(-point.x, -point.y),
        }
    }
}

/// Net effect of the standard pipeline: keep `x`, negate `y`.
#[must_use]
pub const fn flip_vertical(point: Point) -> Point {
    Point::new(point.x, -point.y)
}

/// An ordered list of transforms applied to every point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformPipeline {
    stages: Vec<TransformKind>,
}

impl Default for TransformPipeline {
    fn default() -> Self {
        Self::new(TransformKind::STANDARD.to_vec())
    }
}

impl TransformPipeline {
    /// Create a pipeline from stages, applied first to last.
    #[must_use]
    pub const fn new(stages: Vec<TransformKind>) -> Self {
        Self { stages }
    }

    /// Transform one point through every stage in order.
    #[must_use]
    pub fn apply_point(&self, point: Point) -> Point {
        self.stages.iter().fold(point, |p, stage| stage.apply(p))
    }

    /// Transform every point of every subpath.
    ///
    /// Path and subpath structure, ids and ordering are preserved.
    #[must_use = "returns the transformed paths"]
    pub fn apply_paths(&self, paths: &[Path]) -> Vec<Path> {
        paths
            .iter()
            .map(|path| {
                let subpaths = path
                    .subpaths
                    .iter()
                    .map(|sub| {
                        let points = sub.points().iter().map(|&p| self.apply_point(p)).collect();
                        Subpath::new(sub.id, Polyline::new(points))
                    })
                    .collect();
                Path::new(path.id, subpaths)
            })
            .collect()
    }
}
