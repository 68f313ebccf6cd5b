//! Shape bucketing by approximated vertex count.
//!
//! Each contour is reduced with
//! [`approximate_polygon`](crate::simplify::approximate_polygon) and placed in
//! one of three buckets purely by how many points survive:
//!
//! | vertices | category    |
//! |----------|-------------|
//! | 4        | `rectangle` |
//! | > 4      | `circle`    |
//! | <= 3     | `triangle`  |
//!
//! This is a coarse heuristic. A closed contour keeps its repeated end
//! point, so a clean closed square usually lands in `circle`; thin
//! quadrilaterals and rounded rectangles are indistinguishable; and
//! contours that collapse to two points or fewer still count as
//! `triangle`. The per-image result is a set, so repeated shapes
//! collapse to one entry.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::contour::{ContourTracer, ContourTracerKind};
use crate::simplify::approximate_polygons;
use crate::types::{ClassifierConfig, IntensityImage, Polyline};

/// The three shape buckets. There is no "unknown".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeCategory {
    /// Three or fewer approximated vertices.
    Triangle,
    /// Exactly four approximated vertices.
    Rectangle,
    /// More than four approximated vertices.
    Circle,
}

impl ShapeCategory {
    /// Bucket a polygon by its vertex count.
    #[must_use]
    pub const fn from_vertex_count(count: usize) -> Self {
        match count {
            4 => Self::Rectangle,
            n if n > 4 => Self::Circle,
            _ => Self::Triangle,
        }
    }

    /// Lowercase name, as shown to users.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Triangle => "triangle",
            Self::Rectangle => "rectangle",
            Self::Circle => "circle",
        }
    }
}

impl fmt::Display for ShapeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The distinct shape categories found in one image.
///
/// Iteration order is `triangle`, `rectangle`, `circle`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeSet(BTreeSet<ShapeCategory>);

impl ShapeSet {
    /// An empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Whether `category` was observed.
    #[must_use]
    pub fn contains(&self, category: ShapeCategory) -> bool {
        self.0.contains(&category)
    }

    /// Number of distinct categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no contour was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the categories in order.
    pub fn iter(&self) -> impl Iterator<Item = ShapeCategory> + '_ {
        self.0.iter().copied()
    }

    /// Category names as owned strings.
    #[must_use]
    pub fn to_strings(&self) -> Vec<String> {
        self.iter().map(|c| c.as_str().to_owned()).collect()
    }
}

impl FromIterator<ShapeCategory> for ShapeSet {
    fn from_iter<I: IntoIterator<Item = ShapeCategory>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Comma-separated names, e.g. `triangle, circle`.
impl fmt::Display for ShapeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, category) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(category.as_str())?;
        }
        Ok(())
    }
}

/// Categorize every contour, one entry per contour, in contour order.
///
/// This keeps per-contour detail that [`classify`] folds away.
#[must_use]
pub fn classify_contours(contours: &[Polyline], tolerance: f64) -> Vec<ShapeCategory> {
    approximate_polygons(contours, tolerance)
        .iter()
        .map(|approx| ShapeCategory::from_vertex_count(approx.len()))
        .collect()
}

/// Trace, approximate and bucket every contour of `field`, returning
/// the set of categories seen. An image without contours yields an
/// empty set.
#[must_use]
pub fn classify(field: &IntensityImage, config: &ClassifierConfig) -> ShapeSet {
    let contours = ContourTracerKind::default().trace(field, config.level);
    let categories = classify_contours(&contours, config.tolerance);
    debug!(
        width = field.width(),
        height = field.height(),
        contours = contours.len(),
        "classified contours"
    );
    categories.into_iter().collect()
}
