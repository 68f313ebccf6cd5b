//! Shared types for the sketchshape pipeline.

use serde::{Deserialize, Serialize};

use crate::grayscale::ClassifyError;
use crate::render::RenderError;
use crate::table::TableError;
use crate::transform::TransformKind;

/// Re-export `RgbaImage` so downstream crates can reference rendered
/// rasters without depending on `image` directly.
pub use image::RgbaImage;

/// Single-channel intensity field normalized to `[0, 1]`.
///
/// This is what the contour tracer consumes: `0.0` is black, `1.0` is
/// white. Samples are `f64` so that 8-bit levels such as `204 / 255`
/// compare exactly against an iso-level like `0.8`.
pub type IntensityImage = image::ImageBuffer<image::Luma<f64>, Vec<f64>>;

/// A 2D point.
///
/// For table data this is in the table's own coordinate space. For
/// contours `x` is the raster column and `y` the raster row.
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

    /// Returns `true` if both coordinates are finite.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// An ordered sequence of connected points.
///
/// Used both for subpath geometry and for traced contours. A closed
/// contour repeats its first point at the end.
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

    /// Returns `true` if the polyline has at least two points and its
    /// last point equals its first.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.0.len() >= 2 && self.first() == self.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }
}

/// One `(path_id, subpath_id)` group of a curve table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subpath {
    /// The `subpath_id` shared by every row of this group.
    pub id: f64,
    /// Points in original row order.
    pub polyline: Polyline,
}

impl Subpath {
    /// Create a new subpath.
    #[must_use]
    pub const fn new(id: f64, polyline: Polyline) -> Self {
        Self { id, polyline }
    }

    /// Points of this subpath.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        self.polyline.points()
    }
}

/// All subpaths sharing one `path_id`, ordered by ascending `subpath_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    /// The `path_id` shared by every row of this path.
    pub id: f64,
    /// Subpaths in ascending `subpath_id` order.
    pub subpaths: Vec<Subpath>,
}

impl Path {
    /// Create a new path.
    #[must_use]
    pub const fn new(id: f64, subpaths: Vec<Subpath>) -> Self {
        Self { id, subpaths }
    }

    /// Iterate over every point of every subpath.
    pub fn points(&self) -> impl Iterator<Item = &Point> {
        self.subpaths.iter().flat_map(Subpath::points)
    }
}

/// Rendering parameters for the transform-and-draw stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Width and height of the square output raster in pixels.
    pub size: u32,

    /// Blank border kept around the drawing on every side, in pixels.
    pub margin: u32,

    /// Stroke width for line strips, in pixels.
    pub line_width: f32,

    /// Point transforms, applied in order to every point before drawing.
    pub transforms: Vec<TransformKind>,
}

impl RenderConfig {
    /// Default raster size (an 8 inch figure at 100 dpi).
    pub const DEFAULT_SIZE: u32 = 800;

    /// Default border around the drawing.
    pub const DEFAULT_MARGIN: u32 = 40;

    /// Default stroke width: 2 points at 100 dpi.
    pub const DEFAULT_LINE_WIDTH: f32 = 2.0 * 100.0 / 72.0;

    /// Largest accepted raster side length.
    pub const MAX_SIZE: u32 = 8192;
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            size: Self::DEFAULT_SIZE,
            margin: Self::DEFAULT_MARGIN,
            line_width: Self::DEFAULT_LINE_WIDTH,
            transforms: TransformKind::STANDARD.to_vec(),
        }
    }
}

/// Parameters for contour extraction and shape bucketing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Iso-level on the `[0, 1]` intensity scale at which contours are
    /// traced.
    pub level: f64,

    /// Polygon approximation tolerance in raster units.
    pub tolerance: f64,
}

impl ClassifierConfig {
    /// Default iso-level.
    pub const DEFAULT_LEVEL: f64 = 0.8;

    /// Default polygon approximation tolerance.
    pub const DEFAULT_TOLERANCE: f64 = 2.5;
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            level: Self::DEFAULT_LEVEL,
            tolerance: Self::DEFAULT_TOLERANCE,
        }
    }
}

/// Configuration for every entry point of the pipeline.
///
/// Defaults reproduce the fixed constants of the classification
/// heuristic and the standard mirror-then-rotate orientation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Transform and rasterization parameters.
    pub render: RenderConfig,
    /// Contour and classification parameters.
    pub classifier: ClassifierConfig,
}

impl PipelineConfig {
    /// Check the configuration for values no stage can work with.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] describing the first
    /// offending field.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let render = &self.render;
        if render.size > RenderConfig::MAX_SIZE {
            return Err(PipelineError::InvalidConfig(format!(
                "render.size ({}) must not exceed {}",
                render.size,
                RenderConfig::MAX_SIZE,
            )));
        }
        if render.size <= render.margin.saturating_mul(2) {
            return Err(PipelineError::InvalidConfig(format!(
                "render.size ({}) must exceed twice render.margin ({})",
                render.size, render.margin,
            )));
        }
        if !render.line_width.is_finite() || render.line_width <= 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "render.line_width must be positive and finite, got {}",
                render.line_width,
            )));
        }

        let classifier = &self.classifier;
        if !(0.0..=1.0).contains(&classifier.level) {
            return Err(PipelineError::InvalidConfig(format!(
                "classifier.level must be within [0, 1], got {}",
                classifier.level,
            )));
        }
        if !classifier.tolerance.is_finite() || classifier.tolerance < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "classifier.tolerance must be non-negative and finite, got {}",
                classifier.tolerance,
            )));
        }
        Ok(())
    }
}

/// Errors surfaced by the pipeline entry points.
///
/// Every variant is a client-side processing failure: the request is
/// rejected and the message is safe to show to the user.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The curve table could not be decoded.
    #[error("malformed table: {0}")]
    MalformedTable(#[from] TableError),

    /// The paths could not be drawn.
    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    /// The supplied bytes are not a usable raster.
    #[error("invalid classification input: {0}")]
    ClassificationInput(#[from] ClassifyError),

    /// Configuration values out of range.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}
