//! Transform and rasterize paths as colored line strips.
//!
//! Every point first goes through the configured
//! [`TransformPipeline`]. The transformed geometry is then fitted into a
//! square canvas with equal scale on both axes, `y` pointing up, and a
//! blank margin on every side. Each subpath is stroked as an open line
//! strip with no fill, colored by its path's index in [`PALETTE`].
//!
//! Each call creates and drops its own `tiny-skia` canvas; nothing is
//! shared between calls.

use image::ImageEncoder;
use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};
use tracing::{debug, warn};

use crate::transform::TransformPipeline;
use crate::types::{Path, Point, RenderConfig, RgbaImage};

/// Stroke colors, cycled by path index.
///
/// Blue, green, red, cyan, magenta, yellow, black.
pub const PALETTE: [[u8; 3]; 7] = [
    [0, 0, 255],
    [0, 128, 0],
    [255, 0, 0],
    [0, 191, 191],
    [191, 0, 191],
    [191, 191, 0],
    [0, 0, 0],
];

/// Color of the path at `index`.
#[must_use]
pub const fn path_color(index: usize) -> [u8; 3] {
    PALETTE[index % PALETTE.len()]
}

/// Paths that cannot be turned into an image.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// No subpath has two or more points, so there is no line to draw.
    #[error("nothing to draw: no subpath has at least two points")]
    NothingToDraw,

    /// The extent is zero or too extreme to map onto the canvas.
    #[error("degenerate geometry: extent cannot be scaled to the canvas")]
    DegenerateExtent,

    /// Every drawable subpath collapsed, so the canvas stayed blank.
    #[error("nothing drawn: every line strip collapsed")]
    NothingDrawn,

    /// A coordinate is NaN or infinite.
    #[error("non-finite coordinate in path {path_index}")]
    NonFiniteCoordinate {
        /// Index of the offending path in output order.
        path_index: usize,
    },

    /// The canvas could not be allocated.
    #[error("cannot allocate a {size}x{size} canvas")]
    Canvas {
        /// Requested side length in pixels.
        size: u32,
    },

    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    PngEncode(#[from] image::ImageError),
}

/// Uniform mapping from geometry coordinates to canvas pixels.
///
/// `y` is flipped so that larger values are drawn higher up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    scale: f64,
    offset_x: f64,
    offset_y: f64,
    max_y: f64,
    min_x: f64,
    size: u32,
}

impl Viewport {
    /// Fit the drawable geometry of `paths` into a `size` canvas with
    /// `margin` pixels of border.
    ///
    /// Only subpaths with at least two points count toward the extent.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NonFiniteCoordinate`] if any point is not
    /// finite, [`RenderError::NothingToDraw`] if there is no subpath to
    /// stroke, and [`RenderError::DegenerateExtent`] if every drawable
    /// point is the same or the extent overflows or underflows the scale.
    pub fn fit(paths: &[Path], size: u32, margin: u32) -> Result<Self, RenderError> {
        let mut bounds: Option<(f64, f64, f64, f64)> = None;

        for (path_index, path) in paths.iter().enumerate() {
            if path.points().any(|p| !p.is_finite()) {
                return Err(RenderError::NonFiniteCoordinate { path_index });
            }
            for p in path
                .subpaths
                .iter()
                .filter(|s| s.points().len() >= 2)
                .flat_map(|s| s.points())
            {
                let (min_x, min_y, max_x, max_y) = bounds.get_or_insert((p.x, p.y, p.x, p.y));
                *min_x = min_x.min(p.x);
                *min_y = min_y.min(p.y);
                *max_x = max_x.max(p.x);
                *max_y = max_y.max(p.y);
            }
        }

        let (min_x, min_y, max_x, max_y) = bounds.ok_or(RenderError::NothingToDraw)?;
        let span_x = max_x - min_x;
        let span_y = max_y - min_y;
        let span = span_x.max(span_y);
        if span <= 0.0 {
            return Err(RenderError::DegenerateExtent);
        }

        let inner = f64::from(size) - 2.0 * f64::from(margin);
        let scale = inner / span;
        let offset_x = f64::from(margin) + span_x.mul_add(-scale, inner) / 2.0;
        let offset_y = f64::from(margin) + span_y.mul_add(-scale, inner) / 2.0;
        if !(scale.is_finite() && scale > 0.0 && offset_x.is_finite() && offset_y.is_finite()) {
            return Err(RenderError::DegenerateExtent);
        }
        Ok(Self {
            scale,
            offset_x,
            offset_y,
            max_y,
            min_x,
            size,
        })
    }

    /// Canvas side length in pixels.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Pixels per geometry unit, equal on both axes.
    #[must_use]
    pub const fn scale(&self) -> f64 {
        self.scale
    }

    /// Map a geometry point to canvas pixel coordinates.
    #[must_use]
    pub fn project(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.min_x).mul_add(self.scale, self.offset_x),
            (self.max_y - p.y).mul_add(self.scale, self.offset_y),
        )
    }
}

/// Transform `paths` and draw them onto a fresh white canvas.
///
/// # Errors
///
/// Returns [`RenderError`] if there is nothing drawable, no strip
/// survives projection, or the canvas cannot be created.
#[allow(clippy::cast_possible_truncation)]
pub fn render(paths: &[Path], config: &RenderConfig) -> Result<RgbaImage, RenderError> {
    let transformed = TransformPipeline::new(config.transforms.clone()).apply_paths(paths);
    let viewport = Viewport::fit(&transformed, config.size, config.margin)?;
    debug!(
        paths = transformed.len(),
        scale = viewport.scale(),
        size = config.size,
        "rendering paths"
    );

    let mut pixmap = Pixmap::new(config.size, config.size)
        .ok_or(RenderError::Canvas { size: config.size })?;
    pixmap.fill(tiny_skia::Color::WHITE);

    let stroke = Stroke {
        width: config.line_width,
        line_cap: LineCap::Square,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };

    let mut stroked = 0_usize;
    for (index, path) in transformed.iter().enumerate() {
        let [r, g, b] = path_color(index);
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, 255);
        paint.anti_alias = true;

        for subpath in &path.subpaths {
            let points = subpath.points();
            let Some((first, rest)) = points.split_first() else {
                continue;
            };
            if rest.is_empty() {
                warn!(path = index, "skipping single-point subpath");
                continue;
            }

            let mut pb = PathBuilder::new();
            let start = viewport.project(*first);
            pb.move_to(start.x as f32, start.y as f32);
            for &p in rest {
                let q = viewport.project(p);
                pb.line_to(q.x as f32, q.y as f32);
            }
            // Zero-length strips have no bounds; tiny-skia refuses them.
            if let Some(line) = pb.finish() {
                pixmap.stroke_path(&line, &paint, &stroke, Transform::identity(), None);
                stroked += 1;
            }
        }
    }
    if stroked == 0 {
        return Err(RenderError::NothingDrawn);
    }

    // The canvas is opaque, so premultiplied and straight RGBA agree.
    let pixels = pixmap.data().to_vec();
    RgbaImage::from_raw(config.size, config.size, pixels)
        .ok_or(RenderError::Canvas { size: config.size })
}

/// Transform, draw and encode `paths` as PNG bytes.
///
/// # Errors
///
/// Returns [`RenderError`] if drawing or encoding fails.
pub fn render_png(paths: &[Path], config: &RenderConfig) -> Result<Vec<u8>, RenderError> {
    let image = render(paths, config)?;
    encode_png(&image)
}

/// Encode an RGBA image as PNG bytes in memory.
///
/// # Errors
///
/// Returns [`RenderError::PngEncode`] if the encoder fails.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, RenderError> {
    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(png_bytes)
}
