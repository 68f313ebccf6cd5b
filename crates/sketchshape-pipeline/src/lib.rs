//! sketchshape-pipeline: Curve table rendering and coarse shape
//! classification (sans-IO).
//!
//! Two flows share this crate:
//!
//! - **table -> raster**: decode a numeric curve table, group rows into
//!   paths and subpaths, apply the orientation transforms and draw each
//!   subpath as a colored line strip on a fixed-size canvas.
//! - **raster -> shapes**: trace iso-level contours of a grayscale
//!   raster, approximate each as a polygon and bucket it as `triangle`,
//!   `rectangle` or `circle` by vertex count.
//!
//! [`classify_after_render`] chains the two.
//!
//! This crate has **no I/O dependencies**. It operates on in-memory byte
//! slices and returns structured data. Reading files and talking to
//! users lives in `sketchshape-cli`.

pub mod classify;
pub mod contour;
pub mod grayscale;
pub mod render;
pub mod simplify;
pub mod table;
pub mod transform;
pub mod types;

pub use classify::{ShapeCategory, ShapeSet};
pub use contour::{ContourTracer, ContourTracerKind};
pub use render::{PALETTE, RenderError, Viewport};
pub use table::{FlatPoint, TableError};
pub use transform::{PointTransform, TransformKind, TransformPipeline};
pub use types::{
    ClassifierConfig, Path, PipelineConfig, PipelineError, Point, Polyline, RenderConfig, Subpath,
};

use tracing::info;

/// Decode a curve table and render it as PNG bytes.
///
/// # Pipeline steps
///
/// 1. Decode rows and group them by `(path_id, subpath_id)`
/// 2. Apply the configured point transforms
/// 3. Draw every subpath with two or more points as a line strip
/// 4. Encode the canvas as PNG
///
/// An empty table decodes to no paths, which the renderer rejects.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] for out-of-range settings,
/// [`PipelineError::MalformedTable`] if the bytes are not a numeric
/// table, and [`PipelineError::Render`] if there is nothing to draw.
pub fn parse_and_render(
    table_bytes: &[u8],
    config: &PipelineConfig,
) -> Result<Vec<u8>, PipelineError> {
    config.validate()?;
    let paths = table::parse_table(table_bytes)?;
    let png = render::render_png(&paths, &config.render)?;
    info!(
        paths = paths.len(),
        bytes = png.len(),
        "rendered curve table"
    );
    Ok(png)
}

/// Classify the shapes in an encoded raster image.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] for out-of-range settings
/// and [`PipelineError::ClassificationInput`] if the bytes are empty or
/// not a decodable image.
pub fn classify_image(
    image_bytes: &[u8],
    config: &PipelineConfig,
) -> Result<ShapeSet, PipelineError> {
    config.validate()?;
    let field = grayscale::decode_and_normalize(image_bytes)?;
    let shapes = classify::classify(&field, &config.classifier);
    info!(shapes = %shapes, "classified image");
    Ok(shapes)
}

/// Render a curve table and classify the shapes in the result.
///
/// The rendered canvas is classified directly; it is identical to
/// decoding the PNG that [`parse_and_render`] would return.
///
/// # Errors
///
/// Any error of [`parse_and_render`].
pub fn classify_after_render(
    table_bytes: &[u8],
    config: &PipelineConfig,
) -> Result<ShapeSet, PipelineError> {
    config.validate()?;
    let paths = table::parse_table(table_bytes)?;
    let canvas = render::render(&paths, &config.render)?;
    let field = grayscale::normalize(&image::DynamicImage::ImageRgba8(canvas));
    let shapes = classify::classify(&field, &config.classifier);
    info!(paths = paths.len(), shapes = %shapes, "classified rendered table");
    Ok(shapes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SQUARE: &[u8] = b"0,0,0,0\n0,0,10,0\n0,0,10,10\n0,0,0,10\n0,0,0,0\n";

    #[test]
    fn empty_table_is_a_render_error() {
        let result = parse_and_render(b"", &PipelineConfig::default());
        assert!(matches!(
            result,
            Err(PipelineError::Render(RenderError::NothingToDraw))
        ));
    }

    #[test]
    fn two_column_table_is_malformed() {
        let result = parse_and_render(b"1,2\n3,4\n", &PipelineConfig::default());
        assert!(matches!(result, Err(PipelineError::MalformedTable(_))));
    }

    #[test]
    fn invalid_config_is_rejected_before_parsing() {
        let config = PipelineConfig {
            classifier: ClassifierConfig {
                level: -0.5,
                ..ClassifierConfig::default()
            },
            ..PipelineConfig::default()
        };
        assert!(matches!(
            parse_and_render(SQUARE, &config),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn render_produces_png() {
        let png = parse_and_render(SQUARE, &PipelineConfig::default()).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (800, 800));
    }

    #[test]
    fn classify_image_rejects_garbage() {
        assert!(matches!(
            classify_image(b"not an image", &PipelineConfig::default()),
            Err(PipelineError::ClassificationInput(_))
        ));
        assert!(matches!(
            classify_image(b"", &PipelineConfig::default()),
            Err(PipelineError::ClassificationInput(_))
        ));
    }

    #[test]
    fn classify_after_render_empty_table_is_render_error() {
        assert!(matches!(
            classify_after_render(b"", &PipelineConfig::default()),
            Err(PipelineError::Render(_))
        ));
    }

    #[test]
    fn overflowing_extent_is_a_render_error() {
        let table = b"0,0,-1e308,0\n0,0,1e308,0\n";
        assert!(matches!(
            parse_and_render(table, &PipelineConfig::default()),
            Err(PipelineError::Render(RenderError::DegenerateExtent))
        ));
        assert!(matches!(
            classify_after_render(table, &PipelineConfig::default()),
            Err(PipelineError::Render(RenderError::DegenerateExtent))
        ));
    }

    #[test]
    fn subnormal_extent_is_a_render_error() {
        let table = b"0,0,0,0\n0,0,1e-320,0\n";
        assert!(matches!(
            parse_and_render(table, &PipelineConfig::default()),
            Err(PipelineError::Render(RenderError::DegenerateExtent))
        ));
        assert!(matches!(
            classify_after_render(table, &PipelineConfig::default()),
            Err(PipelineError::Render(RenderError::DegenerateExtent))
        ));
    }

    #[test]
    fn short_segment_still_renders() {
        let png = parse_and_render(b"0,0,0,0\n0,0,10,0\n", &PipelineConfig::default()).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert!(decoded.pixels().any(|px| px.0 != [255, 255, 255, 255]));
    }

    #[test]
    fn gray_at_the_level_is_not_above_it() {
        // 204 / 255 is exactly 0.8, so a #cccccc square on black never
        // rises above the default level.
        let encode = |gray: u8| {
            let img = image::RgbaImage::from_fn(40, 40, |x, y| {
                let inside = (15..25).contains(&x) && (15..25).contains(&y);
                let v = if inside { gray } else { 0 };
                image::Rgba([v, v, v, 255])
            });
            render::encode_png(&img).unwrap()
        };
        let config = PipelineConfig::default();
        assert!(classify_image(&encode(204), &config).unwrap().is_empty());
        assert!(!classify_image(&encode(205), &config).unwrap().is_empty());
    }

    #[test]
    fn public_types_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PipelineConfig>();
        assert_send_sync::<ShapeSet>();
        assert_send_sync::<Path>();
        assert_send_sync::<PipelineError>();
        assert_send_sync::<RenderError>();
        assert_send_sync::<TransformPipeline>();
        assert_send_sync::<ContourTracerKind>();
        assert_send_sync::<Viewport>();
    }

    #[test]
    fn concurrent_calls_match_sequential_results() {
        let config = &PipelineConfig::default();
        let png = parse_and_render(SQUARE, config).unwrap();
        let expected = classify_image(&png, config).unwrap();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(move || {
                        let rendered = parse_and_render(SQUARE, config).unwrap();
                        let shapes = classify_image(&rendered, config).unwrap();
                        (rendered, shapes)
                    })
                })
                .collect();
            for handle in handles {
                let (rendered, shapes) = handle.join().unwrap();
                assert_eq!(rendered, png);
                assert_eq!(shapes, expected);
            }
        });
    }

    #[test]
    fn classify_after_render_matches_png_roundtrip() {
        let config = PipelineConfig::default();
        let direct = classify_after_render(SQUARE, &config).unwrap();
        let png = parse_and_render(SQUARE, &config).unwrap();
        let via_png = classify_image(&png, &config).unwrap();
        assert_eq!(direct, via_png);
        assert!(!direct.is_empty());
    }
}
