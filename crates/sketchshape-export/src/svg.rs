//! SVG export serializer.
//!
//! Converts paths into an SVG string with `<path>` elements using the
//! [`svg`] crate for document construction, XML escaping, and path data
//! formatting.
//!
//! The geometry goes through the same transforms and the same
//! [`Viewport`] as the raster renderer, so the SVG and the PNG line up
//! pixel for pixel: a square `viewBox` of the configured size, equal
//! scale on both axes, the configured margin on every side. Each
//! subpath becomes its own `<path>` of `M` (move to) and `L` (line to)
//! commands, stroked in its path's palette color with no fill.
//!
//! Optional [`SvgMetadata`] embeds `<title>` and `<desc>` elements, and
//! the pipeline configuration as JSON inside `<metadata>`.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Description, Element, Path as SvgPath, Title};
use svg::node::{Node, Text, Value};

use sketchshape_pipeline::render::{RenderError, Viewport, path_color};
use sketchshape_pipeline::{Path, Polyline, RenderConfig, TransformPipeline};

/// Paths that cannot be exported.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// No subpath has two or more points.
    #[error("no drawable paths to export")]
    EmptyPaths,

    /// The geometry cannot be fitted into a view box.
    #[error("cannot export geometry: {0}")]
    Geometry(#[source] RenderError),
}

impl From<RenderError> for ExportError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::NothingToDraw => Self::EmptyPaths,
            other => Self::Geometry(other),
        }
    }
}

/// Metadata to embed in the SVG document.
///
/// All fields are optional. Text values are XML-escaped automatically by
/// the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the source table's file name without extension.
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,

    /// Serialized pipeline configuration, emitted inside a `<metadata>`
    /// element wrapped in a namespaced `<sketchshape:config>` element.
    pub config_json: Option<&'a str>,
}

/// Build an SVG path `d` attribute string from a polyline.
///
/// Uses `M` for the first point and `L` for subsequent points.
/// Returns an empty string for polylines with fewer than 2 points.
///
/// # Examples
///
/// ```
/// use sketchshape_pipeline::{Point, Polyline};
/// use sketchshape_export::build_path_data;
///
/// let polyline = Polyline::new(vec![
///     Point::new(10.0, 20.0),
///     Point::new(30.0, 40.0),
/// ]);
/// assert_eq!(build_path_data(&polyline), "M10,20 L30,40");
/// ```
#[must_use]
pub fn build_path_data(polyline: &Polyline) -> String {
    build_path_data_with(polyline, |p| (p.x, p.y))
}

fn build_path_data_with(
    polyline: &Polyline,
    project: impl Fn(sketchshape_pipeline::Point) -> (f64, f64),
) -> String {
    let Some((first, rest)) = polyline.points().split_first() else {
        return String::new();
    };
    if rest.is_empty() {
        return String::new();
    }

    let mut data = Data::new().move_to(project(*first));
    for &p in rest {
        data = data.line_to(project(p));
    }
    String::from(Value::from(data))
}

/// Hex color of the path at `index`.
fn stroke_color(index: usize) -> String {
    let [r, g, b] = path_color(index);
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Serialize paths into an SVG document string.
///
/// Every subpath with 2 or more points becomes a `<path>` element.
///
/// # Examples
///
/// ```
/// use sketchshape_export::{SvgMetadata, to_svg};
/// use sketchshape_pipeline::{RenderConfig, table};
///
/// let paths = table::parse_table(b"0,0,0,0\n0,0,10,10\n").unwrap();
/// let metadata = SvgMetadata {
///     title: Some("diagonal"),
///     ..SvgMetadata::default()
/// };
/// let svg = to_svg(&paths, &RenderConfig::default(), &metadata).unwrap();
/// assert!(svg.contains("<title>diagonal</title>"));
/// assert!(svg.contains(r##"stroke="#0000ff""##));
/// ```
///
/// # Errors
///
/// Returns [`ExportError::EmptyPaths`] if no subpath has two points, and
/// [`ExportError::Geometry`] if the points are non-finite or all
/// coincide.
pub fn to_svg(
    paths: &[Path],
    config: &RenderConfig,
    metadata: &SvgMetadata<'_>,
) -> Result<String, ExportError> {
    let transformed = TransformPipeline::new(config.transforms.clone()).apply_paths(paths);
    let viewport = Viewport::fit(&transformed, config.size, config.margin)?;

    let size = viewport.size();
    let mut doc = Document::new()
        .set("width", size)
        .set("height", size)
        .set("viewBox", (0, 0, size, size));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if let Some(config_json) = metadata.config_json {
        let mut config_el = Element::new("sketchshape:config");
        config_el.assign("xmlns:sketchshape", "urn:sketchshape:config");
        config_el.append(Text::new(config_json));
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(config_el);
        doc = doc.add(metadata_el);
    }

    for (index, path) in transformed.iter().enumerate() {
        let color = stroke_color(index);
        for subpath in &path.subpaths {
            let d = build_path_data_with(&subpath.polyline, |p| {
                let q = viewport.project(p);
                (q.x, q.y)
            });
            if d.is_empty() {
                continue;
            }

            let element = SvgPath::new()
                .set("d", d)
                .set("fill", "none")
                .set("stroke", color.as_str())
                .set("stroke-width", f64::from(config.line_width))
                .set("stroke-linecap", "square")
                .set("stroke-linejoin", "round");
            doc = doc.add(element);
        }
    }

    // The svg crate omits the XML declaration, so we prepend it.
    Ok(format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n"
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use sketchshape_pipeline::{Point, Subpath};

    use super::*;

    fn path(id: f64, strips: &[&[(f64, f64)]]) -> Path {
        let subpaths = strips
            .iter()
            .zip(0_u8..)
            .map(|(coords, i)| {
                let points = coords.iter().map(|&(x, y)| Point::new(x, y)).collect();
                Subpath::new(f64::from(i), Polyline::new(points))
            })
            .collect();
        Path::new(id, subpaths)
    }

    /// 120 px canvas, 10 px margin, no transforms: a 10-unit square
    /// maps to scale 10.
    fn plain_config() -> RenderConfig {
        RenderConfig {
            size: 120,
            margin: 10,
            line_width: 2.0,
            transforms: Vec::new(),
        }
    }

    fn no_meta() -> SvgMetadata<'static> {
        SvgMetadata::default()
    }

    // --- build_path_data ---

    #[test]
    fn build_path_data_empty_polyline() {
        assert_eq!(build_path_data(&Polyline::new(vec![])), "");
    }

    #[test]
    fn build_path_data_single_point() {
        let polyline = Polyline::new(vec![Point::new(5.0, 5.0)]);
        assert_eq!(build_path_data(&polyline), "");
    }

    #[test]
    fn build_path_data_three_points() {
        let polyline = Polyline::new(vec![
            Point::new(10.0, 15.0),
            Point::new(12.5, 18.3),
            Point::new(14.0, 20.1),
        ]);
        assert_eq!(build_path_data(&polyline), "M10,15 L12.5,18.3 L14,20.1");
    }

    // --- Errors ---

    #[test]
    fn no_paths_is_an_error() {
        assert!(matches!(
            to_svg(&[], &plain_config(), &no_meta()),
            Err(ExportError::EmptyPaths)
        ));
    }

    #[test]
    fn only_single_points_is_an_error() {
        let paths = [path(0.0, &[&[(1.0, 2.0)]])];
        assert!(matches!(
            to_svg(&paths, &plain_config(), &no_meta()),
            Err(ExportError::EmptyPaths)
        ));
    }

    #[test]
    fn coincident_points_are_a_geometry_error() {
        let paths = [path(0.0, &[&[(1.0, 2.0), (1.0, 2.0)]])];
        assert!(matches!(
            to_svg(&paths, &plain_config(), &no_meta()),
            Err(ExportError::Geometry(RenderError::DegenerateExtent))
        ));
    }

    // --- Geometry ---

    #[test]
    fn coordinates_are_fitted_and_flipped() {
        let paths = [path(0.0, &[&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]])];
        let svg = to_svg(&paths, &plain_config(), &no_meta()).unwrap();
        assert!(svg.contains(r#"width="120""#));
        assert!(svg.contains(r#"viewBox="0 0 120 120""#));
        // y = 0 is the bottom of the drawing area, y = 10 the top.
        assert!(svg.contains(r#"d="M10,110 L110,110 L110,10""#), "{svg}");
    }

    #[test]
    fn standard_transforms_flip_vertically() {
        let paths = [path(0.0, &[&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]])];
        let config = RenderConfig {
            transforms: RenderConfig::default().transforms,
            ..plain_config()
        };
        let svg = to_svg(&paths, &config, &no_meta()).unwrap();
        assert!(svg.contains(r#"d="M10,10 L110,10 L110,110""#), "{svg}");
    }

    #[test]
    fn each_subpath_is_its_own_path_element() {
        let paths = [path(
            0.0,
            &[
                &[(0.0, 0.0), (1.0, 1.0)],
                &[(5.0, 5.0)],
                &[(2.0, 0.0), (3.0, 1.0)],
            ],
        )];
        let svg = to_svg(&paths, &plain_config(), &no_meta()).unwrap();
        assert_eq!(svg.matches("<path").count(), 2);
    }

    #[test]
    fn paths_cycle_through_palette() {
        let paths: Vec<Path> = (0_u8..8)
            .map(|i| {
                let y = f64::from(i);
                path(y, &[&[(0.0, y), (10.0, y)]])
            })
            .collect();
        let svg = to_svg(&paths, &plain_config(), &no_meta()).unwrap();
        assert!(svg.contains(r##"stroke="#0000ff""##));
        assert!(svg.contains(r##"stroke="#008000""##));
        assert!(svg.contains(r##"stroke="#000000""##));
        // Path 7 wraps back to blue.
        assert_eq!(svg.matches(r##"stroke="#0000ff""##).count(), 2);
        assert_eq!(svg.matches(r#"fill="none""#).count(), 8);
    }

    #[test]
    fn svg_has_declaration_and_namespace() {
        let paths = [path(0.0, &[&[(0.0, 0.0), (1.0, 1.0)]])];
        let svg = to_svg(&paths, &plain_config(), &no_meta()).unwrap();
        assert!(svg.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(svg.contains(r#"xmlns="http://www.w3.org/2000/svg""#));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    // --- Metadata ---

    #[test]
    fn title_and_desc_are_emitted_and_escaped() {
        let paths = [path(0.0, &[&[(0.0, 0.0), (1.0, 1.0)]])];
        let meta = SvgMetadata {
            title: Some("A <B> & C"),
            description: Some("x < y"),
            ..SvgMetadata::default()
        };
        let svg = to_svg(&paths, &plain_config(), &meta).unwrap();
        assert!(svg.contains("<title>A &lt;B&gt; &amp; C</title>"));
        assert!(svg.contains("<desc>x &lt; y</desc>"));
        let title_pos = svg.find("<title>").unwrap();
        let path_pos = svg.find("<path").unwrap();
        assert!(title_pos < path_pos, "title should come before paths");
    }

    #[test]
    fn config_json_goes_in_metadata() {
        let paths = [path(0.0, &[&[(0.0, 0.0), (1.0, 1.0)]])];
        let meta = SvgMetadata {
            config_json: Some(r#"{"level":0.8}"#),
            ..SvgMetadata::default()
        };
        let svg = to_svg(&paths, &plain_config(), &meta).unwrap();
        assert!(svg.contains("<metadata>"));
        assert!(svg.contains(
            r#"xmlns:sketchshape="urn:sketchshape:config""#
        ));
        assert!(svg.contains("</sketchshape:config>"));
    }

    #[test]
    fn metadata_omitted_when_none() {
        let paths = [path(0.0, &[&[(0.0, 0.0), (1.0, 1.0)]])];
        let svg = to_svg(&paths, &plain_config(), &no_meta()).unwrap();
        assert!(!svg.contains("<title>"));
        assert!(!svg.contains("<desc>"));
        assert!(!svg.contains("<metadata>"));
    }
}
