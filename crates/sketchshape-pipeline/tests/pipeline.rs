//! End-to-end checks of the public entry points.

#![allow(clippy::unwrap_used)]

use image::{ImageEncoder, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;
use sketchshape_pipeline::{
    ClassifierConfig, PipelineConfig, PipelineError, ShapeCategory, ShapeSet,
    classify_after_render, classify_image, parse_and_render, table,
};

const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

fn canvas(size: u32) -> RgbImage {
    RgbImage::from_pixel(size, size, Rgb([255, 255, 255]))
}

fn png(img: &RgbImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
    buf
}

fn classify(img: &RgbImage) -> ShapeSet {
    classify_image(&png(img), &PipelineConfig::default()).unwrap()
}

#[test]
fn example_rows_group_into_two_paths() {
    let paths = table::parse_table(b"0,0,1,1\n0,0,2,2\n1,0,5,5\n1,0,6,6\n").unwrap();
    assert_eq!(paths.len(), 2);
    for (path, expected_id) in paths.iter().zip([0.0, 1.0]) {
        assert!((path.id - expected_id).abs() < f64::EPSILON);
        assert_eq!(path.subpaths.len(), 1);
        assert_eq!(path.subpaths[0].points().len(), 2);
    }
}

#[test]
fn row_order_does_not_change_the_picture() {
    let ordered = b"0,0,0,0\n0,0,4,1\n1,0,2,5\n1,0,3,0\n2,1,1,1\n2,1,0,3\n";
    let shuffled = b"2,1,1,1\n1,0,2,5\n0,0,0,0\n2,1,0,3\n1,0,3,0\n0,0,4,1\n";
    let config = PipelineConfig::default();
    // Rows within a subpath keep their relative order in both inputs.
    assert_eq!(
        parse_and_render(ordered, &config).unwrap(),
        parse_and_render(shuffled, &config).unwrap()
    );
}

#[test]
fn rendering_is_repeatable() {
    let table = b"0,0,0,0\n0,0,3,4\n0,1,3,4\n0,1,6,0\n";
    let config = PipelineConfig::default();
    let first = parse_and_render(table, &config).unwrap();
    let second = parse_and_render(table, &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn extra_middle_columns_are_ignored() {
    let narrow = b"0,0,1,1\n0,0,5,2\n";
    let wide = b"0,0,99,-7,1,1\n0,0,42,3,5,2\n";
    let config = PipelineConfig::default();
    assert_eq!(
        parse_and_render(narrow, &config).unwrap(),
        parse_and_render(wide, &config).unwrap()
    );
}

#[test]
fn header_row_is_malformed() {
    let result = parse_and_render(b"path,subpath,x,y\n0,0,1,1\n", &PipelineConfig::default());
    assert!(matches!(result, Err(PipelineError::MalformedTable(_))));
}

#[test]
fn blank_raster_has_no_shapes() {
    assert!(classify(&canvas(64)).is_empty());
}

#[test]
fn solid_black_raster_has_no_shapes() {
    let img = RgbImage::from_pixel(32, 32, BLACK);
    assert!(classify(&img).is_empty());
}

#[test]
fn band_on_the_border_is_a_rectangle() {
    let mut img = canvas(200);
    draw_filled_rect_mut(&mut img, Rect::at(0, 50).of_size(60, 40), BLACK);
    let shapes = classify(&img);
    assert_eq!(shapes.to_strings(), vec!["rectangle"]);
}

#[test]
fn corner_block_and_disc_are_triangle_and_circle() {
    let mut img = canvas(200);
    draw_filled_rect_mut(&mut img, Rect::at(0, 0).of_size(50, 50), BLACK);
    draw_filled_rect_mut(&mut img, Rect::at(150, 150).of_size(50, 50), BLACK);
    draw_filled_circle_mut(&mut img, (100, 100), 30, BLACK);
    let shapes = classify(&img);
    assert_eq!(shapes.len(), 2);
    assert!(shapes.contains(ShapeCategory::Triangle));
    assert!(shapes.contains(ShapeCategory::Circle));
    assert_eq!(shapes.to_string(), "triangle, circle");
}

#[test]
fn huge_tolerance_collapses_everything_to_triangle() {
    let mut img = canvas(120);
    draw_filled_circle_mut(&mut img, (60, 60), 25, BLACK);
    let config = PipelineConfig {
        classifier: ClassifierConfig {
            tolerance: 1000.0,
            ..ClassifierConfig::default()
        },
        ..PipelineConfig::default()
    };
    let shapes = classify_image(&png(&img), &config).unwrap();
    assert_eq!(shapes.to_strings(), vec!["triangle"]);
}

#[test]
fn rendered_outline_is_classified() {
    let table = b"0,0,0,0\n0,0,10,0\n0,0,10,10\n0,0,0,10\n0,0,0,0\n";
    let shapes = classify_after_render(table, &PipelineConfig::default()).unwrap();
    // A stroked outline yields closed inner and outer contours.
    assert!(shapes.contains(ShapeCategory::Circle));
}

#[test]
fn classification_results_serialize_as_strings() {
    let mut img = canvas(200);
    draw_filled_rect_mut(&mut img, Rect::at(0, 50).of_size(60, 40), BLACK);
    let json = serde_json::to_string(&classify(&img)).unwrap();
    assert_eq!(json, r#"["rectangle"]"#);
}
