//! sketchshape-export: Pure format serializers (sans-IO)
//!
//! Converts grouped curve-table paths into vector output. Currently
//! supports SVG.

pub mod svg;

pub use svg::{ExportError, SvgMetadata, build_path_data, to_svg};
