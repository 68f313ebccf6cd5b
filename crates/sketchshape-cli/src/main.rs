//! sketchshape: render curve tables and classify shapes from the command
//! line.
//!
//! # Usage
//!
//! ```text
//! sketchshape [OPTIONS] classify <FILE>
//! sketchshape [OPTIONS] render <FILE.csv> -o <OUT.png>
//! sketchshape [OPTIONS] svg <FILE.csv> -o <OUT.svg>
//! ```
//!
//! Logging goes to stderr and is controlled with `RUST_LOG` (default
//! `info`).

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod intake;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sketchshape_export::{ExportError, SvgMetadata};
use sketchshape_pipeline::{ClassifierConfig, PipelineConfig, PipelineError, RenderConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::intake::{DEFAULT_MAX_BYTES, InputKind, IntakeError, Upload};

/// Render curve tables as line drawings and classify shapes in images.
#[derive(Parser)]
#[command(name = "sketchshape", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Contour iso-level on the [0, 1] intensity scale.
    #[arg(long, global = true, default_value_t = ClassifierConfig::DEFAULT_LEVEL)]
    level: f64,

    /// Polygon approximation tolerance in pixels.
    #[arg(long, global = true, default_value_t = ClassifierConfig::DEFAULT_TOLERANCE)]
    tolerance: f64,

    /// Side length of the rendered square image in pixels.
    #[arg(long, global = true, default_value_t = RenderConfig::DEFAULT_SIZE)]
    size: u32,

    /// Blank border around the drawing in pixels.
    #[arg(long, global = true, default_value_t = RenderConfig::DEFAULT_MARGIN)]
    margin: u32,

    /// Stroke width in pixels.
    #[arg(long, global = true, default_value_t = RenderConfig::DEFAULT_LINE_WIDTH)]
    line_width: f32,

    /// Reject input files larger than this many bytes.
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_BYTES)]
    max_bytes: u64,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// Missing fields take their defaults.
    #[arg(long, global = true)]
    config_json: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Identify shapes in a table (rendered first) or an image.
    Classify {
        /// Input file (csv, png, svg, xlsx).
        file: PathBuf,
    },

    /// Render a curve table to PNG.
    Render {
        /// Input curve table (csv).
        file: PathBuf,

        /// Where to write the PNG.
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Export a curve table as SVG.
    Svg {
        /// Input curve table (csv).
        file: PathBuf,

        /// Where to write the SVG.
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Everything that ends a run with a non-zero exit code.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("error parsing --config-json: {0}")]
    ConfigJson(#[from] serde_json::Error),

    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error("File type not supported: {name}")]
    NotATable { name: String },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("error writing {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Build a [`PipelineConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<PipelineConfig, CliError> {
    if let Some(ref json) = cli.config_json {
        return Ok(serde_json::from_str(json)?);
    }

    Ok(PipelineConfig {
        render: RenderConfig {
            size: cli.size,
            margin: cli.margin,
            line_width: cli.line_width,
            ..RenderConfig::default()
        },
        classifier: ClassifierConfig {
            level: cli.level,
            tolerance: cli.tolerance,
        },
    })
}

/// Only curve tables can be drawn.
fn require_table(upload: &Upload) -> Result<(), CliError> {
    match upload.kind {
        InputKind::Table => Ok(()),
        InputKind::Raster => Err(CliError::NotATable {
            name: upload.name.clone(),
        }),
    }
}

fn write_output(path: &Path, contents: &[u8]) -> Result<(), CliError> {
    std::fs::write(path, contents).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), bytes = contents.len(), "wrote output");
    Ok(())
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config = config_from_cli(cli)?;

    match &cli.command {
        Command::Classify { file } => {
            let upload = intake::read_upload(file, cli.max_bytes)?;
            let shapes = match upload.kind {
                InputKind::Table => {
                    sketchshape_pipeline::classify_after_render(&upload.bytes, &config)?
                }
                InputKind::Raster => sketchshape_pipeline::classify_image(&upload.bytes, &config)?,
            };
            println!("Shapes identified: {shapes}");
        }
        Command::Render { file, output } => {
            let upload = intake::read_upload(file, cli.max_bytes)?;
            require_table(&upload)?;
            let png = sketchshape_pipeline::parse_and_render(&upload.bytes, &config)?;
            write_output(output, &png)?;
        }
        Command::Svg { file, output } => {
            let upload = intake::read_upload(file, cli.max_bytes)?;
            require_table(&upload)?;
            config.validate()?;
            let paths = sketchshape_pipeline::table::parse_table(&upload.bytes)
                .map_err(PipelineError::from)?;
            let config_json = serde_json::to_string(&config).ok();
            let title = upload
                .name
                .rsplit_once('.')
                .map_or(upload.name.as_str(), |(stem, _)| stem);
            let metadata = SvgMetadata {
                title: Some(title),
                description: Some("Exported by sketchshape"),
                config_json: config_json.as_deref(),
            };
            let svg = sketchshape_export::to_svg(&paths, &config.render, &metadata)?;
            write_output(output, svg.as_bytes())?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
