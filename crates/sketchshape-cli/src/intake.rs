//! Upload validation: extension whitelist, size bound, dispatch kind.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Allowed file extensions for uploads, matched case-insensitively.
const ALLOWED_EXTENSIONS: &[&str] = &["csv", "svg", "png", "xlsx"];

/// Default upload size limit: 16 MiB.
pub const DEFAULT_MAX_BYTES: u64 = 16 * 1024 * 1024;

/// How an accepted upload is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// A delimited numeric curve table.
    Table,
    /// Anything else on the whitelist, handed to the image decoder.
    Raster,
}

/// An upload that passed validation.
#[derive(Debug)]
pub struct Upload {
    /// File name as given, without directories.
    pub name: String,
    /// How to process it.
    pub kind: InputKind,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Rejections shown to the user before any processing happens.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    /// Extension missing or not on the whitelist.
    #[error("unsupported file type: {name}")]
    UnsupportedType {
        /// Offending file name.
        name: String,
    },

    /// Larger than the configured limit.
    #[error("{name} is {size} bytes, over the {max} byte limit")]
    TooLarge {
        /// Offending file name.
        name: String,
        /// Actual size, or the first size seen past the limit.
        size: u64,
        /// Configured limit.
        max: u64,
    },

    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Check whether a filename has an allowed extension.
fn has_allowed_extension(name: &str) -> bool {
    name.rsplit_once('.').is_some_and(|(_, ext)| {
        ALLOWED_EXTENSIONS
            .iter()
            .any(|a| a.eq_ignore_ascii_case(ext))
    })
}

/// Decide how a file is processed from its name alone.
///
/// # Errors
///
/// Returns [`IntakeError::UnsupportedType`] if the extension is not on
/// the whitelist.
pub fn input_kind(name: &str) -> Result<InputKind, IntakeError> {
    if !has_allowed_extension(name) {
        return Err(IntakeError::UnsupportedType {
            name: name.to_owned(),
        });
    }
    let is_table = name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("csv"));
    Ok(if is_table {
        InputKind::Table
    } else {
        InputKind::Raster
    })
}

/// Validate and read an upload from disk.
///
/// The extension is checked before the file is opened. At most
/// `max_bytes + 1` bytes are read, so an oversized file is rejected
/// without loading it whole.
///
/// # Errors
///
/// Returns [`IntakeError`] if the file is rejected or unreadable.
pub fn read_upload(path: &Path, max_bytes: u64) -> Result<Upload, IntakeError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let kind = input_kind(&name)?;

    let read_err = |source| IntakeError::Read {
        path: path.to_path_buf(),
        source,
    };
    let file = fs::File::open(path).map_err(read_err)?;
    let mut bytes = Vec::new();
    file.take(max_bytes.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(read_err)?;

    let size = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
    if size > max_bytes {
        return Err(IntakeError::TooLarge {
            name,
            size,
            max: max_bytes,
        });
    }

    tracing::debug!(%name, size, ?kind, "accepted upload");
    Ok(Upload { name, kind, bytes })
}
