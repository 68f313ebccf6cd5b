//! Curve table decoding and path reconstruction.
//!
//! A curve table is comma-delimited text where each row is one point:
//! the first column is the path id, the second the subpath id and the
//! last two are the `x, y` coordinates. Any columns in between are
//! ignored. Lines starting with `#` and blank lines are skipped.
//!
//! Grouping is sort-then-group: paths come out in ascending `path_id`
//! order and subpaths in ascending `subpath_id` order, regardless of the
//! order rows appear in. Points keep their original row order.

use tracing::debug;

use crate::types::{Path, Point, Polyline, Subpath};

/// Minimum number of columns a row must have.
pub const MIN_COLUMNS: usize = 4;

/// Problems with a single row of a curve table.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowError {
    /// Row is too short to carry ids and coordinates.
    #[error("expected at least {MIN_COLUMNS} columns, found {found}")]
    TooFewColumns {
        /// Number of columns present.
        found: usize,
    },

    /// A cell is not a finite number.
    #[error("column {column}: {cell:?} is not a finite number")]
    NonNumeric {
        /// 1-based column number.
        column: usize,
        /// The offending cell text, trimmed.
        cell: String,
    },

    /// Row width differs from the first data row.
    #[error("expected {expected} columns like the first row, found {found}")]
    Ragged {
        /// Column count of the first data row.
        expected: usize,
        /// Column count of this row.
        found: usize,
    },
}

/// A curve table that cannot be decoded as numeric data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TableError {
    /// The bytes are not text.
    #[error("table is not valid UTF-8: {0}")]
    NotUtf8(#[from] std::str::Utf8Error),

    /// A row is malformed.
    #[error("line {line}: {source}")]
    Row {
        /// 1-based line number in the input.
        line: usize,
        /// What is wrong with the row.
        #[source]
        source: RowError,
    },
}

/// One row of a curve table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatPoint {
    /// Path grouping key.
    pub path_id: f64,
    /// Subpath grouping key within the path.
    pub subpath_id: f64,
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl FlatPoint {
    /// Create a row from its four values.
    #[must_use]
    pub const fn new(path_id: f64, subpath_id: f64, x: f64, y: f64) -> Self {
        Self {
            path_id,
            subpath_id,
            x,
            y,
        }
    }

    /// Build a row from its numeric cells.
    ///
    /// The first two cells are the ids and the last two the coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`RowError::TooFewColumns`] if fewer than
    /// [`MIN_COLUMNS`] cells are given.
    pub fn from_cells(cells: &[f64]) -> Result<Self, RowError> {
        match *cells {
            [path_id, subpath_id, .., x, y] => Ok(Self::new(path_id, subpath_id, x, y)),
            _ => Err(RowError::TooFewColumns { found: cells.len() }),
        }
    }

    /// The coordinate pair of this row.
    #[must_use]
    pub const fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Decode comma-delimited text into rows.
///
/// Every data row must have the same number of columns (at least
/// [`MIN_COLUMNS`]) and every cell must parse as a finite `f64`.
/// An input with no data rows yields an empty vector.
///
/// # Errors
///
/// Returns [`TableError::NotUtf8`] for non-text input and
/// [`TableError::Row`] for the first malformed row.
pub fn decode_rows(bytes: &[u8]) -> Result<Vec<FlatPoint>, TableError> {
    let text = std::str::from_utf8(bytes)?;
    let mut rows = Vec::new();
    let mut width = None;

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let content = raw.split_once('#').map_or(raw, |(data, _)| data).trim();
        if content.is_empty() {
            continue;
        }

        let cells = parse_cells(content).map_err(|source| TableError::Row { line, source })?;

        let expected = *width.get_or_insert(cells.len());
        if cells.len() != expected {
            return Err(TableError::Row {
                line,
                source: RowError::Ragged {
                    expected,
                    found: cells.len(),
                },
            });
        }

        let row =
            FlatPoint::from_cells(&cells).map_err(|source| TableError::Row { line, source })?;
        rows.push(row);
    }

    Ok(rows)
}

fn parse_cells(content: &str) -> Result<Vec<f64>, RowError> {
    content
        .split(',')
        .enumerate()
        .map(|(i, cell)| {
            let cell = cell.trim();
            cell.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| RowError::NonNumeric {
                    column: i + 1,
                    cell: cell.to_owned(),
                })
        })
        .collect()
}

/// Group rows into paths and subpaths.
///
/// Paths are ordered by ascending distinct `path_id`, subpaths by
/// ascending distinct `subpath_id` within their path, and points keep
/// their relative row order. Ids are compared by exact numeric value.
#[must_use = "returns the reconstructed paths"]
pub fn group_rows(rows: &[FlatPoint]) -> Vec<Path> {
    sorted_distinct(rows.iter().map(|r| r.path_id))
        .into_iter()
        .map(|path_id| {
            let members: Vec<&FlatPoint> = rows
                .iter()
                .filter(|r| same_id(r.path_id, path_id))
                .collect();

            let subpaths = sorted_distinct(members.iter().map(|r| r.subpath_id))
                .into_iter()
                .map(|subpath_id| {
                    let points = members
                        .iter()
                        .filter(|r| same_id(r.subpath_id, subpath_id))
                        .map(|r| r.point())
                        .collect();
                    Subpath::new(subpath_id, Polyline::new(points))
                })
                .collect();

            Path::new(path_id, subpaths)
        })
        .collect()
}

/// Decode a curve table and reconstruct its paths.
///
/// # Errors
///
/// Returns [`TableError`] if the bytes are not a well-formed numeric
/// table. An empty table is not an error and yields no paths.
pub fn parse_table(bytes: &[u8]) -> Result<Vec<Path>, TableError> {
    let rows = decode_rows(bytes)?;
    let paths = group_rows(&rows);
    debug!(rows = rows.len(), paths = paths.len(), "parsed curve table");
    Ok(paths)
}

#[allow(clippy::float_cmp)]
fn same_id(a: f64, b: f64) -> bool {
    a == b
}

/// Distinct values in ascending order. `-0.0` and `0.0` are one value.
fn sorted_distinct(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut ids: Vec<f64> = values.collect();
    ids.sort_by(f64::total_cmp);
    ids.dedup_by(|a, b| same_id(*a, *b));
    ids
}
