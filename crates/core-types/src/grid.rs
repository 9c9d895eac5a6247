//! Grid coordinate model.
//!
//! The visual surface is partitioned into a fixed 60x60 grid. Columns are
//! addressed by letters (`A`..`Z`, then `AA`..`BH`), rows by 1-based
//! numbers, so cell names run `A1` through `BH60`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of columns and rows in the fixed grid.
pub const GRID_SIZE: u16 = 60;

/// Error raised when a cell name cannot be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CellParseError {
    #[error("empty cell name")]
    Empty,

    #[error("malformed cell name: {0}")]
    Malformed(String),

    #[error("cell {0} outside the {GRID_SIZE}x{GRID_SIZE} grid")]
    OutOfRange(String),
}

/// One cell of the 60x60 grid, 1-based column and row.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct GridCell {
    col: u16,
    row: u16,
}

impl GridCell {
    /// Build a cell from 1-based column and row indices.
    pub fn new(col: u16, row: u16) -> Result<Self, CellParseError> {
        if col == 0 || row == 0 || col > GRID_SIZE || row > GRID_SIZE {
            return Err(CellParseError::OutOfRange(format!("col {col}, row {row}")));
        }
        Ok(Self { col, row })
    }

    /// 1-based column index.
    pub fn col(self) -> u16 {
        self.col
    }

    /// 1-based row index.
    pub fn row(self) -> u16 {
        self.row
    }

    /// Column letters for this cell (`A`..`BH`).
    pub fn col_letters(self) -> String {
        column_letters(self.col)
    }

    /// Neighbouring cell clamped to the grid edge.
    pub fn offset_clamped(self, dc: i32, dr: i32) -> Self {
        let col = (i32::from(self.col) + dc).clamp(1, i32::from(GRID_SIZE)) as u16;
        let row = (i32::from(self.row) + dr).clamp(1, i32::from(GRID_SIZE)) as u16;
        Self { col, row }
    }
}

impl std::fmt::Display for GridCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", column_letters(self.col), self.row)
    }
}

impl From<GridCell> for String {
    fn from(cell: GridCell) -> Self {
        cell.to_string()
    }
}

impl TryFrom<String> for GridCell {
    type Error = CellParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::str::FromStr for GridCell {
    type Err = CellParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CellParseError::Empty);
        }
        let letters: String = s.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
        let digits = &s[letters.len()..];
        if letters.is_empty() || digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(CellParseError::Malformed(s.to_string()));
        }
        let col = column_index(&letters).ok_or_else(|| CellParseError::Malformed(s.to_string()))?;
        let row: u16 = digits
            .parse()
            .map_err(|_| CellParseError::Malformed(s.to_string()))?;
        Self::new(col, row).map_err(|_| CellParseError::OutOfRange(s.to_string()))
    }
}

/// Convert a 1-based column index into letters (1 -> `A`, 60 -> `BH`).
fn column_letters(mut col: u16) -> String {
    debug_assert!(col >= 1);
    let mut letters = Vec::new();
    while col > 0 {
        let rem = ((col - 1) % 26) as u8;
        letters.push(b'A' + rem);
        col = (col - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).expect("ASCII letters")
}

/// Convert column letters into a 1-based index, if well-formed.
fn column_index(letters: &str) -> Option<u16> {
    let mut col: u32 = 0;
    for c in letters.chars() {
        let c = c.to_ascii_uppercase();
        if !c.is_ascii_uppercase() {
            return None;
        }
        col = col * 26 + u32::from(c as u8 - b'A') + 1;
        if col > u32::from(u16::MAX) {
            return None;
        }
    }
    Some(col as u16)
}

/// A resolved screen position: grid cell plus fractional in-cell offset and
/// the oracle's confidence in the identification.
///
/// Invariants: offsets and confidence always stay within [0, 1]. The
/// constructors clamp rather than reject, so a coordinate is valid by
/// construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridCoordinate {
    /// Cell address in the fixed grid.
    pub cell: GridCell,

    /// Horizontal offset within the cell, 0.0 (left edge) to 1.0 (right edge).
    pub offset_x: f32,

    /// Vertical offset within the cell, 0.0 (top edge) to 1.0 (bottom edge).
    pub offset_y: f32,

    /// Confidence score for this coordinate, 0.0 to 1.0.
    pub confidence: f32,

    /// Whether adaptive refinement was applied.
    #[serde(default)]
    pub refined: bool,
}

impl GridCoordinate {
    /// Coordinate centred in the given cell.
    pub fn centered(cell: GridCell, confidence: f32) -> Self {
        Self {
            cell,
            offset_x: 0.5,
            offset_y: 0.5,
            confidence: confidence.clamp(0.0, 1.0),
            refined: false,
        }
    }

    /// Coordinate with explicit offsets, clamped into [0, 1].
    pub fn new(cell: GridCell, offset_x: f32, offset_y: f32, confidence: f32) -> Self {
        Self {
            cell,
            offset_x: offset_x.clamp(0.0, 1.0),
            offset_y: offset_y.clamp(0.0, 1.0),
            confidence: confidence.clamp(0.0, 1.0),
            refined: false,
        }
    }

    /// Mark the coordinate as having gone through a refinement round.
    pub fn with_refined(mut self) -> Self {
        self.refined = true;
        self
    }

    /// Pixel position of this coordinate for a viewport of the given size.
    pub fn to_pixels(&self, viewport_width: u32, viewport_height: u32) -> (u32, u32) {
        let cell_w = viewport_width as f32 / f32::from(GRID_SIZE);
        let cell_h = viewport_height as f32 / f32::from(GRID_SIZE);
        let x = (f32::from(self.cell.col() - 1) + self.offset_x) * cell_w;
        let y = (f32::from(self.cell.row() - 1) + self.offset_y) * cell_h;
        (
            (x as u32).min(viewport_width.saturating_sub(1)),
            (y as u32).min(viewport_height.saturating_sub(1)),
        )
    }
}
