//! Reference tables for the 24 chart patches.
//!
//! Two tables are loaded per session: the perceptual one (CIE L*a*b*, D65)
//! that predicted colors are scored against, and the linear sensor-referred
//! one that seeds the initial matrix and the amplitude factor. Both are plain
//! text, one `v1 v2 v3` row per patch in canonical chart order.

use std::path::Path;

use tracing::debug;

use crate::calibration::common::PATCH_COUNT;
use crate::calibration::common::error::{CalibrationError, Result};
use crate::calibration::common::table::parse_fixed_table;

/// Immutable 24x3 table of reference triples.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTable {
    rows: Vec<[f64; 3]>,
}

impl ReferenceTable {
    pub fn from_rows(rows: Vec<[f64; 3]>) -> Result<Self> {
        if rows.len() != PATCH_COUNT {
            return Err(CalibrationError::InvalidReference {
                file: "<memory>".to_string(),
                line: 0,
                reason: format!("expected {PATCH_COUNT} rows, found {}", rows.len()),
            });
        }
        Ok(Self { rows })
    }

    /// Parses a table; `file` only labels errors.
    pub fn parse(text: &str, file: &str) -> Result<Self> {
        let rows = parse_fixed_table::<f64, 3>(text, PATCH_COUNT).map_err(|e| {
            CalibrationError::InvalidReference {
                file: file.to_string(),
                line: e.line,
                reason: e.reason,
            }
        })?;
        Ok(Self { rows })
    }

    /// Reads and parses a table from disk. Tables are never cached: every
    /// session reloads them.
    pub fn load(path: &Path) -> Result<Self> {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let text = std::fs::read_to_string(path).map_err(|e| {
            CalibrationError::InputReadError(format!("{}: {}", path.display(), e))
        })?;
        let table = Self::parse(&text, &file)?;
        debug!("Loaded reference table {}", file);
        Ok(table)
    }

    pub fn rows(&self) -> &[[f64; 3]] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> [f64; 3] {
        self.rows[index]
    }

    /// Mean of one column across all rows.
    pub fn column_mean(&self, column: usize) -> f64 {
        self.rows.iter().map(|r| r[column]).sum::<f64>() / self.rows.len() as f64
    }
}

/// The pair of tables a CCM session needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTables {
    /// L*a*b* reference, scored against
    pub lab: ReferenceTable,
    /// Linear sensor-referred reference, used for the initial guess and amplitude
    pub linear: ReferenceTable,
}

impl ReferenceTables {
    pub fn load(lab_path: &Path, linear_path: &Path) -> Result<Self> {
        Ok(Self {
            lab: ReferenceTable::load(lab_path)?,
            linear: ReferenceTable::load(linear_path)?,
        })
    }
}
