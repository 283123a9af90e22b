use std::path::Path;

use crate::calibration::common::PATCH_COUNT;
use crate::calibration::common::error::{CalibrationError, Result};
use crate::calibration::common::table::parse_fixed_table;

/// Axis-aligned patch region in pixel coordinates. Start is inclusive, end is
/// exclusive, so the patch covers columns `x0..x1` and rows `y0..y1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchRect {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl PatchRect {
    pub fn new(start: (usize, usize), end: (usize, usize)) -> Self {
        Self {
            x0: start.0,
            y0: start.1,
            x1: end.0,
            y1: end.1,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.x1.saturating_sub(self.x0) * self.y1.saturating_sub(self.y0)
    }
}

/// The 24 chart patches in canonical order: 4 rows of 6, row-major, ending
/// with the neutral row (18 white .. 23 black).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchSet {
    rects: Vec<PatchRect>,
}

impl PatchSet {
    pub fn new(rects: Vec<PatchRect>) -> Result<Self> {
        if rects.len() != PATCH_COUNT {
            return Err(CalibrationError::InvalidPatchSet {
                source_name: "<memory>".to_string(),
                reason: format!("expected {PATCH_COUNT} patches, found {}", rects.len()),
            });
        }
        Ok(Self { rects })
    }

    /// Parses 24 lines of `x0 y0 x1 y1`.
    pub fn parse(text: &str, source_name: &str) -> Result<Self> {
        let rows: Vec<[usize; 4]> = parse_fixed_table(text, PATCH_COUNT).map_err(|e| {
            CalibrationError::InvalidPatchSet {
                source_name: source_name.to_string(),
                reason: if e.line == 0 {
                    e.reason
                } else {
                    format!("line {}: {}", e.line, e.reason)
                },
            }
        })?;

        let rects = rows
            .into_iter()
            .map(|[x0, y0, x1, y1]| PatchRect { x0, y0, x1, y1 })
            .collect();
        Ok(Self { rects })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CalibrationError::InputReadError(format!("{}: {}", path.display(), e))
        })?;
        Self::parse(&text, &path.display().to_string())
    }

    pub fn rects(&self) -> &[PatchRect] {
        &self.rects
    }
}
