//! Common utilities module
//!
//! Shared error type and constants for the calibration pipeline.

pub mod error;
pub(crate) mod table;

pub use error::{CalibrationError, Result};

/// Number of patches on the reference chart (4 rows x 6 columns).
pub const PATCH_COUNT: usize = 24;

/// Index of the darkest (black) patch, used for amplitude normalisation.
pub const BLACK_PATCH_INDEX: usize = 23;

/// Inner gray-row patches used for white-balance estimation. The row's
/// extreme white (18) and black (23) patches are excluded.
pub const GRAY_ROW_INNER: std::ops::Range<usize> = 19..23;
