//! Image-sensor color calibration from a photographed 24-patch color chart.
//!
//! The [`calibration`] module holds the pipeline: patch averaging, white-balance
//! estimation, reference loading, CIE-2000 color differences and the constrained
//! color correction matrix (CCM) solve.

pub mod calibration;
pub mod logger;
