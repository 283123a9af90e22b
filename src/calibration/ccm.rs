//! Color correction matrix calibration.
//!
//! Patch averages go in as [`CcmInputs`]; the optimizer fits a 3x3 matrix
//! that minimises the mean squared CIE-2000 error against the chart's L*a*b*
//! reference and returns a [`CalibrationResult`]. [`apply_ccm`] renders the
//! corrected preview.

mod applier;
mod objective;
mod optimizer;
pub mod types;


pub use applier::apply_ccm;
pub use objective::CcmObjective;
pub use optimizer::{CcmOptimizer, amplitude_factor, initial_guess};
pub use types::{
    CalibrationResult, CcmInputs, CcmMatrix, ConstraintSet, FIXED_POINT_SCALE, IntegerCcm,
};
