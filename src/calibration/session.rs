//! Stage-by-stage calibration session: patches, white balance, CCM solve,
//! preview. Each stage consumes the previous stage's value.

mod pipeline;
pub mod types;

#[cfg(test)]
mod tests;

pub use pipeline::CalibrationSession;
pub use types::{CalibrationOutcome, SessionConfig, SessionConfigBuilder, WhiteBalanceOutcome};
