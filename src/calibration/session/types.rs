//! Session configuration and results

use crate::calibration::ccm::{CalibrationResult, ConstraintSet};
use crate::calibration::color::ErrorMetric;
use crate::calibration::image::RgbImage;
use crate::calibration::patches::PatchAverages;
use crate::calibration::preview::PreviewPair;
use crate::calibration::solver::SolverConfig;
use crate::calibration::timing::StageTimings;
use crate::calibration::white_balance::WhiteBalanceGains;

/// Mode selectors and solver settings, fixed for the duration of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Perceptual error minimised by the solve
    pub metric: ErrorMetric,
    /// Constrain every matrix row to sum to 1
    pub maintain_white_balance: bool,
    /// Estimate gray-row gains and apply them to the image and averages first
    pub apply_white_balance: bool,
    pub solver: SolverConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            metric: ErrorMetric::DeltaE,
            maintain_white_balance: true,
            apply_white_balance: false,
            solver: SolverConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    pub fn constraint_set(&self) -> ConstraintSet {
        ConstraintSet::from_maintain_white_balance(self.maintain_white_balance)
    }
}

/// Builder for SessionConfig
#[derive(Default)]
pub struct SessionConfigBuilder {
    metric: Option<ErrorMetric>,
    maintain_white_balance: Option<bool>,
    apply_white_balance: Option<bool>,
    solver: Option<SolverConfig>,
}

impl SessionConfigBuilder {
    pub fn metric(mut self, metric: ErrorMetric) -> Self {
        self.metric = Some(metric);
        self
    }

    pub fn maintain_white_balance(mut self, maintain: bool) -> Self {
        self.maintain_white_balance = Some(maintain);
        self
    }

    pub fn apply_white_balance(mut self, apply: bool) -> Self {
        self.apply_white_balance = Some(apply);
        self
    }

    pub fn solver(mut self, solver: SolverConfig) -> Self {
        self.solver = Some(solver);
        self
    }

    pub fn build(self) -> SessionConfig {
        let default = SessionConfig::default();
        SessionConfig {
            metric: self.metric.unwrap_or(default.metric),
            maintain_white_balance: self
                .maintain_white_balance
                .unwrap_or(default.maintain_white_balance),
            apply_white_balance: self
                .apply_white_balance
                .unwrap_or(default.apply_white_balance),
            solver: self.solver.unwrap_or(default.solver),
        }
    }
}

/// Everything a CCM run produces.
#[derive(Debug, Clone)]
pub struct CalibrationOutcome {
    /// Gains applied before the solve, if white balance was requested
    pub white_balance: Option<WhiteBalanceGains>,
    /// Patch averages the solve actually saw
    pub averages: PatchAverages,
    pub calibration: CalibrationResult,
    pub previews: PreviewPair,
    pub timings: StageTimings,
}

/// Result of the standalone white-balance run.
#[derive(Debug, Clone)]
pub struct WhiteBalanceOutcome {
    pub gains: WhiteBalanceGains,
    pub balanced: RgbImage,
}
