use nalgebra::Matrix3;

use crate::calibration::color::{ErrorMetric, Lab};
use crate::calibration::patches::PatchAverages;
use crate::calibration::solver::Constraint;

/// Row-major correction matrix: `output = M * input`.
pub type CcmMatrix = Matrix3<f64>;

/// Integer export scale, 2^10.
pub const FIXED_POINT_SCALE: f64 = 1024.0;

/// Fixed-point rows of a [`CcmMatrix`] as stored in the tuning config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerCcm {
    pub red: [i32; 3],
    pub green: [i32; 3],
    pub blue: [i32; 3],
}

impl IntegerCcm {
    /// Scales every entry by 1024 and rounds to the nearest integer, ties to even.
    pub fn from_floating(matrix: &CcmMatrix) -> Self {
        let row = |r: usize| {
            [0usize, 1, 2].map(|c| (matrix[(r, c)] * FIXED_POINT_SCALE).round_ties_even() as i32)
        };
        Self {
            red: row(0),
            green: row(1),
            blue: row(2),
        }
    }

    pub fn rows(&self) -> [[i32; 3]; 3] {
        [self.red, self.green, self.blue]
    }
}

/// Which constraint family the solve runs under. Every family keeps the
/// diagonal at or above unity gain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConstraintSet {
    /// Each row also sums to 1, so neutral input stays neutral.
    #[default]
    WhiteBalancePreserving,
    DiagonalOnly,
}

impl ConstraintSet {
    pub fn from_maintain_white_balance(maintain: bool) -> Self {
        if maintain {
            ConstraintSet::WhiteBalancePreserving
        } else {
            ConstraintSet::DiagonalOnly
        }
    }

    /// Constraints over the row-major 9-vector of matrix entries.
    pub fn constraints(self) -> Vec<Constraint> {
        let mut constraints = Vec::with_capacity(6);
        if self == ConstraintSet::WhiteBalancePreserving {
            for row in 0..3 {
                constraints.push(Constraint::equality(move |x: &[f64]| {
                    1.0 - x[3 * row..3 * row + 3].iter().sum::<f64>()
                }));
            }
        }
        for diagonal in [0, 4, 8] {
            constraints.push(Constraint::inequality(move |x: &[f64]| x[diagonal] - 1.0));
        }
        constraints
    }
}

/// Everything the objective needs, fixed before the solve starts.
#[derive(Debug, Clone, PartialEq)]
pub struct CcmInputs {
    /// Observed (possibly white-balanced) patch averages, 0..=1.
    pub observed: PatchAverages,
    /// Reference L*a*b* per patch, chart order.
    pub reference_lab: Vec<Lab>,
    pub amplitude_factor: f64,
    pub initial_guess: CcmMatrix,
    pub metric: ErrorMetric,
    pub constraint_set: ConstraintSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationResult {
    pub floating: CcmMatrix,
    /// Always derived from `floating`.
    pub integer: IntegerCcm,
    /// Mean squared perceptual error at `floating`.
    pub objective: f64,
    pub max_violation: f64,
    pub converged: bool,
    pub evaluations: usize,
    pub initial_guess: CcmMatrix,
    pub amplitude_factor: f64,
}

impl CalibrationResult {
    /// Floating rows rounded to 4 decimals, as printed for the operator.
    pub fn display_rows(&self) -> [[f64; 3]; 3] {
        let m = &self.floating;
        [0usize, 1, 2].map(|r| [0usize, 1, 2].map(|c| (m[(r, c)] * 10_000.0).round() / 10_000.0))
    }
}
