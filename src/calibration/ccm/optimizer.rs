use tracing::{debug, info, instrument, warn};

use crate::calibration::ccm::objective::CcmObjective;
use crate::calibration::ccm::types::{
    CalibrationResult, CcmInputs, CcmMatrix, ConstraintSet, IntegerCcm,
};
use crate::calibration::color::{ErrorMetric, Lab};
use crate::calibration::common::BLACK_PATCH_INDEX;
use crate::calibration::common::error::{CalibrationError, Result};
use crate::calibration::patches::PatchAverages;
use crate::calibration::reference::{ReferenceTable, ReferenceTables};
use crate::calibration::solver::{Cobyla, ConstrainedMinimizer, SolverConfig};

/// Ratio of the reference black patch to the observed one. Falls back to 1
/// when the observation is zero or the ratio is not a positive finite number.
pub fn amplitude_factor(observed: &PatchAverages, reference_linear: &ReferenceTable) -> f64 {
    let observed_black = observed.black_patch_mean();
    if observed_black == 0.0 {
        return 1.0;
    }

    let black = reference_linear.row(BLACK_PATCH_INDEX);
    let ratio = (black[0] + black[1] + black[2]) / 3.0 / observed_black;
    if ratio.is_finite() && ratio > 0.0 { ratio } else { 1.0 }
}

/// Diagonal matrix of per-channel `reference mean / observed mean`. A zero
/// observed mean is replaced by the reference mean, giving a gain of 1.
pub fn initial_guess(observed: &PatchAverages, reference_linear: &ReferenceTable) -> CcmMatrix {
    let gain = |channel: usize| {
        let reference_mean = reference_linear.column_mean(channel);
        let observed_mean = observed.channel_mean(channel);
        let divisor = if observed_mean == 0.0 { reference_mean } else { observed_mean };
        let gain = reference_mean / divisor;
        if gain.is_finite() { gain } else { 1.0 }
    };
    CcmMatrix::from_diagonal(&nalgebra::Vector3::new(gain(0), gain(1), gain(2)))
}

impl CcmInputs {
    /// Derives the amplitude factor and initial guess from the observations
    /// and the linear reference.
    pub fn prepare(
        observed: PatchAverages,
        references: &ReferenceTables,
        metric: ErrorMetric,
        constraint_set: ConstraintSet,
    ) -> Self {
        let amplitude_factor = amplitude_factor(&observed, &references.linear);
        let initial_guess = initial_guess(&observed, &references.linear);
        debug!(amplitude_factor, ?initial_guess, "Prepared CCM inputs");

        Self {
            reference_lab: references.lab.rows().iter().map(|&row| Lab::from(row)).collect(),
            observed,
            amplitude_factor,
            initial_guess,
            metric,
            constraint_set,
        }
    }
}

/// Fits a [`CcmMatrix`] with a pluggable constrained minimizer.
pub struct CcmOptimizer<M: ConstrainedMinimizer> {
    minimizer: M,
}

impl CcmOptimizer<Cobyla> {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            minimizer: Cobyla::new(config),
        }
    }
}

impl<M: ConstrainedMinimizer> CcmOptimizer<M> {
    pub fn with_minimizer(minimizer: M) -> Self {
        Self { minimizer }
    }

    pub fn minimizer(&self) -> &M {
        &self.minimizer
    }

    /// Runs the solve. A result that did not converge is still returned, with
    /// `converged = false` and a warning logged.
    #[instrument(skip_all, fields(metric = ?inputs.metric, constraints = ?inputs.constraint_set))]
    pub fn calibrate(&self, inputs: &CcmInputs) -> Result<CalibrationResult> {
        let objective = CcmObjective::new(inputs);
        let constraints = inputs.constraint_set.constraints();
        let start: Vec<f64> = inputs.initial_guess.transpose().iter().copied().collect();

        let solution = self
            .minimizer
            .minimize(&|x: &[f64]| objective.evaluate(x), &start, &constraints)?;

        if solution.x.len() != 9 {
            return Err(CalibrationError::SolverError(format!(
                "expected 9 matrix entries from the minimizer, got {}",
                solution.x.len()
            )));
        }
        let floating = CcmMatrix::from_row_slice(&solution.x);

        if solution.converged {
            info!(
                objective = solution.objective,
                evaluations = solution.evaluations,
                "CCM solve converged"
            );
        } else {
            warn!(
                objective = solution.objective,
                max_violation = solution.max_violation,
                evaluations = solution.evaluations,
                "CCM solve did not converge; keeping the best matrix found"
            );
        }

        Ok(CalibrationResult {
            integer: IntegerCcm::from_floating(&floating),
            objective: objective.evaluate_matrix(&floating),
            max_violation: solution.max_violation,
            converged: solution.converged,
            evaluations: solution.evaluations,
            initial_guess: inputs.initial_guess,
            amplitude_factor: inputs.amplitude_factor,
            floating,
        })
    }
}
