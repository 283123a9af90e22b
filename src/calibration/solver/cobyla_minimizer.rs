use std::cell::Cell;

use cobyla::{Func, RhoBeg, StopTols, SuccessStatus, minimize};
use tracing::{debug, instrument};

use crate::calibration::common::error::{CalibrationError, Result};
use crate::calibration::solver::types::{
    ConstrainedMinimizer, Constraint, Solution, SolverConfig, max_violation,
};

/// Stand-in for NaN or infinite objective values.
const NON_FINITE_OBJECTIVE: f64 = 1e30;

/// COBYLA (constrained optimization by linear approximations) from the
/// `cobyla` crate.
#[derive(Debug, Clone, Default)]
pub struct Cobyla {
    config: SolverConfig,
}

impl Cobyla {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }
}

impl ConstrainedMinimizer for Cobyla {
    #[instrument(skip_all, fields(dimension = initial_guess.len(), constraints = constraints.len()))]
    fn minimize(
        &self,
        objective: &dyn Fn(&[f64]) -> f64,
        initial_guess: &[f64],
        constraints: &[Constraint],
    ) -> Result<Solution> {
        if initial_guess.is_empty() {
            return Err(CalibrationError::SolverError(
                "initial guess has no variables".to_string(),
            ));
        }
        let initial_value = objective(initial_guess);
        if !initial_value.is_finite() {
            return Err(CalibrationError::SolverError(format!(
                "objective is not finite at the initial guess ({initial_value})"
            )));
        }

        let evaluations = Cell::new(0usize);
        let cost = |x: &[f64], _: &mut ()| {
            evaluations.set(evaluations.get() + 1);
            let value = objective(x);
            if value.is_finite() { value } else { NON_FINITE_OBJECTIVE }
        };

        // COBYLA only takes `c(x) >= 0`; an equality becomes two of them.
        let mut boxed: Vec<Box<dyn Func<()> + '_>> = Vec::with_capacity(2 * constraints.len());
        for constraint in constraints {
            match constraint {
                Constraint::Equality(h) => {
                    boxed.push(Box::new(move |x: &[f64], _: &mut ()| h(x)));
                    boxed.push(Box::new(move |x: &[f64], _: &mut ()| -h(x)));
                }
                Constraint::Inequality(g) => {
                    boxed.push(Box::new(move |x: &[f64], _: &mut ()| g(x)));
                }
            }
        }
        let cons: Vec<&dyn Func<()>> = boxed.iter().map(|c| c.as_ref()).collect();

        let bounds = vec![(f64::NEG_INFINITY, f64::INFINITY); initial_guess.len()];
        let stop_tol = StopTols {
            ftol_rel: self.config.f_tolerance,
            xtol_rel: self.config.x_tolerance,
            ..StopTols::default()
        };

        let (x, finished) = match minimize(
            cost,
            initial_guess,
            &bounds,
            &cons,
            (),
            self.config.max_evaluations,
            RhoBeg::All(self.config.initial_step),
            Some(stop_tol),
        ) {
            Ok((status, x, _)) => {
                debug!(?status, "COBYLA finished");
                let exhausted = matches!(
                    status,
                    SuccessStatus::MaxEvalReached | SuccessStatus::MaxTimeReached
                );
                (x, !exhausted)
            }
            Err((status, x, _)) => {
                debug!(?status, "COBYLA stopped early");
                (x, false)
            }
        };

        let value = objective(&x);
        let violation = max_violation(constraints, &x);
        let converged =
            finished && value.is_finite() && violation <= self.config.constraint_tolerance;

        Ok(Solution {
            x,
            objective: value,
            max_violation: violation,
            evaluations: evaluations.get(),
            converged,
        })
    }
}
