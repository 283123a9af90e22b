use crate::calibration::common::error::Result;

/// Scalar function of the decision vector.
pub type ScalarFn = Box<dyn Fn(&[f64]) -> f64 + Send + Sync>;

/// A single constraint on the decision vector.
pub enum Constraint {
    /// Satisfied when the function evaluates to zero.
    Equality(ScalarFn),
    /// Satisfied when the function evaluates to zero or more.
    Inequality(ScalarFn),
}

impl Constraint {
    pub fn equality(f: impl Fn(&[f64]) -> f64 + Send + Sync + 'static) -> Self {
        Constraint::Equality(Box::new(f))
    }

    pub fn inequality(f: impl Fn(&[f64]) -> f64 + Send + Sync + 'static) -> Self {
        Constraint::Inequality(Box::new(f))
    }

    pub fn evaluate(&self, x: &[f64]) -> f64 {
        match self {
            Constraint::Equality(f) | Constraint::Inequality(f) => f(x),
        }
    }

    /// Distance from feasibility at `x`; zero when satisfied.
    pub fn violation(&self, x: &[f64]) -> f64 {
        match self {
            Constraint::Equality(h) => h(x).abs(),
            Constraint::Inequality(g) => (-g(x)).max(0.0),
        }
    }
}

impl std::fmt::Debug for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constraint::Equality(_) => f.write_str("Equality(..)"),
            Constraint::Inequality(_) => f.write_str("Inequality(..)"),
        }
    }
}

/// Largest violation over a constraint list, zero for an empty list.
pub fn max_violation(constraints: &[Constraint], x: &[f64]) -> f64 {
    constraints
        .iter()
        .map(|c| c.violation(x))
        .fold(0.0, f64::max)
}

/// Outcome of a minimisation. A solver that runs out of evaluations still
/// reports its best point with `converged = false`.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub x: Vec<f64>,
    pub objective: f64,
    pub max_violation: f64,
    pub evaluations: usize,
    pub converged: bool,
}

/// Minimises a scalar objective subject to constraints.
pub trait ConstrainedMinimizer {
    fn minimize(
        &self,
        objective: &dyn Fn(&[f64]) -> f64,
        initial_guess: &[f64],
        constraints: &[Constraint],
    ) -> Result<Solution>;
}

/// Settings for [`super::Cobyla`].
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Objective evaluations before giving up.
    pub max_evaluations: usize,
    /// Initial trust-region radius.
    pub initial_step: f64,
    /// Relative step size below which the search stops.
    pub x_tolerance: f64,
    /// Relative objective change below which the search stops.
    pub f_tolerance: f64,
    /// Maximum constraint violation accepted as feasible.
    pub constraint_tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_evaluations: 6000,
            initial_step: 0.1,
            x_tolerance: 1e-8,
            f_tolerance: 1e-12,
            constraint_tolerance: 1e-6,
        }
    }
}

impl SolverConfig {
    pub fn builder() -> SolverConfigBuilder {
        SolverConfigBuilder::default()
    }
}

#[derive(Default)]
pub struct SolverConfigBuilder {
    max_evaluations: Option<usize>,
    initial_step: Option<f64>,
    constraint_tolerance: Option<f64>,
}

impl SolverConfigBuilder {
    pub fn max_evaluations(mut self, evaluations: usize) -> Self {
        self.max_evaluations = Some(evaluations);
        self
    }

    pub fn initial_step(mut self, step: f64) -> Self {
        self.initial_step = Some(step);
        self
    }

    pub fn constraint_tolerance(mut self, tolerance: f64) -> Self {
        self.constraint_tolerance = Some(tolerance);
        self
    }

    pub fn build(self) -> SolverConfig {
        let default = SolverConfig::default();
        SolverConfig {
            max_evaluations: self.max_evaluations.unwrap_or(default.max_evaluations),
            initial_step: self.initial_step.unwrap_or(default.initial_step),
            constraint_tolerance: self
                .constraint_tolerance
                .unwrap_or(default.constraint_tolerance),
            ..default
        }
    }
}
