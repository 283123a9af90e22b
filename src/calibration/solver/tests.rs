use super::*;
use crate::calibration::common::error::CalibrationError;

fn close(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

#[test]
fn test_unconstrained_bowl() {
    let solver = Cobyla::default();
    let objective = |x: &[f64]| (x[0] + 1.0).powi(2) + (x[1] - 4.0).powi(2);

    let solution = solver.minimize(&objective, &[0.0, 0.0], &[]).unwrap();

    assert!(solution.converged);
    assert!(close(solution.x[0], -1.0, 1e-4), "x = {:?}", solution.x);
    assert!(close(solution.x[1], 4.0, 1e-4), "x = {:?}", solution.x);
    assert!(solution.evaluations > 0);
}

#[test]
fn test_nan_region_is_avoided() {
    let solver = Cobyla::default();
    let f = |x: &[f64]| if x[0] < 0.0 { f64::NAN } else { (x[0] - 0.5).powi(2) };

    let solution = solver.minimize(&f, &[2.0], &[]).unwrap();

    assert!(close(solution.x[0], 0.5, 1e-4), "x = {:?}", solution.x);
    assert!(solution.objective.is_finite());
}

#[test]
fn test_equality_constrained_quadratic() {
    let solver = Cobyla::default();
    let objective = |x: &[f64]| (x[0] - 2.0).powi(2) + (x[1] - 1.0).powi(2);
    let constraints = vec![Constraint::equality(|x| x[0] + x[1] - 1.0)];

    let solution = solver.minimize(&objective, &[0.0, 0.0], &constraints).unwrap();

    assert!(solution.converged);
    assert!(close(solution.x[0], 1.0, 1e-4), "x = {:?}", solution.x);
    assert!(close(solution.x[1], 0.0, 1e-4), "x = {:?}", solution.x);
    assert!(solution.max_violation <= 1e-6);
    assert!(close(solution.objective, 2.0, 1e-3));
}

#[test]
fn test_inequality_constraint_becomes_active() {
    let solver = Cobyla::default();
    let objective = |x: &[f64]| x[0] * x[0];
    let constraints = vec![Constraint::inequality(|x| x[0] - 1.0)];

    let solution = solver.minimize(&objective, &[3.0], &constraints).unwrap();

    assert!(close(solution.x[0], 1.0, 1e-4), "x = {:?}", solution.x);
    assert!(solution.max_violation <= 1e-6);
}

#[test]
fn test_inactive_inequality_leaves_minimum_alone() {
    let solver = Cobyla::default();
    let objective = |x: &[f64]| (x[0] - 3.0).powi(2);
    let constraints = vec![Constraint::inequality(|x| x[0] - 1.0)];

    let solution = solver.minimize(&objective, &[1.5], &constraints).unwrap();

    assert!(close(solution.x[0], 3.0, 1e-4), "x = {:?}", solution.x);
    assert_eq!(solution.max_violation, 0.0);
}

#[test]
fn test_exhausted_budget_reports_not_converged() {
    let config = SolverConfig::builder().max_evaluations(8).build();
    let solver = Cobyla::new(config);
    let objective = |x: &[f64]| (x[0] - 2.0).powi(2) + (x[1] - 1.0).powi(2);
    let constraints = vec![Constraint::equality(|x| x[0] + x[1] - 1.0)];

    let solution = solver.minimize(&objective, &[0.0, 0.0], &constraints).unwrap();

    assert!(!solution.converged);
    assert_eq!(solution.x.len(), 2);
}

#[test]
fn test_non_finite_start_is_rejected() {
    let solver = Cobyla::default();
    let objective = |_: &[f64]| f64::NAN;

    let err = solver.minimize(&objective, &[1.0], &[]).unwrap_err();

    assert!(matches!(err, CalibrationError::SolverError(_)));
}

#[test]
fn test_empty_start_is_rejected() {
    let solver = Cobyla::default();
    let objective = |_: &[f64]| 0.0;

    assert!(solver.minimize(&objective, &[], &[]).is_err());
}

#[test]
fn test_config_builder_keeps_defaults() {
    let config = SolverConfig::builder()
        .max_evaluations(100)
        .initial_step(0.5)
        .build();

    assert_eq!(config.max_evaluations, 100);
    assert_eq!(config.initial_step, 0.5);
    assert_eq!(config.x_tolerance, SolverConfig::default().x_tolerance);
    assert_eq!(Cobyla::new(config.clone()).config(), &config);
}

#[test]
fn test_violation_measures_distance_from_feasibility() {
    let eq = Constraint::equality(|x| x[0] - 1.0);
    let ineq = Constraint::inequality(|x| x[0] - 1.0);

    assert_eq!(eq.violation(&[0.5]), 0.5);
    assert_eq!(ineq.violation(&[0.5]), 0.5);
    assert_eq!(ineq.violation(&[2.0]), 0.0);
    assert_eq!(types::max_violation(&[eq, ineq], &[3.0]), 2.0);
}
