use std::io::Write;
use std::sync::{Arc, Mutex};

use nalgebra::Matrix3;

use crate::calibration::ccm::{ConstraintSet, apply_ccm};
use crate::calibration::color::ErrorMetric;
use crate::calibration::common::error::{CalibrationError, Result};
use crate::calibration::image::RgbImage;
use crate::calibration::patches::{PatchRect, PatchSet};
use crate::calibration::preview::{PreviewWriter, TiffPreviewWriter};
use crate::calibration::reference::{ReferenceTable, ReferenceTables};
use crate::calibration::session::{CalibrationSession, SessionConfig};
use crate::calibration::solver::{ConstrainedMinimizer, Constraint, Solution, SolverConfig};

const CELL: usize = 8;

type Calls = Arc<Mutex<Vec<(Vec<f64>, usize)>>>;

struct MockMinimizer {
    should_fail: bool,
    solution: Vec<f64>,
    calls: Calls,
}

impl MockMinimizer {
    fn identity(calls: Calls) -> Self {
        Self {
            should_fail: false,
            solution: vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
            calls,
        }
    }
}

impl ConstrainedMinimizer for MockMinimizer {
    fn minimize(
        &self,
        objective: &dyn Fn(&[f64]) -> f64,
        initial_guess: &[f64],
        constraints: &[Constraint],
    ) -> Result<Solution> {
        self.calls
            .lock()
            .unwrap()
            .push((initial_guess.to_vec(), constraints.len()));
        if self.should_fail {
            return Err(CalibrationError::SolverError("Mock solver error".to_string()));
        }
        Ok(Solution {
            objective: objective(&self.solution),
            x: self.solution.clone(),
            max_violation: 0.0,
            evaluations: 1,
            converged: true,
        })
    }
}

struct MockWriter {
    should_fail: bool,
    written: Arc<Mutex<Vec<RgbImage>>>,
}

impl PreviewWriter for MockWriter {
    fn write_preview(&self, image: &RgbImage, _output: &mut dyn Write) -> Result<()> {
        if self.should_fail {
            return Err(CalibrationError::EncodeError("Mock encode error".to_string()));
        }
        self.written.lock().unwrap().push(image.clone());
        Ok(())
    }
}

fn mock_writer() -> MockWriter {
    MockWriter {
        should_fail: false,
        written: Arc::new(Mutex::new(Vec::new())),
    }
}

/// Flat patch colors; the inner gray patches are tinted so white balance has
/// something to correct.
fn patch_levels() -> Vec<[u16; 3]> {
    let mut levels: Vec<[u16; 3]> = (0..18u16).map(|i| [20 + 8 * i, 40 + 6 * i, 60 + 5 * i]).collect();
    levels.push([230, 230, 230]);
    for _ in 19..23 {
        levels.push([100, 120, 150]);
    }
    levels.push([10, 12, 15]);
    levels
}

/// 6x4 grid of CELL-sized squares, each filled with its patch level.
fn chart_image() -> RgbImage {
    let levels = patch_levels();
    let (width, height) = (6 * CELL, 4 * CELL);
    let mut data = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for x in 0..width {
            data.extend_from_slice(&levels[(y / CELL) * 6 + x / CELL]);
        }
    }
    RgbImage::new(width, height, data, 8).unwrap()
}

fn chart_patches() -> PatchSet {
    let rects = (0..24)
        .map(|i| {
            let (x, y) = ((i % 6) * CELL, (i / 6) * CELL);
            PatchRect::new((x + 2, y + 2), (x + CELL - 2, y + CELL - 2))
        })
        .collect();
    PatchSet::new(rects).unwrap()
}

fn references() -> ReferenceTables {
    let mut linear = vec![[0.4, 0.4, 0.4]; 24];
    linear[23] = [0.03, 0.03, 0.03];
    ReferenceTables {
        lab: ReferenceTable::from_rows(vec![[50.0, 0.0, 0.0]; 24]).unwrap(),
        linear: ReferenceTable::from_rows(linear).unwrap(),
    }
}

#[test]
fn test_config_builder() {
    let solver = SolverConfig::builder().max_evaluations(500).build();
    let config = SessionConfig::builder()
        .metric(ErrorMetric::DeltaC)
        .maintain_white_balance(false)
        .apply_white_balance(true)
        .solver(solver.clone())
        .build();

    assert_eq!(config.metric, ErrorMetric::DeltaC);
    assert!(!config.maintain_white_balance);
    assert!(config.apply_white_balance);
    assert_eq!(config.solver.max_evaluations, 500);
    assert_eq!(config.constraint_set(), ConstraintSet::DiagonalOnly);

    let default = SessionConfig::builder().build();
    assert_eq!(default, SessionConfig::default());
    assert_eq!(default.metric, ErrorMetric::DeltaE);
    assert_eq!(default.constraint_set(), ConstraintSet::WhiteBalancePreserving);
}

#[test]
fn test_successful_run() {
    let calls = Calls::default();
    let session = CalibrationSession::with_custom(
        MockMinimizer::identity(calls.clone()),
        mock_writer(),
        SessionConfig::default(),
    );
    let image = chart_image();

    let outcome = session.run(&image, &chart_patches(), &references()).unwrap();

    assert_eq!(outcome.calibration.integer.red, [1024, 0, 0]);
    assert_eq!(outcome.calibration.integer.blue, [0, 0, 1024]);
    assert_eq!(outcome.white_balance, None);
    assert_eq!(outcome.previews.input, image);
    assert_eq!(outcome.previews.output, apply_ccm(&image, &Matrix3::identity()));
    assert_eq!(outcome.averages.red[0], 20.0 / 255.0);
    for stage in ["average_patches", "prepare_inputs", "solve", "render_preview"] {
        assert!(outcome.timings.get_stage(stage).is_some(), "missing {stage}");
    }
    assert!(outcome.timings.get_stage("white_balance").is_none());

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, 6);
    assert_eq!(calls[0].0.len(), 9);
}

#[test]
fn test_diagonal_only_mode_passes_three_constraints() {
    let calls = Calls::default();
    let config = SessionConfig::builder().maintain_white_balance(false).build();
    let session =
        CalibrationSession::with_custom(MockMinimizer::identity(calls.clone()), mock_writer(), config);

    session.run(&chart_image(), &chart_patches(), &references()).unwrap();

    assert_eq!(calls.lock().unwrap()[0].1, 3);
}

#[test]
fn test_metric_does_not_change_solver_inputs() {
    let calls = Calls::default();
    for metric in [ErrorMetric::DeltaE, ErrorMetric::DeltaC] {
        let config = SessionConfig::builder().metric(metric).build();
        let session = CalibrationSession::with_custom(
            MockMinimizer::identity(calls.clone()),
            mock_writer(),
            config,
        );
        session.run(&chart_image(), &chart_patches(), &references()).unwrap();
    }

    let calls = calls.lock().unwrap();
    assert_eq!(calls[0], calls[1]);
}

#[test]
fn test_white_balance_scales_image_and_averages() {
    let calls = Calls::default();
    let config = SessionConfig::builder().apply_white_balance(true).build();
    let session =
        CalibrationSession::with_custom(MockMinimizer::identity(calls), mock_writer(), config);
    let image = chart_image();

    let outcome = session.run(&image, &chart_patches(), &references()).unwrap();

    let gains = outcome.white_balance.unwrap();
    assert_eq!(gains.red, 1.2);
    assert_eq!(gains.blue, 0.8);
    assert!((outcome.averages.red[20] - 120.0 / 255.0).abs() < 1e-12);
    assert!((outcome.averages.blue[20] - 120.0 / 255.0).abs() < 1e-12);
    assert_eq!(outcome.averages.green[20], 120.0 / 255.0);
    // The corrected preview is rendered from the balanced chart; the input
    // preview stays untouched.
    assert_eq!(outcome.previews.input, image);
    assert_eq!(
        outcome.previews.output,
        apply_ccm(&gains.apply_to_image(&image), &Matrix3::identity())
    );
    assert!(outcome.timings.get_stage("white_balance").is_some());
}

#[test]
fn test_minimizer_failure() {
    let calls = Calls::default();
    let minimizer = MockMinimizer {
        should_fail: true,
        solution: Vec::new(),
        calls,
    };
    let session = CalibrationSession::with_custom(minimizer, mock_writer(), SessionConfig::default());

    let result = session.run(&chart_image(), &chart_patches(), &references());

    assert!(matches!(result.unwrap_err(), CalibrationError::SolverError(_)));
}

#[test]
fn test_patch_outside_image_stops_before_solve() {
    let calls = Calls::default();
    let session = CalibrationSession::with_custom(
        MockMinimizer::identity(calls.clone()),
        mock_writer(),
        SessionConfig::default(),
    );
    let mut rects = chart_patches().rects().to_vec();
    rects[5] = PatchRect::new((40, 0), (60, 10));
    let patches = PatchSet::new(rects).unwrap();

    let result = session.run(&chart_image(), &patches, &references());

    assert!(matches!(
        result.unwrap_err(),
        CalibrationError::PatchOutOfBounds { index: 5, .. }
    ));
    assert!(calls.lock().unwrap().is_empty());
}

#[test]
fn test_export_previews_uses_writer() {
    let written = Arc::new(Mutex::new(Vec::new()));
    let writer = MockWriter {
        should_fail: false,
        written: written.clone(),
    };
    let session = CalibrationSession::with_custom(
        MockMinimizer::identity(Calls::default()),
        writer,
        SessionConfig::default(),
    );
    let outcome = session.run(&chart_image(), &chart_patches(), &references()).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let (input, output) = session.export_previews(&outcome, dir.path()).unwrap();

    assert!(input.exists() && output.exists());
    let written = written.lock().unwrap();
    assert_eq!(written.len(), 2);
    assert_eq!(written[0], outcome.previews.input);
    assert_eq!(written[1], outcome.previews.output);
}

#[test]
fn test_export_writer_failure() {
    let writer = MockWriter {
        should_fail: true,
        written: Arc::new(Mutex::new(Vec::new())),
    };
    let session = CalibrationSession::with_custom(
        MockMinimizer::identity(Calls::default()),
        writer,
        SessionConfig::default(),
    );
    let outcome = session.run(&chart_image(), &chart_patches(), &references()).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let result = session.export_previews(&outcome, dir.path());

    assert!(matches!(result.unwrap_err(), CalibrationError::EncodeError(_)));
}

fn write_session_files(dir: &std::path::Path) {
    let mut tiff = Vec::new();
    TiffPreviewWriter::default()
        .write_preview(&chart_image(), &mut tiff)
        .unwrap();
    std::fs::write(dir.join("chart.tiff"), tiff).unwrap();

    let patches: String = chart_patches()
        .rects()
        .iter()
        .map(|r| format!("{} {} {} {}\n", r.x0, r.y0, r.x1, r.y1))
        .collect();
    std::fs::write(dir.join("patches.txt"), patches).unwrap();
    std::fs::write(dir.join("lab.txt"), "50 0 0\n".repeat(24)).unwrap();
    std::fs::write(dir.join("linear.txt"), "0.4 0.4 0.4\n".repeat(24)).unwrap();
}

#[test]
fn test_run_files_reloads_references_every_call() {
    let dir = tempfile::tempdir().unwrap();
    write_session_files(dir.path());
    let calls = Calls::default();
    let session = CalibrationSession::with_custom(
        MockMinimizer::identity(calls.clone()),
        mock_writer(),
        SessionConfig::default(),
    );
    let run = || {
        session.run_files(
            &dir.path().join("chart.tiff"),
            &dir.path().join("patches.txt"),
            &dir.path().join("lab.txt"),
            &dir.path().join("linear.txt"),
        )
    };

    let outcome = run().unwrap();
    assert_eq!(outcome.previews.input, chart_image());

    std::fs::write(dir.path().join("lab.txt"), "50 0 0\n".repeat(23)).unwrap();
    match run().unwrap_err() {
        CalibrationError::InvalidReference { file, .. } => assert_eq!(file, "lab.txt"),
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(calls.lock().unwrap().len(), 1);
}

#[test]
fn test_run_files_missing_image() {
    let dir = tempfile::tempdir().unwrap();
    write_session_files(dir.path());
    let session = CalibrationSession::with_custom(
        MockMinimizer::identity(Calls::default()),
        mock_writer(),
        SessionConfig::default(),
    );

    let result = session.run_files(
        &dir.path().join("missing.tiff"),
        &dir.path().join("patches.txt"),
        &dir.path().join("lab.txt"),
        &dir.path().join("linear.txt"),
    );

    assert!(matches!(result.unwrap_err(), CalibrationError::InputReadError(_)));
}

#[test]
fn test_standalone_white_balance() {
    let session = CalibrationSession::with_custom(
        MockMinimizer::identity(Calls::default()),
        mock_writer(),
        SessionConfig::default(),
    );

    let outcome = session.white_balance(&chart_image(), &chart_patches()).unwrap();

    assert_eq!(outcome.gains.red, 1.2);
    assert_eq!(outcome.gains.blue, 0.8);
    assert_eq!(outcome.balanced.pixel(2 * CELL + 3, 3 * CELL + 3), [120, 120, 120]);
}
