use std::path::{Path, PathBuf};

use tracing::{info, info_span, instrument};

use crate::calibration::ccm::{CcmInputs, CcmOptimizer, apply_ccm};
use crate::calibration::common::error::{CalibrationError, Result};
use crate::calibration::image::{RgbImage, load_chart_image};
use crate::calibration::patches::{PatchSet, average_patches};
use crate::calibration::preview::{PreviewPair, PreviewWriter, TiffPreviewWriter, export_previews};
use crate::calibration::reference::ReferenceTables;
use crate::calibration::session::types::{CalibrationOutcome, SessionConfig, WhiteBalanceOutcome};
use crate::calibration::solver::{Cobyla, ConstrainedMinimizer};
use crate::calibration::timing::StageTimings;
use crate::calibration::white_balance::WhiteBalanceGains;

pub struct CalibrationSession<M: ConstrainedMinimizer, W: PreviewWriter> {
    optimizer: CcmOptimizer<M>,
    writer: W,
    config: SessionConfig,
}

impl CalibrationSession<Cobyla, TiffPreviewWriter> {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            optimizer: CcmOptimizer::new(config.solver.clone()),
            writer: TiffPreviewWriter::default(),
            config,
        }
    }
}

impl<M: ConstrainedMinimizer, W: PreviewWriter> CalibrationSession<M, W> {
    /// Injects a minimizer and preview writer. `config.solver` only applies
    /// to the default minimizer and is ignored here.
    pub fn with_custom(minimizer: M, writer: W, config: SessionConfig) -> Self {
        Self {
            optimizer: CcmOptimizer::with_minimizer(minimizer),
            writer,
            config,
        }
    }

    #[instrument(skip_all, fields(width = image.width, height = image.height))]
    pub fn run(
        &self,
        image: &RgbImage,
        patches: &PatchSet,
        references: &ReferenceTables,
    ) -> Result<CalibrationOutcome> {
        info!(
            metric = ?self.config.metric,
            maintain_white_balance = self.config.maintain_white_balance,
            apply_white_balance = self.config.apply_white_balance,
            "Starting CCM calibration"
        );
        let mut timings = StageTimings::new();

        let averages = {
            let _span = info_span!("average_patches", patches = patches.rects().len()).entered();
            timings.measure("average_patches", || average_patches(image, patches))?
        };

        let (white_balance, balanced, averages) = if self.config.apply_white_balance {
            let _span = info_span!("white_balance").entered();
            timings.measure("white_balance", || {
                let gains = WhiteBalanceGains::estimate(&averages);
                (
                    Some(gains),
                    gains.apply_to_image(image),
                    gains.apply_to_averages(&averages),
                )
            })
        } else {
            (None, image.clone(), averages)
        };

        let inputs = {
            let _span = info_span!("prepare_inputs").entered();
            timings.measure("prepare_inputs", || {
                CcmInputs::prepare(
                    averages.clone(),
                    references,
                    self.config.metric,
                    self.config.constraint_set(),
                )
            })
        };

        let calibration = {
            let _span = info_span!("solve").entered();
            timings.measure("solve", || self.optimizer.calibrate(&inputs))?
        };
        info!(
            red = ?calibration.integer.red,
            green = ?calibration.integer.green,
            blue = ?calibration.integer.blue,
            objective = calibration.objective,
            "Integer CCM"
        );

        let previews = {
            let _span = info_span!("render_preview").entered();
            timings.measure("render_preview", || PreviewPair {
                input: image.clone(),
                output: apply_ccm(&balanced, &calibration.floating),
            })
        };

        timings.log_summary();
        Ok(CalibrationOutcome {
            white_balance,
            averages,
            calibration,
            previews,
            timings,
        })
    }

    /// Loads every input from disk and runs. Reference tables are read fresh
    /// on each call.
    #[instrument(skip_all, fields(image = %image_path.display()))]
    pub fn run_files(
        &self,
        image_path: &Path,
        patches_path: &Path,
        lab_path: &Path,
        linear_path: &Path,
    ) -> Result<CalibrationOutcome> {
        let references = {
            let _span = info_span!("load_references").entered();
            ReferenceTables::load(lab_path, linear_path)?
        };
        let patches = PatchSet::load(patches_path)?;
        let image = load_chart_image(image_path)?;

        self.run(&image, &patches, &references)
    }

    /// Estimates and applies gray-row gains without solving for a matrix.
    #[instrument(skip_all, fields(width = image.width, height = image.height))]
    pub fn white_balance(&self, image: &RgbImage, patches: &PatchSet) -> Result<WhiteBalanceOutcome> {
        let averages = average_patches(image, patches)?;
        let gains = WhiteBalanceGains::estimate(&averages);
        Ok(WhiteBalanceOutcome {
            gains,
            balanced: gains.apply_to_image(image),
        })
    }

    /// Writes the before/after previews of `outcome` into `dir`.
    pub fn export_previews(
        &self,
        outcome: &CalibrationOutcome,
        dir: &Path,
    ) -> Result<(PathBuf, PathBuf)> {
        export_previews(&self.writer, &outcome.previews, dir)
    }

    /// Encodes a single image with the session's writer, e.g. the
    /// white-balanced chart.
    pub fn write_image(&self, image: &RgbImage, path: &Path) -> Result<()> {
        let mut file = std::fs::File::create(path).map_err(|e| {
            CalibrationError::OutputWriteError(format!("{}: {}", path.display(), e))
        })?;
        self.writer.write_preview(image, &mut file)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}
