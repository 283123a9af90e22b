use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use isp_tuning_rs::calibration::black_level::BlackLevels;
use isp_tuning_rs::calibration::config_export::{write_black_level_file, write_config_file};
use isp_tuning_rs::calibration::image::{encode_headerless_raw, load_bayer_image, load_chart_image};
use isp_tuning_rs::calibration::patches::PatchSet;
use isp_tuning_rs::calibration::session::{CalibrationSession, SessionConfig};
use isp_tuning_rs::calibration::{ErrorMetric, SolverConfig};
use isp_tuning_rs::logger;

#[derive(Parser)]
#[command(name = "isp-tuning")]
#[command(version, about = "Color calibration from a 24-patch chart", long_about = None)]
struct Cli {
    /// Debug logging with per-stage span timings
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricArg {
    /// CIEDE2000 color difference
    DeltaE,
    /// CIEDE2000 without the lightness term
    DeltaC,
}

impl From<MetricArg> for ErrorMetric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::DeltaE => ErrorMetric::DeltaE,
            MetricArg::DeltaC => ErrorMetric::DeltaC,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fit a color correction matrix to the chart
    Ccm {
        /// Chart image (.raw with WxH/bits/pattern in the name, .tif/.tiff, or camera RAW)
        #[arg(long, value_name = "FILE")]
        image: PathBuf,

        /// 24 lines of `x0 y0 x1 y1`, one per patch
        #[arg(long, value_name = "FILE")]
        patches: PathBuf,

        /// 24x3 L*a*b* reference table
        #[arg(long, value_name = "FILE")]
        reference_lab: PathBuf,

        /// 24x3 linear reference table
        #[arg(long, value_name = "FILE")]
        reference_linear: PathBuf,

        /// Error metric to minimise
        #[arg(long, value_enum, default_value = "delta-e")]
        metric: MetricArg,

        /// Let matrix rows sum to something other than 1
        #[arg(long)]
        no_maintain_wb: bool,

        /// White balance the chart from its gray row before fitting
        #[arg(long)]
        apply_wb: bool,

        /// Objective evaluations allowed to the solver
        #[arg(long, value_name = "N")]
        max_evaluations: Option<usize>,

        /// Directory for the before/after preview TIFFs
        #[arg(long, value_name = "DIR")]
        preview_dir: Option<PathBuf>,

        /// Tuning config (YAML) to update with the integer matrix
        #[arg(long, value_name = "FILE", requires = "config_out")]
        config_in: Option<PathBuf>,

        /// Where to write the updated tuning config
        #[arg(long, value_name = "FILE", requires = "config_in")]
        config_out: Option<PathBuf>,
    },

    /// Estimate red/blue white-balance gains from the gray row
    Wb {
        #[arg(long, value_name = "FILE")]
        image: PathBuf,

        #[arg(long, value_name = "FILE")]
        patches: PathBuf,

        /// Write the balanced chart as TIFF
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Measure R/Gr/Gb/B black levels from a dark frame
    Blc {
        /// Dark frame (.raw with WxH/bits/pattern in the name, or camera RAW)
        #[arg(long, value_name = "FILE")]
        image: PathBuf,

        /// Write the frame with the black levels subtracted, as headerless raw
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Tuning config (YAML) to update with the offsets
        #[arg(long, value_name = "FILE", requires = "config_out")]
        config_in: Option<PathBuf>,

        /// Where to write the updated tuning config
        #[arg(long, value_name = "FILE", requires = "config_in")]
        config_out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    match cli.command {
        Commands::Ccm {
            image,
            patches,
            reference_lab,
            reference_linear,
            metric,
            no_maintain_wb,
            apply_wb,
            max_evaluations,
            preview_dir,
            config_in,
            config_out,
        } => {
            let mut solver = SolverConfig::builder();
            if let Some(n) = max_evaluations {
                solver = solver.max_evaluations(n);
            }
            let config = SessionConfig::builder()
                .metric(metric.into())
                .maintain_white_balance(!no_maintain_wb)
                .apply_white_balance(apply_wb)
                .solver(solver.build())
                .build();
            let session = CalibrationSession::new(config);

            let outcome = session
                .run_files(&image, &patches, &reference_lab, &reference_linear)
                .context("CCM calibration failed")?;
            let result = &outcome.calibration;

            if let Some(gains) = outcome.white_balance {
                info!("White balance gains: red {}, blue {}", gains.red, gains.blue);
            }
            let [red, green, blue] = result.display_rows();
            info!("Floating-point CCM");
            info!("  corrected red   = {:?}", red);
            info!("  corrected green = {:?}", green);
            info!("  corrected blue  = {:?}", blue);
            info!("Integer CCM");
            info!("  corrected red   = {:?}", result.integer.red);
            info!("  corrected green = {:?}", result.integer.green);
            info!("  corrected blue  = {:?}", result.integer.blue);
            if !result.converged {
                warn!("Solver did not converge; review the matrix before using it");
            }

            if let Some(dir) = preview_dir {
                session
                    .export_previews(&outcome, &dir)
                    .with_context(|| format!("Failed to export previews to {}", dir.display()))?;
            }

            if let (Some(input), Some(output)) = (config_in, config_out) {
                write_config_file(&input, &output, &result.integer)
                    .with_context(|| format!("Failed to update {}", input.display()))?;
            }
        }

        Commands::Wb {
            image,
            patches,
            output,
        } => {
            let session = CalibrationSession::new(SessionConfig::default());
            let chart = load_chart_image(&image)
                .with_context(|| format!("Failed to load {}", image.display()))?;
            let patches = PatchSet::load(&patches)
                .with_context(|| format!("Failed to load {}", patches.display()))?;

            let outcome = session
                .white_balance(&chart, &patches)
                .context("White balance failed")?;
            info!(
                "White balance gains: red {}, blue {}",
                outcome.gains.red, outcome.gains.blue
            );

            if let Some(path) = output {
                session
                    .write_image(&outcome.balanced, &path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Balanced image saved to {}", path.display());
            }
        }

        Commands::Blc {
            image,
            output,
            config_in,
            config_out,
        } => {
            let dark = load_bayer_image(&image)
                .with_context(|| format!("Failed to load {}", image.display()))?;
            let levels = BlackLevels::measure(&dark).context("Black level calibration failed")?;
            info!(
                "Black levels: R {}, Gr {}, Gb {}, B {}",
                levels.red, levels.green_red, levels.green_blue, levels.blue
            );

            if let Some(path) = output {
                std::fs::write(&path, encode_headerless_raw(&levels.apply(&dark)))
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Corrected raw saved to {}", path.display());
            }

            if let (Some(input), Some(output)) = (config_in, config_out) {
                write_black_level_file(&input, &output, &levels)
                    .with_context(|| format!("Failed to update {}", input.display()))?;
            }
        }
    }

    Ok(())
}
