//! Color calibration of an ISP from a photographed 24-patch chart.
//!
//! The modules follow the calibration flow: image acquisition and demosaic,
//! patch averaging, gray-row white balance, reference tables, perceptual
//! color math, the constrained CCM solve, and the preview and configuration
//! outputs. [`session`] strings them together. [`black_level`] is the
//! dark-frame tool that runs before any chart is shot.

pub mod black_level;
pub mod ccm;
pub mod color;
pub mod common;
pub mod config_export;
pub mod debayer;
pub mod image;
pub mod patches;
pub mod preview;
pub mod reference;
pub mod session;
pub mod solver;
pub mod timing;
pub mod white_balance;

pub use common::{CalibrationError, Result};

pub use image::{BayerImage, BayerPattern, RgbImage, load_bayer_image, load_chart_image};

pub use black_level::BlackLevels;

pub use patches::{PatchAverages, PatchRect, PatchSet, average_patches};

pub use reference::{ReferenceTable, ReferenceTables};

pub use color::ErrorMetric;

pub use ccm::{CalibrationResult, CcmMatrix, ConstraintSet, IntegerCcm, apply_ccm};

pub use solver::{Cobyla, ConstrainedMinimizer, Constraint, Solution, SolverConfig};

pub use preview::{PreviewWriter, TiffCompression, TiffPreviewWriter};

pub use session::{CalibrationOutcome, CalibrationSession, SessionConfig};

pub use white_balance::WhiteBalanceGains;
