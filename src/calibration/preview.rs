//! Before/after preview export

mod tiff_writer;
pub mod types;
mod writer;

pub use tiff_writer::TiffPreviewWriter;
pub use types::{INPUT_PREVIEW_FILE, OUTPUT_PREVIEW_FILE, PreviewPair, TiffCompression};
pub use writer::PreviewWriter;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::calibration::common::error::{CalibrationError, Result};
use crate::calibration::image::RgbImage;

/// Writes the uncorrected and corrected charts into `dir` as
/// [`INPUT_PREVIEW_FILE`] and [`OUTPUT_PREVIEW_FILE`], returning both paths.
#[instrument(skip(writer, previews))]
pub fn export_previews<W: PreviewWriter>(
    writer: &W,
    previews: &PreviewPair,
    dir: &Path,
) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir).map_err(|e| {
        CalibrationError::OutputWriteError(format!("{}: {}", dir.display(), e))
    })?;

    let input_path = dir.join(INPUT_PREVIEW_FILE);
    let output_path = dir.join(OUTPUT_PREVIEW_FILE);
    write_one(writer, &previews.input, &input_path)?;
    write_one(writer, &previews.output, &output_path)?;

    info!(dir = %dir.display(), "Preview images saved");
    Ok((input_path, output_path))
}

fn write_one<W: PreviewWriter>(writer: &W, image: &RgbImage, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| {
        CalibrationError::OutputWriteError(format!("{}: {}", path.display(), e))
    })?;
    let mut out = BufWriter::new(file);
    writer.write_preview(image, &mut out)?;
    out.flush()?;
    Ok(())
}
