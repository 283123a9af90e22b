//! Chart image acquisition
//!
//! Image containers plus readers for the formats a chart photograph arrives in:
//! headerless sensor dumps, camera RAW containers and RGB TIFF files.

mod headerless_raw_reader;
mod rawloader_reader;
mod reader;
mod tiff_reader;
pub mod types;

pub use headerless_raw_reader::{HeaderlessRawReader, encode_headerless_raw};
pub use rawloader_reader::RawLoaderReader;
pub use reader::RawImageReader;
pub use tiff_reader::TiffRgbReader;
pub use types::{BayerImage, BayerPattern, RgbImage};

use std::path::Path;

use tracing::{info, instrument};

use crate::calibration::common::error::{CalibrationError, Result};
use crate::calibration::debayer::CpuDebayer;

fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| CalibrationError::InputReadError(format!("{}: {}", path.display(), e)))
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

fn decode_mosaic(path: &Path, data: &[u8]) -> Result<BayerImage> {
    if extension_of(path) == "raw" {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| CalibrationError::UnsupportedFormat(path.display().to_string()))?;
        HeaderlessRawReader::from_file_name(file_name)?.read_raw(data)
    } else {
        RawLoaderReader.read_raw(data)
    }
}

/// Loads a sensor mosaic as captured: `.raw` is a headerless dump described by
/// its file name, anything else is handed to rawloader.
#[instrument]
pub fn load_bayer_image(path: &Path) -> Result<BayerImage> {
    let image = decode_mosaic(path, &read_input(path)?)?;
    info!(
        width = image.width,
        height = image.height,
        bits = image.bits_per_sample,
        pattern = %image.pattern,
        "Raw mosaic loaded"
    );
    Ok(image)
}

/// Loads a chart photograph as RGB, picking the reader from the file extension:
/// `.tif`/`.tiff` is an RGB TIFF, anything else is a mosaic (see
/// [`load_bayer_image`]) and is demosaiced to 8-bit RGB.
#[instrument]
pub fn load_chart_image(path: &Path) -> Result<RgbImage> {
    let data = read_input(path)?;
    let image = match extension_of(path).as_str() {
        "tif" | "tiff" => TiffRgbReader.read_rgb(&data)?,
        _ => CpuDebayer::new().process(&decode_mosaic(path, &data)?)?,
    };

    info!(
        width = image.width,
        height = image.height,
        bits = image.bits_per_sample,
        "Chart image loaded"
    );
    Ok(image)
}
