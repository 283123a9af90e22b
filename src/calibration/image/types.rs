//! Image containers shared by the loaders and the calibration stages

use std::fmt;
use std::str::FromStr;

use crate::calibration::common::error::{CalibrationError, Result};

/// Color filter array layout of a mosaic image, named by its top-left 2x2 tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BayerPattern {
    Rggb,
    Grbg,
    Gbrg,
    Bggr,
}

impl FromStr for BayerPattern {
    type Err = CalibrationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "RGGB" => Ok(BayerPattern::Rggb),
            "GRBG" => Ok(BayerPattern::Grbg),
            "GBRG" => Ok(BayerPattern::Gbrg),
            "BGGR" => Ok(BayerPattern::Bggr),
            other => Err(CalibrationError::UnsupportedFormat(format!(
                "bayer pattern {other}"
            ))),
        }
    }
}

impl fmt::Display for BayerPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BayerPattern::Rggb => "RGGB",
            BayerPattern::Grbg => "GRBG",
            BayerPattern::Gbrg => "GBRG",
            BayerPattern::Bggr => "BGGR",
        };
        f.write_str(name)
    }
}

/// Single-channel mosaic straight off the sensor
#[derive(Debug, Clone)]
pub struct BayerImage {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// Raw samples, row-major
    pub data: Vec<u16>,
    /// Bits per sample from the sensor (e.g. 10, 12 or 16)
    pub bits_per_sample: u32,
    /// Color filter array layout
    pub pattern: BayerPattern,
}

/// Interleaved RGB image `[R, G, B, R, G, B, ...]`
#[derive(Debug, Clone, PartialEq)]
pub struct RgbImage {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// Interleaved samples, row-major
    pub data: Vec<u16>,
    /// Bits per channel sample (8 for rendered RGB, up to 16)
    pub bits_per_sample: u32,
}

impl RgbImage {
    pub fn new(width: usize, height: usize, data: Vec<u16>, bits_per_sample: u32) -> Result<Self> {
        if width == 0 || height == 0 || data.len() != width * height * 3 {
            return Err(CalibrationError::InvalidDimensions(width, height));
        }
        if bits_per_sample == 0 || bits_per_sample > 16 {
            return Err(CalibrationError::UnsupportedFormat(format!(
                "{bits_per_sample} bits per sample"
            )));
        }
        Ok(Self {
            width,
            height,
            data,
            bits_per_sample,
        })
    }

    /// Largest representable channel value, e.g. 255 for 8-bit images.
    pub fn max_value(&self) -> f64 {
        ((1u32 << self.bits_per_sample) - 1) as f64
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u16; 3] {
        let i = (y * self.width + x) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}
