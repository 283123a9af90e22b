//! Reader for headerless sensor dumps.
//!
//! These files carry no metadata: geometry, bit depth and CFA layout are encoded
//! in the file name as `<name>_<W>x<H>_<N>bits_<PATTERN>.raw`, for example
//! `ColorChecker_2592x1536_12bits_RGGB.raw`. Samples are one byte each for 8-bit
//! dumps and little-endian 16-bit words otherwise.

use tracing::debug;

use crate::calibration::common::error::{CalibrationError, Result};
use crate::calibration::image::reader::RawImageReader;
use crate::calibration::image::types::{BayerImage, BayerPattern};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderlessRawReader {
    pub width: usize,
    pub height: usize,
    pub bits_per_sample: u32,
    pub pattern: BayerPattern,
}

impl HeaderlessRawReader {
    /// Parses the geometry out of a file name (with or without directory part).
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        let invalid = || {
            CalibrationError::UnsupportedFormat(format!(
                "file name \"{file_name}\" does not follow <name>_<W>x<H>_<N>bits_<PATTERN>.raw"
            ))
        };

        let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
        let stem = base
            .rsplit_once('.')
            .filter(|(_, extension)| extension.eq_ignore_ascii_case("raw"))
            .map_or(base, |(stem, _)| stem);

        let mut fields = stem.rsplitn(4, '_');
        let pattern = fields.next().ok_or_else(invalid)?;
        let bits = fields.next().ok_or_else(invalid)?;
        let size = fields.next().ok_or_else(invalid)?;
        let name = fields.next().ok_or_else(invalid)?;
        if name.is_empty() {
            return Err(invalid());
        }

        let pattern: BayerPattern = pattern.parse().map_err(|_| invalid())?;

        let bits_per_sample: u32 = bits
            .strip_suffix("bits")
            .or_else(|| bits.strip_suffix("bit"))
            .and_then(|b| b.parse().ok())
            .filter(|b| (1..=16).contains(b))
            .ok_or_else(invalid)?;

        let (width, height) = size.split_once('x').ok_or_else(invalid)?;
        let width: usize = width.parse().map_err(|_| invalid())?;
        let height: usize = height.parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(CalibrationError::InvalidDimensions(width, height));
        }

        Ok(Self {
            width,
            height,
            bits_per_sample,
            pattern,
        })
    }

    fn bytes_per_sample(&self) -> usize {
        bytes_per_sample(self.bits_per_sample)
    }
}

fn bytes_per_sample(bits_per_sample: u32) -> usize {
    if bits_per_sample == 8 { 1 } else { 2 }
}

/// Serialises a mosaic in the layout [`HeaderlessRawReader`] reads back.
pub fn encode_headerless_raw(image: &BayerImage) -> Vec<u8> {
    if bytes_per_sample(image.bits_per_sample) == 1 {
        image.data.iter().map(|&v| v.min(u8::MAX as u16) as u8).collect()
    } else {
        image.data.iter().flat_map(|v| v.to_le_bytes()).collect()
    }
}

impl RawImageReader for HeaderlessRawReader {
    fn read_raw(&self, data: &[u8]) -> Result<BayerImage> {
        let expected = self.width * self.height * self.bytes_per_sample();
        if data.len() != expected {
            return Err(CalibrationError::DecodeError(format!(
                "file size {} does not match the expected {} bytes for {}x{} at {} bits",
                data.len(),
                expected,
                self.width,
                self.height,
                self.bits_per_sample
            )));
        }

        let samples: Vec<u16> = if self.bytes_per_sample() == 1 {
            data.iter().map(|&v| v as u16).collect()
        } else {
            data.chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect()
        };

        debug!(
            "Read headerless raw {}x{} {} bits {}",
            self.width, self.height, self.bits_per_sample, self.pattern
        );

        Ok(BayerImage {
            width: self.width,
            height: self.height,
            data: samples,
            bits_per_sample: self.bits_per_sample,
            pattern: self.pattern,
        })
    }
}
