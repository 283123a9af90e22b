//! Camera RAW container reader built on the rawloader library.
//!
//! Handles the formats rawloader can decode (ARW, RAF, NEF, DNG, ...) as long
//! as the sensor is a plain 2x2 Bayer mosaic.

use std::io::Cursor;

use rawloader::RawImageData as RawloaderImageData;
use tracing::debug;

use crate::calibration::common::error::{CalibrationError, Result};
use crate::calibration::image::reader::RawImageReader;
use crate::calibration::image::types::{BayerImage, BayerPattern};

pub struct RawLoaderReader;

/// Bit depth assumed when the container reports no white level.
const DEFAULT_BITS_PER_SAMPLE: u32 = 16;

const U16_BITS: u32 = 16;

impl RawImageReader for RawLoaderReader {
    fn read_raw(&self, data: &[u8]) -> Result<BayerImage> {
        debug!("Decoding RAW container, {} bytes", data.len());

        let decoded = rawloader::decode(&mut Cursor::new(data))
            .map_err(|e| CalibrationError::DecodeError(e.to_string()))?;

        if decoded.cpp != 1 {
            return Err(CalibrationError::UnsupportedFormat(format!(
                "{} components per pixel, expected a Bayer mosaic",
                decoded.cpp
            )));
        }

        let pattern: BayerPattern = decoded.cfa.name.parse()?;

        // Float containers are normalised to 0.0-1.0.
        let samples: Vec<u16> = match decoded.data {
            RawloaderImageData::Integer(values) => values,
            RawloaderImageData::Float(values) => {
                values.iter().map(|&v| (v * u16::MAX as f32) as u16).collect()
            }
        };

        // The white level is the largest value the sensor can produce, so its
        // bit length is the effective sample depth (4095 -> 12 bits).
        let max_white_level = decoded.whitelevels.iter().max().copied().unwrap_or(u16::MAX);
        let bits_per_sample = if max_white_level == 0 {
            DEFAULT_BITS_PER_SAMPLE
        } else {
            U16_BITS - max_white_level.leading_zeros()
        };

        debug!(
            "Decoded {}x{} {} mosaic, {} bits (white level {})",
            decoded.width, decoded.height, pattern, bits_per_sample, max_white_level
        );

        Ok(BayerImage {
            width: decoded.width,
            height: decoded.height,
            data: samples,
            bits_per_sample,
            pattern,
        })
    }
}
