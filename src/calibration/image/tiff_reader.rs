use std::io::Cursor;

use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult};
use tracing::debug;

use crate::calibration::common::error::{CalibrationError, Result};
use crate::calibration::image::types::RgbImage;

/// Reads already-rendered chart photographs stored as 8- or 16-bit RGB TIFF.
pub struct TiffRgbReader;

impl TiffRgbReader {
    pub fn read_rgb(&self, data: &[u8]) -> Result<RgbImage> {
        let decode_err = |e: tiff::TiffError| CalibrationError::DecodeError(e.to_string());

        let mut decoder = Decoder::new(Cursor::new(data)).map_err(decode_err)?;
        let (width, height) = decoder.dimensions().map_err(decode_err)?;
        let color_type = decoder.colortype().map_err(decode_err)?;
        debug!("Decoding TIFF {}x{} {:?}", width, height, color_type);

        let bits_per_sample = match color_type {
            ColorType::RGB(8) => 8,
            ColorType::RGB(16) => 16,
            other => {
                return Err(CalibrationError::UnsupportedFormat(format!(
                    "TIFF color type {other:?}, expected 8- or 16-bit RGB"
                )));
            }
        };

        let samples: Vec<u16> = match decoder.read_image().map_err(decode_err)? {
            DecodingResult::U8(values) => values.into_iter().map(u16::from).collect(),
            DecodingResult::U16(values) => values,
            _ => {
                return Err(CalibrationError::UnsupportedFormat(
                    "TIFF sample format".to_string(),
                ));
            }
        };

        RgbImage::new(width as usize, height as usize, samples, bits_per_sample)
    }
}
