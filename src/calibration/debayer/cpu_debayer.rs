use std::io::Cursor;

use bayer::{BayerDepth, CFA, Demosaic, RasterDepth, RasterMut};
use tracing::info;

use crate::calibration::common::error::{CalibrationError, Result};
use crate::calibration::image::{BayerImage, BayerPattern, RgbImage};

/// Linear demosaic on the CPU.
///
/// The mosaic is stretched to the full 8-bit range (min-max) before
/// interpolation, so the chart image handed to calibration is always 8-bit RGB
/// regardless of the sensor depth.
pub struct CpuDebayer;

impl CpuDebayer {
    pub fn new() -> Self {
        Self
    }

    pub fn process(&self, raw_image: &BayerImage) -> Result<RgbImage> {
        let width = raw_image.width;
        let height = raw_image.height;
        if width == 0 || height == 0 || raw_image.data.len() != width * height {
            return Err(CalibrationError::InvalidDimensions(width, height));
        }
        info!("Starting CPU debayering for image {}x{} ({})", width, height, raw_image.pattern);

        let mosaic = normalize_to_u8(&raw_image.data);

        let mut output_buf = vec![0u8; width * height * 3];
        {
            let mut output_raster =
                RasterMut::new(width, height, RasterDepth::Depth8, &mut output_buf);

            bayer::run_demosaic(
                &mut Cursor::new(&mosaic[..]),
                BayerDepth::Depth8,
                cfa_for(raw_image.pattern),
                Demosaic::Linear,
                &mut output_raster,
            )
            .map_err(|e| CalibrationError::DemosaicError(format!("{:?}", e)))?;
        }

        RgbImage::new(
            width,
            height,
            output_buf.into_iter().map(u16::from).collect(),
            8,
        )
    }
}

impl Default for CpuDebayer {
    fn default() -> Self {
        Self::new()
    }
}

fn cfa_for(pattern: BayerPattern) -> CFA {
    match pattern {
        BayerPattern::Rggb => CFA::RGGB,
        BayerPattern::Grbg => CFA::GRBG,
        BayerPattern::Gbrg => CFA::GBRG,
        BayerPattern::Bggr => CFA::BGGR,
    }
}

/// Min-max stretch of the samples onto 0..=255. A flat input maps to 0.
fn normalize_to_u8(samples: &[u16]) -> Vec<u8> {
    let min = samples.iter().copied().min().unwrap_or(0) as f64;
    let max = samples.iter().copied().max().unwrap_or(0) as f64;
    let range = max - min;
    if range <= 0.0 {
        return vec![0; samples.len()];
    }
    samples
        .iter()
        .map(|&v| ((v as f64 - min) * 255.0 / range).round() as u8)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_stretches_to_full_range() {
        assert_eq!(normalize_to_u8(&[100, 300, 200]), vec![0, 255, 128]);
        assert_eq!(normalize_to_u8(&[7, 7]), vec![0, 0]);
    }

    #[test]
    fn test_process_outputs_rgb_of_same_size() {
        let raw = BayerImage {
            width: 8,
            height: 6,
            data: (0..48).map(|i| (i * 80) as u16).collect(),
            bits_per_sample: 12,
            pattern: BayerPattern::Rggb,
        };
        let rgb = CpuDebayer::new().process(&raw).unwrap();
        assert_eq!((rgb.width, rgb.height, rgb.bits_per_sample), (8, 6, 8));
        assert_eq!(rgb.data.len(), 8 * 6 * 3);
        assert!(rgb.data.iter().all(|&v| v <= 255));
    }

    #[test]
    fn test_rejects_mismatched_buffer() {
        let raw = BayerImage {
            width: 4,
            height: 4,
            data: vec![0; 5],
            bits_per_sample: 8,
            pattern: BayerPattern::Bggr,
        };
        assert!(matches!(
            CpuDebayer::new().process(&raw),
            Err(CalibrationError::InvalidDimensions(4, 4))
        ));
    }
}
