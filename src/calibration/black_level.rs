//! Black-level calibration from a dark frame.
//!
//! The sensor is capped and a raw frame is captured; the mean of each of the
//! four CFA sites is the pedestal the ISP subtracts from that color.

use tracing::{info, instrument};

use crate::calibration::common::error::{CalibrationError, Result};
use crate::calibration::image::{BayerImage, BayerPattern};

/// Per-color black offsets in sensor code values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlackLevels {
    pub red: u16,
    /// Green sharing a row with red.
    pub green_red: u16,
    /// Green sharing a row with blue.
    pub green_blue: u16,
    pub blue: u16,
}

impl BlackLevels {
    /// Averages the four 2x2 sites of `dark` and assigns them to colors by
    /// its Bayer pattern. Means are truncated to whole code values.
    #[instrument(
        skip_all,
        fields(width = dark.width, height = dark.height, pattern = %dark.pattern)
    )]
    pub fn measure(dark: &BayerImage) -> Result<Self> {
        if dark.width < 2 || dark.height < 2 || dark.data.len() != dark.width * dark.height {
            return Err(CalibrationError::InvalidDimensions(dark.width, dark.height));
        }

        let mut sums = [0u64; 4];
        let mut counts = [0u64; 4];
        for (y, row) in dark.data.chunks_exact(dark.width).enumerate() {
            for (x, &value) in row.iter().enumerate() {
                let site = (y % 2) * 2 + x % 2;
                sums[site] += value as u64;
                counts[site] += 1;
            }
        }
        let means = [0usize, 1, 2, 3].map(|site| (sums[site] / counts[site]) as u16);

        let levels = Self::from_sites(means, dark.pattern);
        info!(
            r = levels.red,
            gr = levels.green_red,
            gb = levels.green_blue,
            b = levels.blue,
            "Black levels measured"
        );
        Ok(levels)
    }

    /// Assigns site values (top-left, top-right, bottom-left, bottom-right)
    /// to colors.
    pub fn from_sites(sites: [u16; 4], pattern: BayerPattern) -> Self {
        let [s0, s1, s2, s3] = sites;
        let (red, green_red, green_blue, blue) = match pattern {
            BayerPattern::Rggb => (s0, s1, s2, s3),
            BayerPattern::Grbg => (s1, s0, s3, s2),
            BayerPattern::Gbrg => (s2, s3, s0, s1),
            BayerPattern::Bggr => (s3, s2, s1, s0),
        };
        Self {
            red,
            green_red,
            green_blue,
            blue,
        }
    }

    /// Inverse of [`Self::from_sites`].
    pub fn to_sites(&self, pattern: BayerPattern) -> [u16; 4] {
        let (r, gr, gb, b) = (self.red, self.green_red, self.green_blue, self.blue);
        match pattern {
            BayerPattern::Rggb => [r, gr, gb, b],
            BayerPattern::Grbg => [gr, r, b, gb],
            BayerPattern::Gbrg => [gb, b, r, gr],
            BayerPattern::Bggr => [b, gb, gr, r],
        }
    }

    /// Subtracts the offsets from every sample of `image`, clipping at zero.
    pub fn apply(&self, image: &BayerImage) -> BayerImage {
        let offsets = self.to_sites(image.pattern);
        let width = image.width.max(1);
        let data = image
            .data
            .iter()
            .enumerate()
            .map(|(i, &value)| {
                let (y, x) = (i / width, i % width);
                value.saturating_sub(offsets[(y % 2) * 2 + x % 2])
            })
            .collect();

        BayerImage {
            width: image.width,
            height: image.height,
            data,
            bits_per_sample: image.bits_per_sample,
            pattern: image.pattern,
        }
    }
}
