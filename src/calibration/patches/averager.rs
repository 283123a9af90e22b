use tracing::debug;

use crate::calibration::common::error::{CalibrationError, Result};
use crate::calibration::common::{BLACK_PATCH_INDEX, PATCH_COUNT};
use crate::calibration::image::RgbImage;
use crate::calibration::patches::types::{PatchRect, PatchSet};

/// Per-patch channel means normalised to 0..=1, index-aligned with the
/// [`PatchSet`] they were measured from.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchAverages {
    pub red: Vec<f64>,
    pub green: Vec<f64>,
    pub blue: Vec<f64>,
}

impl PatchAverages {
    pub fn new(red: Vec<f64>, green: Vec<f64>, blue: Vec<f64>) -> Result<Self> {
        if [red.len(), green.len(), blue.len()].iter().any(|&n| n != PATCH_COUNT) {
            return Err(CalibrationError::InvalidPatchSet {
                source_name: "<averages>".to_string(),
                reason: format!(
                    "expected {PATCH_COUNT} averages per channel, found {}/{}/{}",
                    red.len(),
                    green.len(),
                    blue.len()
                ),
            });
        }
        Ok(Self { red, green, blue })
    }

    pub fn channels(&self) -> [&[f64]; 3] {
        [&self.red, &self.green, &self.blue]
    }

    /// Mean of one channel across all patches (0 = red, 1 = green, 2 = blue).
    pub fn channel_mean(&self, channel: usize) -> f64 {
        mean(self.channels()[channel])
    }

    /// Mean of the black patch over its three channels.
    pub fn black_patch_mean(&self) -> f64 {
        (self.red[BLACK_PATCH_INDEX] + self.green[BLACK_PATCH_INDEX] + self.blue[BLACK_PATCH_INDEX])
            / 3.0
    }

    /// Copy with the red and blue sequences multiplied by their gains.
    pub fn scaled_red_blue(&self, red_gain: f64, blue_gain: f64) -> Self {
        Self {
            red: self.red.iter().map(|v| v * red_gain).collect(),
            green: self.green.clone(),
            blue: self.blue.iter().map(|v| v * blue_gain).collect(),
        }
    }
}

/// Crops every patch out of `image` and averages each channel, dividing by the
/// image's maximum channel value.
pub fn average_patches(image: &RgbImage, patches: &PatchSet) -> Result<PatchAverages> {
    let max_value = image.max_value();
    let mut red = Vec::with_capacity(PATCH_COUNT);
    let mut green = Vec::with_capacity(PATCH_COUNT);
    let mut blue = Vec::with_capacity(PATCH_COUNT);

    for (index, rect) in patches.rects().iter().enumerate() {
        check_bounds(index, rect, image)?;

        let mut sums = [0.0f64; 3];
        for y in rect.y0..rect.y1 {
            let row_start = (y * image.width + rect.x0) * 3;
            let row_end = (y * image.width + rect.x1) * 3;
            for px in image.data[row_start..row_end].chunks_exact(3) {
                sums[0] += px[0] as f64;
                sums[1] += px[1] as f64;
                sums[2] += px[2] as f64;
            }
        }

        let count = rect.pixel_count() as f64;
        red.push(sums[0] / count / max_value);
        green.push(sums[1] / count / max_value);
        blue.push(sums[2] / count / max_value);
    }

    debug!(
        "Averaged {} patches, black patch = ({:.4}, {:.4}, {:.4})",
        red.len(),
        red[BLACK_PATCH_INDEX],
        green[BLACK_PATCH_INDEX],
        blue[BLACK_PATCH_INDEX]
    );
    PatchAverages::new(red, green, blue)
}

fn check_bounds(index: usize, rect: &PatchRect, image: &RgbImage) -> Result<()> {
    let degenerate = rect.x1 <= rect.x0 || rect.y1 <= rect.y0;
    if degenerate || rect.x1 > image.width || rect.y1 > image.height {
        return Err(CalibrationError::PatchOutOfBounds {
            index,
            x0: rect.x0,
            y0: rect.y0,
            x1: rect.x1,
            y1: rect.y1,
            width: image.width,
            height: image.height,
        });
    }
    Ok(())
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
