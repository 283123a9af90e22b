use nalgebra::Vector3;
use tracing::instrument;

use crate::calibration::ccm::types::CcmMatrix;
use crate::calibration::color::GAMMA;
use crate::calibration::image::RgbImage;

/// Renders the corrected preview: each pixel is multiplied by `matrix`,
/// normalised to 0..=1, gamma encoded, clipped and scaled back to the
/// image's bit depth. Fractional levels are truncated and negative
/// results go to 0.
#[instrument(skip_all, fields(width = image.width, height = image.height))]
pub fn apply_ccm(image: &RgbImage, matrix: &CcmMatrix) -> RgbImage {
    let max_value = image.max_value();

    let data = image
        .data
        .chunks_exact(3)
        .flat_map(|px| {
            let corrected = matrix * Vector3::new(px[0] as f64, px[1] as f64, px[2] as f64);
            [0, 1, 2].map(|c| {
                let encoded = (corrected[c].max(0.0) / max_value).powf(GAMMA).min(1.0);
                (encoded * max_value) as u16
            })
        })
        .collect();

    RgbImage {
        width: image.width,
        height: image.height,
        data,
        bits_per_sample: image.bits_per_sample,
    }
}
