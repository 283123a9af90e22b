//! Gray-row white balance.
//!
//! Red and blue gains are chosen so that the inner gray patches come out with
//! equal channels. They scale the chart image and, without re-cropping, the
//! patch averages that feed the CCM solve.

use tracing::{debug, info};

use crate::calibration::common::GRAY_ROW_INNER;
use crate::calibration::image::RgbImage;
use crate::calibration::patches::PatchAverages;
use crate::calibration::patches::mean;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhiteBalanceGains {
    pub red: f64,
    pub blue: f64,
}

impl WhiteBalanceGains {
    /// Averages the per-patch `green / red` and `green / blue` ratios over the
    /// inner gray patches and rounds each gain to 4 decimals. A zero red or blue
    /// sample contributes a ratio of 1.
    pub fn estimate(averages: &PatchAverages) -> Self {
        let mut red_samples = Vec::with_capacity(GRAY_ROW_INNER.len());
        let mut blue_samples = Vec::with_capacity(GRAY_ROW_INNER.len());

        for i in GRAY_ROW_INNER {
            red_samples.push(gain_sample(averages.green[i], averages.red[i]));
            blue_samples.push(gain_sample(averages.green[i], averages.blue[i]));
        }
        debug!("Gray-row gain samples: red {:?}, blue {:?}", red_samples, blue_samples);

        let gains = Self {
            red: round_to_4_decimals(mean(&red_samples)),
            blue: round_to_4_decimals(mean(&blue_samples)),
        };
        info!(red_gain = gains.red, blue_gain = gains.blue, "White-balance gains estimated");
        gains
    }

    /// Multiplies the red and blue planes, leaving green untouched, then clips
    /// to the image's channel range and rounds to the nearest level.
    pub fn apply_to_image(&self, image: &RgbImage) -> RgbImage {
        let max_value = image.max_value();
        let gains = [self.red, 1.0, self.blue];

        let data = image
            .data
            .chunks_exact(3)
            .flat_map(|px| {
                let mut out = [0u16; 3];
                for c in 0..3 {
                    out[c] = (px[c] as f64 * gains[c]).clamp(0.0, max_value).round() as u16;
                }
                out
            })
            .collect();

        RgbImage {
            width: image.width,
            height: image.height,
            data,
            bits_per_sample: image.bits_per_sample,
        }
    }

    pub fn apply_to_averages(&self, averages: &PatchAverages) -> PatchAverages {
        averages.scaled_red_blue(self.red, self.blue)
    }
}

fn gain_sample(green: f64, other: f64) -> f64 {
    if other == 0.0 { 1.0 } else { green / other }
}

fn round_to_4_decimals(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::common::PATCH_COUNT;

    fn averages_with_gray(red: [f64; 4], green: [f64; 4], blue: [f64; 4]) -> PatchAverages {
        let mut r = vec![0.5; PATCH_COUNT];
        let mut g = vec![0.5; PATCH_COUNT];
        let mut b = vec![0.5; PATCH_COUNT];
        for (k, i) in GRAY_ROW_INNER.enumerate() {
            r[i] = red[k];
            g[i] = green[k];
            b[i] = blue[k];
        }
        // extreme gray-row patches must not influence the gains
        r[18] = 0.01;
        b[23] = 0.9;
        PatchAverages::new(r, g, b).unwrap()
    }

    #[test]
    fn test_gains_equalise_green() {
        let averages = averages_with_gray(
            [0.25, 0.2, 0.1, 0.05],
            [0.5, 0.4, 0.2, 0.1],
            [0.4, 0.32, 0.16, 0.08],
        );
        let gains = WhiteBalanceGains::estimate(&averages);
        assert_eq!(gains.red, 2.0);
        assert_eq!(gains.blue, 1.25);
    }

    #[test]
    fn test_gains_rounded_to_four_decimals() {
        let averages = averages_with_gray([0.3; 4], [0.4; 4], [0.7; 4]);
        let gains = WhiteBalanceGains::estimate(&averages);
        assert_eq!(gains.red, 1.3333);
        assert_eq!(gains.blue, 0.5714);
    }

    #[test]
    fn test_zero_channel_sample_is_unity() {
        let averages = averages_with_gray([0.0, 0.0, 0.0, 0.0], [0.3; 4], [0.0, 0.0, 0.0, 0.0]);
        let gains = WhiteBalanceGains::estimate(&averages);
        assert_eq!(gains.red, 1.0);
        assert_eq!(gains.blue, 1.0);

        let mixed = averages_with_gray([0.0, 0.1, 0.1, 0.1], [0.2; 4], [0.2; 4]);
        let gains = WhiteBalanceGains::estimate(&mixed);
        assert!(gains.red.is_finite());
        assert_eq!(gains.red, 1.75);
    }

    #[test]
    fn test_apply_to_image_clips_and_rounds() {
        let image = RgbImage::new(2, 1, vec![100, 50, 200, 10, 20, 3], 8).unwrap();
        let gains = WhiteBalanceGains { red: 3.0, blue: 0.5 };
        let balanced = gains.apply_to_image(&image);
        assert_eq!(balanced.data, vec![255, 50, 100, 30, 20, 2]);
    }

    #[test]
    fn test_apply_to_averages_is_scalar() {
        let averages = averages_with_gray([0.2; 4], [0.4; 4], [0.1; 4]);
        let gains = WhiteBalanceGains::estimate(&averages);
        let balanced = gains.apply_to_averages(&averages);
        for i in GRAY_ROW_INNER {
            assert!((balanced.red[i] - balanced.green[i]).abs() < 1e-12);
            assert!((balanced.blue[i] - balanced.green[i]).abs() < 1e-12);
        }
        assert_eq!(balanced.green, averages.green);
    }
}
