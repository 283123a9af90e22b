//! Perceptual color math: sRGB to CIE L*a*b* and the CIE-2000 differences

mod delta;
mod lab;

pub use delta::{ErrorMetric, delta_c00, delta_e00};
pub use lab::{GAMMA, Lab, signed_gamma, srgb_to_lab};
