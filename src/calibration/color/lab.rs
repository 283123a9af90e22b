use palette::white_point::D65;
use palette::{FromColor, Srgb};

/// Display gamma exponent used both while scoring candidates and when
/// rendering the corrected preview.
pub const GAMMA: f64 = 0.45;

/// CIE L*a*b* triple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl Lab {
    pub fn new(l: f64, a: f64, b: f64) -> Self {
        Self { l, a, b }
    }
}

impl From<[f64; 3]> for Lab {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// `sign(x) * |x|^0.45`. The solver tries matrices that push some patches
/// negative; a plain `powf` would turn those into NaN.
pub fn signed_gamma(value: f64) -> f64 {
    value.signum() * value.abs().powf(GAMMA)
}

/// Converts a gamma-encoded sRGB triple (nominally 0..=1) to L*a*b* under D65.
///
/// Out-of-range inputs are not clipped: negative and small values go through
/// the linear toe of both the sRGB decode and the Lab companding, so every
/// finite input yields a finite color.
pub fn srgb_to_lab(rgb: [f64; 3]) -> Lab {
    let lab = palette::Lab::<D65, f64>::from_color(Srgb::new(rgb[0], rgb[1], rgb[2]));
    Lab::new(lab.l, lab.a, lab.b)
}
