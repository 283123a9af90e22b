//! CIEDE2000 color difference and its lightness-free chroma/hue variant.
//!
//! Both metrics share the same geometry; ΔC00 simply drops the ΔL'/S_L term.
//! kL = kC = kH = 1. Angles are handled in degrees and converted at the trig
//! calls.

use crate::calibration::color::lab::Lab;

/// 25^7, the chroma saturation constant in G and R_C.
const POW25_7: f64 = 6_103_515_625.0;

/// Perceptual error used as the CCM objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMetric {
    /// ΔE00: lightness, chroma and hue.
    #[default]
    DeltaE,
    /// ΔC00: chroma and hue only.
    DeltaC,
}

impl ErrorMetric {
    pub fn distance(self, reference: Lab, candidate: Lab) -> f64 {
        match self {
            ErrorMetric::DeltaE => delta_e00(reference, candidate),
            ErrorMetric::DeltaC => delta_c00(reference, candidate),
        }
    }
}

pub fn delta_e00(reference: Lab, candidate: Lab) -> f64 {
    let t = Ciede2000Terms::between(reference, candidate);
    let dl = t.delta_l / t.s_l;
    combine(dl * dl, &t)
}

pub fn delta_c00(reference: Lab, candidate: Lab) -> f64 {
    combine(0.0, &Ciede2000Terms::between(reference, candidate))
}

/// Adds the chroma, hue and rotation terms to `lightness_sq`. A transiently
/// negative radicand is clamped to zero instead of producing NaN.
fn combine(lightness_sq: f64, t: &Ciede2000Terms) -> f64 {
    let dc = t.delta_c / t.s_c;
    let dh = t.delta_h / t.s_h;
    (lightness_sq + dc * dc + dh * dh + t.r_t * dc * dh).max(0.0).sqrt()
}

struct Ciede2000Terms {
    delta_l: f64,
    delta_c: f64,
    delta_h: f64,
    s_l: f64,
    s_c: f64,
    s_h: f64,
    r_t: f64,
}

impl Ciede2000Terms {
    fn between(c1: Lab, c2: Lab) -> Self {
        let chroma1 = c1.a.hypot(c1.b);
        let chroma2 = c2.a.hypot(c2.b);
        let chroma_mean = (chroma1 + chroma2) / 2.0;

        let g = 0.5 * (1.0 - saturation(chroma_mean));
        let a1p = (1.0 + g) * c1.a;
        let a2p = (1.0 + g) * c2.a;

        let c1p = a1p.hypot(c1.b);
        let c2p = a2p.hypot(c2.b);
        let h1p = hue_degrees(c1.b, a1p);
        let h2p = hue_degrees(c2.b, a2p);

        let cp_mean = (c1p + c2p) / 2.0;
        let lp_mean = (c1.l + c2.l) / 2.0;

        let h_mean = if (h1p - h2p).abs() > 180.0 {
            if h1p + h2p < 360.0 {
                (h1p + h2p + 360.0) / 2.0
            } else {
                (h1p + h2p - 360.0) / 2.0
            }
        } else {
            (h1p + h2p) / 2.0
        };

        let mut dh = h2p - h1p;
        if dh > 180.0 {
            dh -= 360.0;
        } else if dh < -180.0 {
            dh += 360.0;
        }
        let delta_h = 2.0 * (c1p * c2p).sqrt() * (dh / 2.0).to_radians().sin();

        let t = 1.0 - 0.17 * (h_mean - 30.0).to_radians().cos()
            + 0.24 * (2.0 * h_mean).to_radians().cos()
            + 0.32 * (3.0 * h_mean + 6.0).to_radians().cos()
            - 0.20 * (4.0 * h_mean - 63.0).to_radians().cos();

        let l50 = (lp_mean - 50.0).powi(2);
        let s_l = 1.0 + 0.015 * l50 / (20.0 + l50).sqrt();
        let s_c = 1.0 + 0.045 * cp_mean;
        let s_h = 1.0 + 0.015 * cp_mean * t;

        let delta_theta = 30.0 * (-((h_mean - 275.0) / 25.0).powi(2)).exp();
        let r_c = 2.0 * saturation(cp_mean);
        let r_t = -r_c * (2.0 * delta_theta).to_radians().sin();

        Self {
            delta_l: c2.l - c1.l,
            delta_c: c2p - c1p,
            delta_h,
            s_l,
            s_c,
            s_h,
            r_t,
        }
    }
}

/// `sqrt(C^7 / (C^7 + 25^7))`
fn saturation(chroma: f64) -> f64 {
    let c7 = chroma.powi(7);
    (c7 / (c7 + POW25_7)).sqrt()
}

/// Hue angle of (a, b) in degrees, wrapped to [0, 360).
fn hue_degrees(b: f64, a: f64) -> f64 {
    let h = b.atan2(a).to_degrees();
    if h < 0.0 { h + 360.0 } else { h }
}
