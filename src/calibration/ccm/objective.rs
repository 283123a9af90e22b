use nalgebra::Vector3;

use crate::calibration::ccm::types::{CcmInputs, CcmMatrix};
use crate::calibration::color::{ErrorMetric, Lab, signed_gamma, srgb_to_lab};

/// Mean squared perceptual error of a candidate matrix over the chart.
#[derive(Debug, Clone)]
pub struct CcmObjective {
    /// Observed patch colors already multiplied by the amplitude factor.
    scaled_input: Vec<Vector3<f64>>,
    reference_lab: Vec<Lab>,
    metric: ErrorMetric,
}

impl CcmObjective {
    pub fn new(inputs: &CcmInputs) -> Self {
        let observed = &inputs.observed;
        let scaled_input = (0..observed.red.len())
            .map(|i| {
                Vector3::new(observed.red[i], observed.green[i], observed.blue[i])
                    * inputs.amplitude_factor
            })
            .collect();

        Self {
            scaled_input,
            reference_lab: inputs.reference_lab.clone(),
            metric: inputs.metric,
        }
    }

    /// Scores a row-major 9-vector. Vectors of any other length score +inf.
    pub fn evaluate(&self, params: &[f64]) -> f64 {
        if params.len() != 9 {
            return f64::INFINITY;
        }
        self.evaluate_matrix(&CcmMatrix::from_row_slice(params))
    }

    pub fn evaluate_matrix(&self, matrix: &CcmMatrix) -> f64 {
        let errors = self.patch_errors(matrix);
        errors.iter().map(|e| e * e).sum::<f64>() / errors.len() as f64
    }

    /// Per-patch distance between the corrected patch and its reference.
    pub fn patch_errors(&self, matrix: &CcmMatrix) -> Vec<f64> {
        self.scaled_input
            .iter()
            .zip(&self.reference_lab)
            .map(|(input, &reference)| {
                let predicted = matrix * input;
                let encoded = [
                    signed_gamma(predicted[0]),
                    signed_gamma(predicted[1]),
                    signed_gamma(predicted[2]),
                ];
                self.metric.distance(reference, srgb_to_lab(encoded))
            })
            .collect()
    }
}
