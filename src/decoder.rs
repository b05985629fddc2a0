//! First-cut bias decoders.
//!
//! Every unit gets the same decoder, scaled so the decoded bias peaks at
//! exactly ±1 over the constant-output sample. A uniform decoder is trivially
//! sign-uniform, and peaking at unit magnitude keeps the bias channel as large
//! as it can be without clipping.

use crate::error::{BiasError, Result};
use crate::eval::EvaluationSet;
use crate::neuron::Polarity;

/// The shared decoder value: `±1 / peak`, where `peak` is the largest
/// column sum of `constant_outputs`.
pub fn bias_decoder(constant_outputs: &EvaluationSet, polarity: Polarity) -> Result<f32> {
    let peak = constant_outputs
        .column_sums()
        .into_iter()
        .fold(f32::NEG_INFINITY, f32::max);
    if !(peak > 0.0 && peak.is_finite()) {
        return Err(BiasError::DegenerateEvaluation { peak });
    }
    let decoder = polarity.sign() / peak;
    if !decoder.is_finite() {
        return Err(BiasError::DegenerateEvaluation { peak });
    }
    Ok(decoder)
}

/// One copy of [`bias_decoder`] per unit.
pub fn uniform_bias_decoders(constant_outputs: &EvaluationSet, polarity: Polarity) -> Result<Vec<f32>> {
    let decoder = bias_decoder(constant_outputs, polarity)?;
    Ok(vec![decoder; constant_outputs.n_units()])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(rows: Vec<Vec<f32>>) -> EvaluationSet {
        EvaluationSet::from_outputs(rows).unwrap()
    }

    #[test]
    fn peak_of_column_sums() {
        // Column sums [2, 4, 1, 3] -> peak 4
        let outputs = set(vec![
            vec![1.0, 2.0, 0.5, 1.0],
            vec![0.5, 1.0, 0.25, 1.0],
            vec![0.5, 1.0, 0.25, 1.0],
        ]);
        let d = uniform_bias_decoders(&outputs, Polarity::Excitatory).unwrap();
        assert_eq!(d, vec![0.25, 0.25, 0.25]);
        let d = uniform_bias_decoders(&outputs, Polarity::Inhibitory).unwrap();
        assert_eq!(d, vec![-0.25, -0.25, -0.25]);
    }

    #[test]
    fn decoded_peak_is_unit_magnitude() {
        let outputs = set(vec![
            vec![12.0, 40.0, 3.5, 77.0, 0.0],
            vec![90.0, 10.0, 55.0, 20.0, 1.0],
            vec![0.0, 33.0, 14.0, 8.0, 60.0],
            vec![41.0, 2.0, 19.0, 66.0, 5.0],
        ]);
        for polarity in [Polarity::Excitatory, Polarity::Inhibitory] {
            let d = uniform_bias_decoders(&outputs, polarity).unwrap();
            let out = outputs.decode(&d).unwrap();
            let peak = out.iter().fold(0.0f32, |m, v| m.max(v.abs()));
            assert!((peak - 1.0).abs() < 1e-5, "{polarity}: peak {peak}");
            assert!(out.iter().all(|&v| polarity.admits(v)), "{polarity}: {out:?}");
        }
    }

    #[test]
    fn zero_outputs_fail_fast() {
        let outputs = set(vec![vec![0.0, 0.0], vec![0.0, 0.0]]);
        let err = bias_decoder(&outputs, Polarity::Excitatory).unwrap_err();
        assert!(matches!(err, BiasError::DegenerateEvaluation { .. }));
    }

    #[test]
    fn negative_outputs_fail_fast() {
        let outputs = set(vec![vec![-1.0, -2.0]]);
        assert!(matches!(
            uniform_bias_decoders(&outputs, Polarity::Inhibitory),
            Err(BiasError::DegenerateEvaluation { .. })
        ));
    }

    #[test]
    fn subnormal_peak_fails_fast() {
        let outputs = set(vec![vec![1e-40]]);
        assert!(bias_decoder(&outputs, Polarity::Excitatory).is_err());
    }
}
