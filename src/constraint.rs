//! Feasibility constraints for constrained decoder fitting.
//!
//! A constraint projects a candidate coefficient vector back into its feasible
//! region in place. `correct()` returns `true` when the pass changed nothing,
//! which is the approximator's signal that the vector is feasible as-is.
//!
//! The set of constraints is closed: the approximator matches on
//! [`FeasibilityConstraint`] rather than calling through a trait object.

use crate::error::{BiasError, Result};
use crate::neuron::Polarity;

/// Forces every coefficient to the sign of a polarity. Wrong-signed
/// coefficients are zeroed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignUniform {
    polarity: Polarity,
}

impl SignUniform {
    pub fn new(polarity: Polarity) -> Self {
        Self { polarity }
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Zero wrong-signed coefficients. Returns `true` iff none needed zeroing.
    pub fn correct(&self, coefficients: &mut [f32]) -> bool {
        let mut clean = true;
        for c in coefficients.iter_mut() {
            if !self.polarity.admits(*c) {
                *c = 0.0;
                clean = false;
            }
        }
        clean
    }
}

/// Keeps bias decoders large enough that every post-synaptic bias encoder can
/// absorb the base projection's weights: `-W[j][i] / c_i <= E[j]` for all i, j.
#[derive(Clone, Debug, PartialEq)]
pub struct BiasEncoderBounded {
    /// base_weights[j][i]: weight from unit i to post-synaptic dimension j.
    base_weights: Vec<Vec<f32>>,
    /// bias_encoders[j]: bias encoder of post-synaptic dimension j.
    bias_encoders: Vec<f32>,
}

impl BiasEncoderBounded {
    pub fn new(base_weights: Vec<Vec<f32>>, bias_encoders: Vec<f32>) -> Result<Self> {
        if bias_encoders.is_empty() {
            return Err(BiasError::EmptyInput("bias encoders".into()));
        }
        if base_weights.len() != bias_encoders.len() {
            return Err(BiasError::DimensionMismatch {
                expected: bias_encoders.len(),
                got: base_weights.len(),
            });
        }
        let width = base_weights[0].len();
        if width == 0 {
            return Err(BiasError::EmptyInput("base weights".into()));
        }
        for row in &base_weights {
            if row.len() != width {
                return Err(BiasError::DimensionMismatch {
                    expected: width,
                    got: row.len(),
                });
            }
            if row.iter().any(|w| !w.is_finite()) {
                return Err(BiasError::InvalidInput("base weights must be finite".into()));
            }
        }
        if let Some(e) = bias_encoders.iter().find(|e| !(**e > 0.0 && e.is_finite())) {
            return Err(BiasError::InvalidInput(format!(
                "bias encoder {e} must be positive and finite"
            )));
        }
        Ok(Self {
            base_weights,
            bias_encoders,
        })
    }

    /// Number of presynaptic units the weights cover.
    pub fn n_units(&self) -> usize {
        self.base_weights[0].len()
    }

    /// Number of post-synaptic dimensions.
    pub fn n_dims(&self) -> usize {
        self.bias_encoders.len()
    }

    /// Whether coefficient `c` for unit `unit` breaks the bound of any dimension.
    pub fn violates(&self, unit: usize, c: f32) -> bool {
        self.base_weights
            .iter()
            .zip(&self.bias_encoders)
            .any(|(row, &e)| -row[unit] / c > e)
    }

    /// One correction pass over all coefficients. Returns `true` iff no
    /// coefficient changed.
    ///
    /// A negative coefficient is first lifted to the smallest positive float;
    /// each violated dimension then raises it to `-W[j][i] / E[j]`. Raising for
    /// one dimension can uncover a violation in an earlier one, so callers
    /// repeat passes until one comes back clean.
    pub fn correct(&self, coefficients: &mut [f32]) -> bool {
        debug_assert_eq!(coefficients.len(), self.n_units());
        let mut clean = true;
        for (i, c) in coefficients.iter_mut().enumerate() {
            if *c < 0.0 {
                *c = f32::MIN_POSITIVE;
                clean = false;
            }
            for (row, &e) in self.base_weights.iter().zip(&self.bias_encoders) {
                if -row[i] / *c > e {
                    let bound = -row[i] / e;
                    // Rounding can leave -W/bound a hair above E; only an
                    // actual change counts as a correction.
                    if bound != *c {
                        *c = bound;
                        clean = false;
                    }
                }
            }
        }
        clean
    }
}

/// The closed set of constraints the approximator understands.
#[derive(Clone, Debug, PartialEq)]
pub enum FeasibilityConstraint {
    SignUniform(SignUniform),
    BiasEncoderBounded(BiasEncoderBounded),
}

impl FeasibilityConstraint {
    /// Apply one correction pass. Returns `true` iff nothing changed.
    pub fn correct(&self, coefficients: &mut [f32]) -> bool {
        match self {
            Self::SignUniform(c) => c.correct(coefficients),
            Self::BiasEncoderBounded(c) => c.correct(coefficients),
        }
    }

    /// Coefficient count the constraint was built for, if it fixes one.
    pub fn expected_len(&self) -> Option<usize> {
        match self {
            Self::SignUniform(_) => None,
            Self::BiasEncoderBounded(c) => Some(c.n_units()),
        }
    }
}

impl From<SignUniform> for FeasibilityConstraint {
    fn from(c: SignUniform) -> Self {
        Self::SignUniform(c)
    }
}

impl From<BiasEncoderBounded> for FeasibilityConstraint {
    fn from(c: BiasEncoderBounded) -> Self {
        Self::BiasEncoderBounded(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_uniform_zeroes_wrong_sign() {
        let c = SignUniform::new(Polarity::Excitatory);
        let mut v = vec![0.5, -0.25, 0.0, -1.0];
        assert!(!c.correct(&mut v));
        assert_eq!(v, vec![0.5, 0.0, 0.0, 0.0]);

        let c = SignUniform::new(Polarity::Inhibitory);
        let mut v = vec![0.5, -0.25, 0.0];
        assert!(!c.correct(&mut v));
        assert_eq!(v, vec![0.0, -0.25, 0.0]);
    }

    #[test]
    fn sign_uniform_reports_clean_vector() {
        let c = SignUniform::new(Polarity::Excitatory);
        let mut v = vec![0.5, 0.0, 2.0];
        assert!(c.correct(&mut v));
        assert_eq!(v, vec![0.5, 0.0, 2.0]);
    }

    #[test]
    fn sign_uniform_is_idempotent() {
        for polarity in [Polarity::Excitatory, Polarity::Inhibitory] {
            let c = SignUniform::new(polarity);
            let mut once = vec![0.3, -0.7, 1.2, -0.01, 0.0, 5.0];
            c.correct(&mut once);
            let mut twice = once.clone();
            assert!(c.correct(&mut twice), "second pass must be clean");
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn bounded_rejects_bad_shapes() {
        assert!(matches!(
            BiasEncoderBounded::new(vec![vec![1.0]], vec![]),
            Err(BiasError::EmptyInput(_))
        ));
        assert!(matches!(
            BiasEncoderBounded::new(vec![vec![1.0]], vec![1.0, 1.0]),
            Err(BiasError::DimensionMismatch { expected: 2, got: 1 })
        ));
        assert!(matches!(
            BiasEncoderBounded::new(vec![vec![1.0, 2.0], vec![1.0]], vec![1.0, 1.0]),
            Err(BiasError::DimensionMismatch { expected: 2, got: 1 })
        ));
        assert!(matches!(
            BiasEncoderBounded::new(vec![vec![1.0]], vec![0.0]),
            Err(BiasError::InvalidInput(_))
        ));
    }

    #[test]
    fn bounded_lifts_negative_coefficients() {
        // Non-negative weights impose no lower bound beyond positivity
        let c = BiasEncoderBounded::new(vec![vec![0.5, 0.0]], vec![1.0]).unwrap();
        let mut v = vec![-1.0, -2.0];
        assert!(!c.correct(&mut v));
        assert_eq!(v, vec![f32::MIN_POSITIVE, f32::MIN_POSITIVE]);
        assert!(c.correct(&mut v));
    }

    #[test]
    fn bounded_raises_to_tightest_dimension() {
        // Unit 0 bounds: 0.5/0.25 = 2 and 1/1 = 1 -> needs c >= 2
        let w = vec![vec![-0.5, 1.0], vec![-1.0, -0.25]];
        let e = vec![0.25, 1.0];
        let c = BiasEncoderBounded::new(w, e).unwrap();

        let mut v = vec![0.5, 0.125];
        assert!(!c.correct(&mut v));
        assert_eq!(v, vec![2.0, 0.25]);
        assert!(c.correct(&mut v), "fixed point after one pass");
    }

    #[test]
    fn bounded_fixed_point_has_no_violations() {
        let w = vec![
            vec![-0.3, 0.2, -1.7, -0.05, 0.9],
            vec![-1.1, -0.4, 0.6, -0.8, -0.2],
            vec![0.25, -2.0, -0.1, -0.6, 0.0],
        ];
        let e = vec![0.7, 1.3, 0.45];
        let c = BiasEncoderBounded::new(w.clone(), e.clone()).unwrap();

        let mut v = vec![0.01, -3.0, 0.5, 10.0, -0.2];
        let mut passes = 0;
        while !c.correct(&mut v) {
            passes += 1;
            assert!(passes < 10, "must reach a fixed point");
        }
        for i in 0..v.len() {
            assert!(v[i] > 0.0);
            for j in 0..e.len() {
                let ratio = -w[j][i] / v[i];
                assert!(ratio <= e[j] * (1.0 + 1e-6), "unit {i} dim {j}: {ratio} > {}", e[j]);
            }
        }
        // Already-feasible coefficients are left alone
        assert_eq!(v[3], 10.0);
    }

    #[test]
    fn enum_dispatch() {
        let f: FeasibilityConstraint = SignUniform::new(Polarity::Inhibitory).into();
        let mut v = vec![1.0, -1.0];
        assert!(!f.correct(&mut v));
        assert_eq!(v, vec![0.0, -1.0]);
        assert_eq!(f.expected_len(), None);

        let f: FeasibilityConstraint =
            BiasEncoderBounded::new(vec![vec![-1.0, -1.0]], vec![1.0]).unwrap().into();
        assert_eq!(f.expected_len(), Some(2));
    }
}
