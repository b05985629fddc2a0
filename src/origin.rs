//! The bias origin: decoder, range, and interneuron population for one
//! sign-uniform projection.
//!
//! Forcing a projection's weights to one sign introduces an extra current in
//! the post-synaptic population. The bias origin decodes a matching signal
//! from the pre-synaptic population's response to a constant input, then
//! routes it through interneurons that cancel it again downstream.
//!
//! ```text
//! pre ──bias decoders──▶ forward termination ──▶ interneurons ──▶ cancel termination ──▶ post
//! ```

use std::sync::Arc;

use crate::approximator::{Convergence, GradientDescentApproximator};
use crate::channel::{self, ChannelTransforms};
use crate::config::BiasConfig;
use crate::constraint::{BiasEncoderBounded, FeasibilityConstraint};
use crate::decoder::uniform_bias_decoders;
use crate::error::{BiasError, Result};
use crate::eval::{EvaluationSet, OutputRange};
use crate::neuron::Polarity;
use crate::population::{InterneuronPopulation, InterneuronSpec};
use crate::stats::BiasStats;
use crate::termination::Termination;

/// Bias pathway for a single projection.
#[derive(Clone, Debug)]
pub struct BiasOrigin {
    name: String,
    polarity: Polarity,
    /// Pre-synaptic responses to a constant input. Shared with the caller.
    constant_outputs: Arc<EvaluationSet>,
    decoders: Vec<f32>,
    /// Decoded bias at each evaluation point. Refreshed with the decoders.
    output: Vec<f32>,
    range: OutputRange,
    interneurons: InterneuronPopulation,
    config: BiasConfig,
    last_convergence: Option<Convergence>,
}

impl BiasOrigin {
    /// Build the bias origin: uniform decoders scaled to a unit peak, plus an
    /// interneuron population of `num_interneurons` units named
    /// `"{name}:interneurons"`.
    pub fn new(
        name: &str,
        constant_outputs: Arc<EvaluationSet>,
        num_interneurons: usize,
        polarity: Polarity,
        config: &BiasConfig,
    ) -> Result<Self> {
        if name.is_empty() {
            return Err(BiasError::Structural("bias origin needs a name".into()));
        }
        let decoders = uniform_bias_decoders(&constant_outputs, polarity)?;
        let output = constant_outputs.decode(&decoders)?;
        let range = range_of(&output)?;

        let spec = InterneuronSpec::for_polarity(polarity)?;
        let interneurons =
            InterneuronPopulation::build(&format!("{name}:interneurons"), num_interneurons, &spec, config)?;

        log::debug!(
            "[BIAS] {}: {} decoders = {:.4e}, range {}, {} interneurons",
            name,
            polarity,
            decoders[0],
            range,
            interneurons.len()
        );

        Ok(Self {
            name: name.to_string(),
            polarity,
            constant_outputs,
            decoders,
            output,
            range,
            interneurons,
            config: config.clone(),
            last_convergence: None,
        })
    }

    /// Refine the decoders so every post-synaptic bias encoder can absorb the
    /// base projection's weights.
    ///
    /// `base_weights[j][i]` is the weight from unit i to post-synaptic
    /// dimension j, and `bias_encoders[j]` that dimension's bias encoder. The
    /// fit flattens the decoded bias (target 0, mean ignored) starting from
    /// the current decoders. The result replaces them whether or not the
    /// descent converged.
    pub fn optimize_decoders(
        &mut self,
        base_weights: Vec<Vec<f32>>,
        bias_encoders: Vec<f32>,
    ) -> Result<Convergence> {
        let constraint: FeasibilityConstraint =
            BiasEncoderBounded::new(base_weights, bias_encoders)?.into();
        let approximator = GradientDescentApproximator::new(self.config.approximator.clone(), true);
        let fit = approximator.optimize(&self.constant_outputs, |_| 0.0, &constraint, &self.decoders)?;

        let output = self.constant_outputs.decode(&fit.coefficients)?;
        let range = range_of(&output)?;

        if fit.convergence.is_converged() {
            log::debug!(
                "[BIAS] {}: decoders converged in {} iterations, range {}",
                self.name, fit.iterations, range
            );
        } else {
            log::warn!(
                "[BIAS] {}: decoder fit {} after {} iterations, range {}",
                self.name, fit.convergence, fit.iterations, range
            );
        }

        self.decoders = fit.coefficients;
        self.output = output;
        self.range = range;
        self.last_convergence = Some(fit.convergence);
        Ok(fit.convergence)
    }

    /// Tune the two terminations of the interneuron channel to the current
    /// bias range and return the transforms that were written.
    pub fn optimize_interneuron_domain<F, C>(&self, forward: &mut F, cancel: &mut C) -> Result<ChannelTransforms>
    where
        F: Termination + ?Sized,
        C: Termination + ?Sized,
    {
        let transforms = channel::tune(self.range)?;
        forward.set_transform(transforms.forward);
        cancel.set_transform(transforms.cancel);

        log::debug!(
            "[BIAS] {}: '{}' <- {}, '{}' <- {}",
            self.name,
            forward.name(),
            transforms.forward,
            cancel.name(),
            transforms.cancel
        );

        Ok(transforms)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn decoders(&self) -> &[f32] {
        &self.decoders
    }

    /// Range of the decoded bias across the constant-output sample.
    pub fn range(&self) -> OutputRange {
        self.range
    }

    /// Decoded bias at each evaluation point.
    pub fn output(&self) -> &[f32] {
        &self.output
    }

    pub fn constant_outputs(&self) -> &Arc<EvaluationSet> {
        &self.constant_outputs
    }

    pub fn interneurons(&self) -> &InterneuronPopulation {
        &self.interneurons
    }

    /// Mutable access for attaching further decoded origins.
    pub fn interneurons_mut(&mut self) -> &mut InterneuronPopulation {
        &mut self.interneurons
    }

    /// Outcome of the most recent `optimize_decoders`, if any ran.
    pub fn last_convergence(&self) -> Option<Convergence> {
        self.last_convergence
    }

    pub fn stats(&self) -> BiasStats {
        BiasStats::from_origin(self)
    }
}

fn range_of(output: &[f32]) -> Result<OutputRange> {
    OutputRange::of(output).ok_or_else(|| BiasError::EmptyInput("decoded bias".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::termination::DecodedTermination;

    fn config() -> BiasConfig {
        let mut config = BiasConfig::default();
        config.population.eval_points_per_dim = 100;
        config.approximator.max_iterations = 200;
        config
    }

    fn three_by_four() -> Arc<EvaluationSet> {
        // Column sums [2, 4, 1, 3]
        Arc::new(
            EvaluationSet::from_outputs(vec![
                vec![1.0, 2.0, 0.5, 1.0],
                vec![0.5, 1.0, 0.25, 1.0],
                vec![0.5, 1.0, 0.25, 1.0],
            ])
            .unwrap(),
        )
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn initial_decoders_and_range() {
        let origin = BiasOrigin::new("proj", three_by_four(), 10, Polarity::Excitatory, &config()).unwrap();
        assert_eq!(origin.decoders(), &[0.25, 0.25, 0.25]);
        assert_eq!(origin.range(), OutputRange::new(0.25, 1.0));
        assert_eq!(origin.output(), &[0.5, 1.0, 0.25, 0.75]);
        assert_eq!(origin.interneurons().name(), "proj:interneurons");
        assert_eq!(origin.interneurons().len(), 10);
        assert_eq!(origin.last_convergence(), None);
    }

    #[test]
    fn identical_rows_peak_at_unit_magnitude() {
        let row = vec![3.0, 1.0, 4.0, 1.5];
        let outputs = Arc::new(EvaluationSet::from_outputs(vec![row.clone(); 5]).unwrap());

        let exc = BiasOrigin::new("e", outputs.clone(), 8, Polarity::Excitatory, &config()).unwrap();
        assert!(close(exc.range().max, 1.0));
        assert!(close(exc.range().min, 0.25));

        let inh = BiasOrigin::new("i", outputs, 8, Polarity::Inhibitory, &config()).unwrap();
        assert!(close(inh.range().min, -1.0));
        assert!(close(inh.range().max, -0.25));
        assert_eq!(inh.interneurons().polarity(), Polarity::Inhibitory);
    }

    #[test]
    fn interneuron_domain_for_quarter_range() {
        let origin = BiasOrigin::new("proj", three_by_four(), 10, Polarity::Excitatory, &config()).unwrap();
        let mut forward = DecodedTermination::new("bias_in");
        let mut cancel = DecodedTermination::new("bias_cancel");
        let t = origin.optimize_interneuron_domain(&mut forward, &mut cancel).unwrap();

        assert_eq!(forward.transform(), t.forward);
        assert_eq!(cancel.transform(), t.cancel);
        assert!(close(t.forward.offset, -0.0625));
        assert!(close(t.forward.scale, 1.0 / 0.9375));
        assert!(close(t.cancel.offset, 0.0625 / 0.9375));
        assert!(close(t.cancel.scale, -0.9375));

        // Every bias value is cancelled by the interneuron path
        for &x in origin.output() {
            assert!((cancel.drive(forward.drive(x)) + x).abs() < 1e-5);
        }
    }

    #[test]
    fn reoptimizing_is_a_fixed_point() {
        let mut origin = BiasOrigin::new("proj", three_by_four(), 10, Polarity::Excitatory, &config()).unwrap();
        // -W/c <= E with W = -1, E = 1 needs every decoder >= 1
        let weights = vec![vec![-1.0, -1.0, -1.0]];
        let encoders = vec![1.0];

        origin.optimize_decoders(weights.clone(), encoders.clone()).unwrap();
        let first = origin.decoders().to_vec();
        assert_eq!(first, vec![1.0, 1.0, 1.0]);
        assert_eq!(origin.range(), OutputRange::new(1.0, 4.0));

        let outcome = origin.optimize_decoders(weights, encoders).unwrap();
        assert_eq!(outcome, Convergence::Converged);
        assert_eq!(origin.decoders(), first.as_slice());
        assert_eq!(origin.last_convergence(), Some(Convergence::Converged));
    }

    #[test]
    fn optimized_decoders_respect_encoder_bounds() {
        let mut origin = BiasOrigin::new("proj", three_by_four(), 10, Polarity::Excitatory, &config()).unwrap();
        let weights = vec![vec![-0.5, 0.2, -2.0], vec![0.1, -0.3, 0.4]];
        let encoders = vec![2.0, 0.5];
        origin.optimize_decoders(weights.clone(), encoders.clone()).unwrap();

        for (i, &c) in origin.decoders().iter().enumerate() {
            assert!(c > 0.0);
            for (row, &e) in weights.iter().zip(&encoders) {
                assert!(-row[i] / c <= e * (1.0 + 1e-6), "unit {i}: c={c}");
            }
        }
        // Range follows the new decoders
        let expected = origin.constant_outputs().decoded_range(origin.decoders()).unwrap();
        assert_eq!(origin.range(), expected);
    }

    #[test]
    fn bad_refinement_inputs_leave_state_alone() {
        let mut origin = BiasOrigin::new("proj", three_by_four(), 10, Polarity::Excitatory, &config()).unwrap();
        // Weight rows cover 2 units, population has 3
        let err = origin
            .optimize_decoders(vec![vec![-1.0, -1.0]], vec![1.0])
            .unwrap_err();
        assert!(matches!(err, BiasError::DimensionMismatch { expected: 2, got: 3 }));
        assert!(origin.optimize_decoders(vec![vec![-1.0; 3]], vec![0.0]).is_err());

        assert_eq!(origin.decoders(), &[0.25, 0.25, 0.25]);
        assert_eq!(origin.last_convergence(), None);
    }

    #[test]
    fn construction_failures() {
        let zeros = Arc::new(EvaluationSet::from_outputs(vec![vec![0.0; 4]; 3]).unwrap());
        assert!(matches!(
            BiasOrigin::new("proj", zeros, 10, Polarity::Excitatory, &config()),
            Err(BiasError::DegenerateEvaluation { .. })
        ));
        assert!(matches!(
            BiasOrigin::new("proj", three_by_four(), 0, Polarity::Excitatory, &config()),
            Err(BiasError::Structural(_))
        ));
        assert!(matches!(
            BiasOrigin::new("", three_by_four(), 10, Polarity::Excitatory, &config()),
            Err(BiasError::Structural(_))
        ));
    }

    #[test]
    fn flat_bias_cannot_be_tuned() {
        // One evaluation point gives a zero-width range
        let single = Arc::new(EvaluationSet::from_outputs(vec![vec![2.0], vec![2.0]]).unwrap());
        let origin = BiasOrigin::new("flat", single, 6, Polarity::Excitatory, &config()).unwrap();
        assert_eq!(origin.range(), OutputRange::new(1.0, 1.0));

        let mut forward = DecodedTermination::new("in");
        let mut cancel = DecodedTermination::new("out");
        assert!(matches!(
            origin.optimize_interneuron_domain(&mut forward, &mut cancel),
            Err(BiasError::DegenerateRange { .. })
        ));
        assert_eq!(forward.transform(), crate::termination::TerminationTransform::identity());
    }
}
