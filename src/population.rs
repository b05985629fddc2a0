//! Interneuron population synthesis.
//!
//! The interneurons relay the bias signal from the bias origin to the
//! cancelling termination. Their makeup depends on the projection's polarity:
//!
//! | Polarity   | Intercepts     | Max rates (Hz) | Eval shift | Default origin |
//! |------------|----------------|----------------|------------|----------------|
//! | Excitatory | U(-0.15, 0.5)  | U(200, 500)    | +0.5       | x              |
//! | Inhibitory | U(-1.2, 0.1)   | U(400, 800)    | -0.5       | -1 - x         |
//!
//! Encoders are rectified positive in both cases. Every decoded origin is
//! fitted under a sign constraint matching the polarity, so the interneurons'
//! own outgoing weights obey Dale's law too.

use crate::approximator::{Convergence, GradientDescentApproximator};
use crate::config::BiasConfig;
use crate::constraint::{FeasibilityConstraint, SignUniform};
use crate::error::{BiasError, Result};
use crate::eval::EvaluationSet;
use crate::generator::{seeded_rng, EncoderGenerator, EvalPointGenerator, UniformPdf};
use crate::neuron::{LifNeuron, Polarity};

/// Name of the origin every interneuron population is built with.
pub const DEFAULT_ORIGIN: &str = "X";

/// Function the default origin decodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OriginFunction {
    /// `x[0]`
    Identity,
    /// `-1 - x[0]`, for interneurons carrying a negative bias on positive encoders
    NegativeComplement,
}

impl OriginFunction {
    #[inline]
    pub fn apply(self, x: &[f32]) -> f32 {
        match self {
            Self::Identity => x[0],
            Self::NegativeComplement => -1.0 - x[0],
        }
    }
}

/// Recipe for an interneuron population.
#[derive(Clone, Debug, PartialEq)]
pub struct InterneuronSpec {
    pub polarity: Polarity,
    /// Sign every encoder component is rectified to.
    pub encoder_sign: Polarity,
    /// Offset added to the bias dimension of every evaluation point.
    pub eval_shift: f32,
    pub intercepts: UniformPdf,
    pub max_rates: UniformPdf,
    /// Target of the default origin.
    pub response: OriginFunction,
}

impl InterneuronSpec {
    /// Standard recipe for interneurons serving a projection of `polarity`.
    pub fn for_polarity(polarity: Polarity) -> Result<Self> {
        Ok(match polarity {
            Polarity::Excitatory => Self {
                polarity,
                encoder_sign: Polarity::Excitatory,
                eval_shift: 0.5,
                intercepts: UniformPdf::new(-0.15, 0.5)?,
                max_rates: UniformPdf::new(200.0, 500.0)?,
                response: OriginFunction::Identity,
            },
            Polarity::Inhibitory => Self {
                polarity,
                encoder_sign: Polarity::Excitatory,
                eval_shift: -0.5,
                intercepts: UniformPdf::new(-1.2, 0.1)?,
                max_rates: UniformPdf::new(400.0, 800.0)?,
                response: OriginFunction::NegativeComplement,
            },
        })
    }
}

/// A named linear readout of the population.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedOrigin {
    name: String,
    decoders: Vec<f32>,
    convergence: Convergence,
}

impl DecodedOrigin {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn decoders(&self) -> &[f32] {
        &self.decoders
    }

    /// How the decoder fit for this origin ended.
    pub fn convergence(&self) -> Convergence {
        self.convergence
    }
}

/// Population of LIF interneurons with fixed polarity.
#[derive(Clone, Debug)]
pub struct InterneuronPopulation {
    name: String,
    polarity: Polarity,
    neuron: LifNeuron,
    encoders: Vec<Vec<f32>>,
    gains: Vec<f32>,
    biases: Vec<f32>,
    /// Rates at the evaluation points, used for every decoder fit.
    responses: EvaluationSet,
    approximator: GradientDescentApproximator,
    constraint: FeasibilityConstraint,
    origins: Vec<DecodedOrigin>,
}

impl InterneuronPopulation {
    /// Synthesize `size` interneurons from `spec` and decode the default origin.
    pub fn build(name: &str, size: usize, spec: &InterneuronSpec, config: &BiasConfig) -> Result<Self> {
        let pop = &config.population;
        if name.is_empty() {
            return Err(BiasError::Structural("interneuron population needs a name".into()));
        }
        if size == 0 {
            return Err(BiasError::Structural(format!("{name}: population size must be non-zero")));
        }
        if pop.dimensions == 0 || pop.eval_points_per_dim == 0 {
            return Err(BiasError::Structural(format!(
                "{name}: dimensions ({}) and eval points per dimension ({}) must be non-zero",
                pop.dimensions, pop.eval_points_per_dim
            )));
        }

        let dims = pop.dimensions;
        let mut rng = seeded_rng(pop.seed, name);

        let encoders = EncoderGenerator::rectified(spec.encoder_sign).generate(&mut rng, size, dims);
        let intercepts = spec.intercepts.sample_n(&mut rng, size);
        let max_rates = spec.max_rates.sample_n(&mut rng, size);

        let mut gains = Vec::with_capacity(size);
        let mut biases = Vec::with_capacity(size);
        for (&rate, &intercept) in max_rates.iter().zip(&intercepts) {
            let (gain, bias) = config.neuron.gain_bias(rate, intercept)?;
            gains.push(gain);
            biases.push(bias);
        }

        let points = EvalPointGenerator::new(pop.eval_radius, 0, spec.eval_shift).generate(
            &mut rng,
            pop.eval_points_per_dim * dims,
            dims,
        );
        let rows = (0..size)
            .map(|i| {
                points
                    .iter()
                    .map(|p| config.neuron.rate(gains[i] * dot(&encoders[i], p) + biases[i]))
                    .collect()
            })
            .collect();
        let responses = EvaluationSet::new(rows, points)?;

        let mut population = Self {
            name: name.to_string(),
            polarity: spec.polarity,
            neuron: config.neuron,
            encoders,
            gains,
            biases,
            responses,
            approximator: GradientDescentApproximator::new(config.approximator.clone(), false),
            constraint: SignUniform::new(spec.polarity).into(),
            origins: Vec::new(),
        };

        let response = spec.response;
        population.add_decoded_origin(DEFAULT_ORIGIN, move |x| response.apply(x))?;

        log::debug!(
            "[INTERNEURONS] {}: built {} {} units over {} eval points",
            population.name, size, spec.polarity, population.responses.n_points()
        );

        Ok(population)
    }

    /// Decode `f` from the population under the polarity's sign constraint
    /// and register it as origin `name`.
    pub fn add_decoded_origin<F>(&mut self, name: &str, f: F) -> Result<Convergence>
    where
        F: Fn(&[f32]) -> f32,
    {
        if self.origin(name).is_some() {
            return Err(BiasError::Structural(format!(
                "{}: origin '{name}' already exists",
                self.name
            )));
        }
        let start = vec![0.0f32; self.len()];
        let fit = self
            .approximator
            .optimize(&self.responses, f, &self.constraint, &start)?;

        log::debug!(
            "[INTERNEURONS] {}: origin '{}' {} (mse={:.3e})",
            self.name, name, fit.convergence, fit.error
        );

        self.origins.push(DecodedOrigin {
            name: name.to_string(),
            decoders: fit.coefficients,
            convergence: fit.convergence,
        });
        Ok(fit.convergence)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn neuron(&self) -> &LifNeuron {
        &self.neuron
    }

    /// Number of interneurons.
    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }

    /// Represented dimensions.
    pub fn dimensions(&self) -> usize {
        self.encoders[0].len()
    }

    pub fn encoders(&self) -> &[Vec<f32>] {
        &self.encoders
    }

    /// Per-unit (gain, bias current) pairs.
    pub fn tuning(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.gains.iter().copied().zip(self.biases.iter().copied())
    }

    pub fn responses(&self) -> &EvaluationSet {
        &self.responses
    }

    pub fn origins(&self) -> &[DecodedOrigin] {
        &self.origins
    }

    pub fn origin(&self, name: &str) -> Option<&DecodedOrigin> {
        self.origins.iter().find(|o| o.name == name)
    }

    /// Steady-state rate of every unit for input `x`.
    pub fn rates(&self, x: &[f32]) -> Result<Vec<f32>> {
        if x.len() != self.dimensions() {
            return Err(BiasError::DimensionMismatch {
                expected: self.dimensions(),
                got: x.len(),
            });
        }
        Ok(self
            .encoders
            .iter()
            .zip(self.tuning())
            .map(|(e, (gain, bias))| self.neuron.rate(gain * dot(e, x) + bias))
            .collect())
    }

    /// Value of origin `origin` for input `x`.
    pub fn decode(&self, origin: &str, x: &[f32]) -> Result<f32> {
        let o = self.origin(origin).ok_or_else(|| {
            BiasError::Structural(format!("{}: no origin named '{origin}'", self.name))
        })?;
        let rates = self.rates(x)?;
        Ok(rates.iter().zip(&o.decoders).map(|(r, d)| r * d).sum())
    }
}

#[inline]
fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
