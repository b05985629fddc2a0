//! # biaspool
//!
//! Sign-uniform bias pathways for projections between neuron populations.
//!
//! Dale's law says a neuron's outgoing weights share one sign. Forcing a
//! mixed-sign projection to obey it adds a bias current to the post-synaptic
//! population. This crate builds the pathway that removes it again: uniform
//! bias decoders on the pre-synaptic population, a sign-constrained
//! interneuron pool, and a pair of termination transforms whose paths cancel.
//!
//! Decoder refinement is projected gradient descent under a closed set of
//! feasibility constraints, so every fitted decoder obeys the sign or
//! encoder bounds it was fitted under.

pub mod error;
pub mod config;
pub mod eval;
pub mod neuron;
pub mod constraint;
pub mod approximator;
pub mod decoder;
pub mod termination;
pub mod channel;
pub mod generator;
pub mod population;
pub mod origin;
pub mod stats;


pub use error::{BiasError, Result};
pub use config::{ApproximatorConfig, BiasConfig, PopulationConfig};
pub use eval::{EvaluationSet, OutputRange};
pub use neuron::{LifNeuron, Polarity};
pub use constraint::{BiasEncoderBounded, FeasibilityConstraint, SignUniform};
pub use approximator::{Approximation, Convergence, GradientDescentApproximator};
pub use decoder::{bias_decoder, uniform_bias_decoders};
pub use termination::{DecodedTermination, Termination, TerminationTransform};
pub use channel::ChannelTransforms;
pub use generator::{EncoderGenerator, EvalPointGenerator, UniformPdf};
pub use population::{DecodedOrigin, InterneuronPopulation, InterneuronSpec, OriginFunction, DEFAULT_ORIGIN};
pub use origin::BiasOrigin;
pub use stats::{BiasStats, DecoderSummary};
