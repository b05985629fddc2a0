//! Bias pathway configuration.
//!
//! Everything tunable about decoder refinement and interneuron synthesis lives
//! here so a projection layer can load it once (usually from JSON) and hand
//! the same config to every `BiasOrigin` it builds.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::neuron::LifNeuron;

/// Gradient-descent approximator settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApproximatorConfig {
    /// Hard cap on descent steps. Default: 1000
    pub max_iterations: usize,
    /// Relative coefficient change below which descent is considered settled.
    /// Default: 1e-6
    pub tolerance: f32,
    /// Maximum constraint passes per step while waiting for a clean pass.
    /// Default: 16
    pub correction_passes: usize,
}

impl Default for ApproximatorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-6,
            correction_passes: 16,
        }
    }
}

/// Interneuron population synthesis settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Global seed. Each population derives its own stream from this and its name.
    pub seed: u64,
    /// Evaluation points sampled per represented dimension. Default: 500
    pub eval_points_per_dim: usize,
    /// Radius of the ball evaluation points are drawn from. Default: 0.5
    pub eval_radius: f32,
    /// Represented dimensions. The bias channel is scalar. Default: 1
    pub dimensions: usize,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            eval_points_per_dim: 500,
            eval_radius: 0.5,
            dimensions: 1,
        }
    }
}

/// Top-level configuration shared by every bias pathway in a projection layer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiasConfig {
    pub approximator: ApproximatorConfig,
    pub neuron: LifNeuron,
    pub population: PopulationConfig,
}

impl BiasConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
