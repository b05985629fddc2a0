//! Neuron polarity and the steady-state LIF rate model used to characterise
//! interneurons.
//!
//! Interneurons are never stepped through time here. Their firing rate for a
//! constant input current is all that decoder fitting needs, so the model is
//! the closed-form LIF rate curve.

use serde::{Deserialize, Serialize};

use crate::error::{BiasError, Result};

/// Dale's law polarity of a projection or population.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarity {
    /// All effective weights >= 0
    Excitatory,
    /// All effective weights <= 0
    Inhibitory,
}

impl Polarity {
    /// +1.0 for excitatory, -1.0 for inhibitory.
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Self::Excitatory => 1.0,
            Self::Inhibitory => -1.0,
        }
    }

    #[inline]
    pub fn is_excitatory(self) -> bool {
        self == Self::Excitatory
    }

    /// Whether `value` is allowed under this polarity. Zero is always allowed.
    #[inline]
    pub fn admits(self, value: f32) -> bool {
        match self {
            Self::Excitatory => value >= 0.0,
            Self::Inhibitory => value <= 0.0,
        }
    }
}

impl std::fmt::Display for Polarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Excitatory => write!(f, "excitatory"),
            Self::Inhibitory => write!(f, "inhibitory"),
        }
    }
}

/// Leaky integrate-and-fire rate model.
///
/// Input current is normalised so that J = 1 is the firing threshold.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifNeuron {
    /// Membrane time constant (s). Default: 0.02
    pub tau_rc: f32,
    /// Absolute refractory period (s). Default: 0.0001
    pub tau_ref: f32,
}

impl Default for LifNeuron {
    fn default() -> Self {
        Self {
            tau_rc: 0.02,
            tau_ref: 0.0001,
        }
    }
}

impl LifNeuron {
    pub fn new(tau_rc: f32, tau_ref: f32) -> Self {
        Self { tau_rc, tau_ref }
    }

    /// Steady-state firing rate (Hz) for normalised input current `current`.
    #[inline]
    pub fn rate(&self, current: f32) -> f32 {
        if current <= 1.0 {
            return 0.0;
        }
        1.0 / (self.tau_ref - self.tau_rc * (1.0 - 1.0 / current).ln())
    }

    /// Gain and bias current such that the unit starts firing at `intercept`
    /// and reaches `max_rate` at a projected input of 1.
    pub fn gain_bias(&self, max_rate: f32, intercept: f32) -> Result<(f32, f32)> {
        if !(intercept < 1.0) {
            return Err(BiasError::InvalidInput(format!(
                "intercept {intercept} must be below 1"
            )));
        }
        if !(max_rate > 0.0 && max_rate < 1.0 / self.tau_ref) {
            return Err(BiasError::InvalidInput(format!(
                "max rate {max_rate} outside (0, {})",
                1.0 / self.tau_ref
            )));
        }
        let j_max = 1.0 / (1.0 - ((self.tau_ref - 1.0 / max_rate) / self.tau_rc).exp());
        let gain = (j_max - 1.0) / (1.0 - intercept);
        let bias = 1.0 - gain * intercept;
        Ok((gain, bias))
    }
}
