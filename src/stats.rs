//! Bias pathway inspection and diagnostics.

use crate::approximator::Convergence;
use crate::eval::OutputRange;
use crate::neuron::Polarity;
use crate::origin::BiasOrigin;

/// Spread of a decoder vector.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DecoderSummary {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    /// Decoders that are exactly zero.
    pub zeros: usize,
}

impl DecoderSummary {
    pub fn of(decoders: &[f32]) -> Self {
        if decoders.is_empty() {
            return Self::default();
        }
        let (min, max, sum, zeros) = decoders.iter().fold(
            (f32::INFINITY, f32::NEG_INFINITY, 0.0f64, 0usize),
            |(lo, hi, s, z), &d| (lo.min(d), hi.max(d), s + d as f64, z + (d == 0.0) as usize),
        );
        Self {
            min,
            max,
            mean: (sum / decoders.len() as f64) as f32,
            zeros,
        }
    }
}

impl std::fmt::Display for DecoderSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "min={:.4e} max={:.4e} mean={:.4e} zeros={}",
            self.min, self.max, self.mean, self.zeros
        )
    }
}

/// Summary statistics for a bias origin.
#[derive(Clone, Debug)]
pub struct BiasStats {
    pub name: String,
    pub polarity: Polarity,
    pub n_units: usize,
    pub n_eval_points: usize,
    pub decoders: DecoderSummary,
    pub range: OutputRange,
    pub last_convergence: Option<Convergence>,
    pub n_interneurons: usize,
    /// Decoded interneuron origins and how their fits ended.
    pub interneuron_origins: Vec<(String, Convergence)>,
    /// Interneuron decoders per origin that break the population's polarity.
    pub interneuron_sign_violations: usize,
}

impl BiasStats {
    pub(crate) fn from_origin(origin: &BiasOrigin) -> Self {
        let interneurons = origin.interneurons();
        let polarity = interneurons.polarity();
        let interneuron_sign_violations = interneurons
            .origins()
            .iter()
            .flat_map(|o| o.decoders())
            .filter(|&&d| !polarity.admits(d))
            .count();

        Self {
            name: origin.name().to_string(),
            polarity: origin.polarity(),
            n_units: origin.decoders().len(),
            n_eval_points: origin.output().len(),
            decoders: DecoderSummary::of(origin.decoders()),
            range: origin.range(),
            last_convergence: origin.last_convergence(),
            n_interneurons: interneurons.len(),
            interneuron_origins: interneurons
                .origins()
                .iter()
                .map(|o| (o.name().to_string(), o.convergence()))
                .collect(),
            interneuron_sign_violations,
        }
    }
}

impl std::fmt::Display for BiasStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Bias '{}': {} over {} units, {} eval points",
            self.name, self.polarity, self.n_units, self.n_eval_points)?;
        writeln!(f, "  Decoders: {}", self.decoders)?;
        match self.last_convergence {
            Some(c) => writeln!(f, "  Range: {}, last fit: {}", self.range, c)?,
            None => writeln!(f, "  Range: {}, last fit: initial", self.range)?,
        }
        write!(f, "  Interneurons: {}, origins:", self.n_interneurons)?;
        for (name, c) in &self.interneuron_origins {
            write!(f, " {name}={c}")?;
        }
        writeln!(f, ", sign violations: {}", self.interneuron_sign_violations)?;
        Ok(())
    }
}
