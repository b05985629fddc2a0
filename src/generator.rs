//! Random parameter generators for population synthesis.
//!
//! All randomness flows from a `ChaCha8Rng` seeded by hashing a global seed
//! together with the population name, so the same config and name always
//! produce the same population.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

use crate::error::{BiasError, Result};
use crate::neuron::Polarity;

/// Deterministic RNG stream for a named population.
pub fn seeded_rng(seed: u64, name: &str) -> ChaCha8Rng {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update(name.as_bytes());
    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash[0..8]);
    ChaCha8Rng::seed_from_u64(u64::from_le_bytes(bytes))
}

/// Uniform distribution on `[low, high)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UniformPdf {
    low: f32,
    high: f32,
}

impl UniformPdf {
    pub fn new(low: f32, high: f32) -> Result<Self> {
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(BiasError::InvalidInput(format!(
                "uniform bounds [{low}, {high}) are empty or not finite"
            )));
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> f32 {
        self.low
    }

    pub fn high(&self) -> f32 {
        self.high
    }

    #[inline]
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f32 {
        rng.gen_range(self.low..self.high)
    }

    pub fn sample_n<R: Rng>(&self, rng: &mut R, n: usize) -> Vec<f32> {
        (0..n).map(|_| self.sample(rng)).collect()
    }
}

/// Standard normal sample (Box–Muller).
fn gaussian<R: Rng>(rng: &mut R) -> f32 {
    let u1: f32 = rng.gen_range(f32::MIN_POSITIVE..1.0);
    let u2: f32 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (std::f32::consts::TAU * u2).cos()
}

/// Uniformly distributed direction in `dim` dimensions.
fn unit_vector<R: Rng>(rng: &mut R, dim: usize) -> Vec<f32> {
    loop {
        let v: Vec<f32> = (0..dim).map(|_| gaussian(rng)).collect();
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 1e-6 {
            return v.into_iter().map(|x| x / norm).collect();
        }
    }
}

/// Unit-length encoders, optionally rectified to one sign.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EncoderGenerator {
    /// When set, every component is forced to this polarity's sign.
    pub rectify: Option<Polarity>,
}

impl EncoderGenerator {
    pub fn free() -> Self {
        Self { rectify: None }
    }

    pub fn rectified(polarity: Polarity) -> Self {
        Self {
            rectify: Some(polarity),
        }
    }

    pub fn generate<R: Rng>(&self, rng: &mut R, n: usize, dim: usize) -> Vec<Vec<f32>> {
        (0..n)
            .map(|_| {
                let v = unit_vector(rng, dim);
                match self.rectify {
                    Some(p) => v.into_iter().map(|x| p.sign() * x.abs()).collect(),
                    None => v,
                }
            })
            .collect()
    }
}

/// Points drawn uniformly from a ball, then shifted along one axis.
///
/// Shifting along the bias dimension concentrates samples on the side of
/// zero the bias signal actually occupies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EvalPointGenerator {
    pub radius: f32,
    pub shift_dim: usize,
    pub shift: f32,
}

impl EvalPointGenerator {
    pub fn new(radius: f32, shift_dim: usize, shift: f32) -> Self {
        Self {
            radius,
            shift_dim,
            shift,
        }
    }

    pub fn generate<R: Rng>(&self, rng: &mut R, n: usize, dim: usize) -> Vec<Vec<f32>> {
        (0..n)
            .map(|_| {
                let dir = unit_vector(rng, dim);
                let u: f32 = rng.gen();
                let r = self.radius * u.powf(1.0 / dim as f32);
                let mut p: Vec<f32> = dir.into_iter().map(|x| x * r).collect();
                if let Some(x) = p.get_mut(self.shift_dim) {
                    *x += self.shift;
                }
                p
            })
            .collect()
    }
}
