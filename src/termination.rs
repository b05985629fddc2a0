//! Termination transforms and the setter seam terminations expose.
//!
//! A termination is the input side of a population. It lives in the
//! projection layer, outside this crate. The bias pathway only needs to hand
//! it a (scale, offset) pair, so the seam is a single setter.

use serde::{Deserialize, Serialize};

/// Affine remap of a one-dimensional signal: `scale * (x + offset)`.
///
/// The offset is the termination's static bias, added to the incoming value
/// before the 1×1 transform is applied.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerminationTransform {
    pub scale: f32,
    pub offset: f32,
}

impl TerminationTransform {
    pub fn new(scale: f32, offset: f32) -> Self {
        Self { scale, offset }
    }

    /// Pass-through transform.
    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            offset: 0.0,
        }
    }

    #[inline]
    pub fn apply(&self, x: f32) -> f32 {
        self.scale * (x + self.offset)
    }
}

impl Default for TerminationTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::fmt::Display for TerminationTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4} * (x + {:.4})", self.scale, self.offset)
    }
}

/// A termination that can receive a tuned transform.
///
/// Implemented by the host's projection layer. [`DecodedTermination`] is the
/// in-crate implementation.
pub trait Termination {
    /// Name of the termination, for diagnostics.
    fn name(&self) -> &str;

    /// Replace the termination's static offset and 1×1 transform.
    fn set_transform(&mut self, transform: TerminationTransform);
}

/// Scalar termination with a static offset and a 1×1 transform.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedTermination {
    name: String,
    transform: TerminationTransform,
}

impl DecodedTermination {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            transform: TerminationTransform::identity(),
        }
    }

    pub fn transform(&self) -> TerminationTransform {
        self.transform
    }

    /// Input this termination delivers for incoming value `x`.
    #[inline]
    pub fn drive(&self, x: f32) -> f32 {
        self.transform.apply(x)
    }
}

impl Termination for DecodedTermination {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_transform(&mut self, transform: TerminationTransform) {
        self.transform = transform;
    }
}
