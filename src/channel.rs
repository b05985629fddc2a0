//! Interneuron channel tuning.
//!
//! The bias signal reaches the post-synaptic population twice: directly, and
//! through the interneurons. The forward transform squeezes the bias range
//! into the interneurons' working range. The cancel transform undoes it with
//! the opposite sign so the two paths sum to zero.
//!
//! The lower bound is pushed down by a quarter of the range first, which
//! keeps interneurons off the steep part of their response near zero input.
//! With the widened bound `low` and `span = max - low`:
//!
//! ```text
//! forward: (x - low) / span           maps [min, max] onto [0.2, 1]
//! cancel:  -span * (u + low / span)   = -x when u = forward(x)
//! ```

use crate::error::{BiasError, Result};
use crate::eval::OutputRange;
use crate::termination::TerminationTransform;

/// Fraction of the range the lower bound is widened by.
pub const LOW_MARGIN: f32 = 0.25;

/// The algebraically linked pair of transforms for one bias pathway.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChannelTransforms {
    /// Applied on the termination from the bias origin into the interneurons.
    pub forward: TerminationTransform,
    /// Applied on the termination from the interneurons back to the
    /// post-synaptic population.
    pub cancel: TerminationTransform,
}

impl ChannelTransforms {
    /// Signal arriving through the interneuron path for bias value `x`,
    /// treating the interneurons as an ideal relay.
    #[inline]
    pub fn round_trip(&self, x: f32) -> f32 {
        self.cancel.apply(self.forward.apply(x))
    }
}

/// Derive both transforms from the bias output range.
pub fn tune(range: OutputRange) -> Result<ChannelTransforms> {
    let OutputRange { min, max } = range;
    if !(min.is_finite() && max.is_finite() && max > min) {
        return Err(BiasError::DegenerateRange { min, max });
    }

    let low = min - LOW_MARGIN * (max - min);
    let span = max - low;

    Ok(ChannelTransforms {
        forward: TerminationTransform::new(1.0 / span, -low),
        cancel: TerminationTransform::new(-span, low / span),
    })
}
