//! Error types for bias pathway construction and optimization.

use thiserror::Error;

/// Bias pathway error types.
#[derive(Error, Debug)]
pub enum BiasError {
    /// Column sums of the constant-output sample never rise above zero,
    /// so no finite uniform decoder can bring the bias peak to 1.
    #[error("Degenerate evaluation set: peak column sum is {peak}")]
    DegenerateEvaluation { peak: f32 },

    /// Bias output range is empty or not finite.
    #[error("Degenerate output range: min={min}, max={max}")]
    DegenerateRange { min: f32, max: f32 },

    /// Vector or matrix shapes disagree
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Empty input where non-empty was required
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Value outside the domain an operation accepts
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A population or origin could not be built as requested
    #[error("Structural error: {0}")]
    Structural(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Result type alias for bias pathway operations.
pub type Result<T> = std::result::Result<T, BiasError>;
