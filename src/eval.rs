//! Evaluation sets: population output sampled at a fixed set of input points.
//!
//! Stored row-major: one row per population unit, one column per evaluation
//! point. Every fitting routine in the crate reads from this layout.

use crate::error::{BiasError, Result};

/// Immutable N×M sample of population responses plus the M input points.
#[derive(Clone, Debug, PartialEq)]
pub struct EvaluationSet {
    /// responses[i][k] = output of unit i at point k.
    responses: Vec<Vec<f32>>,
    /// points[k] = input vector for evaluation point k.
    points: Vec<Vec<f32>>,
}

/// Minimum and maximum of a decoded signal across all evaluation points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutputRange {
    pub min: f32,
    pub max: f32,
}

impl OutputRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Width of the range.
    #[inline]
    pub fn span(&self) -> f32 {
        self.max - self.min
    }

    /// Range over a slice of values. `None` if the slice is empty.
    pub fn of(values: &[f32]) -> Option<Self> {
        let first = *values.first()?;
        let (min, max) = values
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        Some(Self { min, max })
    }
}

impl std::fmt::Display for OutputRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:.4}, {:.4}]", self.min, self.max)
    }
}

impl EvaluationSet {
    /// Build from responses and the points they were sampled at.
    pub fn new(responses: Vec<Vec<f32>>, points: Vec<Vec<f32>>) -> Result<Self> {
        let n_points = check_matrix(&responses, "responses")?;
        if points.len() != n_points {
            return Err(BiasError::DimensionMismatch {
                expected: n_points,
                got: points.len(),
            });
        }
        check_matrix(&points, "evaluation points")?;
        Ok(Self { responses, points })
    }

    /// Build from responses to a constant input, where the points themselves
    /// carry no information. Every point is the 1-D origin.
    pub fn from_outputs(responses: Vec<Vec<f32>>) -> Result<Self> {
        let n_points = responses.first().map_or(0, Vec::len);
        Self::new(responses, vec![vec![0.0]; n_points])
    }

    /// Number of population units (rows).
    #[inline]
    pub fn n_units(&self) -> usize {
        self.responses.len()
    }

    /// Number of evaluation points (columns).
    #[inline]
    pub fn n_points(&self) -> usize {
        self.points.len()
    }

    /// Dimension of each evaluation point.
    #[inline]
    pub fn point_dim(&self) -> usize {
        self.points[0].len()
    }

    pub fn responses(&self) -> &[Vec<f32>] {
        &self.responses
    }

    pub fn row(&self, unit: usize) -> &[f32] {
        &self.responses[unit]
    }

    pub fn points(&self) -> &[Vec<f32>] {
        &self.points
    }

    /// Sum over units at each evaluation point.
    pub fn column_sums(&self) -> Vec<f32> {
        let mut sums = vec![0.0f32; self.n_points()];
        for row in &self.responses {
            for (s, &v) in sums.iter_mut().zip(row) {
                *s += v;
            }
        }
        sums
    }

    /// Decoded scalar output at every evaluation point: Σᵢ dᵢ · responses[i][k].
    pub fn decode(&self, decoders: &[f32]) -> Result<Vec<f32>> {
        if decoders.len() != self.n_units() {
            return Err(BiasError::DimensionMismatch {
                expected: self.n_units(),
                got: decoders.len(),
            });
        }
        let mut out = vec![0.0f32; self.n_points()];
        for (row, &d) in self.responses.iter().zip(decoders) {
            for (o, &v) in out.iter_mut().zip(row) {
                *o += d * v;
            }
        }
        Ok(out)
    }

    /// Range of the decoded output across evaluation points.
    pub fn decoded_range(&self, decoders: &[f32]) -> Result<OutputRange> {
        let out = self.decode(decoders)?;
        OutputRange::of(&out).ok_or_else(|| BiasError::EmptyInput("decoded output".into()))
    }
}

/// Validate a non-empty rectangular matrix of finite values. Returns the row length.
fn check_matrix(m: &[Vec<f32>], what: &str) -> Result<usize> {
    let width = match m.first() {
        Some(row) if !row.is_empty() => row.len(),
        _ => return Err(BiasError::EmptyInput(what.into())),
    };
    for row in m {
        if row.len() != width {
            return Err(BiasError::DimensionMismatch {
                expected: width,
                got: row.len(),
            });
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(BiasError::InvalidInput(format!("{what} contain non-finite values")));
        }
    }
    Ok(width)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_by_four() -> EvaluationSet {
        // Column sums: [2, 4, 1, 3]
        EvaluationSet::from_outputs(vec![
            vec![1.0, 2.0, 0.5, 1.0],
            vec![0.5, 1.0, 0.25, 1.0],
            vec![0.5, 1.0, 0.25, 1.0],
        ])
        .unwrap()
    }

    #[test]
    fn shape_and_sums() {
        let set = three_by_four();
        assert_eq!(set.n_units(), 3);
        assert_eq!(set.n_points(), 4);
        assert_eq!(set.point_dim(), 1);
        assert_eq!(set.column_sums(), vec![2.0, 4.0, 1.0, 3.0]);
    }

    #[test]
    fn decode_and_range() {
        let set = three_by_four();
        let out = set.decode(&[0.25, 0.25, 0.25]).unwrap();
        assert_eq!(out, vec![0.5, 1.0, 0.25, 0.75]);
        let range = set.decoded_range(&[0.25, 0.25, 0.25]).unwrap();
        assert_eq!(range, OutputRange::new(0.25, 1.0));
        assert_eq!(range.span(), 0.75);
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(
            EvaluationSet::from_outputs(vec![]),
            Err(BiasError::EmptyInput(_))
        ));
        assert!(matches!(
            EvaluationSet::from_outputs(vec![vec![]]),
            Err(BiasError::EmptyInput(_))
        ));
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = EvaluationSet::from_outputs(vec![vec![1.0, 2.0], vec![1.0]]).unwrap_err();
        assert!(matches!(err, BiasError::DimensionMismatch { expected: 2, got: 1 }));
    }

    #[test]
    fn rejects_point_count_mismatch() {
        let err = EvaluationSet::new(vec![vec![1.0, 2.0]], vec![vec![0.0]]).unwrap_err();
        assert!(matches!(err, BiasError::DimensionMismatch { expected: 2, got: 1 }));
    }

    #[test]
    fn rejects_non_finite() {
        let err = EvaluationSet::from_outputs(vec![vec![1.0, f32::NAN]]).unwrap_err();
        assert!(matches!(err, BiasError::InvalidInput(_)));
    }

    #[test]
    fn decode_checks_length() {
        let set = three_by_four();
        assert!(matches!(
            set.decode(&[1.0]),
            Err(BiasError::DimensionMismatch { expected: 3, got: 1 })
        ));
    }
}
