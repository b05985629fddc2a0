//! Constrained least-squares decoder fitting by projected gradient descent.
//!
//! Each step moves the coefficients down the mean-squared-error gradient and
//! then hands them to a [`FeasibilityConstraint`] until a correction pass
//! comes back clean. Feasibility wins over optimality: the returned vector is
//! the lowest-error *feasible* iterate, never an uncorrected one.
//!
//! Step size is 1/L with L = ‖A‖²_F / M, an upper bound on the Lipschitz
//! constant of the gradient, so descent is stable for any response scale
//! without a tuned learning rate.

use crate::config::ApproximatorConfig;
use crate::constraint::FeasibilityConstraint;
use crate::error::{BiasError, Result};
use crate::eval::EvaluationSet;

/// How a fit ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Convergence {
    /// Two successive feasible iterates agreed within tolerance.
    Converged,
    /// Iteration budget ran out; the best feasible iterate is returned.
    Exhausted,
    /// No iterate ever passed a clean correction pass. The last corrected
    /// vector is returned and may still break the constraint.
    Infeasible,
}

impl Convergence {
    #[inline]
    pub fn is_converged(self) -> bool {
        self == Self::Converged
    }
}

impl std::fmt::Display for Convergence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Converged => write!(f, "converged"),
            Self::Exhausted => write!(f, "exhausted"),
            Self::Infeasible => write!(f, "infeasible"),
        }
    }
}

/// Result of one `optimize` call.
#[derive(Clone, Debug, PartialEq)]
pub struct Approximation {
    pub coefficients: Vec<f32>,
    /// Descent steps taken.
    pub iterations: usize,
    /// Mean squared error of `coefficients` (on centred data when bias is ignored).
    pub error: f32,
    pub convergence: Convergence,
}

/// Projected gradient-descent fitter.
#[derive(Clone, Debug)]
pub struct GradientDescentApproximator {
    config: ApproximatorConfig,
    /// Fit shape only: remove the mean over points from every response row
    /// and from the target before fitting.
    ignore_bias: bool,
}

/// Least-squares problem in fitting form.
struct Fit {
    rows: Vec<Vec<f32>>,
    targets: Vec<f32>,
    n_points: f32,
}

impl Fit {
    fn residuals(&self, coefficients: &[f32]) -> Vec<f32> {
        let mut est: Vec<f32> = self.targets.iter().map(|t| -t).collect();
        for (row, &c) in self.rows.iter().zip(coefficients) {
            if c == 0.0 {
                continue;
            }
            for (e, &v) in est.iter_mut().zip(row) {
                *e += c * v;
            }
        }
        est
    }

    fn error(&self, coefficients: &[f32]) -> f32 {
        let sq: f64 = self
            .residuals(coefficients)
            .iter()
            .map(|&r| (r as f64) * (r as f64))
            .sum();
        (sq / self.n_points as f64) as f32
    }

    fn gradient(&self, coefficients: &[f32]) -> Vec<f32> {
        let res = self.residuals(coefficients);
        self.rows
            .iter()
            .map(|row| {
                let dot: f64 = row.iter().zip(&res).map(|(&v, &r)| (v * r) as f64).sum();
                (dot / self.n_points as f64) as f32
            })
            .collect()
    }

    /// 1/L for L = ‖A‖²_F / M. Zero when the responses are all zero.
    fn step_size(&self) -> f32 {
        let frob: f64 = self
            .rows
            .iter()
            .flat_map(|row| row.iter())
            .map(|&v| (v as f64) * (v as f64))
            .sum();
        let lipschitz = frob / self.n_points as f64;
        if lipschitz > 0.0 && lipschitz.is_finite() {
            (1.0 / lipschitz) as f32
        } else {
            0.0
        }
    }
}

fn centred(values: &[f32]) -> Vec<f32> {
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64;
    values.iter().map(|&v| (v as f64 - mean) as f32).collect()
}

fn max_abs_diff(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .fold(0.0f32, |m, (x, y)| m.max((x - y).abs()))
}

impl GradientDescentApproximator {
    pub fn new(config: ApproximatorConfig, ignore_bias: bool) -> Self {
        Self { config, ignore_bias }
    }

    pub fn config(&self) -> &ApproximatorConfig {
        &self.config
    }

    pub fn ignores_bias(&self) -> bool {
        self.ignore_bias
    }

    /// Fit coefficients so that Σᵢ cᵢ · responses[i] approximates `target`
    /// evaluated at each point of `eval`, subject to `constraint`.
    pub fn optimize<F>(
        &self,
        eval: &EvaluationSet,
        target: F,
        constraint: &FeasibilityConstraint,
        start: &[f32],
    ) -> Result<Approximation>
    where
        F: Fn(&[f32]) -> f32,
    {
        let n = eval.n_units();
        if start.len() != n {
            return Err(BiasError::DimensionMismatch {
                expected: n,
                got: start.len(),
            });
        }
        if let Some(expected) = constraint.expected_len() {
            if expected != n {
                return Err(BiasError::DimensionMismatch { expected, got: n });
            }
        }

        let targets: Vec<f32> = eval.points().iter().map(|p| target(p.as_slice())).collect();
        if targets.iter().any(|t| !t.is_finite()) {
            return Err(BiasError::InvalidInput("target function produced non-finite values".into()));
        }

        let fit = if self.ignore_bias {
            Fit {
                rows: eval.responses().iter().map(|r| centred(r)).collect(),
                targets: centred(&targets),
                n_points: eval.n_points() as f32,
            }
        } else {
            Fit {
                rows: eval.responses().to_vec(),
                targets,
                n_points: eval.n_points() as f32,
            }
        };
        let step = fit.step_size();

        let mut current = start.to_vec();
        let mut current_feasible = self.settle(constraint, &mut current);
        let mut best: Option<(Vec<f32>, f32)> = if current_feasible {
            Some((current.clone(), fit.error(&current)))
        } else {
            None
        };

        let mut candidate = vec![0.0f32; n];
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.config.max_iterations {
            iterations += 1;

            let grad = fit.gradient(&current);
            for ((next, &c), &g) in candidate.iter_mut().zip(&current).zip(&grad) {
                *next = c - step * g;
            }
            let feasible = self.settle(constraint, &mut candidate);

            let delta = max_abs_diff(&candidate, &current);
            let scale = current.iter().fold(0.0f32, |m, c| m.max(c.abs()));
            if feasible && current_feasible && delta <= self.config.tolerance * scale {
                converged = true;
                break;
            }

            std::mem::swap(&mut current, &mut candidate);
            current_feasible = feasible;

            if feasible {
                let err = fit.error(&current);
                if best.as_ref().map_or(true, |(_, e)| err < *e) {
                    best = Some((current.clone(), err));
                }
            }
        }

        let result = match best {
            Some((coefficients, error)) => Approximation {
                coefficients,
                iterations,
                error,
                convergence: if converged {
                    Convergence::Converged
                } else {
                    Convergence::Exhausted
                },
            },
            None => Approximation {
                error: fit.error(&current),
                coefficients: current,
                iterations,
                convergence: Convergence::Infeasible,
            },
        };

        match result.convergence {
            Convergence::Converged => log::debug!(
                "[APPROX] converged after {} iterations (n={}, mse={:.3e})",
                result.iterations, n, result.error
            ),
            other => log::warn!(
                "[APPROX] {} after {} iterations (n={}, mse={:.3e})",
                other, result.iterations, n, result.error
            ),
        }

        Ok(result)
    }

    /// Correct until a pass comes back clean or the pass budget runs out.
    fn settle(&self, constraint: &FeasibilityConstraint, coefficients: &mut [f32]) -> bool {
        (0..self.config.correction_passes.max(1)).any(|_| constraint.correct(coefficients))
    }
}
