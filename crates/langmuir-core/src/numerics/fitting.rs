//! Linear and nonlinear least-squares fitting.
//!
//! The linear path is closed-form ordinary least squares. The nonlinear path
//! is a Levenberg-Marquardt iteration with an analytic Jacobian; it is only
//! locally convergent, so the quality of the result depends on the
//! caller-supplied initial guess. That sensitivity is a known limitation of
//! the method, not something the fitter tries to compensate for.

use super::DenseMatrix;
use super::linalg::{lu_invert, lu_solve};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_ITERATIONS: usize = 300;

const LAMBDA_INITIAL: f64 = 1.0e-3;
const LAMBDA_GROWTH: f64 = 10.0;
const LAMBDA_SHRINK: f64 = 0.1;
const LAMBDA_FLOOR: f64 = 1.0e-12;
const LAMBDA_CEILING: f64 = 1.0e12;
const COST_RELATIVE_TOLERANCE: f64 = 1.0e-12;
const STEP_RELATIVE_TOLERANCE: f64 = 1.0e-12;
const GRADIENT_TOLERANCE: f64 = 1.0e-14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelFamily {
    Linear,
    Tanh,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    #[error("fit requires at least {required} points, got {actual}")]
    InsufficientPoints { required: usize, actual: usize },
    #[error("fit input length mismatch: x={x}, y={y}")]
    LengthMismatch { x: usize, y: usize },
    #[error("fit input must be finite: {axis} index {index} is {value}")]
    NonFiniteSample {
        axis: &'static str,
        index: usize,
        value: f64,
    },
    #[error("linear fit abscissa has no spread around its mean (denominator {spread:.6e})")]
    DegenerateAbscissa { spread: f64 },
    #[error("nonlinear fit did not converge within {iterations} iterations (cost {cost:.6e})")]
    FitDidNotConverge { iterations: usize, cost: f64 },
}

/// One completed fit: the model family, its coefficient vector, and the
/// residual/covariance information needed for error reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub model: ModelFamily,
    pub coefficients: Vec<f64>,
    pub residual_sum_squares: f64,
    /// Diagonal of the coefficient covariance estimate; `None` when the
    /// normal equations are too ill-conditioned to invert.
    pub covariance_diagonal: Option<Vec<f64>>,
    /// Iterations spent by the nonlinear solver; zero for closed forms.
    pub iterations: usize,
}

impl FitResult {
    pub fn evaluate(&self, x: f64) -> f64 {
        match self.model {
            ModelFamily::Linear => self.coefficients[0] * x + self.coefficients[1],
            ModelFamily::Tanh => tanh_model(&self.coefficients, x),
        }
    }

    /// Slope of a linear fit.
    pub fn slope(&self) -> f64 {
        self.coefficients[0]
    }

    /// Intercept of a linear fit.
    pub fn intercept(&self) -> f64 {
        self.coefficients[1]
    }
}

/// Closed-form ordinary least squares for `y = a*x + b`.
pub fn fit_linear(x: &[f64], y: &[f64]) -> Result<FitResult, FitError> {
    validate_points(x, y, 2)?;

    let n = x.len() as f64;
    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_xx: f64 = x.iter().map(|value| value * value).sum();
    let sum_xy: f64 = x.iter().zip(y).map(|(xi, yi)| xi * yi).sum();

    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator.abs() <= f64::EPSILON * n * sum_xx.abs().max(1.0) {
        return Err(FitError::DegenerateAbscissa {
            spread: denominator,
        });
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;

    let residual_sum_squares: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| {
            let residual = slope * xi + intercept - yi;
            residual * residual
        })
        .sum();

    let covariance_diagonal = if x.len() > 2 {
        let variance = residual_sum_squares / (n - 2.0);
        Some(vec![
            variance * n / denominator,
            variance * sum_xx / denominator,
        ])
    } else {
        None
    };

    Ok(FitResult {
        model: ModelFamily::Linear,
        coefficients: vec![slope, intercept],
        residual_sum_squares,
        covariance_diagonal,
        iterations: 0,
    })
}

/// Levenberg-Marquardt fit of `a*tanh(b*(x - c)) + d`.
///
/// The iteration starts from `initial_guess` and is bounded by
/// `max_iterations`; exhaustion surfaces as [`FitError::FitDidNotConverge`]
/// rather than returning the last (possibly degenerate) coefficients.
pub fn fit_tanh(
    x: &[f64],
    y: &[f64],
    initial_guess: [f64; 4],
    max_iterations: usize,
) -> Result<FitResult, FitError> {
    validate_points(x, y, 4)?;

    let mut params = initial_guess;
    let mut cost = tanh_cost(&params, x, y);
    let mut lambda = LAMBDA_INITIAL;

    for iteration in 1..=max_iterations {
        let (jtj, jtr) = tanh_normal_equations(&params, x, y);

        let gradient_norm = jtr.iter().fold(0.0_f64, |acc, value| acc.max(value.abs()));
        if gradient_norm <= GRADIENT_TOLERANCE {
            return Ok(finish_tanh_fit(params, cost, iteration, x.len(), &jtj));
        }

        loop {
            let mut damped = jtj.clone();
            for index in 0..4 {
                let scale = damped[(index, index)].abs().max(LAMBDA_FLOOR);
                damped[(index, index)] += lambda * scale;
            }

            let negative_gradient: Vec<f64> = jtr.iter().map(|value| -value).collect();
            let step = match lu_solve(&damped, &negative_gradient) {
                Ok(step) => step,
                Err(_) => {
                    lambda *= LAMBDA_GROWTH;
                    if lambda > LAMBDA_CEILING {
                        return Err(FitError::FitDidNotConverge {
                            iterations: iteration,
                            cost,
                        });
                    }
                    continue;
                }
            };

            let candidate = [
                params[0] + step[0],
                params[1] + step[1],
                params[2] + step[2],
                params[3] + step[3],
            ];
            let candidate_cost = tanh_cost(&candidate, x, y);

            if candidate_cost.is_finite() && candidate_cost < cost {
                let improvement = cost - candidate_cost;
                let step_norm = step.iter().fold(0.0_f64, |acc, value| acc.max(value.abs()));
                let param_scale = candidate
                    .iter()
                    .fold(1.0_f64, |acc, value| acc.max(value.abs()));

                params = candidate;
                cost = candidate_cost;
                lambda = (lambda * LAMBDA_SHRINK).max(LAMBDA_FLOOR);

                if improvement <= COST_RELATIVE_TOLERANCE * cost.max(COST_RELATIVE_TOLERANCE)
                    || step_norm <= STEP_RELATIVE_TOLERANCE * param_scale
                {
                    let (jtj, _) = tanh_normal_equations(&params, x, y);
                    return Ok(finish_tanh_fit(params, cost, iteration, x.len(), &jtj));
                }
                break;
            }

            lambda *= LAMBDA_GROWTH;
            if lambda > LAMBDA_CEILING {
                return Err(FitError::FitDidNotConverge {
                    iterations: iteration,
                    cost,
                });
            }
        }
    }

    Err(FitError::FitDidNotConverge {
        iterations: max_iterations,
        cost,
    })
}

/// Natural log of `values` after clipping to a strictly positive floor, so a
/// zero or negative current never reaches `ln`.
pub fn ln_clipped(values: &[f64], floor: f64) -> Vec<f64> {
    values.iter().map(|value| value.max(floor).ln()).collect()
}

fn tanh_model(coefficients: &[f64], x: f64) -> f64 {
    coefficients[0] * (coefficients[1] * (x - coefficients[2])).tanh() + coefficients[3]
}

fn tanh_cost(params: &[f64; 4], x: &[f64], y: &[f64]) -> f64 {
    x.iter()
        .zip(y)
        .map(|(xi, yi)| {
            let residual = tanh_model(params, *xi) - yi;
            residual * residual
        })
        .sum()
}

/// Accumulates `J^T J` and `J^T r` for the tanh model without materializing
/// the Jacobian.
fn tanh_normal_equations(params: &[f64; 4], x: &[f64], y: &[f64]) -> (DenseMatrix, [f64; 4]) {
    let [a, b, c, _] = *params;
    let mut jtj = DenseMatrix::zeros(4, 4);
    let mut jtr = [0.0; 4];

    for (xi, yi) in x.iter().zip(y) {
        let u = b * (xi - c);
        let t = u.tanh();
        let sech_squared = 1.0 - t * t;

        let row = [t, a * (xi - c) * sech_squared, -a * b * sech_squared, 1.0];
        let residual = a * t + params[3] - yi;

        for p in 0..4 {
            jtr[p] += row[p] * residual;
            for q in p..4 {
                jtj[(p, q)] += row[p] * row[q];
            }
        }
    }

    for p in 1..4 {
        for q in 0..p {
            jtj[(p, q)] = jtj[(q, p)];
        }
    }

    (jtj, jtr)
}

fn finish_tanh_fit(
    params: [f64; 4],
    cost: f64,
    iterations: usize,
    samples: usize,
    jtj: &DenseMatrix,
) -> FitResult {
    let covariance_diagonal = if samples > 4 {
        lu_invert(jtj).ok().map(|inverse| {
            let variance = cost / (samples - 4) as f64;
            (0..4).map(|index| variance * inverse[(index, index)]).collect()
        })
    } else {
        None
    };

    FitResult {
        model: ModelFamily::Tanh,
        coefficients: params.to_vec(),
        residual_sum_squares: cost,
        covariance_diagonal,
        iterations,
    }
}

fn validate_points(x: &[f64], y: &[f64], required: usize) -> Result<(), FitError> {
    if x.len() != y.len() {
        return Err(FitError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    if x.len() < required {
        return Err(FitError::InsufficientPoints {
            required,
            actual: x.len(),
        });
    }

    for (index, value) in x.iter().copied().enumerate() {
        if !value.is_finite() {
            return Err(FitError::NonFiniteSample {
                axis: "x",
                index,
                value,
            });
        }
    }
    for (index, value) in y.iter().copied().enumerate() {
        if !value.is_finite() {
            return Err(FitError::NonFiniteSample {
                axis: "y",
                index,
                value,
            });
        }
    }

    Ok(())
}
