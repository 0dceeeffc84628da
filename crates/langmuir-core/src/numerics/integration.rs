//! Trapezoid and composite Simpson quadrature over sampled curves.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuadratureRule {
    Simpson,
    Trapezoid,
}

impl QuadratureRule {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simpson => "simpson",
            Self::Trapezoid => "trapezoid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QuadratureError {
    #[error("quadrature requires at least 2 points, got {actual}")]
    InsufficientPoints { actual: usize },
    #[error("quadrature input length mismatch: x={x}, y={y}")]
    LengthMismatch { x: usize, y: usize },
    #[error("quadrature input must be finite: {axis} index {index} is {value}")]
    NonFiniteSample {
        axis: &'static str,
        index: usize,
        value: f64,
    },
    #[error("quadrature grid must be strictly increasing, index {index} has {current} after {previous}")]
    NonIncreasingGrid {
        index: usize,
        previous: f64,
        current: f64,
    },
}

pub fn integrate(rule: QuadratureRule, x: &[f64], y: &[f64]) -> Result<f64, QuadratureError> {
    match rule {
        QuadratureRule::Simpson => simpson(x, y),
        QuadratureRule::Trapezoid => trapezoid(x, y),
    }
}

pub fn trapezoid(x: &[f64], y: &[f64]) -> Result<f64, QuadratureError> {
    validate_grid(x, y)?;

    let mut integral = 0.0;
    for index in 0..x.len() - 1 {
        let width = x[index + 1] - x[index];
        integral += 0.5 * width * (y[index] + y[index + 1]);
    }

    Ok(integral)
}

/// Composite Simpson rule over consecutive interval pairs, valid on
/// non-uniform grids. An unpaired trailing interval is closed with the
/// trapezoid rule.
pub fn simpson(x: &[f64], y: &[f64]) -> Result<f64, QuadratureError> {
    validate_grid(x, y)?;

    let mut integral = 0.0;
    let mut index = 0;
    while index + 2 < x.len() {
        let h0 = x[index + 1] - x[index];
        let h1 = x[index + 2] - x[index + 1];
        let span = h0 + h1;

        integral += span / 6.0
            * ((2.0 - h1 / h0) * y[index]
                + span * span / (h0 * h1) * y[index + 1]
                + (2.0 - h0 / h1) * y[index + 2]);
        index += 2;
    }

    if index + 1 < x.len() {
        let width = x[index + 1] - x[index];
        integral += 0.5 * width * (y[index] + y[index + 1]);
    }

    Ok(integral)
}

fn validate_grid(x: &[f64], y: &[f64]) -> Result<(), QuadratureError> {
    if x.len() != y.len() {
        return Err(QuadratureError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    if x.len() < 2 {
        return Err(QuadratureError::InsufficientPoints { actual: x.len() });
    }

    for (index, value) in x.iter().copied().enumerate() {
        if !value.is_finite() {
            return Err(QuadratureError::NonFiniteSample {
                axis: "x",
                index,
                value,
            });
        }
        if index > 0 && value <= x[index - 1] {
            return Err(QuadratureError::NonIncreasingGrid {
                index,
                previous: x[index - 1],
                current: value,
            });
        }
    }
    for (index, value) in y.iter().copied().enumerate() {
        if !value.is_finite() {
            return Err(QuadratureError::NonFiniteSample {
                axis: "y",
                index,
                value,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{QuadratureError, QuadratureRule, integrate, simpson, trapezoid};

    #[test]
    fn trapezoid_is_exact_for_affine_integrands() {
        let x: Vec<f64> = (0..101).map(|index| index as f64 * 0.05).collect();
        let y: Vec<f64> = x.iter().map(|xi| 2.0 * xi + 1.0).collect();

        let actual = trapezoid(&x, &y).expect("integration");
        let upper = 5.0;
        let expected = upper * upper + upper;
        assert!((actual - expected).abs() <= 1.0e-12 * expected);
    }

    #[test]
    fn simpson_is_exact_for_cubics_on_uniform_grids() {
        let x: Vec<f64> = (0..101).map(|index| index as f64 * 0.03).collect();
        let y: Vec<f64> = x.iter().map(|xi| xi * xi * xi - 2.0 * xi * xi).collect();

        let actual = simpson(&x, &y).expect("integration");
        let upper = 3.0_f64;
        let expected = upper.powi(4) / 4.0 - 2.0 * upper.powi(3) / 3.0;
        assert!(
            (actual - expected).abs() <= 1.0e-10,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn simpson_handles_non_uniform_grids() {
        let x = [0.0, 0.1, 0.35, 0.5, 0.9, 1.0];
        let y: Vec<f64> = x.iter().map(|xi| xi * xi).collect();

        let actual = simpson(&x, &y).expect("integration");
        assert!(
            (actual - 1.0 / 3.0).abs() <= 5.0e-3,
            "non-uniform quadratic integral was {actual}"
        );
    }

    #[test]
    fn simpson_closes_an_odd_trailing_interval() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 1.0, 1.0, 1.0];

        let actual = simpson(&x, &y).expect("integration");
        assert!((actual - 3.0).abs() <= 1.0e-12);
    }

    #[test]
    fn rules_disagree_on_coarse_curved_grids() {
        let x: Vec<f64> = (0..5).map(|index| index as f64).collect();
        let y: Vec<f64> = x.iter().map(|xi| (-xi).exp()).collect();

        let with_simpson = integrate(QuadratureRule::Simpson, &x, &y).expect("simpson");
        let with_trapezoid = integrate(QuadratureRule::Trapezoid, &x, &y).expect("trapezoid");
        assert!(
            (with_simpson - with_trapezoid).abs() > 1.0e-3,
            "coarse sampling should separate the rules"
        );
    }

    #[test]
    fn quadrature_validates_input_shape() {
        let error = trapezoid(&[0.0, 1.0], &[1.0]).expect_err("length mismatch should fail");
        assert_eq!(error, QuadratureError::LengthMismatch { x: 2, y: 1 });

        let error = simpson(&[0.0], &[1.0]).expect_err("single point should fail");
        assert_eq!(error, QuadratureError::InsufficientPoints { actual: 1 });

        let error = simpson(&[0.0, 0.0, 1.0], &[1.0, 1.0, 1.0])
            .expect_err("duplicate grid entry should fail");
        assert_eq!(
            error,
            QuadratureError::NonIncreasingGrid {
                index: 1,
                previous: 0.0,
                current: 0.0,
            }
        );
    }
}
