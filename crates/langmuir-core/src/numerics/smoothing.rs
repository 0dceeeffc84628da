//! Signal conditioning kernels: centered moving average, Savitzky-Golay
//! polynomial smoothing, and finite-difference derivatives.

use super::DenseMatrix;
use super::linalg::lu_solve;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmoothingMethod {
    MovingAverage,
    SavitzkyGolay { order: usize },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SmoothingError {
    #[error("invalid smoothing window {window} for {len} samples: {constraint}")]
    InvalidWindow {
        window: usize,
        len: usize,
        constraint: &'static str,
    },
    #[error("savitzky-golay design matrix is singular for window {window}, order {order}")]
    SingularDesign { window: usize, order: usize },
    #[error("input length mismatch: values={values}, axis={axis}")]
    LengthMismatch { values: usize, axis: usize },
    #[error("derivative requires at least 2 samples, got {actual}")]
    InsufficientPoints { actual: usize },
    #[error("axis must be strictly increasing, index {index} has {current} after {previous}")]
    NonIncreasingAxis {
        index: usize,
        previous: f64,
        current: f64,
    },
}

pub fn smooth(
    values: &[f64],
    method: SmoothingMethod,
    window: usize,
) -> Result<Vec<f64>, SmoothingError> {
    match method {
        SmoothingMethod::MovingAverage => moving_average(values, window),
        SmoothingMethod::SavitzkyGolay { order } => savitzky_golay(values, window, order),
    }
}

/// Centered moving average with edge truncation: boundary outputs average
/// only the samples actually inside the sequence.
pub fn moving_average(values: &[f64], window: usize) -> Result<Vec<f64>, SmoothingError> {
    validate_window(values.len(), window)?;

    let half = window / 2;
    let mut output = Vec::with_capacity(values.len());
    for index in 0..values.len() {
        let start = index.saturating_sub(half);
        let end = (index + half + 1).min(values.len());
        let sum: f64 = values[start..end].iter().sum();
        output.push(sum / (end - start) as f64);
    }

    Ok(output)
}

/// Savitzky-Golay smoothing: least-squares polynomial of the given order over
/// a sliding window. Interior samples use precomputed convolution weights;
/// the first and last half-windows are evaluated from polynomials fitted to
/// the leading and trailing full windows.
pub fn savitzky_golay(
    values: &[f64],
    window: usize,
    order: usize,
) -> Result<Vec<f64>, SmoothingError> {
    validate_window(values.len(), window)?;
    if order + 1 >= window {
        return Err(SmoothingError::InvalidWindow {
            window,
            len: values.len(),
            constraint: "window must exceed polynomial order + 1",
        });
    }

    let half = window / 2;
    let weights = central_weights(window, order)?;

    let mut output = vec![0.0; values.len()];
    for index in half..values.len() - half {
        let mut smoothed = 0.0;
        for (offset, weight) in weights.iter().enumerate() {
            smoothed += weight * values[index - half + offset];
        }
        output[index] = smoothed;
    }

    let leading = fit_window_polynomial(&values[..window], order)
        .ok_or(SmoothingError::SingularDesign { window, order })?;
    for (index, slot) in output.iter_mut().take(half).enumerate() {
        *slot = evaluate_polynomial(&leading, index as f64 - half as f64);
    }

    let trailing = fit_window_polynomial(&values[values.len() - window..], order)
        .ok_or(SmoothingError::SingularDesign { window, order })?;
    for offset in 0..half {
        let local = (window - half + offset) as f64 - half as f64;
        output[values.len() - half + offset] = evaluate_polynomial(&trailing, local);
    }

    Ok(output)
}

/// Centered finite-difference derivative with one-sided differences at both
/// ends; the second derivative is this operator applied twice.
pub fn gradient(values: &[f64], axis: &[f64]) -> Result<Vec<f64>, SmoothingError> {
    if values.len() != axis.len() {
        return Err(SmoothingError::LengthMismatch {
            values: values.len(),
            axis: axis.len(),
        });
    }
    if values.len() < 2 {
        return Err(SmoothingError::InsufficientPoints {
            actual: values.len(),
        });
    }
    for index in 1..axis.len() {
        if axis[index] <= axis[index - 1] {
            return Err(SmoothingError::NonIncreasingAxis {
                index,
                previous: axis[index - 1],
                current: axis[index],
            });
        }
    }

    let last = values.len() - 1;
    let mut output = Vec::with_capacity(values.len());
    output.push((values[1] - values[0]) / (axis[1] - axis[0]));
    for index in 1..last {
        output.push((values[index + 1] - values[index - 1]) / (axis[index + 1] - axis[index - 1]));
    }
    output.push((values[last] - values[last - 1]) / (axis[last] - axis[last - 1]));

    Ok(output)
}

pub fn second_gradient(values: &[f64], axis: &[f64]) -> Result<Vec<f64>, SmoothingError> {
    let first = gradient(values, axis)?;
    gradient(&first, axis)
}

fn validate_window(len: usize, window: usize) -> Result<(), SmoothingError> {
    if window % 2 == 0 {
        return Err(SmoothingError::InvalidWindow {
            window,
            len,
            constraint: "window must be odd",
        });
    }
    if window >= len {
        return Err(SmoothingError::InvalidWindow {
            window,
            len,
            constraint: "window must be smaller than the sample count",
        });
    }

    Ok(())
}

/// Convolution weights for the window center: the first row of the
/// least-squares smoothing operator over offsets -h..=h.
fn central_weights(window: usize, order: usize) -> Result<Vec<f64>, SmoothingError> {
    let half = window as i64 / 2;
    let terms = order + 1;

    let mut normal = DenseMatrix::zeros(terms, terms);
    for p in 0..terms {
        for q in 0..terms {
            let mut sum = 0.0;
            for offset in -half..=half {
                sum += (offset as f64).powi((p + q) as i32);
            }
            normal[(p, q)] = sum;
        }
    }

    let mut rhs = vec![0.0; terms];
    rhs[0] = 1.0;
    let generator =
        lu_solve(&normal, &rhs).map_err(|_| SmoothingError::SingularDesign { window, order })?;

    let mut weights = Vec::with_capacity(window);
    for offset in -half..=half {
        weights.push(evaluate_polynomial(&generator, offset as f64));
    }

    Ok(weights)
}

/// Least-squares polynomial coefficients for a full window of samples, with
/// the abscissa centered at the window midpoint.
fn fit_window_polynomial(window_values: &[f64], order: usize) -> Option<Vec<f64>> {
    let half = (window_values.len() / 2) as f64;
    let terms = order + 1;

    let mut normal = DenseMatrix::zeros(terms, terms);
    let mut rhs = vec![0.0; terms];
    for (index, value) in window_values.iter().enumerate() {
        let t = index as f64 - half;
        for p in 0..terms {
            rhs[p] += value * t.powi(p as i32);
            for q in 0..terms {
                normal[(p, q)] += t.powi((p + q) as i32);
            }
        }
    }

    lu_solve(&normal, &rhs).ok()
}

fn evaluate_polynomial(coefficients: &[f64], x: f64) -> f64 {
    let mut value = 0.0;
    for &coefficient in coefficients.iter().rev() {
        value = value * x + coefficient;
    }
    value
}
