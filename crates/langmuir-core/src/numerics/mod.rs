pub mod fitting;
pub mod integration;
pub mod linalg;
pub mod smoothing;

pub use fitting::{
    DEFAULT_MAX_ITERATIONS, FitError, FitResult, ModelFamily, fit_linear, fit_tanh, ln_clipped,
};
pub use integration::{QuadratureError, QuadratureRule, integrate, simpson, trapezoid};
pub use linalg::{LuDecomposition, LuError, lu_factorize, lu_invert, lu_solve};
pub use smoothing::{
    SmoothingError, SmoothingMethod, gradient, moving_average, savitzky_golay, second_gradient,
    smooth,
};

use faer::Mat;

pub type DenseMatrix = Mat<f64>;

/// Inclusive evenly spaced grid from `start` to `end`.
pub fn linear_grid(start: f64, end: f64, count: usize) -> Option<Vec<f64>> {
    if count < 2 {
        return None;
    }

    let step = (end - start) / ((count - 1) as f64);
    let mut grid = Vec::with_capacity(count);
    for index in 0..count {
        grid.push(start + step * (index as f64));
    }

    if let Some(last) = grid.last_mut() {
        *last = end;
    }

    Some(grid)
}

pub fn relative_difference(lhs: f64, rhs: f64, relative_floor: f64) -> f64 {
    let scale = lhs.abs().max(rhs.abs()).max(relative_floor);
    (lhs - rhs).abs() / scale
}

pub fn within_tolerance(
    lhs: f64,
    rhs: f64,
    abs_tol: f64,
    rel_tol: f64,
    relative_floor: f64,
) -> bool {
    let abs_diff = (lhs - rhs).abs();
    abs_diff <= abs_tol || relative_difference(lhs, rhs, relative_floor) <= rel_tol
}

#[cfg(test)]
mod tests {
    use super::{linear_grid, relative_difference, within_tolerance};

    #[test]
    fn linear_grid_is_inclusive_and_rejects_invalid_counts() {
        assert_eq!(linear_grid(0.0, 1.0, 1), None);
        let grid = linear_grid(0.0, 2.0, 5).expect("grid");
        assert_eq!(grid, vec![0.0, 0.5, 1.0, 1.5, 2.0]);
    }

    #[test]
    fn linear_grid_pins_the_final_sample_to_the_endpoint() {
        let grid = linear_grid(-20.0, 20.0, 1000).expect("grid");
        assert_eq!(grid.len(), 1000);
        assert_eq!(grid[0], -20.0);
        assert_eq!(grid[999], 20.0);
    }

    #[test]
    fn relative_difference_uses_relative_floor() {
        let diff = relative_difference(0.0, 1.0e-10, 1.0e-6);
        assert!((diff - 1.0e-4).abs() < 1.0e-12);
    }

    #[test]
    fn within_tolerance_accepts_abs_or_relative_match() {
        assert!(within_tolerance(10.0, 10.001, 1.0e-2, 1.0e-6, 1.0e-12));
        assert!(within_tolerance(1000.0, 1000.2, 1.0e-6, 5.0e-4, 1.0e-12));
        assert!(!within_tolerance(1.0, 1.1, 1.0e-3, 1.0e-3, 1.0e-12));
    }
}
