//! Partially pivoted LU solves for the small dense systems produced by the
//! curve fitter (normal equations) and the Savitzky-Golay coefficient setup.

use super::DenseMatrix;

const SINGULAR_PIVOT_EPSILON: f64 = 1.0e-15;
const ILL_CONDITIONED_RELATIVE_PIVOT_EPSILON: f64 = 1.0e-12;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LuError {
    #[error("LU factorization requires a square matrix, got {rows}x{cols}")]
    NonSquareMatrix { rows: usize, cols: usize },
    #[error("LU factorization requires a non-empty matrix")]
    EmptyMatrix,
    #[error("matrix is singular at pivot index {pivot_index}")]
    SingularMatrix { pivot_index: usize },
    #[error("matrix is ill-conditioned at pivot index {pivot_index}")]
    IllConditionedMatrix { pivot_index: usize },
    #[error("right-hand side length mismatch: expected {expected}, got {actual}")]
    RhsLengthMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LuDecomposition {
    lu: DenseMatrix,
    pivots: Vec<usize>,
    input_norm_infty: f64,
}

impl LuDecomposition {
    pub fn dimension(&self) -> usize {
        self.lu.nrows()
    }

    pub fn solve(&self, rhs: &[f64]) -> Result<Vec<f64>, LuError> {
        let dimension = self.dimension();
        if rhs.len() != dimension {
            return Err(LuError::RhsLengthMismatch {
                expected: dimension,
                actual: rhs.len(),
            });
        }

        let mut forward = vec![0.0; dimension];
        for row in 0..dimension {
            let mut value = rhs[self.pivots[row]];
            for col in 0..row {
                value -= self.lu[(row, col)] * forward[col];
            }
            forward[row] = value;
        }

        let mut solution = vec![0.0; dimension];
        for row in (0..dimension).rev() {
            let mut value = forward[row];
            for col in (row + 1)..dimension {
                value -= self.lu[(row, col)] * solution[col];
            }

            let diagonal = self.lu[(row, row)];
            if diagonal.abs() <= SINGULAR_PIVOT_EPSILON {
                return Err(LuError::SingularMatrix { pivot_index: row });
            }

            solution[row] = value / diagonal;
        }

        Ok(solution)
    }

    pub fn invert(&self) -> Result<DenseMatrix, LuError> {
        let dimension = self.dimension();
        for pivot_index in 0..dimension {
            let diagonal = self.lu[(pivot_index, pivot_index)];
            if diagonal.abs() <= self.input_norm_infty * ILL_CONDITIONED_RELATIVE_PIVOT_EPSILON {
                return Err(LuError::IllConditionedMatrix { pivot_index });
            }
        }

        let mut inverse = DenseMatrix::zeros(dimension, dimension);
        let mut basis = vec![0.0; dimension];
        for col in 0..dimension {
            basis.fill(0.0);
            basis[col] = 1.0;

            let solution = self.solve(&basis)?;
            for row in 0..dimension {
                inverse[(row, col)] = solution[row];
            }
        }

        Ok(inverse)
    }
}

pub fn lu_factorize(matrix: &DenseMatrix) -> Result<LuDecomposition, LuError> {
    let dimension = validate_square_shape(matrix)?;
    let input_norm_infty = matrix_infinity_norm(matrix);
    let mut lu = matrix.clone();
    let mut pivots: Vec<usize> = (0..dimension).collect();

    for pivot_col in 0..dimension {
        let mut pivot_row = pivot_col;
        let mut pivot_magnitude = lu[(pivot_col, pivot_col)].abs();
        for row in (pivot_col + 1)..dimension {
            let magnitude = lu[(row, pivot_col)].abs();
            if magnitude > pivot_magnitude {
                pivot_magnitude = magnitude;
                pivot_row = row;
            }
        }

        if pivot_magnitude <= SINGULAR_PIVOT_EPSILON {
            return Err(LuError::SingularMatrix {
                pivot_index: pivot_col,
            });
        }

        if pivot_row != pivot_col {
            swap_rows(&mut lu, pivot_col, pivot_row);
            pivots.swap(pivot_col, pivot_row);
        }

        let pivot = lu[(pivot_col, pivot_col)];
        for row in (pivot_col + 1)..dimension {
            lu[(row, pivot_col)] /= pivot;
            let multiplier = lu[(row, pivot_col)];
            for col in (pivot_col + 1)..dimension {
                let updated = lu[(row, col)] - multiplier * lu[(pivot_col, col)];
                lu[(row, col)] = updated;
            }
        }
    }

    Ok(LuDecomposition {
        lu,
        pivots,
        input_norm_infty,
    })
}

pub fn lu_solve(matrix: &DenseMatrix, rhs: &[f64]) -> Result<Vec<f64>, LuError> {
    lu_factorize(matrix)?.solve(rhs)
}

pub fn lu_invert(matrix: &DenseMatrix) -> Result<DenseMatrix, LuError> {
    lu_factorize(matrix)?.invert()
}

fn validate_square_shape(matrix: &DenseMatrix) -> Result<usize, LuError> {
    let rows = matrix.nrows();
    let cols = matrix.ncols();
    if rows == 0 || cols == 0 {
        return Err(LuError::EmptyMatrix);
    }
    if rows != cols {
        return Err(LuError::NonSquareMatrix { rows, cols });
    }

    Ok(rows)
}

fn swap_rows(matrix: &mut DenseMatrix, lhs: usize, rhs: usize) {
    if lhs == rhs {
        return;
    }

    for col in 0..matrix.ncols() {
        let value = matrix[(lhs, col)];
        matrix[(lhs, col)] = matrix[(rhs, col)];
        matrix[(rhs, col)] = value;
    }
}

fn matrix_infinity_norm(matrix: &DenseMatrix) -> f64 {
    let mut best_row_sum: f64 = 0.0;
    for row in 0..matrix.nrows() {
        let mut row_sum = 0.0;
        for col in 0..matrix.ncols() {
            row_sum += matrix[(row, col)].abs();
        }
        best_row_sum = best_row_sum.max(row_sum);
    }
    best_row_sum
}
