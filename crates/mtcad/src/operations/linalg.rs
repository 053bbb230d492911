//! Matrix products, inverses and linear solves through faer.

use faer::Mat;
use faer::linalg::solvers::Solve;

use crate::backend::{AsFaerMat, matrix_from_faer_mat};
use crate::error::AdError;
use crate::matrix::Matrix;

/// Default bound on `max|A * inv(A) - I|` (per unit of dimension) above which
/// a matrix is reported as singular.
///
/// In double precision this rejects matrices with a condition number above
/// roughly `1e12`, such as the 10x10 Hilbert matrix. Use
/// [`inverse_with_tolerance`] to accept them.
pub const INVERSE_RESIDUAL_TOLERANCE: f64 = 1e-8;

/// Matrix multiplication `C = A @ B`.
///
/// # Errors
///
/// Returns `AdError::ShapeMismatch` if `a.ncols() != b.nrows()`.
///
/// # Example
///
/// ```
/// use mtcad::Matrix;
/// use mtcad::operations::matmul;
///
/// let a = Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
/// let c = matmul(&a, &Matrix::identity(2)).unwrap();
/// assert_eq!(c, a);
/// ```
pub fn matmul(a: &Matrix, b: &Matrix) -> Result<Matrix, AdError> {
    if a.ncols() != b.nrows() {
        return Err(AdError::ShapeMismatch {
            op: "dot",
            left: a.shape(),
            right: b.shape(),
        });
    }
    let c: Mat<f64> = a.as_faer_mat() * b.as_faer_mat();
    Ok(matrix_from_faer_mat(c.as_ref()))
}

fn require_square(op: &'static str, a: &Matrix) -> Result<(), AdError> {
    if !a.is_square() {
        return Err(AdError::NotSquare {
            op,
            rows: a.nrows(),
            cols: a.ncols(),
        });
    }
    Ok(())
}

/// Solve `A @ X = B` for `X` using LU decomposition with partial pivoting.
///
/// # Errors
///
/// - `AdError::NotSquare` if `a` is not square
/// - `AdError::ShapeMismatch` if `b.nrows() != a.nrows()`
/// - `AdError::SingularMatrix` if the factorization breaks down
pub fn solve(a: &Matrix, b: &Matrix) -> Result<Matrix, AdError> {
    require_square("solve", a)?;
    if b.nrows() != a.nrows() {
        return Err(AdError::ShapeMismatch {
            op: "solve",
            left: a.shape(),
            right: b.shape(),
        });
    }

    let lu = a.as_faer_mat().partial_piv_lu();
    let mut x_mat = b.as_faer_mat().to_owned();
    lu.solve_in_place(&mut x_mat);

    let x = matrix_from_faer_mat(x_mat.as_ref());
    if x.data().iter().any(|v| !v.is_finite()) {
        return Err(AdError::SingularMatrix {
            residual: f64::INFINITY,
        });
    }
    Ok(x)
}

/// Matrix inverse with the default singularity tolerance.
///
/// # Example
///
/// ```
/// use mtcad::Matrix;
/// use mtcad::operations::inverse;
///
/// let a = Matrix::from_rows(&[[2.0, 0.0], [0.0, 4.0]]).unwrap();
/// let inv = inverse(&a).unwrap();
/// assert_eq!(inv[(0, 0)], 0.5);
/// assert_eq!(inv[(1, 1)], 0.25);
/// ```
pub fn inverse(a: &Matrix) -> Result<Matrix, AdError> {
    inverse_with_tolerance(a, INVERSE_RESIDUAL_TOLERANCE)
}

/// Matrix inverse; `tolerance` bounds the residual `max|A * inv(A) - I|`
/// per unit of dimension.
///
/// # Errors
///
/// - `AdError::NotSquare` if `a` is not square
/// - `AdError::SingularMatrix` if `a` is (numerically) singular
pub fn inverse_with_tolerance(a: &Matrix, tolerance: f64) -> Result<Matrix, AdError> {
    require_square("inv", a)?;
    let n = a.nrows();
    let inv = solve(a, &Matrix::identity(n))?;

    let mut residual = matmul(a, &inv)?;
    for i in 0..n {
        residual[(i, i)] -= 1.0;
    }
    let residual = residual.max_abs();
    if residual > tolerance * (n as f64).max(1.0) {
        return Err(AdError::SingularMatrix { residual });
    }
    Ok(inv)
}
