//! Element-wise matrix operations.

use crate::error::AdError;
use crate::matrix::Matrix;

/// Multiply all elements by a scalar, returning a new matrix.
///
/// # Example
///
/// ```
/// use mtcad::Matrix;
/// use mtcad::operations::scale;
///
/// let m = Matrix::from_vec(vec![1.0, 2.0, 3.0], 3, 1).unwrap();
/// assert_eq!(scale(&m, 2.0).data(), &[2.0, 4.0, 6.0]);
/// ```
pub fn scale(m: &Matrix, alpha: f64) -> Matrix {
    apply(m, |x| x * alpha)
}

/// Apply a function to each element, returning a new matrix.
pub fn apply<F>(m: &Matrix, f: F) -> Matrix
where
    F: Fn(f64) -> f64,
{
    let data: Vec<f64> = m.data().iter().map(|&x| f(x)).collect();
    Matrix::from_raw_parts(data, m.nrows(), m.ncols())
}

/// Combine two matrices element-wise.
///
/// Both matrices must have the same shape; `op` names the calling operation
/// in the error.
///
/// # Example
///
/// ```
/// use mtcad::Matrix;
/// use mtcad::operations::apply_binary;
///
/// let a = Matrix::from_vec(vec![1.0, 2.0, 3.0], 3, 1).unwrap();
/// let b = Matrix::from_vec(vec![4.0, 5.0, 6.0], 3, 1).unwrap();
/// let c = apply_binary("add", &a, &b, |x, y| x + y).unwrap();
/// assert_eq!(c.data(), &[5.0, 7.0, 9.0]);
/// ```
pub fn apply_binary<F>(op: &'static str, a: &Matrix, b: &Matrix, f: F) -> Result<Matrix, AdError>
where
    F: Fn(f64, f64) -> f64,
{
    if a.shape() != b.shape() {
        return Err(AdError::ShapeMismatch {
            op,
            left: a.shape(),
            right: b.shape(),
        });
    }
    let data: Vec<f64> = a
        .data()
        .iter()
        .zip(b.data().iter())
        .map(|(&x, &y)| f(x, y))
        .collect();
    Ok(Matrix::from_raw_parts(data, a.nrows(), a.ncols()))
}

/// In-place `dst += src`.
pub fn add_assign(dst: &mut Matrix, src: &Matrix) -> Result<(), AdError> {
    if dst.shape() != src.shape() {
        return Err(AdError::ShapeMismatch {
            op: "add_assign",
            left: dst.shape(),
            right: src.shape(),
        });
    }
    for (d, &s) in dst.data_mut().iter_mut().zip(src.data().iter()) {
        *d += s;
    }
    Ok(())
}

pub fn add(a: &Matrix, b: &Matrix) -> Result<Matrix, AdError> {
    apply_binary("add", a, b, |x, y| x + y)
}

pub fn sub(a: &Matrix, b: &Matrix) -> Result<Matrix, AdError> {
    apply_binary("sub", a, b, |x, y| x - y)
}

/// Hadamard (element-wise) product.
pub fn hadamard(a: &Matrix, b: &Matrix) -> Result<Matrix, AdError> {
    apply_binary("mul", a, b, |x, y| x * y)
}

/// Element-wise quotient.
///
/// # Errors
///
/// `AdError::UnsupportedOperand` if `b` contains an exact zero.
pub fn divide(a: &Matrix, b: &Matrix) -> Result<Matrix, AdError> {
    if let Some(pos) = b.data().iter().position(|&y| y == 0.0) {
        return Err(AdError::UnsupportedOperand(format!(
            "division by zero at element ({}, {})",
            pos % b.nrows().max(1),
            pos / b.nrows().max(1)
        )));
    }
    apply_binary("div", a, b, |x, y| x / y)
}
