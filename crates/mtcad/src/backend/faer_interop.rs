//! Zero-copy conversion between [`Matrix`] and faer matrices.
//!
//! Both sides store elements in column-major order, so a view is a
//! reinterpretation of the same buffer.

use faer::MatRef;

use crate::matrix::Matrix;

/// Extension trait for viewing a [`Matrix`] as a faer matrix.
pub trait AsFaerMat {
    /// View matrix data as an immutable faer matrix (zero-copy).
    ///
    /// # Example
    ///
    /// ```
    /// use mtcad::Matrix;
    /// use mtcad::backend::AsFaerMat;
    ///
    /// let m = Matrix::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap();
    /// let view = m.as_faer_mat();
    /// assert_eq!(view.nrows(), 2);
    /// assert_eq!(view.ncols(), 3);
    /// ```
    fn as_faer_mat(&self) -> MatRef<'_, f64>;
}

impl AsFaerMat for Matrix {
    fn as_faer_mat(&self) -> MatRef<'_, f64> {
        MatRef::from_column_major_slice(self.data(), self.nrows(), self.ncols())
    }
}

/// Create a [`Matrix`] from a faer matrix (copies data).
///
/// # Example
///
/// ```
/// use faer::Mat;
/// use mtcad::backend::matrix_from_faer_mat;
///
/// let mat = Mat::from_fn(2, 3, |i, j| (i * 3 + j) as f64);
/// let m = matrix_from_faer_mat(mat.as_ref());
/// assert_eq!(m.shape(), (2, 3));
/// assert_eq!(m[(1, 2)], 5.0);
/// ```
pub fn matrix_from_faer_mat(mat: MatRef<'_, f64>) -> Matrix {
    Matrix::from_fn(mat.nrows(), mat.ncols(), |i, j| mat[(i, j)])
}
