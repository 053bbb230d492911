//! Dense real matrix with column-major storage.
//!
//! Column-major (Fortran) order matches faer, so the products and
//! factorizations in [`crate::operations`] can view the buffer without copying.

use crate::error::AdError;
use std::fmt;

/// A dense `rows x cols` matrix of `f64`.
///
/// Element `(i, j)` lives at `data[i + j * rows]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    /// Create a zero-initialized matrix.
    ///
    /// # Examples
    ///
    /// ```
    /// use mtcad::Matrix;
    ///
    /// let m = Matrix::zeros(2, 3);
    /// assert_eq!(m.shape(), (2, 3));
    /// assert_eq!(m.len(), 6);
    /// ```
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 0.0)
    }

    /// Create a matrix filled with ones.
    pub fn ones(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 1.0)
    }

    /// Create a matrix with every element equal to `value`.
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            data: vec![value; rows * cols],
            rows,
            cols,
        }
    }

    /// Create the `n x n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.data[i + i * n] = 1.0;
        }
        m
    }

    /// Create a 1x1 matrix.
    pub fn scalar(value: f64) -> Self {
        Self::filled(1, 1, value)
    }

    /// Create a matrix from column-major data.
    ///
    /// # Errors
    ///
    /// Returns `AdError::DataLength` if `data.len() != rows * cols`.
    ///
    /// # Examples
    ///
    /// ```
    /// use mtcad::Matrix;
    ///
    /// let m = Matrix::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap();
    /// assert_eq!(m.get(1, 0), Some(2.0)); // second element of the first column
    /// assert_eq!(m.get(0, 1), Some(3.0));
    /// ```
    pub fn from_vec(data: Vec<f64>, rows: usize, cols: usize) -> Result<Self, AdError> {
        if data.len() != rows * cols {
            return Err(AdError::DataLength {
                expected: rows * cols,
                actual: data.len(),
            });
        }
        Ok(Self { data, rows, cols })
    }

    /// Wrap a buffer whose length is known to be `rows * cols`.
    pub(crate) fn from_raw_parts(data: Vec<f64>, rows: usize, cols: usize) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        Self { data, rows, cols }
    }

    /// Create a matrix from row-major nested rows.
    ///
    /// # Errors
    ///
    /// Returns `AdError::DataLength` if the rows are ragged.
    ///
    /// # Examples
    ///
    /// ```
    /// use mtcad::Matrix;
    ///
    /// let m = Matrix::from_rows(&[[3.0, 1.0], [2.0, 4.0]]).unwrap();
    /// assert_eq!(m[(0, 1)], 1.0);
    /// assert_eq!(m[(1, 0)], 2.0);
    /// ```
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, AdError> {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut m = Self::zeros(nrows, ncols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != ncols {
                return Err(AdError::DataLength {
                    expected: ncols,
                    actual: row.len(),
                });
            }
            for (j, &v) in row.iter().enumerate() {
                m.data[i + j * nrows] = v;
            }
        }
        Ok(m)
    }

    /// Create a matrix by evaluating `f(i, j)` for every element.
    pub fn from_fn<F>(rows: usize, cols: usize, f: F) -> Self
    where
        F: Fn(usize, usize) -> f64,
    {
        let mut data = Vec::with_capacity(rows * cols);
        for j in 0..cols {
            for i in 0..rows {
                data.push(f(i, j));
            }
        }
        Self { data, rows, cols }
    }

    /// `(rows, cols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.cols
    }

    /// Total number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Underlying column-major data.
    #[inline]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Get element `(i, j)`, `None` if out of bounds.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i < self.rows && j < self.cols {
            Some(self.data[i + j * self.rows])
        } else {
            None
        }
    }

    /// Set element `(i, j)`.
    ///
    /// # Errors
    ///
    /// Returns `AdError::IndexOutOfBounds` if `(i, j)` is outside the matrix.
    pub fn set(&mut self, i: usize, j: usize, value: f64) -> Result<(), AdError> {
        if i >= self.rows {
            return Err(AdError::IndexOutOfBounds {
                start: i,
                end: i + 1,
                dim: 0,
                size: self.rows,
            });
        }
        if j >= self.cols {
            return Err(AdError::IndexOutOfBounds {
                start: j,
                end: j + 1,
                dim: 1,
                size: self.cols,
            });
        }
        self.data[i + j * self.rows] = value;
        Ok(())
    }

    /// Return the transposed matrix.
    pub fn transpose(&self) -> Self {
        Self::from_fn(self.cols, self.rows, |i, j| self.data[j + i * self.rows])
    }

    /// Sum of the diagonal.
    ///
    /// # Errors
    ///
    /// Returns `AdError::NotSquare` for non-square matrices.
    pub fn trace(&self) -> Result<f64, AdError> {
        if !self.is_square() {
            return Err(AdError::NotSquare {
                op: "trace",
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok((0..self.rows).map(|i| self.data[i + i * self.rows]).sum())
    }

    /// Largest absolute element (0 for an empty matrix).
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0, |acc, x| acc.max(x.abs()))
    }
}

impl std::ops::Index<(usize, usize)> for Matrix {
    type Output = f64;

    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        assert!(
            i < self.rows && j < self.cols,
            "index ({i}, {j}) out of bounds for {}x{} matrix",
            self.rows,
            self.cols
        );
        &self.data[i + j * self.rows]
    }
}

impl std::ops::IndexMut<(usize, usize)> for Matrix {
    #[inline]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        assert!(
            i < self.rows && j < self.cols,
            "index ({i}, {j}) out of bounds for {}x{} matrix",
            self.rows,
            self.cols
        );
        &mut self.data[i + j * self.rows]
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for i in 0..self.rows {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "[")?;
            for j in 0..self.cols {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", self.data[i + j * self.rows])?;
            }
            write!(f, "]")?;
        }
        write!(f, "]")
    }
}
