//! Matrix Taylor coefficients.
//!
//! An [`Mtc`] is a truncated Taylor polynomial `X + Xdot * t` whose
//! coefficients are matrices of the same shape. Every operation propagates the
//! value and the first directional derivative together (forward mode).
//!
//! # Example
//!
//! ```
//! use mtcad::{Matrix, Mtc};
//!
//! let a = Mtc::new(
//!     Matrix::from_rows(&[[3.0, 1.0], [2.0, 4.0]]).unwrap(),
//!     Matrix::from_rows(&[[1.0, 0.0], [0.0, 0.0]]).unwrap(),
//! )
//! .unwrap();
//! let b = Mtc::constant(Matrix::from_rows(&[[5.0, 2.0], [1.0, 7.0]]).unwrap());
//!
//! let c = a.dot(&b).unwrap();
//! assert_eq!(c.x()[(0, 0)], 16.0);
//! // Xdot = Adot @ B + A @ Bdot
//! assert_eq!(c.xdot()[(0, 0)], 5.0);
//! assert_eq!(c.xdot()[(0, 1)], 2.0);
//! ```
//!
//! Binary operations take another `Mtc`. A plain `f64` operand is promoted
//! with [`Mtc::broadcast`]; recorded operations on a
//! [`Function`](crate::Function) do this automatically.

use std::fmt;
use std::ops::Range;

use crate::error::AdError;
use crate::matrix::Matrix;
use crate::operations::{
    self, BlockLayout, INVERSE_RESIDUAL_TOLERANCE, add_assign, hadamard, matmul,
};

/// Taylor-coefficient pair `(X, Xdot)` with `X.shape() == Xdot.shape()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Mtc {
    x: Matrix,
    xdot: Matrix,
}

impl Mtc {
    /// Create a pair from a value and a direction.
    ///
    /// # Errors
    ///
    /// Returns `AdError::ShapeMismatch` if the shapes differ.
    pub fn new(x: Matrix, xdot: Matrix) -> Result<Self, AdError> {
        if x.shape() != xdot.shape() {
            return Err(AdError::ShapeMismatch {
                op: "mtc",
                left: x.shape(),
                right: xdot.shape(),
            });
        }
        Ok(Self { x, xdot })
    }

    pub(crate) fn from_parts_unchecked(x: Matrix, xdot: Matrix) -> Self {
        debug_assert_eq!(x.shape(), xdot.shape());
        Self { x, xdot }
    }

    /// Lift a matrix to a pair with zero direction.
    pub fn constant(x: Matrix) -> Self {
        let xdot = Matrix::zeros(x.nrows(), x.ncols());
        Self { x, xdot }
    }

    /// 1x1 pair, the scalar Taylor series `x + xdot * t`.
    pub fn scalar(x: f64, xdot: f64) -> Self {
        Self {
            x: Matrix::scalar(x),
            xdot: Matrix::scalar(xdot),
        }
    }

    /// All-zero pair, the identity for adjoint accumulation.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::constant(Matrix::zeros(rows, cols))
    }

    /// Constant pair with every element of `X` equal to `value`.
    ///
    /// This is how a scalar enters element-wise arithmetic: its derivative is
    /// zero.
    ///
    /// ```
    /// use mtcad::{Matrix, Mtc};
    ///
    /// let a = Mtc::new(Matrix::ones(2, 2), Matrix::identity(2)).unwrap();
    /// let b = a.mul(&Mtc::broadcast(3.0, a.shape())).unwrap();
    /// assert_eq!(b.x()[(0, 1)], 3.0);
    /// assert_eq!(b.xdot()[(1, 1)], 3.0);
    /// assert_eq!(b.xdot()[(1, 0)], 0.0);
    /// ```
    pub fn broadcast(value: f64, (rows, cols): (usize, usize)) -> Self {
        Self::constant(Matrix::filled(rows, cols, value))
    }

    /// Value coefficient.
    #[inline]
    pub fn x(&self) -> &Matrix {
        &self.x
    }

    /// Directional-derivative coefficient.
    #[inline]
    pub fn xdot(&self) -> &Matrix {
        &self.xdot
    }

    pub fn into_parts(self) -> (Matrix, Matrix) {
        (self.x, self.xdot)
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.x.shape()
    }

    /// Element-wise sum.
    pub fn add(&self, other: &Mtc) -> Result<Mtc, AdError> {
        Ok(Self {
            x: operations::add(&self.x, &other.x)?,
            xdot: operations::add(&self.xdot, &other.xdot)?,
        })
    }

    /// Element-wise difference.
    pub fn sub(&self, other: &Mtc) -> Result<Mtc, AdError> {
        Ok(Self {
            x: operations::sub(&self.x, &other.x)?,
            xdot: operations::sub(&self.xdot, &other.xdot)?,
        })
    }

    /// Hadamard product, `Xdot = Adot * B + A * Bdot`.
    pub fn mul(&self, other: &Mtc) -> Result<Mtc, AdError> {
        let x = hadamard(&self.x, &other.x)?;
        let mut xdot = hadamard(&self.xdot, &other.x)?;
        add_assign(&mut xdot, &hadamard(&self.x, &other.xdot)?)?;
        Ok(Self { x, xdot })
    }

    /// Element-wise quotient, `Xdot = (Adot * B - A * Bdot) / B^2`.
    ///
    /// # Errors
    ///
    /// - `AdError::ShapeMismatch` if the shapes differ
    /// - `AdError::UnsupportedOperand` if `other.x()` contains an exact zero
    pub fn div(&self, other: &Mtc) -> Result<Mtc, AdError> {
        let x = operations::divide(&self.x, &other.x)?;
        let numerator = operations::sub(
            &hadamard(&self.xdot, &other.x)?,
            &hadamard(&self.x, &other.xdot)?,
        )?;
        let xdot = operations::divide(&numerator, &hadamard(&other.x, &other.x)?)?;
        Ok(Self { x, xdot })
    }

    /// Matrix product, `Xdot = Adot @ B + A @ Bdot`.
    pub fn dot(&self, other: &Mtc) -> Result<Mtc, AdError> {
        let x = matmul(&self.x, &other.x)?;
        let mut xdot = matmul(&self.xdot, &other.x)?;
        add_assign(&mut xdot, &matmul(&self.x, &other.xdot)?)?;
        Ok(Self { x, xdot })
    }

    pub fn transpose(&self) -> Mtc {
        Self {
            x: self.x.transpose(),
            xdot: self.xdot.transpose(),
        }
    }

    /// Trace as a 1x1 pair.
    pub fn trace(&self) -> Result<Mtc, AdError> {
        Ok(Self::scalar(self.x.trace()?, self.xdot.trace()?))
    }

    /// Matrix inverse, `Xdot = -X @ Adot @ X`.
    ///
    /// # Errors
    ///
    /// - `AdError::NotSquare` if the matrix is not square
    /// - `AdError::SingularMatrix` if `X` is numerically singular
    pub fn inv(&self) -> Result<Mtc, AdError> {
        self.inv_with_tolerance(INVERSE_RESIDUAL_TOLERANCE)
    }

    /// [`Mtc::inv`] with an explicit singularity tolerance.
    pub fn inv_with_tolerance(&self, tolerance: f64) -> Result<Mtc, AdError> {
        let x = operations::inverse_with_tolerance(&self.x, tolerance)?;
        let xdot = operations::scale(&matmul(&matmul(&x, &self.xdot)?, &x)?, -1.0);
        Ok(Self { x, xdot })
    }

    pub fn neg(&self) -> Mtc {
        self.scale(-1.0)
    }

    /// Multiply both coefficients by `alpha`.
    pub fn scale(&self, alpha: f64) -> Mtc {
        Self {
            x: operations::scale(&self.x, alpha),
            xdot: operations::scale(&self.xdot, alpha),
        }
    }

    /// Element-wise integer power by repeated multiplication.
    ///
    /// # Errors
    ///
    /// Returns `AdError::UnsupportedOperand` for `n == 0`.
    ///
    /// # Example
    ///
    /// ```
    /// use mtcad::Mtc;
    ///
    /// let x = Mtc::scalar(3.0, 1.0);
    /// let y = x.powi(3).unwrap();
    /// assert_eq!(y.x()[(0, 0)], 27.0);
    /// assert_eq!(y.xdot()[(0, 0)], 27.0); // 3 * x^2
    /// ```
    pub fn powi(&self, n: u32) -> Result<Mtc, AdError> {
        if n == 0 {
            return Err(AdError::UnsupportedOperand(
                "powi exponent must be at least 1".to_string(),
            ));
        }
        let mut out = self.clone();
        for _ in 1..n {
            out = out.mul(self)?;
        }
        Ok(out)
    }

    /// Sub-block of both coefficients.
    pub fn slice(&self, rows: Range<usize>, cols: Range<usize>) -> Result<Mtc, AdError> {
        Ok(Self {
            x: operations::slice(&self.x, rows.clone(), cols.clone())?,
            xdot: operations::slice(&self.xdot, rows, cols)?,
        })
    }

    /// Assemble a block pair from a rectangular grid.
    ///
    /// Returns the assembled pair together with the layout that locates each
    /// block inside it.
    ///
    /// # Example
    ///
    /// ```
    /// use mtcad::{Matrix, Mtc};
    ///
    /// let a = Mtc::constant(Matrix::ones(2, 2));
    /// let b = Mtc::constant(Matrix::filled(2, 1, 3.0));
    /// let (c, layout) = Mtc::from_blocks(&[vec![&a, &b]]).unwrap();
    /// assert_eq!(c.shape(), (2, 3));
    /// assert_eq!(layout.col_offsets, vec![0, 2]);
    /// ```
    pub fn from_blocks(grid: &[Vec<&Mtc>]) -> Result<(Mtc, BlockLayout), AdError> {
        let shapes: Vec<Vec<(usize, usize)>> = grid
            .iter()
            .map(|row| row.iter().map(|m| m.shape()).collect())
            .collect();
        let layout = operations::block_layout(&shapes)?;

        let xs: Vec<Vec<&Matrix>> = grid
            .iter()
            .map(|row| row.iter().map(|m| &m.x).collect())
            .collect();
        let xdots: Vec<Vec<&Matrix>> = grid
            .iter()
            .map(|row| row.iter().map(|m| &m.xdot).collect())
            .collect();
        let x = operations::assemble(&xs, &layout)?;
        let xdot = operations::assemble(&xdots, &layout)?;
        Ok((Self { x, xdot }, layout))
    }

    /// Accumulate `block` into the region starting at `(row, col)`.
    pub fn add_block(&mut self, row: usize, col: usize, block: &Mtc) -> Result<(), AdError> {
        operations::add_block(&mut self.x, row, col, &block.x)?;
        operations::add_block(&mut self.xdot, row, col, &block.xdot)
    }

    /// In-place `self += other`.
    pub fn add_assign(&mut self, other: &Mtc) -> Result<(), AdError> {
        add_assign(&mut self.x, &other.x)?;
        add_assign(&mut self.xdot, &other.xdot)
    }
}

impl fmt::Display for Mtc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mtc(X = {}, Xdot = {})", self.x, self.xdot)
    }
}
