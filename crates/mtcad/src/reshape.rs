//! Conversion between a grid of scalar Taylor series and one matrix series.
//!
//! A 1x1 [`Mtc`] is a scalar Taylor series `x + xdot * t`. An `R x C` grid of
//! them carries the same information as a single `R x C` pair.

use crate::error::AdError;
use crate::matrix::Matrix;
use crate::mtc::Mtc;

/// Split a pair into an `R x C` grid of 1x1 pairs.
///
/// # Example
///
/// ```
/// use mtcad::{Matrix, Mtc};
/// use mtcad::reshape::to_scalar_grid;
///
/// let a = Mtc::new(Matrix::identity(2), Matrix::ones(2, 2)).unwrap();
/// let grid = to_scalar_grid(&a);
/// assert_eq!(grid[1][1], Mtc::scalar(1.0, 1.0));
/// assert_eq!(grid[0][1], Mtc::scalar(0.0, 1.0));
/// ```
pub fn to_scalar_grid(m: &Mtc) -> Vec<Vec<Mtc>> {
    let (rows, cols) = m.shape();
    (0..rows)
        .map(|i| {
            (0..cols)
                .map(|j| Mtc::scalar(m.x()[(i, j)], m.xdot()[(i, j)]))
                .collect()
        })
        .collect()
}

fn scalar_parts(s: &Mtc) -> Result<(f64, f64), AdError> {
    if s.shape() != (1, 1) {
        return Err(AdError::ShapeMismatch {
            op: "from_scalar_grid",
            left: (1, 1),
            right: s.shape(),
        });
    }
    Ok((s.x()[(0, 0)], s.xdot()[(0, 0)]))
}

/// Join an `R x C` grid of 1x1 pairs into one `R x C` pair.
///
/// # Errors
///
/// - `AdError::ShapeMismatch` if an entry is not 1x1
/// - `AdError::DataLength` if the rows are ragged
pub fn from_scalar_grid(grid: &[Vec<Mtc>]) -> Result<Mtc, AdError> {
    let rows = grid.len();
    let cols = grid.first().map_or(0, Vec::len);
    let mut x = Matrix::zeros(rows, cols);
    let mut xdot = Matrix::zeros(rows, cols);
    for (i, row) in grid.iter().enumerate() {
        if row.len() != cols {
            return Err(AdError::DataLength {
                expected: cols,
                actual: row.len(),
            });
        }
        for (j, s) in row.iter().enumerate() {
            let (v, d) = scalar_parts(s)?;
            x[(i, j)] = v;
            xdot[(i, j)] = d;
        }
    }
    Mtc::new(x, xdot)
}

/// Join a sequence of 1x1 pairs into an `N x 1` column pair.
pub fn from_scalar_column(column: &[Mtc]) -> Result<Mtc, AdError> {
    let mut x = Matrix::zeros(column.len(), 1);
    let mut xdot = Matrix::zeros(column.len(), 1);
    for (i, s) in column.iter().enumerate() {
        let (v, d) = scalar_parts(s)?;
        x[(i, 0)] = v;
        xdot[(i, 0)] = d;
    }
    Mtc::new(x, xdot)
}
