//! Sub-block extraction and placement.

use crate::error::AdError;
use crate::matrix::Matrix;
use std::ops::Range;

fn check_range(range: &Range<usize>, dim: usize, size: usize) -> Result<(), AdError> {
    if range.start > range.end || range.end > size {
        return Err(AdError::IndexOutOfBounds {
            start: range.start,
            end: range.end,
            dim,
            size,
        });
    }
    Ok(())
}

/// Extract the sub-block `rows x cols` (copies the data).
///
/// # Errors
///
/// Returns `AdError::IndexOutOfBounds` if a range is reversed or exceeds the
/// matrix.
///
/// # Example
///
/// ```
/// use mtcad::Matrix;
/// use mtcad::operations::slice;
///
/// let m = Matrix::from_fn(4, 5, |i, j| (10 * i + j) as f64);
/// let s = slice(&m, 1..3, 2..4).unwrap();
/// assert_eq!(s.shape(), (2, 2));
/// assert_eq!(s[(0, 0)], 12.0);
/// ```
pub fn slice(m: &Matrix, rows: Range<usize>, cols: Range<usize>) -> Result<Matrix, AdError> {
    check_range(&rows, 0, m.nrows())?;
    check_range(&cols, 1, m.ncols())?;
    Ok(Matrix::from_fn(rows.len(), cols.len(), |i, j| {
        m[(rows.start + i, cols.start + j)]
    }))
}

/// Add `src` into the region of `dst` whose top-left corner is `(row, col)`.
///
/// # Errors
///
/// Returns `AdError::IndexOutOfBounds` if `src` doesn't fit.
pub fn add_block(dst: &mut Matrix, row: usize, col: usize, src: &Matrix) -> Result<(), AdError> {
    check_range(&(row..row + src.nrows()), 0, dst.nrows())?;
    check_range(&(col..col + src.ncols()), 1, dst.ncols())?;
    for j in 0..src.ncols() {
        for i in 0..src.nrows() {
            dst[(row + i, col + j)] += src[(i, j)];
        }
    }
    Ok(())
}
