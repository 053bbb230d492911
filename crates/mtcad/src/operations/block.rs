//! Block-matrix layout and assembly.

use crate::error::AdError;
use crate::matrix::Matrix;
use crate::operations::slice::add_block;

/// Offsets of a rectangular grid of blocks inside the assembled matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLayout {
    /// Starting row of each block row.
    pub row_offsets: Vec<usize>,
    /// Starting column of each block column.
    pub col_offsets: Vec<usize>,
    /// Shape of the assembled matrix.
    pub shape: (usize, usize),
}

/// Compute the layout of a grid of block shapes.
///
/// Every block row must share one height and every block column one width.
///
/// # Errors
///
/// - `AdError::UnsupportedOperand` for an empty or ragged grid
/// - `AdError::ShapeMismatch` if block heights or widths disagree
///
/// # Example
///
/// ```
/// use mtcad::operations::block_layout;
///
/// let layout = block_layout(&[vec![(2, 2), (2, 3)], vec![(1, 2), (1, 3)]]).unwrap();
/// assert_eq!(layout.row_offsets, vec![0, 2]);
/// assert_eq!(layout.col_offsets, vec![0, 2]);
/// assert_eq!(layout.shape, (3, 5));
/// ```
pub fn block_layout(shapes: &[Vec<(usize, usize)>]) -> Result<BlockLayout, AdError> {
    let ncols = shapes.first().map_or(0, Vec::len);
    if ncols == 0 {
        return Err(AdError::UnsupportedOperand("empty block grid".to_string()));
    }
    if let Some(r) = shapes.iter().position(|row| row.len() != ncols) {
        return Err(AdError::UnsupportedOperand(format!(
            "ragged block grid: row {r} has {} blocks, expected {ncols}",
            shapes[r].len()
        )));
    }

    let mut row_offsets = Vec::with_capacity(shapes.len());
    let mut height = 0;
    for row in shapes {
        let h = row[0].0;
        if let Some(&bad) = row.iter().find(|s| s.0 != h) {
            return Err(AdError::ShapeMismatch {
                op: "block",
                left: row[0],
                right: bad,
            });
        }
        row_offsets.push(height);
        height += h;
    }

    let mut col_offsets = Vec::with_capacity(ncols);
    let mut width = 0;
    for j in 0..ncols {
        let w = shapes[0][j].1;
        if let Some(bad) = shapes.iter().map(|row| row[j]).find(|s| s.1 != w) {
            return Err(AdError::ShapeMismatch {
                op: "block",
                left: shapes[0][j],
                right: bad,
            });
        }
        col_offsets.push(width);
        width += w;
    }

    Ok(BlockLayout {
        row_offsets,
        col_offsets,
        shape: (height, width),
    })
}

/// Place a grid of blocks at the offsets of `layout`.
///
/// # Errors
///
/// Returns `AdError::IndexOutOfBounds` if a block does not fit the layout.
pub fn assemble(grid: &[Vec<&Matrix>], layout: &BlockLayout) -> Result<Matrix, AdError> {
    let mut out = Matrix::zeros(layout.shape.0, layout.shape.1);
    for (bi, row) in grid.iter().enumerate() {
        for (bj, block) in row.iter().enumerate() {
            add_block(&mut out, layout.row_offsets[bi], layout.col_offsets[bj], block)?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout_of(grid: &[Vec<&Matrix>]) -> BlockLayout {
        let shapes: Vec<Vec<(usize, usize)>> = grid
            .iter()
            .map(|row| row.iter().map(|m| m.shape()).collect())
            .collect();
        block_layout(&shapes).unwrap()
    }

    #[test]
    fn test_assemble_2x2() {
        let a = Matrix::ones(2, 2);
        let b = Matrix::filled(2, 2, 3.0);
        let grid = [vec![&a, &b], vec![&b, &a]];
        let c = assemble(&grid, &layout_of(&grid)).unwrap();
        assert_eq!(c.shape(), (4, 4));
        assert_eq!(c[(0, 0)], 1.0);
        assert_eq!(c[(0, 2)], 3.0);
        assert_eq!(c[(3, 1)], 3.0);
        assert_eq!(c[(3, 3)], 1.0);
    }

    #[test]
    fn test_assemble_mixed_sizes() {
        let q1 = Matrix::scalar(169.0);
        let q2 = Matrix::scalar(289.0);
        let ze = Matrix::scalar(0.0);
        let grid = [vec![&q1, &ze], vec![&ze, &q2]];
        let c = assemble(&grid, &layout_of(&grid)).unwrap();
        assert_eq!(c, Matrix::from_rows(&[[169.0, 0.0], [0.0, 289.0]]).unwrap());
    }

    #[test]
    fn test_assemble_rejects_layout_too_small() {
        let a = Matrix::ones(2, 2);
        let layout = BlockLayout {
            row_offsets: vec![0],
            col_offsets: vec![0],
            shape: (1, 1),
        };
        assert!(matches!(
            assemble(&[vec![&a]], &layout),
            Err(AdError::IndexOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_layout_height_mismatch() {
        let result = block_layout(&[vec![(2, 2), (3, 2)]]);
        assert!(matches!(
            result,
            Err(AdError::ShapeMismatch {
                left: (2, 2),
                right: (3, 2),
                ..
            })
        ));
    }

    #[test]
    fn test_layout_width_mismatch() {
        let result = block_layout(&[vec![(1, 2)], vec![(1, 3)]]);
        assert!(matches!(result, Err(AdError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_layout_ragged_and_empty() {
        assert!(matches!(
            block_layout(&[vec![(1, 1), (1, 1)], vec![(1, 1)]]),
            Err(AdError::UnsupportedOperand(_))
        ));
        assert!(matches!(block_layout(&[]), Err(AdError::UnsupportedOperand(_))));
    }
}
