//! Error types for mtcad.

use thiserror::Error;

/// Errors that can occur in matrix, Taylor-coefficient and graph operations.
#[derive(Debug, Error)]
pub enum AdError {
    /// Operand shapes are incompatible for the requested operation.
    #[error("shape mismatch in {op}: {left:?} vs {right:?}")]
    ShapeMismatch {
        op: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },

    /// Data length doesn't match the requested shape.
    #[error("data length mismatch: expected {expected} elements, got {actual}")]
    DataLength { expected: usize, actual: usize },

    /// Matrix must be square.
    #[error("{op} requires a square matrix: got {rows}x{cols}")]
    NotSquare {
        op: &'static str,
        rows: usize,
        cols: usize,
    },

    /// Inverse requested on a (numerically) singular matrix.
    #[error("matrix is singular: inverse residual {residual:e}")]
    SingularMatrix { residual: f64 },

    /// Row/column range outside the matrix.
    #[error("range {start}..{end} out of bounds for dimension {dim} with size {size}")]
    IndexOutOfBounds {
        start: usize,
        end: usize,
        dim: usize,
        size: usize,
    },

    /// Operand of a type or value the operation cannot promote or handle.
    #[error("unsupported operand: {0}")]
    UnsupportedOperand(String),

    /// Graph is not in a state that allows the requested operation.
    #[error("invalid graph state: {0}")]
    GraphState(String),

    /// Writing a rendered graph failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
