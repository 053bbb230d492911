//! Backend glue for dense linear algebra.
//!
//! [`Matrix`](crate::Matrix) stores its elements column-major, the same
//! layout faer uses, so [`AsFaerMat`] hands out views over the existing buffer.
//! Products, LU factorizations and solves in [`crate::operations`] go through
//! these views.

mod faer_interop;

pub use faer_interop::{AsFaerMat, matrix_from_faer_mat};
