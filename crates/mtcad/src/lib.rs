//! mtcad - algorithmic differentiation over matrix Taylor coefficients
//!
//! This crate propagates truncated Taylor polynomials whose coefficients are
//! dense matrices, and records the operations on them in a computational graph
//! that can be swept in reverse.
//!
//! # Architecture
//!
//! ```text
//! Level 1: Reverse mode (graph, function, backward, hessian)
//!     → CGraph, Function, reverse, newton_step
//!
//! Level 2: Forward mode (mtc)
//!     → Mtc: value X and directional derivative Xdot
//!
//! Level 3: Dense kernels (matrix, operations, backend)
//!     → Matrix, matmul / inverse through faer
//! ```
//!
//! Because the adjoints computed by [`CGraph::reverse`] are themselves [`Mtc`]
//! values, seeding a direction on the forward pass yields gradients and
//! Hessian-vector products in one sweep.
//!
//! # Example
//!
//! ```
//! use mtcad::{CGraph, Matrix, Mtc};
//!
//! // C = A @ B
//! let cg = CGraph::new();
//! let a = cg.variable(
//!     Mtc::new(
//!         Matrix::from_rows(&[[3.0, 1.0], [2.0, 4.0]]).unwrap(),
//!         Matrix::from_rows(&[[1.0, 0.0], [0.0, 0.0]]).unwrap(),
//!     )
//!     .unwrap(),
//! );
//! let b = cg.variable(Mtc::constant(Matrix::from_rows(&[[5.0, 2.0], [1.0, 7.0]]).unwrap()));
//! let c = a.dot(b).unwrap();
//!
//! cg.set_independents(&[a, b]).unwrap();
//! cg.set_dependents(&[c]).unwrap();
//! cg.reverse(&[Mtc::constant(Matrix::identity(2))]).unwrap();
//!
//! // Abar = Cbar @ B^T
//! let abar = a.xbar().unwrap();
//! assert_eq!(abar.x(), &Matrix::from_rows(&[[5.0, 1.0], [2.0, 7.0]]).unwrap());
//! ```

pub mod backend;
mod backward;
pub mod error;
pub mod function;
pub mod graph;
pub mod hessian;
pub mod matrix;
pub mod mtc;
pub mod operations;
mod random;
#[cfg(feature = "render")]
pub mod render;
pub mod reshape;

pub use error::AdError;
pub use function::{Function, Operand};
pub use graph::{CGraph, NodeId, Op};
pub use hessian::{gradient_and_hessian, newton_step};
pub use matrix::Matrix;
pub use mtc::Mtc;
pub use operations::INVERSE_RESIDUAL_TOLERANCE;
