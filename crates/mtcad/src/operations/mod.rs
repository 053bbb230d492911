//! Matrix operations.
//!
//! Plain (non-differentiated) kernels on [`crate::Matrix`]. The Taylor
//! arithmetic in [`crate::mtc`] is written entirely in terms of these.
//!
//! ```text
//! elementwise  add, sub, hadamard, divide, scale, apply
//! linalg       matmul, inverse, solve            (faer)
//! slice        slice, add_block
//! block        block_layout, assemble
//! ```

mod block;
mod elementwise;
mod linalg;
mod slice;

pub use block::{BlockLayout, assemble, block_layout};
pub use elementwise::{add, add_assign, apply, apply_binary, divide, hadamard, scale, sub};
pub use linalg::{INVERSE_RESIDUAL_TOLERANCE, inverse, inverse_with_tolerance, matmul, solve};
pub use slice::{add_block, slice};
