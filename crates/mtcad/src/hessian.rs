//! Gradient, Hessian and Newton steps via forward-over-reverse.
//!
//! For a scalar function of `n` scalar variables the Hessian is assembled one
//! column at a time: the forward pass is seeded with the `k`-th unit direction,
//! and after the reverse pass `xbar.X` of each variable is a gradient entry
//! while `xbar.Xdot` is an entry of column `k` of the Hessian.
//!
//! # Example
//!
//! ```
//! use mtcad::{Operand, newton_step};
//!
//! // Phi(q) = trace([[q1^2, 0], [0, q2^2]])
//! let q = newton_step(&[13.0, 17.0], |cg, q| {
//!     let q1 = q[0].mul(q[0])?;
//!     let q2 = q[1].mul(q[1])?;
//!     let c = cg.block(vec![
//!         vec![Operand::from(q1), Operand::from(0.0)],
//!         vec![Operand::from(0.0), Operand::from(q2)],
//!     ])?;
//!     c.trace()
//! })
//! .unwrap();
//! assert_eq!(q, vec![0.0, 0.0]);
//! ```

use crate::error::AdError;
use crate::function::Function;
use crate::graph::CGraph;
use crate::matrix::Matrix;
use crate::mtc::Mtc;
use crate::operations::solve;

/// Gradient and Hessian of a scalar function at `point`.
///
/// `f` records the function on the graph it is handed, taking one 1x1
/// variable per coordinate, and returns the 1x1 output node. It is called
/// once per coordinate direction, each time on a fresh graph.
///
/// # Errors
///
/// - `AdError::GraphState` if `point` is empty
/// - `AdError::ShapeMismatch` if `f` does not return a 1x1 node
/// - any error raised while recording `f`
pub fn gradient_and_hessian<F>(point: &[f64], f: F) -> Result<(Vec<f64>, Matrix), AdError>
where
    F: for<'g> Fn(&'g CGraph, &[Function<'g>]) -> Result<Function<'g>, AdError>,
{
    let n = point.len();
    if n == 0 {
        return Err(AdError::GraphState(
            "gradient_and_hessian needs at least one variable".to_string(),
        ));
    }

    let mut gradient = vec![0.0; n];
    let mut hessian = Matrix::zeros(n, n);
    for direction in 0..n {
        let cg = CGraph::new();
        let q: Vec<Function<'_>> = point
            .iter()
            .enumerate()
            .map(|(i, &v)| cg.variable(Mtc::scalar(v, if i == direction { 1.0 } else { 0.0 })))
            .collect();

        let phi = f(&cg, &q)?;
        if phi.shape() != (1, 1) {
            return Err(AdError::ShapeMismatch {
                op: "gradient_and_hessian",
                left: (1, 1),
                right: phi.shape(),
            });
        }
        cg.set_independents(&q)?;
        cg.set_dependents(&[phi])?;
        cg.reverse(&[Mtc::scalar(1.0, 0.0)])?;

        for (i, qi) in q.iter().enumerate() {
            let xbar = qi
                .xbar()
                .ok_or_else(|| AdError::GraphState(format!("variable {i} has no adjoint")))?;
            if direction == 0 {
                gradient[i] = xbar.x()[(0, 0)];
            }
            hessian[(i, direction)] = xbar.xdot()[(0, 0)];
        }
    }
    Ok((gradient, hessian))
}

/// One full Newton step `point - H^{-1} g`.
///
/// # Errors
///
/// Everything [`gradient_and_hessian`] returns, plus
/// `AdError::SingularMatrix` if the Hessian cannot be factored.
pub fn newton_step<F>(point: &[f64], f: F) -> Result<Vec<f64>, AdError>
where
    F: for<'g> Fn(&'g CGraph, &[Function<'g>]) -> Result<Function<'g>, AdError>,
{
    let (gradient, hessian) = gradient_and_hessian(point, f)?;
    let rhs = Matrix::from_fn(point.len(), 1, |i, _| -gradient[i]);
    let delta = solve(&hessian, &rhs)?;
    Ok(point
        .iter()
        .enumerate()
        .map(|(i, &p)| p + delta[(i, 0)])
        .collect())
}
