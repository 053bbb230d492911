//! Reverse pass over a recorded [`CGraph`].
//!
//! Adjoints are themselves [`Mtc`] values. Every local rule below is written
//! with `Mtc` arithmetic, so the directional part of a forward seed is carried
//! through the reverse sweep as well: after [`CGraph::reverse`] the `X` part of
//! an independent's adjoint is the gradient and the `Xdot` part is the
//! Hessian-vector product along the forward direction.

use crate::error::AdError;
use crate::graph::{CGraph, Node, Op};
use crate::matrix::Matrix;
use crate::mtc::Mtc;

impl CGraph {
    /// Accumulate adjoints from the dependents back to every node.
    ///
    /// `seeds[k]` is added to the adjoint of the `k`-th dependent. Every
    /// adjoint is reset first, so the graph can be swept again with other
    /// seeds.
    ///
    /// # Errors
    ///
    /// - `AdError::GraphState` if no dependents or independents are set, or
    ///   if the number of seeds differs from the number of dependents
    /// - `AdError::ShapeMismatch` if a seed's shape differs from its dependent's
    pub fn reverse(&self, seeds: &[Mtc]) -> Result<(), AdError> {
        let dependents = self.dependents();
        if dependents.is_empty() {
            return Err(AdError::GraphState(
                "reverse requires at least one dependent".to_string(),
            ));
        }
        if self.independents().is_empty() {
            return Err(AdError::GraphState(
                "reverse requires at least one independent".to_string(),
            ));
        }
        if seeds.len() != dependents.len() {
            return Err(AdError::GraphState(format!(
                "expected {} seed adjoints, got {}",
                dependents.len(),
                seeds.len()
            )));
        }

        let mut nodes = self.nodes.borrow_mut();
        for (id, seed) in dependents.iter().zip(seeds) {
            let shape = nodes[id.0].value.shape();
            if shape != seed.shape() {
                return Err(AdError::ShapeMismatch {
                    op: "reverse",
                    left: shape,
                    right: seed.shape(),
                });
            }
        }

        let mut xbars: Vec<Mtc> = nodes
            .iter()
            .map(|n| {
                let (rows, cols) = n.value.shape();
                Mtc::zeros(rows, cols)
            })
            .collect();
        for (id, seed) in dependents.iter().zip(seeds) {
            xbars[id.0].add_assign(seed)?;
        }

        for idx in (0..nodes.len()).rev() {
            let node = &nodes[idx];
            if node.args.is_empty() {
                continue;
            }
            let contributions = local_adjoints(node, &nodes, &xbars[idx])?;
            for (arg, contribution) in node.args.iter().zip(&contributions) {
                xbars[arg.0].add_assign(contribution)?;
            }
        }

        for (node, xbar) in nodes.iter_mut().zip(xbars) {
            node.xbar = Some(xbar);
        }
        Ok(())
    }
}

/// Contribution of `zbar` to the adjoint of each argument of `node`, in
/// argument order.
fn local_adjoints(node: &Node, nodes: &[Node], zbar: &Mtc) -> Result<Vec<Mtc>, AdError> {
    let arg = |k: usize| &nodes[node.args[k].0].value;
    let z = &node.value;

    let contributions = match &node.op {
        Op::Variable | Op::Constant => Vec::new(),
        Op::Add => vec![zbar.clone(), zbar.clone()],
        Op::Sub => vec![zbar.clone(), zbar.neg()],
        Op::Mul => vec![zbar.mul(arg(1))?, zbar.mul(arg(0))?],
        Op::Div => {
            let b = arg(1);
            vec![zbar.div(b)?, zbar.mul(z)?.div(b)?.neg()]
        }
        Op::Neg => vec![zbar.neg()],
        Op::Scale(alpha) => vec![zbar.scale(*alpha)],
        Op::Copy => vec![zbar.clone()],
        Op::Dot => vec![
            zbar.dot(&arg(1).transpose())?,
            arg(0).transpose().dot(zbar)?,
        ],
        Op::Transpose => vec![zbar.transpose()],
        Op::Trace => {
            let n = arg(0).shape().0;
            let identity = Matrix::identity(n);
            let x = crate::operations::scale(&identity, zbar.x()[(0, 0)]);
            let xdot = crate::operations::scale(&identity, zbar.xdot()[(0, 0)]);
            vec![Mtc::new(x, xdot)?]
        }
        Op::Inv => {
            let zt = z.transpose();
            vec![zt.dot(zbar)?.dot(&zt)?.neg()]
        }
        Op::Slice { rows, cols } => {
            let (r, c) = arg(0).shape();
            let mut abar = Mtc::zeros(r, c);
            abar.add_block(rows.start, cols.start, zbar)?;
            vec![abar]
        }
        Op::Block { placements } => placements
            .iter()
            .enumerate()
            .map(|(k, &(row, col))| {
                let (h, w) = arg(k).shape();
                zbar.slice(row..row + h, col..col + w)
            })
            .collect::<Result<Vec<_>, _>>()?,
    };
    Ok(contributions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn m(rows: &[[f64; 2]]) -> Matrix {
        Matrix::from_rows(rows).unwrap()
    }

    #[test]
    fn test_reverse_requires_dependents() {
        let cg = CGraph::new();
        let x = cg.variable(Mtc::scalar(1.0, 0.0));
        cg.set_independents(&[x]).unwrap();
        assert!(matches!(
            cg.reverse(&[Mtc::scalar(1.0, 0.0)]),
            Err(AdError::GraphState(_))
        ));
    }

    #[test]
    fn test_reverse_requires_independents() {
        let cg = CGraph::new();
        let x = cg.variable(Mtc::scalar(1.0, 0.0));
        cg.set_dependents(&[x]).unwrap();
        assert!(matches!(
            cg.reverse(&[Mtc::scalar(1.0, 0.0)]),
            Err(AdError::GraphState(_))
        ));
    }

    #[test]
    fn test_reverse_seed_count() {
        let cg = CGraph::new();
        let x = cg.variable(Mtc::scalar(1.0, 0.0));
        let y = x.scale(2.0);
        cg.set_independents(&[x]).unwrap();
        cg.set_dependents(&[y]).unwrap();
        assert!(matches!(cg.reverse(&[]), Err(AdError::GraphState(_))));
        assert!(x.xbar().is_none());
    }

    #[test]
    fn test_reverse_seed_shape() {
        let cg = CGraph::new();
        let x = cg.variable(Mtc::zeros(2, 2));
        cg.set_independents(&[x]).unwrap();
        cg.set_dependents(&[x]).unwrap();
        assert!(matches!(
            cg.reverse(&[Mtc::zeros(1, 2)]),
            Err(AdError::ShapeMismatch { op: "reverse", .. })
        ));
    }

    #[test]
    fn test_shared_subexpression_accumulates() {
        // f = x * x + x, df/dx = 2x + 1
        let cg = CGraph::new();
        let x = cg.variable(Mtc::scalar(3.0, 1.0));
        let f = x.mul(x).unwrap().add(x).unwrap();
        cg.set_independents(&[x]).unwrap();
        cg.set_dependents(&[f]).unwrap();
        cg.reverse(&[Mtc::scalar(1.0, 0.0)]).unwrap();

        let xbar = x.xbar().unwrap();
        assert_eq!(xbar.x()[(0, 0)], 7.0);
        assert_eq!(xbar.xdot()[(0, 0)], 2.0);
    }

    #[test]
    fn test_reverse_resets_adjoints() {
        let cg = CGraph::new();
        let x = cg.variable(Mtc::scalar(2.0, 0.0));
        let y = x.scale(5.0);
        cg.set_independents(&[x]).unwrap();
        cg.set_dependents(&[y]).unwrap();
        cg.reverse(&[Mtc::scalar(1.0, 0.0)]).unwrap();
        cg.reverse(&[Mtc::scalar(1.0, 0.0)]).unwrap();
        assert_eq!(x.xbar().unwrap().x()[(0, 0)], 5.0);
    }

    #[test]
    fn test_dependent_listed_twice() {
        let cg = CGraph::new();
        let x = cg.variable(Mtc::scalar(2.0, 0.0));
        cg.set_independents(&[x]).unwrap();
        cg.set_dependents(&[x, x]).unwrap();
        cg.reverse(&[Mtc::scalar(1.0, 0.0), Mtc::scalar(4.0, 0.0)])
            .unwrap();
        assert_eq!(x.xbar().unwrap().x()[(0, 0)], 5.0);
    }

    #[test]
    fn test_sub_and_neg_rules() {
        let cg = CGraph::new();
        let a = cg.variable(Mtc::scalar(1.0, 0.0));
        let b = cg.variable(Mtc::scalar(2.0, 0.0));
        let c = a.sub(b).unwrap();
        let d = -c;
        cg.set_independents(&[a, b]).unwrap();
        cg.set_dependents(&[d]).unwrap();
        cg.reverse(&[Mtc::scalar(1.0, 0.0)]).unwrap();
        assert_eq!(a.xbar().unwrap().x()[(0, 0)], -1.0);
        assert_eq!(b.xbar().unwrap().x()[(0, 0)], 1.0);
    }

    #[test]
    fn test_transpose_and_copy_rules() {
        let cg = CGraph::new();
        let a = cg.variable(Mtc::constant(Matrix::zeros(2, 3)));
        let t = a.transpose().copy();
        cg.set_independents(&[a]).unwrap();
        cg.set_dependents(&[t]).unwrap();
        let seed = Mtc::constant(Matrix::from_fn(3, 2, |i, j| (i + 10 * j) as f64));
        cg.reverse(&[seed.clone()]).unwrap();
        assert_eq!(a.xbar().unwrap(), seed.transpose());
    }

    #[test]
    fn test_slice_rule() {
        let cg = CGraph::new();
        let a = cg.variable(Mtc::zeros(3, 3));
        let s = a.slice(1..3, 0..2).unwrap();
        cg.set_independents(&[a]).unwrap();
        cg.set_dependents(&[s]).unwrap();
        cg.reverse(&[Mtc::new(Matrix::ones(2, 2), Matrix::filled(2, 2, 2.0)).unwrap()])
            .unwrap();

        let abar = a.xbar().unwrap();
        assert_eq!(abar.x()[(0, 0)], 0.0);
        assert_eq!(abar.x()[(1, 0)], 1.0);
        assert_eq!(abar.x()[(2, 1)], 1.0);
        assert_eq!(abar.x()[(2, 2)], 0.0);
        assert_eq!(abar.xdot()[(2, 1)], 2.0);
    }

    #[test]
    fn test_inv_rule() {
        // d tr(inv(A)) / dA = -(inv(A)^T)^2
        let a = m(&[[4.0, 7.0], [2.0, 6.0]]);
        let cg = CGraph::new();
        let fa = cg.variable(Mtc::constant(a));
        let f = fa.inv().unwrap().trace().unwrap();
        cg.set_independents(&[fa]).unwrap();
        cg.set_dependents(&[f]).unwrap();
        cg.reverse(&[Mtc::scalar(1.0, 0.0)]).unwrap();

        let c = m(&[[0.6, -0.7], [-0.2, 0.4]]);
        let ct = c.transpose();
        let expected = crate::operations::matmul(&ct, &ct).unwrap();
        let abar = fa.xbar().unwrap();
        for (x, y) in abar.x().data().iter().zip(expected.data()) {
            assert_relative_eq!(*x, -y, epsilon = 1e-12);
        }
    }
}
