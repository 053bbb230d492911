//! Graph node handles and operand promotion.
//!
//! A [`Function`] is a cheap `Copy` handle to a node of a [`CGraph`]. Its
//! methods evaluate the forward [`Mtc`] eagerly and record the operation in
//! the same graph, so a whole computation is written as ordinary method calls:
//!
//! ```
//! use mtcad::{CGraph, Matrix, Mtc};
//!
//! let cg = CGraph::new();
//! let a = cg.variable(Mtc::constant(Matrix::identity(2)));
//! let b = a.mul(3.0).unwrap().add(a).unwrap();
//! assert_eq!(b.value().x()[(1, 1)], 4.0);
//! assert_eq!(cg.len(), 4); // a, the promoted 3.0, mul, add
//! ```
//!
//! The right-hand side of a binary operation is anything convertible into an
//! [`Operand`]: another node, a plain [`Mtc`] or an `f64`. Non-node operands
//! become `Constant` leaves of the graph; a scalar is broadcast to the shape
//! of the other operand.
//!
//! The element-wise operators `+ - * /` are overloaded with a `Result`
//! output, and unary `-` returns the node directly.

use std::fmt;
use std::ops::Range;

use crate::error::AdError;
use crate::graph::{CGraph, NodeId, Op};
use crate::mtc::Mtc;

/// Handle to a recorded node.
#[derive(Clone, Copy)]
pub struct Function<'g> {
    graph: &'g CGraph,
    id: NodeId,
}

/// Operand of a recorded operation.
#[derive(Clone)]
pub enum Operand<'g> {
    /// Node already recorded in a graph.
    Node(Function<'g>),
    /// Constant Taylor pair.
    Value(Mtc),
    /// Constant scalar, broadcast to the shape it is combined with.
    Scalar(f64),
}

impl<'g> From<Function<'g>> for Operand<'g> {
    fn from(f: Function<'g>) -> Self {
        Operand::Node(f)
    }
}

impl From<Mtc> for Operand<'_> {
    fn from(m: Mtc) -> Self {
        Operand::Value(m)
    }
}

impl From<&Mtc> for Operand<'_> {
    fn from(m: &Mtc) -> Self {
        Operand::Value(m.clone())
    }
}

impl From<f64> for Operand<'_> {
    fn from(s: f64) -> Self {
        Operand::Scalar(s)
    }
}

impl fmt::Debug for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Node(func) => write!(f, "Node({func:?})"),
            Operand::Value(m) => write!(f, "Value({m})"),
            Operand::Scalar(s) => write!(f, "Scalar({s})"),
        }
    }
}

impl CGraph {
    /// Record an independent leaf.
    pub fn variable(&self, value: Mtc) -> Function<'_> {
        let id = self.push_leaf(Op::Variable, value);
        Function { graph: self, id }
    }

    /// Record a constant leaf.
    pub fn constant(&self, value: Mtc) -> Function<'_> {
        let id = self.push_leaf(Op::Constant, value);
        Function { graph: self, id }
    }

    /// Split an operand into its existing node (if any) and its value.
    ///
    /// `shape` is the broadcast target for scalar operands; without one a
    /// scalar becomes a 1x1 constant. Nothing is recorded here, so a failing
    /// operation leaves the graph untouched.
    fn prepare<'g>(
        &'g self,
        operand: Operand<'g>,
        shape: Option<(usize, usize)>,
    ) -> Result<(Option<Function<'g>>, Mtc), AdError> {
        match operand {
            Operand::Node(f) => {
                if !f.belongs_to(self) {
                    return Err(AdError::GraphState(format!(
                        "operand node {} belongs to a different graph",
                        f.id
                    )));
                }
                Ok((Some(f), f.value()))
            }
            Operand::Value(m) => Ok((None, m)),
            Operand::Scalar(s) => Ok((None, Mtc::broadcast(s, shape.unwrap_or((1, 1))))),
        }
    }

    /// Node id of a prepared operand, recording a constant leaf if needed.
    fn commit(&self, node: Option<Function<'_>>, value: Mtc) -> NodeId {
        match node {
            Some(f) => f.id,
            None => self.push_leaf(Op::Constant, value),
        }
    }

    /// Record a block matrix assembled from a rectangular grid of operands.
    ///
    /// The same node may appear in several positions; its adjoint then sums
    /// the contributions of every position. Scalars become 1x1 constants.
    ///
    /// # Errors
    ///
    /// - `AdError::ShapeMismatch` if the blocks don't tile a rectangle
    /// - `AdError::UnsupportedOperand` for an empty or ragged grid
    /// - `AdError::GraphState` if a node belongs to another graph
    ///
    /// # Example
    ///
    /// ```
    /// use mtcad::{CGraph, Matrix, Mtc};
    ///
    /// let cg = CGraph::new();
    /// let a = cg.variable(Mtc::constant(Matrix::ones(2, 2)));
    /// let b = cg.variable(Mtc::constant(Matrix::filled(2, 2, 3.0)));
    /// let c = cg.block(vec![vec![a, b], vec![b, a]]).unwrap();
    /// assert_eq!(c.shape(), (4, 4));
    /// assert_eq!(c.value().x()[(3, 0)], 3.0);
    /// ```
    pub fn block<'g, O>(&'g self, grid: Vec<Vec<O>>) -> Result<Function<'g>, AdError>
    where
        O: Into<Operand<'g>>,
    {
        let prepared: Vec<Vec<(Option<Function<'g>>, Mtc)>> = grid
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|o| self.prepare(o.into(), None))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<_, _>>()?;

        let refs: Vec<Vec<&Mtc>> = prepared
            .iter()
            .map(|row| row.iter().map(|(_, m)| m).collect())
            .collect();
        let (value, layout) = Mtc::from_blocks(&refs)?;

        let mut args = Vec::new();
        let mut placements = Vec::new();
        for (bi, row) in prepared.into_iter().enumerate() {
            for (bj, (node, block)) in row.into_iter().enumerate() {
                args.push(self.commit(node, block));
                placements.push((layout.row_offsets[bi], layout.col_offsets[bj]));
            }
        }
        let id = self.push(Op::Block { placements }, args, value)?;
        Ok(Function { graph: self, id })
    }
}

impl<'g> Function<'g> {
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Graph the node is recorded in.
    #[inline]
    pub fn graph(&self) -> &'g CGraph {
        self.graph
    }

    pub(crate) fn belongs_to(&self, graph: &CGraph) -> bool {
        std::ptr::eq(self.graph, graph)
    }

    /// Forward value.
    pub fn value(&self) -> Mtc {
        self.graph.nodes.borrow()[self.id.0].value.clone()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.graph.nodes.borrow()[self.id.0].value.shape()
    }

    /// Adjoint from the last reverse pass.
    pub fn xbar(&self) -> Option<Mtc> {
        self.graph.xbar(self.id)
    }

    pub fn op(&self) -> Op {
        self.graph.nodes.borrow()[self.id.0].op.clone()
    }

    pub fn args(&self) -> Vec<NodeId> {
        self.graph.nodes.borrow()[self.id.0].args.clone()
    }

    fn record_unary(&self, op: Op, value: Mtc) -> Function<'g> {
        let id = self.graph.push_unary(op, self.id, value);
        Function {
            graph: self.graph,
            id,
        }
    }

    fn binary<F>(
        &self,
        op: Op,
        rhs: Operand<'g>,
        broadcast: bool,
        eval: F,
    ) -> Result<Function<'g>, AdError>
    where
        F: FnOnce(&Mtc, &Mtc) -> Result<Mtc, AdError>,
    {
        if !broadcast && matches!(rhs, Operand::Scalar(_)) {
            return Err(AdError::UnsupportedOperand(format!(
                "{} does not accept a scalar operand",
                op.name()
            )));
        }
        let (node, rhs_value) = self.graph.prepare(rhs, Some(self.shape()))?;
        let value = eval(&self.value(), &rhs_value)?;
        let rhs_id = self.graph.commit(node, rhs_value);
        let id = self.graph.push(op, vec![self.id, rhs_id], value)?;
        Ok(Function {
            graph: self.graph,
            id,
        })
    }

    /// Element-wise sum.
    pub fn add(self, rhs: impl Into<Operand<'g>>) -> Result<Function<'g>, AdError> {
        self.binary(Op::Add, rhs.into(), true, Mtc::add)
    }

    /// Element-wise difference.
    pub fn sub(self, rhs: impl Into<Operand<'g>>) -> Result<Function<'g>, AdError> {
        self.binary(Op::Sub, rhs.into(), true, Mtc::sub)
    }

    /// Element-wise (Hadamard) product.
    pub fn mul(self, rhs: impl Into<Operand<'g>>) -> Result<Function<'g>, AdError> {
        self.binary(Op::Mul, rhs.into(), true, Mtc::mul)
    }

    /// Element-wise quotient.
    pub fn div(self, rhs: impl Into<Operand<'g>>) -> Result<Function<'g>, AdError> {
        self.binary(Op::Div, rhs.into(), true, Mtc::div)
    }

    /// Matrix product. Scalars are rejected.
    pub fn dot(self, rhs: impl Into<Operand<'g>>) -> Result<Function<'g>, AdError> {
        self.binary(Op::Dot, rhs.into(), false, Mtc::dot)
    }

    pub fn neg(self) -> Function<'g> {
        let value = self.value().neg();
        self.record_unary(Op::Neg, value)
    }

    pub fn scale(self, alpha: f64) -> Function<'g> {
        let value = self.value().scale(alpha);
        self.record_unary(Op::Scale(alpha), value)
    }

    pub fn transpose(self) -> Function<'g> {
        let value = self.value().transpose();
        self.record_unary(Op::Transpose, value)
    }

    /// Identity node; its adjoint passes straight through.
    pub fn copy(self) -> Function<'g> {
        let value = self.value();
        self.record_unary(Op::Copy, value)
    }

    /// Matrix inverse.
    pub fn inv(self) -> Result<Function<'g>, AdError> {
        let value = self.value().inv()?;
        Ok(self.record_unary(Op::Inv, value))
    }

    /// Trace as a 1x1 node.
    pub fn trace(self) -> Result<Function<'g>, AdError> {
        let value = self.value().trace()?;
        Ok(self.record_unary(Op::Trace, value))
    }

    /// Sub-block `rows x cols`.
    pub fn slice(self, rows: Range<usize>, cols: Range<usize>) -> Result<Function<'g>, AdError> {
        let value = self.value().slice(rows.clone(), cols.clone())?;
        Ok(self.record_unary(Op::Slice { rows, cols }, value))
    }

    /// Element-wise power for a positive integral exponent.
    ///
    /// Recorded as a chain of element-wise products, so `x.powi(3.0)` adds
    /// two `mul` nodes.
    ///
    /// # Errors
    ///
    /// Returns `AdError::UnsupportedOperand` if `exponent` is not a positive
    /// integer.
    pub fn powi(self, exponent: f64) -> Result<Function<'g>, AdError> {
        if exponent.fract() != 0.0 || exponent < 1.0 || exponent > f64::from(u32::MAX) {
            return Err(AdError::UnsupportedOperand(format!(
                "powi requires a positive integral exponent, got {exponent}"
            )));
        }
        let mut out = self;
        for _ in 1..(exponent as u32) {
            out = out.mul(self)?;
        }
        Ok(out)
    }
}

impl<'g> std::ops::Neg for Function<'g> {
    type Output = Function<'g>;

    fn neg(self) -> Function<'g> {
        Function::neg(self)
    }
}

/// Element-wise binary operators. Shape errors surface in the `Result`, so
/// `(a + b)?` reads like the method form `a.add(b)?`.
macro_rules! impl_binary_operator {
    ($trait:ident, $method:ident) => {
        impl<'g, O: Into<Operand<'g>>> std::ops::$trait<O> for Function<'g> {
            type Output = Result<Function<'g>, AdError>;

            fn $method(self, rhs: O) -> Self::Output {
                Function::$method(self, rhs)
            }
        }
    };
}

impl_binary_operator!(Add, add);
impl_binary_operator!(Sub, sub);
impl_binary_operator!(Mul, mul);
impl_binary_operator!(Div, div);

impl fmt::Debug for Function<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (rows, cols) = self.shape();
        f.debug_struct("Function")
            .field("id", &self.id)
            .field("op", &self.op().name())
            .field("shape", &format_args!("{rows}x{cols}"))
            .finish()
    }
}
