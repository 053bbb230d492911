//! Computational graph recording operations on [`Mtc`] values.
//!
//! The graph is an append-only arena: nodes are stored in creation order and
//! refer to their operands by [`NodeId`]. Since an operand always exists
//! before the node that consumes it, creation order is a topological order
//! and the reverse pass ([`CGraph::reverse`]) only has to walk the arena
//! backwards.
//!
//! There is no implicit "current graph". Every node is created through an
//! explicit `&CGraph`, so independent graphs can be built side by side.
//!
//! # Example
//!
//! ```
//! use mtcad::{CGraph, Mtc};
//!
//! let cg = CGraph::new();
//! let x = cg.variable(Mtc::scalar(1.0, 1.0));
//! let y = cg.variable(Mtc::scalar(2.0, 0.0));
//! let z = x.dot(y).unwrap();
//!
//! cg.set_independents(&[x, y]).unwrap();
//! cg.set_dependents(&[z]).unwrap();
//! cg.reverse(&[Mtc::scalar(1.0, 0.0)]).unwrap();
//!
//! assert_eq!(x.xbar().unwrap().x()[(0, 0)], 2.0);
//! assert_eq!(y.xbar().unwrap().x()[(0, 0)], 1.0);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::ops::Range;

use crate::error::AdError;
use crate::function::Function;
use crate::mtc::Mtc;

/// Index of a node inside its [`CGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position in creation order.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Operation that produced a node.
#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    /// Independent leaf created by [`CGraph::variable`].
    Variable,
    /// Leaf holding a promoted constant.
    Constant,
    Add,
    Sub,
    /// Element-wise product.
    Mul,
    /// Element-wise quotient.
    Div,
    Neg,
    Scale(f64),
    /// Matrix product.
    Dot,
    Transpose,
    Inv,
    Trace,
    /// Sub-block `rows x cols` of the single argument.
    Slice { rows: Range<usize>, cols: Range<usize> },
    /// Block assembly; `placements[k]` is the top-left corner of `args[k]`.
    Block { placements: Vec<(usize, usize)> },
    Copy,
}

impl Op {
    /// Short label used in graph dumps and rendered graphs.
    pub fn name(&self) -> &'static str {
        match self {
            Op::Variable => "var",
            Op::Constant => "const",
            Op::Add => "add",
            Op::Sub => "sub",
            Op::Mul => "mul",
            Op::Div => "div",
            Op::Neg => "neg",
            Op::Scale(_) => "scale",
            Op::Dot => "dot",
            Op::Transpose => "transpose",
            Op::Inv => "inv",
            Op::Trace => "trace",
            Op::Slice { .. } => "slice",
            Op::Block { .. } => "block",
            Op::Copy => "copy",
        }
    }

    /// Whether the node has no arguments.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Op::Variable | Op::Constant)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Scale(s) => write!(f, "scale({s})"),
            Op::Slice { rows, cols } => write!(f, "slice[{rows:?}, {cols:?}]"),
            op => f.write_str(op.name()),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) value: Mtc,
    pub(crate) args: Vec<NodeId>,
    pub(crate) op: Op,
    pub(crate) xbar: Option<Mtc>,
}

/// Recorded computation over [`Mtc`] values.
///
/// Nodes are created through [`CGraph::variable`], [`CGraph::constant`],
/// [`CGraph::block`] and the methods of [`Function`]. The graph uses interior
/// mutability so that handles can be `Copy` and share `&CGraph`; it is
/// confined to one thread.
#[derive(Debug, Default)]
pub struct CGraph {
    pub(crate) nodes: RefCell<Vec<Node>>,
    independents: RefCell<Vec<NodeId>>,
    dependents: RefCell<Vec<NodeId>>,
}

impl CGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded nodes.
    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.borrow().is_empty()
    }

    /// Append a node. Every argument must already be in the graph.
    pub(crate) fn push(&self, op: Op, args: Vec<NodeId>, value: Mtc) -> Result<NodeId, AdError> {
        let len = self.len();
        if let Some(bad) = args.iter().find(|a| a.0 >= len) {
            return Err(AdError::GraphState(format!(
                "node {len} ({op}) refers to argument {bad}, which is not recorded before it"
            )));
        }
        Ok(self.append(op, args, value))
    }

    /// Append a node that has no arguments.
    pub(crate) fn push_leaf(&self, op: Op, value: Mtc) -> NodeId {
        debug_assert!(op.is_leaf());
        self.append(op, Vec::new(), value)
    }

    /// Append a node whose single argument is an existing node.
    pub(crate) fn push_unary(&self, op: Op, arg: NodeId, value: Mtc) -> NodeId {
        debug_assert!(arg.0 < self.len());
        self.append(op, vec![arg], value)
    }

    fn append(&self, op: Op, args: Vec<NodeId>, value: Mtc) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        let id = NodeId(nodes.len());
        nodes.push(Node {
            value,
            args,
            op,
            xbar: None,
        });
        id
    }

    fn check_id(&self, id: NodeId) -> Result<(), AdError> {
        let len = self.len();
        if id.0 >= len {
            return Err(AdError::GraphState(format!(
                "node {id} does not exist in a graph with {len} nodes"
            )));
        }
        Ok(())
    }

    /// Forward value of a node.
    pub fn node_value(&self, id: NodeId) -> Result<Mtc, AdError> {
        self.check_id(id)?;
        Ok(self.nodes.borrow()[id.0].value.clone())
    }

    /// Adjoint of a node, `None` before the first reverse pass.
    pub fn xbar(&self, id: NodeId) -> Option<Mtc> {
        self.nodes.borrow().get(id.0).and_then(|n| n.xbar.clone())
    }

    pub fn op(&self, id: NodeId) -> Result<Op, AdError> {
        self.check_id(id)?;
        Ok(self.nodes.borrow()[id.0].op.clone())
    }

    pub fn args(&self, id: NodeId) -> Result<Vec<NodeId>, AdError> {
        self.check_id(id)?;
        Ok(self.nodes.borrow()[id.0].args.clone())
    }

    fn collect_ids(&self, functions: &[Function<'_>]) -> Result<Vec<NodeId>, AdError> {
        functions
            .iter()
            .map(|f| {
                if !f.belongs_to(self) {
                    return Err(AdError::GraphState(format!(
                        "node {} belongs to a different graph",
                        f.id()
                    )));
                }
                Ok(f.id())
            })
            .collect()
    }

    /// Set the inputs with respect to which adjoints are read.
    ///
    /// # Errors
    ///
    /// Returns `AdError::GraphState` if a node belongs to another graph.
    pub fn set_independents(&self, functions: &[Function<'_>]) -> Result<(), AdError> {
        let ids = self.collect_ids(functions)?;
        *self.independents.borrow_mut() = ids;
        Ok(())
    }

    /// Set the outputs that receive the seed adjoints, in seed order.
    ///
    /// # Errors
    ///
    /// Returns `AdError::GraphState` if a node belongs to another graph.
    pub fn set_dependents(&self, functions: &[Function<'_>]) -> Result<(), AdError> {
        let ids = self.collect_ids(functions)?;
        *self.dependents.borrow_mut() = ids;
        Ok(())
    }

    pub fn independents(&self) -> Vec<NodeId> {
        self.independents.borrow().clone()
    }

    pub fn dependents(&self) -> Vec<NodeId> {
        self.dependents.borrow().clone()
    }
}

impl fmt::Display for CGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes = self.nodes.borrow();
        writeln!(f, "CGraph with {} nodes", nodes.len())?;
        for (i, node) in nodes.iter().enumerate() {
            let args: Vec<String> = node.args.iter().map(|a| a.to_string()).collect();
            let (rows, cols) = node.value.shape();
            writeln!(
                f,
                "  {i}: {} [{}] {rows}x{cols}",
                node.op,
                args.join(", ")
            )?;
        }
        let ids = |v: &[NodeId]| v.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
        writeln!(f, "independents: [{}]", ids(&self.independents.borrow()[..]))?;
        write!(f, "dependents: [{}]", ids(&self.dependents.borrow()[..]))
    }
}
