//! Graphviz export of a recorded graph.
//!
//! The graph is converted to a petgraph `DiGraph` (one vertex per node, one
//! edge per argument, pointing from argument to result) and printed in DOT
//! format. The chosen [`Layout`] is written as the `layout` graph attribute;
//! no Graphviz process is started.
//!
//! # Example
//!
//! ```
//! use mtcad::{CGraph, Mtc};
//! use mtcad::render::{Layout, to_dot};
//!
//! let cg = CGraph::new();
//! let x = cg.variable(Mtc::scalar(2.0, 1.0));
//! let _y = x.mul(x).unwrap();
//! let dot = to_dot(&cg, Layout::Circo);
//! assert!(dot.contains("layout = circo"));
//! assert!(dot.contains("0: var"));
//! assert!(dot.contains("1: mul"));
//! ```

use std::fmt;
use std::path::Path;

use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::AdError;
use crate::graph::CGraph;

/// Graphviz layout engine named in the output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Layout {
    #[default]
    Dot,
    Circo,
    Neato,
    Fdp,
    Twopi,
}

impl Layout {
    pub fn engine(self) -> &'static str {
        match self {
            Layout::Dot => "dot",
            Layout::Circo => "circo",
            Layout::Neato => "neato",
            Layout::Fdp => "fdp",
            Layout::Twopi => "twopi",
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.engine())
    }
}

/// Build the petgraph view of `graph`. Edge weights are argument positions.
fn to_digraph(graph: &CGraph) -> DiGraph<String, usize> {
    let nodes = graph.nodes.borrow();
    let mut g = DiGraph::with_capacity(nodes.len(), nodes.len() * 2);
    for (i, node) in nodes.iter().enumerate() {
        let (rows, cols) = node.value.shape();
        g.add_node(format!("{i}: {} ({rows}x{cols})", node.op));
    }
    for (i, node) in nodes.iter().enumerate() {
        for (k, arg) in node.args.iter().enumerate() {
            g.add_edge(NodeIndex::new(arg.index()), NodeIndex::new(i), k);
        }
    }
    g
}

/// DOT source for `graph`.
///
/// Independents are drawn as boxes and dependents as double octagons.
pub fn to_dot(graph: &CGraph, layout: Layout) -> String {
    let g = to_digraph(graph);
    let independents = graph.independents();
    let dependents = graph.dependents();
    let node_attrs = |_, (index, _): (NodeIndex, &String)| {
        let i = index.index();
        if independents.iter().any(|id| id.index() == i) {
            "shape = box".to_string()
        } else if dependents.iter().any(|id| id.index() == i) {
            "shape = doubleoctagon".to_string()
        } else {
            String::new()
        }
    };
    let body = Dot::with_attr_getters(
        &g,
        &[Config::GraphContentOnly],
        &|_, _| String::new(),
        &node_attrs,
    );
    format!("digraph {{\n    layout = {layout}\n{body}}}\n")
}

/// Write the DOT source for `graph` to `path`.
///
/// # Errors
///
/// Returns `AdError::Io` if the file cannot be written.
pub fn render(graph: &CGraph, path: impl AsRef<Path>, layout: Layout) -> Result<(), AdError> {
    std::fs::write(path, to_dot(graph, layout))?;
    Ok(())
}
