use petgraph::stable_graph::{EdgeIndex, NodeIndex};

use crate::attr::{Attributes, attributes_match};
use crate::graph::Graph;

/// Element selection; every supplied criterion must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementFilter {
    pub node_type: Option<String>,
    pub edge_type: Option<String>,
    pub attributes: Option<Attributes>,
    /// For edges, at least one endpoint must have this valence.
    pub valence: Option<usize>,
    pub naked: Option<bool>,
}

impl ElementFilter {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredElements {
    pub nodes: Vec<NodeIndex>,
    pub edges: Vec<EdgeIndex>,
}

fn node_matches(graph: &Graph, n: NodeIndex, f: &ElementFilter) -> bool {
    let Some(node) = graph.node(n) else {
        return false;
    };
    f.node_type.as_deref().is_none_or(|t| node.type_label() == t)
        && f.attributes.as_ref().is_none_or(|a| attributes_match(&node.attributes, a))
        && f.valence.is_none_or(|v| graph.valence(n) == v)
        && f.naked.is_none_or(|k| graph.is_naked(n) == k)
}

fn edge_matches(graph: &Graph, e: EdgeIndex, f: &ElementFilter) -> bool {
    let (Some(edge), Some((a, b))) = (graph.edge(e), graph.edge_endpoints(e)) else {
        return false;
    };
    f.edge_type.as_deref().is_none_or(|t| edge.type_label() == t)
        && f.attributes.as_ref().is_none_or(|at| attributes_match(&edge.attributes, at))
        && f.valence.is_none_or(|v| graph.valence(a) == v || graph.valence(b) == v)
        && f.naked.is_none_or(|k| graph.is_edge_naked(e) == k)
}

/// Nodes and edges satisfying every criterion of `filter`.
pub fn filter_nodes_and_edges(graph: &Graph, filter: &ElementFilter) -> FilteredElements {
    FilteredElements {
        nodes: graph
            .node_indices()
            .filter(|&n| node_matches(graph, n, filter))
            .collect(),
        edges: graph
            .edge_indices()
            .filter(|&e| edge_matches(graph, e, filter))
            .collect(),
    }
}
