use sg_core::{
    DEFAULT_TOLERANCE, Error, Point3, Result, curve_intersections, point_parameters, points_equal,
};
use tracing::{debug, warn};

use crate::algo::{is_graph_fully_connected, split_graph_into_subgraphs};
use crate::graph::{Graph, LooseEdge, Node};

#[derive(Debug, Clone, PartialEq)]
pub struct GraphBuildConfig {
    /// Split every edge at its intersections with other edges and at
    /// standalone node positions lying on it.
    pub divide_edge: bool,
    pub tolerance: f64,
}

impl Default for GraphBuildConfig {
    fn default() -> Self {
        Self {
            divide_edge: true,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl GraphBuildConfig {
    pub fn without_division() -> Self {
        Self {
            divide_edge: false,
            ..Self::default()
        }
    }
}

/// A constructed graph plus the inputs that could not be placed in it.
#[derive(Debug, Clone, Default)]
pub struct BuiltGraph {
    pub graph: Graph,
    /// Nodes left without any incident edge.
    pub isolated_nodes: Vec<Node>,
    /// Edges rejected as degenerate (zero length or self-loop after rounding).
    pub isolated_edges: Vec<LooseEdge>,
}

/// Like [`BuiltGraph`], one graph per connected component.
#[derive(Debug, Clone, Default)]
pub struct BuiltGraphs {
    pub graphs: Vec<Graph>,
    pub isolated_nodes: Vec<Node>,
    pub isolated_edges: Vec<LooseEdge>,
}

/// Builds a graph from standalone nodes and loose edges.
///
/// Node identity is the rounded position: standalone nodes are placed first
/// and edge endpoints at an occupied position fold into the node already
/// there. Duplicate edges fold into the first edge between the same pair.
/// Display ids are renumbered on the result.
#[tracing::instrument(skip_all, fields(nodes = nodes.len(), edges = edges.len(), divide = cfg.divide_edge))]
pub fn create_graph_from_nodes_and_edges(
    nodes: &[Node],
    edges: &[LooseEdge],
    cfg: &GraphBuildConfig,
) -> Result<BuiltGraph> {
    if cfg.tolerance.is_nan() || cfg.tolerance <= 0.0 {
        return Err(Error::invalid("tolerance", "must be positive"));
    }

    let mut graph = Graph::new();
    for n in nodes {
        graph.upsert_node(n.clone());
    }

    let pieces = if cfg.divide_edge {
        shatter_edges(nodes, edges, cfg.tolerance)
    } else {
        edges.to_vec()
    };

    let mut isolated_edges = Vec::new();
    for loose in pieces {
        insert_edge(&mut graph, loose, &mut isolated_edges);
    }

    let isolated_nodes = remove_isolated_nodes(&mut graph);
    if !isolated_nodes.is_empty() || !isolated_edges.is_empty() {
        warn!(
            isolated_nodes = isolated_nodes.len(),
            isolated_edges = isolated_edges.len(),
            "construction left isolated elements"
        );
    }

    graph.set_node_ids();
    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "graph constructed"
    );

    Ok(BuiltGraph {
        graph,
        isolated_nodes,
        isolated_edges,
    })
}

/// Builds one graph and splits it per connected component when needed.
pub fn create_graphs_from_nodes_and_edges(
    nodes: &[Node],
    edges: &[LooseEdge],
    cfg: &GraphBuildConfig,
) -> Result<BuiltGraphs> {
    let built = create_graph_from_nodes_and_edges(nodes, edges, cfg)?;
    let graphs = if built.graph.is_empty() || is_graph_fully_connected(&built.graph) {
        vec![built.graph]
    } else {
        split_graph_into_subgraphs(&built.graph)
    };

    Ok(BuiltGraphs {
        graphs,
        isolated_nodes: built.isolated_nodes,
        isolated_edges: built.isolated_edges,
    })
}

/// Splits every edge at interior intersections with the other edges and at
/// standalone node positions.
///
/// A sub-segment endpoint inherits the original endpoint node only when it
/// coincides with it; interior split points get bare nodes.
pub(crate) fn shatter_edges(nodes: &[Node], edges: &[LooseEdge], tolerance: f64) -> Vec<LooseEdge> {
    let mut out = Vec::with_capacity(edges.len());
    let mut split_count = 0_usize;

    for (i, loose) in edges.iter().enumerate() {
        let curve = loose.edge.curve();
        if !curve.is_valid() {
            out.push(loose.clone());
            continue;
        }

        let mut params = Vec::new();
        for (j, other) in edges.iter().enumerate() {
            if i != j && other.edge.curve().is_valid() {
                params.extend(curve_intersections(curve, other.edge.curve(), tolerance));
            }
        }
        for n in nodes {
            params.extend(point_parameters(curve, n.position(), tolerance));
        }

        let parts = curve.split_at(&params);
        if parts.len() == 1 {
            out.push(loose.clone());
            continue;
        }

        split_count += 1;
        for part in parts {
            let source = endpoint_for(part.start(), loose, tolerance);
            let target = endpoint_for(part.end(), loose, tolerance);
            out.push(LooseEdge {
                source,
                target,
                edge: loose.edge.with_curve(part),
            });
        }
    }

    debug!(input = edges.len(), split = split_count, output = out.len(), "edges shattered");
    out
}

fn endpoint_for(p: Point3, original: &LooseEdge, tolerance: f64) -> Node {
    if points_equal(p, original.source.position(), tolerance) {
        original.source.clone()
    } else if points_equal(p, original.target.position(), tolerance) {
        original.target.clone()
    } else {
        Node::new(p)
    }
}

fn insert_edge(graph: &mut Graph, loose: LooseEdge, isolated: &mut Vec<LooseEdge>) {
    if !loose.edge.curve().is_valid() || loose.key().is_degenerate() {
        isolated.push(loose);
        return;
    }

    let a = graph.upsert_node(loose.source.clone());
    let b = graph.upsert_node(loose.target.clone());
    match graph.find_edge(a, b) {
        Some(existing) => {
            if let Some(e) = graph.edge_mut(existing) {
                e.absorb(&loose.edge);
            }
        }
        None => {
            if graph.add_edge(a, b, loose.edge.clone()).is_none() {
                isolated.push(loose);
            }
        }
    }
}

pub(crate) fn remove_isolated_nodes(graph: &mut Graph) -> Vec<Node> {
    let lonely: Vec<_> = graph
        .node_indices()
        .filter(|&n| graph.valence(n) == 0)
        .collect();
    lonely
        .into_iter()
        .filter_map(|n| graph.remove_node(n))
        .collect()
}
