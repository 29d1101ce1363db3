use petgraph::stable_graph::NodeIndex;
use sg_core::{CurvePoint, DEFAULT_TOLERANCE, Error, PointIndex, Result};
use tracing::{debug, warn};

use crate::attr::Attributes;
use crate::build::{BuiltGraph, GraphBuildConfig, create_graph_from_nodes_and_edges};
use crate::graph::{Edge, Graph, LooseEdge, Node};

/// Attaches each of `nodes` to the closest point on any edge of `graph`.
///
/// A node is created at every projection point, taking type and attributes
/// from the nearest node that has at least one edge, and bridged to the input
/// node with a straight edge. The whole graph is then rebuilt with edge
/// division so the projections split the edges they land on. Inputs already
/// lying on an edge are inserted without a bridge; with no edge to reach they
/// come back in [`BuiltGraph::isolated_nodes`].
#[tracing::instrument(skip_all, fields(nodes = nodes.len()))]
pub fn connect_nodes_to_graph(graph: &Graph, nodes: &[Node]) -> Result<BuiltGraph> {
    if nodes.is_empty() {
        return Err(Error::invalid("nodes", "must not be empty"));
    }

    let mut edges = graph.loose_edges();
    let anchors = PointIndex::build(
        graph
            .nodes()
            .filter(|&(i, _)| graph.valence(i) > 0)
            .map(|(i, n)| (n.position(), i)),
    );

    let mut standalone = Vec::new();
    let mut bridges = Vec::new();
    for node in nodes {
        let Some(hit) = closest_on_edges(graph, node) else {
            warn!(node = %node.id(), "graph has no edges to connect to");
            standalone.push(node.duplicate());
            continue;
        };
        if hit.distance <= DEFAULT_TOLERANCE {
            standalone.push(node.duplicate());
            continue;
        }

        let mut anchor = Node::new(hit.point);
        if let Some(template) = anchors.nearest(hit.point).and_then(|(_, i)| graph.node(i)) {
            anchor.node_type = template.node_type.clone();
            anchor.attributes = template.attributes.clone();
        }
        bridges.push(LooseEdge {
            source: anchor,
            target: node.duplicate(),
            edge: Edge::line(hit.point, node.position()),
        });
    }

    debug!(bridges = bridges.len(), on_edge = standalone.len(), "connecting nodes");
    edges.extend(bridges);
    let mut built = create_graph_from_nodes_and_edges(&standalone, &edges, &GraphBuildConfig::default())?;
    built.graph.graph_type = graph.graph_type.clone();
    Ok(built)
}

fn closest_on_edges(graph: &Graph, node: &Node) -> Option<CurvePoint> {
    graph
        .edges()
        .filter(|(_, e)| e.curve().is_valid())
        .map(|(_, e)| e.curve().closest_point(node.position()))
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

/// Joins two graphs with one straight edge per `(nodes1[i], nodes2[i])` pair.
///
/// Both graphs are copied; the result is built without edge division.
pub fn connect_graphs(
    g1: &Graph,
    g2: &Graph,
    nodes1: &[NodeIndex],
    nodes2: &[NodeIndex],
    edge_attributes: Option<&Attributes>,
) -> Result<BuiltGraph> {
    if nodes1.len() != nodes2.len() {
        return Err(Error::invalid(
            "nodes2",
            format!("expected {} nodes, got {}", nodes1.len(), nodes2.len()),
        ));
    }

    let mut nodes = g1.node_list();
    nodes.extend(g2.node_list());
    let mut edges = g1.loose_edges();
    edges.extend(g2.loose_edges());

    for (&i, &j) in nodes1.iter().zip(nodes2) {
        let source = g1
            .node(i)
            .ok_or_else(|| Error::invalid("nodes1", format!("no node at index {}", i.index())))?;
        let target = g2
            .node(j)
            .ok_or_else(|| Error::invalid("nodes2", format!("no node at index {}", j.index())))?;

        let mut edge = Edge::line(source.position(), target.position());
        if let Some(a) = edge_attributes {
            edge.attributes = a.clone();
        }
        edges.push(LooseEdge {
            source: source.clone(),
            target: target.clone(),
            edge,
        });
    }

    create_graph_from_nodes_and_edges(&nodes, &edges, &GraphBuildConfig::without_division())
}
