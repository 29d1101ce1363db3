use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use sg_core::{Error, Line3, Point3, PointIndex, Result, edge_endpoints_equal};

use crate::attr::{Attributes, merge_overwrite};
use crate::graph::{Graph, Node};

/// Resolves `node` inside `graph`, failing when the graph does not own it.
fn owned_index(graph: &Graph, node: &Node) -> Result<NodeIndex> {
    if node.graph_id() != Some(graph.id()) {
        return Err(Error::Precondition(format!(
            "node {} is not owned by graph {}",
            node.id(),
            graph.id()
        )));
    }
    graph
        .node_at(node.position())
        .filter(|&i| graph.node(i).is_some_and(|n| n.id() == node.id()))
        .or_else(|| graph.find_node_by_id(node.id()))
        .ok_or_else(|| Error::Precondition(format!("node {} was removed from its graph", node.id())))
}

/// Neighbours of `node`.
///
/// With `max_distance == 0` these are the edge-adjacent nodes. Otherwise every
/// other node within `max_distance` (Euclidean, inclusive), connected or not.
pub fn find_neighbor_nodes(graph: &Graph, node: &Node, max_distance: f64) -> Result<Vec<NodeIndex>> {
    if max_distance.is_nan() || max_distance < 0.0 {
        return Err(Error::invalid("max_distance", "must be zero or positive"));
    }
    let idx = owned_index(graph, node)?;

    let mut out = if max_distance == 0.0 {
        graph.neighbors(idx)
    } else {
        let index = PointIndex::build(graph.nodes().map(|(i, n)| (n.position(), i)));
        index
            .within_distance(node.position(), max_distance)
            .into_iter()
            .map(|(_, i)| i)
            .filter(|&i| i != idx)
            .collect()
    };
    out.sort_unstable();
    out.dedup();
    Ok(out)
}

/// Edges incident to `node`.
pub fn find_connected_edges(graph: &Graph, node: &Node) -> Result<Vec<EdgeIndex>> {
    let idx = owned_index(graph, node)?;
    Ok(graph.incident_edges(idx))
}

/// Nearest node to `point` (no distance cutoff), optionally retyped and
/// given extra attributes in place.
pub fn find_edit_node(
    graph: &mut Graph,
    point: Point3,
    node_type: Option<&str>,
    attributes: Option<&Attributes>,
) -> Option<NodeIndex> {
    let index = PointIndex::build(graph.nodes().map(|(i, n)| (n.position(), i)));
    let (_, idx) = index.nearest(point)?;

    if let Some(node) = graph.node_mut(idx) {
        if let Some(t) = node_type {
            node.node_type = Some(t.to_owned());
        }
        if let Some(a) = attributes {
            merge_overwrite(&mut node.attributes, a);
        }
    }
    Some(idx)
}

/// Edge whose endpoints match `line` in either direction, optionally edited
/// in place. `None` when no edge matches.
pub fn find_edit_edge(
    graph: &mut Graph,
    line: &Line3,
    edge_type: Option<&str>,
    attributes: Option<&Attributes>,
    tolerance: f64,
) -> Option<EdgeIndex> {
    let idx = graph.edge_indices().find(|&e| {
        graph.edge_endpoints(e).is_some_and(|(a, b)| {
            match (graph.node(a), graph.node(b)) {
                (Some(na), Some(nb)) => edge_endpoints_equal(
                    na.position(),
                    nb.position(),
                    line.from,
                    line.to,
                    tolerance,
                ),
                _ => false,
            }
        })
    })?;

    if let Some(edge) = graph.edge_mut(idx) {
        if let Some(t) = edge_type {
            edge.edge_type = Some(t.to_owned());
        }
        if let Some(a) = attributes {
            merge_overwrite(&mut edge.attributes, a);
        }
    }
    Some(idx)
}
