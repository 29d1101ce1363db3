use std::collections::{BTreeSet, HashMap};

use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use sg_core::{Point3, PointIndex};
use tracing::debug;

use super::connectivity::{connected_components, split_graph_into_subgraphs};
use crate::graph::Graph;

/// Cuts `graph` apart at the nodes nearest to `points`.
///
/// A point selects its nearest node when that node lies within `tolerance`.
/// Each resulting subgraph receives its own fresh copy of every cut node it
/// touches, so no node or edge is shared between outputs. An edge running
/// directly between two cut nodes becomes a subgraph of its own. Without any
/// cut node the graph is split per connected component only.
#[tracing::instrument(skip_all, fields(points = points.len()))]
pub fn split_graph_at_points(graph: &Graph, points: &[Point3], tolerance: f64) -> Vec<Graph> {
    let index = PointIndex::build(graph.nodes().map(|(i, n)| (n.position(), i)));
    let cuts: BTreeSet<NodeIndex> = points
        .iter()
        .filter_map(|&p| {
            let (at, i) = index.nearest(p)?;
            (at.distance(p) <= tolerance).then_some(i)
        })
        .collect();
    if cuts.is_empty() {
        return split_graph_into_subgraphs(graph);
    }

    let removed: BTreeSet<EdgeIndex> = cuts.iter().flat_map(|&c| graph.incident_edges(c)).collect();
    let mut remainder = graph.clone();
    for &e in &removed {
        remainder.remove_edge(e);
    }

    let mut out: Vec<Graph> = Vec::new();
    let mut slot_of: HashMap<NodeIndex, usize> = HashMap::new();
    let mut remap: HashMap<(usize, NodeIndex), NodeIndex> = HashMap::new();

    for members in connected_components(&remainder) {
        if members.iter().all(|n| cuts.contains(n)) {
            continue;
        }
        let slot = out.len();
        let mut sub = Graph::new();
        sub.graph_type = graph.graph_type.clone();
        for n in members {
            if let Some(node) = graph.node(n) {
                remap.insert((slot, n), sub.add_node(node.duplicate()));
                slot_of.insert(n, slot);
            }
        }
        out.push(sub);
    }

    for e in remainder.edge_indices() {
        let (Some((a, b)), Some(edge)) = (graph.edge_endpoints(e), graph.edge(e)) else {
            continue;
        };
        let Some(&slot) = slot_of.get(&a) else {
            continue;
        };
        if let (Some(&na), Some(&nb)) = (remap.get(&(slot, a)), remap.get(&(slot, b))) {
            out[slot].add_edge(na, nb, edge.with_curve(edge.curve().clone()));
        }
    }

    for &e in &removed {
        let (Some((a, b)), Some(edge)) = (graph.edge_endpoints(e), graph.edge(e)) else {
            continue;
        };
        let slot = match (slot_of.get(&a), slot_of.get(&b)) {
            (Some(&s), _) | (None, Some(&s)) => s,
            (None, None) => {
                let mut sub = Graph::new();
                sub.graph_type = graph.graph_type.clone();
                out.push(sub);
                out.len() - 1
            }
        };
        let (Some(na), Some(nb)) = (
            endpoint_in(&mut out[slot], &mut remap, slot, graph, a),
            endpoint_in(&mut out[slot], &mut remap, slot, graph, b),
        ) else {
            continue;
        };
        out[slot].add_edge(na, nb, edge.with_curve(edge.curve().clone()));
    }

    for sub in &mut out {
        sub.set_node_ids();
    }
    debug!(cuts = cuts.len(), parts = out.len(), "graph split at points");
    out
}

/// Index of `n`'s copy inside subgraph `slot`, duplicating it on first use.
fn endpoint_in(
    sub: &mut Graph,
    remap: &mut HashMap<(usize, NodeIndex), NodeIndex>,
    slot: usize,
    graph: &Graph,
    n: NodeIndex,
) -> Option<NodeIndex> {
    if let Some(&i) = remap.get(&(slot, n)) {
        return Some(i);
    }
    let copy = graph.node(n)?.duplicate();
    let i = sub.add_node(copy);
    remap.insert((slot, n), i);
    Some(i)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use sg_core::Point3;

    use super::split_graph_at_points;
    use crate::algo::is_graph_fully_connected;
    use crate::graph::{Graph, LooseEdge};

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    /// Three two-segment arms meeting at the origin.
    fn star() -> Graph {
        let mut g = Graph::new();
        for (mid, tip) in [
            (p(1.0, 0.0), p(2.0, 0.0)),
            (p(0.0, 1.0), p(0.0, 2.0)),
            (p(-1.0, -1.0), p(-2.0, -2.0)),
        ] {
            g.add_loose_edge(&LooseEdge::line(p(0.0, 0.0), mid));
            g.add_loose_edge(&LooseEdge::line(mid, tip));
        }
        g
    }

    #[test]
    fn hub_split_gives_one_part_per_arm() {
        let g = star();
        let parts = split_graph_at_points(&g, &[p(0.001, 0.0)], 0.01);

        assert_eq!(parts.len(), 3);
        let mut hub_ids = HashSet::new();
        let mut edge_ids = HashSet::new();
        for part in &parts {
            assert_eq!(part.node_count(), 3);
            assert_eq!(part.edge_count(), 2);
            assert!(is_graph_fully_connected(part));
            let hub = part.node_at(p(0.0, 0.0)).and_then(|i| part.node(i)).expect("hub copy");
            hub_ids.insert(hub.id());
            for (_, e) in part.edges() {
                assert!(edge_ids.insert(e.id()), "edge {} shared between parts", e.id());
            }
        }
        assert_eq!(hub_ids.len(), 3);
        assert_eq!(edge_ids.len(), 6);

        let original_hub = g.node_at(p(0.0, 0.0)).and_then(|i| g.node(i)).expect("hub");
        assert!(!hub_ids.contains(&original_hub.id()));
        assert_eq!(g.edge_count(), 6);
    }

    #[test]
    fn edge_between_two_cuts_stands_alone() {
        let mut g = Graph::new();
        g.add_loose_edge(&LooseEdge::line(p(0.0, 0.0), p(1.0, 0.0)));
        g.add_loose_edge(&LooseEdge::line(p(1.0, 0.0), p(2.0, 0.0)));
        g.add_loose_edge(&LooseEdge::line(p(2.0, 0.0), p(3.0, 0.0)));

        let parts = split_graph_at_points(&g, &[p(1.0, 0.0), p(2.0, 0.0)], 0.01);
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|part| part.edge_count() == 1));
        assert!(parts.iter().all(|part| part.node_count() == 2));

        let middle = parts
            .iter()
            .find(|part| part.node_at(p(1.0, 0.0)).is_some() && part.node_at(p(2.0, 0.0)).is_some())
            .expect("middle piece");
        assert_eq!(middle.edge_count(), 1);
    }

    #[test]
    fn far_points_do_not_cut() {
        let g = star();
        let parts = split_graph_at_points(&g, &[p(50.0, 50.0)], 0.01);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].edge_count(), 6);
    }
}
