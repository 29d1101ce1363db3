use petgraph::algo::astar;
use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::graph::Graph;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShortestPath {
    pub nodes: Vec<NodeIndex>,
    pub edges: Vec<EdgeIndex>,
    pub length: f64,
}

impl ShortestPath {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Shortest path weighted by edge curve length.
///
/// An unreachable `end` (or a missing endpoint) gives an empty path of
/// length zero.
pub fn find_shortest_path(graph: &Graph, start: NodeIndex, end: NodeIndex) -> ShortestPath {
    if graph.node(start).is_none() || graph.node(end).is_none() {
        return ShortestPath::default();
    }

    let Some((length, nodes)) = astar(
        graph.inner(),
        start,
        |n| n == end,
        |e| e.weight().length(),
        |_| 0.0,
    ) else {
        return ShortestPath::default();
    };

    let edges = nodes
        .windows(2)
        .filter_map(|w| graph.find_edge(w[0], w[1]))
        .collect();

    ShortestPath {
        nodes,
        edges,
        length,
    }
}

#[cfg(test)]
mod tests {
    use sg_core::{Point3, Polyline3};

    use super::find_shortest_path;
    use crate::graph::{Edge, Graph, LooseEdge};

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    /// Unit square A-B-C-D plus an A-C polyline of length 1.5.
    fn square_with_diagonal() -> Graph {
        let (a, b, c, d) = (p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0));
        let mut g = Graph::new();
        for (from, to) in [(a, b), (b, c), (c, d), (d, a)] {
            g.add_loose_edge(&LooseEdge::line(from, to));
        }

        // Bend the diagonal off the chord so each half is 0.75 long.
        let offset = 0.25 / 2_f64.sqrt();
        let bend = p(0.5 + offset, 0.5 - offset);
        let diagonal = Edge::new(Polyline3::new(vec![a, bend, c]));
        g.add_loose_edge(&LooseEdge::new(diagonal));
        g
    }

    #[test]
    fn direct_diagonal_beats_two_sides() {
        let g = square_with_diagonal();
        let a = g.node_at(p(0.0, 0.0)).expect("A");
        let c = g.node_at(p(1.0, 1.0)).expect("C");

        let path = find_shortest_path(&g, a, c);
        assert!((path.length - 1.5).abs() < 1e-9);
        assert_eq!(path.nodes, vec![a, c]);
        assert_eq!(path.edges.len(), 1);
    }

    #[test]
    fn multi_hop_path_lists_edges_in_order() {
        let g = square_with_diagonal();
        let b = g.node_at(p(1.0, 0.0)).expect("B");
        let d = g.node_at(p(0.0, 1.0)).expect("D");

        let path = find_shortest_path(&g, b, d);
        assert!((path.length - 2.0).abs() < 1e-9);
        assert_eq!(path.nodes.len(), 3);
        assert_eq!(path.edges.len(), 2);
    }

    #[test]
    fn unreachable_end_gives_empty_path() {
        let mut g = Graph::new();
        g.add_loose_edge(&LooseEdge::line(p(0.0, 0.0), p(1.0, 0.0)));
        g.add_loose_edge(&LooseEdge::line(p(5.0, 0.0), p(6.0, 0.0)));
        let a = g.node_at(p(0.0, 0.0)).expect("node");
        let z = g.node_at(p(6.0, 0.0)).expect("node");

        let path = find_shortest_path(&g, a, z);
        assert!(path.is_empty());
        assert!(path.edges.is_empty());
        assert_eq!(path.length, 0.0);
    }
}
