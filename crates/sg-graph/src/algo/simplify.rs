use petgraph::stable_graph::NodeIndex;
use sg_core::Polyline3;
use tracing::debug;

use crate::attr::merge_missing;
use crate::graph::Graph;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimplifyConfig {
    /// Inclusive angle window in degrees; 180 is a straight run.
    pub min_angle: f64,
    pub max_angle: f64,
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self {
            min_angle: 160.0,
            max_angle: 180.0,
        }
    }
}

fn next_candidate(graph: &Graph, cfg: &SimplifyConfig) -> Option<NodeIndex> {
    graph.node_indices().find(|&n| {
        graph.valence(n) == 2
            && graph
                .node_angle(n)
                .is_some_and(|a| a >= cfg.min_angle && a <= cfg.max_angle)
    })
}

/// Removes valence-2 nodes on nearly straight runs, replacing their two
/// edges with a straight chord between the neighbours.
///
/// The chord takes the first edge's type (else the second's) and the first
/// edge's attributes, with keys only the second edge has filled in. The
/// input graph is left untouched.
pub fn simplify_graph_by_angle(graph: &Graph, cfg: &SimplifyConfig) -> Graph {
    let mut work = graph.deep_copy();
    let mut removed = 0_usize;

    while let Some(n) = next_candidate(&work, cfg) {
        let mut incident = work.incident_edges(n);
        incident.sort_unstable();
        let &[e1, e2] = incident.as_slice() else {
            break;
        };
        let (Some(a), Some(b)) = (work.opposite(e1, n), work.opposite(e2, n)) else {
            break;
        };
        let (Some(first), Some(second)) = (work.edge(e1).cloned(), work.edge(e2).cloned()) else {
            break;
        };
        let (Some(pa), Some(pb)) = (
            work.node(a).map(|x| x.position()),
            work.node(b).map(|x| x.position()),
        ) else {
            break;
        };

        work.remove_node(n);
        removed += 1;
        if work.find_edge(a, b).is_some() {
            continue;
        }

        let mut chord = first.with_curve(Polyline3::line(pa, pb));
        if chord.edge_type.is_none() {
            chord.edge_type = second.edge_type.clone();
        }
        merge_missing(&mut chord.attributes, &second.attributes);
        work.add_edge(a, b, chord);
    }

    debug!(removed, "angle simplification done");
    work.set_node_ids();
    work
}

#[cfg(test)]
mod tests {
    use sg_core::Point3;

    use super::{SimplifyConfig, simplify_graph_by_angle};
    use crate::attr::AttrValue;
    use crate::graph::{Edge, Graph, LooseEdge};

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    /// A-B-C straight along x, then a right-angle turn up to D.
    fn bent_run() -> Graph {
        let mut g = Graph::new();
        let first = Edge::line(p(0.0, 0.0), p(1.0, 0.0))
            .with_attribute("name", "first")
            .with_attribute("lanes", 1_i64);
        let second = Edge::line(p(1.0, 0.0), p(2.0, 0.0))
            .with_type("road")
            .with_attribute("lanes", 2_i64)
            .with_attribute("speed", 30_i64);
        g.add_loose_edge(&LooseEdge::new(first));
        g.add_loose_edge(&LooseEdge::new(second));
        g.add_loose_edge(&LooseEdge::line(p(2.0, 0.0), p(2.0, 1.0)));
        g
    }

    #[test]
    fn straight_node_is_replaced_by_chord() {
        let g = bent_run();
        let s = simplify_graph_by_angle(&g, &SimplifyConfig::default());

        assert_eq!(s.node_count(), 3);
        assert_eq!(s.edge_count(), 2);
        assert!(s.node_at(p(1.0, 0.0)).is_none());
        // Corner at 90 degrees stays.
        assert!(s.node_at(p(2.0, 0.0)).is_some());

        let a = s.node_at(p(0.0, 0.0)).expect("A");
        let c = s.node_at(p(2.0, 0.0)).expect("C");
        let chord = s.find_edge(a, c).and_then(|e| s.edge(e)).expect("chord");
        assert_eq!(chord.type_label(), "road");
        assert_eq!(chord.attributes["lanes"], AttrValue::Int(1));
        assert_eq!(chord.attributes["name"], AttrValue::Str("first".into()));
        assert_eq!(chord.attributes["speed"], AttrValue::Int(30));
        assert_eq!(chord.curve().points.len(), 2);

        assert_eq!(g.node_count(), 4);
    }

    #[test]
    fn wide_window_reaches_fixed_point() {
        let g = bent_run();
        let cfg = SimplifyConfig {
            min_angle: 80.0,
            max_angle: 180.0,
        };
        let s = simplify_graph_by_angle(&g, &cfg);
        assert_eq!(s.node_count(), 2);
        assert_eq!(s.edge_count(), 1);
        assert!(s.node_at(p(0.0, 0.0)).is_some());
        assert!(s.node_at(p(2.0, 1.0)).is_some());
    }

    #[test]
    fn chord_is_skipped_when_neighbours_already_connected() {
        // Triangle with one flattened corner: the chord would duplicate A-C.
        let mut g = Graph::new();
        g.add_loose_edge(&LooseEdge::line(p(0.0, 0.0), p(1.0, 0.01)));
        g.add_loose_edge(&LooseEdge::line(p(1.0, 0.01), p(2.0, 0.0)));
        g.add_loose_edge(&LooseEdge::line(p(0.0, 0.0), p(2.0, 0.0)));

        let cfg = SimplifyConfig {
            min_angle: 170.0,
            max_angle: 180.0,
        };
        let s = simplify_graph_by_angle(&g, &cfg);
        assert_eq!(s.node_count(), 2);
        assert_eq!(s.edge_count(), 1);
    }
}
