use std::collections::HashMap;

use sg_core::{EdgeKey, Error, PointKey, Result};
use tracing::debug;

use crate::build::{BuiltGraph, GraphBuildConfig, create_graph_from_nodes_and_edges};
use crate::graph::{Graph, LooseEdge, Node};

/// Coincident-node registry keyed by rounded position.
#[derive(Default)]
struct NodeTable {
    nodes: Vec<Node>,
    slot: HashMap<PointKey, usize>,
}

impl NodeTable {
    /// Folds `node` into the node already at its key, or records it.
    fn merge(&mut self, node: &Node) {
        match self.slot.get(&node.key()) {
            Some(&i) => self.nodes[i].absorb(node),
            None => self.insert(node),
        }
    }

    /// Records `node` only when its key is free.
    fn insert_if_free(&mut self, node: &Node) {
        if !self.slot.contains_key(&node.key()) {
            self.insert(node);
        }
    }

    fn insert(&mut self, node: &Node) {
        self.slot.insert(node.key(), self.nodes.len());
        self.nodes.push(node.clone());
    }

    fn resolve(&self, fallback: &Node) -> Node {
        self.slot
            .get(&fallback.key())
            .map_or_else(|| fallback.clone(), |&i| self.nodes[i].clone())
    }
}

/// Merges graphs by spatial coincidence.
///
/// Nodes at the same rounded position unify: the first keeps its identity,
/// later ones overwrite attributes key by key and concatenate differing types
/// as `a-b`. Edges between the same position pair unify the same way.
/// `additional_nodes` and `additional_edges` only fill unoccupied keys. The
/// result is rebuilt without edge division.
#[tracing::instrument(skip_all, fields(graphs = graphs.len()))]
pub fn combine_graphs(
    graphs: &[Graph],
    additional_nodes: &[Node],
    additional_edges: &[LooseEdge],
) -> Result<BuiltGraph> {
    let Some(first) = graphs.first() else {
        return Err(Error::invalid("graphs", "must not be empty"));
    };

    let mut table = NodeTable::default();
    for g in graphs {
        for (_, n) in g.nodes() {
            table.merge(n);
        }
    }
    for n in additional_nodes {
        table.insert_if_free(n);
    }

    let mut edges: Vec<LooseEdge> = Vec::new();
    let mut edge_slot: HashMap<EdgeKey, usize> = HashMap::new();
    for g in graphs {
        for loose in g.loose_edges() {
            match edge_slot.get(&loose.key()) {
                Some(&i) => edges[i].edge.absorb(&loose.edge),
                None => {
                    edge_slot.insert(loose.key(), edges.len());
                    edges.push(loose);
                }
            }
        }
    }
    for loose in additional_edges {
        if !edge_slot.contains_key(&loose.key()) {
            edge_slot.insert(loose.key(), edges.len());
            edges.push(loose.clone());
        }
    }

    // Endpoints must carry the merged node data, not the per-graph copies.
    for loose in &mut edges {
        loose.source = table.resolve(&loose.source);
        loose.target = table.resolve(&loose.target);
    }

    debug!(nodes = table.nodes.len(), edges = edges.len(), "combining graphs");
    let mut built =
        create_graph_from_nodes_and_edges(&table.nodes, &edges, &GraphBuildConfig::without_division())?;
    built.graph.graph_type = first.graph_type.clone();
    Ok(built)
}

#[cfg(test)]
mod tests {
    use sg_core::Point3;

    use super::combine_graphs;
    use crate::algo::split_graph_into_subgraphs;
    use crate::attr::AttrValue;
    use crate::graph::{Edge, Graph, LooseEdge, Node};

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    fn path(points: &[Point3]) -> Graph {
        let mut g = Graph::new();
        for w in points.windows(2) {
            g.add_loose_edge(&LooseEdge::line(w[0], w[1]));
        }
        g
    }

    #[test]
    fn combining_one_graph_is_identity() {
        let mut g = path(&[p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)]);
        g.graph_type = Some("street".into());

        let built = combine_graphs(std::slice::from_ref(&g), &[], &[]).expect("one graph");
        let c = &built.graph;
        assert_eq!(c.node_count(), g.node_count());
        assert_eq!(c.edge_count(), g.edge_count());
        assert_eq!(c.graph_type.as_deref(), Some("street"));
        for (_, n) in g.nodes() {
            let twin = c.node_at(n.position()).and_then(|i| c.node(i)).expect("same position");
            assert_eq!(twin.id(), n.id());
        }
    }

    #[test]
    fn coincident_nodes_merge_attributes_and_types() {
        let mut a = Graph::new();
        a.add_node(Node::new(p(0.0, 0.0)).with_type("road").with_attribute("k", 1_i64));
        a.add_loose_edge(&LooseEdge::line(p(0.0, 0.0), p(1.0, 0.0)));

        let mut b = Graph::new();
        b.add_node(
            Node::new(p(0.004, 0.0))
                .with_type("path")
                .with_attribute("k", 2_i64)
                .with_attribute("extra", true),
        );
        b.add_loose_edge(&LooseEdge::new(
            Edge::line(p(0.0, 0.0), p(0.0, 1.0)).with_type("trail"),
        ));

        let first_id = a.node_at(p(0.0, 0.0)).and_then(|i| a.node(i)).map(Node::id);
        let built = combine_graphs(&[a, b], &[], &[]).expect("two graphs");
        let g = &built.graph;

        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 2);
        let origin = g.node_at(p(0.0, 0.0)).and_then(|i| g.node(i)).expect("merged");
        assert_eq!(Some(origin.id()), first_id);
        assert_eq!(origin.type_label(), "road-path");
        assert_eq!(origin.attributes["k"], AttrValue::Int(2));
        assert_eq!(origin.attributes["extra"], AttrValue::Bool(true));
    }

    #[test]
    fn duplicate_edges_merge_across_graphs() {
        let mut a = Graph::new();
        a.add_loose_edge(&LooseEdge::new(
            Edge::line(p(0.0, 0.0), p(1.0, 0.0)).with_attribute("lanes", 1_i64),
        ));
        let mut b = Graph::new();
        b.add_loose_edge(&LooseEdge::new(
            Edge::line(p(1.0, 0.0), p(0.0, 0.0)).with_attribute("speed", 30_i64),
        ));

        let built = combine_graphs(&[a, b], &[], &[]).expect("two graphs");
        assert_eq!(built.graph.edge_count(), 1);
        let (_, e) = built.graph.edges().next().expect("edge");
        assert_eq!(e.attributes.len(), 2);
    }

    #[test]
    fn additional_elements_only_fill_free_keys() {
        let g = path(&[p(0.0, 0.0), p(1.0, 0.0)]);
        let extra_nodes = [Node::new(p(0.0, 0.0)).with_type("ignored")];
        let extra_edges = [
            LooseEdge::new(Edge::line(p(0.0, 0.0), p(1.0, 0.0)).with_type("ignored")),
            LooseEdge::line(p(1.0, 0.0), p(2.0, 0.0)),
        ];

        let built = combine_graphs(&[g], &extra_nodes, &extra_edges).expect("one graph");
        let out = &built.graph;
        assert_eq!(out.edge_count(), 2);
        assert!(out.nodes().all(|(_, n)| n.is_type_unset()));
        assert!(out.edges().all(|(_, e)| e.type_label() == "unset"));
    }

    #[test]
    fn split_then_combine_preserves_totals() {
        let mut g = path(&[p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)]);
        g.add_loose_edge(&LooseEdge::line(p(5.0, 5.0), p(6.0, 5.0)));

        let parts = split_graph_into_subgraphs(&g);
        assert_eq!(parts.len(), 2);
        let built = combine_graphs(&parts, &[], &[]).expect("non-empty");
        assert_eq!(built.graph.node_count(), g.node_count());
        assert_eq!(built.graph.edge_count(), g.edge_count());
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(combine_graphs(&[], &[], &[]).is_err());
    }
}
