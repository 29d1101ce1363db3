use std::collections::HashMap;

use petgraph::stable_graph::NodeIndex;
use petgraph::unionfind::UnionFind;

use crate::graph::Graph;

/// Weakly connected components, each listed in node iteration order.
///
/// Components are ordered by their first node.
pub fn connected_components(graph: &Graph) -> Vec<Vec<NodeIndex>> {
    let bound = graph
        .node_indices()
        .map(|n| n.index() + 1)
        .max()
        .unwrap_or(0);
    let mut uf = UnionFind::<usize>::new(bound);
    for e in graph.edge_indices() {
        if let Some((a, b)) = graph.edge_endpoints(e) {
            uf.union(a.index(), b.index());
        }
    }

    let mut slot_of_root: HashMap<usize, usize> = HashMap::new();
    let mut out: Vec<Vec<NodeIndex>> = Vec::new();
    for n in graph.node_indices() {
        let root = uf.find(n.index());
        let slot = *slot_of_root.entry(root).or_insert_with(|| {
            out.push(Vec::new());
            out.len() - 1
        });
        out[slot].push(n);
    }
    out
}

/// True when the graph forms exactly one connected component.
pub fn is_graph_fully_connected(graph: &Graph) -> bool {
    connected_components(graph).len() == 1
}

/// One standalone graph per connected component.
///
/// Nodes and edges are copied into the new graphs and edges are re-homed to
/// the copied endpoints.
pub fn split_graph_into_subgraphs(graph: &Graph) -> Vec<Graph> {
    let components = connected_components(graph);
    let mut slot_of: HashMap<NodeIndex, usize> = HashMap::new();
    let mut remap: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut out: Vec<Graph> = Vec::with_capacity(components.len());

    for (slot, members) in components.iter().enumerate() {
        let mut sub = Graph::new();
        sub.graph_type = graph.graph_type.clone();
        for &n in members {
            if let Some(node) = graph.node(n) {
                remap.insert(n, sub.add_node(node.clone()));
                slot_of.insert(n, slot);
            }
        }
        out.push(sub);
    }

    for e in graph.edge_indices() {
        let (Some((a, b)), Some(edge)) = (graph.edge_endpoints(e), graph.edge(e)) else {
            continue;
        };
        let (Some(&slot), Some(&na), Some(&nb)) = (slot_of.get(&a), remap.get(&a), remap.get(&b))
        else {
            continue;
        };
        out[slot].add_edge(na, nb, edge.clone());
    }

    for sub in &mut out {
        sub.set_node_ids();
    }
    out
}
