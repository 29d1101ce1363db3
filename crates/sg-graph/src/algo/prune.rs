use petgraph::stable_graph::NodeIndex;
use sg_core::Result;
use tracing::debug;

use crate::attr::{Attributes, attributes_match, parse_attributes};
use crate::build::{BuiltGraph, GraphBuildConfig, create_graph_from_nodes_and_edges};
use crate::graph::Graph;

/// Below this node count the pruning loop stops on its own.
const MIN_NODES_TO_CONTINUE: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct PruneConfig {
    /// Nodes of this type are kept.
    pub node_type: Option<String>,
    /// JSON object; nodes whose attributes match every entry are kept.
    pub attributes_json: Option<String>,
    /// Only nodes with exactly this valence are candidates.
    pub valence: usize,
    /// Restrict candidates to nodes whose type was never set.
    pub prune_type_unset_only: bool,
    /// Run a single removal pass.
    pub prune_once: bool,
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            node_type: None,
            attributes_json: None,
            valence: 1,
            prune_type_unset_only: false,
            prune_once: false,
        }
    }
}

impl PruneConfig {
    pub fn once() -> Self {
        Self {
            prune_once: true,
            ..Self::default()
        }
    }
}

fn is_prunable(graph: &Graph, n: NodeIndex, cfg: &PruneConfig, attrs: Option<&Attributes>) -> bool {
    let Some(node) = graph.node(n) else {
        return false;
    };
    if cfg.prune_type_unset_only && !node.is_type_unset() {
        return false;
    }
    if graph.valence(n) != cfg.valence {
        return false;
    }

    let type_mismatch = cfg.node_type.as_deref().map(|t| node.type_label() != t);
    let attr_mismatch = attrs.map(|a| !attributes_match(&node.attributes, a));
    match (type_mismatch, attr_mismatch) {
        (None, None) => true,
        (Some(t), Some(a)) => t || a,
        (Some(t), None) => t,
        (None, Some(a)) => a,
    }
}

/// Repeatedly removes nodes of the configured valence that do not match the
/// type/attribute filters, together with their incident edges.
///
/// Each pass can expose new dangling nodes, so passes repeat until nothing is
/// removed. Unless `prune_once` is set the loop also stops once fewer than
/// four nodes remain or no valence-1 node is left. The result is rebuilt
/// without edge division.
#[tracing::instrument(skip_all, fields(valence = cfg.valence, once = cfg.prune_once))]
pub fn prune_graph_by_type(graph: &Graph, cfg: &PruneConfig) -> Result<BuiltGraph> {
    let attrs = cfg
        .attributes_json
        .as_deref()
        .map(parse_attributes)
        .transpose()?;

    let mut work = graph.deep_copy();
    let mut pass = 0_usize;
    loop {
        let doomed: Vec<NodeIndex> = work
            .node_indices()
            .filter(|&n| is_prunable(&work, n, cfg, attrs.as_ref()))
            .collect();
        if doomed.is_empty() {
            break;
        }

        pass += 1;
        debug!(pass, removed = doomed.len(), "prune pass");
        for n in doomed {
            work.remove_node(n);
        }

        if cfg.prune_once {
            break;
        }
        if work.node_count() < MIN_NODES_TO_CONTINUE
            || !work.node_indices().any(|n| work.valence(n) == 1)
        {
            break;
        }
    }

    let mut built = create_graph_from_nodes_and_edges(
        &[],
        &work.loose_edges(),
        &GraphBuildConfig::without_division(),
    )?;
    built.graph.graph_type = graph.graph_type.clone();
    built.graph.attributes = graph.attributes.clone();
    Ok(built)
}

#[cfg(test)]
mod tests {
    use sg_core::Point3;

    use super::{PruneConfig, prune_graph_by_type};
    use crate::graph::{Graph, LooseEdge};

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    /// Unit square with a two-segment spur leaving the (1,1) corner.
    fn square_with_spur() -> Graph {
        let mut g = Graph::new();
        for (a, b) in [
            (p(0.0, 0.0), p(1.0, 0.0)),
            (p(1.0, 0.0), p(1.0, 1.0)),
            (p(1.0, 1.0), p(0.0, 1.0)),
            (p(0.0, 1.0), p(0.0, 0.0)),
            (p(1.0, 1.0), p(2.0, 2.0)),
        ] {
            g.add_loose_edge(&LooseEdge::line(a, b));
        }
        let mut tip = LooseEdge::line(p(2.0, 2.0), p(3.0, 3.0));
        tip.target = tip
            .target
            .clone()
            .with_type("exit")
            .with_attribute("keep", true);
        g.add_loose_edge(&tip);
        g
    }

    #[test]
    fn dangling_chain_is_pruned_to_the_cycle() {
        let g = square_with_spur();
        let built = prune_graph_by_type(&g, &PruneConfig::default()).expect("valid config");

        assert_eq!(built.graph.node_count(), 4);
        assert_eq!(built.graph.edge_count(), 4);
        assert!(built.graph.node_indices().all(|n| built.graph.valence(n) == 2));
        // Input is untouched.
        assert_eq!(g.node_count(), 6);
    }

    #[test]
    fn prune_once_removes_only_current_leaves() {
        let g = square_with_spur();
        let built = prune_graph_by_type(&g, &PruneConfig::once()).expect("valid config");
        assert_eq!(built.graph.node_count(), 5);
        assert_eq!(built.graph.edge_count(), 5);
        assert!(built.graph.node_at(p(2.0, 2.0)).is_some());
    }

    #[test]
    fn matching_type_or_attributes_protects_a_leaf() {
        let g = square_with_spur();

        let by_type = PruneConfig {
            node_type: Some("exit".into()),
            ..PruneConfig::default()
        };
        let built = prune_graph_by_type(&g, &by_type).expect("valid config");
        assert_eq!(built.graph.node_count(), 6);

        let by_attr = PruneConfig {
            attributes_json: Some(r#"{"keep": true}"#.into()),
            ..PruneConfig::default()
        };
        let built = prune_graph_by_type(&g, &by_attr).expect("valid config");
        assert_eq!(built.graph.node_count(), 6);

        // Either mismatch is enough when both filters are given.
        let both = PruneConfig {
            node_type: Some("exit".into()),
            attributes_json: Some(r#"{"keep": false}"#.into()),
            ..PruneConfig::default()
        };
        let built = prune_graph_by_type(&g, &both).expect("valid config");
        assert_eq!(built.graph.node_count(), 4);
    }

    #[test]
    fn unset_only_skips_typed_nodes() {
        let g = square_with_spur();
        let cfg = PruneConfig {
            prune_type_unset_only: true,
            ..PruneConfig::default()
        };
        let built = prune_graph_by_type(&g, &cfg).expect("valid config");
        assert_eq!(built.graph.node_count(), 6);
    }

    #[test]
    fn pruning_never_grows_and_leaves_no_candidates() {
        let g = square_with_spur();
        let built = prune_graph_by_type(&g, &PruneConfig::default()).expect("valid config");
        assert!(built.graph.node_count() <= g.node_count());
        assert!(built.graph.edge_count() <= g.edge_count());
        assert!(!built.graph.node_indices().any(|n| built.graph.valence(n) == 1));
    }

    #[test]
    fn malformed_attribute_json_is_rejected() {
        let cfg = PruneConfig {
            attributes_json: Some("{not json".into()),
            ..PruneConfig::default()
        };
        assert!(prune_graph_by_type(&square_with_spur(), &cfg).is_err());
    }
}
