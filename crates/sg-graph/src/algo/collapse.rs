use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use sg_core::{Error, Polyline3, Result};
use tracing::{debug, warn};

use crate::attr::merge_missing;
use crate::graph::{Edge, Graph};

/// Hard cap on collapse steps.
pub const MAX_COLLAPSE_ITERATIONS: usize = 50;

/// A short edge `u-v` with its flanking edges `a-u` and `v-b`.
struct Collapse {
    short: EdgeIndex,
    flank_u: EdgeIndex,
    flank_v: EdgeIndex,
    a: NodeIndex,
    u: NodeIndex,
    v: NodeIndex,
    b: NodeIndex,
}

fn other_edge(graph: &Graph, n: NodeIndex, not: EdgeIndex) -> Option<EdgeIndex> {
    graph.incident_edges(n).into_iter().find(|&e| e != not)
}

fn plan(graph: &Graph, short: EdgeIndex) -> Option<Collapse> {
    let (u, v) = graph.edge_endpoints(short)?;
    if graph.valence(u) != 2 || graph.valence(v) != 2 {
        return None;
    }
    let flank_u = other_edge(graph, u, short)?;
    let flank_v = other_edge(graph, v, short)?;
    let a = graph.opposite(flank_u, u)?;
    let b = graph.opposite(flank_v, v)?;
    // A triangle or an existing a-b edge would leave no room for the merged edge.
    if a == b || graph.find_edge(a, b).is_some() {
        return None;
    }
    Some(Collapse {
        short,
        flank_u,
        flank_v,
        a,
        u,
        v,
        b,
    })
}

fn merged_edge(graph: &Graph, c: &Collapse) -> Option<Edge> {
    let points = [c.a, c.u, c.v, c.b]
        .iter()
        .map(|&n| graph.node(n).map(|x| x.position()))
        .collect::<Option<Vec<_>>>()?;
    let flank_u = graph.edge(c.flank_u)?;
    let short = graph.edge(c.short)?;
    let flank_v = graph.edge(c.flank_v)?;

    let mut edge = flank_u.with_curve(Polyline3::new(points));
    if edge.edge_type.is_none() {
        edge.edge_type = short.edge_type.clone().or_else(|| flank_v.edge_type.clone());
    }
    merge_missing(&mut edge.attributes, &short.attributes);
    merge_missing(&mut edge.attributes, &flank_v.attributes);
    Some(edge)
}

/// Collapses edges shorter than `min_length` whose endpoints both have
/// valence 2, shortest first.
///
/// The short edge and its two flanking edges become one polyline edge through
/// the four original points, so the run keeps its shape. Stops after
/// [`MAX_COLLAPSE_ITERATIONS`] steps.
#[tracing::instrument(skip(graph))]
pub fn collapse_short_edges(graph: &Graph, min_length: f64) -> Result<Graph> {
    if min_length.is_nan() || min_length <= 0.0 {
        return Err(Error::invalid("min_length", "must be positive"));
    }

    let mut work = graph.deep_copy();
    let mut collapsed = 0_usize;
    for iteration in 0..MAX_COLLAPSE_ITERATIONS {
        let mut short: Vec<(EdgeIndex, f64)> = work
            .edges()
            .map(|(e, edge)| (e, edge.length()))
            .filter(|&(_, len)| len < min_length)
            .collect();
        short.sort_by(|x, y| x.1.total_cmp(&y.1));

        let Some(step) = short.into_iter().find_map(|(e, _)| plan(&work, e)) else {
            break;
        };
        let Some(edge) = merged_edge(&work, &step) else {
            break;
        };

        work.remove_node(step.u);
        work.remove_node(step.v);
        work.add_edge(step.a, step.b, edge);
        collapsed += 1;
        debug!(iteration, "collapsed short edge");

        if iteration + 1 == MAX_COLLAPSE_ITERATIONS {
            warn!(cap = MAX_COLLAPSE_ITERATIONS, "collapse stopped at iteration cap");
        }
    }

    debug!(collapsed, "short edge collapse done");
    work.set_node_ids();
    Ok(work)
}
