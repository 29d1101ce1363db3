use std::collections::HashSet;

use geo::{Contains, Coord, Intersects, Line, LineString, Point, Polygon};
use sg_core::{DEFAULT_TOLERANCE, Error, Plane, Point3, PointKey, Polyline3, Result};
use sg_graph::algo::{PruneConfig, is_graph_fully_connected, prune_graph_by_type};
use sg_graph::{Graph, GraphBuildConfig, LooseEdge, create_graph_from_nodes_and_edges};
use tracing::{debug, warn};

use crate::boundary::{BoundaryGroup, classify_boundaries, local_ring};
use crate::sample::sample_boundary;
use crate::voronoi::{Segment, bounding_rect, inflate, voronoi_edges};

/// Graph type given to extracted skeletons.
pub const SKELETON_GRAPH_TYPE: &str = "skeleton";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkeletonConfig {
    /// Target spacing of boundary samples.
    pub division_length: f64,
    /// Voronoi clipping outline margin, as a fraction of the larger side of
    /// the sample bounding box.
    pub outline_inflation: f64,
    /// Closed/planar test tolerance.
    pub tolerance: f64,
}

impl Default for SkeletonConfig {
    fn default() -> Self {
        Self {
            division_length: 1.0,
            outline_inflation: 0.1,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl SkeletonConfig {
    pub fn with_division_length(division_length: f64) -> Self {
        Self {
            division_length,
            ..Self::default()
        }
    }
}

/// Medial skeleton graphs of closed boundary curves, one per outer boundary.
///
/// Boundary samples feed a Voronoi diagram; the edges lying strictly inside
/// the region (outside every hole, crossing no ring) form the skeleton. Each
/// skeleton must be a single connected component and gets one pruning pass
/// over its dangling nodes, unless that pass would leave no edge.
#[tracing::instrument(skip_all, fields(curves = curves.len(), division = cfg.division_length))]
pub fn extract_voronoi_skeleton(curves: &[Polyline3], cfg: &SkeletonConfig) -> Result<Vec<Graph>> {
    if cfg.division_length.is_nan() || cfg.division_length <= 0.0 {
        return Err(Error::invalid("division_length", "must be positive"));
    }
    if cfg.outline_inflation.is_nan() || cfg.outline_inflation < 0.0 {
        return Err(Error::invalid("outline_inflation", "must be zero or positive"));
    }

    classify_boundaries(curves, cfg.tolerance)?
        .iter()
        .enumerate()
        .map(|(i, group)| group_skeleton(i, group, cfg))
        .collect()
}

fn group_skeleton(index: usize, group: &BoundaryGroup, cfg: &SkeletonConfig) -> Result<Graph> {
    let plane = Plane::fit(&group.outer.points)
        .ok_or_else(|| Error::Degenerate(format!("boundary {index} encloses no area")))?;

    let outer = local_ring(&plane, &group.outer);
    let holes: Vec<LineString<f64>> = group.holes.iter().map(|h| local_ring(&plane, h)).collect();
    let region = Polygon::new(outer.clone(), holes.clone());

    let samples = local_samples(&plane, group, cfg.division_length)?;
    let bbox = bounding_rect(&samples)
        .ok_or_else(|| Error::Degenerate(format!("boundary {index} has no samples")))?;
    let margin = bbox.width().max(bbox.height()) * cfg.outline_inflation;
    let outline = inflate(bbox, margin);

    let segments = voronoi_edges(&samples, &outline)?;
    let inside: Vec<Segment> = segments
        .iter()
        .copied()
        .filter(|&(a, b)| {
            let seg = Line::new(a, b);
            let crosses = std::iter::once(&outer)
                .chain(holes.iter())
                .any(|ring| ring.lines().any(|l| l.intersects(&seg)));
            let mid = Point::new((a.x + b.x) * 0.5, (a.y + b.y) * 0.5);
            !crosses && region.contains(&mid)
        })
        .collect();
    debug!(
        group = index,
        samples = samples.len(),
        voronoi = segments.len(),
        kept = inside.len(),
        "voronoi segments filtered"
    );

    let edges: Vec<LooseEdge> = inside
        .iter()
        .map(|&(a, b)| LooseEdge::line(plane.from_local(a.x, a.y), plane.from_local(b.x, b.y)))
        .collect();
    let built = create_graph_from_nodes_and_edges(&[], &edges, &GraphBuildConfig::without_division())?;
    if !built.isolated_edges.is_empty() {
        warn!(group = index, dropped = built.isolated_edges.len(), "degenerate skeleton segments");
    }
    if !is_graph_fully_connected(&built.graph) {
        return Err(Error::Degenerate(format!(
            "skeleton of boundary {index} is not connected; try a smaller division length"
        )));
    }

    // A star-shaped skeleton loses every edge in one pass; keep it whole.
    let pruned = prune_graph_by_type(&built.graph, &PruneConfig::once())?.graph;
    let mut skeleton = if pruned.edge_count() == 0 {
        debug!(group = index, edges = built.graph.edge_count(), "pruning skipped");
        built.graph
    } else {
        pruned
    };
    skeleton.graph_type = Some(SKELETON_GRAPH_TYPE.to_owned());
    skeleton.refresh_summary();
    Ok(skeleton)
}

/// Samples of the outer ring and every hole in plane coordinates, without
/// coincident points.
fn local_samples(plane: &Plane, group: &BoundaryGroup, division_length: f64) -> Result<Vec<Coord<f64>>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for ring in std::iter::once(&group.outer).chain(group.holes.iter()) {
        for p in sample_boundary(ring, division_length)? {
            let p: Point3 = plane.project(p);
            if seen.insert(PointKey::new(p)) {
                let (x, y) = plane.to_local(p);
                out.push(Coord { x, y });
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use geo::{Contains, Coord, LineString, Point, Polygon};
    use sg_core::{Point3, Polyline3};
    use sg_graph::algo::is_graph_fully_connected;

    use super::{SKELETON_GRAPH_TYPE, SkeletonConfig, extract_voronoi_skeleton};

    fn quad(z: f64) -> Polyline3 {
        let corners = [(0.0, 0.0), (10.0, 0.0), (12.0, 7.0), (1.0, 9.0), (0.0, 0.0)];
        Polyline3::new(corners.iter().map(|&(x, y)| Point3::new(x, y, z)).collect())
    }

    #[test]
    fn convex_boundary_gives_connected_skeleton() {
        let graphs = extract_voronoi_skeleton(&[quad(0.0)], &SkeletonConfig::with_division_length(1.3))
            .expect("valid boundary");
        assert_eq!(graphs.len(), 1);

        let g = &graphs[0];
        assert!(g.edge_count() >= 1);
        assert!(is_graph_fully_connected(g));
        assert_eq!(g.graph_type.as_deref(), Some(SKELETON_GRAPH_TYPE));

        let ring: LineString<f64> = [(0.0, 0.0), (10.0, 0.0), (12.0, 7.0), (1.0, 9.0)]
            .iter()
            .map(|&(x, y)| Coord { x, y })
            .collect::<Vec<_>>()
            .into();
        let region = Polygon::new(ring, Vec::new());
        for (_, n) in g.nodes() {
            let p = n.position();
            assert!(region.contains(&Point::new(p.x, p.y)), "node {p:?} outside boundary");
        }
    }

    fn rect(x0: f64, y0: f64, w: f64, h: f64) -> Polyline3 {
        let corners = [(x0, y0), (x0 + w, y0), (x0 + w, y0 + h), (x0, y0 + h), (x0, y0)];
        Polyline3::new(corners.iter().map(|&(x, y)| Point3::new(x, y, 0.0)).collect())
    }

    #[test]
    fn coarse_sampling_keeps_at_least_one_edge() {
        for d in [0.8, 1.3, 2.0, 3.0] {
            let graphs = extract_voronoi_skeleton(&[quad(0.0)], &SkeletonConfig::with_division_length(d))
                .expect("valid boundary");
            assert!(graphs[0].edge_count() >= 1, "division {d} gave an empty skeleton");
        }
        for outline in [rect(0.0, 0.0, 10.0, 10.0), rect(0.0, 0.0, 7.3, 3.1)] {
            let graphs = extract_voronoi_skeleton(&[outline], &SkeletonConfig::with_division_length(3.0))
                .expect("valid boundary");
            assert!(graphs[0].edge_count() >= 1);
            assert!(is_graph_fully_connected(&graphs[0]));
        }
    }

    #[test]
    fn skeleton_goes_around_a_hole() {
        let outer = rect(0.0, 0.0, 20.0, 20.0);
        let hole = rect(8.0, 8.0, 4.0, 4.0);
        let graphs = extract_voronoi_skeleton(&[outer, hole], &SkeletonConfig::with_division_length(1.0))
            .expect("valid boundaries");
        assert_eq!(graphs.len(), 1);

        let g = &graphs[0];
        assert!(g.edge_count() >= 4);
        assert!(is_graph_fully_connected(g));

        let square = |x0: f64, y0: f64, s: f64| {
            let ring: LineString<f64> = [(x0, y0), (x0 + s, y0), (x0 + s, y0 + s), (x0, y0 + s)]
                .iter()
                .map(|&(x, y)| Coord { x, y })
                .collect::<Vec<_>>()
                .into();
            Polygon::new(ring, Vec::new())
        };
        let (outer, hole) = (square(0.0, 0.0, 20.0), square(8.0, 8.0, 4.0));
        for (_, n) in g.nodes() {
            let at = Point::new(n.position().x, n.position().y);
            assert!(outer.contains(&at), "node {at:?} outside boundary");
            assert!(!hole.contains(&at), "node {at:?} inside hole");
        }
    }

    #[test]
    fn skeleton_lies_on_the_boundary_plane() {
        let graphs = extract_voronoi_skeleton(&[quad(5.0)], &SkeletonConfig::with_division_length(1.3))
            .expect("valid boundary");
        for (_, n) in graphs[0].nodes() {
            assert!((n.position().z - 5.0).abs() < 1e-6);
        }
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        assert!(extract_voronoi_skeleton(&[quad(0.0)], &SkeletonConfig::with_division_length(0.0)).is_err());

        let open = Polyline3::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(10.0, 10.0, 0.0),
        ]);
        assert!(extract_voronoi_skeleton(&[open], &SkeletonConfig::default()).is_err());
    }
}
