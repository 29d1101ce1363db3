//! Example: skeleton of a plot with a courtyard, then its longest route.
//!
//! Extracts the Voronoi skeleton of an L-shaped outline with a square hole,
//! trims short spurs, and reports the shortest path between the two nodes
//! farthest apart. The exported graph is written as JSON.
//!
//! Run from the workspace root:
//!   cargo run -p spatial-graph --example skeleton -- --help
//!   RUST_LOG=debug cargo run -p spatial-graph --example skeleton

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use spatial_graph::algo::{PruneConfig, find_shortest_path, prune_graph_by_type};
use spatial_graph::export::export_graphs_json;
use spatial_graph::{Point3, Polyline3, SkeletonConfig, extract_voronoi_skeleton};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Extract the skeleton of a sample outline")]
struct Args {
    /// Target spacing of boundary samples
    #[arg(long, default_value_t = 0.5)]
    division_length: f64,

    /// Output JSON path
    #[arg(long, default_value = "skeleton.json")]
    out: String,
}

fn ring(corners: &[(f64, f64)]) -> Polyline3 {
    let mut points: Vec<Point3> = corners.iter().map(|&(x, y)| Point3::new(x, y, 0.0)).collect();
    if let Some(&first) = points.first() {
        points.push(first);
    }
    Polyline3::new(points)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let outline = ring(&[(0.0, 0.0), (30.0, 0.0), (30.0, 12.0), (14.0, 12.0), (14.0, 26.0), (0.0, 26.0)]);
    let courtyard = ring(&[(4.0, 4.0), (9.0, 4.0), (9.0, 9.0), (4.0, 9.0)]);

    let t0 = Instant::now();
    let cfg = SkeletonConfig::with_division_length(args.division_length);
    let graphs = extract_voronoi_skeleton(&[outline, courtyard], &cfg).context("extracting skeleton")?;
    let Some(skeleton) = graphs.first() else {
        anyhow::bail!("no outer boundary found");
    };
    let trimmed = prune_graph_by_type(skeleton, &PruneConfig::default())
        .context("pruning skeleton")?
        .graph;
    println!(
        "skeleton: {} nodes, {} edges ({} after pruning) in {:.1} ms",
        skeleton.node_count(),
        skeleton.edge_count(),
        trimmed.edge_count(),
        t0.elapsed().as_secs_f64() * 1e3
    );

    let ends: Vec<_> = skeleton
        .node_indices()
        .filter(|&n| skeleton.valence(n) == 1)
        .collect();
    let mut best = None;
    for (i, &a) in ends.iter().enumerate() {
        for &b in &ends[i + 1..] {
            let path = find_shortest_path(skeleton, a, b);
            if best.as_ref().is_none_or(|p: &spatial_graph::algo::ShortestPath| path.length > p.length) {
                best = Some(path);
            }
        }
    }
    if let Some(path) = best {
        println!("longest route: {} nodes, length {:.2}", path.nodes.len(), path.length);
    }

    let json = export_graphs_json(&graphs, true).context("serializing skeleton")?;
    std::fs::write(&args.out, json).with_context(|| format!("writing {}", args.out))?;
    println!("wrote {}", args.out);
    Ok(())
}
