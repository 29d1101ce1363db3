use criterion::{Criterion, black_box, criterion_group, criterion_main};
use sg_core::Point3;
use sg_graph::{
    GraphBuildConfig, LooseEdge, algo::find_shortest_path, algo::split_graph_at_points,
    create_graph_from_nodes_and_edges,
};

/// `n` horizontal and `n` vertical lines crossing on a unit grid.
fn street_grid(n: usize) -> Vec<LooseEdge> {
    let span = n as f64;
    let mut out = Vec::with_capacity(2 * n);
    for i in 0..n {
        let t = i as f64 + 0.5;
        out.push(LooseEdge::line(
            Point3::new(0.0, t, 0.0),
            Point3::new(span, t, 0.0),
        ));
        out.push(LooseEdge::line(
            Point3::new(t, 0.0, 0.0),
            Point3::new(t, span, 0.0),
        ));
    }
    out
}

fn bench_build_graph(c: &mut Criterion) {
    let edges = street_grid(24);
    let cfg = GraphBuildConfig::default();

    c.bench_function("sg_graph_build_grid_24x24", |b| {
        b.iter(|| {
            let built = create_graph_from_nodes_and_edges(&[], black_box(&edges), black_box(&cfg));
            black_box(built.map(|g| (g.graph.node_count(), g.graph.edge_count())).ok());
        });
    });

    let Ok(built) = create_graph_from_nodes_and_edges(&[], &edges, &cfg) else {
        return;
    };
    let graph = built.graph;
    let (Some(start), Some(end)) = (
        graph.node_at(Point3::new(0.0, 0.5, 0.0)),
        graph.node_at(Point3::new(24.0, 23.5, 0.0)),
    ) else {
        return;
    };

    c.bench_function("sg_graph_shortest_path_grid_24x24", |b| {
        b.iter(|| {
            let path = find_shortest_path(black_box(&graph), start, end);
            black_box(path.length);
        });
    });

    c.bench_function("sg_graph_split_grid_at_centre", |b| {
        b.iter(|| {
            let parts = split_graph_at_points(black_box(&graph), &[Point3::new(12.5, 12.5, 0.0)], 0.01);
            black_box(parts.len());
        });
    });
}

criterion_group!(benches, bench_build_graph);
criterion_main!(benches);
