use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use sg_core::{DEFAULT_TOLERANCE, Point3, Polyline3};
use sg_graph::algo::{
    ElementFilter, PruneConfig, SimplifyConfig, collapse_short_edges, connected_components,
    filter_nodes_and_edges, find_shortest_path, prune_graph_by_type, simplify_graph_by_angle,
    split_graph_at_points,
};
use sg_graph::export::export_graphs;
use sg_graph::{
    Attributes, BuiltGraph, Credentials, Edge, Graph, GraphBuildConfig, LooseEdge, MemorySink,
    Node, Session, combine_graphs, create_graph_from_nodes_and_edges, parse_attributes,
};
use sg_skeleton::{SkeletonConfig, extract_voronoi_skeleton};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sg_gallery")]
#[command(about = "Run spatial-graph algorithms on JSON fixtures")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(name = "build")]
    Build(BuildArgs),
    #[command(name = "skeleton")]
    Skeleton(SkeletonArgs),
    #[command(name = "path")]
    Path(PathArgs),
    #[command(name = "prune")]
    Prune(PruneArgs),
    #[command(name = "simplify")]
    Simplify(SimplifyArgs),
    #[command(name = "collapse")]
    Collapse(CollapseArgs),
    #[command(name = "split")]
    Split(SplitArgs),
    #[command(name = "filter")]
    Filter(FilterArgs),
    #[command(name = "combine")]
    Combine(CombineArgs),
    #[command(name = "push_mem")]
    PushMem(PushArgs),
}

#[derive(Args, Debug, Clone)]
struct CommonArgs {
    #[arg(long, required = true)]
    input: PathBuf,
    #[arg(long, default_value = "out/gallery")]
    out: PathBuf,
    /// Include node points and edge curves in exported graphs.
    #[arg(long, default_value_t = false)]
    geometry: bool,
}

#[derive(Args, Debug, Clone)]
struct BuildArgs {
    #[command(flatten)]
    common: CommonArgs,
    #[arg(long, default_value_t = false)]
    no_divide: bool,
    #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
    tolerance: f64,
}

#[derive(Args, Debug, Clone)]
struct SkeletonArgs {
    #[command(flatten)]
    common: CommonArgs,
    #[arg(long, default_value_t = 1.0)]
    division_length: f64,
    #[arg(long, default_value_t = 0.1)]
    outline_inflation: f64,
}

#[derive(Args, Debug, Clone)]
struct PathArgs {
    #[command(flatten)]
    common: CommonArgs,
    #[arg(long, value_parser = parse_point)]
    from: Point3,
    #[arg(long, value_parser = parse_point)]
    to: Point3,
}

#[derive(Args, Debug, Clone)]
struct PruneArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Nodes of this type are kept.
    #[arg(long)]
    keep_type: Option<String>,
    /// JSON object; nodes matching every entry are kept.
    #[arg(long)]
    keep_attributes: Option<String>,
    #[arg(long, default_value_t = 1)]
    valence: usize,
    #[arg(long, default_value_t = false)]
    unset_only: bool,
    #[arg(long, default_value_t = false)]
    once: bool,
}

#[derive(Args, Debug, Clone)]
struct SimplifyArgs {
    #[command(flatten)]
    common: CommonArgs,
    #[arg(long, default_value_t = 160.0)]
    min_angle: f64,
    #[arg(long, default_value_t = 180.0)]
    max_angle: f64,
}

#[derive(Args, Debug, Clone)]
struct CollapseArgs {
    #[command(flatten)]
    common: CommonArgs,
    #[arg(long, required = true)]
    min_length: f64,
}

#[derive(Args, Debug, Clone)]
struct SplitArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Cut position `x,y,z`; repeatable.
    #[arg(long = "at", value_parser = parse_point)]
    at: Vec<Point3>,
    #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
    tolerance: f64,
}

#[derive(Args, Debug, Clone)]
struct FilterArgs {
    #[command(flatten)]
    common: CommonArgs,
    #[arg(long)]
    node_type: Option<String>,
    #[arg(long)]
    edge_type: Option<String>,
    #[arg(long)]
    attributes: Option<String>,
    #[arg(long)]
    valence: Option<usize>,
    #[arg(long)]
    naked: Option<bool>,
}

#[derive(Args, Debug, Clone)]
struct CombineArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Further graph fixtures merged into `--input`.
    #[arg(long = "with", required = true)]
    with: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct PushArgs {
    #[command(flatten)]
    common: CommonArgs,
    #[arg(long, default_value = "memory://local")]
    uri: String,
    #[arg(long, default_value = "gallery")]
    user: String,
    #[arg(long, default_value = "")]
    password: String,
}

#[derive(Debug, Clone, Deserialize)]
struct NodeFixture {
    position: Point3,
    #[serde(default, rename = "type")]
    node_type: Option<String>,
    #[serde(default)]
    attributes: Attributes,
}

#[derive(Debug, Clone, Deserialize)]
struct EdgeFixture {
    points: Vec<Point3>,
    #[serde(default, rename = "type")]
    edge_type: Option<String>,
    #[serde(default)]
    attributes: Attributes,
}

#[derive(Debug, Clone, Deserialize)]
struct GraphFixture {
    #[serde(default)]
    graph_type: Option<String>,
    #[serde(default)]
    nodes: Vec<NodeFixture>,
    #[serde(default)]
    edges: Vec<EdgeFixture>,
}

#[derive(Debug, Clone, Deserialize)]
struct BoundaryFixture {
    curves: Vec<Vec<Point3>>,
}

#[derive(Debug, Clone, Serialize)]
struct MetaGraphs {
    operation: &'static str,
    input: String,
    graph_count: usize,
    node_count: usize,
    edge_count: usize,
    isolated_nodes: usize,
    isolated_edges: usize,
}

#[derive(Debug, Clone, Serialize)]
struct PathDto {
    found: bool,
    length: f64,
    node_ids: Vec<String>,
    points: Vec<Point3>,
}

#[derive(Debug, Clone, Serialize)]
struct SelectionDto {
    node_ids: Vec<String>,
    edge_guids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
struct PushDto<'a> {
    accepted: bool,
    nodes: Vec<&'a sg_graph::push::NodeRecord>,
    relationships: Vec<&'a sg_graph::push::RelationshipRecord>,
    log: &'a [sg_graph::LogEntry],
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Build(args) => run_build(args),
        Command::Skeleton(args) => run_skeleton(args),
        Command::Path(args) => run_path(args),
        Command::Prune(args) => run_prune(args),
        Command::Simplify(args) => run_simplify(args),
        Command::Collapse(args) => run_collapse(args),
        Command::Split(args) => run_split(args),
        Command::Filter(args) => run_filter(args),
        Command::Combine(args) => run_combine(args),
        Command::PushMem(args) => run_push_mem(args),
    }
}

fn run_build(args: BuildArgs) -> Result<()> {
    let case_dir = prepare_case(&args.common, "build")?;
    let cfg = GraphBuildConfig {
        divide_edge: !args.no_divide,
        tolerance: args.tolerance,
    };
    let built = build_fixture(&args.common.input, &cfg)?;
    write_graphs(&case_dir, &args.common, "build", &[built.graph.clone()], Some(&built))
}

fn run_skeleton(args: SkeletonArgs) -> Result<()> {
    let case_dir = prepare_case(&args.common, "skeleton")?;
    let fixture: BoundaryFixture = read_json(&args.common.input)
        .with_context(|| format!("reading boundary json at {}", args.common.input.display()))?;
    let curves: Vec<Polyline3> = fixture.curves.into_iter().map(Polyline3::new).collect();

    let cfg = SkeletonConfig {
        division_length: args.division_length,
        outline_inflation: args.outline_inflation,
        ..SkeletonConfig::default()
    };
    let graphs = extract_voronoi_skeleton(&curves, &cfg).context("extracting skeleton")?;
    write_graphs(&case_dir, &args.common, "skeleton", &graphs, None)
}

fn run_path(args: PathArgs) -> Result<()> {
    let case_dir = prepare_case(&args.common, "path")?;
    let graph = build_fixture(&args.common.input, &GraphBuildConfig::default())?.graph;

    let start = node_near(&graph, args.from)?;
    let end = node_near(&graph, args.to)?;
    let path = find_shortest_path(&graph, start, end);

    let nodes: Vec<&Node> = path.nodes.iter().filter_map(|&n| graph.node(n)).collect();
    write_json(
        case_dir.join("path.json"),
        &PathDto {
            found: !path.is_empty(),
            length: path.length,
            node_ids: nodes.iter().map(|n| n.display_id().to_owned()).collect(),
            points: nodes.iter().map(|n| n.position()).collect(),
        },
    )?;
    info!(found = !path.is_empty(), length = path.length, "shortest path");
    write_graphs(&case_dir, &args.common, "path", &[graph], None)
}

fn run_prune(args: PruneArgs) -> Result<()> {
    let case_dir = prepare_case(&args.common, "prune")?;
    let graph = build_fixture(&args.common.input, &GraphBuildConfig::default())?.graph;

    let cfg = PruneConfig {
        node_type: args.keep_type,
        attributes_json: args.keep_attributes,
        valence: args.valence,
        prune_type_unset_only: args.unset_only,
        prune_once: args.once,
    };
    let built = prune_graph_by_type(&graph, &cfg).context("pruning graph")?;
    write_graphs(&case_dir, &args.common, "prune", &[built.graph.clone()], Some(&built))
}

fn run_simplify(args: SimplifyArgs) -> Result<()> {
    let case_dir = prepare_case(&args.common, "simplify")?;
    let graph = build_fixture(&args.common.input, &GraphBuildConfig::default())?.graph;

    let simplified = simplify_graph_by_angle(
        &graph,
        &SimplifyConfig {
            min_angle: args.min_angle,
            max_angle: args.max_angle,
        },
    );
    write_graphs(&case_dir, &args.common, "simplify", &[simplified], None)
}

fn run_collapse(args: CollapseArgs) -> Result<()> {
    let case_dir = prepare_case(&args.common, "collapse")?;
    let graph = build_fixture(&args.common.input, &GraphBuildConfig::default())?.graph;

    let collapsed = collapse_short_edges(&graph, args.min_length).context("collapsing edges")?;
    write_graphs(&case_dir, &args.common, "collapse", &[collapsed], None)
}

fn run_split(args: SplitArgs) -> Result<()> {
    let case_dir = prepare_case(&args.common, "split")?;
    let graph = build_fixture(&args.common.input, &GraphBuildConfig::default())?.graph;

    let parts = split_graph_at_points(&graph, &args.at, args.tolerance);
    info!(
        parts = parts.len(),
        components = connected_components(&graph).len(),
        "graph split"
    );
    write_graphs(&case_dir, &args.common, "split", &parts, None)
}

fn run_filter(args: FilterArgs) -> Result<()> {
    let case_dir = prepare_case(&args.common, "filter")?;
    let graph = build_fixture(&args.common.input, &GraphBuildConfig::default())?.graph;

    let attributes = args
        .attributes
        .as_deref()
        .map(parse_attributes)
        .transpose()
        .context("parsing --attributes")?;
    let filter = ElementFilter {
        node_type: args.node_type,
        edge_type: args.edge_type,
        attributes,
        valence: args.valence,
        naked: args.naked,
    };
    if filter.is_empty() {
        bail!("filter needs at least one criterion.");
    }

    let hit = filter_nodes_and_edges(&graph, &filter);
    write_json(
        case_dir.join("selection.json"),
        &SelectionDto {
            node_ids: hit
                .nodes
                .iter()
                .filter_map(|&n| graph.node(n))
                .map(|n| n.display_id().to_owned())
                .collect(),
            edge_guids: hit
                .edges
                .iter()
                .filter_map(|&e| graph.edge(e))
                .map(|e| e.id().to_string())
                .collect(),
        },
    )
}

fn run_combine(args: CombineArgs) -> Result<()> {
    let case_dir = prepare_case(&args.common, "combine")?;
    let cfg = GraphBuildConfig::default();

    let mut graphs = vec![build_fixture(&args.common.input, &cfg)?.graph];
    for path in &args.with {
        ensure_file_exists(path, "with")?;
        graphs.push(build_fixture(path, &cfg)?.graph);
    }
    let built = combine_graphs(&graphs, &[], &[]).context("combining graphs")?;
    write_graphs(&case_dir, &args.common, "combine", &[built.graph.clone()], Some(&built))
}

fn run_push_mem(args: PushArgs) -> Result<()> {
    let case_dir = prepare_case(&args.common, "push_mem")?;
    let graph = build_fixture(&args.common.input, &GraphBuildConfig::default())?.graph;

    let mut session = Session::new(MemorySink::default());
    let accepted = session.connect(Credentials {
        uri: args.uri,
        user: args.user,
        password: args.password,
    }) && session.push(std::slice::from_ref(&graph));

    let sink = session.sink();
    write_json(
        case_dir.join("records.json"),
        &PushDto {
            accepted,
            nodes: sink.nodes.values().collect(),
            relationships: sink.relationships.values().collect(),
            log: session.log(),
        },
    )?;
    session.close();

    if !accepted {
        bail!("push to memory store was rejected; see records.json log.");
    }
    Ok(())
}

fn prepare_case(common: &CommonArgs, case_name: &str) -> Result<PathBuf> {
    ensure_file_exists(&common.input, "input")?;

    let case_dir = common.out.join(case_name);
    fs::create_dir_all(&case_dir)
        .with_context(|| format!("creating output directory {}", case_dir.display()))?;

    fs::copy(&common.input, case_dir.join("input.json")).with_context(|| {
        format!(
            "copying input {} -> {}",
            common.input.display(),
            case_dir.join("input.json").display()
        )
    })?;

    Ok(case_dir)
}

fn build_fixture(path: &Path, cfg: &GraphBuildConfig) -> Result<BuiltGraph> {
    let fixture: GraphFixture =
        read_json(path).with_context(|| format!("reading graph json at {}", path.display()))?;

    let nodes: Vec<Node> = fixture
        .nodes
        .into_iter()
        .map(|f| {
            let mut n = Node::new(f.position);
            n.node_type = f.node_type;
            n.attributes = f.attributes;
            n
        })
        .collect();

    let mut edges = Vec::with_capacity(fixture.edges.len());
    for (i, f) in fixture.edges.into_iter().enumerate() {
        if f.points.len() < 2 {
            bail!("edge {i} in {} needs at least two points.", path.display());
        }
        let mut e = Edge::new(Polyline3::new(f.points));
        e.edge_type = f.edge_type;
        e.attributes = f.attributes;
        edges.push(LooseEdge::new(e));
    }

    let mut built = create_graph_from_nodes_and_edges(&nodes, &edges, cfg)
        .with_context(|| format!("building graph from {}", path.display()))?;
    built.graph.graph_type = fixture.graph_type;
    Ok(built)
}

fn node_near(graph: &Graph, p: Point3) -> Result<sg_graph::NodeIndex> {
    match graph.node_at(p) {
        Some(n) => Ok(n),
        None => bail!("no node at ({}, {}, {}).", p.x, p.y, p.z),
    }
}

fn write_graphs(
    case_dir: &Path,
    common: &CommonArgs,
    operation: &'static str,
    graphs: &[Graph],
    built: Option<&BuiltGraph>,
) -> Result<()> {
    write_json(case_dir.join("graphs.json"), &export_graphs(graphs, common.geometry))?;
    write_json(
        case_dir.join("meta.json"),
        &MetaGraphs {
            operation,
            input: common.input.display().to_string(),
            graph_count: graphs.len(),
            node_count: graphs.iter().map(Graph::node_count).sum(),
            edge_count: graphs.iter().map(Graph::edge_count).sum(),
            isolated_nodes: built.map_or(0, |b| b.isolated_nodes.len()),
            isolated_edges: built.map_or(0, |b| b.isolated_edges.len()),
        },
    )
}

fn parse_point(s: &str) -> Result<Point3, String> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid coordinate in '{s}': {e}"))?;
    match parts[..] {
        [x, y] => Ok(Point3::new(x, y, 0.0)),
        [x, y, z] => Ok(Point3::new(x, y, z)),
        _ => Err(format!("expected 'x,y' or 'x,y,z', got '{s}'")),
    }
}

fn write_json(path: PathBuf, value: &impl Serialize) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value).context("serializing json")?;
    fs::write(&path, bytes).with_context(|| format!("writing json {}", path.display()))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("parsing json {}", path.display()))
}

fn ensure_file_exists(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        bail!("{} file does not exist: {}", what, path.display());
    }
    if !path.is_file() {
        bail!("{} path is not a file: {}", what, path.display());
    }
    Ok(())
}
