//! Geometry-embedded planar graphs.
//!
//! Nodes carry 3D positions and edges carry polyline curves. Identity is
//! spatial: two nodes are the same when their positions agree after rounding
//! to two decimals, and two edges are the same when their endpoint positions
//! agree in either direction.
//!
//! - [`create_graph_from_nodes_and_edges`] builds a graph from a soup of
//!   loose edges, splitting curves at their crossings.
//! - [`combine_graphs`] merges graphs by spatial coincidence.
//! - [`algo`] holds connectivity, shortest path, pruning, simplification,
//!   splitting and connection operations. Transformations return new graphs.
//! - [`export`] and [`push`] turn graphs into JSON documents and store
//!   records; [`Session`] drives a store connection.

pub mod algo;
mod attr;
mod build;
pub mod export;
mod graph;
mod merge;
pub mod push;
mod session;

pub use attr::{
    AttrValue, Attributes, attributes_match, merge_missing, merge_overwrite, merge_types,
    parse_attributes,
};
pub use build::{
    BuiltGraph, BuiltGraphs, GraphBuildConfig, create_graph_from_nodes_and_edges,
    create_graphs_from_nodes_and_edges,
};
pub use graph::{Edge, Graph, LooseEdge, Node, UNSET_TYPE};
pub use merge::combine_graphs;
pub use petgraph::stable_graph::{EdgeIndex, NodeIndex};
pub use session::{Credentials, GraphSink, LogEntry, MemorySink, MemorySinkError, Session};
