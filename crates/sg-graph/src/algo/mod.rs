//! Queries and structural transformations over [`crate::Graph`].
//!
//! Transformations take `&Graph` and return new graphs; only the
//! `find_edit_*` helpers edit in place.

mod collapse;
mod connect;
mod connectivity;
mod filter;
mod path;
mod prune;
mod query;
mod simplify;
mod split;

pub use collapse::{MAX_COLLAPSE_ITERATIONS, collapse_short_edges};
pub use connect::{connect_graphs, connect_nodes_to_graph};
pub use connectivity::{connected_components, is_graph_fully_connected, split_graph_into_subgraphs};
pub use filter::{ElementFilter, FilteredElements, filter_nodes_and_edges};
pub use path::{ShortestPath, find_shortest_path};
pub use prune::{PruneConfig, prune_graph_by_type};
pub use query::{find_connected_edges, find_edit_edge, find_edit_node, find_neighbor_nodes};
pub use simplify::{SimplifyConfig, simplify_graph_by_angle};
pub use split::split_graph_at_points;
