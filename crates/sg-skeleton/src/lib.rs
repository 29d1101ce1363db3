//! Voronoi skeletons of closed planar boundaries.
//!
//! Pipeline per outer boundary:
//! - classify curves into outer rings and holes by containment depth;
//! - sample every ring at a target spacing in the boundary's plane;
//! - triangulate the samples (`geo` with the spade backend) and take the
//!   finite Voronoi edges, clipped to an inflated bounding box;
//! - keep the edges strictly inside the region and assemble them into a
//!   [`sg_graph::Graph`], which must come out connected.

mod boundary;
mod sample;
mod skeleton;
pub mod voronoi;

pub use boundary::{BoundaryGroup, classify_boundaries};
pub use sample::sample_boundary;
pub use skeleton::{SKELETON_GRAPH_TYPE, SkeletonConfig, extract_voronoi_skeleton};
