//! Umbrella crate for the `spatial-graph` workspace.
//!
//! Re-exports the geometry core, the graph engine and skeleton extraction so
//! downstream code needs a single dependency.

pub use sg_core::*;
pub use sg_graph::*;
pub use sg_skeleton::*;
