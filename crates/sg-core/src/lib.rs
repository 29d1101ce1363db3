//! Geometric primitives and spatial identity for the spatial-graph engine.
//!
//! ## Curves
//! Edge geometry is a [`Polyline3`]. Curve parameters run over `[0, n - 1]`
//! where integer values are vertices, so intersection queries can hand their
//! results directly to [`Polyline3::split_at`].
//!
//! ## Spatial Identity
//! Nodes are identified by position rounded to [`DEFAULT_DECIMALS`] places
//! ([`PointKey`]); edges by their unordered endpoint keys ([`EdgeKey`]).
//! Tolerance comparisons ([`points_equal`]) use [`DEFAULT_TOLERANCE`], the
//! model tolerance used wherever a caller does not supply one.
//!
//! ## Planes
//! Boundary processing works in plane-local 2D coordinates obtained from a
//! best-fit [`Plane`].

mod curve;
mod error;
mod geom;
mod identity;
mod index;
mod intersect;
mod plane;

pub use curve::{CurvePoint, Polyline3};
pub use error::{Error, Result};
pub use geom::{Line3, Point3, Vec3};
pub use identity::{
    DEFAULT_DECIMALS, DEFAULT_TOLERANCE, EdgeKey, PointKey, edge_endpoints_equal, points_equal,
    round_point,
};
pub use index::PointIndex;
pub use intersect::{curve_intersections, point_parameters, segment_intersections};
pub use plane::Plane;
