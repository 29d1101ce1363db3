//! Position-based identity.
//!
//! Two nodes are the same node when their coordinates agree after rounding to
//! [`DEFAULT_DECIMALS`] places. This is a bucketing heuristic rather than an
//! epsilon ball: points straddling a rounding boundary stay distinct even when
//! they are closer than [`DEFAULT_TOLERANCE`]. Every dedup map in the engine is
//! keyed by [`PointKey`] or [`EdgeKey`] so the policy is applied uniformly.

use crate::geom::Point3;

pub const DEFAULT_TOLERANCE: f64 = 0.01;
pub const DEFAULT_DECIMALS: u32 = 2;

pub fn points_equal(a: Point3, b: Point3, tolerance: f64) -> bool {
    (a.x - b.x).abs() <= tolerance && (a.y - b.y).abs() <= tolerance && (a.z - b.z).abs() <= tolerance
}

pub fn round_point(p: Point3, decimals: u32) -> Point3 {
    let scale = 10_f64.powi(decimals as i32);
    Point3 {
        x: (p.x * scale).round() / scale,
        y: (p.y * scale).round() / scale,
        z: (p.z * scale).round() / scale,
    }
}

/// Direction-independent comparison of two segments' endpoints.
pub fn edge_endpoints_equal(a0: Point3, a1: Point3, b0: Point3, b1: Point3, tolerance: f64) -> bool {
    (points_equal(a0, b0, tolerance) && points_equal(a1, b1, tolerance))
        || (points_equal(a0, b1, tolerance) && points_equal(a1, b0, tolerance))
}

/// Rounded position usable as a hash key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointKey {
    x: i64,
    y: i64,
    z: i64,
}

impl PointKey {
    pub fn new(p: Point3) -> Self {
        Self::with_decimals(p, DEFAULT_DECIMALS)
    }

    pub fn with_decimals(p: Point3, decimals: u32) -> Self {
        let scale = 10_f64.powi(decimals as i32);
        Self {
            x: (p.x * scale).round() as i64,
            y: (p.y * scale).round() as i64,
            z: (p.z * scale).round() as i64,
        }
    }
}

impl From<Point3> for PointKey {
    fn from(p: Point3) -> Self {
        Self::new(p)
    }
}

/// Unordered pair of rounded endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeKey {
    lo: PointKey,
    hi: PointKey,
}

impl EdgeKey {
    pub fn new(a: Point3, b: Point3) -> Self {
        Self::from_keys(PointKey::new(a), PointKey::new(b))
    }

    pub fn from_keys(a: PointKey, b: PointKey) -> Self {
        if a <= b {
            Self { lo: a, hi: b }
        } else {
            Self { lo: b, hi: a }
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.lo == self.hi
    }
}
