use serde::{Deserialize, Serialize};

use crate::geom::{Line3, Point3};
use crate::identity::points_equal;
use crate::plane::Plane;

/// Parameters closer than this to a vertex are snapped onto it when splitting.
const PARAM_EPS: f64 = 1e-9;

/// Piecewise-linear curve.
///
/// The parameter domain is `[0, n - 1]`: integer `i` is vertex `i`, and the
/// fractional part interpolates along segment `i`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polyline3 {
    pub points: Vec<Point3>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    pub point: Point3,
    pub t: f64,
    pub distance: f64,
}

impl Polyline3 {
    pub fn new(points: Vec<Point3>) -> Self {
        Self { points }
    }

    pub fn line(from: Point3, to: Point3) -> Self {
        Self {
            points: vec![from, to],
        }
    }

    pub fn is_valid(&self) -> bool {
        self.points.len() >= 2
    }

    pub fn start(&self) -> Point3 {
        self.points.first().copied().unwrap_or_default()
    }

    pub fn end(&self) -> Point3 {
        self.points.last().copied().unwrap_or_default()
    }

    pub fn max_param(&self) -> f64 {
        self.points.len().saturating_sub(1) as f64
    }

    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    pub fn segments(&self) -> impl Iterator<Item = Line3> + '_ {
        self.points.windows(2).map(|w| Line3::new(w[0], w[1]))
    }

    pub fn length(&self) -> f64 {
        self.segments().map(|s| s.length()).sum()
    }

    pub fn point_at(&self, t: f64) -> Point3 {
        if self.points.is_empty() {
            return Point3::default();
        }
        let t = t.clamp(0.0, self.max_param());
        let i = (t.floor() as usize).min(self.segment_count().saturating_sub(1));
        match (self.points.get(i), self.points.get(i + 1)) {
            (Some(&a), Some(&b)) => a.lerp(b, t - i as f64),
            (Some(&a), None) => a,
            _ => Point3::default(),
        }
    }

    pub fn closest_point(&self, p: Point3) -> CurvePoint {
        let mut best = CurvePoint {
            point: self.start(),
            t: 0.0,
            distance: self.start().distance(p),
        };
        for (i, seg) in self.segments().enumerate() {
            let (q, s) = seg.closest_point(p);
            let d = q.distance(p);
            if d < best.distance {
                best = CurvePoint {
                    point: q,
                    t: i as f64 + s,
                    distance: d,
                };
            }
        }
        best
    }

    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self { points }
    }

    pub fn is_closed(&self, tolerance: f64) -> bool {
        self.points.len() >= 4 && points_equal(self.start(), self.end(), tolerance)
    }

    pub fn is_planar(&self, tolerance: f64) -> bool {
        match Plane::fit(&self.points) {
            Some(plane) => self
                .points
                .iter()
                .all(|&p| plane.signed_distance(p).abs() <= tolerance),
            None => false,
        }
    }

    /// Sub-curve between two parameters, `t0 < t1`.
    pub fn trim(&self, t0: f64, t1: f64) -> Self {
        let mut points = vec![self.point_at(t0)];
        let first_vertex = (t0 + PARAM_EPS).floor() as usize + 1;
        let last_vertex = (t1 - PARAM_EPS).ceil() as usize;
        for i in first_vertex..last_vertex {
            if let Some(&v) = self.points.get(i) {
                points.push(v);
            }
        }
        points.push(self.point_at(t1));
        Self { points }
    }

    /// Splits at every interior parameter (shattering).
    ///
    /// Parameters at or beyond the curve ends, and duplicates, are ignored.
    pub fn split_at(&self, params: &[f64]) -> Vec<Self> {
        let max = self.max_param();
        let mut cuts: Vec<f64> = params
            .iter()
            .copied()
            .filter(|t| t.is_finite() && *t > PARAM_EPS && *t < max - PARAM_EPS)
            .collect();
        cuts.sort_by(f64::total_cmp);
        cuts.dedup_by(|a, b| (*a - *b).abs() <= PARAM_EPS);

        if cuts.is_empty() {
            return vec![self.clone()];
        }

        let mut out = Vec::with_capacity(cuts.len() + 1);
        let mut prev = 0.0;
        for t in cuts.into_iter().chain(std::iter::once(max)) {
            out.push(self.trim(prev, t));
            prev = t;
        }
        out
    }
}

impl From<Line3> for Polyline3 {
    fn from(line: Line3) -> Self {
        Self::line(line.from, line.to)
    }
}
