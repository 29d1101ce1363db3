//! Curve/curve and point/curve coincidence queries.
//!
//! All queries return parameters on the first curve (see [`Polyline3`]), which
//! is what [`Polyline3::split_at`] consumes when shattering.

use crate::curve::Polyline3;
use crate::geom::{Line3, Point3};

const PARALLEL_EPS: f64 = 1e-12;

/// Parameters on `a` where `b` crosses, touches, or overlaps it.
pub fn curve_intersections(a: &Polyline3, b: &Polyline3, tolerance: f64) -> Vec<f64> {
    let mut out = Vec::new();
    for (i, sa) in a.segments().enumerate() {
        for sb in b.segments() {
            for s in segment_intersections(&sa, &sb, tolerance) {
                out.push(i as f64 + s);
            }
        }
    }
    out
}

/// Parameters on `curve` where `point` lies within `tolerance`.
pub fn point_parameters(curve: &Polyline3, point: Point3, tolerance: f64) -> Vec<f64> {
    curve
        .segments()
        .enumerate()
        .filter_map(|(i, seg)| {
            let (q, s) = seg.closest_point(point);
            (q.distance(point) <= tolerance).then_some(i as f64 + s)
        })
        .collect()
}

/// Normalized parameters on `a` where segment `b` meets it.
///
/// Collinear overlaps report the parameters of `b`'s endpoints that fall on
/// `a`, so both ends of the shared stretch become split points.
pub fn segment_intersections(a: &Line3, b: &Line3, tolerance: f64) -> Vec<f64> {
    let d1 = a.direction();
    let d2 = b.direction();
    let len1 = d1.norm();
    let len2 = d2.norm();

    if len1 <= PARALLEL_EPS {
        return Vec::new();
    }

    if len2 > PARALLEL_EPS && d1.cross(d2).norm() <= PARALLEL_EPS * len1 * len2 {
        return collinear_overlap(a, b, tolerance);
    }

    let (s, u) = closest_params(a, b);
    let pa = a.point_at(s);
    let pb = b.point_at(u);
    if pa.distance(pb) <= tolerance {
        vec![s]
    } else {
        Vec::new()
    }
}

fn collinear_overlap(a: &Line3, b: &Line3, tolerance: f64) -> Vec<f64> {
    let mut out = Vec::new();
    for p in [b.from, b.to] {
        let (q, s) = a.closest_point(p);
        if q.distance(p) <= tolerance {
            out.push(s);
        }
    }
    out
}

/// Closest-approach parameters `(s, u)` between two bounded segments.
fn closest_params(a: &Line3, b: &Line3) -> (f64, f64) {
    let d1 = a.direction();
    let d2 = b.direction();
    let r = a.from - b.from;
    let aa = d1.dot(d1);
    let e = d2.dot(d2);
    let f = d2.dot(r);

    if aa <= PARALLEL_EPS && e <= PARALLEL_EPS {
        return (0.0, 0.0);
    }
    if aa <= PARALLEL_EPS {
        return (0.0, (f / e).clamp(0.0, 1.0));
    }

    let c = d1.dot(r);
    if e <= PARALLEL_EPS {
        return ((-c / aa).clamp(0.0, 1.0), 0.0);
    }

    let bb = d1.dot(d2);
    let denom = aa * e - bb * bb;
    let mut s = if denom != 0.0 {
        ((bb * f - c * e) / denom).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let mut u = (bb * s + f) / e;
    if u < 0.0 {
        u = 0.0;
        s = (-c / aa).clamp(0.0, 1.0);
    } else if u > 1.0 {
        u = 1.0;
        s = ((bb - c) / aa).clamp(0.0, 1.0);
    }
    (s, u)
}
