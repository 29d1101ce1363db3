//! Finite Voronoi edges derived from the Delaunay dual.
//!
//! The triangulation comes from `geo`'s spade backend; the dual joins the
//! circumcentres of triangles sharing a side.

use std::collections::{HashMap, HashSet};

use geo::{Coord, LineString, Rect, TriangulateSpade};
use sg_core::{Error, Result};

/// Voronoi segments shorter than this are dropped (cocircular samples).
const MIN_SEGMENT_LENGTH: f64 = 1e-9;

/// A Voronoi edge in plane coordinates.
pub type Segment = (Coord<f64>, Coord<f64>);

type CoordKey = (i64, i64);

/// `rect` grown by `margin` on every side.
pub fn inflate(rect: Rect<f64>, margin: f64) -> Rect<f64> {
    let d = Coord {
        x: margin,
        y: margin,
    };
    Rect::new(rect.min() - d, rect.max() + d)
}

/// Bounding box of `points`, `None` when empty.
pub fn bounding_rect(points: &[Coord<f64>]) -> Option<Rect<f64>> {
    let first = *points.first()?;
    let (mut min, mut max) = (first, first);
    for p in points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    Some(Rect::new(min, max))
}

/// Circumcentre of `a b c`, `None` for (near) collinear input.
pub fn circumcenter(a: Coord<f64>, b: Coord<f64>, c: Coord<f64>) -> Option<Coord<f64>> {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    let scale = (b - a).x.abs().max((b - a).y.abs()).max((c - a).x.abs()).max((c - a).y.abs());
    if d.abs() <= f64::EPSILON * scale * scale {
        return None;
    }
    let a2 = a.x * a.x + a.y * a.y;
    let b2 = b.x * b.x + b.y * b.y;
    let c2 = c.x * c.x + c.y * c.y;
    Some(Coord {
        x: (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d,
        y: (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d,
    })
}

/// Liang-Barsky clip of `a-b` against `rect`.
fn clip(a: Coord<f64>, b: Coord<f64>, rect: &Rect<f64>) -> Option<Segment> {
    let d = b - a;
    let (min, max) = (rect.min(), rect.max());
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    for (p, q) in [
        (-d.x, a.x - min.x),
        (d.x, max.x - a.x),
        (-d.y, a.y - min.y),
        (d.y, max.y - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((a + d * t0, a + d * t1))
}

fn key(c: Coord<f64>) -> CoordKey {
    ((c.x * 1e6).round() as i64, (c.y * 1e6).round() as i64)
}

fn side(a: Coord<f64>, b: Coord<f64>) -> (CoordKey, CoordKey) {
    let (ka, kb) = (key(a), key(b));
    if ka <= kb { (ka, kb) } else { (kb, ka) }
}

/// Voronoi edges of `points` that are finite, clipped to `outline`.
///
/// Each edge joins the circumcentres of two Delaunay triangles sharing a
/// side; unbounded hull rays are not produced. The output holds no duplicate
/// and no zero-length segments. Fewer than three non-collinear points give
/// no edges.
pub fn voronoi_edges(points: &[Coord<f64>], outline: &Rect<f64>) -> Result<Vec<Segment>> {
    if points.len() < 3 {
        return Ok(Vec::new());
    }

    // Only the coordinates feed the unconstrained triangulation.
    let cloud: LineString<f64> = points.iter().copied().collect();
    let triangles = cloud
        .unconstrained_triangulation()
        .map_err(|e| Error::Degenerate(format!("delaunay triangulation failed: {e:?}")))?;

    let mut first_owner: HashMap<(CoordKey, CoordKey), Coord<f64>> = HashMap::new();
    let mut seen: HashSet<(CoordKey, CoordKey)> = HashSet::new();
    let mut out = Vec::new();

    for t in &triangles {
        let [a, b, c] = t.to_array();
        let Some(center) = circumcenter(a, b, c) else {
            continue;
        };
        for (u, v) in [(a, b), (b, c), (c, a)] {
            let Some(other) = first_owner.insert(side(u, v), center) else {
                continue;
            };
            let Some((p, q)) = clip(other, center, outline) else {
                continue;
            };
            if (q - p).x.hypot((q - p).y) < MIN_SEGMENT_LENGTH {
                continue;
            }
            if seen.insert(side(p, q)) {
                out.push((p, q));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use geo::{Coord, Rect};

    use super::{bounding_rect, circumcenter, inflate, voronoi_edges};

    fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    #[test]
    fn circumcenter_of_right_triangle() {
        let o = circumcenter(c(0.0, 0.0), c(4.0, 0.0), c(0.0, 2.0)).expect("proper triangle");
        assert!((o.x - 2.0).abs() < 1e-12);
        assert!((o.y - 1.0).abs() < 1e-12);
        assert!(circumcenter(c(0.0, 0.0), c(1.0, 1.0), c(2.0, 2.0)).is_none());
    }

    #[test]
    fn voronoi_edges_are_equidistant_bisectors() {
        let pts = [c(0.0, 0.0), c(10.0, 0.3), c(9.5, 10.0), c(0.2, 9.0), c(5.3, 4.6)];
        let outline = inflate(bounding_rect(&pts).expect("non-empty"), 2.0);
        let edges = voronoi_edges(&pts, &outline).expect("finite input");

        // 4 triangles around the centre point share 4 interior sides.
        assert_eq!(edges.len(), 4);
        for (a, b) in &edges {
            let mid = c((a.x + b.x) * 0.5, (a.y + b.y) * 0.5);
            let mut d: Vec<f64> = pts
                .iter()
                .map(|p| (*p - mid).x.hypot((*p - mid).y))
                .collect();
            d.sort_by(f64::total_cmp);
            // Two nearest sites are equally far from any bisector point.
            assert!((d[0] - d[1]).abs() < 1e-6);
        }
    }

    #[test]
    fn convex_points_give_a_tree() {
        // n points in convex position: n - 2 triangles, n - 3 shared sides.
        let pts = [c(0.0, 0.0), c(10.0, 0.0), c(12.0, 7.0), c(1.0, 9.0), c(-3.0, 4.0)];
        let outline = inflate(bounding_rect(&pts).expect("non-empty"), 50.0);
        assert_eq!(voronoi_edges(&pts, &outline).expect("finite input").len(), 2);
    }

    #[test]
    fn segments_are_clipped_to_outline() {
        let pts = [c(0.0, 0.0), c(10.0, 0.3), c(9.5, 10.0), c(0.2, 9.0), c(5.3, 4.6)];
        let outline = Rect::new(c(4.0, 4.0), c(6.0, 6.0));
        for (a, b) in voronoi_edges(&pts, &outline).expect("finite input") {
            for p in [a, b] {
                assert!(p.x >= 4.0 - 1e-9 && p.x <= 6.0 + 1e-9);
                assert!(p.y >= 4.0 - 1e-9 && p.y <= 6.0 + 1e-9);
            }
        }
    }

    #[test]
    fn too_few_points() {
        let outline = Rect::new(c(-1.0, -1.0), c(2.0, 2.0));
        assert!(voronoi_edges(&[c(0.0, 0.0), c(1.0, 0.0)], &outline).expect("trivial").is_empty());
    }

    #[test]
    fn inflate_grows_every_side() {
        let r = inflate(Rect::new(c(0.0, 0.0), c(2.0, 1.0)), 0.5);
        assert_eq!(r.min(), c(-0.5, -0.5));
        assert_eq!(r.max(), c(2.5, 1.5));
    }
}
