use std::collections::HashSet;

use sg_core::{Error, Point3, PointKey, Polyline3, Result};

/// Points along `curve` spaced close to `division_length`.
///
/// Every segment is divided into `max(1, round(len / division_length))`
/// equal parts, so short segments still contribute their start vertex.
/// Coincident samples (by rounded position) are kept once.
pub fn sample_boundary(curve: &Polyline3, division_length: f64) -> Result<Vec<Point3>> {
    if division_length.is_nan() || division_length <= 0.0 {
        return Err(Error::invalid("division_length", "must be positive"));
    }

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut keep = |p: Point3| {
        if seen.insert(PointKey::new(p)) {
            out.push(p);
        }
    };

    for seg in curve.segments() {
        let parts = ((seg.length() / division_length).round() as usize).max(1);
        for k in 0..parts {
            keep(seg.point_at(k as f64 / parts as f64));
        }
    }
    if let Some(&last) = curve.points.last() {
        keep(last);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use sg_core::{Point3, Polyline3};

    use super::sample_boundary;

    #[test]
    fn segments_are_divided_adaptively() {
        let curve = Polyline3::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(10.0, 0.2, 0.0),
        ]);
        let pts = sample_boundary(&curve, 2.0).expect("positive length");
        // 5 parts on the long side, 1 on the short one, plus the end.
        assert_eq!(pts.len(), 7);
        assert!(pts[1].distance(Point3::new(2.0, 0.0, 0.0)) < 1e-12);
        assert_eq!(pts[6], Point3::new(10.0, 0.2, 0.0));
    }

    #[test]
    fn closed_curve_start_is_not_repeated() {
        let ring = Polyline3::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(4.0, 4.0, 0.0),
            Point3::new(0.0, 4.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
        ]);
        let pts = sample_boundary(&ring, 1.0).expect("positive length");
        assert_eq!(pts.len(), 16);
    }

    #[test]
    fn non_positive_spacing_is_rejected() {
        let line = Polyline3::line(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0));
        assert!(sample_boundary(&line, 0.0).is_err());
    }
}
