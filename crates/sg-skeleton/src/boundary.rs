use geo::{Contains, Coord, LineString, Point, Polygon};
use sg_core::{Error, Plane, Polyline3, Result};
use tracing::debug;

/// An outer boundary with the holes directly inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryGroup {
    pub outer: Polyline3,
    pub holes: Vec<Polyline3>,
}

/// `curve` in `plane` coordinates as a closed ring.
pub(crate) fn local_ring(plane: &Plane, curve: &Polyline3) -> LineString<f64> {
    curve
        .points
        .iter()
        .map(|&p| {
            let (x, y) = plane.to_local(p);
            Coord { x, y }
        })
        .collect::<Vec<_>>()
        .into()
}

struct Region {
    plane: Plane,
    polygon: Polygon<f64>,
}

impl Region {
    fn contains(&self, curve: &Polyline3) -> bool {
        let (x, y) = self.plane.to_local(curve.start());
        self.polygon.contains(&Point::new(x, y))
    }
}

/// Groups closed planar curves into outer boundaries and their holes.
///
/// A curve inside an odd number of other curves is a hole of the deepest
/// curve containing it; an even count makes it an outer boundary of its own.
pub fn classify_boundaries(curves: &[Polyline3], tolerance: f64) -> Result<Vec<BoundaryGroup>> {
    if curves.is_empty() {
        return Err(Error::invalid("curves", "must not be empty"));
    }

    let mut regions = Vec::with_capacity(curves.len());
    for (i, c) in curves.iter().enumerate() {
        if !c.is_closed(tolerance) {
            return Err(Error::Precondition(format!("boundary {i} is not closed")));
        }
        if !c.is_planar(tolerance) {
            return Err(Error::Precondition(format!("boundary {i} is not planar")));
        }
        let plane = Plane::fit(&c.points)
            .ok_or_else(|| Error::Degenerate(format!("boundary {i} encloses no area")))?;
        let polygon = Polygon::new(local_ring(&plane, c), Vec::new());
        regions.push(Region { plane, polygon });
    }

    let containers: Vec<Vec<usize>> = (0..curves.len())
        .map(|i| {
            (0..curves.len())
                .filter(|&j| j != i && regions[j].contains(&curves[i]))
                .collect()
        })
        .collect();
    let depth: Vec<usize> = containers.iter().map(Vec::len).collect();

    let mut slot_of = vec![None; curves.len()];
    let mut groups: Vec<BoundaryGroup> = Vec::new();
    for i in 0..curves.len() {
        if depth[i] % 2 == 0 {
            slot_of[i] = Some(groups.len());
            groups.push(BoundaryGroup {
                outer: curves[i].clone(),
                holes: Vec::new(),
            });
        }
    }
    for i in 0..curves.len() {
        if depth[i] % 2 == 0 {
            continue;
        }
        let parent = containers[i].iter().copied().max_by_key(|&j| depth[j]);
        match parent.and_then(|j| slot_of[j]) {
            Some(slot) => groups[slot].holes.push(curves[i].clone()),
            None => {
                return Err(Error::Degenerate(format!(
                    "hole {i} has no enclosing outer boundary"
                )));
            }
        }
    }

    debug!(curves = curves.len(), groups = groups.len(), "boundaries classified");
    Ok(groups)
}
