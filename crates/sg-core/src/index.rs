use rstar::RTree;
use rstar::primitives::GeomWithData;

use crate::geom::Point3;

type IndexedPoint<T> = GeomWithData<[f64; 3], T>;

/// R*-tree over 3D points carrying a caller-defined handle.
#[derive(Debug, Clone)]
pub struct PointIndex<T> {
    tree: RTree<IndexedPoint<T>>,
}

impl<T: Copy> PointIndex<T> {
    pub fn build(points: impl IntoIterator<Item = (Point3, T)>) -> Self {
        let entries: Vec<IndexedPoint<T>> = points
            .into_iter()
            .map(|(p, data)| GeomWithData::new(p.to_array(), data))
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    pub fn nearest(&self, p: Point3) -> Option<(Point3, T)> {
        self.tree
            .nearest_neighbor(&p.to_array())
            .map(|e| (Point3::from(*e.geom()), e.data))
    }

    /// Every entry within Euclidean `distance` of `p`, inclusive.
    pub fn within_distance(&self, p: Point3, distance: f64) -> Vec<(Point3, T)> {
        self.tree
            .locate_within_distance(p.to_array(), distance * distance)
            .map(|e| (Point3::from(*e.geom()), e.data))
            .collect()
    }
}
