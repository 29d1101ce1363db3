use crate::geom::{Point3, Vec3};

/// Plane with an orthonormal in-plane basis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub origin: Point3,
    pub x_axis: Vec3,
    pub y_axis: Vec3,
    pub normal: Vec3,
}

impl Plane {
    pub fn world_xy() -> Self {
        Self {
            origin: Point3::ORIGIN,
            x_axis: Vec3::new(1.0, 0.0, 0.0),
            y_axis: Vec3::new(0.0, 1.0, 0.0),
            normal: Vec3::new(0.0, 0.0, 1.0),
        }
    }

    /// Best-fit plane through `points` using Newell's normal.
    ///
    /// Returns `None` when the points are collinear or fewer than three.
    pub fn fit(points: &[Point3]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }

        let mut n = Vec3::default();
        let mut c = Vec3::default();
        for (i, &p) in points.iter().enumerate() {
            let q = points[(i + 1) % points.len()];
            n.x += (p.y - q.y) * (p.z + q.z);
            n.y += (p.z - q.z) * (p.x + q.x);
            n.z += (p.x - q.x) * (p.y + q.y);
            c = c + p.to_vec();
        }
        let c = c * (1.0 / points.len() as f64);
        let origin = Point3::new(c.x, c.y, c.z);

        if n.norm() <= f64::EPSILON {
            return None;
        }
        // Keep world-up orientation when the plane is (near) horizontal so
        // local coordinates match world XY for flat input.
        if n.z < 0.0 {
            n = -n;
        }
        Some(Self::from_normal(origin, n))
    }

    pub fn from_normal(origin: Point3, normal: Vec3) -> Self {
        let normal = normal.normalize();
        let helper = if normal.z.abs() > 0.9 {
            Vec3::new(1.0, 0.0, 0.0)
        } else {
            Vec3::new(0.0, 0.0, 1.0)
        };
        let y_axis = normal.cross(helper).normalize();
        let x_axis = y_axis.cross(normal).normalize();
        Self {
            origin,
            x_axis,
            y_axis,
            normal,
        }
    }

    pub fn signed_distance(&self, p: Point3) -> f64 {
        (p - self.origin).dot(self.normal)
    }

    pub fn project(&self, p: Point3) -> Point3 {
        p - self.normal * self.signed_distance(p)
    }

    pub fn to_local(&self, p: Point3) -> (f64, f64) {
        let d = p - self.origin;
        (d.dot(self.x_axis), d.dot(self.y_axis))
    }

    pub fn from_local(&self, u: f64, v: f64) -> Point3 {
        self.origin + self.x_axis * u + self.y_axis * v
    }
}
