use core::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const ORIGIN: Point3 = Point3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance(self, rhs: Self) -> f64 {
        (self - rhs).norm()
    }

    pub fn distance_squared(self, rhs: Self) -> f64 {
        let d = self - rhs;
        d.dot(d)
    }

    pub fn lerp(self, rhs: Self, t: f64) -> Self {
        self + (rhs - self) * t
    }

    pub fn midpoint(self, rhs: Self) -> Self {
        self.lerp(rhs, 0.5)
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn to_vec(self) -> Vec3 {
        Vec3 {
            x: self.x,
            y: self.y,
            z: self.z,
        }
    }
}

impl From<[f64; 3]> for Point3 {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn cross(self, rhs: Self) -> Self {
        Vec3 {
            x: self.y * rhs.z - self.z * rhs.y,
            y: self.z * rhs.x - self.x * rhs.z,
            z: self.x * rhs.y - self.y * rhs.x,
        }
    }

    pub fn norm(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn normalize(self) -> Self {
        let n = self.norm();
        if n == 0.0 {
            Self::default()
        } else {
            self * (1.0 / n)
        }
    }

    /// Unsigned angle to `rhs` in degrees, `None` when either vector is zero.
    pub fn angle_deg(self, rhs: Self) -> Option<f64> {
        let denom = self.norm() * rhs.norm();
        if denom == 0.0 {
            return None;
        }
        let c = (self.dot(rhs) / denom).clamp(-1.0, 1.0);
        Some(c.acos().to_degrees())
    }
}

impl Add<Vec3> for Point3 {
    type Output = Point3;

    fn add(self, rhs: Vec3) -> Self::Output {
        Point3 {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl Sub<Vec3> for Point3 {
    type Output = Point3;

    fn sub(self, rhs: Vec3) -> Self::Output {
        Point3 {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl Sub<Point3> for Point3 {
    type Output = Vec3;

    fn sub(self, rhs: Point3) -> Self::Output {
        Vec3 {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Self::Output {
        Vec3 {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Self::Output {
        Vec3 {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Self::Output {
        self * -1.0
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f64) -> Self::Output {
        Vec3 {
            x: self.x * rhs,
            y: self.y * rhs,
            z: self.z * rhs,
        }
    }
}

impl Mul<Vec3> for f64 {
    type Output = Vec3;

    fn mul(self, rhs: Vec3) -> Self::Output {
        rhs * self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line3 {
    pub from: Point3,
    pub to: Point3,
}

impl Line3 {
    pub const fn new(from: Point3, to: Point3) -> Self {
        Self { from, to }
    }

    pub fn length(&self) -> f64 {
        self.from.distance(self.to)
    }

    pub fn direction(&self) -> Vec3 {
        self.to - self.from
    }

    pub fn point_at(&self, t: f64) -> Point3 {
        self.from.lerp(self.to, t)
    }

    /// Closest point on the bounded segment and its normalized parameter.
    pub fn closest_point(&self, p: Point3) -> (Point3, f64) {
        let d = self.direction();
        let len2 = d.dot(d);
        if len2 == 0.0 {
            return (self.from, 0.0);
        }
        let t = ((p - self.from).dot(d) / len2).clamp(0.0, 1.0);
        (self.point_at(t), t)
    }
}

#[cfg(test)]
mod tests {
    use super::{Line3, Point3, Vec3};

    #[test]
    fn vec_ops_and_normalize() {
        let a = Vec3::new(3.0, 4.0, 0.0);
        let b = Vec3::new(1.0, -2.0, 2.0);

        assert_eq!(a + b, Vec3::new(4.0, 2.0, 2.0));
        assert_eq!(a - b, Vec3::new(2.0, 6.0, -2.0));
        assert!((a.dot(b) + 5.0).abs() < 1e-12);
        assert!((a.norm() - 5.0).abs() < 1e-12);
        assert_eq!(
            Vec3::new(1.0, 0.0, 0.0).cross(Vec3::new(0.0, 1.0, 0.0)),
            Vec3::new(0.0, 0.0, 1.0)
        );

        let n = a.normalize();
        assert!((n.norm() - 1.0).abs() < 1e-12);
        assert_eq!(Vec3::default().normalize(), Vec3::default());
    }

    #[test]
    fn angle_between_vectors() {
        let x = Vec3::new(1.0, 0.0, 0.0);
        let y = Vec3::new(0.0, 2.0, 0.0);

        assert!((x.angle_deg(y).expect("non-zero") - 90.0).abs() < 1e-9);
        assert!((x.angle_deg(-x).expect("non-zero") - 180.0).abs() < 1e-9);
        assert!(x.angle_deg(Vec3::default()).is_none());
    }

    #[test]
    fn segment_closest_point_clamps() {
        let line = Line3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 0.0));

        let (p, t) = line.closest_point(Point3::new(4.0, 3.0, 0.0));
        assert_eq!(p, Point3::new(4.0, 0.0, 0.0));
        assert!((t - 0.4).abs() < 1e-12);

        let (p, t) = line.closest_point(Point3::new(-5.0, 1.0, 0.0));
        assert_eq!(p, Point3::ORIGIN);
        assert_eq!(t, 0.0);
    }
}
