/// Oriented plane in Hessian normal form: `normal · p + d = 0`.

use glam::DVec3;

/// A plane with a unit normal and a signed offset.
///
/// Points on the side the normal points to have a positive signed distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: DVec3,
    pub d: f64,
}

impl Plane {
    pub fn new(normal: DVec3, d: f64) -> Self {
        Self { normal, d }
    }

    /// Plane through three points, normal = normalize((p2 - p1) × (p3 - p1)).
    ///
    /// The winding of the three points decides which side is positive.
    /// Collinear points give a zero normal.
    pub fn from_points(p1: DVec3, p2: DVec3, p3: DVec3) -> Self {
        let normal = (p2 - p1).cross(p3 - p1).normalize_or_zero();
        Self { normal, d: -normal.dot(p1) }
    }

    /// Signed distance from `point` to the plane.
    pub fn distance(&self, point: DVec3) -> f64 {
        self.normal.dot(point) + self.d
    }
}
