/// Frustum — eight corners and six inward-facing clipping planes.
///
/// Planes are rebuilt from corner triples whose winding makes every normal
/// point toward the visible volume. A point is inside the frustum when its
/// signed distance to all six planes is `>= 0`.
///
/// All math is double precision.

use glam::DVec3;
use crate::bounds::{AABB, Plane};
use crate::error::{Error, Result};

/// Tri-state result of a volume/frustum classification.
///
/// Used by the spatial indices for hierarchical culling:
/// - `Outside` → skip the entire subtree
/// - `Inside` → collect all objects without further testing
/// - `Intersect` → test individual objects and recurse into children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intersection {
    /// Volume is entirely outside the frustum
    Outside,
    /// Volume straddles at least one plane
    Intersect,
    /// Volume is entirely inside the frustum
    Inside,
}

/// Frustum corner indices
pub const CORNER_NTL: usize = 0;
pub const CORNER_NTR: usize = 1;
pub const CORNER_NBR: usize = 2;
pub const CORNER_NBL: usize = 3;
pub const CORNER_FTL: usize = 4;
pub const CORNER_FTR: usize = 5;
pub const CORNER_FBR: usize = 6;
pub const CORNER_FBL: usize = 7;

/// Frustum plane indices
pub const PLANE_LEFT: usize = 0;
pub const PLANE_RIGHT: usize = 1;
pub const PLANE_BOTTOM: usize = 2;
pub const PLANE_TOP: usize = 3;
pub const PLANE_NEAR: usize = 4;
pub const PLANE_FAR: usize = 5;

/// Corner triples per plane, in plane index order.
const PLANE_CORNERS: [[usize; 3]; 6] = [
    [CORNER_NBL, CORNER_NTL, CORNER_FBL], // left
    [CORNER_NTR, CORNER_NBR, CORNER_FBR], // right
    [CORNER_NBR, CORNER_NBL, CORNER_FBR], // bottom
    [CORNER_NTL, CORNER_NTR, CORNER_FTL], // top
    [CORNER_NTR, CORNER_NTL, CORNER_NBR], // near
    [CORNER_FTL, CORNER_FTR, CORNER_FBL], // far
];

/// Six frustum planes plus the eight corners they were built from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    corners: [DVec3; 8],
    planes: [Plane; 6],
}

impl Frustum {
    /// Build a frustum from exactly 8 corners in
    /// `NTL, NTR, NBR, NBL, FTL, FTR, FBR, FBL` order.
    ///
    /// # Errors
    ///
    /// `PreconditionViolation` if the slice does not hold exactly 8 points.
    pub fn from_corners(corners: &[DVec3]) -> Result<Self> {
        let corners: &[DVec3; 8] = corners.try_into().map_err(|_| {
            Error::PreconditionViolation(format!(
                "frustum needs exactly 8 corners, got {}",
                corners.len()
            ))
        })?;
        Ok(Self::from_corner_array(*corners))
    }

    /// Build a frustum from a fixed corner array (cannot fail).
    pub fn from_corner_array(corners: [DVec3; 8]) -> Self {
        let mut frustum = Self {
            corners,
            planes: [Plane::new(DVec3::ZERO, 0.0); 6],
        };
        frustum.rebuild_planes();
        frustum
    }

    /// Replace the corners and rebuild the planes.
    ///
    /// # Errors
    ///
    /// `PreconditionViolation` if the slice does not hold exactly 8 points;
    /// the frustum is left untouched in that case.
    pub fn update(&mut self, corners: &[DVec3]) -> Result<()> {
        *self = Self::from_corners(corners)?;
        Ok(())
    }

    pub(crate) fn set_corners(&mut self, corners: [DVec3; 8]) {
        self.corners = corners;
        self.rebuild_planes();
    }

    fn rebuild_planes(&mut self) {
        for (plane, [a, b, c]) in self.planes.iter_mut().zip(PLANE_CORNERS) {
            *plane = Plane::from_points(self.corners[a], self.corners[b], self.corners[c]);
        }
    }

    // ===== GETTERS =====

    pub fn corners(&self) -> &[DVec3; 8] {
        &self.corners
    }

    pub fn planes(&self) -> &[Plane; 6] {
        &self.planes
    }

    /// Plane by index (`PLANE_LEFT` .. `PLANE_FAR`).
    pub fn plane(&self, index: usize) -> &Plane {
        &self.planes[index]
    }

    // ===== CLASSIFICATION =====

    /// Classify an AABB against the frustum (3-way test).
    ///
    /// For each plane, the p-vertex is the corner farthest along the normal
    /// and the n-vertex the corner farthest against it:
    /// - p-vertex behind any plane → `Outside` (early out)
    /// - n-vertex behind a plane → at least `Intersect`, keep testing
    /// - otherwise → `Inside`
    pub fn intersect_bounds(&self, aabb: &AABB) -> Intersection {
        let mut result = Intersection::Inside;

        for plane in &self.planes {
            let normal = plane.normal;

            let p_vertex = DVec3::new(
                if normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            if plane.distance(p_vertex) < 0.0 {
                return Intersection::Outside;
            }

            let n_vertex = DVec3::new(
                if normal.x >= 0.0 { aabb.min.x } else { aabb.max.x },
                if normal.y >= 0.0 { aabb.min.y } else { aabb.max.y },
                if normal.z >= 0.0 { aabb.min.z } else { aabb.max.z },
            );
            if plane.distance(n_vertex) < 0.0 {
                result = Intersection::Intersect;
            }
        }

        result
    }

    /// Classify a sphere: `d < -r` on any plane → `Outside`,
    /// `d <= r` on any plane → `Intersect`, otherwise `Inside`.
    pub fn intersect_sphere(&self, center: DVec3, radius: f64) -> Intersection {
        let mut result = Intersection::Inside;

        for plane in &self.planes {
            let distance = plane.distance(center);
            if distance < -radius {
                return Intersection::Outside;
            }
            if distance <= radius {
                result = Intersection::Intersect;
            }
        }

        result
    }

    /// Classify a point; never returns `Intersect`.
    pub fn intersect_point(&self, point: DVec3) -> Intersection {
        if self.planes.iter().any(|plane| plane.distance(point) < 0.0) {
            Intersection::Outside
        } else {
            Intersection::Inside
        }
    }

    /// Conservative visibility test: anything not `Outside`.
    pub fn intersects_bounds(&self, aabb: &AABB) -> bool {
        self.intersect_bounds(aabb) != Intersection::Outside
    }
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
