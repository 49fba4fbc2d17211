/// Axis-aligned bounding boxes.
///
/// Every scene node carries a world-space AABB that bounds its own geometry
/// and all of its children. Spatial indices keep an aggregate AABB that
/// bounds all of their members. All math is double precision.

use glam::{DMat4, DVec3};

/// Axis-Aligned Bounding Box
///
/// Invariant: `min <= max` componentwise. `new()` enforces it; code that
/// writes the public fields directly is responsible for keeping it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner (x, y, z)
    pub min: DVec3,
    /// Maximum corner (x, y, z)
    pub max: DVec3,
}

impl AABB {
    /// Build a box from two opposite corners, in any order.
    pub fn new(a: DVec3, b: DVec3) -> Self {
        Self { min: a.min(b), max: a.max(b) }
    }

    /// Degenerate box around a single point.
    pub fn from_point(point: DVec3) -> Self {
        Self { min: point, max: point }
    }

    /// Tightest box around a set of points, `None` when the slice is empty.
    pub fn from_points(points: &[DVec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut aabb = Self::from_point(*first);
        for point in rest {
            aabb.min = aabb.min.min(*point);
            aabb.max = aabb.max.max(*point);
        }
        Some(aabb)
    }

    /// Union of two boxes (componentwise min of mins, max of maxes).
    ///
    /// No empty-box special case: callers seed with a real volume.
    pub fn merge(&self, other: &AABB) -> AABB {
        AABB {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Widen this box only where `other` exceeds it. Never shrinks.
    ///
    /// Returns `true` if any component moved.
    pub fn widen_to_include(&mut self, other: &AABB) -> bool {
        let widened = self.merge(other);
        let changed = widened != *self;
        *self = widened;
        changed
    }

    /// Test if this AABB fully contains another AABB (touching faces count).
    pub fn contains(&self, other: &AABB) -> bool {
        self.min.x <= other.min.x && self.max.x >= other.max.x
        && self.min.y <= other.min.y && self.max.y >= other.max.y
        && self.min.z <= other.min.z && self.max.z >= other.max.z
    }

    /// Test if a point lies inside or on the surface of this AABB.
    pub fn contains_point(&self, point: DVec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Test if this AABB intersects (overlaps) another AABB.
    ///
    /// Returns `true` if the two AABBs overlap or touch.
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x
        && self.min.y <= other.max.y && self.max.y >= other.min.y
        && self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Does this box reach the boundary of `outer` on any face?
    ///
    /// When a removed member does not touch the aggregate boundary, the
    /// aggregate cannot shrink and a full recomputation can be skipped.
    pub fn touches_boundary_of(&self, outer: &AABB) -> bool {
        self.min.cmple(outer.min).any() || self.max.cmpge(outer.max).any()
    }

    /// Center point.
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Full edge lengths.
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// Half edge lengths.
    pub fn extents(&self) -> DVec3 {
        self.size() * 0.5
    }

    /// The 8 corners; bit0 = X, bit1 = Y, bit2 = Z (0 = min, 1 = max).
    pub fn corners(&self) -> [DVec3; 8] {
        std::array::from_fn(|i| DVec3::new(
            if i & 1 == 0 { self.min.x } else { self.max.x },
            if i & 2 == 0 { self.min.y } else { self.max.y },
            if i & 4 == 0 { self.min.z } else { self.max.z },
        ))
    }

    /// Transform this local-space AABB by a matrix, returning a new AABB.
    ///
    /// Uses the Arvo method: projects each matrix axis onto the AABB extents
    /// for an exact (tight) result without transforming all 8 corners.
    pub fn transformed(&self, matrix: &DMat4) -> AABB {
        let translation = matrix.col(3).truncate();
        let mut new_min = translation;
        let mut new_max = translation;

        for i in 0..3 {
            let axis = matrix.col(i).truncate();
            let a = axis * self.min[i];
            let b = axis * self.max[i];
            new_min += a.min(b);
            new_max += a.max(b);
        }

        AABB { min: new_min, max: new_max }
    }
}

#[cfg(test)]
#[path = "aabb_tests.rs"]
mod tests;
