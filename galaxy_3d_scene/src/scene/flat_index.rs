/// FlatIndex — linear spatial index.
///
/// Members are kept in insertion order; queries test every member.
/// The correct baseline the hierarchical index is measured against.

use rustc_hash::FxHashMap;
use crate::bounds::AABB;
use crate::camera::{Frustum, Intersection};
use super::node::NodeKey;
use super::spatial_index::SpatialIndex;

/// Linear list of members with an aggregate bound.
pub struct FlatIndex {
    /// Members in insertion order
    members: Vec<NodeKey>,
    /// Member bounds
    volumes: FxHashMap<NodeKey, AABB>,
    /// Union of all member bounds
    bounds: Option<AABB>,
}

impl FlatIndex {
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
            volumes: FxHashMap::default(),
            bounds: None,
        }
    }

    fn widen(&mut self, volume: &AABB) {
        match self.bounds.as_mut() {
            Some(bounds) => {
                bounds.widen_to_include(volume);
            }
            None => self.bounds = Some(*volume),
        }
    }

    /// Shrinking needs a full pass; skip it when `volume` was strictly inside.
    fn shrink_after_losing(&mut self, volume: &AABB) {
        let touches = self.bounds.map_or(true, |bounds| volume.touches_boundary_of(&bounds));
        if touches {
            self.recalculate_bounds(false);
        }
    }
}

impl Default for FlatIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialIndex for FlatIndex {
    fn insert(&mut self, key: NodeKey, bounds: &AABB) -> bool {
        if self.volumes.contains_key(&key) {
            return false;
        }
        self.members.push(key);
        self.volumes.insert(key, *bounds);
        self.widen(bounds);
        true
    }

    fn remove(&mut self, key: NodeKey) -> bool {
        let Some(volume) = self.volumes.remove(&key) else {
            return false;
        };
        self.members.retain(|&member| member != key);
        self.shrink_after_losing(&volume);
        true
    }

    fn update(&mut self, key: NodeKey, bounds: &AABB) -> bool {
        let Some(previous) = self.volumes.get(&key).copied() else {
            return false;
        };
        self.volumes.insert(key, *bounds);
        if previous != *bounds {
            self.shrink_after_losing(&previous);
            self.widen(bounds);
        }
        true
    }

    fn contains(&self, key: NodeKey) -> bool {
        self.volumes.contains_key(&key)
    }

    fn len(&self) -> usize {
        self.members.len()
    }

    fn keys(&self) -> Vec<NodeKey> {
        self.members.clone()
    }

    fn member_bounds(&self, key: NodeKey) -> Option<AABB> {
        self.volumes.get(&key).copied()
    }

    fn clear(&mut self) {
        self.members.clear();
        self.volumes.clear();
        self.bounds = None;
    }

    fn bounds(&self) -> Option<AABB> {
        self.bounds
    }

    fn recalculate_bounds(&mut self, _recursive: bool) {
        self.bounds = self.members
            .iter()
            .filter_map(|key| self.volumes.get(key))
            .fold(None, |acc: Option<AABB>, volume| match acc {
                Some(bounds) => Some(bounds.merge(volume)),
                None => Some(*volume),
            });
    }

    fn query_frustum(&self, frustum: &Frustum, results: &mut Vec<(NodeKey, Intersection)>) {
        for &key in &self.members {
            if let Some(volume) = self.volumes.get(&key) {
                let classification = frustum.intersect_bounds(volume);
                if classification != Intersection::Outside {
                    results.push((key, classification));
                }
            }
        }
    }

    fn validate(&self) -> bool {
        match self.bounds {
            None => self.members.is_empty(),
            Some(bounds) => {
                self.members.len() == self.volumes.len()
                    && self.members.iter().all(|key| {
                        self.volumes.get(key).is_some_and(|volume| bounds.contains(volume))
                    })
            }
        }
    }
}

#[cfg(test)]
#[path = "flat_index_tests.rs"]
mod tests;
