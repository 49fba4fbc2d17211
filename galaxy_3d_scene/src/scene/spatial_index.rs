/// Spatial indexing strategies for the scene graph.
///
/// A SpatialIndex holds the top-level nodes of a scene by their world-space
/// bounds and keeps an aggregate AABB that bounds every member. Frustum
/// queries return each member that is not `Outside`, tagged with its
/// classification so the caller can skip per-node tests below an `Inside`
/// member.
///
/// Implementations: `FlatIndex` (linear scan) and `PartitionIndex`
/// (octree or quad-tree). All mutators run under the scene write lock,
/// queries under the read lock.

use crate::bounds::AABB;
use crate::camera::{Frustum, Intersection};
use super::node::NodeKey;

/// Strategy interface for spatial indexing of scene nodes.
pub trait SpatialIndex: Send + Sync {
    /// Add a member with its world-space bounds.
    ///
    /// Returns `false` (and changes nothing) if the key is already present.
    /// The aggregate only widens.
    fn insert(&mut self, key: NodeKey, bounds: &AABB) -> bool;

    /// Remove a member. Returns `false` if the key was not present.
    fn remove(&mut self, key: NodeKey) -> bool;

    /// A member's bounds changed. Returns `false` if the key is not present.
    fn update(&mut self, key: NodeKey, bounds: &AABB) -> bool;

    fn contains(&self, key: NodeKey) -> bool;

    /// Number of members.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All members, in a deterministic order.
    fn keys(&self) -> Vec<NodeKey>;

    /// Stored bounds of one member.
    fn member_bounds(&self, key: NodeKey) -> Option<AABB>;

    /// Remove every member.
    fn clear(&mut self);

    /// Aggregate bounds of all members, `None` when empty.
    fn bounds(&self) -> Option<AABB>;

    /// Recompute the aggregate from the members. With `recursive`,
    /// hierarchical indices recompute every child partition first.
    fn recalculate_bounds(&mut self, recursive: bool);

    /// Append every member that is not `Outside` the frustum.
    ///
    /// Order is deterministic for identical index contents.
    fn query_frustum(&self, frustum: &Frustum, results: &mut Vec<(NodeKey, Intersection)>);

    /// Check that the aggregate (and every partition's bounds) contains
    /// every member it is responsible for.
    fn validate(&self) -> bool;
}
