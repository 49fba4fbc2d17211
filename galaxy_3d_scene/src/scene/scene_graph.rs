/// SceneGraph — node table, hierarchy and spatial index of one scene.
///
/// Owns every `SceneNode` in a SlotMap and the scene's `SpatialIndex`.
/// Only top-level nodes are indexed; a node's world bounds cover its whole
/// subtree, so culling an indexed member culls everything below it.
///
/// Mutations only mark nodes dirty. `update_graph()` resolves them:
/// world matrices top-down, bounds bottom-up, camera frusta, then index
/// updates for the affected top-level members. The owning `Scene` calls it
/// at the end of every write section.

use rustc_hash::FxHashSet;
use slotmap::SlotMap;
use glam::DMat4;
use crate::bounds::AABB;
use crate::camera::{Camera, Intersection, Frustum};
use crate::config::IndexConfig;
use crate::error::Result;
use crate::log::LogContext;
use crate::{engine_bail, engine_debug, engine_err, engine_trace};
use super::node::{NodeDirtyFlags, NodeKey, RenderableObject, SceneNode, Transform};
use super::spatial_index::SpatialIndex;

const SOURCE: &str = "galaxy3d::SceneGraph";

/// Nodes, hierarchy and spatial index of a scene.
pub struct SceneGraph {
    /// Every node of the scene, attached or not
    nodes: SlotMap<NodeKey, SceneNode>,
    /// Top-level members, by world bounds
    index: Box<dyn SpatialIndex>,
    /// Nodes touched since the last `update_graph()`
    pending: Vec<NodeKey>,
    log: LogContext,
}

impl SceneGraph {
    /// Create an empty graph around an index strategy.
    pub fn new(index: Box<dyn SpatialIndex>, log: LogContext) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            index,
            pending: Vec::new(),
            log,
        }
    }

    /// Create an empty graph with the configured index strategy.
    pub fn from_config(config: &IndexConfig, log: LogContext) -> Self {
        Self::new(config.build(), log)
    }

    pub fn index(&self) -> &dyn SpatialIndex {
        self.index.as_ref()
    }

    pub fn log(&self) -> &LogContext {
        &self.log
    }

    // ===== NODES =====

    /// Store a node without indexing it.
    ///
    /// The node is detached; index it with `add()` or attach it under
    /// another node with `attach_child()`.
    pub fn create_node(&mut self, node: SceneNode) -> NodeKey {
        let key = self.nodes.insert(node);
        self.pending.push(key);
        engine_trace!(self.log, SOURCE, "Created node {:?}", key);
        key
    }

    /// Store a node and index it as a top-level member.
    pub fn insert(&mut self, node: SceneNode) -> NodeKey {
        let key = self.create_node(node);
        self.index_root(key);
        key
    }

    /// Destroy a node and its whole subtree.
    ///
    /// The node is removed from the index and detached from its parent.
    /// Returns `false` if the key is unknown.
    pub fn destroy_node(&mut self, key: NodeKey) -> bool {
        if !self.nodes.contains_key(key) {
            return false;
        }
        self.index.remove(key);
        self.detach_child(key);

        let mut stack = vec![key];
        let mut destroyed = 0usize;
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(current) {
                stack.extend_from_slice(&node.children);
                destroyed += 1;
            }
        }
        engine_debug!(self.log, SOURCE, "Destroyed node {:?} ({} nodes in subtree)", key, destroyed);
        true
    }

    pub fn node(&self, key: NodeKey) -> Option<&SceneNode> {
        self.nodes.get(key)
    }

    pub fn camera(&self, key: NodeKey) -> Option<&Camera> {
        self.nodes.get(key).and_then(|node| node.camera())
    }

    /// Total number of nodes (indexed, attached and detached).
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_keys(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.nodes.keys()
    }

    // ===== INDEX MEMBERSHIP =====

    /// Index a top-level node.
    ///
    /// Returns `Ok(false)` if the node is already indexed.
    ///
    /// # Errors
    ///
    /// `PreconditionViolation` if the node does not exist or has a parent.
    pub fn add(&mut self, key: NodeKey) -> Result<bool> {
        self.check_indexable(key)?;
        if self.index.contains(key) {
            return Ok(false);
        }
        Ok(self.index_root(key))
    }

    /// Remove a node from the index (the node itself is kept).
    ///
    /// Returns `false` if it was not indexed.
    pub fn remove(&mut self, key: NodeKey) -> bool {
        self.index.remove(key)
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.index.contains(key)
    }

    /// Number of indexed top-level nodes.
    pub fn size(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Empty the index. Nodes stay in the graph.
    pub fn clear(&mut self) {
        self.index.clear();
    }

    /// Index every node of `keys`. Returns `true` if anything was added.
    ///
    /// # Errors
    ///
    /// `PreconditionViolation` if any key cannot be indexed; nothing is
    /// added in that case.
    pub fn add_all(&mut self, keys: &[NodeKey]) -> Result<bool> {
        for &key in keys {
            self.check_indexable(key)?;
        }
        let mut changed = false;
        for &key in keys {
            if !self.index.contains(key) {
                changed |= self.index_root(key);
            }
        }
        Ok(changed)
    }

    /// Unindex every node of `keys`. Returns `true` if anything was removed.
    pub fn remove_all(&mut self, keys: &[NodeKey]) -> bool {
        let mut changed = false;
        for &key in keys {
            changed |= self.index.remove(key);
        }
        changed
    }

    /// Keep only the indexed nodes listed in `keys`.
    ///
    /// Returns `true` if anything was removed.
    pub fn retain_all(&mut self, keys: &[NodeKey]) -> bool {
        let keep: FxHashSet<NodeKey> = keys.iter().copied().collect();
        let mut changed = false;
        for key in self.index.keys() {
            if !keep.contains(&key) {
                changed |= self.index.remove(key);
            }
        }
        changed
    }

    pub fn contains_all(&self, keys: &[NodeKey]) -> bool {
        keys.iter().all(|&key| self.index.contains(key))
    }

    fn check_indexable(&self, key: NodeKey) -> Result<()> {
        match self.nodes.get(key) {
            None => engine_bail!(self.log, SOURCE, "Node {:?} does not exist", key),
            Some(node) if node.parent.is_some() => engine_bail!(
                self.log, SOURCE,
                "Node {:?} has a parent; only top-level nodes can be indexed", key
            ),
            Some(_) => Ok(()),
        }
    }

    fn index_root(&mut self, key: NodeKey) -> bool {
        match self.refresh_subtree(key, &DMat4::IDENTITY) {
            Some(bounds) => self.index.insert(key, &bounds),
            None => false,
        }
    }

    // ===== HIERARCHY =====

    /// Attach `child` under `parent`.
    ///
    /// Returns `Ok(false)` if `child` already is a child of `parent`.
    ///
    /// # Errors
    ///
    /// `PreconditionViolation` if either node does not exist, if `child`
    /// already has another parent or is indexed, or if the link would
    /// create a cycle.
    pub fn attach_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<bool> {
        if !self.nodes.contains_key(parent) {
            engine_bail!(self.log, SOURCE, "Parent node {:?} does not exist", parent);
        }
        let child_parent = self.nodes.get(child)
            .ok_or_else(|| engine_err!(self.log, SOURCE, "Child node {:?} does not exist", child))?
            .parent;

        match child_parent {
            Some(current) if current == parent => return Ok(false),
            Some(current) => engine_bail!(
                self.log, SOURCE,
                "Node {:?} is already attached to {:?}", child, current
            ),
            None => {}
        }
        if self.index.contains(child) {
            engine_bail!(self.log, SOURCE, "Node {:?} is indexed; remove it before attaching", child);
        }

        // Walk up from the new parent: reaching the child means a cycle
        let mut ancestor = Some(parent);
        while let Some(current) = ancestor {
            if current == child {
                engine_bail!(
                    self.log, SOURCE,
                    "Attaching {:?} under {:?} would create a cycle", child, parent
                );
            }
            ancestor = self.nodes.get(current).and_then(|node| node.parent);
        }

        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(child);
            node.dirty |= NodeDirtyFlags::HIERARCHY;
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
            node.dirty |= NodeDirtyFlags::TRANSFORM;
        }
        self.pending.push(parent);
        engine_debug!(self.log, SOURCE, "Attached {:?} under {:?}", child, parent);
        Ok(true)
    }

    /// Detach a node from its parent. It becomes a detached top-level node
    /// (not indexed). Returns `false` if it had no parent.
    pub fn detach_child(&mut self, child: NodeKey) -> bool {
        let Some(parent) = self.nodes.get(child).and_then(|node| node.parent) else {
            return false;
        };
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.retain(|&key| key != child);
            node.dirty |= NodeDirtyFlags::HIERARCHY;
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = None;
            node.dirty |= NodeDirtyFlags::TRANSFORM;
        }
        self.pending.push(parent);
        self.pending.push(child);
        true
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(key).and_then(|node| node.parent)
    }

    /// Children of a node (empty for unknown keys).
    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.nodes.get(key).map_or(&[], |node| node.children())
    }

    fn root_of(&self, key: NodeKey) -> NodeKey {
        let mut current = key;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    // ===== MODIFICATION =====

    /// Replace a node's local transform.
    pub fn set_transform(&mut self, key: NodeKey, transform: Transform) -> Result<()> {
        self.modify_node(key, |node| node.set_transform(transform))
    }

    /// Run `modifier` on a node. Changes are resolved by `update_graph()`.
    ///
    /// # Errors
    ///
    /// `PreconditionViolation` if the node does not exist.
    pub fn modify_node<R>(&mut self, key: NodeKey, modifier: impl FnOnce(&mut SceneNode) -> R) -> Result<R> {
        let node = self.nodes.get_mut(key)
            .ok_or_else(|| engine_err!(self.log, SOURCE, "Node {:?} does not exist", key))?;
        let result = modifier(node);
        self.pending.push(key);
        Ok(result)
    }

    /// Run `modifier` on a node's camera.
    ///
    /// # Errors
    ///
    /// `PreconditionViolation` if the node does not exist or carries no
    /// camera, or whatever the modifier returns.
    pub fn modify_camera<R>(
        &mut self,
        key: NodeKey,
        modifier: impl FnOnce(&mut Camera) -> Result<R>,
    ) -> Result<R> {
        let node = self.nodes.get_mut(key)
            .ok_or_else(|| engine_err!(self.log, SOURCE, "Node {:?} does not exist", key))?;
        let camera = node.camera_mut()
            .ok_or_else(|| engine_err!(self.log, SOURCE, "Node {:?} has no camera", key))?;
        let result = modifier(camera);
        self.pending.push(key);
        result
    }

    // ===== DERIVED STATE =====

    /// Resolve every pending change.
    ///
    /// Each affected tree is refreshed from its root: world matrices and
    /// camera frusta top-down, bounds bottom-up. Indexed roots then get
    /// their new bounds pushed into the index. Returns the number of trees
    /// refreshed.
    pub fn update_graph(&mut self) -> usize {
        if self.pending.is_empty() {
            return 0;
        }
        let pending = std::mem::take(&mut self.pending);
        let mut roots: Vec<NodeKey> = pending
            .into_iter()
            .filter(|&key| self.nodes.contains_key(key))
            .map(|key| self.root_of(key))
            .collect();
        roots.sort();
        roots.dedup();

        for &root in &roots {
            if let Some(bounds) = self.refresh_subtree(root, &DMat4::IDENTITY) {
                if self.index.contains(root) {
                    self.index.update(root, &bounds);
                }
            }
        }
        engine_trace!(self.log, SOURCE, "Updated {} tree(s)", roots.len());
        roots.len()
    }

    /// Refresh a subtree under `parent_world` and return its world bounds.
    fn refresh_subtree(&mut self, key: NodeKey, parent_world: &DMat4) -> Option<AABB> {
        let (world_matrix, children) = {
            let node = self.nodes.get_mut(key)?;
            node.refresh_world(parent_world);
            (*node.world_matrix(), node.children.clone())
        };

        let mut children_bounds: Option<AABB> = None;
        for child in children {
            if let Some(child_bounds) = self.refresh_subtree(child, &world_matrix) {
                children_bounds = Some(match children_bounds {
                    Some(bounds) => bounds.merge(&child_bounds),
                    None => child_bounds,
                });
            }
        }

        let node = self.nodes.get_mut(key)?;
        node.finish_bounds(children_bounds);
        Some(*node.bounds())
    }

    /// Recompute the aggregate bounds.
    ///
    /// With `recursive`, every indexed tree is refreshed and the index
    /// recomputes all of its partitions; otherwise only the index's
    /// top-level aggregate is recomputed from the stored member bounds.
    pub fn recalculate_bounds(&mut self, recursive: bool) {
        if recursive {
            for key in self.index.keys() {
                if let Some(bounds) = self.refresh_subtree(key, &DMat4::IDENTITY) {
                    self.index.update(key, &bounds);
                }
            }
        }
        self.index.recalculate_bounds(recursive);
    }

    /// Aggregate bounds of every indexed node, `None` when empty.
    pub fn bounds(&self) -> Option<AABB> {
        self.index.bounds()
    }

    /// Check the bounds invariants: the index aggregate contains every
    /// member, each member's stored bounds contain its subtree, and every
    /// node's bounds contain its children's.
    pub fn validate_bounds(&self) -> bool {
        if !self.index.validate() {
            return false;
        }
        let members_ok = self.index.keys().into_iter().all(|key| {
            match (self.index.member_bounds(key), self.nodes.get(key)) {
                (Some(stored), Some(node)) => stored.contains(node.bounds()),
                _ => false,
            }
        });
        members_ok && self.nodes.values().all(|node| {
            node.children.iter().all(|&child| {
                self.nodes.get(child).is_some_and(|child| node.bounds().contains(child.bounds()))
            })
        })
    }

    // ===== VISIBILITY =====

    /// Every renderable node not `Outside` the camera's frustum.
    ///
    /// Order is index query order, then depth-first child order. Subtrees
    /// whose aggregate bounds are `Outside` are pruned; below an `Inside`
    /// node nothing is tested.
    pub fn visible_object_intersection(&self, camera: &Camera) -> Vec<RenderableObject> {
        let frustum = camera.frustum();
        let mut members = Vec::new();
        self.index.query_frustum(frustum, &mut members);

        let mut visible = Vec::new();
        for (key, classification) in members {
            self.collect_visible(key, classification, frustum, &mut visible);
        }
        visible
    }

    fn collect_visible(
        &self,
        key: NodeKey,
        classification: Intersection,
        frustum: &Frustum,
        visible: &mut Vec<RenderableObject>,
    ) {
        let Some(node) = self.nodes.get(key) else {
            return;
        };

        let draw = match classification {
            Intersection::Inside => true,
            _ => node.own_bounds().map_or(true, |own| {
                frustum.intersect_bounds(own) != Intersection::Outside
            }),
        };
        if draw {
            if let Some(object) = node.as_renderable_object(key) {
                visible.push(object);
            }
        }

        for &child in node.children() {
            let child_class = match classification {
                Intersection::Inside => Intersection::Inside,
                _ => match self.nodes.get(child) {
                    Some(child_node) => frustum.intersect_bounds(child_node.bounds()),
                    None => continue,
                },
            };
            if child_class != Intersection::Outside {
                self.collect_visible(child, child_class, frustum, visible);
            }
        }
    }
}

#[cfg(test)]
#[path = "scene_graph_tests.rs"]
mod tests;
