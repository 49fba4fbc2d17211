/// Scene nodes: transform, bounds, hierarchy links and optional components.
///
/// Nodes live in the scene graph's node table and are addressed by
/// `NodeKey`. Parent links are plain keys (non-owning); the table owns
/// every node. World matrices and world bounds are derived by the graph
/// in `SceneGraph::update_graph()`.

use bitflags::bitflags;
use glam::{DMat4, DQuat, DVec3};
use slotmap::new_key_type;
use crate::bounds::AABB;
use crate::camera::Camera;

// ===== SLOT MAP KEY =====

new_key_type! {
    /// Stable key for a SceneNode within a SceneGraph.
    ///
    /// Keys remain valid even after other nodes are destroyed.
    /// A key becomes invalid only when its own node is destroyed.
    pub struct NodeKey;
}

/// Handle of the external renderable (mesh, sprite...) a node draws.
///
/// The scene core never interprets it; it is handed back to the
/// object renderer for every visible node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderableId(pub u64);

// ===== DIRTY FLAGS =====

bitflags! {
    /// What changed on a node since the last `update_graph()`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NodeDirtyFlags: u8 {
        /// Local transform changed, local matrix must be rebuilt
        const TRANSFORM = 1 << 0;
        /// Local geometry bounds changed
        const BOUNDS    = 1 << 1;
        /// Camera parameters changed
        const CAMERA    = 1 << 2;
        /// Children were attached or detached
        const HIERARCHY = 1 << 3;
    }
}

// ===== TRANSFORM =====

/// Position / orientation / scale relative to the parent node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: DVec3,
    pub orientation: DQuat,
    pub scale: DVec3,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        position: DVec3::ZERO,
        orientation: DQuat::IDENTITY,
        scale: DVec3::ONE,
    };

    pub fn from_position(position: DVec3) -> Self {
        Self { position, ..Self::IDENTITY }
    }

    pub fn with_orientation(mut self, orientation: DQuat) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_scale(mut self, scale: DVec3) -> Self {
        self.scale = scale;
        self
    }

    /// Local model matrix `T * R * S`.
    pub fn matrix(&self) -> DMat4 {
        DMat4::from_scale_rotation_translation(self.scale, self.orientation, self.position)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// ===== RENDERABLE OBJECT =====

/// A visible node as handed to the object renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderableObject {
    pub node: NodeKey,
    pub renderable: RenderableId,
    pub world_matrix: DMat4,
    /// World-space bounds of the node's own geometry
    pub bounds: AABB,
}

// ===== SCENE NODE =====

/// A node of the scene graph.
///
/// A camera is "a node with extra fields": attach one with
/// `SceneNode::with_camera`.
#[derive(Debug, Clone)]
pub struct SceneNode {
    name: Option<String>,
    transform: Transform,
    /// Geometry bounds in local space, `None` for pure group nodes
    local_bounds: Option<AABB>,
    renderable: Option<RenderableId>,
    camera: Option<Camera>,

    // Derived by the scene graph
    local_matrix: DMat4,
    world_matrix: DMat4,
    own_bounds: Option<AABB>,
    bounds: AABB,

    // Hierarchy (owned by the scene graph)
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
    pub(crate) dirty: NodeDirtyFlags,
}

impl SceneNode {
    /// Empty group node at the origin.
    pub fn new() -> Self {
        Self {
            name: None,
            transform: Transform::IDENTITY,
            local_bounds: None,
            renderable: None,
            camera: None,
            local_matrix: DMat4::IDENTITY,
            world_matrix: DMat4::IDENTITY,
            own_bounds: None,
            bounds: AABB::from_point(DVec3::ZERO),
            parent: None,
            children: Vec::new(),
            dirty: NodeDirtyFlags::all(),
        }
    }

    /// Node drawing `renderable`, whose geometry fits in `local_bounds`.
    pub fn renderable(renderable: RenderableId, local_bounds: AABB) -> Self {
        Self::new()
            .with_renderable(renderable)
            .with_local_bounds(local_bounds)
    }

    /// Node carrying a camera.
    pub fn camera_node(camera: Camera) -> Self {
        Self::new().with_camera(camera)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.set_transform(transform);
        self
    }

    pub fn with_local_bounds(mut self, local_bounds: AABB) -> Self {
        self.set_local_bounds(Some(local_bounds));
        self
    }

    pub fn with_renderable(mut self, renderable: RenderableId) -> Self {
        self.renderable = Some(renderable);
        self
    }

    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = Some(camera);
        self.dirty |= NodeDirtyFlags::CAMERA;
        self
    }

    // ===== GETTERS =====

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn local_bounds(&self) -> Option<&AABB> {
        self.local_bounds.as_ref()
    }

    pub fn renderable_id(&self) -> Option<RenderableId> {
        self.renderable
    }

    pub fn is_renderable(&self) -> bool {
        self.renderable.is_some()
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    pub fn world_matrix(&self) -> &DMat4 {
        &self.world_matrix
    }

    pub fn world_position(&self) -> DVec3 {
        self.world_matrix.w_axis.truncate()
    }

    /// World-space bounds of this node's own geometry.
    pub fn own_bounds(&self) -> Option<&AABB> {
        self.own_bounds.as_ref()
    }

    /// World-space bounds of this node and its whole subtree.
    pub fn bounds(&self) -> &AABB {
        &self.bounds
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    pub fn dirty(&self) -> NodeDirtyFlags {
        self.dirty
    }

    // ===== SETTERS =====

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
        self.dirty |= NodeDirtyFlags::TRANSFORM;
    }

    pub fn set_position(&mut self, position: DVec3) {
        self.transform.position = position;
        self.dirty |= NodeDirtyFlags::TRANSFORM;
    }

    pub fn set_local_bounds(&mut self, local_bounds: Option<AABB>) {
        self.local_bounds = local_bounds;
        self.dirty |= NodeDirtyFlags::BOUNDS;
    }

    pub fn set_renderable(&mut self, renderable: Option<RenderableId>) {
        self.renderable = renderable;
    }

    pub fn camera_mut(&mut self) -> Option<&mut Camera> {
        self.dirty |= NodeDirtyFlags::CAMERA;
        self.camera.as_mut()
    }

    // ===== DERIVED STATE (scene graph only) =====

    /// Recompute world matrix and own bounds under `parent_world`.
    pub(crate) fn refresh_world(&mut self, parent_world: &DMat4) {
        if self.dirty.contains(NodeDirtyFlags::TRANSFORM) {
            self.local_matrix = self.transform.matrix();
        }
        self.world_matrix = *parent_world * self.local_matrix;
        self.own_bounds = self.local_bounds.map(|local| local.transformed(&self.world_matrix));

        let world_matrix = self.world_matrix;
        if let Some(camera) = self.camera.as_mut() {
            // Only re-transform the frustum when the world matrix moved
            if *camera.world_matrix() != world_matrix {
                camera.model_matrix_updated(world_matrix);
            }
        }
        self.dirty = NodeDirtyFlags::empty();
    }

    /// Set the subtree bounds from the merged children bounds.
    pub(crate) fn finish_bounds(&mut self, children_bounds: Option<AABB>) {
        self.bounds = match (self.own_bounds, children_bounds) {
            (Some(own), Some(children)) => own.merge(&children),
            (Some(own), None) => own,
            (None, Some(children)) => children,
            (None, None) => AABB::from_point(self.world_position()),
        };
    }

    /// Convert into a `RenderableObject` if this node draws something.
    pub(crate) fn as_renderable_object(&self, key: NodeKey) -> Option<RenderableObject> {
        let renderable = self.renderable?;
        Some(RenderableObject {
            node: key,
            renderable,
            world_matrix: self.world_matrix,
            bounds: self.own_bounds.unwrap_or(self.bounds),
        })
    }
}

impl Default for SceneNode {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
