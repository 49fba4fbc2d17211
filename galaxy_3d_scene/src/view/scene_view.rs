/// SceneView — renders one scene through one camera into a viewport.
///
/// Each frame is a single read pass: look up the camera node, build the
/// frame matrices, query the visible objects and hand them to the object
/// renderer in order. Several views may share a scene; views never modify
/// the graph.

use std::sync::Arc;
use glam::DMat4;
use crate::error::Result;
use crate::log::LogContext;
use crate::scene::{NodeKey, RenderableObject, Scene};
use crate::sync::InterruptToken;
use crate::{engine_err, engine_trace};
use super::object_renderer::{FrameUniforms, ObjectRenderer, ObjectRendererId};

const SOURCE: &str = "galaxy3d::SceneView";

/// Pixel rectangle of the render surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Viewport covering a whole surface.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }
}

/// One camera's view of a scene.
pub struct SceneView {
    scene: Arc<Scene>,
    /// Scene node carrying the camera
    camera: NodeKey,
    /// `None` follows the whole render surface
    viewport: Option<Viewport>,
    enabled: bool,

    // Last frame
    last_uniforms: Option<FrameUniforms>,
    last_visible: Vec<RenderableObject>,
    last_renderer: Option<ObjectRendererId>,

    log: LogContext,
}

impl SceneView {
    /// Full-surface view of `scene` through the camera on node `camera`.
    pub fn new(scene: Arc<Scene>, camera: NodeKey, log: LogContext) -> Self {
        Self {
            scene,
            camera,
            viewport: None,
            enabled: true,
            last_uniforms: None,
            last_visible: Vec::new(),
            last_renderer: None,
            log,
        }
    }

    /// Restrict the view to a fixed rectangle.
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = Some(viewport);
        self
    }

    pub fn scene(&self) -> &Arc<Scene> {
        &self.scene
    }

    pub fn camera(&self) -> NodeKey {
        self.camera
    }

    pub fn set_camera(&mut self, camera: NodeKey) {
        self.camera = camera;
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    /// `None` makes the view follow the render surface.
    pub fn set_viewport(&mut self, viewport: Option<Viewport>) {
        self.viewport = viewport;
    }

    pub fn is_full_surface(&self) -> bool {
        self.viewport.is_none()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Frame matrices of the last rendered frame.
    pub fn last_uniforms(&self) -> Option<&FrameUniforms> {
        self.last_uniforms.as_ref()
    }

    /// Objects drawn in the last rendered frame, in draw order.
    pub fn last_visible(&self) -> &[RenderableObject] {
        &self.last_visible
    }

    /// Renderer id returned for the last object of the last frame.
    pub fn last_renderer(&self) -> Option<ObjectRendererId> {
        self.last_renderer
    }

    /// Render one frame in a read pass. Returns the number of objects drawn.
    ///
    /// # Errors
    ///
    /// - Lock errors (`Interrupted`, `LockTimeout`, `LockReentry`)
    /// - `PreconditionViolation` if the camera node is missing or its
    ///   projection was never set
    /// - Any error returned by the object renderer (aborts the view)
    pub fn render_frame(&mut self, token: &InterruptToken, renderer: &mut dyn ObjectRenderer) -> Result<usize> {
        let scene = Arc::clone(&self.scene);
        let graph = scene.acquire_read_lock(token)?;

        let camera = graph.camera(self.camera)
            .ok_or_else(|| engine_err!(self.log, SOURCE,
                "Camera node {:?} not found in scene '{}'", self.camera, scene.name()))?;
        let view: DMat4 = *camera.view_matrix();
        let projection: DMat4 = *camera.projection_matrix()
            .ok_or_else(|| engine_err!(self.log, SOURCE,
                "Camera node {:?} has no projection matrix (viewport size never set)", self.camera))?;
        let view_projection = projection * view;

        let visible = graph.visible_object_intersection(camera);
        let uniforms = FrameUniforms::new(&view, &projection, &view_projection);

        renderer.begin_view(self.viewport.as_ref(), &uniforms);
        let mut previous = None;
        for object in &visible {
            previous = Some(renderer.render_object(object, previous, &view, &projection, &view_projection)?);
        }
        drop(graph);

        engine_trace!(self.log, SOURCE, "Rendered {} object(s) from scene '{}'", visible.len(), scene.name());
        let count = visible.len();
        self.last_uniforms = Some(uniforms);
        self.last_visible = visible;
        self.last_renderer = previous;
        Ok(count)
    }
}

#[cfg(test)]
#[path = "scene_view_tests.rs"]
mod tests;
