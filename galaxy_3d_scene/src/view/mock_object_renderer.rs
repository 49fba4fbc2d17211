/// Mock object renderer for tests (no GPU required)
///
/// Records every call so tests can check what a SceneView drew, in which
/// order, and with which matrices. Can be told to fail on one renderable.

use glam::DMat4;
use crate::error::{Error, Result};
use crate::scene::{RenderableId, RenderableObject};
use super::object_renderer::{FrameUniforms, ObjectRenderer, ObjectRendererId};
use super::scene_view::Viewport;

/// One `render_object` call.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub object: RenderableObject,
    pub previous: Option<ObjectRendererId>,
    pub view_projection: DMat4,
}

/// Recording `ObjectRenderer`.
#[derive(Debug, Default)]
pub struct MockObjectRenderer {
    /// Every draw call, across views and frames
    pub draws: Vec<DrawCall>,
    /// Viewport and uniforms of each `begin_view`
    pub views: Vec<(Option<Viewport>, FrameUniforms)>,
    /// Fail when asked to draw this renderable
    pub fail_on: Option<RenderableId>,
}

impl MockObjectRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(renderable: RenderableId) -> Self {
        Self {
            fail_on: Some(renderable),
            ..Self::default()
        }
    }

    /// Renderable ids in draw order.
    pub fn drawn_ids(&self) -> Vec<u64> {
        self.draws.iter().map(|call| call.object.renderable.0).collect()
    }

    pub fn clear(&mut self) {
        self.draws.clear();
        self.views.clear();
    }
}

impl ObjectRenderer for MockObjectRenderer {
    fn begin_view(&mut self, viewport: Option<&Viewport>, uniforms: &FrameUniforms) {
        self.views.push((viewport.copied(), *uniforms));
    }

    fn render_object(
        &mut self,
        object: &RenderableObject,
        previous: Option<ObjectRendererId>,
        _view: &DMat4,
        _projection: &DMat4,
        view_projection: &DMat4,
    ) -> Result<ObjectRendererId> {
        if self.fail_on == Some(object.renderable) {
            return Err(Error::RenderFailed(format!("mock failure on {:?}", object.renderable)));
        }
        self.draws.push(DrawCall {
            object: *object,
            previous,
            view_projection: *view_projection,
        });
        // One "pipeline" per renderable id parity
        Ok(ObjectRendererId((object.renderable.0 % 2) as u32))
    }
}
