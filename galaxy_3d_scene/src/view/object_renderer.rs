/// Object renderer interface and per-frame uniform layout.
///
/// The scene core never draws anything itself: a SceneView hands each
/// visible object, together with the frame matrices, to an
/// `ObjectRenderer` supplied by the application (GPU backend, debug
/// overlay, test double...).

use glam::{DMat4, Mat4};
use crate::error::Result;
use crate::scene::RenderableObject;
use super::scene_view::Viewport;

/// Identifies the renderer state (pipeline, material...) last used to draw
/// an object. Handed back on the next call so implementations can skip
/// redundant state changes between consecutive objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRendererId(pub u32);

/// Receives the visible objects of a view, in draw order.
pub trait ObjectRenderer {
    /// Called once per view before the first object.
    fn begin_view(&mut self, _viewport: Option<&Viewport>, _uniforms: &FrameUniforms) {}

    /// Draw one object.
    ///
    /// # Arguments
    ///
    /// * `object` - Visible node with its world matrix and bounds
    /// * `previous` - Renderer id returned for the previous object of this view
    /// * `view` - Camera view matrix
    /// * `projection` - Camera projection matrix
    /// * `view_projection` - `projection * view`
    fn render_object(
        &mut self,
        object: &RenderableObject,
        previous: Option<ObjectRendererId>,
        view: &DMat4,
        projection: &DMat4,
        view_projection: &DMat4,
    ) -> Result<ObjectRendererId>;
}

// ===== FRAME UNIFORMS =====

/// Frame matrices in the GPU frame uniform layout.
///
/// Three column-major `f32` matrices: view, projection, view-projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    pub matrices: [Mat4; 3],
}

impl FrameUniforms {
    pub const FIELD_VIEW: usize = 0;
    pub const FIELD_PROJECTION: usize = 1;
    pub const FIELD_VIEW_PROJECTION: usize = 2;

    pub fn new(view: &DMat4, projection: &DMat4, view_projection: &DMat4) -> Self {
        Self {
            matrices: [view.as_mat4(), projection.as_mat4(), view_projection.as_mat4()],
        }
    }

    pub fn view(&self) -> &Mat4 {
        &self.matrices[Self::FIELD_VIEW]
    }

    pub fn projection(&self) -> &Mat4 {
        &self.matrices[Self::FIELD_PROJECTION]
    }

    pub fn view_projection(&self) -> &Mat4 {
        &self.matrices[Self::FIELD_VIEW_PROJECTION]
    }

    /// Raw bytes for a uniform buffer upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.matrices)
    }
}

impl Default for FrameUniforms {
    fn default() -> Self {
        Self {
            matrices: [Mat4::IDENTITY; 3],
        }
    }
}
