//! View module — turning scenes into draw calls.
//!
//! A `SceneView` renders one scene through one camera into a viewport;
//! `RenderControl` drives frames over every view of a render surface.
//! Drawing itself is delegated to an application-supplied `ObjectRenderer`.

mod object_renderer;
mod scene_view;
mod render_control;
mod mock_object_renderer;

pub use object_renderer::{ObjectRenderer, ObjectRendererId, FrameUniforms};
pub use scene_view::{SceneView, Viewport};
pub use render_control::{RenderControl, SceneViewKey, FrameInfo};
pub use mock_object_renderer::{MockObjectRenderer, DrawCall};
