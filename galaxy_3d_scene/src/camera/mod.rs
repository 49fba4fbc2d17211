//! Camera module — perspective camera component and frustum math.
//!
//! The camera lives on a scene node; the scene graph keeps its world
//! matrix current and the camera keeps its frustum current.

mod camera;
mod frustum;

pub use camera::Camera;
pub use frustum::{
    Frustum, Intersection,
    CORNER_NTL, CORNER_NTR, CORNER_NBR, CORNER_NBL,
    CORNER_FTL, CORNER_FTR, CORNER_FBR, CORNER_FBL,
    PLANE_LEFT, PLANE_RIGHT, PLANE_BOTTOM, PLANE_TOP, PLANE_NEAR, PLANE_FAR,
};
