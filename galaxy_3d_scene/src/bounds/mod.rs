//! Bounding volumes and plane math shared by the scene graph and the camera.

mod aabb;
mod plane;

pub use aabb::AABB;
pub use plane::Plane;
