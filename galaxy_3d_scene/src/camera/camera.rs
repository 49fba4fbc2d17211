/// Camera — perspective parameters, matrices and a world-space frustum.
///
/// A Camera is a component attached to a scene node. The scene graph feeds
/// it the node's world matrix through `model_matrix_updated()`; the camera
/// derives its view matrix (inverse world) and keeps its frustum current.
///
/// The camera looks down its local +Z axis: the near plane sits at
/// `z = near_plane`, the far plane at `z = far_plane`.
///
/// Every mutator leaves the frustum up to date. `camera_dirty` only decides
/// whether the local corners must be regenerated (parameters changed) or
/// merely re-transformed (world matrix changed).
///
/// The projection is either generated (field of view plus the viewport
/// aspect, or explicit horizontal / vertical angles) or supplied as a
/// matrix through `set_projection()`. For a supplied matrix the local
/// corners are the clip-space cube unprojected through its inverse, so
/// asymmetric and off-axis projections cull correctly.

use glam::{DMat4, DVec3};
use crate::config::CameraConfig;
use crate::error::{Error, Result};
use super::frustum::{
    Frustum,
    CORNER_NTL, CORNER_NTR, CORNER_NBR, CORNER_NBL,
    CORNER_FTL, CORNER_FTR, CORNER_FBR, CORNER_FBL,
};

/// Where the projection matrix comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ProjectionSource {
    /// Field of view and the viewport's aspect ratio
    Viewport,
    /// Explicit angles; the aspect is fixed by them
    Angles { aspect: f64 },
    /// Caller-supplied matrix
    Explicit,
}

/// Perspective camera component.
#[derive(Debug, Clone)]
pub struct Camera {
    near_plane: f64,
    far_plane: f64,
    /// Vertical field of view, in degrees
    field_of_view: f64,
    /// Last viewport size handed to `set_projection_matrix`
    viewport_size: Option<(u32, u32)>,
    /// `None` until a viewport size is known
    projection_matrix: Option<DMat4>,
    projection_source: ProjectionSource,
    view_matrix: DMat4,
    world_matrix: DMat4,
    /// Corners in camera-local space, regenerated when `camera_dirty`
    local_corners: [DVec3; 8],
    /// Corners transformed by the world matrix, planes derived from them
    frustum: Frustum,
    camera_dirty: bool,
}

impl Camera {
    /// Camera with the default parameters (near 1, far 120, fov 45°).
    pub fn new() -> Self {
        let defaults = CameraConfig::default();
        Self::build(defaults.near_plane, defaults.far_plane, defaults.field_of_view)
    }

    /// Camera from explicit parameters.
    ///
    /// # Errors
    ///
    /// `PreconditionViolation` unless `0 < near < far` and `0 < fov < 180`.
    pub fn with_config(config: &CameraConfig) -> Result<Self> {
        validate(config.near_plane, config.far_plane, config.field_of_view)?;
        Ok(Self::build(config.near_plane, config.far_plane, config.field_of_view))
    }

    fn build(near_plane: f64, far_plane: f64, field_of_view: f64) -> Self {
        let mut camera = Self {
            near_plane,
            far_plane,
            field_of_view,
            viewport_size: None,
            projection_matrix: None,
            projection_source: ProjectionSource::Viewport,
            view_matrix: DMat4::IDENTITY,
            world_matrix: DMat4::IDENTITY,
            local_corners: [DVec3::ZERO; 8],
            frustum: Frustum::from_corner_array([DVec3::ZERO; 8]),
            camera_dirty: true,
        };
        camera.update_frustum();
        camera
    }

    // ===== GETTERS =====

    pub fn near_plane(&self) -> f64 {
        self.near_plane
    }

    pub fn far_plane(&self) -> f64 {
        self.far_plane
    }

    /// Vertical field of view in degrees.
    pub fn field_of_view(&self) -> f64 {
        self.field_of_view
    }

    pub fn viewport_size(&self) -> Option<(u32, u32)> {
        self.viewport_size
    }

    /// Width / height of the generated projection: fixed by explicit
    /// angles, otherwise the last viewport's, 1.0 before the first one.
    pub fn aspect_ratio(&self) -> f64 {
        if let ProjectionSource::Angles { aspect } = self.projection_source {
            return aspect;
        }
        match self.viewport_size {
            Some((width, height)) => width as f64 / height as f64,
            None => 1.0,
        }
    }

    /// `true` when the projection was supplied through `set_projection()`.
    pub fn has_explicit_projection(&self) -> bool {
        self.projection_source == ProjectionSource::Explicit
    }

    /// `true` once a projection matrix exists.
    pub fn is_initialized(&self) -> bool {
        self.projection_matrix.is_some()
    }

    /// View matrix (inverse of the camera's world transform).
    pub fn view_matrix(&self) -> &DMat4 {
        &self.view_matrix
    }

    /// Projection matrix, `None` until a viewport size, explicit angles or
    /// an explicit matrix have been set.
    pub fn projection_matrix(&self) -> Option<&DMat4> {
        self.projection_matrix.as_ref()
    }

    /// Combined view-projection matrix (projection * view).
    pub fn view_projection_matrix(&self) -> Option<DMat4> {
        self.projection_matrix.map(|projection| projection * self.view_matrix)
    }

    pub fn world_matrix(&self) -> &DMat4 {
        &self.world_matrix
    }

    /// World-space camera position.
    pub fn position(&self) -> DVec3 {
        self.world_matrix.w_axis.truncate()
    }

    /// World-space frustum for culling.
    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// Frustum corners, either camera-local or world-space.
    pub fn frustum_corners(&self, world_space: bool) -> [DVec3; 8] {
        if world_space {
            *self.frustum.corners()
        } else {
            self.local_corners
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.camera_dirty
    }

    // ===== SETTERS =====

    /// Store the viewport size and field of view, derive the perspective
    /// projection, and refresh the frustum.
    ///
    /// # Errors
    ///
    /// `PreconditionViolation` on a zero-sized viewport or an invalid fov.
    pub fn set_projection_matrix(&mut self, field_of_view: f64, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(Error::PreconditionViolation(format!(
                "viewport must be non-empty, got {}x{}", width, height
            )));
        }
        validate(self.near_plane, self.far_plane, field_of_view)?;

        self.field_of_view = field_of_view;
        self.viewport_size = Some((width, height));
        self.projection_source = ProjectionSource::Viewport;
        self.parameters_changed();
        Ok(())
    }

    /// Use `projection` as is (stereo, off-axis, orthographic...).
    ///
    /// The camera becomes initialized and its frustum is the clip-space
    /// volume of `projection` (depth range 0..1) seen from the camera.
    /// Any later viewport or perspective call replaces it with a
    /// generated projection.
    ///
    /// # Errors
    ///
    /// `PreconditionViolation` if `projection` is not finite or not
    /// invertible.
    pub fn set_projection(&mut self, projection: DMat4) -> Result<()> {
        let determinant = projection.determinant();
        if !projection.is_finite() || determinant == 0.0 || !determinant.is_finite() {
            return Err(Error::PreconditionViolation(
                "projection matrix must be finite and invertible".to_string(),
            ));
        }
        self.projection_matrix = Some(projection);
        self.projection_source = ProjectionSource::Explicit;
        self.camera_dirty = true;
        self.update_frustum();
        Ok(())
    }

    /// Generated perspective from full horizontal and vertical angles, in
    /// degrees. The vertical angle becomes the field of view, the aspect
    /// ratio follows from the two angles instead of the viewport.
    ///
    /// # Errors
    ///
    /// `PreconditionViolation` unless both angles are in (0, 180).
    pub fn update_perspective(&mut self, horizontal_fov: f64, vertical_fov: f64) -> Result<()> {
        validate(self.near_plane, self.far_plane, horizontal_fov)?;
        validate(self.near_plane, self.far_plane, vertical_fov)?;

        let aspect = (horizontal_fov.to_radians() * 0.5).tan() / (vertical_fov.to_radians() * 0.5).tan();
        self.field_of_view = vertical_fov;
        self.projection_source = ProjectionSource::Angles { aspect };
        self.parameters_changed();
        Ok(())
    }

    /// `update_perspective` from the four half-angles around the view axis.
    pub fn update_perspective_angles(&mut self, left: f64, right: f64, bottom: f64, top: f64) -> Result<()> {
        self.update_perspective(left + right, bottom + top)
    }

    /// Surface resize entry point, keeps the current field of view.
    pub fn set_viewport_size(&mut self, width: u32, height: u32) -> Result<()> {
        self.set_projection_matrix(self.field_of_view, width, height)
    }

    pub fn set_near_plane(&mut self, near_plane: f64) -> Result<()> {
        self.set_clip_planes(near_plane, self.far_plane)
    }

    pub fn set_far_plane(&mut self, far_plane: f64) -> Result<()> {
        self.set_clip_planes(self.near_plane, far_plane)
    }

    /// Set both clip distances at once, so a move past the other plane
    /// does not trip validation halfway through.
    pub fn set_clip_planes(&mut self, near_plane: f64, far_plane: f64) -> Result<()> {
        validate(near_plane, far_plane, self.field_of_view)?;
        self.near_plane = near_plane;
        self.far_plane = far_plane;
        self.parameters_changed();
        Ok(())
    }

    pub fn set_field_of_view(&mut self, field_of_view: f64) -> Result<()> {
        validate(self.near_plane, self.far_plane, field_of_view)?;
        self.field_of_view = field_of_view;
        self.parameters_changed();
        Ok(())
    }

    /// The owning node's world matrix changed.
    pub fn model_matrix_updated(&mut self, world_matrix: DMat4) {
        self.world_matrix = world_matrix;
        self.view_matrix = world_matrix.inverse();
        self.update_frustum();
    }

    fn parameters_changed(&mut self) {
        // A supplied matrix only yields to generated parameters once a
        // viewport can size them
        if self.projection_source == ProjectionSource::Explicit && self.viewport_size.is_some() {
            self.projection_source = ProjectionSource::Viewport;
        }
        self.camera_dirty = true;
        self.update_projection();
        self.update_frustum();
    }

    fn update_projection(&mut self) {
        let generated = match self.projection_source {
            ProjectionSource::Viewport => self.viewport_size.is_some(),
            ProjectionSource::Angles { .. } => true,
            ProjectionSource::Explicit => false,
        };
        if generated {
            self.projection_matrix = Some(DMat4::perspective_lh(
                self.field_of_view.to_radians(),
                self.aspect_ratio(),
                self.near_plane,
                self.far_plane,
            ));
        }
    }

    /// Regenerate local corners if dirty, then move them into world space
    /// and rebuild the planes.
    pub fn update_frustum(&mut self) {
        if self.camera_dirty {
            self.local_corners = self.compute_local_corners();
            self.camera_dirty = false;
        }

        let world = self.world_matrix;
        let corners = self.local_corners.map(|corner| world.transform_point3(corner));
        self.frustum.set_corners(corners);
    }

    /// `height = 2·tan(fov/2)·distance`, `width = height·aspect`,
    /// symmetric about the +Z view axis.
    fn compute_local_corners(&self) -> [DVec3; 8] {
        if let (ProjectionSource::Explicit, Some(projection)) = (self.projection_source, self.projection_matrix) {
            return unproject_clip_cube(&projection);
        }

        let tan_half_fov = (self.field_of_view.to_radians() * 0.5).tan();
        let aspect = self.aspect_ratio();

        let mut corners = [DVec3::ZERO; 8];
        for (distance, [tl, tr, br, bl]) in [
            (self.near_plane, [CORNER_NTL, CORNER_NTR, CORNER_NBR, CORNER_NBL]),
            (self.far_plane, [CORNER_FTL, CORNER_FTR, CORNER_FBR, CORNER_FBL]),
        ] {
            let half_height = tan_half_fov * distance;
            let half_width = half_height * aspect;
            corners[tl] = DVec3::new(-half_width, half_height, distance);
            corners[tr] = DVec3::new(half_width, half_height, distance);
            corners[br] = DVec3::new(half_width, -half_height, distance);
            corners[bl] = DVec3::new(-half_width, -half_height, distance);
        }
        corners
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

/// Corners of the clip-space cube (x, y in -1..1, depth 0..1) mapped back
/// into camera space.
fn unproject_clip_cube(projection: &DMat4) -> [DVec3; 8] {
    let inverse = projection.inverse();
    let mut corners = [DVec3::ZERO; 8];
    for (depth, [tl, tr, br, bl]) in [
        (0.0, [CORNER_NTL, CORNER_NTR, CORNER_NBR, CORNER_NBL]),
        (1.0, [CORNER_FTL, CORNER_FTR, CORNER_FBR, CORNER_FBL]),
    ] {
        corners[tl] = inverse.project_point3(DVec3::new(-1.0, 1.0, depth));
        corners[tr] = inverse.project_point3(DVec3::new(1.0, 1.0, depth));
        corners[br] = inverse.project_point3(DVec3::new(1.0, -1.0, depth));
        corners[bl] = inverse.project_point3(DVec3::new(-1.0, -1.0, depth));
    }
    corners
}

fn validate(near_plane: f64, far_plane: f64, field_of_view: f64) -> Result<()> {
    if !(near_plane > 0.0 && near_plane < far_plane) {
        return Err(Error::PreconditionViolation(format!(
            "camera needs 0 < near < far, got near {} far {}", near_plane, far_plane
        )));
    }
    if !(field_of_view > 0.0 && field_of_view < 180.0) {
        return Err(Error::PreconditionViolation(format!(
            "field of view must be in (0, 180) degrees, got {}", field_of_view
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
