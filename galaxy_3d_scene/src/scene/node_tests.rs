/// Tests for SceneNode and Transform

use glam::{DMat4, DQuat, DVec3};
use crate::bounds::AABB;
use crate::camera::Camera;
use super::*;

fn unit_box() -> AABB {
    AABB::new(DVec3::splat(-1.0), DVec3::splat(1.0))
}

// ============================================================================
// Transform
// ============================================================================

#[test]
fn test_transform_identity_matrix() {
    assert_eq!(Transform::default().matrix(), DMat4::IDENTITY);
}

#[test]
fn test_transform_matrix_is_trs() {
    let transform = Transform::from_position(DVec3::new(1.0, 2.0, 3.0))
        .with_orientation(DQuat::from_rotation_z(0.5))
        .with_scale(DVec3::splat(2.0));

    let expected = DMat4::from_translation(DVec3::new(1.0, 2.0, 3.0))
        * DMat4::from_quat(DQuat::from_rotation_z(0.5))
        * DMat4::from_scale(DVec3::splat(2.0));

    assert!(transform.matrix().abs_diff_eq(expected, 1e-12));
}

// ============================================================================
// SceneNode construction
// ============================================================================

#[test]
fn test_new_node_is_fully_dirty_group() {
    let node = SceneNode::new();
    assert!(!node.is_renderable());
    assert!(node.camera().is_none());
    assert!(node.local_bounds().is_none());
    assert!(node.parent().is_none());
    assert!(node.children().is_empty());
    assert_eq!(node.dirty(), NodeDirtyFlags::all());
}

#[test]
fn test_renderable_node() {
    let node = SceneNode::renderable(RenderableId(7), unit_box()).with_name("crate");
    assert_eq!(node.renderable_id(), Some(RenderableId(7)));
    assert_eq!(node.local_bounds(), Some(&unit_box()));
    assert_eq!(node.name(), Some("crate"));
}

#[test]
fn test_camera_node() {
    let node = SceneNode::camera_node(Camera::new());
    assert!(node.camera().is_some());
    assert!(!node.is_renderable());
}

// ============================================================================
// Derived state
// ============================================================================

#[test]
fn test_refresh_world_applies_parent_and_local() {
    let mut node = SceneNode::renderable(RenderableId(1), unit_box())
        .with_transform(Transform::from_position(DVec3::new(0.0, 0.0, 5.0)));
    let parent_world = DMat4::from_translation(DVec3::new(10.0, 0.0, 0.0));

    node.refresh_world(&parent_world);

    assert_eq!(node.world_position(), DVec3::new(10.0, 0.0, 5.0));
    assert_eq!(node.own_bounds().unwrap().min, DVec3::new(9.0, -1.0, 4.0));
    assert_eq!(node.dirty(), NodeDirtyFlags::empty());
}

#[test]
fn test_refresh_world_updates_camera() {
    let mut camera = Camera::new();
    camera.set_viewport_size(640, 480).unwrap();
    let mut node = SceneNode::camera_node(camera)
        .with_transform(Transform::from_position(DVec3::new(0.0, 1.0, 0.0)));

    node.refresh_world(&DMat4::IDENTITY);

    let camera = node.camera().unwrap();
    assert_eq!(camera.position(), DVec3::new(0.0, 1.0, 0.0));
    assert_eq!(*camera.view_matrix(), DMat4::from_translation(DVec3::new(0.0, -1.0, 0.0)));
}

#[test]
fn test_finish_bounds_cases() {
    let mut node = SceneNode::renderable(RenderableId(1), unit_box());
    node.refresh_world(&DMat4::IDENTITY);

    let child = AABB::new(DVec3::splat(2.0), DVec3::splat(3.0));
    node.finish_bounds(Some(child));
    assert_eq!(*node.bounds(), AABB::new(DVec3::splat(-1.0), DVec3::splat(3.0)));

    node.finish_bounds(None);
    assert_eq!(*node.bounds(), unit_box());

    let mut group = SceneNode::new().with_transform(Transform::from_position(DVec3::X));
    group.refresh_world(&DMat4::IDENTITY);
    group.finish_bounds(None);
    assert_eq!(*group.bounds(), AABB::from_point(DVec3::X));
}

#[test]
fn test_setters_mark_dirty() {
    let mut node = SceneNode::new();
    node.refresh_world(&DMat4::IDENTITY);

    node.set_position(DVec3::Y);
    assert!(node.dirty().contains(NodeDirtyFlags::TRANSFORM));

    node.set_local_bounds(Some(unit_box()));
    assert!(node.dirty().contains(NodeDirtyFlags::BOUNDS));
}
