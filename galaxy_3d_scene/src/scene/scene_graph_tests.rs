/// Tests for SceneGraph

use glam::DVec3;
use crate::bounds::AABB;
use crate::camera::Camera;
use crate::config::{default_world_bounds, IndexConfig};
use crate::error::Error;
use crate::log::LogContext;
use crate::scene::node::RenderableId;
use super::*;

// ============================================================================
// Helper Functions
// ============================================================================

fn flat_graph() -> SceneGraph {
    SceneGraph::from_config(&IndexConfig::Flat, LogContext::silent())
}

fn octree_graph() -> SceneGraph {
    SceneGraph::from_config(&IndexConfig::octree(default_world_bounds()), LogContext::silent())
}

fn unit_box() -> AABB {
    AABB::new(DVec3::splat(-1.0), DVec3::splat(1.0))
}

fn object_at(id: u64, position: DVec3) -> SceneNode {
    SceneNode::renderable(RenderableId(id), unit_box())
        .with_transform(Transform::from_position(position))
}

/// Default camera at the origin looking down +Z (near 1, far 120).
fn camera() -> Camera {
    let mut camera = Camera::new();
    camera.set_viewport_size(1024, 768).unwrap();
    camera
}

fn visible_ids(graph: &SceneGraph, camera: &Camera) -> Vec<u64> {
    graph.visible_object_intersection(camera)
        .iter()
        .map(|object| object.renderable.0)
        .collect()
}

// ============================================================================
// Index membership
// ============================================================================

#[test]
fn test_insert_indexes_top_level_node() {
    let mut graph = flat_graph();
    let key = graph.insert(object_at(1, DVec3::new(0.0, 0.0, 10.0)));

    assert!(graph.contains(key));
    assert_eq!(graph.size(), 1);
    assert_eq!(graph.bounds(), Some(AABB::new(DVec3::new(-1.0, -1.0, 9.0), DVec3::new(1.0, 1.0, 11.0))));
}

#[test]
fn test_create_node_is_not_indexed() {
    let mut graph = flat_graph();
    let key = graph.create_node(object_at(1, DVec3::ZERO));

    assert!(!graph.contains(key));
    assert!(graph.is_empty());
    assert_eq!(graph.node_count(), 1);

    assert_eq!(graph.add(key), Ok(true));
    assert_eq!(graph.add(key), Ok(false));
    assert_eq!(graph.size(), 1);
}

#[test]
fn test_add_rejects_unknown_and_attached_nodes() {
    let mut graph = flat_graph();
    let parent = graph.insert(SceneNode::new());
    let child = graph.create_node(object_at(1, DVec3::ZERO));
    graph.attach_child(parent, child).unwrap();

    assert!(matches!(graph.add(child), Err(Error::PreconditionViolation(_))));

    graph.destroy_node(child);
    assert!(matches!(graph.add(child), Err(Error::PreconditionViolation(_))));
}

#[test]
fn test_remove_keeps_node() {
    let mut graph = flat_graph();
    let key = graph.insert(object_at(1, DVec3::ZERO));

    assert!(graph.remove(key));
    assert!(!graph.remove(key));
    assert!(graph.node(key).is_some());
    assert!(graph.bounds().is_none());
}

#[test]
fn test_clear_keeps_nodes() {
    let mut graph = flat_graph();
    graph.insert(object_at(1, DVec3::ZERO));
    graph.insert(object_at(2, DVec3::X));

    graph.clear();
    assert!(graph.is_empty());
    assert_eq!(graph.node_count(), 2);
}

// ============================================================================
// Bulk operations
// ============================================================================

#[test]
fn test_add_all_and_contains_all() {
    let mut graph = flat_graph();
    let a = graph.create_node(object_at(1, DVec3::ZERO));
    let b = graph.create_node(object_at(2, DVec3::X));

    assert_eq!(graph.add_all(&[a, b]), Ok(true));
    assert!(graph.contains_all(&[a, b]));
    assert_eq!(graph.add_all(&[a, b]), Ok(false));
}

#[test]
fn test_add_all_is_all_or_nothing() {
    let mut graph = flat_graph();
    let a = graph.create_node(object_at(1, DVec3::ZERO));
    let parent = graph.insert(SceneNode::new());
    let child = graph.create_node(object_at(2, DVec3::X));
    graph.attach_child(parent, child).unwrap();

    assert!(graph.add_all(&[a, child]).is_err());
    assert!(!graph.contains(a));
}

#[test]
fn test_remove_all_and_retain_all() {
    let mut graph = flat_graph();
    let a = graph.insert(object_at(1, DVec3::ZERO));
    let b = graph.insert(object_at(2, DVec3::X));
    let c = graph.insert(object_at(3, DVec3::Y));

    assert!(graph.retain_all(&[a, b]));
    assert!(!graph.contains(c));
    assert!(!graph.retain_all(&[a, b]));

    assert!(graph.remove_all(&[a, c]));
    assert!(!graph.remove_all(&[a, c]));
    assert!(graph.contains_all(&[b]));
    assert!(!graph.contains_all(&[a, b]));
}

// ============================================================================
// Hierarchy
// ============================================================================

#[test]
fn test_attach_child_composes_world_matrix() {
    let mut graph = flat_graph();
    let parent = graph.insert(SceneNode::new().with_transform(Transform::from_position(DVec3::new(10.0, 0.0, 0.0))));
    let child = graph.create_node(object_at(1, DVec3::new(0.0, 5.0, 0.0)));

    assert_eq!(graph.attach_child(parent, child), Ok(true));
    assert_eq!(graph.attach_child(parent, child), Ok(false));
    graph.update_graph();

    assert_eq!(graph.parent(child), Some(parent));
    assert_eq!(graph.children(parent), &[child]);
    assert_eq!(graph.node(child).unwrap().world_position(), DVec3::new(10.0, 5.0, 0.0));

    // Parent bounds (and the index aggregate) now cover the child
    let bounds = graph.bounds().unwrap();
    assert!(bounds.contains(&AABB::new(DVec3::new(9.0, 4.0, -1.0), DVec3::new(11.0, 6.0, 1.0))));
    assert!(graph.validate_bounds());
}

#[test]
fn test_attach_rejects_cycles() {
    let mut graph = flat_graph();
    let a = graph.insert(SceneNode::new());
    let b = graph.create_node(SceneNode::new());
    let c = graph.create_node(SceneNode::new());
    graph.attach_child(a, b).unwrap();
    graph.attach_child(b, c).unwrap();

    assert!(matches!(graph.attach_child(a, a), Err(Error::PreconditionViolation(_))));
    // a is indexed, so rejected before the cycle walk; unindex it first
    graph.remove(a);
    assert!(matches!(graph.attach_child(c, a), Err(Error::PreconditionViolation(_))));
}

#[test]
fn test_attach_rejects_second_parent_and_indexed_child() {
    let mut graph = flat_graph();
    let a = graph.insert(SceneNode::new());
    let b = graph.insert(SceneNode::new());
    let child = graph.create_node(SceneNode::new());
    graph.attach_child(a, child).unwrap();

    assert!(graph.attach_child(b, child).is_err());
    assert!(graph.attach_child(a, b).is_err());
}

#[test]
fn test_detach_child() {
    let mut graph = flat_graph();
    let parent = graph.insert(SceneNode::new().with_transform(Transform::from_position(DVec3::X)));
    let child = graph.create_node(object_at(1, DVec3::ZERO));
    graph.attach_child(parent, child).unwrap();
    graph.update_graph();

    assert!(graph.detach_child(child));
    assert!(!graph.detach_child(child));
    graph.update_graph();

    assert!(graph.children(parent).is_empty());
    assert_eq!(graph.node(child).unwrap().world_position(), DVec3::ZERO);
    assert!(!graph.contains(child));
}

#[test]
fn test_destroy_node_removes_subtree() {
    let mut graph = flat_graph();
    let root = graph.insert(SceneNode::new());
    let mid = graph.create_node(SceneNode::new());
    let leaf = graph.create_node(object_at(1, DVec3::ZERO));
    graph.attach_child(root, mid).unwrap();
    graph.attach_child(mid, leaf).unwrap();

    assert!(graph.destroy_node(mid));
    assert!(graph.node(mid).is_none());
    assert!(graph.node(leaf).is_none());
    assert!(graph.children(root).is_empty());

    assert!(graph.destroy_node(root));
    assert!(graph.is_empty());
    assert!(!graph.destroy_node(root));
}

// ============================================================================
// Modification / update_graph
// ============================================================================

#[test]
fn test_set_transform_updates_index_after_update_graph() {
    let mut graph = octree_graph();
    let key = graph.insert(object_at(1, DVec3::new(0.0, 0.0, 50.0)));

    graph.set_transform(key, Transform::from_position(DVec3::new(0.0, 0.0, -50.0))).unwrap();
    // Not yet resolved
    assert_eq!(graph.bounds().unwrap().center(), DVec3::new(0.0, 0.0, 50.0));

    assert_eq!(graph.update_graph(), 1);
    assert_eq!(graph.bounds().unwrap().center(), DVec3::new(0.0, 0.0, -50.0));
    assert_eq!(graph.update_graph(), 0);
    assert!(graph.validate_bounds());
}

#[test]
fn test_modify_node_unknown_key_fails() {
    let mut graph = flat_graph();
    let key = graph.insert(SceneNode::new());
    graph.destroy_node(key);

    assert!(graph.modify_node(key, |node| node.set_position(DVec3::X)).is_err());
}

#[test]
fn test_modify_camera_requires_camera() {
    let mut graph = flat_graph();
    let plain = graph.insert(SceneNode::new());
    let with_camera = graph.create_node(SceneNode::camera_node(Camera::new()));

    assert!(graph.modify_camera(plain, |camera| camera.set_viewport_size(800, 600)).is_err());
    assert!(graph.modify_camera(with_camera, |camera| camera.set_viewport_size(800, 600)).is_ok());
    assert_eq!(graph.camera(with_camera).unwrap().viewport_size(), Some((800, 600)));

    // Errors from the modifier are forwarded
    assert!(graph.modify_camera(with_camera, |camera| camera.set_near_plane(-1.0)).is_err());
}

#[test]
fn test_recalculate_bounds() {
    let mut graph = octree_graph();
    graph.insert(object_at(1, DVec3::new(0.0, 0.0, 50.0)));
    graph.insert(object_at(2, DVec3::new(0.0, 0.0, -50.0)));

    let before = graph.bounds();
    graph.recalculate_bounds(true);
    assert_eq!(graph.bounds(), before);
    graph.recalculate_bounds(false);
    assert_eq!(graph.bounds(), before);
}

// ============================================================================
// Visibility
// ============================================================================

#[test]
fn test_visible_object_intersection_culls() {
    for mut graph in [flat_graph(), octree_graph()] {
        graph.insert(object_at(1, DVec3::new(0.0, 0.0, 30.0)));
        graph.insert(object_at(2, DVec3::new(0.0, 0.0, -30.0)));
        graph.insert(object_at(3, DVec3::new(0.0, 0.0, 500.0)));

        assert_eq!(visible_ids(&graph, &camera()), vec![1]);
    }
}

#[test]
fn test_visible_children_of_straddling_group() {
    let mut graph = flat_graph();
    let group = graph.insert(SceneNode::new());
    let front = graph.create_node(object_at(1, DVec3::new(0.0, 0.0, 30.0)));
    let back = graph.create_node(object_at(2, DVec3::new(0.0, 0.0, -30.0)));
    let front_child = graph.create_node(object_at(3, DVec3::new(0.0, 0.0, 5.0)));
    graph.attach_child(group, front).unwrap();
    graph.attach_child(group, back).unwrap();
    graph.attach_child(front, front_child).unwrap();
    graph.update_graph();

    // Depth-first, child order
    assert_eq!(visible_ids(&graph, &camera()), vec![1, 3]);
}

#[test]
fn test_visible_follows_camera_node() {
    let mut graph = flat_graph();
    graph.insert(object_at(1, DVec3::new(0.0, 0.0, -50.0)));
    graph.insert(object_at(2, DVec3::new(0.0, 0.0, 30.0)));
    let camera_key = graph.insert(
        SceneNode::camera_node(camera()).with_transform(Transform::from_position(DVec3::new(0.0, 0.0, -100.0))),
    );
    graph.update_graph();

    let camera = graph.camera(camera_key).unwrap();
    assert_eq!(camera.position(), DVec3::new(0.0, 0.0, -100.0));
    assert_eq!(visible_ids(&graph, camera), vec![1]);
}

#[test]
fn test_visible_objects_carry_world_state() {
    let mut graph = flat_graph();
    let key = graph.insert(object_at(9, DVec3::new(1.0, 2.0, 20.0)));

    let objects = graph.visible_object_intersection(&camera());
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].node, key);
    assert_eq!(objects[0].world_matrix.w_axis.truncate(), DVec3::new(1.0, 2.0, 20.0));
    assert_eq!(objects[0].bounds.center(), DVec3::new(1.0, 2.0, 20.0));
}
