//! Unit tests for config.rs

use std::time::Duration;
use glam::DVec3;
use crate::bounds::AABB;
use crate::config::*;
use crate::error::Error;

// ============================================================================
// Axis / WorldAxes
// ============================================================================

#[test]
fn test_axis_index_and_dominant() {
    assert_eq!(Axis::X.index(), 0);
    assert_eq!(Axis::Z.index(), 2);
    assert_eq!(Axis::dominant(DVec3::new(0.1, -3.0, 0.5)), Axis::Y);
    assert_eq!(Axis::dominant(DVec3::new(0.0, 0.0, -1.0)), Axis::Z);
}

#[test]
fn test_world_axes_default() {
    let axes = WorldAxes::default();
    assert_eq!(axes.right(), DVec3::X);
    assert_eq!(axes.up(), DVec3::Y);
    assert_eq!(axes.forward(), DVec3::Z);
    assert_eq!(axes.up_axis(), Axis::Y);
}

#[test]
fn test_world_axes_z_up() {
    let axes = WorldAxes::new(DVec3::X, DVec3::new(0.0, 0.0, 2.0), DVec3::Y).unwrap();
    assert_eq!(axes.up(), DVec3::Z);
    assert_eq!(axes.up_axis(), Axis::Z);
}

#[test]
fn test_world_axes_rejects_non_orthogonal() {
    let result = WorldAxes::new(DVec3::X, DVec3::new(1.0, 1.0, 0.0), DVec3::Z);
    assert!(matches!(result, Err(Error::PreconditionViolation(_))));
}

#[test]
fn test_world_axes_rejects_zero_axis() {
    assert!(WorldAxes::new(DVec3::X, DVec3::ZERO, DVec3::Z).is_err());
}

// ============================================================================
// IndexConfig
// ============================================================================

#[test]
fn test_index_config_default_is_flat() {
    assert_eq!(IndexConfig::default(), IndexConfig::Flat);
}

#[test]
fn test_quad_tree_config_follows_up_axis() {
    let bounds = default_world_bounds();
    let axes = WorldAxes::new(DVec3::X, DVec3::Z, DVec3::Y).unwrap();
    match IndexConfig::quad_tree(bounds, &axes) {
        IndexConfig::QuadTree { ignored_axis, max_depth, split_threshold, .. } => {
            assert_eq!(ignored_axis, Axis::Z);
            assert_eq!(max_depth, DEFAULT_MAX_DEPTH);
            assert_eq!(split_threshold, DEFAULT_SPLIT_THRESHOLD);
        }
        other => panic!("unexpected config {:?}", other),
    }
}

#[test]
fn test_build_creates_empty_indices() {
    let bounds = AABB::new(DVec3::splat(-10.0), DVec3::splat(10.0));
    for config in [
        IndexConfig::Flat,
        IndexConfig::octree(bounds),
        IndexConfig::quad_tree(bounds, &WorldAxes::default()),
    ] {
        let index = config.build();
        assert!(index.is_empty());
        assert!(index.bounds().is_none());
    }
}

// ============================================================================
// Defaults
// ============================================================================

#[test]
fn test_camera_config_defaults() {
    let config = CameraConfig::default();
    assert_eq!(config.near_plane, 1.0);
    assert_eq!(config.far_plane, 120.0);
    assert_eq!(config.field_of_view, 45.0);
}

#[test]
fn test_lock_and_scene_defaults() {
    let lock = LockConfig::default();
    assert_eq!(lock.poll_interval, Duration::from_millis(5));
    assert!(lock.timeout.is_none());

    let scene = SceneConfig::default();
    assert_eq!(scene.index, IndexConfig::Flat);
    assert_eq!(scene.world_axes, WorldAxes::default());

    let control = RenderControlConfig::default();
    assert_eq!(control.fps_window, Duration::from_secs(1));
}
