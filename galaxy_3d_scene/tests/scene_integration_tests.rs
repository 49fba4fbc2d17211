//! Integration tests for the scene pipeline
//!
//! These tests drive full frames through RenderControl: render tasks
//! submitted from application threads, camera movement, resizing, and
//! culling with every spatial index strategy. No GPU required.
//!
//! Run with: cargo test --test scene_integration_tests

use std::sync::Arc;
use std::thread;
use galaxy_3d_scene::galaxy3d::bounds::AABB;
use galaxy_3d_scene::galaxy3d::camera::Camera;
use galaxy_3d_scene::galaxy3d::config::{
    default_world_bounds, IndexConfig, RenderControlConfig, SceneConfig, WorldAxes,
};
use galaxy_3d_scene::galaxy3d::log::LogContext;
use galaxy_3d_scene::galaxy3d::scene::{
    NodeKey, RenderTask, RenderableId, Scene, SceneGraph, SceneNode, Transform,
};
use galaxy_3d_scene::galaxy3d::sync::InterruptToken;
use galaxy_3d_scene::galaxy3d::view::{MockObjectRenderer, RenderControl, SceneView};
use galaxy_3d_scene::glam::DVec3;

// ============================================================================
// HELPERS
// ============================================================================

fn all_index_configs() -> Vec<IndexConfig> {
    vec![
        IndexConfig::Flat,
        IndexConfig::octree(default_world_bounds()),
        IndexConfig::quad_tree(default_world_bounds(), &WorldAxes::default()),
    ]
}

fn create_scene(index: IndexConfig) -> Arc<Scene> {
    Arc::new(Scene::new(
        SceneConfig {
            name: "integration".to_string(),
            index,
            ..SceneConfig::default()
        },
        LogContext::silent(),
    ))
}

fn unit_object(id: u64, position: DVec3) -> SceneNode {
    SceneNode::renderable(RenderableId(id), AABB::new(DVec3::splat(-0.5), DVec3::splat(0.5)))
        .with_transform(Transform::from_position(position))
}

fn add_camera(scene: &Scene) -> NodeKey {
    scene
        .request_modifications(&InterruptToken::new(), |graph| {
            Ok(graph.create_node(SceneNode::camera_node(Camera::new()).with_name("main camera")))
        })
        .unwrap()
}

// ============================================================================
// FULL FRAME TESTS
// ============================================================================

#[test]
fn test_integration_grid_culling_all_strategies() {
    for index in all_index_configs() {
        let scene = create_scene(index.clone());
        let camera = add_camera(&scene);

        // 21 x 21 grid on the XZ plane, spacing 10, centred on the origin
        scene
            .request_modifications(&InterruptToken::new(), |graph| {
                let mut id = 0;
                for x in -10..=10 {
                    for z in -10..=10 {
                        graph.insert(unit_object(id, DVec3::new(x as f64 * 10.0, 0.0, z as f64 * 10.0)));
                        id += 1;
                    }
                }
                Ok(())
            })
            .unwrap();

        let mut control = RenderControl::new(RenderControlConfig::default(), LogContext::silent());
        control.add_scene_view(SceneView::new(Arc::clone(&scene), camera, LogContext::silent()));
        control.on_surface_size_changed(1024, 768).unwrap();

        let mut renderer = MockObjectRenderer::new();
        let info = control.render_frame(&mut renderer).unwrap();

        // Everything drawn is in front of the camera and within the far plane
        assert!(info.objects_drawn > 0, "{:?}", index);
        assert!(info.objects_drawn < 441, "{:?}", index);
        for call in &renderer.draws {
            let center = call.object.bounds.center();
            assert!(center.z > 0.0 && center.z <= 120.5, "{:?}: {:?}", index, center);
        }

        // Cross-check against a brute force frustum test
        let graph = scene.acquire_read_lock(&InterruptToken::new()).unwrap();
        let frustum = graph.camera(camera).unwrap().frustum().clone();
        let expected = graph
            .node_keys()
            .filter_map(|key| graph.node(key))
            .filter(|node| node.is_renderable())
            .filter(|node| frustum.intersects_bounds(node.bounds()))
            .count();
        assert_eq!(info.objects_drawn, expected, "{:?}", index);
    }
}

#[test]
fn test_integration_camera_moves_between_frames() {
    let scene = create_scene(IndexConfig::octree(default_world_bounds()));
    let camera = add_camera(&scene);
    scene
        .request_modifications(&InterruptToken::new(), |graph| {
            graph.insert(unit_object(1, DVec3::new(0.0, 0.0, 50.0)));
            graph.insert(unit_object(2, DVec3::new(0.0, 0.0, 300.0)));
            Ok(())
        })
        .unwrap();

    let mut control = RenderControl::new(RenderControlConfig::default(), LogContext::silent());
    control.add_scene_view(SceneView::new(Arc::clone(&scene), camera, LogContext::silent()));
    control.on_surface_size_changed(800, 600).unwrap();

    let mut renderer = MockObjectRenderer::new();
    control.render_frame(&mut renderer).unwrap();
    assert_eq!(renderer.drawn_ids(), vec![1]);

    // Move the camera forward through a render task
    scene.submit(RenderTask::named("dolly", move |graph: &mut SceneGraph| {
        graph.set_transform(camera, Transform::from_position(DVec3::new(0.0, 0.0, 250.0)))
    }));
    renderer.clear();
    let info = control.render_frame(&mut renderer).unwrap();

    assert_eq!(info.tasks_executed, 1);
    assert_eq!(renderer.drawn_ids(), vec![2]);
}

#[test]
fn test_integration_tasks_from_application_threads() {
    let scene = create_scene(IndexConfig::Flat);
    let camera = add_camera(&scene);

    let mut control = RenderControl::new(RenderControlConfig::default(), LogContext::silent());
    control.add_scene_view(SceneView::new(Arc::clone(&scene), camera, LogContext::silent()));
    control.on_surface_size_changed(640, 480).unwrap();

    let producers: Vec<_> = (0..4u64)
        .map(|thread_index| {
            let scene = Arc::clone(&scene);
            thread::spawn(move || {
                for i in 0..10u64 {
                    let id = thread_index * 100 + i;
                    let position = DVec3::new(0.0, 0.0, 10.0 + i as f64);
                    assert!(scene.submit(RenderTask::new(move |graph: &mut SceneGraph| {
                        graph.insert(unit_object(id, position));
                        Ok(())
                    })));
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    let mut renderer = MockObjectRenderer::new();
    let info = control.render_frame(&mut renderer).unwrap();

    assert_eq!(info.tasks_executed, 40);
    assert_eq!(info.objects_drawn, 40);
}

#[test]
fn test_integration_hierarchy_moves_with_parent() {
    let scene = create_scene(IndexConfig::quad_tree(default_world_bounds(), &WorldAxes::default()));
    let camera = add_camera(&scene);
    let parent = scene
        .request_modifications(&InterruptToken::new(), |graph| {
            let parent = graph.insert(SceneNode::new().with_name("ship"));
            let hull = graph.create_node(unit_object(1, DVec3::ZERO));
            let turret = graph.create_node(unit_object(2, DVec3::new(0.0, 1.0, 0.0)));
            graph.attach_child(parent, hull)?;
            graph.attach_child(hull, turret)?;
            Ok(parent)
        })
        .unwrap();

    let mut control = RenderControl::new(RenderControlConfig::default(), LogContext::silent());
    control.add_scene_view(SceneView::new(Arc::clone(&scene), camera, LogContext::silent()));
    control.on_surface_size_changed(640, 480).unwrap();

    // Parent at the origin: the whole ship sits on the camera plane, behind near
    let mut renderer = MockObjectRenderer::new();
    control.render_frame(&mut renderer).unwrap();
    assert!(renderer.drawn_ids().is_empty());

    scene
        .request_modifications(&InterruptToken::new(), |graph| {
            graph.set_transform(parent, Transform::from_position(DVec3::new(0.0, 0.0, 30.0)))
        })
        .unwrap();

    renderer.clear();
    control.render_frame(&mut renderer).unwrap();
    assert_eq!(renderer.drawn_ids(), vec![1, 2]);
    assert_eq!(renderer.draws[1].object.world_matrix.w_axis.truncate(), DVec3::new(0.0, 1.0, 30.0));

    let graph = scene.acquire_read_lock(&InterruptToken::new()).unwrap();
    assert!(graph.validate_bounds());
}
