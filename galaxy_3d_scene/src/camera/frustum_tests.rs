use glam::DVec3;
use crate::bounds::AABB;
use crate::error::Error;
use super::*;

const EPSILON: f64 = 1e-14;

// ============================================================================
// Helper Functions
// ============================================================================

/// Box-shaped frustum: x,y in [-1, 1], z from 1 (near) to 120 (far).
fn orthographic_corners() -> [DVec3; 8] {
    [
        DVec3::new(-1.0, 1.0, 1.0),    // NTL
        DVec3::new(1.0, 1.0, 1.0),     // NTR
        DVec3::new(1.0, -1.0, 1.0),    // NBR
        DVec3::new(-1.0, -1.0, 1.0),   // NBL
        DVec3::new(-1.0, 1.0, 120.0),  // FTL
        DVec3::new(1.0, 1.0, 120.0),   // FTR
        DVec3::new(1.0, -1.0, 120.0),  // FBR
        DVec3::new(-1.0, -1.0, 120.0), // FBL
    ]
}

/// Pyramid-shaped frustum: ±0.828 x / ±0.414 y at z=1, scaled at z=120.
fn perspective_corners() -> [DVec3; 8] {
    let (x, y) = (0.828, 0.414);
    let far = 120.0;
    [
        DVec3::new(-x, y, 1.0),
        DVec3::new(x, y, 1.0),
        DVec3::new(x, -y, 1.0),
        DVec3::new(-x, -y, 1.0),
        DVec3::new(-x * far, y * far, far),
        DVec3::new(x * far, y * far, far),
        DVec3::new(x * far, -y * far, far),
        DVec3::new(-x * far, -y * far, far),
    ]
}

fn orthographic() -> Frustum {
    Frustum::from_corner_array(orthographic_corners())
}

fn boxed(min: (f64, f64, f64), max: (f64, f64, f64)) -> AABB {
    AABB::new(DVec3::new(min.0, min.1, min.2), DVec3::new(max.0, max.1, max.2))
}

fn assert_plane(frustum: &Frustum, index: usize, normal: DVec3, d: f64) {
    let plane = frustum.plane(index);
    assert!(
        (plane.normal - normal).abs().max_element() < EPSILON,
        "plane {} normal {:?} != {:?}", index, plane.normal, normal,
    );
    assert!((plane.d - d).abs() < EPSILON, "plane {} d {} != {}", index, plane.d, d);
}

// ============================================================================
// Frustum::from_corners
// ============================================================================

#[test]
fn test_orthographic_plane_derivation() {
    let frustum = orthographic();

    assert_plane(&frustum, PLANE_LEFT, DVec3::new(1.0, 0.0, 0.0), 1.0);
    assert_plane(&frustum, PLANE_RIGHT, DVec3::new(-1.0, 0.0, 0.0), 1.0);
    assert_plane(&frustum, PLANE_BOTTOM, DVec3::new(0.0, 1.0, 0.0), 1.0);
    assert_plane(&frustum, PLANE_TOP, DVec3::new(0.0, -1.0, 0.0), 1.0);
    assert_plane(&frustum, PLANE_NEAR, DVec3::new(0.0, 0.0, 1.0), -1.0);
    assert_plane(&frustum, PLANE_FAR, DVec3::new(0.0, 0.0, -1.0), 120.0);
}

#[test]
fn test_perspective_normals_point_inward() {
    let frustum = Frustum::from_corner_array(perspective_corners());
    let inside = DVec3::new(0.0, 0.0, 60.0);
    for plane in frustum.planes() {
        assert!((plane.normal.length() - 1.0).abs() < 1e-12, "plane normal should be unit length");
        assert!(plane.distance(inside) > 0.0, "normal should face the interior");
    }
}

#[test]
fn test_from_corners_rejects_wrong_length() {
    let corners = orthographic_corners();

    let result = Frustum::from_corners(&corners[..7]);
    assert!(matches!(result, Err(Error::PreconditionViolation(_))));

    let mut too_many = corners.to_vec();
    too_many.push(DVec3::ZERO);
    assert!(Frustum::from_corners(&too_many).is_err());

    assert!(Frustum::from_corners(&corners).is_ok());
}

#[test]
fn test_update_keeps_frustum_on_error() {
    let mut frustum = orthographic();
    let before = frustum;

    assert!(frustum.update(&[DVec3::ZERO; 3]).is_err());
    assert_eq!(frustum, before);

    frustum.update(&perspective_corners()).unwrap();
    assert_eq!(frustum.corners()[CORNER_FBL], perspective_corners()[CORNER_FBL]);
}

// ============================================================================
// Frustum::intersect_bounds
// ============================================================================

#[test]
fn test_orthographic_box_inside() {
    let aabb = boxed((-0.5, -0.5, 2.0), (0.5, 0.5, 3.0));
    assert_eq!(orthographic().intersect_bounds(&aabb), Intersection::Inside);
}

#[test]
fn test_orthographic_box_outside() {
    let aabb = boxed((-0.5, -0.5, -1.0), (0.5, 0.5, 0.0));
    assert_eq!(orthographic().intersect_bounds(&aabb), Intersection::Outside);
}

#[test]
fn test_orthographic_box_intersect() {
    let aabb = boxed((-0.5, -0.5, 0.0), (0.5, 0.5, 5.0));
    assert_eq!(orthographic().intersect_bounds(&aabb), Intersection::Intersect);
}

#[test]
fn test_intersect_does_not_hide_later_outside_plane() {
    // Straddles the near plane but lies beyond the right plane
    let aabb = boxed((3.0, -0.5, 0.0), (4.0, 0.5, 5.0));
    assert_eq!(orthographic().intersect_bounds(&aabb), Intersection::Outside);
}

#[test]
fn test_box_enclosing_frustum_intersects() {
    let aabb = boxed((-10.0, -10.0, -10.0), (10.0, 10.0, 200.0));
    assert_eq!(orthographic().intersect_bounds(&aabb), Intersection::Intersect);
    assert!(orthographic().intersects_bounds(&aabb));
}

#[test]
fn test_perspective_box_inside() {
    let frustum = Frustum::from_corner_array(perspective_corners());
    let aabb = boxed((-1.0, -1.0, 110.0), (1.0, 1.0, 111.0));
    assert_eq!(frustum.intersect_bounds(&aabb), Intersection::Inside);
}

#[test]
fn test_perspective_box_beside_narrow_near_end() {
    let frustum = Frustum::from_corner_array(perspective_corners());
    let aabb = boxed((-1.0, -1.0, 1.0), (1.0, 1.0, 1.5));
    assert_eq!(frustum.intersect_bounds(&aabb), Intersection::Intersect);
}

// ============================================================================
// Frustum::intersect_sphere
// ============================================================================

#[test]
fn test_sphere_classification() {
    let frustum = orthographic();
    assert_eq!(frustum.intersect_sphere(DVec3::new(0.0, 0.0, 1.5), 0.25), Intersection::Inside);
    assert_eq!(frustum.intersect_sphere(DVec3::new(0.0, 0.0, 1.0), 2.0), Intersection::Intersect);
    assert_eq!(frustum.intersect_sphere(DVec3::new(2.0, 2.0, 0.5), 0.1), Intersection::Outside);
}

#[test]
fn test_sphere_touching_plane_intersects() {
    // Center 0.5 in front of the near plane, radius exactly 0.5
    let frustum = orthographic();
    assert_eq!(frustum.intersect_sphere(DVec3::new(0.0, 0.0, 1.5), 0.5), Intersection::Intersect);
}

// ============================================================================
// Frustum::intersect_point
// ============================================================================

#[test]
fn test_point_classification() {
    let frustum = orthographic();

    assert_eq!(frustum.intersect_point(DVec3::new(0.0, 0.0, 1.5)), Intersection::Inside);
    assert_eq!(frustum.intersect_point(DVec3::new(0.0, 0.0, 1.0)), Intersection::Inside);

    for outside in [
        DVec3::new(2.0, 0.0, 0.0),
        DVec3::new(-2.0, 0.0, 0.0),
        DVec3::new(0.0, 2.0, 0.0),
        DVec3::new(0.0, -2.0, 0.0),
        DVec3::new(0.0, 0.0, 122.0),
        DVec3::new(0.0, 0.0, -2.0),
    ] {
        assert_eq!(frustum.intersect_point(outside), Intersection::Outside, "{:?}", outside);
    }
}
