/// Configuration descriptors for scenes, spatial indices, locks and cameras.
///
/// Plain structs with `Default` implementations; fields are public so
/// callers can use struct update syntax.

use std::time::Duration;
use glam::DVec3;
use crate::bounds::AABB;
use crate::error::{Error, Result};
use crate::scene::{FlatIndex, PartitionIndex, SpatialIndex};

// ===== AXES =====

/// One of the three world axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Component index (0, 1, 2).
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// World axis a direction vector is most aligned with.
    pub fn dominant(direction: DVec3) -> Axis {
        let abs = direction.abs();
        if abs.x >= abs.y && abs.x >= abs.z {
            Axis::X
        } else if abs.y >= abs.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }
}

/// Right / up / forward basis of the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldAxes {
    right: DVec3,
    up: DVec3,
    forward: DVec3,
}

impl WorldAxes {
    /// Build a basis, normalizing each axis.
    ///
    /// # Errors
    ///
    /// `PreconditionViolation` if an axis is degenerate or the three axes
    /// are not mutually orthogonal.
    pub fn new(right: DVec3, up: DVec3, forward: DVec3) -> Result<Self> {
        const TOLERANCE: f64 = 1e-9;

        let (Some(right), Some(up), Some(forward)) =
            (right.try_normalize(), up.try_normalize(), forward.try_normalize())
        else {
            return Err(Error::PreconditionViolation(
                "world axes must be non-zero vectors".to_string(),
            ));
        };

        if right.dot(up).abs() > TOLERANCE
            || right.dot(forward).abs() > TOLERANCE
            || up.dot(forward).abs() > TOLERANCE
        {
            return Err(Error::PreconditionViolation(format!(
                "world axes must be orthogonal: right {:?}, up {:?}, forward {:?}",
                right, up, forward
            )));
        }

        Ok(Self { right, up, forward })
    }

    pub fn right(&self) -> DVec3 {
        self.right
    }

    pub fn up(&self) -> DVec3 {
        self.up
    }

    pub fn forward(&self) -> DVec3 {
        self.forward
    }

    /// World axis closest to `up`; the default axis a quad-tree ignores.
    pub fn up_axis(&self) -> Axis {
        Axis::dominant(self.up)
    }
}

impl Default for WorldAxes {
    /// +X right, +Y up, +Z forward.
    fn default() -> Self {
        Self {
            right: DVec3::X,
            up: DVec3::Y,
            forward: DVec3::Z,
        }
    }
}

// ===== SPATIAL INDEX =====

/// Default region for hierarchical indices.
pub const DEFAULT_WORLD_EXTENT: f64 = 1024.0;
/// Default maximum partition depth (root = 0).
pub const DEFAULT_MAX_DEPTH: u32 = 6;
/// Default member count above which a leaf partition splits.
pub const DEFAULT_SPLIT_THRESHOLD: usize = 8;

/// Which spatial index strategy a scene uses.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexConfig {
    /// Linear list, O(n) queries
    Flat,
    /// 3-axis split, 8 children per partition
    Octree {
        world_bounds: AABB,
        max_depth: u32,
        split_threshold: usize,
    },
    /// 2-axis split, 4 children per partition
    QuadTree {
        world_bounds: AABB,
        max_depth: u32,
        split_threshold: usize,
        ignored_axis: Axis,
    },
}

impl IndexConfig {
    /// Octree over `world_bounds` with default depth and threshold.
    pub fn octree(world_bounds: AABB) -> Self {
        IndexConfig::Octree {
            world_bounds,
            max_depth: DEFAULT_MAX_DEPTH,
            split_threshold: DEFAULT_SPLIT_THRESHOLD,
        }
    }

    /// Quad-tree over `world_bounds` ignoring the world's up axis.
    pub fn quad_tree(world_bounds: AABB, axes: &WorldAxes) -> Self {
        IndexConfig::QuadTree {
            world_bounds,
            max_depth: DEFAULT_MAX_DEPTH,
            split_threshold: DEFAULT_SPLIT_THRESHOLD,
            ignored_axis: axes.up_axis(),
        }
    }

    /// Instantiate the configured strategy.
    pub fn build(&self) -> Box<dyn SpatialIndex> {
        match self {
            IndexConfig::Flat => Box::new(FlatIndex::new()),
            IndexConfig::Octree { world_bounds, max_depth, split_threshold } => {
                Box::new(PartitionIndex::octree(*world_bounds, *max_depth, *split_threshold))
            }
            IndexConfig::QuadTree { world_bounds, max_depth, split_threshold, ignored_axis } => {
                Box::new(PartitionIndex::quad_tree(
                    *world_bounds, *max_depth, *split_threshold, *ignored_axis,
                ))
            }
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig::Flat
    }
}

/// Default world region: a cube of `DEFAULT_WORLD_EXTENT` around the origin.
pub fn default_world_bounds() -> AABB {
    AABB::new(DVec3::splat(-DEFAULT_WORLD_EXTENT), DVec3::splat(DEFAULT_WORLD_EXTENT))
}

// ===== LOCK =====

/// Scene lock behaviour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LockConfig {
    /// How often a blocked acquisition re-checks its interrupt token
    pub poll_interval: Duration,
    /// Give up after this long; `None` waits until granted or interrupted
    pub timeout: Option<Duration>,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(5),
            timeout: None,
        }
    }
}

// ===== SCENE =====

/// Everything needed to create a `Scene`.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    /// Name used in log messages
    pub name: String,
    pub index: IndexConfig,
    pub lock: LockConfig,
    pub world_axes: WorldAxes,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            name: "scene".to_string(),
            index: IndexConfig::default(),
            lock: LockConfig::default(),
            world_axes: WorldAxes::default(),
        }
    }
}

// ===== CAMERA =====

/// Perspective parameters for new cameras.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    pub near_plane: f64,
    pub far_plane: f64,
    /// Vertical field of view in degrees
    pub field_of_view: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            near_plane: 1.0,
            far_plane: 120.0,
            field_of_view: 45.0,
        }
    }
}

// ===== RENDER CONTROL =====

/// Frame driver settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderControlConfig {
    /// Window over which frames are counted for the FPS figure
    pub fps_window: Duration,
    /// Logged at WARN when a frame takes longer than this
    pub slow_frame_threshold: Option<Duration>,
}

impl Default for RenderControlConfig {
    fn default() -> Self {
        Self {
            fps_window: Duration::from_secs(1),
            slow_frame_threshold: None,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
