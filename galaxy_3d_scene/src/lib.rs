/*!
# Galaxy 3D Scene

Concurrent scene graph core for the Galaxy 3D engine.

This crate keeps the scene graph of a 3D application (node hierarchy,
bounding volumes, cameras) behind a per-scene read/write lock, answers
frustum-culled visibility queries through a pluggable spatial index, and
schedules scene mutations as render tasks executed on the render thread.

## Architecture

- **Scene**: lockable scene graph plus its render task queue and frame callbacks
- **SceneGraph**: node table, hierarchy and spatial index
- **SpatialIndex**: strategy trait (`FlatIndex`, octree / quad-tree `PartitionIndex`)
- **Camera / Frustum**: perspective camera component and plane math
- **SceneView**: renders one scene through one camera via an `ObjectRenderer`
- **RenderControl**: frame driver over every view of a render surface

Drawing is delegated to an application-supplied `ObjectRenderer`.
*/

// Internal modules
mod error;
pub mod log;
pub mod config;
pub mod bounds;
pub mod camera;
pub mod scene;
pub mod sync;
pub mod view;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging sub-module (types only, macros are exported at the crate root)
    pub mod log {
        pub use crate::log::{
            Logger, LogEntry, LogSeverity, DefaultLogger, NullLogger, LogContext,
        };
    }

    // Configuration descriptors
    pub mod config {
        pub use crate::config::*;
    }

    // Bounding volumes
    pub mod bounds {
        pub use crate::bounds::*;
    }

    // Camera and frustum
    pub mod camera {
        pub use crate::camera::*;
    }

    // Scene graph, spatial indices, render tasks
    pub mod scene {
        pub use crate::scene::*;
    }

    // Scene lock and interrupt token
    pub mod sync {
        pub use crate::sync::*;
    }

    // Scene views and frame driver
    pub mod view {
        pub use crate::view::*;
    }
}

// Re-export math library at crate root
pub use glam;
