//! Scene management module
//!
//! Provides scene nodes, the scene graph with its spatial index strategies
//! (flat list, octree, quad-tree), render tasks, frame callbacks and the
//! lockable `Scene`.

mod node;
mod spatial_index;
mod flat_index;
mod partition_index;
mod scene_graph;
mod render_task;
mod frame_callback;
mod scene;

pub use node::{
    NodeKey, NodeDirtyFlags, RenderableId, RenderableObject, SceneNode, Transform,
};
pub use spatial_index::SpatialIndex;
pub use flat_index::FlatIndex;
pub use partition_index::{PartitionIndex, PartitionLayout};
pub use scene_graph::SceneGraph;
pub use render_task::{RenderTask, RenderTaskQueue};
pub use frame_callback::{FrameCallback, FrameCallbackKey, FrameTime};
pub use scene::{Scene, SceneReadGuard, SceneWriteGuard};
