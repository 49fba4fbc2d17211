/// FrameCallback — per-frame hooks registered on a Scene.
///
/// Each frame the render thread calls every registered callback of a scene
/// three times, in registration order:
///
/// 1. `on_pre_frame`, before the scene's render tasks run
/// 2. `on_pre_draw`, after the render tasks and before any view draws
/// 3. `on_post_frame`, once every view of the frame has drawn
///
/// The first two run inside the frame's write pass and may modify the
/// graph; the last runs in a read pass.

use std::time::Duration;
use slotmap::{new_key_type, SlotMap};
use super::scene_graph::SceneGraph;

new_key_type! {
    /// Key of a callback registered on a Scene.
    pub struct FrameCallbackKey;
}

/// Frame timing handed to frame callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Frame number, starting at 1
    pub frame: u64,
    /// Time since the first frame started
    pub elapsed: Duration,
    /// Time since the previous frame started (zero for the first frame)
    pub delta: Duration,
}

/// Hooks run on the render thread around each frame.
///
/// Every hook defaults to doing nothing. Hooks must not register or
/// unregister callbacks on their own scene.
pub trait FrameCallback: Send {
    fn on_pre_frame(&mut self, _graph: &mut SceneGraph, _time: &FrameTime) {}

    fn on_pre_draw(&mut self, _graph: &mut SceneGraph, _time: &FrameTime) {}

    fn on_post_frame(&mut self, _graph: &SceneGraph, _time: &FrameTime) {}
}

/// Registered callbacks of one scene, in registration order.
pub(crate) struct FrameCallbackRegistry {
    callbacks: SlotMap<FrameCallbackKey, Box<dyn FrameCallback>>,
    order: Vec<FrameCallbackKey>,
}

impl FrameCallbackRegistry {
    pub(crate) fn new() -> Self {
        Self {
            callbacks: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    pub(crate) fn register(&mut self, callback: Box<dyn FrameCallback>) -> FrameCallbackKey {
        let key = self.callbacks.insert(callback);
        self.order.push(key);
        key
    }

    pub(crate) fn unregister(&mut self, key: FrameCallbackKey) -> bool {
        if self.callbacks.remove(key).is_none() {
            return false;
        }
        self.order.retain(|&other| other != key);
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    pub(crate) fn run_pre_frame(&mut self, graph: &mut SceneGraph, time: &FrameTime) {
        for key in &self.order {
            if let Some(callback) = self.callbacks.get_mut(*key) {
                callback.on_pre_frame(graph, time);
            }
        }
    }

    pub(crate) fn run_pre_draw(&mut self, graph: &mut SceneGraph, time: &FrameTime) {
        for key in &self.order {
            if let Some(callback) = self.callbacks.get_mut(*key) {
                callback.on_pre_draw(graph, time);
            }
        }
    }

    pub(crate) fn run_post_frame(&mut self, graph: &SceneGraph, time: &FrameTime) {
        for key in &self.order {
            if let Some(callback) = self.callbacks.get_mut(*key) {
                callback.on_post_frame(graph, time);
            }
        }
    }
}

impl Default for FrameCallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "frame_callback_tests.rs"]
mod tests;
