/// Scene — a scene graph behind a read/write lock plus its task queue.
///
/// The render thread takes read passes (visibility and rendering) and
/// drains render tasks in a write pass once per frame. Application threads
/// either submit `RenderTask`s (non-blocking) or take a write pass directly
/// with `request_modifications()`. Frame callbacks registered on the scene
/// run around each frame (see `FrameCallback`).
///
/// Every write pass ends with `SceneGraph::update_graph()`, run when the
/// `SceneWriteGuard` is dropped, so read passes always see resolved world
/// matrices, bounds and camera frusta.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use crate::config::{SceneConfig, WorldAxes};
use crate::error::Result;
use crate::log::LogContext;
use crate::sync::{InterruptToken, ReadGuard, SceneLock, WriteGuard};
use crate::{engine_debug, engine_error, engine_info, engine_trace, engine_warn};
use super::frame_callback::{FrameCallback, FrameCallbackKey, FrameCallbackRegistry, FrameTime};
use super::render_task::{RenderTask, RenderTaskQueue};
use super::scene_graph::SceneGraph;

const SOURCE: &str = "galaxy3d::Scene";

/// Shared read access to a scene graph.
pub type SceneReadGuard<'a> = ReadGuard<'a, SceneGraph>;

/// Exclusive access to a scene graph.
///
/// Resolves pending changes (`update_graph()`) before releasing the lock.
pub struct SceneWriteGuard<'a> {
    guard: WriteGuard<'a, SceneGraph>,
}

impl Deref for SceneWriteGuard<'_> {
    type Target = SceneGraph;

    fn deref(&self) -> &SceneGraph {
        &self.guard
    }
}

impl DerefMut for SceneWriteGuard<'_> {
    fn deref_mut(&mut self) -> &mut SceneGraph {
        &mut self.guard
    }
}

impl Drop for SceneWriteGuard<'_> {
    fn drop(&mut self) {
        // A panicking writer may have left the graph half-modified
        if !std::thread::panicking() {
            self.guard.update_graph();
        }
    }
}

/// A lockable scene graph with a render task queue.
pub struct Scene {
    name: String,
    world_axes: WorldAxes,
    lock: SceneLock<SceneGraph>,
    tasks: RenderTaskQueue,
    /// Never held while waiting for the scene lock
    frame_callbacks: Mutex<FrameCallbackRegistry>,
    log: LogContext,
}

impl Scene {
    /// Create an empty scene.
    ///
    /// # Arguments
    ///
    /// * `config` - Name, index strategy, lock behaviour and world axes
    /// * `log` - Logging context shared with the scene graph
    pub fn new(config: SceneConfig, log: LogContext) -> Self {
        let graph = SceneGraph::from_config(&config.index, log.clone());
        engine_debug!(log, SOURCE, "Created scene '{}' ({:?} index)", config.name, config.index);
        Self {
            name: config.name,
            world_axes: config.world_axes,
            lock: SceneLock::new(graph, config.lock),
            tasks: RenderTaskQueue::new(),
            frame_callbacks: Mutex::new(FrameCallbackRegistry::new()),
            log,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn world_axes(&self) -> &WorldAxes {
        &self.world_axes
    }

    pub fn log(&self) -> &LogContext {
        &self.log
    }

    // ===== LOCKING =====

    /// Block until a read pass may start.
    ///
    /// # Errors
    ///
    /// `Interrupted`, `LockTimeout` (configured timeout) or `LockReentry`
    /// (this thread holds the write lock).
    pub fn acquire_read_lock(&self, token: &InterruptToken) -> Result<SceneReadGuard<'_>> {
        self.lock.read(token)
    }

    /// Like `acquire_read_lock`, giving up after `timeout`.
    pub fn try_acquire_read_lock_for(&self, token: &InterruptToken, timeout: Duration) -> Result<SceneReadGuard<'_>> {
        self.lock.try_read_for(token, timeout)
    }

    /// Block until a write pass may start.
    ///
    /// # Errors
    ///
    /// `Interrupted`, `LockTimeout` (configured timeout) or `LockReentry`
    /// (this thread already holds a lock on this scene).
    pub fn acquire_write_lock(&self, token: &InterruptToken) -> Result<SceneWriteGuard<'_>> {
        Ok(SceneWriteGuard { guard: self.lock.write(token)? })
    }

    /// Like `acquire_write_lock`, giving up after `timeout`.
    pub fn try_acquire_write_lock_for(&self, token: &InterruptToken, timeout: Duration) -> Result<SceneWriteGuard<'_>> {
        Ok(SceneWriteGuard { guard: self.lock.try_write_for(token, timeout)? })
    }

    /// Run `modifier` in a write pass.
    ///
    /// The graph is updated and the lock released on every exit path.
    pub fn request_modifications<R>(
        &self,
        token: &InterruptToken,
        modifier: impl FnOnce(&mut SceneGraph) -> Result<R>,
    ) -> Result<R> {
        let mut graph = self.acquire_write_lock(token)?;
        modifier(&mut *graph)
    }

    // ===== RENDER TASKS =====

    /// Queue a task for the next frame.
    ///
    /// Returns `false` (dropping the task) if the scene is shut down.
    pub fn submit(&self, task: RenderTask) -> bool {
        let accepted = self.tasks.submit(task);
        if !accepted {
            engine_warn!(self.log, SOURCE, "Scene '{}' is shut down, render task rejected", self.name);
        }
        accepted
    }

    /// Run every pending task in one write pass (render thread).
    ///
    /// Tasks run in submission order. A failing task is logged and does not
    /// stop the others. Returns the number of tasks executed.
    ///
    /// # Errors
    ///
    /// Only lock acquisition errors; pending tasks stay queued in that case.
    pub fn execute_render_tasks(&self, token: &InterruptToken) -> Result<usize> {
        if self.tasks.is_empty() {
            return Ok(0);
        }
        let mut graph = self.acquire_write_lock(token)?;
        Ok(self.run_tasks(&mut graph))
    }

    fn run_tasks(&self, graph: &mut SceneGraph) -> usize {
        let tasks = self.tasks.drain();
        let count = tasks.len();
        if count == 0 {
            return 0;
        }

        for task in tasks {
            let name = task.name().unwrap_or("<unnamed>").to_string();
            if let Err(error) = task.run(graph) {
                engine_error!(self.log, SOURCE, "Render task '{}' failed in scene '{}': {}", name, self.name, error);
            }
        }
        engine_trace!(self.log, SOURCE, "Executed {} render task(s) in scene '{}'", count, self.name);
        count
    }

    // ===== FRAME CALLBACKS =====

    fn lock_callbacks(&self) -> MutexGuard<'_, FrameCallbackRegistry> {
        self.frame_callbacks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register hooks run around every frame, after the ones already
    /// registered. Callable from any thread.
    pub fn register_frame_callback(&self, callback: impl FrameCallback + 'static) -> FrameCallbackKey {
        let key = self.lock_callbacks().register(Box::new(callback));
        engine_debug!(self.log, SOURCE, "Registered frame callback in scene '{}'", self.name);
        key
    }

    /// Returns `false` if `key` is not registered on this scene.
    pub fn unregister_frame_callback(&self, key: FrameCallbackKey) -> bool {
        self.lock_callbacks().unregister(key)
    }

    pub fn frame_callback_count(&self) -> usize {
        self.lock_callbacks().len()
    }

    /// Frame start write pass (render thread).
    ///
    /// Runs the pre-frame hooks, every pending render task, then the
    /// pre-draw hooks, all under one write lock. Without registered
    /// callbacks this is `execute_render_tasks`. Returns the number of
    /// tasks executed.
    ///
    /// # Errors
    ///
    /// Only lock acquisition errors; no hook or task runs in that case.
    pub fn begin_frame(&self, token: &InterruptToken, time: &FrameTime) -> Result<usize> {
        if self.lock_callbacks().is_empty() {
            return self.execute_render_tasks(token);
        }
        let mut graph = self.acquire_write_lock(token)?;
        self.lock_callbacks().run_pre_frame(&mut graph, time);
        // Callback mutex is not held while tasks run
        let count = self.run_tasks(&mut graph);
        self.lock_callbacks().run_pre_draw(&mut graph, time);
        Ok(count)
    }

    /// Frame end read pass (render thread): runs the post-frame hooks.
    ///
    /// Takes no lock when no callback is registered.
    ///
    /// # Errors
    ///
    /// Only lock acquisition errors.
    pub fn end_frame(&self, token: &InterruptToken, time: &FrameTime) -> Result<()> {
        if self.lock_callbacks().is_empty() {
            return Ok(());
        }
        let graph = self.acquire_read_lock(token)?;
        self.lock_callbacks().run_post_frame(&graph, time);
        Ok(())
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Stop accepting tasks and drop the pending ones.
    ///
    /// Returns the number of tasks dropped.
    pub fn shutdown(&self) -> usize {
        let dropped = self.tasks.shutdown();
        if dropped > 0 {
            engine_warn!(self.log, SOURCE, "Scene '{}' shut down with {} pending render task(s)", self.name, dropped);
        }
        engine_info!(self.log, SOURCE, "Scene '{}' shut down", self.name);
        dropped
    }

    pub fn is_shut_down(&self) -> bool {
        !self.tasks.is_accepting()
    }
}

#[cfg(test)]
#[path = "scene_tests.rs"]
mod tests;
