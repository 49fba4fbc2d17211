/// RenderTask — deferred scene mutation executed on the render thread.
///
/// Application threads package their changes as tasks and submit them to
/// a `Scene`. The render thread drains the queue under the write lock at
/// the start of each frame, in submission order, so every task submitted
/// before a frame's read pass is visible to it.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use crate::error::Result;
use super::scene_graph::SceneGraph;

type TaskWork = Box<dyn FnOnce(&mut SceneGraph) -> Result<()> + Send>;
type TaskCallback = Box<dyn FnOnce(&Result<()>) + Send>;

/// A one-shot mutation of the scene graph.
pub struct RenderTask {
    name: Option<String>,
    work: TaskWork,
    /// Called on the render thread with the task outcome
    on_complete: Option<TaskCallback>,
}

impl RenderTask {
    pub fn new(work: impl FnOnce(&mut SceneGraph) -> Result<()> + Send + 'static) -> Self {
        Self {
            name: None,
            work: Box::new(work),
            on_complete: None,
        }
    }

    /// Task with a name used in log messages.
    pub fn named(
        name: impl Into<String>,
        work: impl FnOnce(&mut SceneGraph) -> Result<()> + Send + 'static,
    ) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(work)
        }
    }

    /// Register a completion callback, run right after the task.
    pub fn with_callback(mut self, callback: impl FnOnce(&Result<()>) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Execute the task, then its callback. Consumes the task.
    pub(crate) fn run(self, graph: &mut SceneGraph) -> Result<()> {
        let result = (self.work)(graph);
        if let Some(callback) = self.on_complete {
            callback(&result);
        }
        result
    }
}

impl fmt::Debug for RenderTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderTask")
            .field("name", &self.name)
            .field("has_callback", &self.on_complete.is_some())
            .finish_non_exhaustive()
    }
}

// ===== QUEUE =====

struct QueueState {
    tasks: VecDeque<RenderTask>,
    accepting: bool,
}

/// Multi-producer FIFO of pending tasks.
///
/// Submitting never blocks on the scene lock; only the short internal
/// mutex is taken.
pub struct RenderTaskQueue {
    state: Mutex<QueueState>,
}

impl RenderTaskQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                tasks: VecDeque::new(),
                accepting: true,
            }),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a task. Returns `false` (dropping the task) once shut down.
    pub fn submit(&self, task: RenderTask) -> bool {
        let mut state = self.lock_state();
        if !state.accepting {
            return false;
        }
        state.tasks.push_back(task);
        true
    }

    /// Take every pending task, oldest first.
    pub fn drain(&self) -> VecDeque<RenderTask> {
        std::mem::take(&mut self.lock_state().tasks)
    }

    pub fn len(&self) -> usize {
        self.lock_state().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_state().tasks.is_empty()
    }

    /// Stop accepting tasks and drop the pending ones.
    ///
    /// Returns the number of tasks dropped.
    pub fn shutdown(&self) -> usize {
        let dropped = {
            let mut state = self.lock_state();
            state.accepting = false;
            std::mem::take(&mut state.tasks)
        };
        dropped.len()
    }

    pub fn is_accepting(&self) -> bool {
        self.lock_state().accepting
    }
}

impl Default for RenderTaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "render_task_tests.rs"]
mod tests;
