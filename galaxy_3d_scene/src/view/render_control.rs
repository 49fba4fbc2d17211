/// RenderControl — frame driver for scenes and their views.
///
/// Owns the scenes and the depth-ordered list of scene views drawn into
/// one render surface. Each frame runs, for every scene, the pre-frame
/// callbacks, the pending render tasks and the pre-draw callbacks (write
/// passes), then renders every enabled view back to front and finally runs
/// the post-frame callbacks of every scene (read passes).

use std::sync::Arc;
use std::time::{Duration, Instant};
use slotmap::{new_key_type, SlotMap};
use crate::config::RenderControlConfig;
use crate::error::{Error, Result};
use crate::log::LogContext;
use crate::scene::{FrameTime, Scene};
use crate::sync::InterruptToken;
use crate::{engine_bail, engine_debug, engine_trace, engine_warn};
use super::object_renderer::ObjectRenderer;
use super::scene_view::SceneView;

const SOURCE: &str = "galaxy3d::RenderControl";

new_key_type! {
    /// Stable key for a SceneView within a RenderControl.
    pub struct SceneViewKey;
}

/// Summary of one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    /// Frame number, starting at 1
    pub frame: u64,
    /// Time since the previous frame started (zero for the first frame)
    pub delta: Duration,
    pub tasks_executed: usize,
    pub views_rendered: usize,
    pub objects_drawn: usize,
}

/// Frame driver.
pub struct RenderControl {
    config: RenderControlConfig,
    scenes: Vec<Arc<Scene>>,
    views: SlotMap<SceneViewKey, SceneView>,
    /// Back to front
    depth_order: Vec<SceneViewKey>,
    surface_size: Option<(u32, u32)>,
    interrupt: InterruptToken,

    // Frame timing
    first_frame_start: Option<Instant>,
    last_frame_start: Option<Instant>,
    last_delta: Duration,
    frame_count: u64,
    fps_window_start: Option<Instant>,
    fps_window_frames: u32,
    fps: f64,

    log: LogContext,
}

impl RenderControl {
    pub fn new(config: RenderControlConfig, log: LogContext) -> Self {
        Self {
            config,
            scenes: Vec::new(),
            views: SlotMap::with_key(),
            depth_order: Vec::new(),
            surface_size: None,
            interrupt: InterruptToken::new(),
            first_frame_start: None,
            last_frame_start: None,
            last_delta: Duration::ZERO,
            frame_count: 0,
            fps_window_start: None,
            fps_window_frames: 0,
            fps: 0.0,
            log,
        }
    }

    // ===== SCENES =====

    /// Register a scene. Returns `false` if it is already registered.
    pub fn add_scene(&mut self, scene: Arc<Scene>) -> bool {
        if self.scenes.iter().any(|known| Arc::ptr_eq(known, &scene)) {
            return false;
        }
        engine_debug!(self.log, SOURCE, "Added scene '{}'", scene.name());
        self.scenes.push(scene);
        true
    }

    /// Unregister a scene and drop every view of it.
    ///
    /// Returns `false` if the scene was not registered.
    pub fn remove_scene(&mut self, scene: &Arc<Scene>) -> bool {
        let Some(position) = self.scenes.iter().position(|known| Arc::ptr_eq(known, scene)) else {
            return false;
        };
        self.scenes.remove(position);

        let orphaned: Vec<SceneViewKey> = self.depth_order
            .iter()
            .copied()
            .filter(|key| self.views.get(*key).is_some_and(|view| Arc::ptr_eq(view.scene(), scene)))
            .collect();
        for key in &orphaned {
            self.remove_scene_view(*key);
        }
        engine_debug!(self.log, SOURCE, "Removed scene '{}' and {} view(s)", scene.name(), orphaned.len());
        true
    }

    pub fn scenes(&self) -> &[Arc<Scene>] {
        &self.scenes
    }

    // ===== SCENE VIEWS =====

    /// Add a view in front of every other view.
    ///
    /// Its scene is registered if needed.
    pub fn add_scene_view(&mut self, view: SceneView) -> SceneViewKey {
        self.add_scene(Arc::clone(view.scene()));
        let key = self.views.insert(view);
        self.depth_order.push(key);
        key
    }

    /// Add a view at `depth` in the back-to-front order (0 = back).
    ///
    /// # Errors
    ///
    /// `PreconditionViolation` if `depth` is past the front.
    pub fn insert_scene_view(&mut self, view: SceneView, depth: usize) -> Result<SceneViewKey> {
        if depth > self.depth_order.len() {
            engine_bail!(self.log, SOURCE,
                "Scene view depth {} out of range (0..={})", depth, self.depth_order.len());
        }
        self.add_scene(Arc::clone(view.scene()));
        let key = self.views.insert(view);
        self.depth_order.insert(depth, key);
        Ok(key)
    }

    pub fn remove_scene_view(&mut self, key: SceneViewKey) -> Option<SceneView> {
        let view = self.views.remove(key)?;
        self.depth_order.retain(|&other| other != key);
        Some(view)
    }

    /// Position of a view in the back-to-front order.
    pub fn scene_view_depth_order(&self, key: SceneViewKey) -> Option<usize> {
        self.depth_order.iter().position(|&other| other == key)
    }

    pub fn scene_view(&self, key: SceneViewKey) -> Option<&SceneView> {
        self.views.get(key)
    }

    pub fn scene_view_mut(&mut self, key: SceneViewKey) -> Option<&mut SceneView> {
        self.views.get_mut(key)
    }

    /// View keys, back to front.
    pub fn scene_view_keys(&self) -> &[SceneViewKey] {
        &self.depth_order
    }

    pub fn scene_view_count(&self) -> usize {
        self.views.len()
    }

    // ===== FRAME =====

    /// Run one frame: pre-frame callbacks, render tasks and pre-draw
    /// callbacks of every scene, every enabled view back to front, then the
    /// post-frame callbacks of every scene.
    ///
    /// # Errors
    ///
    /// The first error of any scene or view aborts the frame. After an
    /// `Interrupted` abort the interrupt token is lowered again so the next
    /// frame starts clean.
    pub fn render_frame(&mut self, renderer: &mut dyn ObjectRenderer) -> Result<FrameInfo> {
        let start = Instant::now();
        let delta = self.last_frame_start.map_or(Duration::ZERO, |last| start - last);
        self.last_frame_start = Some(start);
        let time = FrameTime {
            frame: self.frame_count + 1,
            elapsed: start - *self.first_frame_start.get_or_insert(start),
            delta,
        };

        let (tasks_executed, views_rendered, objects_drawn) = match self.run_passes(&time, renderer) {
            Ok(counts) => counts,
            Err(Error::Interrupted) => {
                engine_warn!(self.log, SOURCE, "Frame {} interrupted", self.frame_count + 1);
                self.interrupt.reset();
                return Err(Error::Interrupted);
            }
            Err(error) => return Err(error),
        };

        self.frame_count += 1;
        self.last_delta = delta;
        self.update_fps(start);

        let elapsed = start.elapsed();
        if let Some(threshold) = self.config.slow_frame_threshold {
            if elapsed > threshold {
                engine_warn!(self.log, SOURCE, "Frame {} took {:?} (threshold {:?})",
                    self.frame_count, elapsed, threshold);
            }
        }
        engine_trace!(self.log, SOURCE, "Frame {}: {} task(s), {} view(s), {} object(s)",
            self.frame_count, tasks_executed, views_rendered, objects_drawn);

        Ok(FrameInfo {
            frame: self.frame_count,
            delta,
            tasks_executed,
            views_rendered,
            objects_drawn,
        })
    }

    fn run_passes(&mut self, time: &FrameTime, renderer: &mut dyn ObjectRenderer) -> Result<(usize, usize, usize)> {
        let token = &self.interrupt;
        if token.is_interrupted() {
            return Err(Error::Interrupted);
        }

        let mut tasks_executed = 0;
        for scene in &self.scenes {
            tasks_executed += scene.begin_frame(token, time)?;
        }

        let mut views_rendered = 0;
        let mut objects_drawn = 0;
        for key in &self.depth_order {
            let Some(view) = self.views.get_mut(*key) else {
                continue;
            };
            if !view.is_enabled() {
                continue;
            }
            objects_drawn += view.render_frame(token, renderer)?;
            views_rendered += 1;
        }

        for scene in &self.scenes {
            scene.end_frame(token, time)?;
        }
        Ok((tasks_executed, views_rendered, objects_drawn))
    }

    fn update_fps(&mut self, now: Instant) {
        let window_start = *self.fps_window_start.get_or_insert(now);
        self.fps_window_frames += 1;
        let elapsed = now.duration_since(window_start);
        if elapsed >= self.config.fps_window && !elapsed.is_zero() {
            self.fps = self.fps_window_frames as f64 / elapsed.as_secs_f64();
            self.fps_window_start = Some(now);
            self.fps_window_frames = 0;
        }
    }

    /// The render surface was resized.
    ///
    /// Full-surface views follow the surface: their cameras get the new
    /// viewport size through a write pass. Zero sizes (minimized window)
    /// are ignored. Returns the number of cameras updated; a view whose
    /// camera is gone is logged and skipped.
    ///
    /// # Errors
    ///
    /// Lock errors (`Interrupted`, `LockTimeout`, `LockReentry`).
    pub fn on_surface_size_changed(&mut self, width: u32, height: u32) -> Result<usize> {
        if width == 0 || height == 0 {
            engine_debug!(self.log, SOURCE, "Ignoring empty surface size {}x{}", width, height);
            return Ok(0);
        }
        self.surface_size = Some((width, height));

        let mut updated = 0;
        for key in &self.depth_order {
            let Some(view) = self.views.get(*key) else {
                continue;
            };
            if !view.is_full_surface() {
                continue;
            }
            let camera_key = view.camera();
            let result = view.scene().request_modifications(&self.interrupt, |graph| {
                graph.modify_camera(camera_key, |camera| camera.set_viewport_size(width, height))
            });
            match result {
                Ok(()) => updated += 1,
                Err(Error::PreconditionViolation(_)) => {
                    // Already logged by the scene graph
                }
                Err(error) => return Err(error),
            }
        }
        engine_debug!(self.log, SOURCE, "Surface resized to {}x{}, {} camera(s) updated", width, height, updated);
        Ok(updated)
    }

    pub fn surface_size(&self) -> Option<(u32, u32)> {
        self.surface_size
    }

    /// Token that cancels a stalled frame from another thread.
    pub fn interrupt_token(&self) -> InterruptToken {
        self.interrupt.clone()
    }

    /// Frames per second over the last complete window.
    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn last_frame_delta(&self) -> Duration {
        self.last_delta
    }
}

#[cfg(test)]
#[path = "render_control_tests.rs"]
mod tests;
