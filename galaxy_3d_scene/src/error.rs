//! Error types for the Galaxy3D scene core
//!
//! This module defines the error types used throughout the scene graph,
//! including lock acquisition, render task execution and camera setup.

use std::fmt;
use std::time::Duration;

/// Result type for Galaxy3D scene operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D scene errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A caller broke a documented precondition (unconfigured camera,
    /// malformed fixed-size argument, hierarchy cycle, unknown node...)
    PreconditionViolation(String),

    /// A blocked lock acquisition was cancelled through its interrupt token
    Interrupted,

    /// A lock acquisition exceeded its configured timeout
    LockTimeout(Duration),

    /// A thread asked for a lock it cannot re-enter (write while holding
    /// any lock, or read while holding the write lock)
    LockReentry(String),

    /// A render task reported a failure
    TaskFailed(String),

    /// An object renderer failed to draw an object
    RenderFailed(String),

    /// The scene has been shut down and no longer accepts work
    ShutDown,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::PreconditionViolation(msg) => write!(f, "Precondition violation: {}", msg),
            Error::Interrupted => write!(f, "Lock acquisition interrupted"),
            Error::LockTimeout(timeout) => write!(f, "Lock acquisition timed out after {:?}", timeout),
            Error::LockReentry(msg) => write!(f, "Illegal lock re-entry: {}", msg),
            Error::TaskFailed(msg) => write!(f, "Render task failed: {}", msg),
            Error::RenderFailed(msg) => write!(f, "Object rendering failed: {}", msg),
            Error::ShutDown => write!(f, "Scene is shut down"),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an ERROR and build a `PreconditionViolation` in one step
///
/// # Example
///
/// ```ignore
/// let camera = graph.camera(key)
///     .ok_or_else(|| engine_err!(self.log, "galaxy3d::SceneView", "Camera node {:?} not found", key))?;
/// ```
#[macro_export]
macro_rules! engine_err {
    ($log:expr, $source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($log, $source, "{}", message);
        $crate::galaxy3d::Error::PreconditionViolation(message)
    }};
}

/// Log an ERROR and return early with a `PreconditionViolation`
///
/// # Example
///
/// ```ignore
/// if depth > self.depth_order.len() {
///     engine_bail!(self.log, "galaxy3d::RenderControl", "Depth {} out of range", depth);
/// }
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($log:expr, $source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($log, $source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
