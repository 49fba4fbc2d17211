//! Synchronization module — the per-scene read/write lock and its
//! cancellation token.
//!
//! One render thread takes read passes (visibility + rendering) and one
//! write pass (render tasks) per frame; application threads take write
//! passes through `Scene::request_modifications`.

mod interrupt;
mod scene_lock;

pub use interrupt::InterruptToken;
pub use scene_lock::{SceneLock, ReadGuard, WriteGuard};
