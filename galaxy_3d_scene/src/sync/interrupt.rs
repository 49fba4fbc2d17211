/// InterruptToken — cooperative cancellation of blocking lock waits.
///
/// Any thread may raise the token; a thread blocked in a scene lock
/// acquisition that was handed the same token wakes up within one poll
/// interval and returns `Error::Interrupted`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared interrupt flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct InterruptToken {
    flag: Arc<AtomicBool>,
}

impl InterruptToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag. Every waiter holding a clone gives up.
    pub fn interrupt(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_interrupted(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Lower the flag so the token can be used for the next frame.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }
}
