/// SceneLock — interruptible, writer-preferring read/write lock.
///
/// At most one writer or any number of readers hold the lock, never both.
/// Waiting writers block new readers, except readers re-entering a read
/// lock their thread already holds (a re-entrant read never queues behind
/// a writer that is itself waiting for that reader).
///
/// Illegal re-entry fails with `Error::LockReentry` instead of
/// deadlocking: the write-lock holder asking for any lock, or a reader
/// asking for the write lock.
///
/// An acquisition with an already raised `InterruptToken` fails at once,
/// even when the lock is free. Waiters sleep on a condition variable in
/// `poll_interval` slices and re-check their token and deadline between
/// slices.

use std::cell::UnsafeCell;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};
use rustc_hash::FxHashMap;
use crate::config::LockConfig;
use crate::error::{Error, Result};
use super::interrupt::InterruptToken;

/// Bookkeeping protected by the internal mutex.
#[derive(Default)]
struct LockState {
    writer: Option<ThreadId>,
    /// Read holds per thread (re-entrant count)
    readers: FxHashMap<ThreadId, usize>,
    waiting_writers: usize,
}

/// Read/write lock around a value of type `T`.
pub struct SceneLock<T> {
    state: Mutex<LockState>,
    changed: Condvar,
    data: UnsafeCell<T>,
    config: LockConfig,
}

// Access to `data` is only handed out through guards, which the state
// machine keeps exclusive (writer) or shared (readers).
unsafe impl<T: Send> Send for SceneLock<T> {}
unsafe impl<T: Send + Sync> Sync for SceneLock<T> {}

impl<T> SceneLock<T> {
    pub fn new(value: T, config: LockConfig) -> Self {
        Self {
            state: Mutex::new(LockState::default()),
            changed: Condvar::new(),
            data: UnsafeCell::new(value),
            config,
        }
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Block until a read lock is granted, using the configured timeout.
    ///
    /// # Errors
    ///
    /// - `Interrupted` if `token` is raised on entry or while waiting
    /// - `LockTimeout` if the configured timeout elapses
    /// - `LockReentry` if this thread holds the write lock
    pub fn read(&self, token: &InterruptToken) -> Result<ReadGuard<'_, T>> {
        self.acquire_read(token, self.config.timeout)
    }

    /// Like `read`, with an explicit timeout.
    pub fn try_read_for(&self, token: &InterruptToken, timeout: Duration) -> Result<ReadGuard<'_, T>> {
        self.acquire_read(token, Some(timeout))
    }

    /// Block until the write lock is granted, using the configured timeout.
    ///
    /// # Errors
    ///
    /// - `Interrupted` if `token` is raised on entry or while waiting
    /// - `LockTimeout` if the configured timeout elapses
    /// - `LockReentry` if this thread already holds any lock
    pub fn write(&self, token: &InterruptToken) -> Result<WriteGuard<'_, T>> {
        self.acquire_write(token, self.config.timeout)
    }

    /// Like `write`, with an explicit timeout.
    pub fn try_write_for(&self, token: &InterruptToken, timeout: Duration) -> Result<WriteGuard<'_, T>> {
        self.acquire_write(token, Some(timeout))
    }

    /// Direct access through an exclusive borrow (no locking needed).
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }

    /// Number of threads currently holding a read lock.
    pub fn reader_count(&self) -> usize {
        self.lock_state().readers.len()
    }

    pub fn is_write_locked(&self) -> bool {
        self.lock_state().writer.is_some()
    }

    // ===== INTERNALS =====

    fn lock_state(&self) -> MutexGuard<'_, LockState> {
        // The state is plain counters; a panic while holding the mutex
        // cannot leave it half-updated
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn acquire_read(&self, token: &InterruptToken, timeout: Option<Duration>) -> Result<ReadGuard<'_, T>> {
        let me = thread::current().id();
        let deadline = timeout.map(|timeout| (Instant::now() + timeout, timeout));
        let mut state = self.lock_state();

        if state.writer == Some(me) {
            return Err(Error::LockReentry("read lock requested while holding the write lock".to_string()));
        }
        if token.is_interrupted() {
            return Err(Error::Interrupted);
        }

        loop {
            let reentrant = state.readers.contains_key(&me);
            if state.writer.is_none() && (reentrant || state.waiting_writers == 0) {
                *state.readers.entry(me).or_insert(0) += 1;
                return Ok(ReadGuard { lock: self, _not_send: PhantomData });
            }
            let slice = self.wait_slice(token, deadline)?;
            state = self.changed
                .wait_timeout(state, slice)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    fn acquire_write(&self, token: &InterruptToken, timeout: Option<Duration>) -> Result<WriteGuard<'_, T>> {
        let me = thread::current().id();
        let deadline = timeout.map(|timeout| (Instant::now() + timeout, timeout));
        let mut state = self.lock_state();

        if state.writer == Some(me) {
            return Err(Error::LockReentry("write lock requested while already holding it".to_string()));
        }
        if state.readers.contains_key(&me) {
            return Err(Error::LockReentry("write lock requested while holding a read lock".to_string()));
        }
        if token.is_interrupted() {
            return Err(Error::Interrupted);
        }

        state.waiting_writers += 1;
        loop {
            if state.writer.is_none() && state.readers.is_empty() {
                state.waiting_writers -= 1;
                state.writer = Some(me);
                return Ok(WriteGuard { lock: self, _not_send: PhantomData });
            }
            match self.wait_slice(token, deadline) {
                Ok(slice) => {
                    state = self.changed
                        .wait_timeout(state, slice)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0;
                }
                Err(error) => {
                    // Readers held back by this writer may proceed
                    state.waiting_writers -= 1;
                    drop(state);
                    self.changed.notify_all();
                    return Err(error);
                }
            }
        }
    }

    /// How long the next wait may sleep, or why waiting must stop.
    fn wait_slice(&self, token: &InterruptToken, deadline: Option<(Instant, Duration)>) -> Result<Duration> {
        if token.is_interrupted() {
            return Err(Error::Interrupted);
        }
        match deadline {
            None => Ok(self.config.poll_interval),
            Some((deadline, timeout)) => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(Error::LockTimeout(timeout));
                }
                Ok(self.config.poll_interval.min(deadline - now))
            }
        }
    }

    fn release_read(&self) {
        let me = thread::current().id();
        let mut state = self.lock_state();
        if let Some(count) = state.readers.get_mut(&me) {
            *count -= 1;
            if *count == 0 {
                state.readers.remove(&me);
            }
        }
        drop(state);
        self.changed.notify_all();
    }

    fn release_write(&self) {
        let mut state = self.lock_state();
        state.writer = None;
        drop(state);
        self.changed.notify_all();
    }
}

// ===== GUARDS =====

/// Shared access; releases the read hold on drop.
///
/// Not `Send`: a hold belongs to the thread that acquired it.
pub struct ReadGuard<'a, T> {
    lock: &'a SceneLock<T>,
    _not_send: PhantomData<*const ()>,
}

impl<T> Deref for ReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: this thread holds a read count, so `writer` is `None` and no `&mut T` exists
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> Drop for ReadGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.release_read();
    }
}

/// Exclusive access; releases the write lock on drop.
pub struct WriteGuard<'a, T> {
    lock: &'a SceneLock<T>,
    _not_send: PhantomData<*const ()>,
}

impl<T> Deref for WriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: `writer` is this thread and `readers` is empty until the guard drops
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for WriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: sole writer with no readers, and `&mut self` rules out a second borrow through this guard
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for WriteGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.release_write();
    }
}

#[cfg(test)]
#[path = "scene_lock_tests.rs"]
mod tests;
