//! The two-phase construct/initialize/free lifecycle shared by pooled
//! render resources.
//!
//! A pooled resource is constructed cheaply (params only) and acquires its
//! device-side objects lazily through [`ResourceState::try_init`].
//! Initialization is guarded by a try-lock: a caller that loses the race is
//! told so immediately and never blocks, because a render-frame thread must
//! not stall on another thread's initialization of an unrelated resource.
//! Teardown through [`ResourceState::free`] blocks instead, so it is
//! deterministic.
//!
//! [`ResourceState::try_init`]: struct.ResourceState.html#method.try_init
//! [`ResourceState::free`]: struct.ResourceState.html#method.free

use std::result::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, TryLockError};

/// The kind tag of a pooled render resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Texture,
    Shader,
    Target,
}

/// Lifecycle state of one pooled resource: Uninitialized ⇄ Initialized,
/// repeatable across hot-reload cycles.
pub struct ResourceState {
    label: String,
    kind: ResourceKind,
    initialized: AtomicBool,
    guard: Mutex<()>,
    share: Mutex<()>,
    ready: Signal,
}

impl ResourceState {
    pub fn new<T>(kind: ResourceKind, label: T) -> Self
    where
        T: Into<String>,
    {
        ResourceState {
            label: label.into(),
            kind,
            initialized: AtomicBool::new(false),
            guard: Mutex::new(()),
            share: Mutex::new(()),
            ready: Signal::new(),
        }
    }

    /// A human-readable description of the underlying resource.
    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Attempts to move the resource to Initialized by running `f`.
    ///
    /// Returns `Ok(false)` without side effects when the resource is
    /// already initialized, or when another thread holds the init guard
    /// (the lost race is a normal condition; callers retry or
    /// [`wait_until_initialized`](#method.wait_until_initialized)).
    /// Returns `Ok(true)` when `f` ran and the flag was set. An `Err` from
    /// `f` leaves the resource Uninitialized.
    pub fn try_init<F, E>(&self, f: F) -> Result<bool, E>
    where
        F: FnOnce() -> Result<(), E>,
    {
        if self.is_initialized() {
            return Ok(false);
        }

        let _guard = match self.guard.try_lock() {
            Ok(v) => v,
            Err(TryLockError::WouldBlock) => return Ok(false),
            Err(TryLockError::Poisoned(_)) => {
                panic!("init guard of '{}' poisoned", self.label);
            }
        };

        // The winner of a previous race may have finished while we were
        // acquiring the guard.
        if self.is_initialized() {
            return Ok(false);
        }

        f()?;

        self.initialized.store(true, Ordering::Release);
        self.ready.set(true);
        Ok(true)
    }

    /// Moves the resource back to Uninitialized, running the teardown `f`
    /// only if it actually was initialized. Blocks until any in-flight
    /// initialization has finished.
    pub fn free<F>(&self, f: F)
    where
        F: FnOnce(),
    {
        let _guard = self.guard.lock().unwrap();

        if self.initialized.swap(false, Ordering::AcqRel) {
            f();
        }

        self.ready.set(false);
    }

    /// Blocks cooperatively until another thread finishes initialization.
    pub fn wait_until_initialized(&self) {
        self.ready.wait();
    }

    /// The secondary lock of the resource. It takes no part in init/free;
    /// it is there for callers that must serialize concurrent discovery of
    /// one shared underlying asset (e.g. a texture referenced by several
    /// materials loading in parallel).
    pub fn share_lock(&self) -> MutexGuard<()> {
        self.share.lock().unwrap()
    }

    /// Non-blocking variant of [`share_lock`](#method.share_lock).
    pub fn try_share_lock(&self) -> Option<MutexGuard<()>> {
        match self.share.try_lock() {
            Ok(v) => Some(v),
            Err(TryLockError::WouldBlock) => None,
            Err(TryLockError::Poisoned(_)) => {
                panic!("share lock of '{}' poisoned", self.label);
            }
        }
    }
}

/// A resettable, condvar-backed flag. Waiters block cooperatively instead
/// of spin-polling on a scheduling tick.
struct Signal {
    m: Mutex<bool>,
    v: Condvar,
}

impl Signal {
    fn new() -> Self {
        Signal {
            m: Mutex::new(false),
            v: Condvar::new(),
        }
    }

    fn set(&self, value: bool) {
        {
            let mut guard = self.m.lock().unwrap();
            *guard = value;
        }

        if value {
            self.v.notify_all();
        }
    }

    fn wait(&self) {
        let mut guard = self.m.lock().unwrap();
        while !*guard {
            guard = self.v.wait(guard).unwrap();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn transitions() {
        let state = ResourceState::new(ResourceKind::Texture, "checker.png");
        assert!(!state.is_initialized());

        assert_eq!(state.try_init(|| Ok::<_, ()>(())), Ok(true));
        assert!(state.is_initialized());

        // Second init is a no-op.
        assert_eq!(state.try_init(|| Ok::<_, ()>(())), Ok(false));

        let mut torn_down = false;
        state.free(|| torn_down = true);
        assert!(torn_down);
        assert!(!state.is_initialized());

        // Re-initialization after free, as in a hot reload.
        assert_eq!(state.try_init(|| Ok::<_, ()>(())), Ok(true));
    }

    #[test]
    fn failed_init_leaves_uninitialized() {
        let state = ResourceState::new(ResourceKind::Shader, "broken.fx");
        assert_eq!(state.try_init(|| Err("no device")), Err("no device"));
        assert!(!state.is_initialized());
        assert_eq!(state.try_init(|| Ok::<_, &str>(())), Ok(true));
    }

    #[test]
    fn free_uninitialized_is_noop() {
        let state = ResourceState::new(ResourceKind::Target, "half-res");
        let mut torn_down = false;
        state.free(|| torn_down = true);
        assert!(!torn_down);
    }

    #[test]
    fn waiters_observe_initialization() {
        let state = Arc::new(ResourceState::new(ResourceKind::Texture, "shared"));

        let waiter = {
            let state = Arc::clone(&state);
            thread::spawn(move || {
                state.wait_until_initialized();
                assert!(state.is_initialized());
            })
        };

        assert_eq!(state.try_init(|| Ok::<_, ()>(())), Ok(true));
        waiter.join().unwrap();
    }
}
