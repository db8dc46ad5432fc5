use crossbeam::utils::CachePadded;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cheaply clonable lifecycle flag shared between a component's execution
/// context and its orchestrator. Wraps an `AtomicBool` in
/// `Arc<CachePadded<...>>` to avoid false sharing.
///
/// Loads are acquire and stores are release: the flag orders the lifecycle
/// handshake (a stop request published before the wake-up must be visible
/// to the woken context).
#[derive(Clone)]
#[repr(transparent)]
pub struct RunFlag(Arc<CachePadded<AtomicBool>>);

impl RunFlag {
    #[inline]
    pub fn new(initial: bool) -> Self {
        Self(Arc::new(CachePadded::new(AtomicBool::new(initial))))
    }

    #[inline(always)]
    pub fn get(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    #[inline(always)]
    pub fn set(&self, value: bool) {
        self.0.store(value, Ordering::Release)
    }
}

impl fmt::Debug for RunFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunFlag").field("value", &self.get()).finish()
    }
}
