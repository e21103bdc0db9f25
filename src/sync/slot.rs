//! Single-slot task token.
//!
//! At most one load or save may be in flight. The token is taken when a
//! request is dispatched and released when its guard is dropped, whether the
//! task completed, failed or was abandoned.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Holds the single in-flight slot.
#[derive(Debug, Clone, Default)]
pub struct TaskSlot {
    busy: Arc<AtomicBool>,
}

impl TaskSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the slot, or `None` if a task already holds it.
    pub fn try_acquire(&self) -> Option<TaskGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| TaskGuard {
                busy: Arc::clone(&self.busy),
            })
    }

    /// Check if a task currently holds the slot.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Proof of holding the slot; releases it on drop.
#[derive(Debug)]
pub struct TaskGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
