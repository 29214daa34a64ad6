//! Cooperative cancellation shared by every long-running loop
//!
//! Loops poll [`ActiveFlag::is_active`] between iterations and race their
//! blocking awaits (accept, read, sleep) against [`ActiveFlag::cancelled`], so
//! a `stop` takes effect within one loop iteration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Shared active/inactive gate with async notification on deactivation
#[derive(Debug, Clone)]
pub struct ActiveFlag {
    active: Arc<AtomicBool>,
    notify: Arc<watch::Sender<bool>>,
}

impl ActiveFlag {
    pub fn new() -> Self {
        let (notify, _) = watch::channel(false);
        Self {
            active: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(notify),
        }
    }

    /// Set active; returns `false` if it already was
    pub fn activate(&self) -> bool {
        let changed = self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if changed {
            self.notify.send_replace(true);
        }
        changed
    }

    /// Clear the flag and wake every waiter; returns `false` if it was already clear
    pub fn deactivate(&self) -> bool {
        let changed = self
            .active
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if changed {
            self.notify.send_replace(false);
        }
        changed
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Resolves once the flag is inactive
    pub async fn cancelled(&self) {
        let mut rx = self.notify.subscribe();
        // Sender lives in self, so wait_for only fails if it is dropped
        let _ = rx.wait_for(|_| !self.is_active()).await;
    }
}

impl Default for ActiveFlag {
    fn default() -> Self {
        Self::new()
    }
}
