/*!
 * Kernel Condition Variable
 *
 * Thin handle over `parking_lot::Condvar`, clonable so a waiter can copy it
 * out of a control block before handing the lock guard to `wait`.
 */

use parking_lot::{Condvar, MutexGuard};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Named wait queue of blocked kernel threads
///
/// All waits on one `CondVar` must use guards of the same mutex; in this
/// kernel that is always the global kernel lock.
#[derive(Clone, Default)]
pub struct CondVar {
    inner: Arc<Condvar>,
}

impl CondVar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release the lock, sleep until woken, re-acquire
    #[inline]
    pub fn wait<T: ?Sized>(&self, guard: &mut MutexGuard<'_, T>) {
        self.inner.wait(guard);
    }

    /// Like `wait`, but give up at `deadline`
    ///
    /// Returns `false` if the deadline passed without a wake.
    #[inline]
    pub fn wait_until<T: ?Sized>(&self, guard: &mut MutexGuard<'_, T>, deadline: Instant) -> bool {
        !self.inner.wait_until(guard, deadline).timed_out()
    }

    /// Wake one waiter
    #[inline]
    pub fn signal(&self) -> bool {
        self.inner.notify_one()
    }

    /// Wake every waiter
    #[inline]
    pub fn broadcast(&self) -> usize {
        self.inner.notify_all()
    }
}

impl fmt::Debug for CondVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CondVar")
            .field("handles", &Arc::strong_count(&self.inner))
            .finish()
    }
}
