//! Binary parking lock used only under contention
//!
//! Unlike a mutex this lock is not tied to the thread that acquired it: a
//! contending thread may engage it on behalf of the current owner, and the
//! owner releases it. Waiters park on a condition variable.

use parking_lot::{Condvar, Mutex};
use std::time::Instant;

/// How long an acquisition may wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wait {
    /// Fail immediately if held
    Never,
    /// Park until released
    Forever,
    /// Park until released or the deadline passes
    Until(Instant),
}

/// Binary lock releasable from any thread
#[derive(Debug, Default)]
pub(crate) struct ParkingLock {
    held: Mutex<bool>,
    released: Condvar,
}

impl ParkingLock {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Take the lock if it is free, never parks
    pub(crate) fn try_acquire(&self) -> bool {
        let mut held = self.held.lock();
        if *held {
            return false;
        }
        *held = true;
        true
    }

    /// Take the lock, parking according to `wait`
    pub(crate) fn acquire(&self, wait: Wait) -> bool {
        let mut held = self.held.lock();
        match wait {
            Wait::Never => {
                if *held {
                    return false;
                }
            }
            Wait::Forever => {
                while *held {
                    self.released.wait(&mut held);
                }
            }
            Wait::Until(deadline) => {
                while *held {
                    if self.released.wait_until(&mut held, deadline).timed_out() && *held {
                        return false;
                    }
                }
            }
        }
        *held = true;
        true
    }

    /// Free the lock and wake one waiter
    pub(crate) fn release(&self) {
        {
            let mut held = self.held.lock();
            debug_assert!(*held, "parking lock released while free");
            *held = false;
        }
        self.released.notify_one();
    }

    #[cfg(test)]
    pub(crate) fn is_held(&self) -> bool {
        *self.held.lock()
    }
}
