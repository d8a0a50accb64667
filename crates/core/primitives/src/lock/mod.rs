//! Re-entrant lock with a thin uncontended path
//!
//! Ownership is tracked in a small bookkeeping record (`owner`, `count`,
//! `pending`, `engaged`) guarded by a spinlock. As long as only one thread
//! uses the lock, or the owner re-enters it, acquisition is a bookkeeping
//! update and nothing parks.
//!
//! When a second thread contends, it engages the parking lock on behalf of
//! the current owner and then waits on it. The owner releases the parking
//! lock when its count drops to zero, handing the lock to one waiter.
//!
//! # Example
//! ```
//! use primitives::ReentrantLock;
//!
//! let lock = ReentrantLock::new();
//! let outer = lock.lock();
//! let inner = lock.lock(); // re-entry never blocks
//! assert_eq!(lock.snapshot().count, 2);
//! drop(inner);
//! drop(outer);
//! assert!(!lock.is_locked());
//! ```

mod parking;
mod spin;
mod thread;

pub use thread::ThreadToken;

use crate::error::LockError;
use parking::{ParkingLock, Wait};
use spin::SpinMutex;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{error, trace};

/// Bookkeeping guarded by the spinlock
#[derive(Debug, Default)]
struct LockState {
    owner: Option<ThreadToken>,
    count: usize,
    pending: usize,
    engaged: bool,
}

/// Point-in-time view of a lock's bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockSnapshot {
    /// Thread holding the lock
    pub owner: Option<ThreadToken>,
    /// Re-entry depth held by `owner`
    pub count: usize,
    /// Threads parked waiting for the lock
    pub pending: usize,
    /// Whether the parking lock is engaged for the owner
    pub os_lock_engaged: bool,
}

/// Re-entrant mutual exclusion lock
///
/// The holder may acquire the lock again without blocking; it becomes
/// available to other threads after a matching number of releases.
/// No fairness is provided between waiters.
pub struct ReentrantLock {
    state: SpinMutex<LockState>,
    parking: ParkingLock,
    contended: AtomicU64,
}

impl ReentrantLock {
    /// Create an unlocked lock
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SpinMutex::new(LockState::default()),
            parking: ParkingLock::new(),
            contended: AtomicU64::new(0),
        }
    }

    /// Acquire the lock
    ///
    /// With `blocking` the call parks until the lock is available. Without
    /// it the call returns `false` if another thread holds the lock, leaving
    /// owner and count untouched.
    pub fn acquire(&self, blocking: bool) -> bool {
        self.acquire_with(if blocking { Wait::Forever } else { Wait::Never })
    }

    /// Acquire the lock, waiting at most `timeout`
    pub fn try_acquire_for(&self, timeout: Duration) -> bool {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.acquire_with(Wait::Until(deadline)),
            None => self.acquire_with(Wait::Forever),
        }
    }

    /// Release one level of ownership
    ///
    /// # Errors
    /// Returns [`LockError::NotOwner`] if the calling thread does not hold
    /// the lock. Nothing is modified in that case.
    pub fn release(&self) -> Result<(), LockError> {
        let caller = ThreadToken::current();
        let mut state = self.state.lock();
        if state.count == 0 || state.owner != Some(caller) {
            return Err(LockError::NotOwner {
                caller,
                owner: state.owner,
            });
        }

        state.count -= 1;
        if state.count == 0 {
            state.owner = None;
            if state.engaged {
                state.engaged = false;
                self.parking.release();
            }
        }
        Ok(())
    }

    /// Acquire the lock for the lifetime of the returned guard, blocking
    pub fn lock(&self) -> ReentrantLockGuard<'_> {
        let acquired = self.acquire_with(Wait::Forever);
        debug_assert!(acquired, "blocking acquisition returned without the lock");
        ReentrantLockGuard::new(self)
    }

    /// Acquire the lock for the guard's lifetime if available right now
    pub fn try_lock(&self) -> Option<ReentrantLockGuard<'_>> {
        self.acquire_with(Wait::Never)
            .then(|| ReentrantLockGuard::new(self))
    }

    /// Acquire the lock for the guard's lifetime, waiting at most `timeout`
    pub fn try_lock_for(&self, timeout: Duration) -> Option<ReentrantLockGuard<'_>> {
        self.try_acquire_for(timeout)
            .then(|| ReentrantLockGuard::new(self))
    }

    /// Whether any thread holds the lock
    pub fn is_locked(&self) -> bool {
        self.state.lock().count > 0
    }

    /// Whether the calling thread holds the lock
    pub fn is_owned_by_current_thread(&self) -> bool {
        let state = self.state.lock();
        state.count > 0 && state.owner == Some(ThreadToken::current())
    }

    /// Consistent copy of the bookkeeping
    pub fn snapshot(&self) -> LockSnapshot {
        let state = self.state.lock();
        LockSnapshot {
            owner: state.owner,
            count: state.count,
            pending: state.pending,
            os_lock_engaged: state.engaged,
        }
    }

    /// Number of acquisitions that had to take the contended path
    pub fn contended_acquisitions(&self) -> u64 {
        self.contended.load(Ordering::Relaxed)
    }

    fn acquire_with(&self, wait: Wait) -> bool {
        let me = ThreadToken::current();
        {
            let mut state = self.state.lock();
            if state.count > 0 && state.owner == Some(me) {
                state.count += 1;
                return true;
            }
            if state.count == 0 && state.pending == 0 {
                state.owner = Some(me);
                state.count = 1;
                return true;
            }

            // Contended. The first contender engages the parking lock for the
            // current owner so that the owner's final release hands it over.
            if !state.engaged && state.pending == 0 {
                if self.parking.try_acquire() {
                    state.engaged = true;
                } else if wait == Wait::Never {
                    return false;
                }
            }
            state.pending += 1;
        }

        self.contended.fetch_add(1, Ordering::Relaxed);
        trace!(thread = %me, ?wait, "re-entrant lock contended");
        let acquired = self.parking.acquire(wait);

        let mut state = self.state.lock();
        state.pending -= 1;
        if !acquired {
            trace!(thread = %me, "re-entrant lock not acquired");
            return false;
        }
        state.engaged = true;
        state.owner = Some(me);
        state.count = 1;
        true
    }
}

impl Default for ReentrantLock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReentrantLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("ReentrantLock")
            .field("owner", &snapshot.owner)
            .field("count", &snapshot.count)
            .field("pending", &snapshot.pending)
            .field("os_lock_engaged", &snapshot.os_lock_engaged)
            .finish()
    }
}

/// Scoped ownership of a [`ReentrantLock`]
///
/// Releases one level of ownership on drop, including during unwinding.
/// The guard is bound to the acquiring thread and cannot be sent elsewhere.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct ReentrantLockGuard<'a> {
    lock: &'a ReentrantLock,
    _not_send: PhantomData<*const ()>,
}

impl<'a> ReentrantLockGuard<'a> {
    fn new(lock: &'a ReentrantLock) -> Self {
        Self {
            lock,
            _not_send: PhantomData,
        }
    }
}

impl Drop for ReentrantLockGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.lock.release() {
            error!(%err, "lock guard dropped without ownership");
        }
    }
}

impl fmt::Debug for ReentrantLockGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReentrantLockGuard")
            .field("lock", self.lock)
            .finish()
    }
}
