//! Spinlock guarding the re-entrant lock bookkeeping
//!
//! Critical sections under this lock are a handful of loads and stores, so
//! spinning (with crossbeam's exponential backoff, which eventually yields)
//! is cheaper than parking.

use crossbeam::utils::Backoff;
use parking_lot::lock_api::{GuardSend, RawMutex};
use std::sync::atomic::{AtomicBool, Ordering};

/// Test-and-test-and-set spinlock
pub(crate) struct RawSpinlock {
    locked: AtomicBool,
}

// SAFETY: `try_lock` only succeeds for the caller that flips `locked` from
// false to true, so at most one holder exists at a time. Acquire on lock and
// Release on unlock order the protected accesses.
unsafe impl RawMutex for RawSpinlock {
    #[allow(clippy::declare_interior_mutable_const)]
    const INIT: Self = Self {
        locked: AtomicBool::new(false),
    };

    type GuardMarker = GuardSend;

    #[inline]
    fn lock(&self) {
        if self.try_lock() {
            return;
        }
        let backoff = Backoff::new();
        loop {
            while self.locked.load(Ordering::Relaxed) {
                backoff.snooze();
            }
            if self.try_lock() {
                return;
            }
        }
    }

    #[inline]
    fn try_lock(&self) -> bool {
        self.locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    #[inline]
    unsafe fn unlock(&self) {
        self.locked.store(false, Ordering::Release);
    }

    #[inline]
    fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

/// Mutex over [`RawSpinlock`]
pub(crate) type SpinMutex<T> = parking_lot::lock_api::Mutex<RawSpinlock, T>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_spin_mutex_counts_without_loss() {
        let counter = Arc::new(SpinMutex::new(0u64));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..10_000 {
                        *counter.lock() += 1;
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(*counter.lock(), 40_000);
    }

    #[test]
    fn test_try_lock_fails_while_held() {
        let mutex = SpinMutex::new(());
        let guard = mutex.lock();
        assert!(mutex.try_lock().is_none());
        drop(guard);
        assert!(mutex.try_lock().is_some());
    }
}
