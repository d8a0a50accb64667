//! Per-thread identity tokens used to record lock ownership

use std::cell::Cell;
use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static CURRENT: Cell<Option<ThreadToken>> = const { Cell::new(None) };
}

/// Process-unique identity of a thread
///
/// Tokens are handed out lazily the first time a thread asks for one and are
/// never reused, so a stale owner value can never alias a live thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadToken(NonZeroU64);

impl ThreadToken {
    /// Token of the calling thread
    #[must_use]
    pub fn current() -> Self {
        CURRENT.with(|slot| {
            if let Some(token) = slot.get() {
                return token;
            }
            let token = Self::allocate();
            slot.set(Some(token));
            token
        })
    }

    /// Raw token value
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0.get()
    }

    fn allocate() -> Self {
        let raw = NEXT_TOKEN.fetch_add(1, Ordering::Relaxed);
        // The counter starts at 1 and would need 2^64 threads to wrap.
        Self(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN))
    }
}

impl fmt::Display for ThreadToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "thread#{}", self.0)
    }
}
