//! Test helper functions and utilities

use anyhow::Result;
use std::sync::Barrier;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Initialize test logging with environment-based configuration.
///
/// Uses `RUST_LOG` for filtering and writes through the test harness so
/// output is captured per test. Safe to call multiple times.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Run `operation` on `threads` scoped threads released together.
///
/// Every thread waits on a shared barrier before calling `operation` with
/// its index, which maximizes overlap between the calls. Results are
/// returned in index order. A panic in any thread is propagated.
///
/// # Examples
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let hits = AtomicUsize::new(0);
/// let ids = test_utils::run_concurrently(4, |i| {
///     hits.fetch_add(1, Ordering::SeqCst);
///     i
/// });
/// assert_eq!(ids, vec![0, 1, 2, 3]);
/// assert_eq!(hits.load(Ordering::SeqCst), 4);
/// ```
pub fn run_concurrently<T, F>(threads: usize, operation: F) -> Vec<T>
where
    F: Fn(usize) -> T + Sync,
    T: Send,
{
    let barrier = Barrier::new(threads);
    thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|index| {
                let barrier = &barrier;
                let operation = &operation;
                scope.spawn(move || {
                    barrier.wait();
                    operation(index)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(value) => value,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    })
}

/// Poll `condition` until it holds or `timeout` expires.
///
/// # Errors
///
/// Returns an error naming `what` if the condition is still false at the
/// deadline.
pub fn wait_until(
    what: &str,
    timeout: Duration,
    poll_interval: Duration,
    mut condition: impl FnMut() -> bool,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(anyhow::anyhow!("timeout after {timeout:?} waiting for {what}"));
        }
        thread::sleep(poll_interval);
    }
}

/// Performance measurement helper with automatic logging.
///
/// Logs the elapsed time for the named operation when dropped.
#[derive(Debug)]
pub struct PerfMeasure {
    name: String,
    start: Instant,
}

impl PerfMeasure {
    /// Start timing `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
        }
    }

    /// Time since the measurement started
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for PerfMeasure {
    fn drop(&mut self) {
        tracing::info!(
            "Performance measurement '{}' took {:?}",
            self.name,
            self.elapsed()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_run_concurrently_preserves_order() {
        let squares = run_concurrently(8, |i| i * i);
        assert_eq!(squares, (0..8).map(|i| i * i).collect::<Vec<_>>());
    }

    #[test]
    fn test_wait_until_times_out() {
        let err = wait_until("never", Duration::from_millis(20), Duration::from_millis(5), || {
            false
        })
        .unwrap_err();
        assert!(err.to_string().contains("never"));
    }

    #[test]
    fn test_wait_until_sees_flag() {
        let flag = AtomicBool::new(false);
        thread::scope(|scope| {
            scope.spawn(|| flag.store(true, Ordering::SeqCst));
            wait_until("flag", Duration::from_secs(5), Duration::from_millis(1), || {
                flag.load(Ordering::SeqCst)
            })
            .unwrap();
        });
    }
}
