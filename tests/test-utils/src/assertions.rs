//! Custom assertions for testing

use std::fmt::Debug;

/// Assert that a value is within a range
pub fn assert_in_range<T: PartialOrd + Debug>(value: T, min: T, max: T) {
    assert!(
        value >= min && value <= max,
        "Value {:?} not in range [{:?}, {:?}]",
        value,
        min,
        max
    );
}

/// Assert that a collection is sorted
pub fn assert_sorted<T: PartialOrd + Debug>(collection: &[T]) {
    for window in collection.windows(2) {
        assert!(
            window[0] <= window[1],
            "Collection not sorted at elements: {:?} > {:?}",
            window[0],
            window[1]
        );
    }
}

/// Assert that an error contains a specific message
pub fn assert_error_contains<E: std::fmt::Display>(error: &E, expected: &str) {
    let error_str = error.to_string();
    assert!(
        error_str.contains(expected),
        "Error message '{}' does not contain '{}'",
        error_str,
        expected
    );
}

/// Assert that a Result is Err and matches a pattern
#[macro_export]
macro_rules! assert_err_matches {
    ($result:expr, $pattern:pat) => {
        match $result {
            Err($pattern) => (),
            Err(other) => panic!("Err value does not match pattern: {:?}", other),
            Ok(v) => panic!("Expected Err, got Ok: {:?}", v),
        }
    };
}

/// Assert that every thread observed the same value
///
/// Used for once-only computations raced from several threads.
pub fn assert_all_equal<T: PartialEq + Debug>(values: &[T]) {
    if let Some(first) = values.first() {
        for (index, value) in values.iter().enumerate() {
            assert_eq!(
                value, first,
                "Value at index {} differs from the first value",
                index
            );
        }
    }
}

/// Performance assertion for testing execution time limits
///
/// Asserts on drop that the scope finished within `max_duration`.
#[derive(Debug)]
pub struct PerformanceAssertion {
    name: String,
    start: std::time::Instant,
    max_duration: std::time::Duration,
}

impl PerformanceAssertion {
    /// Start timing `name` against `max_duration`
    pub fn new(name: impl Into<String>, max_duration: std::time::Duration) -> Self {
        Self {
            name: name.into(),
            start: std::time::Instant::now(),
            max_duration,
        }
    }
}

impl Drop for PerformanceAssertion {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        assert!(
            elapsed <= self.max_duration,
            "Performance assertion '{}' failed: {:?} > {:?}",
            self.name,
            elapsed,
            self.max_duration
        );
    }
}
