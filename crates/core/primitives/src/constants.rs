//! Default values for the primitives
//!
//! Single source of truth for sizing numbers used by configuration defaults.

/// Initial bucket capacity of a [`ConcurrentMap`](crate::ConcurrentMap)
pub const DEFAULT_MAP_CAPACITY: usize = 64;

/// Initial bucket capacity of a [`MemoizingCache`](crate::MemoizingCache)
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Upper bound accepted for any initial capacity
pub const MAX_INITIAL_CAPACITY: usize = 1 << 24;

/// Environment variable prefix for configuration overrides
pub const CONFIG_ENV_PREFIX: &str = "PRIMITIVES";

/// Separator between nested keys in environment overrides
pub const CONFIG_ENV_SEPARATOR: &str = "__";
