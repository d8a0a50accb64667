//! Configuration for the primitives

use crate::constants::{
    CONFIG_ENV_PREFIX, CONFIG_ENV_SEPARATOR, DEFAULT_CACHE_CAPACITY, DEFAULT_MAP_CAPACITY,
    MAX_INITIAL_CAPACITY,
};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimitivesConfig {
    /// Concurrent map sizing
    pub map: MapConfig,
    /// Memoizing cache sizing
    pub cache: CacheConfig,
}

/// Concurrent map configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Entries to reserve room for up front
    pub initial_capacity: usize,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_MAP_CAPACITY,
        }
    }
}

/// Memoizing cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Keys to reserve room for up front
    pub initial_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl PrimitivesConfig {
    /// Load configuration from file, then apply environment overrides
    ///
    /// Overrides use the `PRIMITIVES` prefix with `__` between nested keys,
    /// e.g. `PRIMITIVES__CACHE__INITIAL_CAPACITY=1024`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if a value
    /// is out of range.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .try_parsing(true)
                    .prefix_separator(CONFIG_ENV_SEPARATOR)
                    .separator(CONFIG_ENV_SEPARATOR),
            )
            .build()
            .and_then(|settings| settings.try_deserialize::<Self>())
            .map_err(|source| ConfigError::Load {
                path: path.to_string(),
                source,
            })?;

        settings.validate()?;
        debug!(?settings, path, "primitives configuration loaded");
        Ok(settings)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] naming the first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_capacity("map.initial_capacity", self.map.initial_capacity)?;
        check_capacity("cache.initial_capacity", self.cache.initial_capacity)
    }
}

fn check_capacity(name: &str, value: usize) -> Result<(), ConfigError> {
    if value > MAX_INITIAL_CAPACITY {
        return Err(ConfigError::Invalid {
            message: format!("{name} = {value} exceeds {MAX_INITIAL_CAPACITY}"),
        });
    }
    Ok(())
}
