//! Error types for the core primitives

use crate::lock::ThreadToken;
use thiserror::Error;

/// Lock misuse errors
///
/// Contention is never an error: a failed non-blocking acquisition is
/// reported as `false`. These variants signal a bug in the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    /// Release attempted by a thread that does not own the lock
    #[error("cannot release lock: caller {caller} is not the owner (owner: {})", display_owner(.owner))]
    NotOwner {
        /// Thread that attempted the release
        caller: ThreadToken,
        /// Thread holding the lock at the time, if any
        owner: Option<ThreadToken>,
    },
}

fn display_owner(owner: &Option<ThreadToken>) -> String {
    owner.map_or_else(|| "none".to_string(), |token| token.to_string())
}

/// State machine errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FsmError {
    /// A state machine needs at least one transition
    #[error("transition table must not be empty")]
    EmptyTransitionTable,

    /// The same `(state, trigger)` pair was declared twice
    #[error("duplicate transition for state {state} on trigger {trigger}")]
    DuplicateTransition {
        /// Source state code
        state: i32,
        /// Trigger code
        trigger: i32,
    },

    /// The trigger has no entry for the current state
    #[error("invalid state trigger: {state_name} -> {trigger_name}")]
    InvalidStateTrigger {
        /// Current state code (unchanged by the failed trigger)
        state: i32,
        /// Attempted trigger code
        trigger: i32,
        /// Human readable current state
        state_name: String,
        /// Human readable trigger
        trigger_name: String,
    },
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Source could not be read or deserialized
    #[error("failed to load configuration from {path}: {source}")]
    Load {
        /// Path of the configuration file
        path: String,
        /// Underlying loader error
        #[source]
        source: config::ConfigError,
    },

    /// A value was read but is not usable
    #[error("invalid configuration: {message}")]
    Invalid {
        /// What was wrong with the value
        message: String,
    },
}

/// Type alias for state machine results
pub type FsmResult<T> = Result<T, FsmError>;
