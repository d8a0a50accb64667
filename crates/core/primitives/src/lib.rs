//! Core concurrency and state primitives for ShrivenQ
//!
//! Shared building blocks used by adapters, engines and strategies:
//!
//! - [`ReentrantLock`]: re-entrant mutex whose uncontended and re-entrant
//!   paths never touch the parking lock
//! - [`ConcurrentMap`]: hash map with every operation under one
//!   [`ReentrantLock`], plus scoped group atomicity via [`ConcurrentMap::enter`]
//! - [`MemoizingCache`]: compute-once cache over a [`ConcurrentMap`], single
//!   flight per key
//! - [`FiniteStateMachine`]: integer-coded state machine driven by a
//!   [`TransitionTable`], with the standard component lifecycle in
//!   [`lifecycle`]

#![warn(missing_docs)]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod fsm;
pub mod lifecycle;
pub mod lock;
pub mod map;

// Re-exports
pub use cache::MemoizingCache;
pub use config::{CacheConfig, MapConfig, PrimitivesConfig};
pub use error::{ConfigError, FsmError, FsmResult, LockError};
pub use fsm::{FiniteStateMachine, Namer, Transition, TransitionTable};
pub use lifecycle::{
    ComponentState, ComponentTrigger, component_fsm, component_transition_table,
};
pub use lock::{LockSnapshot, ReentrantLock, ReentrantLockGuard, ThreadToken};
pub use map::{ConcurrentMap, MapGuard};
