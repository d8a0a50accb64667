//! Test utilities shared by the workspace crates
//!
//! - Logging setup for tests
//! - Thread harnesses for concurrency tests
//! - Custom assertions

pub mod assertions;
pub mod helpers;

pub use assertions::*;
pub use helpers::*;
