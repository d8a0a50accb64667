//! Shared fixtures for the primitives integration tests

#![allow(dead_code)]

use primitives::TransitionTable;
use rstest::fixture;

pub const NEW: i32 = 0;
pub const SUBMITTED: i32 = 1;
pub const FILLED: i32 = 2;
pub const CANCELLED: i32 = 3;

pub const SUBMIT: i32 = 1;
pub const FILL: i32 = 2;
pub const CANCEL: i32 = 3;

pub fn order_state_name(code: i32) -> String {
    match code {
        NEW => "NEW".to_string(),
        SUBMITTED => "SUBMITTED".to_string(),
        FILLED => "FILLED".to_string(),
        CANCELLED => "CANCELLED".to_string(),
        other => other.to_string(),
    }
}

pub fn order_trigger_name(code: i32) -> String {
    match code {
        SUBMIT => "SUBMIT".to_string(),
        FILL => "FILL".to_string(),
        CANCEL => "CANCEL".to_string(),
        other => other.to_string(),
    }
}

/// `{(0, 1): 1, (1, 2): 2}`
#[fixture]
pub fn two_step_table() -> TransitionTable {
    TransitionTable::from_entries([((0, 1), 1), ((1, 2), 2)]).unwrap()
}

/// Simplified order lifecycle
#[fixture]
pub fn order_table() -> TransitionTable {
    TransitionTable::new()
        .with(NEW, SUBMIT, SUBMITTED)
        .and_then(|t| t.with(NEW, CANCEL, CANCELLED))
        .and_then(|t| t.with(SUBMITTED, FILL, FILLED))
        .and_then(|t| t.with(SUBMITTED, CANCEL, CANCELLED))
        .unwrap()
}
