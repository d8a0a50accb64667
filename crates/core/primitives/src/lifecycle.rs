//! Component lifecycle state machine
//!
//! Standard states and triggers for long-lived platform components
//! (adapters, engines, strategies) and the transition table between them.

use crate::error::FsmResult;
use crate::fsm::{FiniteStateMachine, TransitionTable};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ComponentState {
    /// Constructed, not yet initialized
    PreInitialized = 0,
    /// Initialized and idle
    Ready = 1,
    /// Start in progress
    Starting = 2,
    /// Running normally
    Running = 3,
    /// Stop in progress
    Stopping = 4,
    /// Stopped, may resume or reset
    Stopped = 5,
    /// Resume in progress
    Resuming = 6,
    /// Reset in progress
    Resetting = 7,
    /// Disposal in progress
    Disposing = 8,
    /// Disposed, terminal
    Disposed = 9,
    /// Degradation in progress
    Degrading = 10,
    /// Running with reduced functionality
    Degraded = 11,
    /// Fault handling in progress
    Faulting = 12,
    /// Faulted, terminal
    Faulted = 13,
}

impl ComponentState {
    /// Every state, in code order
    pub const ALL: [Self; 14] = [
        Self::PreInitialized,
        Self::Ready,
        Self::Starting,
        Self::Running,
        Self::Stopping,
        Self::Stopped,
        Self::Resuming,
        Self::Resetting,
        Self::Disposing,
        Self::Disposed,
        Self::Degrading,
        Self::Degraded,
        Self::Faulting,
        Self::Faulted,
    ];

    /// Integer code used in transition tables
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Upper-case display name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PreInitialized => "PRE_INITIALIZED",
            Self::Ready => "READY",
            Self::Starting => "STARTING",
            Self::Running => "RUNNING",
            Self::Stopping => "STOPPING",
            Self::Stopped => "STOPPED",
            Self::Resuming => "RESUMING",
            Self::Resetting => "RESETTING",
            Self::Disposing => "DISPOSING",
            Self::Disposed => "DISPOSED",
            Self::Degrading => "DEGRADING",
            Self::Degraded => "DEGRADED",
            Self::Faulting => "FAULTING",
            Self::Faulted => "FAULTED",
        }
    }

    /// State for `code`, if any
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.code() == code)
    }
}

impl fmt::Display for ComponentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i32> for ComponentState {
    type Error = i32;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(code)
    }
}

/// Lifecycle trigger of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ComponentTrigger {
    /// Initialize the component
    Initialize = 1,
    /// Begin starting
    Start = 2,
    /// Start finished
    StartCompleted = 3,
    /// Begin stopping
    Stop = 4,
    /// Stop finished
    StopCompleted = 5,
    /// Begin resuming
    Resume = 6,
    /// Resume finished
    ResumeCompleted = 7,
    /// Begin resetting
    Reset = 8,
    /// Reset finished
    ResetCompleted = 9,
    /// Begin disposal
    Dispose = 10,
    /// Disposal finished
    DisposeCompleted = 11,
    /// Begin degrading
    Degrade = 12,
    /// Degradation finished
    DegradeCompleted = 13,
    /// Begin fault handling
    Fault = 14,
    /// Fault handling finished
    FaultCompleted = 15,
}

impl ComponentTrigger {
    /// Every trigger, in code order
    pub const ALL: [Self; 15] = [
        Self::Initialize,
        Self::Start,
        Self::StartCompleted,
        Self::Stop,
        Self::StopCompleted,
        Self::Resume,
        Self::ResumeCompleted,
        Self::Reset,
        Self::ResetCompleted,
        Self::Dispose,
        Self::DisposeCompleted,
        Self::Degrade,
        Self::DegradeCompleted,
        Self::Fault,
        Self::FaultCompleted,
    ];

    /// Integer code used in transition tables
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Upper-case display name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initialize => "INITIALIZE",
            Self::Start => "START",
            Self::StartCompleted => "START_COMPLETED",
            Self::Stop => "STOP",
            Self::StopCompleted => "STOP_COMPLETED",
            Self::Resume => "RESUME",
            Self::ResumeCompleted => "RESUME_COMPLETED",
            Self::Reset => "RESET",
            Self::ResetCompleted => "RESET_COMPLETED",
            Self::Dispose => "DISPOSE",
            Self::DisposeCompleted => "DISPOSE_COMPLETED",
            Self::Degrade => "DEGRADE",
            Self::DegradeCompleted => "DEGRADE_COMPLETED",
            Self::Fault => "FAULT",
            Self::FaultCompleted => "FAULT_COMPLETED",
        }
    }

    /// Trigger for `code`, if any
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|trigger| trigger.code() == code)
    }
}

impl fmt::Display for ComponentTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i32> for ComponentTrigger {
    type Error = i32;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(code)
    }
}

/// Name of a state code, falling back to the number for unknown codes
#[must_use]
pub fn component_state_name(code: i32) -> String {
    ComponentState::from_code(code).map_or_else(|| code.to_string(), |s| s.as_str().to_string())
}

/// Name of a trigger code, falling back to the number for unknown codes
#[must_use]
pub fn component_trigger_name(code: i32) -> String {
    ComponentTrigger::from_code(code).map_or_else(|| code.to_string(), |t| t.as_str().to_string())
}

/// The standard component transition table
///
/// # Errors
/// Never fails for the built-in table; the result type comes from
/// [`TransitionTable::from_entries`].
pub fn component_transition_table() -> FsmResult<TransitionTable> {
    use ComponentState as S;
    use ComponentTrigger as T;

    let rows = [
        (S::PreInitialized, T::Initialize, S::Ready),
        (S::Ready, T::Reset, S::Resetting),
        (S::Ready, T::Start, S::Starting),
        (S::Ready, T::Dispose, S::Disposing),
        (S::Resetting, T::ResetCompleted, S::Ready),
        (S::Starting, T::StartCompleted, S::Running),
        (S::Starting, T::Stop, S::Stopping),
        (S::Starting, T::Fault, S::Faulting),
        (S::Running, T::Stop, S::Stopping),
        (S::Running, T::Degrade, S::Degrading),
        (S::Running, T::Fault, S::Faulting),
        (S::Resuming, T::Stop, S::Stopping),
        (S::Resuming, T::ResumeCompleted, S::Running),
        (S::Resuming, T::Fault, S::Faulting),
        (S::Stopping, T::StopCompleted, S::Stopped),
        (S::Stopping, T::Fault, S::Faulting),
        (S::Stopped, T::Reset, S::Resetting),
        (S::Stopped, T::Resume, S::Resuming),
        (S::Stopped, T::Dispose, S::Disposing),
        (S::Stopped, T::Fault, S::Faulting),
        (S::Degrading, T::DegradeCompleted, S::Degraded),
        (S::Degraded, T::Resume, S::Resuming),
        (S::Degraded, T::Stop, S::Stopping),
        (S::Degraded, T::Fault, S::Faulting),
        (S::Disposing, T::DisposeCompleted, S::Disposed),
        (S::Faulting, T::FaultCompleted, S::Faulted),
    ];

    TransitionTable::from_entries(
        rows.into_iter()
            .map(|(from, trigger, to)| ((from.code(), trigger.code()), to.code())),
    )
}

/// State machine for a new component, starting in `PRE_INITIALIZED`
///
/// # Errors
/// Propagates table construction errors.
pub fn component_fsm() -> FsmResult<FiniteStateMachine> {
    let table = component_transition_table()?;
    Ok(
        FiniteStateMachine::new(table, ComponentState::PreInitialized.code())?
            .with_namers(component_state_name, component_trigger_name),
    )
}
