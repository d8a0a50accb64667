//! Table-driven finite state machine
//!
//! States and triggers are integer codes. A [`TransitionTable`] maps each
//! `(state, trigger)` pair to the next state; pairs not in the table are
//! invalid in that state. Firing an invalid trigger fails with
//! [`FsmError::InvalidStateTrigger`] and leaves the machine where it was.
//!
//! Optional namer functions turn codes into readable names for errors and
//! logs. Without them the decimal code is used.

use crate::error::{FsmError, FsmResult};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use tracing::debug;

/// Converts a state or trigger code to a display name
pub type Namer = Box<dyn Fn(i32) -> String + Send + Sync>;

/// One row of a transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Transition {
    /// Source state
    pub from: i32,
    /// Trigger fired in `from`
    pub trigger: i32,
    /// Resulting state
    pub to: i32,
}

/// Immutable-once-built mapping `(state, trigger) -> next state`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionTable {
    entries: FxHashMap<(i32, i32), i32>,
}

impl TransitionTable {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert)
    ///
    /// # Errors
    /// Returns [`FsmError::DuplicateTransition`] if `(from, trigger)` is
    /// already present.
    pub fn with(mut self, from: i32, trigger: i32, to: i32) -> FsmResult<Self> {
        self.insert(from, trigger, to)?;
        Ok(self)
    }

    /// Add a transition
    ///
    /// # Errors
    /// Returns [`FsmError::DuplicateTransition`] if `(from, trigger)` is
    /// already present. The table is unchanged in that case.
    pub fn insert(&mut self, from: i32, trigger: i32, to: i32) -> FsmResult<()> {
        if self.entries.contains_key(&(from, trigger)) {
            return Err(FsmError::DuplicateTransition {
                state: from,
                trigger,
            });
        }
        self.entries.insert((from, trigger), to);
        Ok(())
    }

    /// Build a table from `((from, trigger), to)` pairs
    ///
    /// # Errors
    /// Returns [`FsmError::DuplicateTransition`] on the first repeated pair.
    pub fn from_entries<I>(entries: I) -> FsmResult<Self>
    where
        I: IntoIterator<Item = ((i32, i32), i32)>,
    {
        let mut table = Self::new();
        for ((from, trigger), to) in entries {
            table.insert(from, trigger, to)?;
        }
        Ok(table)
    }

    /// Next state for `trigger` fired in `state`
    pub fn get(&self, state: i32, trigger: i32) -> Option<i32> {
        self.entries.get(&(state, trigger)).copied()
    }

    /// Number of transitions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no transitions
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every state appearing as a source or a target, ascending
    pub fn states(&self) -> Vec<i32> {
        let mut states: Vec<i32> = self
            .entries
            .iter()
            .flat_map(|(&(from, _), &to)| [from, to])
            .collect::<FxHashSet<_>>()
            .into_iter()
            .collect();
        states.sort_unstable();
        states
    }

    /// Triggers defined for `state`, ascending
    pub fn triggers_from(&self, state: i32) -> Vec<i32> {
        let mut triggers: Vec<i32> = self
            .entries
            .keys()
            .filter(|(from, _)| *from == state)
            .map(|&(_, trigger)| trigger)
            .collect();
        triggers.sort_unstable();
        triggers
    }

    /// States reachable from `start` by any sequence of triggers, ascending
    ///
    /// `start` itself is included.
    pub fn reachable_from(&self, start: i32) -> Vec<i32> {
        let mut seen = FxHashSet::default();
        let mut queue = VecDeque::from([start]);
        seen.insert(start);

        while let Some(state) = queue.pop_front() {
            for (&(from, _), &to) in &self.entries {
                if from == state && seen.insert(to) {
                    queue.push_back(to);
                }
            }
        }

        let mut reachable: Vec<i32> = seen.into_iter().collect();
        reachable.sort_unstable();
        reachable
    }

    /// All transitions sorted by `(from, trigger)`
    pub fn transitions(&self) -> Vec<Transition> {
        let mut rows: Vec<Transition> = self
            .entries
            .iter()
            .map(|(&(from, trigger), &to)| Transition { from, trigger, to })
            .collect();
        rows.sort_unstable();
        rows
    }

    /// Render as a Graphviz digraph, edges labelled with trigger names
    pub fn to_dot(
        &self,
        state_name: &dyn Fn(i32) -> String,
        trigger_name: &dyn Fn(i32) -> String,
    ) -> String {
        let mut dot = String::from("digraph fsm {\n");
        for row in self.transitions() {
            dot.push_str(&format!(
                "    \"{}\" -> \"{}\" [label=\"{}\"];\n",
                state_name(row.from),
                state_name(row.to),
                trigger_name(row.trigger),
            ));
        }
        dot.push_str("}\n");
        dot
    }
}

/// Table-driven state machine
///
/// `trigger` takes `&mut self`; share a machine between threads by wrapping
/// it in a lock.
pub struct FiniteStateMachine {
    table: TransitionTable,
    state: i32,
    state_namer: Option<Namer>,
    trigger_namer: Option<Namer>,
}

impl FiniteStateMachine {
    /// Create a machine in `initial` state
    ///
    /// `initial` is not required to appear in the table; a machine started
    /// outside the table simply has no valid triggers.
    ///
    /// # Errors
    /// Returns [`FsmError::EmptyTransitionTable`] if `table` is empty.
    pub fn new(table: TransitionTable, initial: i32) -> FsmResult<Self> {
        if table.is_empty() {
            return Err(FsmError::EmptyTransitionTable);
        }
        Ok(Self {
            table,
            state: initial,
            state_namer: None,
            trigger_namer: None,
        })
    }

    /// Attach functions naming states and triggers in errors and logs
    #[must_use]
    pub fn with_namers(
        mut self,
        state_namer: impl Fn(i32) -> String + Send + Sync + 'static,
        trigger_namer: impl Fn(i32) -> String + Send + Sync + 'static,
    ) -> Self {
        self.state_namer = Some(Box::new(state_namer));
        self.trigger_namer = Some(Box::new(trigger_namer));
        self
    }

    /// Fire `trigger`, moving to the state the table names
    ///
    /// # Errors
    /// Returns [`FsmError::InvalidStateTrigger`] if the table has no entry
    /// for the current state and `trigger`. The state is unchanged.
    pub fn trigger(&mut self, trigger: i32) -> FsmResult<i32> {
        let Some(next) = self.table.get(self.state, trigger) else {
            return Err(FsmError::InvalidStateTrigger {
                state: self.state,
                trigger,
                state_name: self.state_name(self.state),
                trigger_name: self.trigger_name(trigger),
            });
        };

        debug!(
            from = %self.state_name(self.state),
            trigger = %self.trigger_name(trigger),
            to = %self.state_name(next),
            "state transition"
        );
        self.state = next;
        Ok(next)
    }

    /// Current state code
    pub fn state(&self) -> i32 {
        self.state
    }

    /// Current state name
    pub fn state_string(&self) -> String {
        self.state_name(self.state)
    }

    /// Whether `trigger` is valid in the current state
    pub fn can_trigger(&self, trigger: i32) -> bool {
        self.table.get(self.state, trigger).is_some()
    }

    /// Triggers valid in the current state, ascending
    pub fn valid_triggers(&self) -> Vec<i32> {
        self.table.triggers_from(self.state)
    }

    /// Whether no trigger is valid in the current state
    pub fn is_terminal(&self) -> bool {
        self.valid_triggers().is_empty()
    }

    /// The machine's transition table
    pub fn transition_table(&self) -> &TransitionTable {
        &self.table
    }

    /// Render the transition table as Graphviz using this machine's namers
    pub fn to_dot(&self) -> String {
        self.table
            .to_dot(&|s: i32| self.state_name(s), &|t: i32| self.trigger_name(t))
    }

    fn state_name(&self, state: i32) -> String {
        self.state_namer
            .as_ref()
            .map_or_else(|| state.to_string(), |name| name(state))
    }

    fn trigger_name(&self, trigger: i32) -> String {
        self.trigger_namer
            .as_ref()
            .map_or_else(|| trigger.to_string(), |name| name(trigger))
    }
}

impl fmt::Debug for FiniteStateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FiniteStateMachine")
            .field("state", &self.state_string())
            .field("transitions", &self.table.len())
            .finish()
    }
}
