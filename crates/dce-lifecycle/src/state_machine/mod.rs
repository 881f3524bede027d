//! Draft lifecycle states and the transition table

use crate::error::StateMachineError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Where a draft is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// No draft, waiting for a response
    #[default]
    Idle,
    /// Validated draft held in memory
    DraftReady,
    /// Draft shown as JSON
    Previewing,
    /// Dry-run in flight
    Testing,
    /// Draft copied into the live form
    Applied,
    /// Draft persisted
    Saved,
    /// Form edited after the draft was applied
    Outdated,
    /// Last response, validation or test failed
    Error,
}

impl LifecycleState {
    /// All states, in declaration order
    pub const ALL: [Self; 8] = [
        Self::Idle,
        Self::DraftReady,
        Self::Previewing,
        Self::Testing,
        Self::Applied,
        Self::Saved,
        Self::Outdated,
        Self::Error,
    ];

    /// Wire label
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::DraftReady => "draft_ready",
            Self::Previewing => "previewing",
            Self::Testing => "testing",
            Self::Applied => "applied",
            Self::Saved => "saved",
            Self::Outdated => "outdated",
            Self::Error => "error",
        }
    }
}

impl Display for LifecycleState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validates a state transition.
///
/// Illegal transitions return an error so callers can report misuse. With the
/// `strict-debug` feature they panic instead.
pub fn validate_transition(
    from: LifecycleState,
    to: LifecycleState,
) -> Result<(), StateMachineError> {
    if allowed(from, to) {
        Ok(())
    } else {
        #[cfg(feature = "strict-debug")]
        panic!("Illegal lifecycle transition attempted: {from} -> {to}");

        Err(StateMachineError::IllegalTransition { from, to })
    }
}

/// States reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: LifecycleState) -> Vec<LifecycleState> {
    use LifecycleState::*;
    match from {
        Idle => vec![Idle, DraftReady, Error],
        DraftReady => vec![Idle, Previewing, Testing, Applied, Saved, Error],
        Previewing => vec![Idle, DraftReady, Applied, Outdated],
        Testing => vec![Idle, DraftReady, Error],
        Applied => vec![Idle, Previewing, Outdated],
        Outdated => vec![Idle, Previewing, Applied],
        Saved => vec![Idle],
        Error => vec![Idle],
    }
}

fn allowed(from: LifecycleState, to: LifecycleState) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}
