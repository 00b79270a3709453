//! Dispatch lifecycle states.

use std::fmt;

/// Where a dispatch is in its lifecycle.
///
/// `Idle → Launching → AwaitingSettlement → Transforming → Resolved`, or
/// `Aborted` from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Launching,
    AwaitingSettlement,
    Transforming,
    Resolved,
    Aborted,
}

impl DispatchState {
    pub fn is_terminal(self) -> bool {
        matches!(self, DispatchState::Resolved | DispatchState::Aborted)
    }

    /// Whether `self → next` is a legal transition.
    pub fn can_advance_to(self, next: DispatchState) -> bool {
        use DispatchState::*;
        match (self, next) {
            (Idle, Launching)
            | (Launching, AwaitingSettlement)
            | (AwaitingSettlement, Transforming)
            | (Transforming, Resolved) => true,
            // An empty dispatch has nothing to launch or await.
            (Idle, Resolved) => true,
            (from, Aborted) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DispatchState::Idle => "idle",
            DispatchState::Launching => "launching",
            DispatchState::AwaitingSettlement => "awaiting-settlement",
            DispatchState::Transforming => "transforming",
            DispatchState::Resolved => "resolved",
            DispatchState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Tracks the current state and logs each transition.
#[derive(Debug)]
pub(crate) struct StateTracker {
    state: DispatchState,
}

impl StateTracker {
    pub(crate) fn new() -> Self {
        Self {
            state: DispatchState::Idle,
        }
    }

    #[cfg(test)]
    pub(crate) fn current(&self) -> DispatchState {
        self.state
    }

    pub(crate) fn advance(&mut self, next: DispatchState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal dispatch transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!(from = %self.state, to = %next, "dispatch state");
        self.state = next;
    }
}
