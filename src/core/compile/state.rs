//! Compilation state machine
//!
//! `Initialized -> Built -> Validated -> Ready | Blocked`. Ready and Blocked
//! are terminal.

use crate::domain::{Result, RoiError};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompileState {
    Initialized,
    Built,
    Validated,
    /// No error findings; the package is final
    Ready,
    /// At least one error finding
    Blocked,
}

impl CompileState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompileState::Initialized => "initialized",
            CompileState::Built => "built",
            CompileState::Validated => "validated",
            CompileState::Ready => "ready",
            CompileState::Blocked => "blocked",
        }
    }

    pub fn can_transition_to(&self, next: CompileState) -> bool {
        matches!(
            (self, next),
            (CompileState::Initialized, CompileState::Built)
                | (CompileState::Built, CompileState::Validated)
                | (CompileState::Validated, CompileState::Ready)
                | (CompileState::Validated, CompileState::Blocked)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CompileState::Ready | CompileState::Blocked)
    }
}

impl fmt::Display for CompileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current state of one run and the states it went through
#[derive(Debug, Clone)]
pub struct StateMachine {
    state: CompileState,
    history: Vec<CompileState>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: CompileState::Initialized,
            history: vec![CompileState::Initialized],
        }
    }

    pub fn state(&self) -> CompileState {
        self.state
    }

    pub fn history(&self) -> &[CompileState] {
        &self.history
    }

    /// Moves to `next`, logging the transition
    ///
    /// # Errors
    ///
    /// Returns `RoiError::InvalidTransition` for a transition the machine
    /// does not allow.
    pub fn transition(&mut self, next: CompileState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(RoiError::InvalidTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        tracing::info!(from = %self.state, to = %next, "Compilation state changed");
        self.state = next;
        self.history.push(next);
        Ok(())
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
