// ABOUTME: Explicit state machine for the OAuth callback flow
// ABOUTME: Transition table keyed on (state, event); invalid events are rejected
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Passlink Contributors

//! Callback flow state machine
//!
//! Replay protection falls out of the table: a second callback while an
//! exchange is in flight (or already completed) raises `CallbackReceived`
//! in `Loading`/`Authenticated`, which no table entry accepts.

use thiserror::Error;

/// States of one login attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// No attempt in progress; initial and post-logout/post-reset state
    Idle,
    /// Callback accepted, exchange sequence running
    Loading,
    /// Exchange succeeded; session holds a token set
    Authenticated,
    /// Attempt failed; a fresh authorization is the only way forward
    Error,
}

/// Events driving the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowEvent {
    /// A callback with query parameters arrived
    CallbackReceived,
    /// The redirect carried an `error` parameter
    ProviderError,
    /// A validation or exchange step failed
    ExchangeFailed,
    /// The token exchange completed and the session is populated
    ExchangeCompleted,
    /// Explicit reset: logout, or re-initiating authorization after an error
    Reset,
}

/// An event arrived in a state that does not accept it
#[derive(Debug, Clone, Copy, Error)]
#[error("event {event:?} rejected in state {state:?}")]
pub struct TransitionRejected {
    /// State the machine was in
    pub state: FlowState,
    /// The rejected event
    pub event: FlowEvent,
}

/// The transition table. Anything not listed is rejected.
#[must_use]
pub fn transition(state: FlowState, event: FlowEvent) -> Option<FlowState> {
    use FlowEvent::{CallbackReceived, ExchangeCompleted, ExchangeFailed, ProviderError, Reset};
    use FlowState::{Authenticated, Error, Idle, Loading};

    match (state, event) {
        (Idle, CallbackReceived) => Some(Loading),
        (Loading, ProviderError | ExchangeFailed) => Some(Error),
        (Loading, ExchangeCompleted) => Some(Authenticated),
        (Authenticated | Error, Reset) => Some(Idle),
        _ => None,
    }
}

/// Holds the current state and applies events through the table
#[derive(Debug)]
pub struct FlowMachine {
    state: FlowState,
}

impl Default for FlowMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowMachine {
    /// Create a machine in `Idle`
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: FlowState::Idle,
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> FlowState {
        self.state
    }

    /// Apply an event, advancing the state or rejecting the event
    ///
    /// # Errors
    ///
    /// Returns [`TransitionRejected`] when the table has no entry for the
    /// current `(state, event)` pair; the state is left unchanged.
    pub fn apply(&mut self, event: FlowEvent) -> Result<FlowState, TransitionRejected> {
        match transition(self.state, event) {
            Some(next) => {
                self.state = next;
                Ok(next)
            }
            None => Err(TransitionRejected {
                state: self.state,
                event,
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut machine = FlowMachine::new();
        assert_eq!(
            machine.apply(FlowEvent::CallbackReceived).unwrap(),
            FlowState::Loading
        );
        assert_eq!(
            machine.apply(FlowEvent::ExchangeCompleted).unwrap(),
            FlowState::Authenticated
        );
        assert_eq!(machine.apply(FlowEvent::Reset).unwrap(), FlowState::Idle);
    }

    #[test]
    fn test_replay_is_rejected_while_loading() {
        let mut machine = FlowMachine::new();
        machine.apply(FlowEvent::CallbackReceived).unwrap();
        let rejected = machine.apply(FlowEvent::CallbackReceived).unwrap_err();
        assert_eq!(rejected.state, FlowState::Loading);
        assert_eq!(machine.state(), FlowState::Loading);
    }

    #[test]
    fn test_replay_is_rejected_after_authentication() {
        let mut machine = FlowMachine::new();
        machine.apply(FlowEvent::CallbackReceived).unwrap();
        machine.apply(FlowEvent::ExchangeCompleted).unwrap();
        assert!(machine.apply(FlowEvent::CallbackReceived).is_err());
    }

    #[test]
    fn test_error_allows_reset_only() {
        let mut machine = FlowMachine::new();
        machine.apply(FlowEvent::CallbackReceived).unwrap();
        machine.apply(FlowEvent::ExchangeFailed).unwrap();
        assert!(machine.apply(FlowEvent::CallbackReceived).is_err());
        assert!(machine.apply(FlowEvent::ExchangeCompleted).is_err());
        assert_eq!(machine.apply(FlowEvent::Reset).unwrap(), FlowState::Idle);
    }

    #[test]
    fn test_idle_rejects_completion_events() {
        let mut machine = FlowMachine::new();
        assert!(machine.apply(FlowEvent::ExchangeCompleted).is_err());
        assert!(machine.apply(FlowEvent::ProviderError).is_err());
    }
}
