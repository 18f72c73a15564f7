use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use crate::error::{TransferError, TransferResult};

/// Transitions kept for inspection
const MAX_HISTORY: usize = 64;

/// Progress of one user-initiated send or sign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WorkflowState {
    Idle,
    /// Validating input and assembling message and fee
    Building,
    /// Waiting on the identity service
    Signing,
    /// Submitted; the transaction hash is known
    Broadcasting,
    /// Fetching and decoding the committed transaction
    Confirming,
    Done,
    Failed,
}

impl WorkflowState {
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            WorkflowState::Building | WorkflowState::Signing | WorkflowState::Broadcasting | WorkflowState::Confirming
        )
    }

    pub fn can_transition_to(self, next: WorkflowState) -> bool {
        use WorkflowState::*;
        match (self, next) {
            (Idle | Done | Failed, Building) => true,
            (Building, Signing) => true,
            // sign-only attempts finish straight after signing
            (Signing, Broadcasting | Done) => true,
            (Broadcasting, Confirming | Done) => true,
            (Confirming, Done) => true,
            (from, Failed) => from.is_in_flight(),
            _ => false,
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateTransition {
    pub from: WorkflowState,
    pub to: WorkflowState,
    pub at: DateTime<Utc>,
}

struct Inner {
    state: WorkflowState,
    history: Vec<StateTransition>,
}

/// State machine shared by all attempts on one workflow.
///
/// Only one attempt may be in flight; the lock is never held across an await.
pub struct StateMachine {
    inner: Mutex<Inner>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: WorkflowState::Idle,
                history: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock still holds a consistent state value
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> WorkflowState {
        self.lock().state
    }

    pub fn history(&self) -> Vec<StateTransition> {
        self.lock().history.clone()
    }

    /// Start a new attempt in `Building`, or fail with `Busy`
    pub fn begin(&self) -> TransferResult<Attempt<'_>> {
        let mut inner = self.lock();
        if inner.state.is_in_flight() {
            return Err(TransferError::Busy(inner.state.to_string()));
        }
        Self::record(&mut inner, WorkflowState::Building);
        Ok(Attempt {
            machine: self,
            finished: false,
        })
    }

    /// Move to `next`. An illegal move fails the attempt in flight.
    fn transition(&self, next: WorkflowState) {
        let mut inner = self.lock();
        if inner.state.can_transition_to(next) {
            Self::record(&mut inner, next);
            return;
        }

        log::error!("Illegal workflow transition {} -> {}", inner.state, next);
        if inner.state.is_in_flight() {
            Self::record(&mut inner, WorkflowState::Failed);
        }
    }

    fn fail(&self) {
        let mut inner = self.lock();
        if inner.state.is_in_flight() {
            Self::record(&mut inner, WorkflowState::Failed);
        }
    }

    fn record(inner: &mut Inner, next: WorkflowState) {
        log::debug!("Workflow {} -> {}", inner.state, next);
        let transition = StateTransition {
            from: inner.state,
            to: next,
            at: Utc::now(),
        };
        if inner.history.len() == MAX_HISTORY {
            inner.history.remove(0);
        }
        inner.history.push(transition);
        inner.state = next;
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// One in-flight attempt. Dropping it before `finish` marks the attempt `Failed`.
pub struct Attempt<'a> {
    machine: &'a StateMachine,
    finished: bool,
}

impl Attempt<'_> {
    pub fn advance(&mut self, next: WorkflowState) {
        self.machine.transition(next);
    }

    pub fn finish(mut self) {
        self.machine.transition(WorkflowState::Done);
        self.finished = true;
    }
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.machine.fail();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(machine: &StateMachine) -> Vec<WorkflowState> {
        machine.history().iter().map(|t| t.to).collect()
    }

    #[test]
    fn test_full_send_path() {
        let machine = StateMachine::new();
        let mut attempt = machine.begin().unwrap();
        attempt.advance(WorkflowState::Signing);
        attempt.advance(WorkflowState::Broadcasting);
        attempt.advance(WorkflowState::Confirming);
        attempt.finish();

        assert_eq!(machine.state(), WorkflowState::Done);
        assert_eq!(
            path(&machine),
            vec![
                WorkflowState::Building,
                WorkflowState::Signing,
                WorkflowState::Broadcasting,
                WorkflowState::Confirming,
                WorkflowState::Done,
            ]
        );
    }

    #[test]
    fn test_dropped_attempt_fails() {
        let machine = StateMachine::new();
        {
            let mut attempt = machine.begin().unwrap();
            attempt.advance(WorkflowState::Signing);
        }
        assert_eq!(machine.state(), WorkflowState::Failed);

        // A failed attempt does not block the next one
        let attempt = machine.begin().unwrap();
        assert_eq!(machine.state(), WorkflowState::Building);
        drop(attempt);
    }

    #[test]
    fn test_reentrancy_guard() {
        let machine = StateMachine::new();
        let _attempt = machine.begin().unwrap();

        let result = machine.begin();
        assert!(matches!(result, Err(TransferError::Busy(_))));
        assert_eq!(machine.state(), WorkflowState::Building);
    }

    #[test]
    fn test_transition_table() {
        use WorkflowState::*;
        assert!(Idle.can_transition_to(Building));
        assert!(Done.can_transition_to(Building));
        assert!(Failed.can_transition_to(Building));
        assert!(Signing.can_transition_to(Done));
        assert!(Confirming.can_transition_to(Failed));

        assert!(!Idle.can_transition_to(Signing));
        assert!(!Building.can_transition_to(Confirming));
        assert!(!Done.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Failed));
        assert!(!Building.can_transition_to(Building));
    }

    #[test]
    fn test_history_is_bounded() {
        let machine = StateMachine::new();
        for _ in 0..100 {
            let mut attempt = machine.begin().unwrap();
            attempt.advance(WorkflowState::Signing);
            attempt.finish();
        }
        assert_eq!(machine.history().len(), MAX_HISTORY);
        assert_eq!(machine.state(), WorkflowState::Done);
    }

    #[test]
    fn test_illegal_transition_fails_attempt() {
        let machine = StateMachine::new();
        machine.begin().unwrap().finish();
        assert_eq!(machine.state(), WorkflowState::Failed);
        assert_eq!(path(&machine), vec![WorkflowState::Building, WorkflowState::Failed]);

        let mut attempt = machine.begin().unwrap();
        attempt.advance(WorkflowState::Confirming);
        assert_eq!(machine.state(), WorkflowState::Failed);
        drop(attempt);
        assert_eq!(machine.history().len(), 4);

        // Nothing is left stuck in flight
        let attempt = machine.begin().unwrap();
        attempt.finish();
        assert_eq!(machine.state(), WorkflowState::Failed);
        assert!(machine.begin().is_ok());
    }
}
