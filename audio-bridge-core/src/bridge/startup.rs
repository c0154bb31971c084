use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::models::error::BridgeError;

/// One-shot "open finished" signal with a bounded wait.
///
/// A waiter that times out abandons the signal. The completing side learns
/// this from [`complete`](Self::complete) and owns the cleanup from then on.
#[derive(Default)]
pub struct StartupSignal {
    state: Mutex<StartupState>,
    ready: Condvar,
}

#[derive(Default)]
struct StartupState {
    outcome: Option<Result<(), BridgeError>>,
    abandoned: bool,
}

impl StartupSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the open outcome and wake the waiter.
    ///
    /// Returns `false` if the waiter already gave up; the outcome is dropped.
    pub fn complete(&self, outcome: Result<(), BridgeError>) -> bool {
        let mut state = self.state.lock();
        if state.abandoned {
            return false;
        }
        state.outcome = Some(outcome);
        self.ready.notify_all();
        true
    }

    /// Wait up to `timeout` for [`complete`](Self::complete).
    ///
    /// Returns `None` on timeout, after which the signal is abandoned.
    pub fn wait(&self, timeout: Duration) -> Option<Result<(), BridgeError>> {
        let mut state = self.state.lock();
        if state.outcome.is_none() {
            self.ready
                .wait_while_for(&mut state, |state| state.outcome.is_none(), timeout);
        }
        let outcome = state.outcome.take();
        if outcome.is_none() {
            state.abandoned = true;
        }
        outcome
    }
}
