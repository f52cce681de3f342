// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tessera_core::error::{ProjectError, ProjectResult};

/// Lifecycle of the single logical operation a session allows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No operation is running.
    #[default]
    Idle,
    /// An operation holds the session.
    Busy,
    /// An operation panicked while holding the session.
    Faulted,
}

/// Re-entrancy gate of a project session.
#[derive(Debug, Default)]
pub struct Session {
    state: Mutex<SessionState>,
}

impl Session {
    /// Creates an idle session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        *self.lock()
    }

    /// Claims the session for one operation.
    ///
    /// ## Errors
    /// `OperationInProgress` while another operation holds it. A faulted
    /// session is claimed anyway, with a warning.
    pub fn enter(&self) -> ProjectResult<BusyGuard<'_>> {
        let mut state = self.lock();
        match *state {
            SessionState::Busy => return Err(ProjectError::OperationInProgress),
            SessionState::Faulted => {
                log::warn!("Session: entering after a faulted operation, state may be inconsistent.");
            }
            SessionState::Idle => {}
        }
        *state = SessionState::Busy;
        Ok(BusyGuard { session: self })
    }

    /// Returns to idle whatever the current state.
    pub fn force_reset(&self) {
        let mut state = self.lock();
        if *state != SessionState::Idle {
            log::warn!("Session: forced reset from {:?}.", *state);
        }
        *state = SessionState::Idle;
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Holds the session busy until dropped.
#[derive(Debug)]
pub struct BusyGuard<'a> {
    session: &'a Session,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let next = if std::thread::panicking() {
            SessionState::Faulted
        } else {
            SessionState::Idle
        };
        *self.session.lock() = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_entry_is_rejected() {
        let session = Session::new();
        let guard = session.enter().expect("first entry");
        assert_eq!(session.state(), SessionState::Busy);
        assert_eq!(session.enter().err(), Some(ProjectError::OperationInProgress));
        drop(guard);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.enter().is_ok());
    }

    #[test]
    fn test_panic_leaves_session_faulted() {
        let session = Session::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = session.enter().expect("entry");
            panic!("operation failed");
        }));
        assert!(result.is_err());
        assert_eq!(session.state(), SessionState::Faulted);

        let guard = session.enter().expect("faulted session can be entered");
        drop(guard);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_force_reset_clears_busy() {
        let session = Session::new();
        let guard = session.enter().expect("entry");
        session.force_reset();
        assert_eq!(session.state(), SessionState::Idle);
        drop(guard);
        assert_eq!(session.state(), SessionState::Idle);
    }
}
