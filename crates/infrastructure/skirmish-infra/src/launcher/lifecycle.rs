//! Lifecycle of one engine process and the channel its events travel on.
//!
//! A [`Lifecycle`] is owned by the supervising task; the matching
//! [`LaunchHandle`] goes to the caller. State moves `Idle -> Running ->
//! Finished | Failed`. The first terminal transition wins: later exits,
//! errors and output lines are dropped.

use skirmish_core::{LaunchEvent, ProcessState};
use tokio::sync::{mpsc, watch};

pub struct Lifecycle {
    state: watch::Sender<ProcessState>,
    events: mpsc::UnboundedSender<LaunchEvent>,
}

impl Lifecycle {
    pub fn new() -> (Self, LaunchHandle) {
        let (state_tx, state_rx) = watch::channel(ProcessState::Idle);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        (
            Self {
                state: state_tx,
                events: events_tx,
            },
            LaunchHandle {
                events: events_rx,
                state: state_rx,
            },
        )
    }

    pub fn state(&self) -> ProcessState {
        self.state.borrow().clone()
    }

    /// Called once the spawn call succeeded.
    pub fn mark_running(&self) -> bool {
        self.state.send_if_modified(|state| {
            if matches!(state, ProcessState::Idle) {
                *state = ProcessState::Running;
                true
            } else {
                false
            }
        })
    }

    /// Forwards a stdout/stderr line while the process is running.
    pub fn output(&self, event: LaunchEvent) {
        debug_assert!(!event.is_terminal());
        if self.state.borrow().is_running() {
            let _ = self.events.send(event);
        }
    }

    /// Normal exit with code 0. Ignored unless running.
    pub fn finish(&self, exit_code: i32) -> bool {
        self.transition(
            ProcessState::is_running,
            ProcessState::Finished { exit_code },
            LaunchEvent::Finished(exit_code),
        )
    }

    /// Normal exit with a non-zero code. Ignored unless running.
    pub fn fail_exit(&self, exit_code: i32, reason: impl Into<String>) -> bool {
        let reason = reason.into();
        self.transition(
            ProcessState::is_running,
            ProcessState::Failed {
                exit_code: Some(exit_code),
                reason: reason.clone(),
            },
            LaunchEvent::Failed(reason),
        )
    }

    /// Failure that did not come from a process exit: bad settings, missing
    /// binary, spawn or wait errors. Accepted from any non-terminal state.
    pub fn fail(&self, reason: impl Into<String>) -> bool {
        let reason = reason.into();
        self.transition(
            |state| !state.is_terminal(),
            ProcessState::Failed {
                exit_code: None,
                reason: reason.clone(),
            },
            LaunchEvent::Failed(reason),
        )
    }

    fn transition(
        &self,
        allowed: impl Fn(&ProcessState) -> bool,
        next: ProcessState,
        event: LaunchEvent,
    ) -> bool {
        let moved = self.state.send_if_modified(|state| {
            if allowed(state) {
                *state = next;
                true
            } else {
                false
            }
        });
        if moved {
            let _ = self.events.send(event);
        }
        moved
    }
}

/// Caller side of a launch. Events arrive in order: output lines, then
/// exactly one `Finished` or `Failed`. The channel closes once supervision,
/// including any clean-up, is over.
///
/// The channel is unbounded so the engine never blocks on a slow reader.
/// Events that are not read stay buffered until the handle is drained or
/// dropped; a caller that stops reading for a long session holds all of the
/// engine's output in memory. Dropping the handle discards further output.
pub struct LaunchHandle {
    events: mpsc::UnboundedReceiver<LaunchEvent>,
    state: watch::Receiver<ProcessState>,
}

impl LaunchHandle {
    pub async fn next_event(&mut self) -> Option<LaunchEvent> {
        self.events.recv().await
    }

    pub fn state(&self) -> ProcessState {
        self.state.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ProcessState> {
        self.state.clone()
    }

    /// Drains every event until supervision ends and returns them together
    /// with the final state.
    pub async fn collect(mut self) -> (Vec<LaunchEvent>, ProcessState) {
        let mut events = Vec::new();
        while let Some(event) = self.events.recv().await {
            events.push(event);
        }
        let state = self.state.borrow().clone();
        (events, state)
    }
}
