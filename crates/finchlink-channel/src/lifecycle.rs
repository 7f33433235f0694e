//! Connection state shared by callers and the I/O worker.
//!
//! Every transition bumps a generation counter. The worker notes the
//! generation before each cycle and checks it afterwards, so a close that
//! lands mid-cycle is reported to the waiting caller as a disconnect.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ChannelError, Result};

/// Lifecycle state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Closed,
    Open,
    Reconnecting,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionState::Closed => "closed",
            ConnectionState::Open => "open",
            ConnectionState::Reconnecting => "reconnecting",
        })
    }
}

#[derive(Debug)]
struct StateCell {
    state: ConnectionState,
    generation: u64,
    /// Why the link was dropped, if it was not closed on request.
    fault: Option<String>,
}

#[derive(Debug)]
pub(crate) struct Lifecycle {
    cell: Mutex<StateCell>,
    /// Serializes open/close/restart. The worker never takes this lock.
    transition: Mutex<()>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            cell: Mutex::new(StateCell {
                state: ConnectionState::Closed,
                generation: 0,
                fault: None,
            }),
            transition: Mutex::new(()),
        }
    }

    pub(crate) fn state(&self) -> ConnectionState {
        self.cell().state
    }

    /// Reason for the last unrequested close, if the connection is down
    /// because of it.
    pub(crate) fn fault(&self) -> Option<String> {
        self.cell().fault.clone()
    }

    /// Check whether a request may be sent right now.
    ///
    /// Returns the current generation when open.
    pub(crate) fn admit(&self) -> Result<u64> {
        let cell = self.cell();
        match (cell.state, &cell.fault) {
            (ConnectionState::Open, _) => Ok(cell.generation),
            (ConnectionState::Reconnecting, _) => Err(ChannelError::Disconnected(
                "connection is reconnecting".to_string(),
            )),
            (ConnectionState::Closed, Some(fault)) => Err(ChannelError::Disconnected(fault.clone())),
            (ConnectionState::Closed, None) => Err(ChannelError::NotOpen),
        }
    }

    /// Whether the connection is still open under `generation`.
    pub(crate) fn is_current(&self, generation: u64) -> bool {
        let cell = self.cell();
        cell.state == ConnectionState::Open && cell.generation == generation
    }

    /// Move to `state` on request, clearing any recorded fault.
    pub(crate) fn set(&self, state: ConnectionState) -> u64 {
        let mut cell = self.cell();
        let from = cell.state;
        cell.state = state;
        cell.generation += 1;
        cell.fault = None;
        if from != state {
            info!(%from, to = %state, generation = cell.generation, "connection state changed");
        }
        cell.generation
    }

    /// Drop to `Closed` because of a failure, remembering why.
    pub(crate) fn set_failed(&self, reason: impl Into<String>) {
        let reason = reason.into();
        let mut cell = self.cell();
        warn!(from = %cell.state, %reason, "connection closed after failure");
        cell.state = ConnectionState::Closed;
        cell.generation += 1;
        cell.fault = Some(reason);
    }

    /// Record a link failure seen by the worker under `generation`.
    ///
    /// Ignored if a transition already moved the connection on. Returns
    /// whether the fault was recorded.
    pub(crate) fn fault_at(&self, generation: u64, reason: impl Into<String>) -> bool {
        let mut cell = self.cell();
        if cell.state != ConnectionState::Open || cell.generation != generation {
            return false;
        }
        let reason = reason.into();
        warn!(%reason, generation, "link failed, connection downgraded to closed");
        cell.state = ConnectionState::Closed;
        cell.generation += 1;
        cell.fault = Some(reason);
        true
    }

    /// Hold this guard for the whole of a transition.
    pub(crate) fn begin_transition(&self) -> MutexGuard<'_, ()> {
        self.transition
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn cell(&self) -> MutexGuard<'_, StateCell> {
        self.cell
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_lifecycle_is_not_open() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.state(), ConnectionState::Closed);
        assert!(matches!(lifecycle.admit(), Err(ChannelError::NotOpen)));
    }

    #[test]
    fn admit_reflects_state() {
        let lifecycle = Lifecycle::new();
        let generation = lifecycle.set(ConnectionState::Open);
        assert_eq!(lifecycle.admit().expect("open should admit"), generation);

        lifecycle.set(ConnectionState::Reconnecting);
        assert!(matches!(
            lifecycle.admit(),
            Err(ChannelError::Disconnected(_))
        ));

        lifecycle.set(ConnectionState::Closed);
        assert!(matches!(lifecycle.admit(), Err(ChannelError::NotOpen)));
    }

    #[test]
    fn fault_only_applies_to_current_generation() {
        let lifecycle = Lifecycle::new();
        let stale = lifecycle.set(ConnectionState::Open);
        let current = lifecycle.set(ConnectionState::Open);

        assert!(!lifecycle.fault_at(stale, "old cycle"));
        assert_eq!(lifecycle.state(), ConnectionState::Open);

        assert!(lifecycle.fault_at(current, "broken pipe"));
        assert_eq!(lifecycle.state(), ConnectionState::Closed);
        assert_eq!(lifecycle.fault().as_deref(), Some("broken pipe"));
        match lifecycle.admit() {
            Err(ChannelError::Disconnected(reason)) => assert_eq!(reason, "broken pipe"),
            other => panic!("expected disconnect, got {other:?}"),
        }
    }

    #[test]
    fn requested_transition_clears_fault() {
        let lifecycle = Lifecycle::new();
        lifecycle.set_failed("unplugged");
        assert!(lifecycle.fault().is_some());

        lifecycle.set(ConnectionState::Open);
        assert!(lifecycle.fault().is_none());
        assert!(lifecycle.admit().is_ok());
    }

    #[test]
    fn generation_moves_on_every_transition() {
        let lifecycle = Lifecycle::new();
        let generation = lifecycle.set(ConnectionState::Open);
        assert!(lifecycle.is_current(generation));
        lifecycle.set(ConnectionState::Closed);
        assert!(!lifecycle.is_current(generation));
    }
}
