//! # Core Lifecycle States
//!
//! States are reported by the machine and only observed on the host; the host
//! never stores them, it polls and reacts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of one core as reported by a state query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoreState {
    /// Binary loaded but not yet signalled
    NotStarted,
    /// Waiting for the start signal
    Ready,
    /// Executing
    Running,
    /// Exited cleanly after flushing provenance
    Finished,
    /// Dropped out of the run loop without finishing
    Idle,
    /// Watchdog timer fired
    Watchdog,
    /// Crashed with a runtime exception
    RuntimeException,
}

impl CoreState {
    /// Whether this state indicates a crashed core
    #[inline]
    pub const fn is_fault(&self) -> bool {
        matches!(self, CoreState::Watchdog | CoreState::RuntimeException)
    }
}

impl fmt::Display for CoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CoreState::NotStarted => "not-started",
            CoreState::Ready => "ready",
            CoreState::Running => "running",
            CoreState::Finished => "finished",
            CoreState::Idle => "idle",
            CoreState::Watchdog => "watchdog",
            CoreState::RuntimeException => "runtime-exception",
        };
        f.write_str(name)
    }
}
