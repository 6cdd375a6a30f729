//! state.rs
//! Session lifecycle states and the commit-unless-aborted transition guard.

use std::fmt;
use serde::{Serialize, Deserialize};

/// Lifecycle of one codec instance.
///
/// `Idle -> Data -> {Eos, Error} -> Destroyed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum State {
    /// Created, codec not initialized.
    Idle,
    /// Open for writes.
    Data,
    /// Decompressor reached the natural end of its stream.
    Eos,
    /// Unrecoverable codec fault; only destroy/close remain meaningful.
    Error,
    /// Terminal, codec resources released.
    Destroyed,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Idle      => "idle",
            State::Data      => "data",
            State::Eos       => "eos",
            State::Error     => "error",
            State::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// Operations a session accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Init,
    Write,
    Close,
    Destroy,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Init    => "init",
            Operation::Write   => "write",
            Operation::Close   => "close",
            Operation::Destroy => "destroy",
        };
        f.write_str(name)
    }
}

/// Scoped state transition.
///
/// On creation the guard records the state to write back when it goes out of
/// scope (usually `State::Error`). The operation calls `alter` once it knows
/// the real outcome, or `abort` when it performed its own terminal transition.
/// Any early return (`?`, explicit error, panic unwinding) therefore leaves the
/// session in the recorded fallback state instead of a stale `Data`.
#[must_use = "the transition is committed when the guard is dropped"]
pub struct Transition<'a> {
    state: &'a mut State,
    pending: State,
    aborted: bool,
}

impl<'a> Transition<'a> {
    pub fn new(state: &'a mut State, pending: State) -> Self {
        Self { state, pending, aborted: false }
    }

    /// Change the state written back on scope exit.
    pub fn alter(&mut self, value: State) {
        self.pending = value;
    }

    /// Suppress the write-back.
    pub fn abort(&mut self) {
        self.aborted = true;
    }

    /// State as it was when the guard was created (the guard holds the borrow).
    pub fn current(&self) -> State {
        *self.state
    }
}

impl Drop for Transition<'_> {
    fn drop(&mut self) {
        if !self.aborted {
            *self.state = self.pending;
        }
    }
}
