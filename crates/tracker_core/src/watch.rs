//! Generation-tagged watch sessions.
//!
//! The watcher owns the generation counter. Every watch session, and every
//! start request, takes a fresh generation; anything that comes back tagged
//! with an older generation is stale and must not touch the view.

use crate::{Generation, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchMode {
    /// Fresh task started from this client.
    Continuous,
    /// Resumed observation of a task picked from history.
    OneShot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Immediate check issued, no answer yet.
    InitialCheck,
    /// Non-terminal answer seen, timer armed.
    Pending,
    /// Timer fired, follow-up check in flight.
    Checking,
    Terminal(TerminalReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalReason {
    Success,
    Failure,
    TransportError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSession {
    pub generation: Generation,
    pub task_id: TaskId,
    pub mode: WatchMode,
    pub phase: SessionPhase,
}

impl WatchSession {
    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, SessionPhase::Terminal(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct Watcher {
    generation: Generation,
    /// Generation of an outstanding start request, if any.
    starting: Option<Generation>,
    session: Option<WatchSession>,
}

impl Watcher {
    pub(crate) fn generation(&self) -> Generation {
        self.generation
    }

    pub(crate) fn session(&self) -> Option<&WatchSession> {
        self.session.as_ref()
    }

    pub(crate) fn is_starting(&self) -> bool {
        self.starting.is_some()
    }

    /// Ends whatever is current. Returns true when a timer may still be armed.
    pub(crate) fn invalidate(&mut self) -> bool {
        self.generation += 1;
        self.starting = None;
        let timer_armed = matches!(
            self.session.as_ref().map(|s| s.phase),
            Some(SessionPhase::Pending)
        );
        self.session = None;
        timer_armed
    }

    pub(crate) fn begin_start(&mut self) -> Generation {
        self.starting = Some(self.generation);
        self.generation
    }

    /// Claims a finished start request. Only the current one may take over.
    pub(crate) fn finish_start(&mut self, generation: Generation) -> bool {
        if self.starting == Some(generation) && self.generation == generation {
            self.starting = None;
            true
        } else {
            false
        }
    }

    /// Opens a new session under a fresh generation.
    pub(crate) fn begin_watch(&mut self, task_id: TaskId, mode: WatchMode) -> Generation {
        self.generation += 1;
        self.starting = None;
        self.session = Some(WatchSession {
            generation: self.generation,
            task_id,
            mode,
            phase: SessionPhase::InitialCheck,
        });
        self.generation
    }

    /// The live session with this generation, or `None` if stale or finished.
    pub(crate) fn current_mut(&mut self, generation: Generation) -> Option<&mut WatchSession> {
        self.session
            .as_mut()
            .filter(|s| s.generation == generation && !s.is_terminal())
    }
}
