use std::collections::HashSet;
use std::time::Duration;

use crate::view_model::{AppViewModel, HistoryRowView};
use crate::watch::{SessionPhase, TerminalReason, WatchMode, WatchSession, Watcher};
use crate::{Generation, PageCount, Progress, TaskId, TaskSnapshot, TaskState, SUCCESS_PROGRESS};

/// Poll period while a session waits on a non-terminal task.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Characters of a task id shown in the history list.
const SHORT_ID_LEN: usize = 8;

/// What the status line is showing, kept apart from the raw server state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientPhase {
    #[default]
    Idle,
    Starting,
    Loading,
    Watching(TaskState),
    StartFailed,
    LoadFailed,
}

impl ClientPhase {
    pub fn label(self) -> &'static str {
        match self {
            ClientPhase::Idle => "",
            ClientPhase::Starting => "STARTING",
            ClientPhase::Loading => "LOADING",
            ClientPhase::Watching(state) => state.as_str(),
            ClientPhase::StartFailed => "ERROR_STARTING",
            ClientPhase::LoadFailed => "ERROR_LOADING",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    phase: ClientPhase,
    active_task: Option<TaskId>,
    progress: Progress,
    data: Option<Vec<serde_json::Value>>,
    failure: Option<String>,
    history: Vec<TaskId>,
    pages: Option<PageCount>,
    watcher: Watcher,
    poll_interval: Duration,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_poll_interval(DEFAULT_POLL_INTERVAL)
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            phase: ClientPhase::Idle,
            active_task: None,
            progress: Progress::default(),
            data: None,
            failure: None,
            history: Vec::new(),
            pages: None,
            watcher: Watcher::default(),
            poll_interval,
            dirty: false,
        }
    }

    pub fn view(&self) -> AppViewModel {
        let history = self
            .history
            .iter()
            .map(|task_id| HistoryRowView {
                task_id: task_id.clone(),
                short_id: short_id(task_id),
                active: self.active_task.as_deref() == Some(task_id.as_str()),
            })
            .collect();

        AppViewModel {
            active_task_id: self.active_task.clone(),
            phase: self.phase,
            status: self.phase.label().to_string(),
            progress: self.progress,
            item_count: self.data.as_ref().map(Vec::len),
            data: self.data.clone(),
            failure: self.failure.clone(),
            history,
            pages: self.pages,
            watching: self.watcher.session().is_some_and(|s| !s.is_terminal()),
            start_enabled: !self.is_busy(),
            dirty: self.dirty,
        }
    }

    pub fn phase(&self) -> ClientPhase {
        self.phase
    }

    pub fn session(&self) -> Option<&WatchSession> {
        self.watcher.session()
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Returns whether the view changed since the last call, clearing the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// True while a start request is in flight or the task started from here
    /// is still running.
    pub(crate) fn is_busy(&self) -> bool {
        self.watcher.is_starting()
            || self.watcher.session().is_some_and(|s| {
                s.mode == WatchMode::Continuous && !s.is_terminal()
            })
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Clears task-specific view state; happens before any new watch is issued.
    fn reset_view(&mut self, active_task: Option<TaskId>, phase: ClientPhase) {
        self.active_task = active_task;
        self.phase = phase;
        self.progress = Progress::default();
        self.data = None;
        self.failure = None;
        self.mark_dirty();
    }

    /// Ends the current session. Returns true if a timer needs cancelling.
    pub(crate) fn stop_watching(&mut self) -> bool {
        self.watcher.invalidate()
    }

    pub(crate) fn begin_start(&mut self) -> Generation {
        self.reset_view(None, ClientPhase::Starting);
        self.watcher.begin_start()
    }

    pub(crate) fn claim_start(&mut self, generation: Generation) -> bool {
        self.watcher.finish_start(generation)
    }

    pub(crate) fn start_failed(&mut self) {
        self.phase = ClientPhase::StartFailed;
        self.mark_dirty();
    }

    /// Creation succeeded: show the new task as queued and watch it.
    pub(crate) fn watch_created(&mut self, task_id: TaskId) -> Generation {
        self.active_task = Some(task_id.clone());
        self.phase = ClientPhase::Watching(TaskState::Queued);
        self.mark_dirty();
        self.watcher.begin_watch(task_id, WatchMode::Continuous)
    }

    pub(crate) fn watch_selected(&mut self, task_id: TaskId) -> Generation {
        self.reset_view(Some(task_id.clone()), ClientPhase::Loading);
        self.watcher.begin_watch(task_id, WatchMode::OneShot)
    }

    /// Applies a check result from `generation`. Returns `None` when the
    /// result is stale, otherwise whether the session is still pending.
    pub(crate) fn apply_snapshot(
        &mut self,
        generation: Generation,
        snapshot: TaskSnapshot,
    ) -> Option<bool> {
        let session = self.watcher.current_mut(generation)?;
        let pending = match snapshot.state {
            TaskState::Success => {
                session.phase = SessionPhase::Terminal(TerminalReason::Success);
                false
            }
            TaskState::Failure => {
                session.phase = SessionPhase::Terminal(TerminalReason::Failure);
                false
            }
            TaskState::Queued | TaskState::Started | TaskState::Progress => {
                session.phase = SessionPhase::Pending;
                true
            }
        };

        self.phase = ClientPhase::Watching(snapshot.state);
        match snapshot.state {
            TaskState::Progress => {
                if let Some(progress) = snapshot.progress {
                    self.progress = progress;
                }
            }
            TaskState::Success => {
                self.data = Some(snapshot.result.unwrap_or_default());
                self.progress = SUCCESS_PROGRESS;
            }
            TaskState::Failure => {
                self.failure = snapshot.error;
            }
            TaskState::Queued | TaskState::Started => {}
        }
        self.mark_dirty();
        Some(pending)
    }

    /// Ends the session after a failed check. Returns the task id when the
    /// failure belonged to the current session.
    pub(crate) fn apply_transport_error(&mut self, generation: Generation) -> Option<TaskId> {
        let session = self.watcher.current_mut(generation)?;
        session.phase = SessionPhase::Terminal(TerminalReason::TransportError);
        let task_id = session.task_id.clone();
        if self.phase == ClientPhase::Loading {
            self.phase = ClientPhase::LoadFailed;
        }
        self.mark_dirty();
        Some(task_id)
    }

    /// Timer fired for `generation`. Returns the task to check if still live.
    pub(crate) fn take_tick(&mut self, generation: Generation) -> Option<TaskId> {
        let session = self.watcher.current_mut(generation)?;
        if session.phase != SessionPhase::Pending {
            return None;
        }
        session.phase = SessionPhase::Checking;
        Some(session.task_id.clone())
    }

    pub(crate) fn set_history(&mut self, ids: Vec<TaskId>) {
        let mut seen: HashSet<&str> = HashSet::with_capacity(ids.len());
        let unique: Vec<TaskId> = ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect();
        if unique != self.history {
            self.history = unique;
            self.mark_dirty();
        }
    }

    /// Resolves a full id or unique prefix against the history list.
    pub fn resolve_history_id(&self, raw: &str) -> Option<TaskId> {
        let raw = raw.trim().trim_end_matches("...");
        if raw.is_empty() {
            return None;
        }
        if let Some(exact) = self.history.iter().find(|id| id.as_str() == raw) {
            return Some(exact.clone());
        }
        let mut matches = self.history.iter().filter(|id| id.starts_with(raw));
        match (matches.next(), matches.next()) {
            (Some(only), None) => Some(only.clone()),
            _ => None,
        }
    }

    pub(crate) fn set_pages(&mut self, pages: PageCount) {
        self.pages = Some(pages);
        self.mark_dirty();
    }
}

fn short_id(task_id: &str) -> String {
    match task_id.char_indices().nth(SHORT_ID_LEN) {
        Some((cut, _)) => format!("{}...", &task_id[..cut]),
        None => task_id.to_string(),
    }
}
