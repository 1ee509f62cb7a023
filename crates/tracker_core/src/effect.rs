use std::time::Duration;

use crate::{Generation, TaskId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartTask { generation: Generation },
    CheckStatus { generation: Generation, task_id: TaskId },
    /// Arm the single poll timer; it reports back with `Msg::TickElapsed`.
    ScheduleTick { generation: Generation, delay: Duration },
    CancelTick,
    RefreshHistory,
    CountPages,
    Report(ErrorReport),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A status check failed; the watch session ended.
    Transport,
    TaskCreation,
    HistoryLoad,
    PageCount,
}

/// A failure observed by the controller. Never fatal; the shell logs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub task_id: Option<TaskId>,
    pub message: String,
}

impl ErrorReport {
    pub(crate) fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            task_id: None,
            message: message.into(),
        }
    }

    pub(crate) fn for_task(mut self, task_id: &str) -> Self {
        self.task_id = Some(task_id.to_string());
        self
    }
}
