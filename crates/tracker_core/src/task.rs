use std::fmt;

pub type TaskId = String;

/// Identifies one watch session (or one start request). Only the current
/// generation may write to the view.
pub type Generation = u64;

/// Remote task state as reported by the extraction backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Queued,
    Started,
    Progress,
    Success,
    Failure,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Success | TaskState::Failure)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::Queued => "QUEUED",
            TaskState::Started => "STARTED",
            TaskState::Progress => "PROGRESS",
            TaskState::Success => "SUCCESS",
            TaskState::Failure => "FAILURE",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub current: u32,
    pub total: u32,
    pub percent: u8,
}

/// Progress shown once a task succeeds, whatever the last report said.
pub const SUCCESS_PROGRESS: Progress = Progress {
    current: 50,
    total: 50,
    percent: 100,
};

/// Read-only projection of a server task returned by one status check.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSnapshot {
    pub state: TaskState,
    pub progress: Option<Progress>,
    pub result: Option<Vec<serde_json::Value>>,
    pub error: Option<String>,
}

impl TaskSnapshot {
    pub fn new(state: TaskState) -> Self {
        Self {
            state,
            progress: None,
            result: None,
            error: None,
        }
    }

    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_result(mut self, result: Vec<serde_json::Value>) -> Self {
        self.result = Some(result);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Result of the auxiliary page-count probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCount {
    Known(u32),
    Unavailable,
}
