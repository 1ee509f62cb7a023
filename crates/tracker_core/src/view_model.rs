use crate::{ClientPhase, PageCount, Progress, TaskId};

/// UI-facing snapshot of the tracker.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub active_task_id: Option<TaskId>,
    pub phase: ClientPhase,
    pub status: String,
    pub progress: Progress,
    pub data: Option<Vec<serde_json::Value>>,
    pub item_count: Option<usize>,
    pub failure: Option<String>,
    pub history: Vec<HistoryRowView>,
    pub pages: Option<PageCount>,
    pub watching: bool,
    pub start_enabled: bool,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRowView {
    pub task_id: TaskId,
    pub short_id: String,
    pub active: bool,
}
