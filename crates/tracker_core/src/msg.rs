use crate::{Generation, TaskId, TaskSnapshot};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Shell finished starting up.
    Loaded,
    /// User asked for a new extraction task.
    StartClicked,
    /// Backend answered a start request.
    TaskCreated {
        generation: Generation,
        result: Result<TaskId, String>,
    },
    /// User picked a task id from history.
    TaskSelected(TaskId),
    /// A status check finished, successfully or with a transport error.
    StatusChecked {
        generation: Generation,
        result: Result<TaskSnapshot, String>,
    },
    /// Poll timer fired.
    TickElapsed { generation: Generation },
    /// User asked to reload the history list.
    HistoryRequested,
    /// History listing finished.
    HistoryLoaded(Result<Vec<TaskId>, String>),
    /// User asked for the page count probe.
    PagesRequested,
    /// Page count probe finished.
    PagesCounted(Result<u32, String>),
    /// Shell is shutting down; stop the current watch session.
    StopWatching,
}
