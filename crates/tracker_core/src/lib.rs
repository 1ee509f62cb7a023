//! Tracker core: pure task-tracking state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod task;
mod update;
mod view_model;
mod watch;

pub use effect::{Effect, ErrorKind, ErrorReport};
pub use msg::Msg;
pub use state::{AppState, ClientPhase, DEFAULT_POLL_INTERVAL};
pub use task::{
    Generation, PageCount, Progress, TaskId, TaskSnapshot, TaskState, SUCCESS_PROGRESS,
};
pub use update::update;
pub use view_model::{AppViewModel, HistoryRowView};
pub use watch::{SessionPhase, TerminalReason, WatchMode, WatchSession};
