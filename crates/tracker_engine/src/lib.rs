//! Tracker engine: HTTP task client and command execution.
mod api;
mod engine;
mod types;
mod wire;

pub use api::{ClientSettings, ReqwestTaskClient, TaskApi, DEFAULT_BASE_URL};
pub use engine::{Engine, EngineCommand, EngineEvent};
pub use types::{FailureKind, ProgressReport, RemoteState, TaskId, TaskStatus, TransportError};
