//! JSON bodies exchanged with the extraction API.

use serde::Deserialize;
use tracker_logging::tracker_warn;

use crate::{FailureKind, ProgressReport, RemoteState, TaskId, TaskStatus, TransportError};

#[derive(Debug, Deserialize)]
pub(crate) struct StartResponse {
    pub task_id: TaskId,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusResponse {
    #[serde(default)]
    pub task_id: Option<TaskId>,
    pub state: WireState,
    /// Kept raw so a malformed report is dropped instead of failing the
    /// whole status.
    #[serde(default)]
    pub progress: Option<serde_json::Value>,
    #[serde(default)]
    pub result: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Celery reports `PENDING` for tasks it has not picked up (or does not
/// know), `RETRY` while retrying, and `REVOKED` for cancelled tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub(crate) enum WireState {
    #[serde(alias = "PENDING")]
    Queued,
    #[serde(alias = "RETRY")]
    Started,
    Progress,
    Success,
    #[serde(alias = "REVOKED")]
    Failure,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct WireProgress {
    pub current: u32,
    pub total: u32,
    pub percent: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryResponse {
    pub history: Vec<TaskId>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PagesResponse {
    pub total_pages: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HealthResponse {
    pub status: String,
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, TransportError> {
    serde_json::from_slice(bytes)
        .map_err(|err| TransportError::new(FailureKind::InvalidPayload, err.to_string()))
}

impl From<WireState> for RemoteState {
    fn from(state: WireState) -> Self {
        match state {
            WireState::Queued => RemoteState::Queued,
            WireState::Started => RemoteState::Started,
            WireState::Progress => RemoteState::Progress,
            WireState::Success => RemoteState::Success,
            WireState::Failure => RemoteState::Failure,
        }
    }
}

impl WireProgress {
    fn parse(raw: &serde_json::Value) -> Option<ProgressReport> {
        WireProgress::deserialize(raw).ok()?.validate()
    }

    /// Rejects reports breaking `current <= total` or `percent <= 100`.
    fn validate(self) -> Option<ProgressReport> {
        if self.total > 0 && self.current > self.total {
            return None;
        }
        let percent = u8::try_from(self.percent).ok().filter(|p| *p <= 100)?;
        Some(ProgressReport {
            current: self.current,
            total: self.total,
            percent,
        })
    }
}

impl StatusResponse {
    pub(crate) fn into_status(self, requested: &str) -> TaskStatus {
        let state = RemoteState::from(self.state);
        // Progress and result only mean something in their own states.
        let progress = match (state, self.progress) {
            (RemoteState::Progress, Some(raw)) => {
                let report = WireProgress::parse(&raw);
                if report.is_none() {
                    tracker_warn!("Dropping malformed progress for task {}: {}", requested, raw);
                }
                report
            }
            _ => None,
        };
        let result = match state {
            RemoteState::Success => Some(self.result.unwrap_or_default()),
            _ => None,
        };
        let error = match state {
            RemoteState::Failure => self.error,
            _ => None,
        };

        TaskStatus {
            task_id: self.task_id,
            state,
            progress,
            result,
            error,
        }
    }
}
