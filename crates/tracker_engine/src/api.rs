use std::time::Duration;

use reqwest::Url;
use tracker_logging::{tracker_debug, tracker_info};

use crate::wire::{
    decode, HealthResponse, HistoryResponse, PagesResponse, StartResponse, StatusResponse,
};
use crate::{FailureKind, TaskId, TaskStatus, TransportError};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/extraction";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Root of the extraction routes, e.g. `http://host:8000/api/extraction`.
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Remote task client. Holds no state of its own; every call may fail with
/// a `TransportError`.
#[async_trait::async_trait]
pub trait TaskApi: Send + Sync {
    /// `POST /extract`: creates a task and returns its id.
    async fn start_task(&self) -> Result<TaskId, TransportError>;

    /// `GET /task/{id}`: idempotent status read.
    async fn task_status(&self, task_id: &str) -> Result<TaskStatus, TransportError>;

    /// `GET /history`: every known task id, in server order.
    async fn list_history(&self) -> Result<Vec<TaskId>, TransportError>;

    /// `GET /pages`: auxiliary probe, unrelated to task tracking.
    async fn count_pages(&self) -> Result<u32, TransportError>;

    /// `GET /health` on the server root.
    async fn health(&self) -> Result<(), TransportError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTaskClient {
    client: reqwest::Client,
    base: Url,
}

impl ReqwestTaskClient {
    pub fn new(settings: ClientSettings) -> Result<Self, TransportError> {
        // A trailing slash makes `Url::join` append instead of replacing the
        // last segment.
        let mut raw = settings.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base = Url::parse(&raw)
            .map_err(|err| TransportError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(TransportError::new(
                FailureKind::InvalidUrl,
                format!("{raw} cannot be used as a base url"),
            ));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| TransportError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self { client, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        self.base
            .join(path)
            .map_err(|err| TransportError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    fn task_endpoint(&self, task_id: &str) -> Result<Url, TransportError> {
        let mut url = self.endpoint("task/")?;
        url.path_segments_mut()
            .map_err(|_| TransportError::new(FailureKind::InvalidUrl, "base cannot hold segments"))?
            .pop_if_empty()
            .push(task_id);
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Vec<u8>, TransportError> {
        let response = request.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        Ok(bytes.to_vec())
    }
}

#[async_trait::async_trait]
impl TaskApi for ReqwestTaskClient {
    async fn start_task(&self) -> Result<TaskId, TransportError> {
        let url = self.endpoint("extract")?;
        let body = self.send(self.client.post(url)).await?;
        let started: StartResponse = decode(&body)?;
        tracker_info!(
            "Task {} created: {}",
            started.task_id,
            started.message.as_deref().unwrap_or("queued")
        );
        Ok(started.task_id)
    }

    async fn task_status(&self, task_id: &str) -> Result<TaskStatus, TransportError> {
        let url = self.task_endpoint(task_id)?;
        let body = self.send(self.client.get(url)).await?;
        let status: StatusResponse = decode(&body)?;
        let status = status.into_status(task_id);
        tracker_debug!("Task {} is {:?}", task_id, status.state);
        Ok(status)
    }

    async fn list_history(&self) -> Result<Vec<TaskId>, TransportError> {
        let url = self.endpoint("history")?;
        let body = self.send(self.client.get(url)).await?;
        let history: HistoryResponse = decode(&body)?;
        Ok(history.history)
    }

    async fn count_pages(&self) -> Result<u32, TransportError> {
        let url = self.endpoint("pages")?;
        let body = self.send(self.client.get(url)).await?;
        let pages: PagesResponse = decode(&body)?;
        Ok(pages.total_pages)
    }

    async fn health(&self) -> Result<(), TransportError> {
        let url = self.endpoint("/health")?;
        let body = self.send(self.client.get(url)).await?;
        let health: HealthResponse = decode(&body)?;
        if health.status == "healthy" {
            Ok(())
        } else {
            Err(TransportError::new(
                FailureKind::InvalidPayload,
                format!("server reports status '{}'", health.status),
            ))
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return TransportError::new(FailureKind::InvalidPayload, err.to_string());
    }
    TransportError::new(FailureKind::Network, err.to_string())
}
