use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracker_logging::{tracker_debug, tracker_trace};

use crate::{TaskApi, TaskId, TaskStatus, TransportError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    StartTask { generation: u64 },
    CheckStatus { generation: u64, task_id: TaskId },
    ScheduleTick { generation: u64, delay: Duration },
    CancelTick,
    ListHistory,
    CountPages,
    CheckHealth,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    TaskStarted {
        generation: u64,
        result: Result<TaskId, TransportError>,
    },
    StatusChecked {
        generation: u64,
        task_id: TaskId,
        result: Result<TaskStatus, TransportError>,
    },
    TickElapsed {
        generation: u64,
    },
    HistoryListed(Result<Vec<TaskId>, TransportError>),
    PagesCounted(Result<u32, TransportError>),
    HealthChecked(Result<(), TransportError>),
}

/// Runs commands against a `TaskApi` on the current tokio runtime and reports
/// back through an event channel.
///
/// Requests are never aborted; the caller discards stale answers. The engine
/// owns at most one armed tick: arming a new one, `CancelTick`, or dropping
/// the engine disarms the previous one.
pub struct Engine {
    api: Arc<dyn TaskApi>,
    event_tx: mpsc::UnboundedSender<EngineEvent>,
    armed_tick: Option<CancellationToken>,
}

impl Engine {
    pub fn new(api: Arc<dyn TaskApi>, event_tx: mpsc::UnboundedSender<EngineEvent>) -> Self {
        Self {
            api,
            event_tx,
            armed_tick: None,
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn submit(&mut self, command: EngineCommand) {
        tracker_trace!("Engine command {:?}", command);
        match command {
            EngineCommand::StartTask { generation } => {
                self.spawn(move |api| async move {
                    EngineEvent::TaskStarted {
                        generation,
                        result: api.start_task().await,
                    }
                });
            }
            EngineCommand::CheckStatus {
                generation,
                task_id,
            } => {
                self.spawn(move |api| async move {
                    let result = api.task_status(&task_id).await;
                    EngineEvent::StatusChecked {
                        generation,
                        task_id,
                        result,
                    }
                });
            }
            EngineCommand::ScheduleTick { generation, delay } => {
                self.schedule_tick(generation, delay);
            }
            EngineCommand::CancelTick => self.cancel_tick(),
            EngineCommand::ListHistory => {
                self.spawn(|api| async move { EngineEvent::HistoryListed(api.list_history().await) });
            }
            EngineCommand::CountPages => {
                self.spawn(|api| async move { EngineEvent::PagesCounted(api.count_pages().await) });
            }
            EngineCommand::CheckHealth => {
                self.spawn(|api| async move { EngineEvent::HealthChecked(api.health().await) });
            }
        }
    }

    pub fn has_armed_tick(&self) -> bool {
        self.armed_tick
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    fn spawn<F, Fut>(&self, request: F)
    where
        F: FnOnce(Arc<dyn TaskApi>) -> Fut,
        Fut: std::future::Future<Output = EngineEvent> + Send + 'static,
    {
        let event_tx = self.event_tx.clone();
        let future = request(self.api.clone());
        tokio::spawn(async move {
            let event = future.await;
            // Receiver gone means the shell is shutting down.
            let _ = event_tx.send(event);
        });
    }

    fn schedule_tick(&mut self, generation: u64, delay: Duration) {
        self.cancel_tick();
        let deadline = tokio::time::Instant::now() + delay;
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {
                    tracker_debug!("Tick for generation {} cancelled", generation);
                }
                _ = tokio::time::sleep_until(deadline) => {
                    let _ = event_tx.send(EngineEvent::TickElapsed { generation });
                    // Disarm so `has_armed_tick` stops reporting a fired timer.
                    cancelled.cancel();
                }
            }
        });
        self.armed_tick = Some(token);
    }

    fn cancel_tick(&mut self) {
        if let Some(token) = self.armed_tick.take() {
            token.cancel();
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.cancel_tick();
    }
}
