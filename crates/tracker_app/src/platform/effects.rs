use std::sync::Arc;

use tokio::sync::mpsc;
use tracker_core::{Effect, ErrorKind, ErrorReport, Msg, Progress, TaskSnapshot, TaskState};
use tracker_engine::{Engine, EngineCommand, EngineEvent, RemoteState, TaskApi, TaskStatus};
use tracker_logging::{tracker_info, tracker_warn};

pub struct EffectRunner {
    engine: Engine,
}

impl EffectRunner {
    pub fn new(api: Arc<dyn TaskApi>, event_tx: mpsc::UnboundedSender<EngineEvent>) -> Self {
        Self {
            engine: Engine::new(api, event_tx),
        }
    }

    pub fn enqueue(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartTask { generation } => {
                    tracker_info!("StartTask generation={}", generation);
                    self.engine.submit(EngineCommand::StartTask { generation });
                }
                Effect::CheckStatus {
                    generation,
                    task_id,
                } => {
                    self.engine.submit(EngineCommand::CheckStatus {
                        generation,
                        task_id,
                    });
                }
                Effect::ScheduleTick { generation, delay } => {
                    self.engine
                        .submit(EngineCommand::ScheduleTick { generation, delay });
                }
                Effect::CancelTick => self.engine.submit(EngineCommand::CancelTick),
                Effect::RefreshHistory => self.engine.submit(EngineCommand::ListHistory),
                Effect::CountPages => self.engine.submit(EngineCommand::CountPages),
                Effect::Report(report) => log_report(&report),
            }
        }
    }

    pub fn probe_health(&mut self) {
        self.engine.submit(EngineCommand::CheckHealth);
    }
}

/// Translates an engine event into the message the core understands.
pub fn event_to_msg(event: EngineEvent) -> Option<Msg> {
    match event {
        EngineEvent::TaskStarted { generation, result } => Some(Msg::TaskCreated {
            generation,
            result: result.map_err(|err| err.to_string()),
        }),
        EngineEvent::StatusChecked {
            generation,
            task_id,
            result,
        } => {
            if let Ok(status) = &result {
                if let Some(reported) = status.task_id.as_deref() {
                    if reported != task_id {
                        tracker_warn!(
                            "Status for {} came back labelled {}",
                            task_id,
                            reported
                        );
                    }
                }
            }
            Some(Msg::StatusChecked {
                generation,
                result: result.map(map_status).map_err(|err| err.to_string()),
            })
        }
        EngineEvent::TickElapsed { generation } => Some(Msg::TickElapsed { generation }),
        EngineEvent::HistoryListed(result) => {
            Some(Msg::HistoryLoaded(result.map_err(|err| err.to_string())))
        }
        EngineEvent::PagesCounted(result) => {
            Some(Msg::PagesCounted(result.map_err(|err| err.to_string())))
        }
        EngineEvent::HealthChecked(result) => {
            match result {
                Ok(()) => tracker_info!("Extraction API is healthy"),
                Err(err) => tracker_warn!("Extraction API health check failed: {}", err),
            }
            None
        }
    }
}

fn log_report(report: &ErrorReport) {
    let task = report.task_id.as_deref().unwrap_or("-");
    match report.kind {
        ErrorKind::Transport => {
            tracker_warn!("Stopped watching task {}: {}", task, report.message);
        }
        ErrorKind::TaskCreation => {
            tracker_warn!("Failed to start extraction task: {}", report.message);
        }
        ErrorKind::HistoryLoad => {
            tracker_info!("Failed to load history: {}", report.message);
        }
        ErrorKind::PageCount => {
            tracker_warn!("Failed to count pages: {}", report.message);
        }
    }
}

fn map_status(status: TaskStatus) -> TaskSnapshot {
    TaskSnapshot {
        state: map_state(status.state),
        progress: status.progress.map(|report| Progress {
            current: report.current,
            total: report.total,
            percent: report.percent,
        }),
        result: status.result,
        error: status.error,
    }
}

fn map_state(state: RemoteState) -> TaskState {
    match state {
        RemoteState::Queued => TaskState::Queued,
        RemoteState::Started => TaskState::Started,
        RemoteState::Progress => TaskState::Progress,
        RemoteState::Success => TaskState::Success,
        RemoteState::Failure => TaskState::Failure,
    }
}
