use std::io::{self, Write};
use std::ops::ControlFlow;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracker_core::{update, AppState, Msg};
use tracker_engine::{EngineEvent, ReqwestTaskClient};
use tracker_logging::tracker_info;

use super::cli::AppConfig;
use super::effects::{event_to_msg, EffectRunner};
use super::ui::input::{parse_command, Command, HELP};
use super::ui::render::render;

pub async fn run_app(config: AppConfig) -> anyhow::Result<()> {
    tracker_info!(
        "Tracker starting base_url={} poll_interval={:?}",
        config.client.base_url,
        config.poll_interval
    );
    let client = ReqwestTaskClient::new(config.client.clone())
        .with_context(|| format!("invalid base url {}", config.client.base_url))?;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let runner = EffectRunner::new(Arc::new(client), event_tx);
    let mut shell = Shell::new(
        AppState::with_poll_interval(config.poll_interval),
        runner,
        io::stdout(),
    );

    shell.boot()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                if shell.handle_line(&line)?.is_break() {
                    break;
                }
            }
            Some(event) = event_rx.recv() => shell.handle_event(event)?,
        }
    }

    shell.dispatch(Msg::StopWatching)?;
    tracker_info!("Tracker stopped");
    Ok(())
}

/// Owns the view state and feeds messages through `update`, running the
/// resulting effects and re-rendering when the view changed.
struct Shell<W: Write> {
    state: AppState,
    effects: EffectRunner,
    out: W,
}

impl<W: Write> Shell<W> {
    fn new(state: AppState, effects: EffectRunner, out: W) -> Self {
        Self {
            state,
            effects,
            out,
        }
    }

    fn boot(&mut self) -> io::Result<()> {
        writeln!(self.out, "Extraction tracker. Type 'help' for commands.")?;
        self.effects.probe_health();
        self.dispatch(Msg::Loaded)?;
        self.render()
    }

    fn dispatch(&mut self, msg: Msg) -> io::Result<()> {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let was_dirty = state.consume_dirty();
        self.state = state;
        self.effects.enqueue(effects);
        if was_dirty {
            self.render()?;
        }
        Ok(())
    }

    fn handle_event(&mut self, event: EngineEvent) -> io::Result<()> {
        match event_to_msg(event) {
            Some(msg) => self.dispatch(msg),
            None => Ok(()),
        }
    }

    fn handle_line(&mut self, line: &str) -> io::Result<ControlFlow<()>> {
        let command = match parse_command(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(ControlFlow::Continue(())),
            Err(message) => {
                writeln!(self.out, "{message}")?;
                return Ok(ControlFlow::Continue(()));
            }
        };

        match command {
            Command::Start => {
                if !self.state.view().start_enabled {
                    writeln!(self.out, "A task is already being processed.")?;
                }
                self.dispatch(Msg::StartClicked)?;
            }
            Command::Select(raw) => match self.state.resolve_history_id(&raw) {
                Some(task_id) => self.dispatch(Msg::TaskSelected(task_id))?,
                None => writeln!(self.out, "No single task in history matches '{raw}'.")?,
            },
            Command::History => self.dispatch(Msg::HistoryRequested)?,
            Command::Pages => self.dispatch(Msg::PagesRequested)?,
            Command::Show => self.render()?,
            Command::Help => writeln!(self.out, "{HELP}")?,
            Command::Quit => return Ok(ControlFlow::Break(())),
        }
        Ok(ControlFlow::Continue(()))
    }

    fn render(&mut self) -> io::Result<()> {
        write!(self.out, "{}", render(&self.state.view()))?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use tracker_core::{ClientPhase, Progress, SessionPhase, TerminalReason, SUCCESS_PROGRESS};
    use tracker_engine::{
        FailureKind, ProgressReport, RemoteState, TaskApi, TaskId, TaskStatus, TransportError,
    };

    use super::*;

    const POLL: Duration = Duration::from_millis(1000);

    type Scripted = (Duration, Result<TaskStatus, TransportError>);

    /// Answers status checks from a per-task script, optionally after a delay.
    #[derive(Default)]
    struct FakeApi {
        created: Mutex<VecDeque<TaskId>>,
        statuses: Mutex<HashMap<TaskId, VecDeque<Scripted>>>,
        history: Mutex<Vec<TaskId>>,
        status_calls: AtomicUsize,
    }

    impl FakeApi {
        fn creates(self, task_id: &str) -> Self {
            self.created.lock().unwrap().push_back(task_id.to_string());
            self
        }

        fn answers(self, task_id: &str, state: RemoteState) -> Self {
            self.answers_after(task_id, Duration::ZERO, status(state))
        }

        fn answers_with(self, task_id: &str, reply: TaskStatus) -> Self {
            self.answers_after(task_id, Duration::ZERO, reply)
        }

        fn answers_after(self, task_id: &str, delay: Duration, reply: TaskStatus) -> Self {
            self.statuses
                .lock()
                .unwrap()
                .entry(task_id.to_string())
                .or_default()
                .push_back((delay, Ok(reply)));
            self
        }

        fn fails(self, task_id: &str) -> Self {
            self.statuses
                .lock()
                .unwrap()
                .entry(task_id.to_string())
                .or_default()
                .push_back((
                    Duration::ZERO,
                    Err(TransportError {
                        kind: FailureKind::Network,
                        message: "connection refused".to_string(),
                    }),
                ));
            self
        }

        fn lists(self, ids: &[&str]) -> Self {
            *self.history.lock().unwrap() = ids.iter().map(|id| id.to_string()).collect();
            self
        }

        fn status_calls(&self) -> usize {
            self.status_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl TaskApi for FakeApi {
        async fn start_task(&self) -> Result<TaskId, TransportError> {
            let created = self.created.lock().unwrap().pop_front();
            created.ok_or_else(|| TransportError {
                kind: FailureKind::HttpStatus(500),
                message: "Internal Server Error".to_string(),
            })
        }

        async fn task_status(&self, task_id: &str) -> Result<TaskStatus, TransportError> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            let next = self
                .statuses
                .lock()
                .unwrap()
                .get_mut(task_id)
                .and_then(VecDeque::pop_front);
            let (delay, reply) = next.unwrap_or_else(|| {
                panic!("unexpected status check for {task_id}");
            });
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            reply
        }

        async fn list_history(&self) -> Result<Vec<TaskId>, TransportError> {
            Ok(self.history.lock().unwrap().clone())
        }

        async fn count_pages(&self) -> Result<u32, TransportError> {
            Ok(50)
        }

        async fn health(&self) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn status(state: RemoteState) -> TaskStatus {
        TaskStatus {
            task_id: None,
            state,
            progress: None,
            result: None,
            error: None,
        }
    }

    fn progress(current: u32, total: u32, percent: u8) -> TaskStatus {
        TaskStatus {
            progress: Some(ProgressReport {
                current,
                total,
                percent,
            }),
            ..status(RemoteState::Progress)
        }
    }

    struct Harness {
        api: Arc<FakeApi>,
        shell: Shell<Vec<u8>>,
        events: mpsc::UnboundedReceiver<EngineEvent>,
    }

    impl Harness {
        fn new(api: FakeApi) -> Self {
            let api = Arc::new(api);
            let (event_tx, events) = mpsc::unbounded_channel();
            let runner = EffectRunner::new(api.clone(), event_tx);
            let shell = Shell::new(AppState::with_poll_interval(POLL), runner, Vec::new());
            Self { api, shell, events }
        }

        /// Lets spawned requests run and feeds their answers back in.
        async fn settle(&mut self) {
            for _ in 0..20 {
                tokio::task::yield_now().await;
                while let Ok(event) = self.events.try_recv() {
                    self.shell.handle_event(event).expect("render");
                }
            }
        }

        async fn elapse(&mut self, duration: Duration) {
            tokio::time::advance(duration).await;
            self.settle().await;
        }

        async fn line(&mut self, line: &str) {
            self.shell.handle_line(line).expect("render");
            self.settle().await;
        }

        fn output(&self) -> String {
            String::from_utf8_lossy(&self.shell.out).into_owned()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn started_task_is_followed_to_success() {
        let items = vec![
            serde_json::json!({"title": "A"}),
            serde_json::json!({"title": "B"}),
            serde_json::json!({"title": "C"}),
        ];
        let api = FakeApi::default()
            .creates("abc123")
            .lists(&["abc123"])
            .answers("abc123", RemoteState::Queued)
            .answers_with("abc123", progress(1, 10, 10))
            .answers_with("abc123", progress(10, 10, 100))
            .answers_with(
                "abc123",
                TaskStatus {
                    result: Some(items),
                    ..status(RemoteState::Success)
                },
            );
        let mut h = Harness::new(api);
        h.shell.boot().expect("boot");
        h.settle().await;

        h.line("start").await;
        assert_eq!(h.api.status_calls(), 1);
        assert_eq!(h.shell.state.view().status, "QUEUED");

        h.elapse(POLL).await;
        assert_eq!(
            h.shell.state.view().progress,
            Progress {
                current: 1,
                total: 10,
                percent: 10
            }
        );

        h.elapse(POLL).await;
        assert_eq!(h.shell.state.view().progress.percent, 100);

        h.elapse(POLL).await;
        let view = h.shell.state.view();
        assert_eq!(view.status, "SUCCESS");
        assert_eq!(view.progress, SUCCESS_PROGRESS);
        assert_eq!(view.item_count, Some(3));
        assert_eq!(h.api.status_calls(), 4);

        // Terminal: no timer left, so simulated time brings no more checks.
        h.elapse(POLL * 10).await;
        assert_eq!(h.api.status_calls(), 4);
        assert_eq!(
            h.shell.state.session().map(|s| s.phase),
            Some(SessionPhase::Terminal(TerminalReason::Success))
        );
        assert_eq!(view.history.len(), 1);
        assert!(h.output().contains("Results (3 items):"));
    }

    #[tokio::test(start_paused = true)]
    async fn selecting_a_failed_task_checks_once() {
        let api = FakeApi::default()
            .lists(&["failed-task-id"])
            .answers("failed-task-id", RemoteState::Failure);
        let mut h = Harness::new(api);
        h.shell.boot().expect("boot");
        h.settle().await;

        h.line("select failed").await;
        h.elapse(POLL * 5).await;

        let view = h.shell.state.view();
        assert_eq!(h.api.status_calls(), 1);
        assert_eq!(view.status, "FAILURE");
        assert_eq!(view.data, None);
        assert!(!view.watching);
    }

    #[tokio::test(start_paused = true)]
    async fn late_answer_from_abandoned_task_is_discarded() {
        let slow = Duration::from_millis(1500);
        let api = FakeApi::default()
            .lists(&["task-a", "task-b"])
            .answers_after(
                "task-a",
                slow,
                TaskStatus {
                    result: Some(vec![serde_json::json!("stale")]),
                    ..status(RemoteState::Success)
                },
            )
            .answers("task-b", RemoteState::Started)
            .answers_with("task-b", progress(4, 8, 50));
        let mut h = Harness::new(api);
        h.shell.boot().expect("boot");
        h.settle().await;

        h.line("select task-a").await;
        // Synchronous reset: nothing from task-a is visible yet.
        assert_eq!(h.shell.state.view().status, "LOADING");

        h.line("select task-b").await;
        assert_eq!(h.shell.state.view().status, "STARTED");

        // task-a answers while task-b is pending, then task-b's tick runs.
        h.elapse(slow).await;
        let view = h.shell.state.view();
        assert_eq!(view.active_task_id.as_deref(), Some("task-b"));
        assert_eq!(view.status, "PROGRESS");
        assert_eq!(view.data, None);
        assert_eq!(view.progress.current, 4);
        assert_eq!(h.shell.state.session().map(|s| s.phase), Some(SessionPhase::Pending));
    }

    #[tokio::test(start_paused = true)]
    async fn switching_tasks_stops_the_old_timer() {
        let api = FakeApi::default()
            .lists(&["task-a", "task-b"])
            .answers("task-a", RemoteState::Started)
            .answers("task-b", RemoteState::Failure);
        let mut h = Harness::new(api);
        h.shell.boot().expect("boot");
        h.settle().await;

        h.line("select task-a").await;
        h.line("select task-b").await;
        // Only the two immediate checks ever reach the server.
        h.elapse(POLL * 3).await;

        assert_eq!(h.api.status_calls(), 2);
        assert_eq!(h.shell.state.view().status, "FAILURE");
    }

    #[tokio::test(start_paused = true)]
    async fn transport_error_stops_polling_without_crashing() {
        let api = FakeApi::default()
            .creates("flaky")
            .answers("flaky", RemoteState::Started)
            .fails("flaky");
        let mut h = Harness::new(api);
        h.shell.boot().expect("boot");
        h.settle().await;

        h.line("start").await;
        h.elapse(POLL).await;
        h.elapse(POLL * 5).await;

        let view = h.shell.state.view();
        assert_eq!(h.api.status_calls(), 2);
        assert_eq!(view.status, "STARTED");
        assert!(!view.watching);
        assert!(view.start_enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_start_is_reported_in_status() {
        let mut h = Harness::new(FakeApi::default());
        h.shell.boot().expect("boot");
        h.settle().await;

        h.line("start").await;

        assert_eq!(h.shell.state.view().status, "ERROR_STARTING");
        assert_eq!(h.api.status_calls(), 0);
        assert!(h.output().contains("STATUS:   ERROR_STARTING"));
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_selection_and_commands_are_explained() {
        let mut h = Harness::new(FakeApi::default().lists(&["abc-1", "abc-2"]));
        h.shell.boot().expect("boot");
        h.settle().await;

        h.line("select abc").await;
        h.line("dance").await;
        h.line("pages").await;

        let output = h.output();
        assert!(output.contains("No single task in history matches 'abc'."));
        assert!(output.contains("unknown command 'dance'"));
        assert!(output.contains("Pages:    50"));
        assert_eq!(h.api.status_calls(), 0);
        assert_eq!(h.shell.state.view().phase, ClientPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn quit_breaks_the_loop() {
        let mut h = Harness::new(FakeApi::default());
        assert!(h.shell.handle_line("quit").expect("quit").is_break());
        assert!(h.shell.handle_line("help").expect("help").is_continue());
        assert!(h.output().contains("Commands:"));
    }
}
