use crate::effect::{ErrorKind, ErrorReport};
use crate::{AppState, Effect, Msg, PageCount};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Loaded | Msg::HistoryRequested => vec![Effect::RefreshHistory],
        Msg::StartClicked => {
            if state.is_busy() {
                return (state, Vec::new());
            }
            let mut effects = Vec::with_capacity(2);
            if state.stop_watching() {
                effects.push(Effect::CancelTick);
            }
            let generation = state.begin_start();
            effects.push(Effect::StartTask { generation });
            effects
        }
        Msg::TaskCreated { generation, result } => match result {
            Ok(task_id) => {
                if !state.claim_start(generation) {
                    // The user moved on while the request was in flight; the
                    // task still exists, so only the history learns about it.
                    return (state, vec![Effect::RefreshHistory]);
                }
                let generation = state.watch_created(task_id.clone());
                vec![
                    Effect::CheckStatus {
                        generation,
                        task_id,
                    },
                    Effect::RefreshHistory,
                ]
            }
            Err(message) => {
                if state.claim_start(generation) {
                    state.start_failed();
                }
                vec![Effect::Report(ErrorReport::new(
                    ErrorKind::TaskCreation,
                    message,
                ))]
            }
        },
        Msg::TaskSelected(task_id) => {
            let mut effects = Vec::with_capacity(2);
            if state.stop_watching() {
                effects.push(Effect::CancelTick);
            }
            let generation = state.watch_selected(task_id.clone());
            effects.push(Effect::CheckStatus {
                generation,
                task_id,
            });
            effects
        }
        Msg::StatusChecked { generation, result } => match result {
            Ok(snapshot) => match state.apply_snapshot(generation, snapshot) {
                Some(true) => vec![Effect::ScheduleTick {
                    generation,
                    delay: state.poll_interval(),
                }],
                Some(false) | None => Vec::new(),
            },
            Err(message) => match state.apply_transport_error(generation) {
                Some(task_id) => vec![Effect::Report(
                    ErrorReport::new(ErrorKind::Transport, message).for_task(&task_id),
                )],
                None => Vec::new(),
            },
        },
        Msg::TickElapsed { generation } => match state.take_tick(generation) {
            Some(task_id) => vec![Effect::CheckStatus {
                generation,
                task_id,
            }],
            None => Vec::new(),
        },
        Msg::HistoryLoaded(result) => match result {
            Ok(ids) => {
                state.set_history(ids);
                Vec::new()
            }
            Err(message) => vec![Effect::Report(ErrorReport::new(
                ErrorKind::HistoryLoad,
                message,
            ))],
        },
        Msg::PagesRequested => vec![Effect::CountPages],
        Msg::PagesCounted(result) => match result {
            Ok(total) => {
                state.set_pages(PageCount::Known(total));
                Vec::new()
            }
            Err(message) => {
                state.set_pages(PageCount::Unavailable);
                vec![Effect::Report(ErrorReport::new(
                    ErrorKind::PageCount,
                    message,
                ))]
            }
        },
        Msg::StopWatching => {
            if state.stop_watching() {
                vec![Effect::CancelTick]
            } else {
                Vec::new()
            }
        }
    };

    (state, effects)
}
