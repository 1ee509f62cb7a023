use std::fmt::Write;

use tracker_core::{AppViewModel, PageCount};

const RULE: &str = "----------------------------------------";

/// Renders the view model as a block of plain text.
pub fn render(view: &AppViewModel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");

    match &view.active_task_id {
        Some(task_id) => {
            let _ = writeln!(out, "TASK ID:  {task_id}");
            let _ = writeln!(out, "STATUS:   {}", view.status);
            let progress = view.progress;
            let _ = writeln!(
                out,
                "PROGRESS: {}/{} ({}%){}",
                progress.current,
                progress.total,
                progress.percent,
                if view.watching { " polling" } else { "" }
            );
            if let Some(failure) = &view.failure {
                let _ = writeln!(out, "ERROR:    {failure}");
            }
            if let (Some(data), Some(count)) = (&view.data, view.item_count) {
                let _ = writeln!(out, "Results ({count} items):");
                match serde_json::to_string_pretty(data) {
                    Ok(json) => {
                        let _ = writeln!(out, "{json}");
                    }
                    Err(err) => {
                        let _ = writeln!(out, "<unprintable result: {err}>");
                    }
                }
            }
        }
        None if !view.status.is_empty() => {
            let _ = writeln!(out, "STATUS:   {}", view.status);
        }
        None => {
            let _ = writeln!(out, "Select a task from history or start a new one.");
        }
    }

    let _ = writeln!(out);
    if view.history.is_empty() {
        let _ = writeln!(out, "History: no tasks yet.");
    } else {
        let _ = writeln!(out, "History ({}):", view.history.len());
        for row in &view.history {
            let marker = if row.active { '*' } else { ' ' };
            let _ = writeln!(out, "  {marker} {}", row.short_id);
        }
    }

    match view.pages {
        Some(PageCount::Known(total)) => {
            let _ = writeln!(out, "Pages:    {total}");
        }
        Some(PageCount::Unavailable) => {
            let _ = writeln!(out, "Pages:    error");
        }
        None => {}
    }

    let _ = writeln!(
        out,
        "{}",
        if view.start_enabled {
            "[start] new extraction task"
        } else {
            "[start] processing..."
        }
    );
    out
}
