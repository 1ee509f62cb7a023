/// A line typed at the shell prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Select(String),
    History,
    Pages,
    Show,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  start           start a new extraction task and follow it
  select <id>     show a task from history (full id or unique prefix)
  history         reload the task history
  pages           ask the server how many pages the source has
  show            print the current view again
  help            show this text
  quit            leave";

/// Parses one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();
    if words.next().is_some() {
        return Err(format!("too many arguments for '{head}'"));
    }

    let command = match (head.to_ascii_lowercase().as_str(), arg) {
        ("start" | "new", None) => Command::Start,
        ("select" | "open", Some(id)) => Command::Select(id.to_string()),
        ("select" | "open", None) => return Err("usage: select <id>".to_string()),
        ("history" | "ls", None) => Command::History,
        ("pages", None) => Command::Pages,
        ("show", None) => Command::Show,
        ("help" | "?", None) => Command::Help,
        ("quit" | "exit" | "q", None) => Command::Quit,
        (other, Some(_)) if is_known(other) => {
            return Err(format!("'{other}' takes no arguments"))
        }
        (other, _) => return Err(format!("unknown command '{other}' (try 'help')")),
    };
    Ok(Some(command))
}

fn is_known(word: &str) -> bool {
    matches!(
        word,
        "start" | "new" | "history" | "ls" | "pages" | "show" | "help" | "?" | "quit" | "exit" | "q"
    )
}
