use updctl_core::{ControlIntent, JobKind, Msg, TaskFilter};

pub(crate) const HELP: &str = "\
commands:
  full start|toggle|stop     control the full update
  queue start|toggle|stop    control the task queue
  run                        trigger an incremental update
  refresh                    reload connection and data summary
  tasks                      show the task list
  next | prev | page <n>     page through tasks
  filter type=<t> status=<s> param=<p>
                             filter tasks; omitted keys are kept, `filter clear` resets
  help                       show this text
  quit                       exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InputCommand {
    Send(Msg),
    Help,
    Quit,
}

impl InputCommand {
    /// Whether the command concerns the task list.
    pub(crate) fn shows_tasks(&self) -> bool {
        matches!(
            self,
            InputCommand::Send(
                Msg::TasksActivated
                    | Msg::TaskFilterChanged(_)
                    | Msg::TaskPageNext
                    | Msg::TaskPagePrev
                    | Msg::TaskPageSelected(_)
            )
        )
    }
}

/// Parses one line typed in watch mode. Blank lines yield `Ok(None)`.
pub(crate) fn parse(line: &str, current: &TaskFilter) -> Result<Option<InputCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let command = match (head.to_ascii_lowercase().as_str(), rest.as_slice()) {
        ("full", [action]) => control(JobKind::Full, action)?,
        ("queue", [action]) => control(JobKind::Queue, action)?,
        ("full" | "queue", _) => return Err(format!("usage: {head} start|toggle|stop")),
        ("run", []) => InputCommand::Send(Msg::IncrementalRunClicked),
        ("refresh", []) => InputCommand::Send(Msg::ViewActivated),
        ("tasks", []) => InputCommand::Send(Msg::TasksActivated),
        ("next", []) => InputCommand::Send(Msg::TaskPageNext),
        ("prev", []) => InputCommand::Send(Msg::TaskPagePrev),
        ("page", [number]) => match number.parse::<u32>() {
            Ok(page) if page > 0 => InputCommand::Send(Msg::TaskPageSelected(page)),
            _ => return Err(format!("not a page number: {number}")),
        },
        ("filter", args) => InputCommand::Send(Msg::TaskFilterChanged(filter(args, current)?)),
        ("help" | "?", _) => InputCommand::Help,
        ("quit" | "exit" | "q", _) => InputCommand::Quit,
        _ => return Err(format!("unknown command: {}; type `help`", line.trim())),
    };
    Ok(Some(command))
}

fn control(job: JobKind, action: &str) -> Result<InputCommand, String> {
    let intent = match action.to_ascii_lowercase().as_str() {
        "start" => ControlIntent::Start,
        "toggle" | "pause" | "resume" => ControlIntent::PauseOrResume,
        "stop" => ControlIntent::Stop,
        other => return Err(format!("unknown action for {job}: {other}")),
    };
    Ok(InputCommand::Send(Msg::ControlClicked { job, intent }))
}

fn filter(args: &[&str], current: &TaskFilter) -> Result<TaskFilter, String> {
    if args == ["clear"] {
        return Ok(TaskFilter::default());
    }
    let mut filter = current.clone();
    for arg in args {
        let Some((key, value)) = arg.split_once('=') else {
            return Err(format!("expected key=value, got {arg}"));
        };
        match key {
            "type" => filter.task_type = value.to_string(),
            "status" => filter.status = value.to_string(),
            "param" => filter.param_contains = value.to_string(),
            other => return Err(format!("unknown filter key: {other}")),
        }
    }
    Ok(filter)
}
