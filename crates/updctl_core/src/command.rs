use std::fmt;

/// What the user asked for. Created and consumed within one click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlIntent {
    Start,
    PauseOrResume,
    Stop,
}

impl ControlIntent {
    /// Resolve the intent against a single read of the cached `paused` flag.
    pub fn resolve(self, paused: bool) -> ControlCommand {
        match self {
            ControlIntent::Start => ControlCommand::Start,
            ControlIntent::PauseOrResume if paused => ControlCommand::Resume,
            ControlIntent::PauseOrResume => ControlCommand::Pause,
            ControlIntent::Stop => ControlCommand::Stop,
        }
    }
}

/// The single outbound command an intent resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Start,
    Pause,
    Resume,
    Stop,
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControlCommand::Start => "start",
            ControlCommand::Pause => "pause",
            ControlCommand::Resume => "resume",
            ControlCommand::Stop => "stop",
        };
        f.write_str(name)
    }
}

/// Successful response to a start request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StartAck {
    pub started_at: Option<String>,
    pub total_count: Option<u64>,
}

/// Successful response to a control command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandAck {
    Started(StartAck),
    /// Pause and resume both answer with the authoritative `paused` value.
    PauseState { paused: bool },
    /// The backend accepted the stop signal; the job ends later.
    StopRequested,
}
