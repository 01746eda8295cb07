#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Run the on-demand summary poll.
    RefreshSummary,
    /// Send one control command to the backend.
    SendCommand {
        job: crate::JobKind,
        command: crate::ControlCommand,
    },
    TriggerIncremental,
    FetchTasks {
        request: u64,
        query: crate::TaskQuery,
    },
}
