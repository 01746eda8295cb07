#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The update view became visible (also sent once on initial load).
    ViewActivated,
    /// A status poll finished. `seq` was drawn when the request was issued.
    StatusReceived {
        family: crate::PollFamily,
        seq: u64,
        result: Result<crate::StatusReport, crate::RequestError>,
    },
    /// User clicked a job control.
    ControlClicked {
        job: crate::JobKind,
        intent: crate::ControlIntent,
    },
    /// A control command finished. `seq` was drawn when the response arrived.
    CommandFinished {
        job: crate::JobKind,
        command: crate::ControlCommand,
        seq: u64,
        result: Result<crate::CommandAck, crate::RequestError>,
    },
    /// User clicked the incremental update trigger.
    IncrementalRunClicked,
    IncrementalRunFinished(Result<crate::StartAck, crate::RequestError>),
    /// The task list became visible.
    TasksActivated,
    /// User applied new task filters.
    TaskFilterChanged(crate::TaskFilter),
    TaskPageNext,
    TaskPagePrev,
    /// User jumped to a specific page.
    TaskPageSelected(u32),
    TasksLoaded {
        request: u64,
        result: Result<crate::TaskPage, crate::RequestError>,
    },
    /// Render tick.
    Tick,
    NoOp,
}
