//! Update controller core: pure state machine and view-model helpers.
//!
//! Nothing in this crate performs I/O. The engine turns HTTP responses into
//! [`Msg`] values, [`update`] folds them into [`AppState`] and returns the
//! [`Effect`]s the application must run next.
mod command;
mod controller;
mod effect;
mod failure;
mod msg;
mod snapshot;
mod state;
mod tasks;
mod update;
mod view_model;

pub use command::{CommandAck, ControlCommand, ControlIntent, StartAck};
pub use controller::{ControllerState, ToggleLabel};
pub use effect::Effect;
pub use failure::{FailureKind, Refusal, RequestError};
pub use msg::Msg;
pub use snapshot::{
    ConnectionInfo, DataSummary, JobKind, JobSnapshot, PollFamily, RunFlag, StatusReport,
    RECENT_ITEMS_SHOWN,
};
pub use state::{AppState, Loadable, Notification, NotificationLevel};
pub use tasks::{
    TaskFilter, TaskListState, TaskPage, TaskQuery, TaskRecord, TASK_PAGE_SIZE,
    TASK_STATUS_OPTIONS,
};
pub use update::update;
pub use view_model::{
    AppViewModel, ButtonView, ConnectionView, JobView, SummaryView, TaskListView, TaskRowView,
    PLACEHOLDER,
};
