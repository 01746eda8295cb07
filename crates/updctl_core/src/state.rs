use crate::view_model::AppViewModel;
use crate::{
    ConnectionInfo, ControlCommand, ControllerState, DataSummary, JobKind, TaskListState,
};

/// A field that loads from the backend. Once loaded it never goes back to a
/// failure state; later failures keep the last good value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Loadable<T> {
    #[default]
    Pending,
    Ready(T),
    Failed(String),
}

impl<T> Loadable<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Loadable::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub(crate) fn set(&mut self, value: T) {
        *self = Loadable::Ready(value);
    }

    /// Only marks the field failed if it never loaded.
    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        if !matches!(self, Loadable::Ready(_)) {
            *self = Loadable::Failed(message.into());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// Transient message for the user (toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub text: String,
}

impl Notification {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct JobPanel {
    pub(crate) controller: ControllerState,
    /// Command sent and not yet answered.
    pub(crate) pending: Option<ControlCommand>,
    /// Outcome of the last command, shown next to the controls.
    pub(crate) note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub(crate) connection: Loadable<ConnectionInfo>,
    pub(crate) summary: Loadable<DataSummary>,
    pub(crate) full: JobPanel,
    pub(crate) queue: JobPanel,
    pub(crate) progress_error: Option<String>,
    pub(crate) poll_failures: u32,
    pub(crate) incremental_pending: bool,
    pub(crate) incremental_note: Option<String>,
    pub(crate) tasks: TaskListState,
    notifications: Vec<Notification>,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            connection: Loadable::Pending,
            summary: Loadable::Pending,
            full: JobPanel::default(),
            queue: JobPanel::default(),
            progress_error: None,
            poll_failures: 0,
            incremental_pending: false,
            incremental_note: None,
            tasks: TaskListState::new(),
            notifications: Vec::new(),
            dirty: false,
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel::build(self, self.dirty)
    }

    pub fn controller(&self, job: JobKind) -> &ControllerState {
        &self.panel(job).controller
    }

    pub fn pending_command(&self, job: JobKind) -> Option<ControlCommand> {
        self.panel(job).pending
    }

    pub fn connection(&self) -> &Loadable<ConnectionInfo> {
        &self.connection
    }

    pub fn summary(&self) -> &Loadable<DataSummary> {
        &self.summary
    }

    pub fn tasks(&self) -> &TaskListState {
        &self.tasks
    }

    pub fn incremental_pending(&self) -> bool {
        self.incremental_pending
    }

    /// Consecutive failed status polls across both families.
    pub fn consecutive_poll_failures(&self) -> u32 {
        self.poll_failures
    }

    /// Returns whether the state changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Drain queued notifications.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub(crate) fn panel(&self, job: JobKind) -> &JobPanel {
        match job {
            JobKind::Full => &self.full,
            JobKind::Queue => &self.queue,
        }
    }

    pub(crate) fn panel_mut(&mut self, job: JobKind) -> &mut JobPanel {
        match job {
            JobKind::Full => &mut self.full,
            JobKind::Queue => &mut self.queue,
        }
    }

    pub(crate) fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
        self.dirty = true;
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
