use crate::state::{JobPanel, Loadable};
use crate::{
    AppState, ConnectionInfo, DataSummary, JobKind, RunFlag, TaskFilter, TaskListState,
    TaskRecord, RECENT_ITEMS_SHOWN, TASK_STATUS_OPTIONS,
};

/// Shown for absent values.
pub const PLACEHOLDER: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub connection: ConnectionView,
    pub summary: SummaryView,
    pub incremental_note: Option<String>,
    pub full: JobView,
    pub queue: JobView,
    pub tasks: TaskListView,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ButtonView {
    pub label: String,
    pub enabled: bool,
}

impl ButtonView {
    fn new(label: impl Into<String>, enabled: bool) -> Self {
        Self {
            label: label.into(),
            enabled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobView {
    pub title: String,
    pub run_flag: Option<RunFlag>,
    pub updated: u64,
    pub total: u64,
    pub percent: u8,
    pub current_item: String,
    pub recent: Vec<String>,
    pub status_line: String,
    pub start: ButtonView,
    pub toggle: ButtonView,
    pub stop: ButtonView,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionView {
    pub status: String,
    pub params: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SummaryView {
    pub stock_basic_count: String,
    pub finance_count: String,
    pub latest_finance_date: String,
    pub latest_follow_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskListView {
    pub filter: TaskFilter,
    pub page: u32,
    pub total_pages: u32,
    pub total: u64,
    pub page_label: String,
    pub rows: Vec<TaskRowView>,
    pub prev_enabled: bool,
    pub next_enabled: bool,
    pub loading: bool,
    pub error: Option<String>,
    pub type_options: Vec<String>,
    pub status_options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskRowView {
    pub task_type: String,
    pub description: String,
    pub params: String,
    pub status: String,
    pub priority: i64,
    pub created_at: String,
    pub started_at: String,
    pub ended_at: String,
}

impl AppViewModel {
    pub(crate) fn build(state: &AppState, dirty: bool) -> Self {
        Self {
            connection: connection_view(&state.connection),
            summary: summary_view(&state.summary),
            incremental_note: state.incremental_note.clone(),
            full: job_view(JobKind::Full, &state.full, state.progress_error.as_deref()),
            queue: job_view(JobKind::Queue, &state.queue, state.progress_error.as_deref()),
            tasks: task_list_view(&state.tasks),
            dirty,
        }
    }

    pub fn job(&self, job: JobKind) -> &JobView {
        match job {
            JobKind::Full => &self.full,
            JobKind::Queue => &self.queue,
        }
    }
}

fn job_view(job: JobKind, panel: &JobPanel, poll_error: Option<&str>) -> JobView {
    let controller = &panel.controller;
    let start_label = match job {
        JobKind::Full => "Start full update",
        JobKind::Queue => "Start queue",
    };
    let mut view = JobView {
        title: job.title().to_string(),
        run_flag: controller.run_flag(),
        current_item: PLACEHOLDER.to_string(),
        start: ButtonView::new(start_label, controller.start_enabled()),
        toggle: ButtonView::new(
            controller.toggle_label().as_str(),
            controller.toggle_enabled(),
        ),
        stop: ButtonView::new("Stop", controller.stop_enabled()),
        note: panel.note.clone(),
        ..JobView::default()
    };

    let Some(snapshot) = controller.snapshot() else {
        view.status_line = match poll_error {
            Some(err) => format!("Status unavailable: {err}"),
            None => "Status: loading...".to_string(),
        };
        return view;
    };

    view.updated = snapshot.updated_count;
    view.total = snapshot.total_count;
    view.percent = snapshot.percent();
    if let Some(item) = snapshot.current_item.as_deref().filter(|s| !s.is_empty()) {
        view.current_item = item.to_string();
    }
    view.recent = snapshot
        .recent_items
        .iter()
        .take(RECENT_ITEMS_SHOWN)
        .cloned()
        .collect();

    let mut line = format!(
        "Status: {} | Progress: {}/{} ({}%) | Current: {}",
        snapshot.run_flag().label(),
        view.updated,
        view.total,
        view.percent,
        view.current_item
    );
    if job == JobKind::Full {
        let recent = if view.recent.is_empty() {
            PLACEHOLDER.to_string()
        } else {
            view.recent.join(", ")
        };
        line.push_str(&format!(" | Recent: {recent}"));
    }
    view.status_line = line;
    view
}

fn connection_view(connection: &Loadable<ConnectionInfo>) -> ConnectionView {
    match connection {
        Loadable::Pending => ConnectionView {
            status: "Loading...".to_string(),
            params: PLACEHOLDER.to_string(),
        },
        Loadable::Failed(err) => ConnectionView {
            status: "Load failed".to_string(),
            params: err.clone(),
        },
        Loadable::Ready(info) => {
            let field = |value: &Option<String>| {
                value
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .unwrap_or(PLACEHOLDER)
                    .to_string()
            };
            let status = if info.connected {
                "Connected".to_string()
            } else {
                match info.error.as_deref() {
                    Some(err) if !err.is_empty() => format!("Disconnected ({err})"),
                    _ => "Disconnected".to_string(),
                }
            };
            ConnectionView {
                status,
                params: format!(
                    "{}:{} {}/{}",
                    field(&info.host),
                    field(&info.port),
                    field(&info.user),
                    field(&info.database)
                ),
            }
        }
    }
}

fn summary_view(summary: &Loadable<DataSummary>) -> SummaryView {
    match summary.ready() {
        Some(data) => SummaryView {
            stock_basic_count: data.stock_basic_count.to_string(),
            finance_count: data.finance_count.to_string(),
            latest_finance_date: or_placeholder(data.latest_finance_date.as_deref()),
            latest_follow_time: or_placeholder(data.latest_follow_time.as_deref()),
        },
        None => SummaryView {
            stock_basic_count: PLACEHOLDER.to_string(),
            finance_count: PLACEHOLDER.to_string(),
            latest_finance_date: PLACEHOLDER.to_string(),
            latest_follow_time: PLACEHOLDER.to_string(),
        },
    }
}

fn task_list_view(tasks: &TaskListState) -> TaskListView {
    let (total, total_pages, rows) = match tasks.last_page() {
        Some(page) => (
            page.total,
            page.total_pages.max(1),
            page.items.iter().map(task_row).collect(),
        ),
        None => (0, 1, Vec::new()),
    };
    TaskListView {
        filter: tasks.filter().clone(),
        page: tasks.page(),
        total_pages,
        total,
        page_label: format!("Page {} / {}", tasks.page(), total_pages),
        rows,
        prev_enabled: tasks.prev_enabled(),
        next_enabled: tasks.next_enabled(),
        loading: tasks.loading(),
        error: tasks.error().map(str::to_string),
        type_options: tasks.type_options().to_vec(),
        status_options: TASK_STATUS_OPTIONS.iter().map(|s| s.to_string()).collect(),
    }
}

fn task_row(record: &TaskRecord) -> TaskRowView {
    TaskRowView {
        task_type: or_placeholder(record.task_type.as_deref()),
        description: or_placeholder(record.description.as_deref()),
        params: or_placeholder(record.params.as_deref()),
        status: or_placeholder(record.status.as_deref()),
        priority: record.priority,
        created_at: or_placeholder(record.created_at.as_deref()),
        started_at: or_placeholder(record.started_at.as_deref()),
        ended_at: or_placeholder(record.ended_at.as_deref()),
    }
}

fn or_placeholder(value: Option<&str>) -> String {
    value
        .filter(|s| !s.is_empty())
        .unwrap_or(PLACEHOLDER)
        .to_string()
}
