/// Page size used for every task-list request.
pub const TASK_PAGE_SIZE: u32 = 50;

/// Status values the backend stores for tasks. Offered as filter choices
/// even before the first response arrives.
pub const TASK_STATUS_OPTIONS: [&str; 6] = [
    "待处理", "处理中", "成功", "失败", "重试中", "已取消",
];

/// Task-list filters. Empty strings mean "no filter".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskFilter {
    pub task_type: String,
    pub status: String,
    pub param_contains: String,
}

impl TaskFilter {
    pub fn normalized(self) -> Self {
        Self {
            task_type: self.task_type.trim().to_string(),
            status: self.status.trim().to_string(),
            param_contains: self.param_contains.trim().to_string(),
        }
    }
}

/// Parameters of one task-list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    pub filter: TaskFilter,
    pub page: u32,
    pub page_size: u32,
}

impl TaskQuery {
    pub fn new(filter: TaskFilter, page: u32) -> Self {
        Self {
            filter,
            page: page.max(1),
            page_size: TASK_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskRecord {
    pub task_type: Option<String>,
    pub description: Option<String>,
    /// Parameters rendered as compact JSON when the backend sent an object.
    pub params: Option<String>,
    pub status: Option<String>,
    pub priority: i64,
    pub created_at: Option<String>,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
}

/// One page of task history.
///
/// `has_prev` / `has_next` are kept exactly as the server sent them; the
/// accessors fall back to page arithmetic only when they are absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskPage {
    pub items: Vec<TaskRecord>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub has_prev: Option<bool>,
    pub has_next: Option<bool>,
    pub type_options: Vec<String>,
}

impl TaskPage {
    pub fn has_prev(&self) -> bool {
        self.has_prev.unwrap_or(self.page > 1)
    }

    pub fn has_next(&self) -> bool {
        self.has_next.unwrap_or(self.page < self.total_pages)
    }
}

/// Task-list view state: the current filter and page plus the last page the
/// server returned.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskListState {
    filter: TaskFilter,
    page: u32,
    latest_request: u64,
    loading: bool,
    last: Option<TaskPage>,
    type_options: Vec<String>,
    error: Option<String>,
}

impl TaskListState {
    pub fn new() -> Self {
        Self {
            page: 1,
            ..Self::default()
        }
    }

    pub fn filter(&self) -> &TaskFilter {
        &self.filter
    }

    pub fn page(&self) -> u32 {
        self.page.max(1)
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn last_page(&self) -> Option<&TaskPage> {
        self.last.as_ref()
    }

    pub fn type_options(&self) -> &[String] {
        &self.type_options
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn prev_enabled(&self) -> bool {
        match &self.last {
            Some(page) => page.has_prev(),
            None => self.page() > 1,
        }
    }

    pub fn next_enabled(&self) -> bool {
        self.last.as_ref().is_some_and(TaskPage::has_next)
    }

    /// Switches to `filter` at page 1. Paging flags of the previous filter's
    /// page no longer apply, so they are dropped until the new page loads.
    pub(crate) fn set_filter(&mut self, filter: TaskFilter) {
        self.filter = filter.normalized();
        self.page = 1;
        self.last = None;
    }

    pub(crate) fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Start a request for the current filter and page.
    pub(crate) fn begin_request(&mut self) -> (u64, TaskQuery) {
        self.latest_request += 1;
        self.loading = true;
        (
            self.latest_request,
            TaskQuery::new(self.filter.clone(), self.page()),
        )
    }

    /// Returns false when the response belongs to a superseded request.
    pub(crate) fn apply_page(&mut self, request: u64, page: TaskPage) -> bool {
        if request != self.latest_request {
            return false;
        }
        self.loading = false;
        self.error = None;
        if page.page > 0 {
            self.page = page.page;
        }
        if self.type_options.is_empty() && !page.type_options.is_empty() {
            self.type_options = page.type_options.clone();
        }
        self.last = Some(page);
        true
    }

    pub(crate) fn apply_failure(&mut self, request: u64, message: String) -> bool {
        if request != self.latest_request {
            return false;
        }
        self.loading = false;
        self.error = Some(message);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_flags_win_over_page_arithmetic() {
        let page = TaskPage {
            page: 1,
            total_pages: 3,
            has_prev: Some(true),
            has_next: Some(false),
            ..TaskPage::default()
        };
        assert!(page.has_prev());
        assert!(!page.has_next());
    }

    #[test]
    fn missing_flags_fall_back_to_page_arithmetic() {
        let page = TaskPage {
            page: 2,
            total_pages: 3,
            ..TaskPage::default()
        };
        assert!(page.has_prev());
        assert!(page.has_next());

        let last = TaskPage {
            page: 3,
            total_pages: 3,
            ..TaskPage::default()
        };
        assert!(!last.has_next());
    }

    #[test]
    fn stale_response_is_dropped() {
        let mut state = TaskListState::new();
        let (first, _) = state.begin_request();
        let (second, _) = state.begin_request();
        assert!(!state.apply_page(first, TaskPage::default()));
        assert!(state.loading());
        assert!(state.apply_page(second, TaskPage::default()));
        assert!(!state.loading());
    }
}
