use updctl_core::{
    AppViewModel, ButtonView, JobView, Notification, NotificationLevel, TaskListView,
};

pub(crate) fn connection_lines(view: &AppViewModel) -> Vec<String> {
    vec![
        format!("QuestDB: {} | {}", view.connection.status, view.connection.params),
        format!(
            "Stocks: {} | Finance rows: {} | Latest finance date: {} | Latest follow: {}",
            view.summary.stock_basic_count,
            view.summary.finance_count,
            view.summary.latest_finance_date,
            view.summary.latest_follow_time
        ),
    ]
}

pub(crate) fn job_lines(job: &JobView) -> Vec<String> {
    let mut lines = vec![
        format!("== {} ==", job.title),
        job.status_line.clone(),
        format!(
            "{} {} {}",
            button(&job.start),
            button(&job.toggle),
            button(&job.stop)
        ),
    ];
    if let Some(note) = &job.note {
        lines.push(format!("  {note}"));
    }
    lines
}

pub(crate) fn update_screen(view: &AppViewModel) -> Vec<String> {
    let mut lines = connection_lines(view);
    if let Some(note) = &view.incremental_note {
        lines.push(format!("Incremental: {note}"));
    }
    lines.push(String::new());
    lines.extend(job_lines(&view.full));
    lines.push(String::new());
    lines.extend(job_lines(&view.queue));
    lines
}

pub(crate) fn task_lines(tasks: &TaskListView) -> Vec<String> {
    let mut lines = Vec::new();
    let filter = &tasks.filter;
    lines.push(format!(
        "== Tasks == type={} status={} param={}",
        or_any(&filter.task_type),
        or_any(&filter.status),
        or_any(&filter.param_contains)
    ));
    if tasks.loading {
        lines.push("Loading...".to_string());
    }
    if let Some(error) = &tasks.error {
        lines.push(error.clone());
    }
    lines.push(format!(
        "{:<16} {:<10} {:<8} {:<20} {:<20} {:<20} {:<24} Params",
        "Type", "Status", "Priority", "Created", "Started", "Ended", "Description"
    ));
    if tasks.rows.is_empty() && !tasks.loading {
        lines.push("(no tasks)".to_string());
    }
    for row in &tasks.rows {
        lines.push(format!(
            "{:<16} {:<10} {:<8} {:<20} {:<20} {:<20} {:<24} {}",
            row.task_type,
            row.status,
            row.priority,
            row.created_at,
            row.started_at,
            row.ended_at,
            row.description,
            row.params
        ));
    }
    lines.push(format!(
        "{} ({} tasks) {} {}",
        tasks.page_label,
        tasks.total,
        button(&ButtonView {
            label: "prev".to_string(),
            enabled: tasks.prev_enabled,
        }),
        button(&ButtonView {
            label: "next".to_string(),
            enabled: tasks.next_enabled,
        })
    ));
    if !tasks.type_options.is_empty() {
        lines.push(format!("Types: {}", tasks.type_options.join(", ")));
    }
    lines.push(format!("Statuses: {}", tasks.status_options.join(", ")));
    lines
}

pub(crate) fn notification_line(stamp: &str, notification: &Notification) -> String {
    let tag = match notification.level {
        NotificationLevel::Info => "info",
        NotificationLevel::Error => "error",
    };
    format!("[{stamp}] {tag}: {}", notification.text)
}

fn button(view: &ButtonView) -> String {
    if view.enabled {
        format!("[{}]", view.label)
    } else {
        format!("({} unavailable)", view.label)
    }
}

fn or_any(value: &str) -> &str {
    if value.is_empty() {
        "*"
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use updctl_core::{TaskRowView, TaskFilter};

    #[test]
    fn disabled_buttons_are_marked() {
        let job = JobView {
            title: "Task queue".to_string(),
            status_line: "Status: Idle".to_string(),
            start: ButtonView {
                label: "Start queue".to_string(),
                enabled: true,
            },
            toggle: ButtonView {
                label: "Pause".to_string(),
                enabled: false,
            },
            stop: ButtonView {
                label: "Stop".to_string(),
                enabled: true,
            },
            note: Some("Stop requested".to_string()),
            ..JobView::default()
        };
        assert_eq!(
            job_lines(&job),
            vec![
                "== Task queue ==".to_string(),
                "Status: Idle".to_string(),
                "[Start queue] (Pause unavailable) [Stop]".to_string(),
                "  Stop requested".to_string(),
            ]
        );
    }

    #[test]
    fn task_table_lists_rows_and_paging() {
        let view = TaskListView {
            filter: TaskFilter {
                status: "失败".to_string(),
                ..TaskFilter::default()
            },
            page: 1,
            total_pages: 2,
            total: 51,
            page_label: "Page 1 / 2".to_string(),
            rows: vec![TaskRowView {
                task_type: "finance".to_string(),
                status: "失败".to_string(),
                params: "{\"code\":\"000001\"}".to_string(),
                ..TaskRowView::default()
            }],
            next_enabled: true,
            ..TaskListView::default()
        };
        let lines = task_lines(&view);
        assert_eq!(lines[0], "== Tasks == type=* status=失败 param=*");
        assert!(lines[2].starts_with("finance"));
        assert!(lines[2].ends_with("{\"code\":\"000001\"}"));
        assert_eq!(lines[3], "Page 1 / 2 (51 tasks) (prev unavailable) [next]");
    }

    #[test]
    fn notifications_carry_level_and_time() {
        let line = notification_line("10:00:01", &Notification::error("Full update stop failed"));
        assert_eq!(line, "[10:00:01] error: Full update stop failed");
    }
}
