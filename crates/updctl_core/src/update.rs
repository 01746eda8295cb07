use crate::{
    AppState, CommandAck, ControlCommand, ControlIntent, Effect, JobKind, Msg, Notification,
    PollFamily, RequestError, StartAck, StatusReport,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::ViewActivated => vec![Effect::RefreshSummary],
        Msg::StatusReceived {
            family,
            seq,
            result,
        } => {
            match result {
                Ok(report) => apply_report(&mut state, family, seq, report),
                Err(err) => apply_poll_failure(&mut state, family, &err),
            }
            Vec::new()
        }
        Msg::ControlClicked { job, intent } => control_clicked(&mut state, job, intent),
        Msg::CommandFinished {
            job,
            command,
            seq,
            result,
        } => {
            command_finished(&mut state, job, command, seq, result);
            Vec::new()
        }
        Msg::IncrementalRunClicked => {
            if state.incremental_pending {
                return (state, Vec::new());
            }
            state.incremental_pending = true;
            state.incremental_note = Some("Incremental update requested...".to_string());
            state.mark_dirty();
            vec![Effect::TriggerIncremental]
        }
        Msg::IncrementalRunFinished(result) => {
            incremental_finished(&mut state, result);
            Vec::new()
        }
        Msg::TasksActivated => {
            state.tasks.set_page(1);
            fetch_tasks(&mut state)
        }
        Msg::TaskFilterChanged(filter) => {
            state.tasks.set_filter(filter);
            fetch_tasks(&mut state)
        }
        Msg::TaskPageNext => {
            if state.tasks.next_enabled() {
                let next = state.tasks.page().saturating_add(1);
                state.tasks.set_page(next);
                fetch_tasks(&mut state)
            } else {
                Vec::new()
            }
        }
        Msg::TaskPagePrev => {
            let page = state.tasks.page();
            if page > 1 && state.tasks.prev_enabled() {
                state.tasks.set_page(page - 1);
                fetch_tasks(&mut state)
            } else {
                Vec::new()
            }
        }
        Msg::TaskPageSelected(page) => {
            state.tasks.set_page(page);
            fetch_tasks(&mut state)
        }
        Msg::TasksLoaded { request, result } => {
            let applied = match result {
                Ok(page) => state.tasks.apply_page(request, page),
                Err(err) => {
                    let message = format!("Failed to load tasks: {}", err.user_message());
                    state.tasks.apply_failure(request, message)
                }
            };
            if applied {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn apply_report(state: &mut AppState, family: PollFamily, seq: u64, report: StatusReport) {
    state.poll_failures = 0;
    state.progress_error = None;

    let StatusReport {
        connection,
        summary,
        full,
        queue,
    } = report;
    state.full.controller.apply_snapshot(seq, full);
    state.queue.controller.apply_snapshot(seq, queue);

    // The summary panel only refreshes on activation, like its poll.
    if family == PollFamily::Summary {
        state.connection.set(connection);
        state.summary.set(summary);
    }
    state.mark_dirty();
}

fn apply_poll_failure(state: &mut AppState, family: PollFamily, err: &RequestError) {
    state.poll_failures = state.poll_failures.saturating_add(1);
    let message = err.user_message();

    let mut never_loaded = state.full.controller.snapshot().is_none()
        || state.queue.controller.snapshot().is_none();
    if family == PollFamily::Summary {
        never_loaded |= state.connection.ready().is_none() || state.summary.ready().is_none();
        state.connection.fail(message.clone());
        state.summary.fail(message.clone());
    }
    state.progress_error = Some(message);
    if never_loaded {
        state.mark_dirty();
    }
}

fn control_clicked(state: &mut AppState, job: JobKind, intent: ControlIntent) -> Vec<Effect> {
    let controller = state.controller(job);
    if !controller.intent_enabled(intent) {
        let reason = match intent {
            ControlIntent::Start => "it is already running",
            ControlIntent::PauseOrResume => "it has not been started",
            ControlIntent::Stop => "the control is disabled",
        };
        let text = format!(
            "{}: cannot {} because {reason}",
            job.title(),
            intent_verb(intent, controller.paused()),
        );
        state.notify(Notification::error(text));
        return Vec::new();
    }

    // Resolved once, from the state in effect at click time.
    let command = controller.resolve(intent);
    let panel = state.panel_mut(job);
    panel.pending = Some(command);
    panel.note = Some(format!("{} requested...", capitalize(&command.to_string())));
    state.mark_dirty();
    vec![Effect::SendCommand { job, command }]
}

fn command_finished(
    state: &mut AppState,
    job: JobKind,
    command: ControlCommand,
    seq: u64,
    result: Result<CommandAck, RequestError>,
) {
    let title = job.title();
    let panel = state.panel_mut(job);
    if panel.pending == Some(command) {
        panel.pending = None;
    }

    let notification = match result {
        Ok(ack) => {
            panel.controller.apply_ack(seq, &ack);
            let text = match &ack {
                CommandAck::Started(start) => {
                    panel.note = Some(describe_start(start));
                    format!("{title} started")
                }
                CommandAck::PauseState { paused: true } => {
                    panel.note = Some("Paused".to_string());
                    format!("{title} paused")
                }
                CommandAck::PauseState { paused: false } => {
                    panel.note = Some("Resumed".to_string());
                    format!("{title} resumed")
                }
                CommandAck::StopRequested => {
                    panel.note = Some("Stop requested".to_string());
                    format!("Stop requested; {title} will exit as soon as possible")
                }
            };
            Notification::info(text)
        }
        Err(err) => {
            let message = err.user_message();
            panel.note = Some(format!("{} failed: {message}", capitalize(&command.to_string())));
            Notification::error(format!("{title} {command} failed: {message}"))
        }
    };
    state.notify(notification);
}

fn incremental_finished(state: &mut AppState, result: Result<StartAck, RequestError>) {
    state.incremental_pending = false;
    match result {
        Ok(ack) => {
            let at = ack.started_at.as_deref().unwrap_or(crate::PLACEHOLDER);
            let note = format!("Incremental update started at {at}");
            state.incremental_note = Some(note.clone());
            state.notify(Notification::info(note));
        }
        Err(err) => {
            let message = err.user_message();
            state.incremental_note = Some(format!("Incremental update failed: {message}"));
            state.notify(Notification::error(format!(
                "Incremental update failed: {message}"
            )));
        }
    }
}

fn fetch_tasks(state: &mut AppState) -> Vec<Effect> {
    let (request, query) = state.tasks.begin_request();
    state.mark_dirty();
    vec![Effect::FetchTasks { request, query }]
}

fn describe_start(ack: &StartAck) -> String {
    let at = ack.started_at.as_deref().unwrap_or(crate::PLACEHOLDER);
    match ack.total_count {
        Some(total) => format!("Started at {at}, {total} items pending"),
        None => format!("Started at {at}"),
    }
}

fn intent_verb(intent: ControlIntent, paused: bool) -> &'static str {
    match intent.resolve(paused) {
        ControlCommand::Start => "start",
        ControlCommand::Pause => "pause",
        ControlCommand::Resume => "resume",
        ControlCommand::Stop => "stop",
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
