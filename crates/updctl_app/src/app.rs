use std::collections::VecDeque;
use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use engine_logging::{engine_info, engine_warn};
use updctl_core::{
    update, AppState, ControlIntent, JobKind, Loadable, Msg, Notification, NotificationLevel,
    TaskFilter,
};

use crate::cli::{task_filter, Command};
use crate::config::ClientConfig;
use crate::effects::EffectRunner;
use crate::input::{self, InputCommand};
use crate::render;

const TICK: Duration = Duration::from_millis(75);
const NOTIFICATIONS_SHOWN: usize = 5;

pub(crate) fn run(command: Command, config: &ClientConfig) -> Result<()> {
    match command {
        Command::Watch => watch(config),
        Command::Status => status(config),
        Command::Run => incremental(config),
        Command::Start { job } => control(config, job.into(), ControlIntent::Start),
        Command::Toggle { job } => control(config, job.into(), ControlIntent::PauseOrResume),
        Command::Stop { job } => control(config, job.into(), ControlIntent::Stop),
        Command::Tasks {
            task_type,
            status,
            param,
            page,
        } => tasks(config, task_filter(task_type, status, param), page),
    }
}

/// Owns the state and drives it with messages from the engine and the user.
struct App {
    state: AppState,
    runner: EffectRunner,
    msg_rx: mpsc::Receiver<Msg>,
}

impl App {
    fn start(config: &ClientConfig, progress_polling: bool) -> Result<Self> {
        let (msg_tx, msg_rx) = mpsc::channel();
        let runner = EffectRunner::new(config.engine_settings(progress_polling), msg_tx)
            .with_context(|| format!("cannot talk to {}", config.base_url))?;
        Ok(Self {
            state: AppState::new(),
            runner,
            msg_rx,
        })
    }

    /// Returns how many effects the message produced.
    fn dispatch_msg(&mut self, msg: Msg) -> usize {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        let issued = effects.len();
        self.runner.enqueue(effects);
        issued
    }

    /// Dispatches engine messages until `done` holds or `timeout` passes.
    fn pump_until(&mut self, timeout: Duration, done: impl Fn(&AppState) -> bool) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while !done(&self.state) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.msg_rx.recv_timeout(remaining) {
                Ok(msg) => {
                    self.dispatch_msg(msg);
                }
                Err(RecvTimeoutError::Timeout) => {
                    bail!("no response from the backend within {timeout:?}")
                }
                Err(RecvTimeoutError::Disconnected) => bail!("engine stopped unexpectedly"),
            }
        }
        Ok(())
    }

    fn load_status(&mut self, config: &ClientConfig) -> Result<()> {
        self.dispatch_msg(Msg::ViewActivated);
        self.pump_until(config.response_deadline(), |state| {
            !matches!(state.connection(), Loadable::Pending)
        })
    }

    /// Prints info notifications; fails with the error ones.
    fn report_notifications(&mut self) -> Result<()> {
        let mut errors = Vec::new();
        for notification in self.state.take_notifications() {
            match notification.level {
                NotificationLevel::Info => println!("{}", notification.text),
                NotificationLevel::Error => errors.push(notification.text),
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(anyhow!(errors.join("\n")))
        }
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

fn status(config: &ClientConfig) -> Result<()> {
    let mut app = App::start(config, false)?;
    app.load_status(config)?;
    let view = app.state.view();
    print_lines(&render::update_screen(&view));
    if let Loadable::Failed(err) = app.state.connection() {
        bail!("status unavailable: {err}");
    }
    Ok(())
}

fn control(config: &ClientConfig, job: JobKind, intent: ControlIntent) -> Result<()> {
    let mut app = App::start(config, false)?;
    if let Err(err) = app.load_status(config) {
        engine_warn!("proceeding without a status snapshot: {err:#}");
    }
    if app.dispatch_msg(Msg::ControlClicked { job, intent }) > 0 {
        app.pump_until(config.response_deadline(), |state| {
            state.pending_command(job).is_none()
        })?;
    }
    print_lines(&render::job_lines(app.state.view().job(job)));
    app.report_notifications()
}

fn incremental(config: &ClientConfig) -> Result<()> {
    let mut app = App::start(config, false)?;
    app.dispatch_msg(Msg::IncrementalRunClicked);
    app.pump_until(config.response_deadline(), |state| {
        !state.incremental_pending()
    })?;
    app.report_notifications()
}

fn tasks(config: &ClientConfig, filter: TaskFilter, page: u32) -> Result<()> {
    let mut app = App::start(config, false)?;
    app.dispatch_msg(Msg::TaskFilterChanged(filter));
    if page > 1 {
        app.dispatch_msg(Msg::TaskPageSelected(page));
    }
    app.pump_until(config.response_deadline(), |state| !state.tasks().loading())?;
    let view = app.state.view();
    print_lines(&render::task_lines(&view.tasks));
    match view.tasks.error {
        Some(error) => Err(anyhow!(error)),
        None => Ok(()),
    }
}

fn spawn_input_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

struct Screen {
    show_tasks: bool,
    show_help: bool,
    feedback: Option<String>,
    recent: VecDeque<String>,
    clear: bool,
}

impl Screen {
    fn push_notification(&mut self, notification: &Notification) {
        let stamp = Local::now().format("%H:%M:%S").to_string();
        self.recent
            .push_back(render::notification_line(&stamp, notification));
        while self.recent.len() > NOTIFICATIONS_SHOWN {
            self.recent.pop_front();
        }
    }

    fn draw(&self, state: &AppState) -> io::Result<()> {
        let view = state.view();
        let mut out = io::stdout().lock();
        if self.clear {
            write!(out, "\x1b[2J\x1b[H")?;
        }
        let mut lines = render::update_screen(&view);
        if self.show_tasks {
            lines.push(String::new());
            lines.extend(render::task_lines(&view.tasks));
        }
        if !self.recent.is_empty() {
            lines.push(String::new());
            lines.extend(self.recent.iter().cloned());
        }
        if self.show_help {
            lines.push(String::new());
            lines.push(input::HELP.to_string());
        }
        if let Some(feedback) = &self.feedback {
            lines.push(feedback.clone());
        }
        for line in lines {
            writeln!(out, "{line}")?;
        }
        write!(out, "> ")?;
        out.flush()
    }
}

fn watch(config: &ClientConfig) -> Result<()> {
    let mut app = App::start(config, true)?;
    let mut input_rx = Some(spawn_input_reader());
    let mut screen = Screen {
        show_tasks: false,
        show_help: false,
        feedback: None,
        recent: VecDeque::new(),
        clear: io::stdout().is_terminal(),
    };
    engine_info!("watch started");
    app.dispatch_msg(Msg::ViewActivated);
    screen.draw(&app.state)?;

    loop {
        let mut redraw = false;
        while let Some(rx) = &input_rx {
            let line = match rx.try_recv() {
                Ok(line) => line,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    engine_info!("stdin closed; watching without input");
                    input_rx = None;
                    break;
                }
            };
            redraw = true;
            screen.show_help = false;
            screen.feedback = None;
            match input::parse(&line, app.state.tasks().filter()) {
                Ok(None) => {}
                Ok(Some(command)) => {
                    let shows_tasks = command.shows_tasks();
                    match command {
                        InputCommand::Quit => return Ok(()),
                        InputCommand::Help => screen.show_help = true,
                        InputCommand::Send(msg) => {
                            screen.show_tasks |= shows_tasks;
                            app.dispatch_msg(msg);
                        }
                    }
                }
                Err(message) => screen.feedback = Some(message),
            }
        }

        match app.msg_rx.recv_timeout(TICK) {
            Ok(msg) => {
                app.dispatch_msg(msg);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => bail!("engine stopped unexpectedly"),
        }

        for notification in app.state.take_notifications() {
            screen.push_notification(&notification);
            redraw = true;
        }
        if app.state.consume_dirty() || redraw {
            screen.draw(&app.state)?;
        }
    }
}
