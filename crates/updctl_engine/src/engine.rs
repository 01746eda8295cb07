use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_error, engine_info};
use updctl_core::{ControlCommand, JobKind, PollFamily, TaskQuery};

use crate::client::{Backend, ClientSettings, ReqwestBackend};
use crate::dispatcher::ActionDispatcher;
use crate::poller::{PollSchedule, StatusPoller};
use crate::sink::{ChannelEventSink, EventSink};
use crate::tasks::TaskQueryClient;
use crate::{EngineError, EngineEvent, Sequencer};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub client: ClientSettings,
    pub poll_interval: Duration,
    /// Disables the periodic progress poll; summary polls still run on demand.
    pub progress_polling: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            client: ClientSettings::default(),
            poll_interval: Duration::from_secs(3),
            progress_polling: true,
        }
    }
}

enum EngineCommand {
    RefreshSummary,
    Dispatch { job: JobKind, command: ControlCommand },
    TriggerIncremental,
    FetchTasks { request: u64, query: TaskQuery },
    Shutdown,
}

/// Owns the background thread that runs the async clients.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

#[derive(Clone)]
struct Clients {
    dispatcher: ActionDispatcher,
    tasks: TaskQueryClient,
    sink: Arc<dyn EventSink>,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings) -> Result<Self, EngineError> {
        let backend: Arc<dyn Backend> = Arc::new(ReqwestBackend::new(&settings.client)?);
        Self::with_backend(settings, backend)
    }

    pub fn with_backend(
        settings: EngineSettings,
        backend: Arc<dyn Backend>,
    ) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;

        let sequencer = Sequencer::new();
        let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));
        let poller = StatusPoller::new(backend.clone(), sequencer.clone(), sink.clone());
        let clients = Clients {
            dispatcher: ActionDispatcher::new(backend.clone(), sequencer),
            tasks: TaskQueryClient::new(backend),
            sink,
        };

        thread::Builder::new()
            .name("updctl-engine".to_string())
            .spawn(move || {
                let progress = settings.progress_polling.then(|| {
                    poller.spawn(
                        PollFamily::Progress,
                        PollSchedule::Every(settings.poll_interval),
                        runtime.handle(),
                    )
                });
                let summary =
                    poller.spawn(PollFamily::Summary, PollSchedule::OnDemand, runtime.handle());

                while let Ok(command) = cmd_rx.recv() {
                    match command {
                        EngineCommand::RefreshSummary => summary.poll_now(),
                        EngineCommand::Shutdown => break,
                        command => {
                            let clients = clients.clone();
                            runtime.spawn(async move {
                                handle_command(&clients, command).await;
                            });
                        }
                    }
                }

                drop(progress);
                drop(summary);
                runtime.shutdown_timeout(Duration::from_millis(500));
                engine_info!("engine stopped");
            })
            .map_err(EngineError::Runtime)?;

        Ok(Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        })
    }

    pub fn refresh_summary(&self) {
        self.send(EngineCommand::RefreshSummary);
    }

    pub fn dispatch(&self, job: JobKind, command: ControlCommand) {
        self.send(EngineCommand::Dispatch { job, command });
    }

    pub fn trigger_incremental(&self) {
        self.send(EngineCommand::TriggerIncremental);
    }

    pub fn fetch_tasks(&self, request: u64, query: TaskQuery) {
        self.send(EngineCommand::FetchTasks { request, query });
    }

    /// Stops polling and lets in-flight requests drain briefly.
    pub fn shutdown(&self) {
        self.send(EngineCommand::Shutdown);
    }

    /// Returns the next pending event, if any. Fails with
    /// [`EngineError::Stopped`] once the engine thread has exited and every
    /// queued event has been taken.
    pub fn try_recv(&self) -> Result<Option<EngineEvent>, EngineError> {
        let receiver = self.event_rx.lock().map_err(|_| EngineError::Stopped)?;
        match receiver.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::TryRecvError::Empty) => Ok(None),
            Err(mpsc::TryRecvError::Disconnected) => Err(EngineError::Stopped),
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            engine_error!("engine thread is gone; command dropped");
        }
    }
}

async fn handle_command(clients: &Clients, command: EngineCommand) {
    let event = match command {
        EngineCommand::Dispatch { job, command } => {
            EngineEvent::Command(clients.dispatcher.dispatch(job, command).await)
        }
        EngineCommand::TriggerIncremental => {
            EngineEvent::Incremental(clients.dispatcher.trigger_incremental().await)
        }
        EngineCommand::FetchTasks { request, query } => EngineEvent::Tasks {
            request,
            result: clients.tasks.fetch(&query).await,
        },
        EngineCommand::RefreshSummary | EngineCommand::Shutdown => return,
    };
    clients.sink.emit(event);
}
