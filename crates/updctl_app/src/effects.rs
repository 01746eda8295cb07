use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info};
use updctl_core::{Effect, Msg};
use updctl_engine::{EngineError, EngineEvent, EngineHandle, EngineSettings};

/// Executes core effects on the engine and feeds engine events back as `Msg`.
pub(crate) struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub(crate) fn new(
        settings: EngineSettings,
        msg_tx: mpsc::Sender<Msg>,
    ) -> Result<Self, EngineError> {
        let engine = EngineHandle::new(settings)?;
        let runner = Self { engine };
        runner.spawn_event_loop(msg_tx);
        Ok(runner)
    }

    pub(crate) fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::RefreshSummary => {
                    engine_debug!("RefreshSummary");
                    self.engine.refresh_summary();
                }
                Effect::SendCommand { job, command } => {
                    engine_info!("SendCommand job={} command={}", job, command);
                    self.engine.dispatch(job, command);
                }
                Effect::TriggerIncremental => {
                    engine_info!("TriggerIncremental");
                    self.engine.trigger_incremental();
                }
                Effect::FetchTasks { request, query } => {
                    engine_debug!("FetchTasks request={} page={}", request, query.page);
                    self.engine.fetch_tasks(request, query);
                }
            }
        }
    }

    fn spawn_event_loop(&self, msg_tx: mpsc::Sender<Msg>) {
        let engine = self.engine.clone();
        thread::spawn(move || loop {
            match engine.try_recv() {
                Ok(Some(event)) => {
                    if msg_tx.send(map_event(event)).is_err() {
                        break;
                    }
                }
                Ok(None) => thread::sleep(Duration::from_millis(20)),
                Err(err) => {
                    engine_debug!("event loop exiting: {}", err);
                    break;
                }
            }
        });
    }
}

impl Drop for EffectRunner {
    fn drop(&mut self) {
        self.engine.shutdown();
    }
}

pub(crate) fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Status {
            family,
            seq,
            result,
        } => Msg::StatusReceived {
            family,
            seq,
            result,
        },
        EngineEvent::Command(report) => Msg::CommandFinished {
            job: report.job,
            command: report.command,
            seq: report.seq,
            result: report.result,
        },
        EngineEvent::Incremental(result) => Msg::IncrementalRunFinished(result),
        EngineEvent::Tasks { request, result } => Msg::TasksLoaded { request, result },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use updctl_core::{CommandAck, ControlCommand, JobKind};
    use updctl_engine::CommandReport;

    #[test]
    fn command_reports_keep_their_completion_seq() {
        let msg = map_event(EngineEvent::Command(CommandReport {
            job: JobKind::Queue,
            command: ControlCommand::Stop,
            seq: 9,
            result: Ok(CommandAck::StopRequested),
        }));
        assert_eq!(
            msg,
            Msg::CommandFinished {
                job: JobKind::Queue,
                command: ControlCommand::Stop,
                seq: 9,
                result: Ok(CommandAck::StopRequested),
            }
        );
    }

    #[test]
    fn event_loop_ends_when_engine_stops() {
        let (msg_tx, msg_rx) = mpsc::channel();
        let settings = EngineSettings {
            progress_polling: false,
            ..EngineSettings::default()
        };
        let runner = EffectRunner::new(settings, msg_tx).expect("runner");
        drop(runner);

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut outcome = msg_rx.recv_timeout(Duration::from_millis(50));
        while outcome == Err(mpsc::RecvTimeoutError::Timeout) && Instant::now() < deadline {
            outcome = msg_rx.recv_timeout(Duration::from_millis(50));
        }
        assert_eq!(outcome, Err(mpsc::RecvTimeoutError::Disconnected));
    }
}
