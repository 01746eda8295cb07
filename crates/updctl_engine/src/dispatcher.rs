use std::sync::Arc;

use engine_logging::{engine_info, engine_warn};
use updctl_core::{
    CommandAck, ControlCommand, FailureKind, JobKind, Refusal, RequestError, StartAck,
};

use crate::client::{Backend, RawResponse};
use crate::wire::{self, PausePayload, StartPayload};
use crate::Sequencer;

pub const INCREMENTAL_PATH: &str = "/update/run";

/// Endpoint for a control command against one job.
pub fn command_path(job: JobKind, command: ControlCommand) -> &'static str {
    match (job, command) {
        (JobKind::Full, ControlCommand::Start) => "/update/full",
        (JobKind::Full, ControlCommand::Pause) => "/update/pause",
        (JobKind::Full, ControlCommand::Resume) => "/update/resume",
        (JobKind::Full, ControlCommand::Stop) => "/update/stop",
        (JobKind::Queue, ControlCommand::Start) => "/update/queue/start",
        (JobKind::Queue, ControlCommand::Pause) => "/update/queue/pause",
        (JobKind::Queue, ControlCommand::Resume) => "/update/queue/resume",
        (JobKind::Queue, ControlCommand::Stop) => "/update/queue/stop",
    }
}

/// Outcome of one control command, stamped when its response arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReport {
    pub job: JobKind,
    pub command: ControlCommand,
    pub seq: u64,
    pub result: Result<CommandAck, RequestError>,
}

/// Sends control commands. One request per call; never retries.
#[derive(Clone)]
pub struct ActionDispatcher {
    backend: Arc<dyn Backend>,
    sequencer: Sequencer,
}

impl ActionDispatcher {
    pub fn new(backend: Arc<dyn Backend>, sequencer: Sequencer) -> Self {
        Self { backend, sequencer }
    }

    pub async fn dispatch(&self, job: JobKind, command: ControlCommand) -> CommandReport {
        engine_info!("sending {command} for {job} job");
        let result = self.send(job, command).await;
        let seq = self.sequencer.next();
        match &result {
            Ok(ack) => engine_info!("{job} {command} acknowledged: {ack:?}"),
            Err(err) => engine_warn!("{job} {command} failed: {err}"),
        }
        CommandReport {
            job,
            command,
            seq,
            result,
        }
    }

    /// Starts an incremental update run.
    pub async fn trigger_incremental(&self) -> Result<StartAck, RequestError> {
        engine_info!("triggering incremental update");
        let result = match self.backend.post(INCREMENTAL_PATH).await {
            Ok(response) => interpret_start(&response),
            Err(err) => Err(err),
        };
        if let Err(err) = &result {
            engine_warn!("incremental update failed: {err}");
        }
        result
    }

    async fn send(
        &self,
        job: JobKind,
        command: ControlCommand,
    ) -> Result<CommandAck, RequestError> {
        let response = self.backend.post(command_path(job, command)).await?;
        match command {
            ControlCommand::Start => interpret_start(&response).map(CommandAck::Started),
            ControlCommand::Pause | ControlCommand::Resume => interpret_pause(&response),
            ControlCommand::Stop => interpret_stop(&response),
        }
    }
}

fn check_refusal(response: &RawResponse) -> Result<(), RequestError> {
    if !response.is_success() {
        return Err(RequestError::refused(
            Refusal::Rejected {
                status: response.status,
            },
            wire::refusal_message(&response.body, response.status),
        ));
    }
    Ok(())
}

fn carried_error(response: &RawResponse) -> Result<(), RequestError> {
    match wire::carried_refusal(&response.body) {
        Some(message) => Err(RequestError::refused(
            Refusal::Rejected {
                status: response.status,
            },
            message,
        )),
        None => Ok(()),
    }
}

fn interpret_start(response: &RawResponse) -> Result<StartAck, RequestError> {
    check_refusal(response)?;
    let payload: StartPayload = wire::decode(&response.body)?;
    match payload.started {
        Some(true) => Ok(payload.ack()),
        Some(false) => Err(RequestError::refused(
            Refusal::AlreadyRunning,
            wire::carried_refusal(&response.body)
                .unwrap_or_else(|| "a job of this kind is already running".to_string()),
        )),
        None => {
            carried_error(response)?;
            Err(RequestError::new(
                FailureKind::Decode,
                "start response is missing `started`",
            ))
        }
    }
}

fn interpret_pause(response: &RawResponse) -> Result<CommandAck, RequestError> {
    check_refusal(response)?;
    carried_error(response)?;
    let payload: PausePayload = wire::decode(&response.body)?;
    if payload.running == Some(false) {
        return Err(RequestError::refused(
            Refusal::NotRunning,
            "the job is not running",
        ));
    }
    match payload.paused {
        Some(paused) => Ok(CommandAck::PauseState { paused }),
        None => Err(RequestError::new(
            FailureKind::Decode,
            "pause response is missing `paused`",
        )),
    }
}

/// Stop is acknowledge-only; the body is not required to parse.
fn interpret_stop(response: &RawResponse) -> Result<CommandAck, RequestError> {
    check_refusal(response)?;
    carried_error(response)?;
    Ok(CommandAck::StopRequested)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(body: &str) -> RawResponse {
        RawResponse {
            status: 200,
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn every_command_has_a_distinct_endpoint() {
        let mut paths = Vec::new();
        for job in JobKind::ALL {
            for command in [
                ControlCommand::Start,
                ControlCommand::Pause,
                ControlCommand::Resume,
                ControlCommand::Stop,
            ] {
                paths.push(command_path(job, command));
            }
        }
        paths.sort_unstable();
        paths.dedup();
        assert_eq!(paths.len(), 8);
    }

    #[test]
    fn pause_while_idle_is_not_running() {
        let err = interpret_pause(&ok(r#"{"running": false, "paused": false}"#)).unwrap_err();
        assert_eq!(err.kind, FailureKind::Refused(Refusal::NotRunning));
    }

    #[test]
    fn stop_accepts_any_body() {
        assert_eq!(
            interpret_stop(&ok("stopping")).unwrap(),
            CommandAck::StopRequested
        );
        assert_eq!(
            interpret_stop(&ok(r#"{"running": true, "stopped": true}"#)).unwrap(),
            CommandAck::StopRequested
        );
    }

    #[test]
    fn start_without_flag_is_malformed() {
        let err = interpret_start(&ok(r#"{"started_at": "now"}"#)).unwrap_err();
        assert_eq!(err.kind, FailureKind::Decode);
    }
}
