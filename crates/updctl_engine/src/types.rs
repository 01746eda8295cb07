use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use updctl_core::{PollFamily, RequestError, StartAck, StatusReport, TaskPage};

use crate::dispatcher::CommandReport;

/// Everything the engine reports back to the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Status {
        family: PollFamily,
        seq: u64,
        result: Result<StatusReport, RequestError>,
    },
    Command(CommandReport),
    Incremental(Result<StartAck, RequestError>),
    Tasks {
        request: u64,
        result: Result<TaskPage, RequestError>,
    },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid base url {url:?}: {message}")]
    InvalidBaseUrl { url: String, message: String },
    #[error("failed to build http client: {0}")]
    Client(String),
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("engine has stopped")]
    Stopped,
}

/// Shared, monotonically increasing observation counter.
///
/// Polls draw a number when the request is issued, control commands when
/// their response arrives, so the core can tell whether a poll could have
/// seen the effect of a command.
#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    next: Arc<AtomicU64>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::AcqRel) + 1
    }
}
