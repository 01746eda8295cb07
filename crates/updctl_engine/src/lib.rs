//! Update controller engine: HTTP transport, polling and command execution.
mod client;
mod dispatcher;
mod engine;
mod poller;
mod sink;
mod tasks;
mod types;
mod wire;

pub use client::{Backend, ClientSettings, RawResponse, ReqwestBackend, DEFAULT_BASE_URL};
pub use dispatcher::{command_path, ActionDispatcher, CommandReport, INCREMENTAL_PATH};
pub use engine::{EngineHandle, EngineSettings};
pub use poller::{fetch_status, PollSchedule, PollerHandle, StatusPoller, STATUS_PATH};
pub use sink::{ChannelEventSink, EventSink};
pub use tasks::{task_query_pairs, TaskQueryClient, TASKS_PATH};
pub use types::{EngineError, EngineEvent, Sequencer};
