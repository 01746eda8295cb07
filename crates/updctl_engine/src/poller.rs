use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_trace, engine_warn};
use tokio::sync::Notify;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use updctl_core::{PollFamily, Refusal, RequestError, StatusReport};

use crate::client::Backend;
use crate::sink::EventSink;
use crate::wire;
use crate::{EngineEvent, Sequencer};

pub const STATUS_PATH: &str = "/update/status";

/// One status request, mapped onto a report or a classified failure.
pub async fn fetch_status(backend: &dyn Backend) -> Result<StatusReport, RequestError> {
    let response = backend.get(STATUS_PATH, &[]).await?;
    if !response.is_success() {
        return Err(RequestError::refused(
            Refusal::Rejected {
                status: response.status,
            },
            wire::refusal_message(&response.body, response.status),
        ));
    }
    wire::decode_status(&response.body)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollSchedule {
    /// Fixed period; the first poll fires immediately.
    Every(Duration),
    /// Polls only when triggered.
    OnDemand,
}

/// Issues status polls and forwards each outcome to the sink.
#[derive(Clone)]
pub struct StatusPoller {
    backend: Arc<dyn Backend>,
    sequencer: Sequencer,
    sink: Arc<dyn EventSink>,
}

impl StatusPoller {
    pub fn new(backend: Arc<dyn Backend>, sequencer: Sequencer, sink: Arc<dyn EventSink>) -> Self {
        Self {
            backend,
            sequencer,
            sink,
        }
    }

    /// Starts a poll loop for `family` on `runtime`.
    ///
    /// At most one request per family is outstanding; ticks that arrive while
    /// one is in flight are skipped, not queued.
    pub fn spawn(
        &self,
        family: PollFamily,
        schedule: PollSchedule,
        runtime: &tokio::runtime::Handle,
    ) -> PollerHandle {
        let handle = PollerHandle {
            family,
            cancel: CancellationToken::new(),
            trigger: Arc::new(Notify::new()),
            in_flight: Arc::new(AtomicBool::new(false)),
        };
        let task = PollTask {
            poller: self.clone(),
            family,
            cancel: handle.cancel.clone(),
            in_flight: handle.in_flight.clone(),
        };
        let trigger = handle.trigger.clone();
        engine_info!("starting {family:?} poller ({schedule:?})");
        runtime.spawn(task.run(schedule, trigger));
        handle
    }
}

/// Control surface of a running poll loop. Dropping it stops the loop.
#[derive(Debug)]
pub struct PollerHandle {
    family: PollFamily,
    cancel: CancellationToken,
    trigger: Arc<Notify>,
    in_flight: Arc<AtomicBool>,
}

impl PollerHandle {
    pub fn family(&self) -> PollFamily {
        self.family
    }

    /// Requests an out-of-schedule poll. Coalesces with one already in flight.
    pub fn poll_now(&self) {
        self.trigger.notify_one();
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Stops the loop. A response still in flight is discarded.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct PollTask {
    poller: StatusPoller,
    family: PollFamily,
    cancel: CancellationToken,
    in_flight: Arc<AtomicBool>,
}

impl PollTask {
    async fn run(self, schedule: PollSchedule, trigger: Arc<Notify>) {
        let mut ticker = match schedule {
            PollSchedule::Every(period) => {
                let period = period.max(Duration::from_millis(1));
                let mut interval = tokio::time::interval_at(Instant::now(), period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                Some(interval)
            }
            PollSchedule::OnDemand => None,
        };

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = next_tick(&mut ticker) => {
                    if self.family == PollFamily::Progress {
                        engine_logging::advance_poll_cycle();
                    }
                }
                _ = trigger.notified() => {
                    engine_debug!("{:?} poll requested", self.family);
                }
            }
            self.launch();
        }
        engine_info!("{:?} poller stopped", self.family);
    }

    fn launch(&self) {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            engine_debug!("{:?} poll still outstanding; skipping", self.family);
            return;
        }

        let seq = self.poller.sequencer.next();
        let family = self.family;
        let backend = self.poller.backend.clone();
        let sink = self.poller.sink.clone();
        let cancel = self.cancel.clone();
        let in_flight = self.in_flight.clone();

        tokio::spawn(async move {
            let outcome = tokio::select! {
                _ = cancel.cancelled() => None,
                result = fetch_status(backend.as_ref()) => Some(result),
            };
            in_flight.store(false, Ordering::Release);
            let Some(result) = outcome.filter(|_| !cancel.is_cancelled()) else {
                return;
            };
            match &result {
                Ok(_) => engine_trace!("{family:?} poll #{seq} ok"),
                Err(err) => engine_warn!("{family:?} poll #{seq} failed: {err}"),
            }
            sink.emit(EngineEvent::Status {
                family,
                seq,
                result,
            });
        });
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
