use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use updctl_core::{update, AppState, FailureKind, Msg, PollFamily, Refusal};
use updctl_engine::{
    fetch_status, Backend, ClientSettings, EngineEvent, EventSink, PollSchedule, ReqwestBackend,
    Sequencer, StatusPoller,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STATUS: &str = "/api/stocks/update/status";

#[derive(Default)]
struct TestSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl TestSink {
    fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl EventSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn backend(server: &MockServer, timeout: Duration) -> Arc<dyn Backend> {
    Arc::new(
        ReqwestBackend::new(&ClientSettings {
            base_url: format!("{}/api/stocks", server.uri()),
            request_timeout: timeout,
            ..ClientSettings::default()
        })
        .expect("backend"),
    )
}

fn sample_status() -> serde_json::Value {
    serde_json::json!({
        "questdb": {
            "host": "db.internal", "port": 8812, "user": "admin",
            "dbname": "qdb", "connected": true, "error": null
        },
        "stock_basic_count": 5321,
        "finance_count": "48000",
        "latest_finance_date": "2024-03-31",
        "latest_follow_time": null,
        "total_codes": 5321,
        "updated_count": 1200,
        "controller": {
            "running": true, "paused": false, "stopped": false,
            "current_code": "600519", "started_at": "2024-05-01T09:00:00"
        },
        "queue_controller": {
            "running": false, "paused": false, "stopped": false,
            "total_codes": 0, "updated_count": 0, "current_code": null
        },
        "recent_updates": [
            {"code": "000001", "name": "平安银行", "last_updated_date": "2024-05-01"},
            {"code": "000002", "name": "万科A", "last_updated_date": "2024-05-01"}
        ]
    })
}

#[tokio::test]
async fn status_payload_maps_onto_report() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATUS))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_status()))
        .mount(&server)
        .await;

    let report = fetch_status(backend(&server, Duration::from_secs(2)).as_ref())
        .await
        .expect("status ok");

    assert!(report.connection.connected);
    assert_eq!(report.connection.host.as_deref(), Some("db.internal"));
    assert_eq!(report.connection.port.as_deref(), Some("8812"));
    assert_eq!(report.connection.database.as_deref(), Some("qdb"));
    assert_eq!(report.summary.finance_count, 48000);
    assert_eq!(report.summary.latest_follow_time, None);
    assert!(report.full.running);
    assert_eq!(report.full.total_count, 5321);
    assert_eq!(report.full.updated_count, 1200);
    assert_eq!(report.full.current_item.as_deref(), Some("600519"));
    assert_eq!(report.full.recent_items, vec!["000001", "000002"]);
    assert_eq!(report.full.percent(), 23);
    assert!(!report.queue.running);
    assert_eq!(report.queue.current_item, None);
}

#[tokio::test]
async fn empty_object_yields_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATUS))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;

    let report = fetch_status(backend(&server, Duration::from_secs(2)).as_ref())
        .await
        .expect("status ok");
    assert!(!report.connection.connected);
    assert_eq!(report.full.total_count, 0);
    assert_eq!(report.full.percent(), 0);
}

#[tokio::test]
async fn error_status_and_garbage_are_classified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATUS))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(serde_json::json!({"detail": "boom"})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(STATUS))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;
    let backend = backend(&server, Duration::from_secs(2));

    let err = fetch_status(backend.as_ref()).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Refused(Refusal::Rejected { status: 500 }));
    assert_eq!(err.message, "boom");

    let err = fetch_status(backend.as_ref()).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Decode);
}

#[tokio::test]
async fn array_body_is_rejected_without_resetting_progress() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATUS))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_status()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(STATUS))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&server)
        .await;
    let backend = backend(&server, Duration::from_secs(2));

    let loaded = fetch_status(backend.as_ref()).await;
    assert!(loaded.is_ok());
    let (state, _) = update(
        AppState::new(),
        Msg::StatusReceived {
            family: PollFamily::Progress,
            seq: 1,
            result: loaded,
        },
    );
    let before = state.view();

    let malformed = fetch_status(backend.as_ref()).await;
    assert_eq!(malformed.as_ref().err().map(|err| err.kind), Some(FailureKind::Decode));
    let (state, _) = update(
        state,
        Msg::StatusReceived {
            family: PollFamily::Progress,
            seq: 2,
            result: malformed,
        },
    );

    let after = state.view();
    assert_eq!(after.full, before.full);
    assert_eq!(after.queue, before.queue);
    assert_eq!(state.consecutive_poll_failures(), 1);
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATUS))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(sample_status())
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let err = fetch_status(backend(&server, Duration::from_millis(100)).as_ref())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn poller_emits_sequenced_events_until_cancelled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATUS))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_status()))
        .mount(&server)
        .await;

    let sink = Arc::new(TestSink::default());
    let poller = StatusPoller::new(
        backend(&server, Duration::from_secs(2)),
        Sequencer::new(),
        sink.clone(),
    );
    let handle = poller.spawn(
        PollFamily::Progress,
        PollSchedule::Every(Duration::from_millis(40)),
        &tokio::runtime::Handle::current(),
    );

    tokio::time::sleep(Duration::from_millis(250)).await;
    handle.cancel();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let events = sink.take();
    assert!(events.len() >= 2, "expected several polls, got {}", events.len());

    let seqs: Vec<u64> = events
        .iter()
        .map(|event| match event {
            EngineEvent::Status {
                family: PollFamily::Progress,
                seq,
                result: Ok(_),
            } => *seq,
            other => panic!("unexpected event {other:?}"),
        })
        .collect();
    assert!(seqs.windows(2).all(|pair| pair[0] < pair[1]));

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(sink.take().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn ticks_are_skipped_while_a_poll_is_outstanding() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATUS))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(sample_status())
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let sink = Arc::new(TestSink::default());
    let poller = StatusPoller::new(
        backend(&server, Duration::from_secs(2)),
        Sequencer::new(),
        sink.clone(),
    );
    let handle = poller.spawn(
        PollFamily::Progress,
        PollSchedule::Every(Duration::from_millis(30)),
        &tokio::runtime::Handle::current(),
    );

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(handle.is_in_flight());
    let received = server.received_requests().await.unwrap_or_default();
    assert_eq!(received.len(), 1);
    drop(handle);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn on_demand_poller_waits_for_trigger() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATUS))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let sink = Arc::new(TestSink::default());
    let poller = StatusPoller::new(
        backend(&server, Duration::from_secs(2)),
        Sequencer::new(),
        sink.clone(),
    );
    let handle = poller.spawn(
        PollFamily::Summary,
        PollSchedule::OnDemand,
        &tokio::runtime::Handle::current(),
    );

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(sink.take().is_empty());

    handle.poll_now();
    tokio::time::sleep(Duration::from_millis(200)).await;
    let events = sink.take();
    assert_eq!(events.len(), 1);
    match &events[0] {
        EngineEvent::Status {
            family: PollFamily::Summary,
            result: Err(err),
            ..
        } => {
            assert_eq!(err.kind, FailureKind::Refused(Refusal::Rejected { status: 503 }));
            assert_eq!(err.message, "HTTP 503");
        }
        other => panic!("unexpected event {other:?}"),
    }
}
