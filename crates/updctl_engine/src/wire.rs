//! Response payloads and their mapping onto core types.
//!
//! Every field is optional on the wire. Numbers may arrive as strings, text
//! fields may arrive as numbers, and nulls mean "absent".

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use updctl_core::{
    ConnectionInfo, DataSummary, FailureKind, JobSnapshot, RequestError, StartAck, StatusReport,
    TaskPage, TaskQuery, TaskRecord,
};

/// Decodes a response body. Only a JSON object is accepted at the top level.
pub(crate) fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, RequestError> {
    match serde_json::from_slice::<Value>(body).map_err(decode_error)? {
        object @ Value::Object(_) => serde_json::from_value(object).map_err(decode_error),
        other => Err(RequestError::new(
            FailureKind::Decode,
            format!("expected a JSON object, got {}", json_kind(&other)),
        )),
    }
}

fn decode_error(err: serde_json::Error) -> RequestError {
    RequestError::new(FailureKind::Decode, err.to_string())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(as_integer)
        .map(|value| value.max(0) as u64))
}

fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(flag)) => flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(text)) => !text.is_empty(),
        _ => false,
    })
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_u64().map(|n| i64::try_from(n).unwrap_or(i64::MAX)))
            .or_else(|| number.as_f64().map(|n| n as i64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StatusPayload {
    questdb: Option<ConnectionPayload>,
    #[serde(deserialize_with = "lenient_count")]
    stock_basic_count: Option<u64>,
    #[serde(deserialize_with = "lenient_count")]
    finance_count: Option<u64>,
    #[serde(deserialize_with = "lenient_string")]
    latest_finance_date: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    latest_follow_time: Option<String>,
    #[serde(deserialize_with = "lenient_count")]
    total_codes: Option<u64>,
    #[serde(deserialize_with = "lenient_count")]
    updated_count: Option<u64>,
    controller: Option<ControllerPayload>,
    queue_controller: Option<ControllerPayload>,
    recent_updates: Option<Vec<RecentPayload>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConnectionPayload {
    #[serde(deserialize_with = "lenient_flag")]
    connected: bool,
    #[serde(deserialize_with = "lenient_string")]
    host: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    port: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    user: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    dbname: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ControllerPayload {
    #[serde(deserialize_with = "lenient_flag")]
    running: bool,
    #[serde(deserialize_with = "lenient_flag")]
    paused: bool,
    #[serde(deserialize_with = "lenient_flag")]
    stopped: bool,
    #[serde(deserialize_with = "lenient_count")]
    total_codes: Option<u64>,
    #[serde(deserialize_with = "lenient_count")]
    updated_count: Option<u64>,
    #[serde(deserialize_with = "lenient_string")]
    current_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RecentPayload {
    #[serde(deserialize_with = "lenient_string")]
    code: Option<String>,
}

impl ControllerPayload {
    /// `fallback` supplies counts the controller omitted.
    fn into_snapshot(self, fallback: (Option<u64>, Option<u64>)) -> JobSnapshot {
        JobSnapshot {
            running: self.running,
            paused: self.paused,
            stopped: self.stopped,
            total_count: self.total_codes.or(fallback.0).unwrap_or(0),
            updated_count: self.updated_count.or(fallback.1).unwrap_or(0),
            current_item: non_empty(self.current_code),
            recent_items: Vec::new(),
        }
    }
}

pub(crate) fn decode_status(body: &[u8]) -> Result<StatusReport, RequestError> {
    let payload: StatusPayload = decode(body)?;
    let connection = payload.questdb.unwrap_or_default();

    let mut full = payload
        .controller
        .unwrap_or_default()
        .into_snapshot((payload.total_codes, payload.updated_count));
    full.recent_items = payload
        .recent_updates
        .unwrap_or_default()
        .into_iter()
        .filter_map(|recent| non_empty(recent.code))
        .collect();
    let queue = payload
        .queue_controller
        .unwrap_or_default()
        .into_snapshot((None, None));

    Ok(StatusReport {
        connection: ConnectionInfo {
            connected: connection.connected,
            host: non_empty(connection.host),
            port: non_empty(connection.port),
            user: non_empty(connection.user),
            database: non_empty(connection.dbname),
            error: non_empty(connection.error),
        },
        summary: DataSummary {
            stock_basic_count: payload.stock_basic_count.unwrap_or(0),
            finance_count: payload.finance_count.unwrap_or(0),
            latest_finance_date: non_empty(payload.latest_finance_date),
            latest_follow_time: non_empty(payload.latest_follow_time),
        },
        full,
        queue,
    })
}

/// `{error}` / `{detail}` carried by refusals of any endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorPayload {
    #[serde(deserialize_with = "lenient_string")]
    error: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    detail: Option<String>,
}

impl ErrorPayload {
    fn message(self) -> Option<String> {
        non_empty(self.error).or_else(|| non_empty(self.detail))
    }
}

/// The `error` or `detail` text a body carries, if any.
pub(crate) fn carried_refusal(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorPayload>(body)
        .ok()
        .and_then(ErrorPayload::message)
}

/// Refusal text for a response: `error`, then `detail`, then the status.
pub(crate) fn refusal_message(body: &[u8], status: u16) -> String {
    carried_refusal(body).unwrap_or_else(|| format!("HTTP {status}"))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct StartPayload {
    pub started: Option<bool>,
    #[serde(deserialize_with = "lenient_string")]
    started_at: Option<String>,
    #[serde(deserialize_with = "lenient_count")]
    total_codes: Option<u64>,
}

impl StartPayload {
    pub(crate) fn ack(self) -> StartAck {
        StartAck {
            started_at: non_empty(self.started_at),
            total_count: self.total_codes,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct PausePayload {
    pub running: Option<bool>,
    pub paused: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TaskPagePayload {
    items: Option<Vec<TaskItemPayload>>,
    #[serde(deserialize_with = "lenient_count")]
    total: Option<u64>,
    #[serde(deserialize_with = "lenient_count")]
    page: Option<u64>,
    #[serde(deserialize_with = "lenient_count")]
    page_size: Option<u64>,
    #[serde(deserialize_with = "lenient_count")]
    total_pages: Option<u64>,
    has_prev: Option<bool>,
    has_next: Option<bool>,
    options: Option<TaskOptionsPayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TaskItemPayload {
    #[serde(deserialize_with = "lenient_string")]
    task_type: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    task_desc: Option<String>,
    task_params: Option<Value>,
    #[serde(deserialize_with = "lenient_string")]
    status: Option<String>,
    priority: Option<Value>,
    #[serde(deserialize_with = "lenient_string")]
    created_at: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    started_at: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    ended_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TaskOptionsPayload {
    types: Option<Vec<Value>>,
}

impl TaskItemPayload {
    fn into_record(self) -> TaskRecord {
        TaskRecord {
            task_type: non_empty(self.task_type),
            description: non_empty(self.task_desc),
            params: self.task_params.and_then(params_text),
            status: non_empty(self.status),
            priority: self.priority.as_ref().and_then(as_integer).unwrap_or(0),
            created_at: non_empty(self.created_at),
            started_at: non_empty(self.started_at),
            ended_at: non_empty(self.ended_at),
        }
    }
}

/// Structured params render as compact JSON, text params verbatim.
fn params_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => non_empty(Some(text)),
        other => Some(other.to_string()),
    }
}

fn clamp_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Decodes a task page, filling gaps from the query that produced it.
pub(crate) fn decode_task_page(body: &[u8], query: &TaskQuery) -> Result<TaskPage, RequestError> {
    let payload: TaskPagePayload = decode(body)?;
    let items: Vec<TaskRecord> = payload
        .items
        .unwrap_or_default()
        .into_iter()
        .map(TaskItemPayload::into_record)
        .collect();
    let total = payload.total.unwrap_or(items.len() as u64);
    let page = payload.page.map(clamp_u32).unwrap_or(query.page).max(1);
    let page_size = payload
        .page_size
        .map(clamp_u32)
        .filter(|size| *size > 0)
        .unwrap_or(query.page_size)
        .max(1);
    let total_pages = payload
        .total_pages
        .map(clamp_u32)
        .unwrap_or_else(|| clamp_u32(total.div_ceil(u64::from(page_size))))
        .max(1);
    let type_options = payload
        .options
        .and_then(|options| options.types)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|value| match value {
            Value::String(text) => non_empty(Some(text)),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .collect();

    Ok(TaskPage {
        items,
        total,
        page,
        page_size,
        total_pages,
        has_prev: payload.has_prev,
        has_next: payload.has_next,
        type_options,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use updctl_core::TaskFilter;

    #[test]
    fn full_job_falls_back_to_top_level_counts() {
        let body = br#"{
            "total_codes": 5000,
            "updated_count": "120",
            "controller": {"running": true, "paused": false, "updated_count": 130}
        }"#;
        let report = decode_status(body).expect("decodes");
        assert_eq!(report.full.total_count, 5000);
        assert_eq!(report.full.updated_count, 130);
        assert_eq!(report.queue, JobSnapshot::default());
    }

    #[test]
    fn negative_and_textual_values_are_tolerated() {
        let body = br#"{
            "stock_basic_count": -4,
            "latest_finance_date": 20240331,
            "questdb": {"connected": true, "port": 8812, "host": ""}
        }"#;
        let report = decode_status(body).expect("decodes");
        assert_eq!(report.summary.stock_basic_count, 0);
        assert_eq!(report.summary.latest_finance_date.as_deref(), Some("20240331"));
        assert_eq!(report.connection.port.as_deref(), Some("8812"));
        assert_eq!(report.connection.host, None);
    }

    #[test]
    fn non_object_body_is_a_decode_failure() {
        let err = decode_status(b"<html>502 Bad Gateway</html>").unwrap_err();
        assert_eq!(err.kind, FailureKind::Decode);
    }

    #[test]
    fn json_array_or_scalar_is_not_a_status_report() {
        for body in ["[]", "null", "42", r#""ok""#] {
            let err = decode_status(body.as_bytes()).unwrap_err();
            assert_eq!(err.kind, FailureKind::Decode, "body {body}");
        }
        let err = decode_status(b"[1, 2]").unwrap_err();
        assert_eq!(err.message, "expected a JSON object, got an array");
    }

    #[test]
    fn refusal_message_prefers_error_over_detail() {
        assert_eq!(
            refusal_message(br#"{"error": "", "detail": "Not found."}"#, 404),
            "Not found."
        );
        assert_eq!(
            refusal_message(r#"{"error": "QuestDB 连接失败", "detail": "x"}"#.as_bytes(), 503),
            "QuestDB 连接失败"
        );
        assert_eq!(refusal_message(b"gateway down", 502), "HTTP 502");
    }

    #[test]
    fn task_params_render_compactly() {
        let body = br#"{
            "items": [
                {"task_type": "finance", "task_params": {"code": "000001", "year": 2024}, "priority": "3"},
                {"task_type": "daily", "task_params": null}
            ]
        }"#;
        let query = TaskQuery::new(TaskFilter::default(), 2);
        let page = decode_task_page(body, &query).expect("decodes");
        assert_eq!(
            page.items[0].params.as_deref(),
            Some(r#"{"code":"000001","year":2024}"#)
        );
        assert_eq!(page.items[0].priority, 3);
        assert_eq!(page.items[1].params, None);
        assert_eq!(page.items[1].priority, 0);
        assert_eq!(page.page, 2);
        assert_eq!(page.page_size, 50);
        assert_eq!(page.total, 2);
        assert_eq!(page.total_pages, 1);
    }
}
