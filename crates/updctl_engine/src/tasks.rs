use std::sync::Arc;

use engine_logging::{engine_debug, engine_warn};
use updctl_core::{Refusal, RequestError, TaskPage, TaskQuery};

use crate::client::Backend;
use crate::wire;

pub const TASKS_PATH: &str = "/tasks";

/// Query string for a task listing. Empty filters are omitted.
pub fn task_query_pairs(query: &TaskQuery) -> Vec<(&'static str, String)> {
    let filter = query.filter.clone().normalized();
    let mut pairs = vec![
        ("page", query.page.max(1).to_string()),
        ("page_size", query.page_size.to_string()),
    ];
    for (key, value) in [
        ("task_type", filter.task_type),
        ("status", filter.status),
        ("param_contains", filter.param_contains),
    ] {
        if !value.is_empty() {
            pairs.push((key, value));
        }
    }
    pairs
}

#[derive(Clone)]
pub struct TaskQueryClient {
    backend: Arc<dyn Backend>,
}

impl TaskQueryClient {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub async fn fetch(&self, query: &TaskQuery) -> Result<TaskPage, RequestError> {
        let pairs = task_query_pairs(query);
        engine_debug!("fetching tasks {pairs:?}");
        let response = self.backend.get(TASKS_PATH, &pairs).await?;
        if !response.is_success() {
            let message = wire::refusal_message(&response.body, response.status);
            engine_warn!("task listing refused ({}): {message}", response.status);
            return Err(RequestError::refused(
                Refusal::Rejected {
                    status: response.status,
                },
                message,
            ));
        }
        wire::decode_task_page(&response.body, query)
    }
}
