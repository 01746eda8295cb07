use std::time::Duration;

use updctl_core::{FailureKind, RequestError};
use url::Url;

use crate::EngineError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api/stocks";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Prefix all endpoint paths are appended to.
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Per-request deadline. Defaults to the progress poll interval.
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(3),
        }
    }
}

/// Status code and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport seam between the clients and the network.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn get(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<RawResponse, RequestError>;

    async fn post(&self, path: &str) -> Result<RawResponse, RequestError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    base: Url,
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: &ClientSettings) -> Result<Self, EngineError> {
        let invalid = |message: String| EngineError::InvalidBaseUrl {
            url: settings.base_url.clone(),
            message,
        };
        let base = Url::parse(settings.base_url.trim()).map_err(|err| invalid(err.to_string()))?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(invalid("expected an http or https url".to_string()));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| EngineError::Client(err.to_string()))?;

        Ok(Self { base, client })
    }

    pub fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        let joined = format!(
            "{}/{}",
            self.base.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        url.set_path(&joined);
        url
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<RawResponse, RequestError> {
        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    async fn get(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<RawResponse, RequestError> {
        let mut url = self.endpoint(path);
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(key, value)| (*key, value.as_str())));
        }
        self.send(self.client.get(url)).await
    }

    async fn post(&self, path: &str) -> Result<RawResponse, RequestError> {
        self.send(self.client.post(self.endpoint(path))).await
    }
}

fn map_reqwest_error(err: reqwest::Error) -> RequestError {
    let kind = if err.is_timeout() {
        FailureKind::Timeout
    } else if err.is_decode() {
        FailureKind::Decode
    } else {
        FailureKind::Network
    };
    RequestError::new(kind, err.to_string())
}
