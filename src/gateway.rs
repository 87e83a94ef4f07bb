//! HTTP gateway for the Mentor backend API.
//!
//! Thin wrapper over one `reqwest::Client` issuing the fixed request set
//! the UI needs. Failures are classified, never retried and never queued;
//! callers decide what (if anything) to tell the user.

use std::time::Duration;

use tracing::warn;

use crate::api::{
    AgentConfig, AgentsResponse, ApiKeyRequest, ChatRequest, ChatResponse, ErrorBody,
    RetrieverResponse,
};
use crate::progress::ProgressSnapshot;

/// Errors that can occur while talking to the backend.
///
/// One variant per taxonomy class: the transport could not be reached, the
/// server answered outside 2xx, or the body did not parse as the expected
/// shape.
#[derive(Debug)]
pub enum GatewayError {
    /// A TCP-level connection could not be established.
    Connect { url: String, detail: String },
    /// The server replied with a non-2xx HTTP status code. `detail` carries
    /// the backend-provided message when the body had one.
    Http {
        status: u16,
        url: String,
        detail: Option<String>,
    },
    /// Response body could not be parsed as the expected JSON structure.
    Json { url: String, detail: String },
}

impl GatewayError {
    /// Backend-provided detail for a non-2xx reply, when present.
    pub fn detail(&self) -> Option<&str> {
        match self {
            GatewayError::Http { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// HTTP status code, for Http failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayError::Connect { url, detail } => {
                write!(f, "Connection failed to {url}: {detail}")
            }
            GatewayError::Http { status, url, detail } => match detail {
                Some(d) => write!(f, "HTTP {status} from {url}: {d}"),
                None => write!(f, "HTTP {status} from {url}"),
            },
            GatewayError::Json { url, detail } => {
                write!(f, "JSON parse error from {url}: {detail}")
            }
        }
    }
}

impl std::error::Error for GatewayError {}

/// Configuration for the gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the backend (e.g. `http://127.0.0.1:8000`).
    pub base_url: String,
    /// TCP connection timeout.
    pub connect_timeout: Duration,
    /// Per-request read timeout.
    pub request_timeout: Duration,
}

impl GatewayConfig {
    /// Create a config with sensible defaults.
    ///
    /// - connect_timeout: 3 s
    /// - request_timeout: 10 s
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            connect_timeout: Duration::from_secs(3),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// The gateway. Use [`ApiGatewayBuilder`] for construction.
pub struct ApiGateway {
    config: GatewayConfig,
    client: reqwest::Client,
}

impl ApiGateway {
    /// Start building a gateway aimed at `base_url`.
    pub fn builder(base_url: impl Into<String>) -> ApiGatewayBuilder {
        ApiGatewayBuilder::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// `POST /api/chat`: one send cycle's request.
    pub async fn send_chat(&self, request: &ChatRequest) -> Result<ChatResponse, GatewayError> {
        let url = format!("{}/api/chat", self.config.base_url);
        let resp = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| connect_error(&url, e))?;
        self.parse_json(url, resp).await
    }

    /// `GET /api/progress?sessionId=&agentId=`: full snapshot refresh.
    pub async fn fetch_progress(
        &self,
        session_id: &str,
        agent_id: &str,
    ) -> Result<ProgressSnapshot, GatewayError> {
        let url = format!("{}/api/progress", self.config.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("sessionId", session_id), ("agentId", agent_id)])
            .send()
            .await
            .map_err(|e| connect_error(&url, e))?;
        self.parse_json(url, resp).await
    }

    /// `GET /api/agents`: all agent configurations.
    pub async fn fetch_agents(&self) -> Result<AgentsResponse, GatewayError> {
        let url = format!("{}/api/agents", self.config.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| connect_error(&url, e))?;
        self.parse_json(url, resp).await
    }

    /// `POST /api/agents/config`: write one agent configuration back.
    pub async fn save_agent_config(&self, config: &AgentConfig) -> Result<(), GatewayError> {
        let url = format!("{}/api/agents/config", self.config.base_url);
        let resp = self
            .client
            .post(&url)
            .json(config)
            .send()
            .await
            .map_err(|e| connect_error(&url, e))?;
        self.check_status(url, resp).await.map(|_| ())
    }

    /// `POST /api/config/api-key`: save the backend API key.
    pub async fn save_api_key(&self, request: &ApiKeyRequest) -> Result<(), GatewayError> {
        let url = format!("{}/api/config/api-key", self.config.base_url);
        let resp = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| connect_error(&url, e))?;
        self.check_status(url, resp).await.map(|_| ())
    }

    /// `GET /api/debug/retriever?q=&k=`: retrieval debug query.
    pub async fn query_retriever(
        &self,
        query: &str,
        k: u32,
    ) -> Result<RetrieverResponse, GatewayError> {
        let url = format!("{}/api/debug/retriever", self.config.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("q", query), ("k", &k.to_string())])
            .send()
            .await
            .map_err(|e| connect_error(&url, e))?;
        self.parse_json(url, resp).await
    }

    /// `GET /health`: liveness probe. Ok on any 2xx.
    pub async fn health(&self) -> Result<(), GatewayError> {
        let url = format!("{}/health", self.config.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| connect_error(&url, e))?;
        self.check_status(url, resp).await.map(|_| ())
    }

    /// Classify a non-2xx response, pulling the backend `detail` out of the
    /// body when it parses.
    async fn check_status(
        &self,
        url: String,
        resp: reqwest::Response,
    ) -> Result<reqwest::Response, GatewayError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let detail = resp
            .bytes()
            .await
            .ok()
            .and_then(|bytes| serde_json::from_slice::<ErrorBody>(&bytes).ok())
            .and_then(|body| body.detail);
        warn!(status = status.as_u16(), url = %url, "backend request rejected");
        Err(GatewayError::Http {
            status: status.as_u16(),
            url,
            detail,
        })
    }

    async fn parse_json<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        resp: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let resp = self.check_status(url.clone(), resp).await?;
        let bytes = resp.bytes().await.map_err(|e| GatewayError::Json {
            url: url.clone(),
            detail: e.to_string(),
        })?;
        serde_json::from_slice::<T>(&bytes).map_err(|e| GatewayError::Json {
            url,
            detail: e.to_string(),
        })
    }
}

fn connect_error(url: &str, err: reqwest::Error) -> GatewayError {
    GatewayError::Connect {
        url: url.to_string(),
        detail: err.to_string(),
    }
}

/// Builder for [`ApiGateway`].
pub struct ApiGatewayBuilder {
    config: GatewayConfig,
}

impl ApiGatewayBuilder {
    /// Create a builder targeting `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            config: GatewayConfig::new(base_url),
        }
    }

    /// Override the TCP connect timeout (default 3 s).
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Override the per-request read timeout (default 10 s).
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Consume the builder and construct an [`ApiGateway`].
    pub fn build(self) -> ApiGateway {
        // reqwest::Client::builder() can fail in extreme environments;
        // unwrap_or_default() falls back to a default client instead of
        // panicking.
        let client = reqwest::Client::builder()
            .connect_timeout(self.config.connect_timeout)
            .timeout(self.config.request_timeout)
            .build()
            .unwrap_or_default();
        ApiGateway {
            config: self.config,
            client,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    // -----------------------------------------------------------------------
    // Builder / config
    // -----------------------------------------------------------------------

    #[test]
    fn test_config_new_defaults() {
        let cfg = GatewayConfig::new("http://localhost:8000");
        assert_eq!(cfg.base_url, "http://localhost:8000");
        assert_eq!(cfg.connect_timeout, Duration::from_secs(3));
        assert_eq!(cfg.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_builder_default_config() {
        let gw = ApiGateway::builder("http://localhost:8000").build();
        assert_eq!(gw.config.connect_timeout, Duration::from_secs(3));
        assert_eq!(gw.config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_builder_overrides() {
        let gw = ApiGateway::builder("http://127.0.0.1:9000")
            .connect_timeout(Duration::from_secs(1))
            .request_timeout(Duration::from_secs(5))
            .build();
        assert_eq!(gw.base_url(), "http://127.0.0.1:9000");
        assert_eq!(gw.config.connect_timeout, Duration::from_secs(1));
        assert_eq!(gw.config.request_timeout, Duration::from_secs(5));
    }

    // -----------------------------------------------------------------------
    // GatewayError Display / accessors
    // -----------------------------------------------------------------------

    #[test]
    fn test_error_display_connect() {
        let err = GatewayError::Connect {
            url: "http://localhost:8000/api/chat".to_string(),
            detail: "connection refused".to_string(),
        };
        let s = err.to_string();
        assert!(s.contains("http://localhost:8000/api/chat"), "url in display: {s}");
        assert!(s.contains("connection refused"), "detail in display: {s}");
    }

    #[test]
    fn test_error_display_http_without_detail() {
        let err = GatewayError::Http {
            status: 500,
            url: "http://localhost:8000/api/chat".to_string(),
            detail: None,
        };
        let s = err.to_string();
        assert!(s.contains("500"), "status in display: {s}");
        assert!(!s.ends_with(": "), "no dangling detail separator: {s}");
    }

    #[test]
    fn test_error_display_http_with_detail() {
        let err = GatewayError::Http {
            status: 500,
            url: "http://x".to_string(),
            detail: Some("OPENAI_API_KEY não definido".to_string()),
        };
        assert!(err.to_string().contains("OPENAI_API_KEY não definido"));
    }

    #[test]
    fn test_error_display_json() {
        let err = GatewayError::Json {
            url: "http://x/api/progress".to_string(),
            detail: "missing field `xp`".to_string(),
        };
        let s = err.to_string();
        assert!(s.contains("missing field"), "detail in display: {s}");
    }

    #[test]
    fn test_error_detail_accessor() {
        let err = GatewayError::Http {
            status: 422,
            url: "http://x".to_string(),
            detail: Some("temperatura inválida".to_string()),
        };
        assert_eq!(err.detail(), Some("temperatura inválida"));
        assert_eq!(err.status(), Some(422));

        let err = GatewayError::Connect {
            url: "http://x".to_string(),
            detail: "refused".to_string(),
        };
        assert!(err.detail().is_none());
        assert!(err.status().is_none());
    }

    #[test]
    fn test_error_is_std_error() {
        fn assert_error<E: std::error::Error>(_: &E) {}
        let err = GatewayError::Http {
            status: 500,
            url: "x".to_string(),
            detail: None,
        };
        assert_error(&err);
    }
}
