use crate::config::ClientConfig;
use crate::error::{ApiError, ErrorCode};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::future::Future;
use tracing::{debug, info, warn};

const CORRELATION_HEADER: &str = "x-correlation-id";

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    pub fn new(session_id: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            session_id: session_id.into(),
            messages,
        }
    }

    /// Roles are closed by [`ChatRole`], so only emptiness is checked here
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.session_id.trim().is_empty() {
            return Err(ApiError::validation("Session ID is required"));
        }
        if self.messages.is_empty() {
            return Err(ApiError::validation("At least one message is required"));
        }
        if let Some(index) = self
            .messages
            .iter()
            .position(|m| m.content.trim().is_empty())
        {
            return Err(ApiError::validation(format!(
                "Message {} has empty content",
                index + 1
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub output_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

/// Body of `GET {base}/health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: f64,
    /// Service-specific fields such as `langflow_client_ready`
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl HealthStatus {
    /// Every `*_ready` flag set, or a "healthy" status when there are none
    pub fn is_ready(&self) -> bool {
        let flags: Vec<bool> = self
            .extra
            .iter()
            .filter(|(key, _)| key.ends_with("_ready"))
            .map(|(_, value)| value.as_bool().unwrap_or(false))
            .collect();

        if flags.is_empty() {
            self.status == "healthy"
        } else {
            flags.into_iter().all(|ready| ready)
        }
    }
}

#[derive(Deserialize)]
struct ErrorDetail {
    detail: String,
    code: String,
    #[serde(default)]
    correlation_id: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ServerErrorBody {
    Direct { error: ErrorDetail },
    Wrapped { detail: ErrorEnvelope },
    Plain { detail: String },
}

fn error_from_body(
    status: StatusCode,
    body: &str,
    header_correlation_id: Option<String>,
) -> ApiError {
    let code = status.as_u16();
    let error = match serde_json::from_str::<ServerErrorBody>(body) {
        Ok(ServerErrorBody::Direct { error })
        | Ok(ServerErrorBody::Wrapped {
            detail: ErrorEnvelope { error },
        }) => ApiError::from_server(code, error.detail, &error.code, error.correlation_id),
        Ok(ServerErrorBody::Plain { detail }) => ApiError::new(detail, code, ErrorCode::Http),
        Err(_) => ApiError::http_status(code, status.canonical_reason().unwrap_or("")),
    };
    error.with_correlation_id(header_correlation_id)
}

fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_builder() {
        ApiError::unknown(format!("Could not build request: {}", err), 0)
    } else {
        ApiError::network(format!("Network error: {}", err))
    }
}

fn correlation_id(response: &Response) -> Option<String> {
    response
        .headers()
        .get(CORRELATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let correlation_id = correlation_id(&response);

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(error_from_body(status, &body, correlation_id));
    }

    let body = response.text().await.map_err(|e| {
        ApiError::unknown(format!("Failed to read response: {}", e), status.as_u16())
            .with_correlation_id(correlation_id.clone())
    })?;

    serde_json::from_str(&body).map_err(|e| {
        ApiError::unknown(format!("Invalid response body: {}", e), status.as_u16())
            .with_correlation_id(correlation_id)
    })
}

/// Chat agent client holding the single retry slot.
///
/// `send_message` and `retry` borrow the client mutably, so one client never
/// has two calls outstanding.
pub struct ChatClient {
    client: Client,
    config: ClientConfig,
    last_request: Option<ChatRequest>,
}

impl ChatClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            last_request: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// The request a [`retry`](Self::retry) would replay
    pub fn last_request(&self) -> Option<&ChatRequest> {
        self.last_request.as_ref()
    }

    pub fn has_pending_retry(&self) -> bool {
        self.last_request.is_some()
    }

    pub async fn send_message(&mut self, request: ChatRequest) -> Result<ChatResponse, ApiError> {
        if let Err(err) = request.validate() {
            debug!(error = %err, "rejecting chat request before sending");
            return Err(err);
        }

        self.last_request = Some(request.clone());

        info!(
            session_id = %request.session_id,
            message_count = request.messages.len(),
            "sending chat request"
        );

        let url = format!("{}/agent", self.config.base_url);
        let exchange = async {
            let response = self
                .client
                .post(&url)
                .header(CONTENT_TYPE, "application/json")
                .json(&request)
                .send()
                .await
                .map_err(transport_error)?;
            read_json::<ChatResponse>(response).await
        };

        let outcome = self.with_deadline(exchange).await;
        match outcome {
            Ok(response) => {
                info!(
                    session_id = %request.session_id,
                    response_length = response.output_text.len(),
                    "chat request succeeded"
                );
                self.last_request = None;
                Ok(response)
            }
            Err(err) => {
                warn!(
                    session_id = %request.session_id,
                    status = err.status,
                    code = %err.code,
                    correlation_id = err.correlation_id.as_deref().unwrap_or("-"),
                    "chat request failed: {}",
                    err
                );
                Err(err)
            }
        }
    }

    /// Replay the last unsuccessful request unchanged
    pub async fn retry(&mut self) -> Option<Result<ChatResponse, ApiError>> {
        let request = self.last_request.clone()?;
        info!(session_id = %request.session_id, "retrying last chat request");
        Some(self.send_message(request).await)
    }

    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        let url = format!("{}/health", self.config.base_url);
        let exchange = async {
            let response = self.client.get(&url).send().await.map_err(transport_error)?;
            read_json::<HealthStatus>(response).await
        };
        self.with_deadline(exchange).await
    }

    // Dropping the exchange future on expiry aborts the request
    async fn with_deadline<T>(
        &self,
        exchange: impl Future<Output = Result<T, ApiError>>,
    ) -> Result<T, ApiError> {
        let timeout = self.config.timeout;
        match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::timeout(timeout.as_millis())),
        }
    }
}
