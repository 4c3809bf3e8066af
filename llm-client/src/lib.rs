//! Minimal OpenAI-compatible chat completions client.
//!
//! This crate provides a focused client for any endpoint that speaks the
//! `/chat/completions` protocol, with:
//! - Non-streaming and streaming completions
//! - Buffered SSE parsing for streaming responses
//! - Explicit configuration (no ambient globals)

use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;
use tokio_stream::Stream;

/// Model used when the configuration does not name one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Environment variable holding the endpoint base URL.
pub const ENV_BASE_URL: &str = "LLM_BASE_URL";
/// Environment variable holding the bearer token.
pub const ENV_API_KEY: &str = "LLM_API_KEY";
/// Environment variable holding the model name.
pub const ENV_MODEL: &str = "LLM_MODEL";

/// Errors that can occur when using the client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("No model endpoint configured")]
    NoEndpoint,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Stream error: {0}")]
    Stream(String),
}

/// A boxed stream of raw streaming events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, Error>> + Send>>;

/// A boxed stream of text fragments.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, Error>> + Send>>;

/// Connection settings for a chat completions endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelConfig {
    /// Base URL, e.g. `https://api.openai.com/v1`.
    pub base_url: String,

    /// Bearer token. Local endpoints often need none.
    pub api_key: Option<String>,

    /// Model name; `DEFAULT_MODEL` when unset.
    pub model: Option<String>,
}

impl ModelConfig {
    /// Create a config for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            model: None,
        }
    }

    /// Read `LLM_BASE_URL`, `LLM_API_KEY` and `LLM_MODEL` from the environment.
    pub fn from_env() -> Result<Self, Error> {
        let base_url = std::env::var(ENV_BASE_URL).map_err(|_| Error::NoEndpoint)?;
        let config = Self {
            base_url,
            api_key: std::env::var(ENV_API_KEY).ok().filter(|k| !k.is_empty()),
            model: std::env::var(ENV_MODEL).ok().filter(|m| !m.is_empty()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Whether an endpoint has been configured at all.
    pub fn is_configured(&self) -> bool {
        !self.base_url.trim().is_empty()
    }

    /// Check that the config can be used to build a client.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.is_configured() {
            return Err(Error::NoEndpoint);
        }
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(format!("base URL must be http(s): {url}")));
        }
        Ok(())
    }

    /// The chat completions URL for this endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim().trim_end_matches('/'))
    }

    /// The model to request.
    pub fn model_name(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Chat completions client.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    config: ModelConfig,
}

impl Client {
    /// Create a new client for a validated configuration.
    pub fn new(config: ModelConfig) -> Result<Self, Error> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Ok(Self { http, config })
    }

    /// Create a client from `LLM_*` environment variables.
    pub fn from_env() -> Result<Self, Error> {
        Self::new(ModelConfig::from_env()?)
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Send a completion request and return the full response.
    pub async fn complete(&self, request: Request) -> Result<Response, Error> {
        let api_request = self.build_api_request(&request, false);
        let headers = self.build_headers()?;

        let response = self
            .http
            .post(self.config.completions_url())
            .headers(headers)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        parse_response(api_response)
    }

    /// Send a completion request and stream the response events.
    pub async fn stream(&self, request: Request) -> Result<EventStream, Error> {
        let api_request = self.build_api_request(&request, true);
        let headers = self.build_headers()?;

        let response = self
            .http
            .post(self.config.completions_url())
            .headers(headers)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        // Buffer partial SSE lines across chunks
        let stream = response
            .bytes_stream()
            .scan(String::new(), |buffer, result| {
                let events = match result {
                    Ok(bytes) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));
                        parse_sse_events_buffered(buffer)
                    }
                    Err(e) => vec![Err(Error::Network(e.to_string()))],
                };
                futures::future::ready(Some(events))
            })
            .flat_map(futures::stream::iter);

        Ok(Box::pin(stream))
    }

    /// Stream only the text fragments of a response.
    ///
    /// Provider-reported errors inside the stream surface as `Error::Stream`.
    pub async fn stream_text(&self, request: Request) -> Result<TextStream, Error> {
        let events = self.stream(request).await?;
        let text = events.filter_map(|event| {
            futures::future::ready(match event {
                Ok(StreamEvent::TextDelta { text }) => Some(Ok(text)),
                Ok(StreamEvent::Error { message }) => Some(Err(Error::Stream(message))),
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            })
        });
        Ok(Box::pin(text))
    }

    fn build_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(ref key) = self.config.api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {key}"))
                    .map_err(|e| Error::Config(format!("Invalid API key: {e}")))?,
            );
        }
        Ok(headers)
    }

    fn build_api_request(&self, request: &Request, stream: bool) -> ApiRequest {
        let messages = request
            .messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect();

        ApiRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.config.model_name().to_string()),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream,
        }
    }
}

// ============================================================================
// Public types
// ============================================================================

/// A completion request.
#[derive(Debug, Clone)]
pub struct Request {
    pub model: Option<String>,
    pub max_tokens: Option<usize>,
    pub messages: Vec<Message>,
    pub temperature: Option<f32>,
}

impl Request {
    /// Create a new request with the given messages.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            model: None,
            max_tokens: None,
            messages,
            temperature: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: text.into(),
        }
    }

    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }
}

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A completion response.
#[derive(Debug, Clone)]
pub struct Response {
    pub id: String,
    pub model: String,
    pub text: String,
    pub finish_reason: FinishReason,
    pub usage: Option<Usage>,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Other,
}

impl FinishReason {
    fn parse(reason: &str) -> Self {
        match reason {
            "stop" => FinishReason::Stop,
            "length" => FinishReason::Length,
            "content_filter" => FinishReason::ContentFilter,
            _ => FinishReason::Other,
        }
    }
}

/// Token usage information.
#[derive(Debug, Clone)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

// ============================================================================
// Streaming types
// ============================================================================

/// Events from a streaming response.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    TextDelta { text: String },
    Finish { reason: FinishReason },
    Done,
    Error { message: String },
}

// ============================================================================
// Internal API types
// ============================================================================

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct ApiStreamChunk {
    #[serde(default)]
    choices: Vec<ApiStreamChoice>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiStreamChoice {
    #[serde(default)]
    delta: ApiDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

fn parse_response(api_response: ApiResponse) -> Result<Response, Error> {
    let choice = api_response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::Parse("No choices in response".to_string()))?;

    Ok(Response {
        id: api_response.id,
        model: api_response.model,
        text: choice.message.content.unwrap_or_default(),
        finish_reason: choice
            .finish_reason
            .as_deref()
            .map(FinishReason::parse)
            .unwrap_or(FinishReason::Stop),
        usage: api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
        }),
    })
}

/// Parse SSE events from a buffer, consuming complete lines and leaving
/// incomplete data for the next chunk.
fn parse_sse_events_buffered(buffer: &mut String) -> Vec<Result<StreamEvent, Error>> {
    let mut events = Vec::new();

    loop {
        let Some(newline_pos) = buffer.find('\n') else {
            break;
        };

        let line = buffer[..newline_pos].trim_end_matches('\r');

        if let Some(json_str) = line.strip_prefix("data:").map(str::trim_start) {
            if json_str == "[DONE]" {
                events.push(Ok(StreamEvent::Done));
            } else if !json_str.is_empty() {
                match serde_json::from_str::<ApiStreamChunk>(json_str) {
                    Ok(chunk) => events.extend(convert_stream_chunk(chunk).into_iter().map(Ok)),
                    Err(e) => {
                        // Complete but malformed: report it and drop the line
                        tracing::debug!(error = %e, "Skipping malformed SSE line");
                        events.push(Err(Error::Parse(format!("SSE parse error: {e}"))));
                    }
                }
            }
        }
        // event:, id:, comments and blank lines carry nothing we need

        buffer.drain(..=newline_pos);
    }

    events
}

fn convert_stream_chunk(chunk: ApiStreamChunk) -> Vec<StreamEvent> {
    if let Some(error) = chunk.error {
        return vec![StreamEvent::Error {
            message: error.message,
        }];
    }

    let mut events = Vec::new();
    for choice in chunk.choices {
        if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
            events.push(StreamEvent::TextDelta { text });
        }
        if let Some(reason) = choice.finish_reason {
            events.push(StreamEvent::Finish {
                reason: FinishReason::parse(&reason),
            });
        }
    }
    events
}
