//! OpenAI-compatible LLM Provider
//!
//! Implementation of `LlmProvider` over the `/chat/completions` endpoint with
//! function calling.

use std::str::FromStr;
use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::{Message, ToolCallRequest},
    provider::LlmProvider,
    tool::{Tool, ToolDefinition},
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Supported model aliases
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Model {
    Gpt35Turbo0125,
    #[default]
    Gpt4o,
    Gpt4oMini,
}

impl Model {
    /// Model id sent on the wire
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gpt35Turbo0125 => "gpt-3.5-turbo-0125",
            Self::Gpt4o => "gpt-4o",
            Self::Gpt4oMini => "gpt-4o-mini",
        }
    }
}

impl FromStr for Model {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "gpt-3.5-turbo-0125" => Ok(Self::Gpt35Turbo0125),
            "gpt-4o" => Ok(Self::Gpt4o),
            "gpt-4o-mini" => Ok(Self::Gpt4oMini),
            other => Err(AgentError::Config(format!("Unknown model alias: {other}"))),
        }
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OpenAI provider configuration
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    /// API root, without the `/chat/completions` suffix
    pub base_url: String,

    /// Bearer token
    pub api_key: String,

    pub model: Model,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Retries for rate limits and unavailable backends
    pub max_retries: u32,

    /// First retry delay; doubles on each attempt
    pub retry_backoff_ms: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: String::new(),
            model: Model::default(),
            timeout_secs: 120,
            max_retries: 2,
            retry_backoff_ms: 500,
        }
    }
}

impl OpenAiConfig {
    /// Read `OPENAI_API_KEY` (required), `OPENAI_BASE_URL`, `OPENAI_MODEL`
    /// and `OPENAI_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPENAI_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AgentError::Config("OPENAI_API_KEY is not set".into()))?;

        let mut config = Self {
            api_key,
            ..Self::default()
        };
        if let Some(base_url) = lookup("OPENAI_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(model) = lookup("OPENAI_MODEL") {
            config.model = model.parse()?;
        }
        if let Some(timeout) = lookup("OPENAI_TIMEOUT_SECS") {
            config.timeout_secs = timeout.trim().parse().map_err(|_| {
                AgentError::Config(format!("OPENAI_TIMEOUT_SECS is not a number: {timeout}"))
            })?;
        }

        Ok(config)
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'static str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [WireTool]>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunctionCall,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    /// JSON-encoded arguments
    #[serde(default)]
    arguments: String,
}

#[derive(Clone, Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: ToolDefinition,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}

fn function_kind() -> String {
    "function".into()
}

/// OpenAI-compatible LLM provider
pub struct OpenAiProvider {
    client: reqwest::Client,
    config: OpenAiConfig,
    tools: Vec<WireTool>,
}

impl OpenAiProvider {
    /// Create from configuration
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            tools: Vec::new(),
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(OpenAiConfig::from_env()?)
    }

    pub const fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Convert agent messages to the chat-completions format
    fn convert_messages(messages: &[Message]) -> Vec<WireMessage> {
        messages
            .iter()
            .map(|m| match m {
                Message::System(text) => text_message("system", text),
                Message::User(text) => text_message("user", text),
                Message::Assistant(text) => text_message("assistant", text),
                Message::ToolRequest(requests) => WireMessage {
                    role: "assistant".into(),
                    tool_calls: requests.iter().map(wire_tool_call).collect(),
                    ..WireMessage::default()
                },
                Message::ToolResponse(response) => WireMessage {
                    role: "tool".into(),
                    content: Some(response.result.clone()),
                    tool_call_id: Some(response.call.id.clone()),
                    ..WireMessage::default()
                },
            })
            .collect()
    }

    /// Convert the first choice into the agent's next turn
    fn convert_response(response: ChatResponse) -> Result<Message> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Provider("Response contained no choices".into()))?;
        let message = choice.message;

        if message.tool_calls.is_empty() {
            return Ok(Message::Assistant(message.content.unwrap_or_default()));
        }

        let requests = message
            .tool_calls
            .into_iter()
            .map(|tc| {
                let args = parse_arguments(&tc.function.name, tc.function.arguments);
                ToolCallRequest::new(tc.id, tc.function.name, args)
            })
            .collect();
        Ok(Message::tool_request(requests)?)
    }

    async fn send_once(&self, request: &ChatRequest<'_>) -> Result<ChatResponse> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    AgentError::ProviderUnavailable(e.to_string())
                } else {
                    AgentError::Provider(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        response
            .json::<ChatResponse>()
            .await
            .map_err(|e| AgentError::Provider(format!("Invalid response body: {e}")))
    }
}

fn text_message(role: &str, text: &str) -> WireMessage {
    WireMessage {
        role: role.into(),
        content: Some(text.into()),
        ..WireMessage::default()
    }
}

fn wire_tool_call(request: &ToolCallRequest) -> WireToolCall {
    WireToolCall {
        id: request.call.id.clone(),
        kind: function_kind(),
        function: WireFunctionCall {
            name: request.call.name.clone(),
            arguments: request.args.to_string(),
        },
    }
}

/// Arguments arrive as a JSON string. Anything unparseable is handed to the
/// tool as a plain string, whose lenient decoding then applies.
fn parse_arguments(tool: &str, arguments: String) -> Value {
    if arguments.trim().is_empty() {
        return Value::Object(serde_json::Map::new());
    }
    match serde_json::from_str(&arguments) {
        Ok(args) => args,
        Err(e) => {
            tracing::warn!(tool, error = %e, "Tool arguments are not valid JSON");
            Value::String(arguments)
        }
    }
}

fn status_error(status: StatusCode, body: String) -> AgentError {
    let detail = format!("HTTP {status}: {body}");
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::Auth(detail),
        StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited(detail),
        s if s.is_server_error() => AgentError::ProviderUnavailable(detail),
        _ => AgentError::Provider(detail),
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn call(&self, history: &[Message]) -> Result<Message> {
        let request = ChatRequest {
            model: self.config.model.as_str(),
            messages: Self::convert_messages(history),
            tools: (!self.tools.is_empty()).then_some(self.tools.as_slice()),
        };

        let mut attempt = 0;
        let response = loop {
            match self.send_once(&request).await {
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let backoff = self
                        .config
                        .retry_backoff_ms
                        .saturating_mul(1u64.checked_shl(attempt).unwrap_or(u64::MAX));
                    attempt += 1;
                    tracing::warn!(attempt, backoff_ms = backoff, error = %e, "Retrying model call");
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                other => break other?,
            }
        };

        Self::convert_response(response)
    }

    fn register_tool(&mut self, tool: &dyn Tool) -> Result<()> {
        if self.tools.iter().any(|t| t.function.name == tool.name()) {
            return Err(AgentError::Config(format!(
                "Tool '{}' already registered with provider",
                tool.name()
            )));
        }
        self.tools.push(WireTool {
            kind: "function",
            function: ToolDefinition::from_tool(tool),
        });
        Ok(())
    }
}
