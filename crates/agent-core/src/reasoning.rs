//! Reasoning Loop
//!
//! Drives one conversation run: seed the transcript, ask the model for the
//! next turn, execute any requested tools, feed the results back, and repeat
//! until the model answers or the round limit is hit.
//!
//! ```text
//! Seeding -> AwaitingModel -> Assistant ------------------> done
//!                 ^   |
//!                 |   +-> ToolRequest -> ExecutingTools --+
//!                 +---------------------------------------+
//! ```

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use futures::future::try_join_all;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, warn};
use uuid::Uuid;

use crate::error::{AgentError, Result};
use crate::message::{Message, MessageError, ToolCallRequest, Transcript};
use crate::provider::LlmProvider;
use crate::tool::{Tool, ToolRegistry};

/// Rounds allowed before a run is abandoned
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// What to do when a tool call fails (including unknown tool names).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ToolErrorPolicy {
    /// Put `error: ...` into the tool response so the model can react
    #[default]
    Report,
    /// End the run with the tool's error; other calls of the batch are dropped
    Abort,
}

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Base system prompt; may be empty
    pub system_prompt: String,

    /// Maximum model calls per run
    pub max_iterations: usize,

    pub tool_error_policy: ToolErrorPolicy,

    /// Run the calls of one tool batch concurrently
    pub parallel_tool_calls: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: String::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tool_error_policy: ToolErrorPolicy::default(),
            parallel_tool_calls: true,
        }
    }
}

/// Receives the full transcript once at the end of every run.
pub trait TranscriptSink: Send + Sync {
    fn record(&self, transcript: &[Message]);
}

/// Logs each message of the transcript as a JSON record at debug level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl TranscriptSink for TracingSink {
    fn record(&self, transcript: &[Message]) {
        for message in transcript {
            match serde_json::to_string(message) {
                Ok(line) => debug!(target: "agent_core::transcript", "{line}"),
                Err(e) => warn!(error = %e, "Failed to serialize transcript message"),
            }
        }
    }
}

/// Per-call options for [`Agent::send_message`]
#[derive(Clone, Debug, Default)]
pub struct SendOptions {
    append_system_prompt: Vec<String>,
    cancel: Option<CancellationToken>,
}

impl SendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fragment to the system prompt for this call only
    #[must_use]
    pub fn append_system_prompt(mut self, fragment: impl Into<String>) -> Self {
        self.append_system_prompt.push(fragment.into());
        self
    }

    /// Abort the run when `token` is cancelled
    #[must_use]
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Trim the base prompt and every fragment, drop empty ones, join with a
/// newline. `None` when nothing is left.
pub fn build_system_prompt<S: AsRef<str>>(base: &str, appends: &[S]) -> Option<String> {
    let parts: Vec<&str> = std::iter::once(base)
        .chain(appends.iter().map(AsRef::as_ref))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

/// Owns the transcript of a run and hands it to the sink when dropped, so the
/// dump happens on every exit path, cancellation included.
struct TranscriptGuard<'a> {
    transcript: Transcript,
    sink: Option<&'a dyn TranscriptSink>,
}

impl Deref for TranscriptGuard<'_> {
    type Target = Transcript;

    fn deref(&self) -> &Transcript {
        &self.transcript
    }
}

impl DerefMut for TranscriptGuard<'_> {
    fn deref_mut(&mut self) -> &mut Transcript {
        &mut self.transcript
    }
}

impl Drop for TranscriptGuard<'_> {
    fn drop(&mut self) {
        if let Some(sink) = self.sink {
            sink.record(self.transcript.messages());
        }
    }
}

/// The main Agent struct
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
    sink: Option<Arc<dyn TranscriptSink>>,
}

impl Agent {
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    /// Run with a plain question and default options
    pub async fn ask(&self, question: &str) -> Result<String> {
        self.send_message(question, SendOptions::default()).await
    }

    /// Run one conversation for `user_message` and return the final answer.
    pub async fn send_message(&self, user_message: &str, options: SendOptions) -> Result<String> {
        let run_id = Uuid::new_v4();
        self.run(user_message, options)
            .instrument(tracing::info_span!("agent_run", %run_id))
            .await
    }

    async fn run(&self, user_message: &str, options: SendOptions) -> Result<String> {
        let mut transcript = TranscriptGuard {
            transcript: Transcript::new(),
            sink: self.sink.as_deref(),
        };
        if let Some(system) =
            build_system_prompt(&self.config.system_prompt, options.append_system_prompt.as_slice())
        {
            transcript.push(Message::System(system));
        }
        transcript.push(Message::user(user_message));

        let cancel = options.cancel.unwrap_or_else(CancellationToken::new);

        for round in 1..=self.config.max_iterations {
            debug!(round, messages = transcript.len(), "Calling model");

            let response = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(AgentError::Cancelled),
                result = self.provider.call(transcript.messages()) => {
                    result.map_err(|e| AgentError::ModelCall(Box::new(e)))?
                }
            };

            match response {
                Message::Assistant(text) => {
                    transcript.push(Message::Assistant(text.clone()));
                    info!(rounds = round, "Agent produced final answer");
                    return Ok(text);
                }
                Message::ToolRequest(requests) if requests.is_empty() => {
                    return Err(MessageError::EmptyToolRequests.into());
                }
                Message::ToolRequest(requests) => {
                    debug!(round, calls = requests.len(), "Model requested tools");
                    transcript.push(Message::ToolRequest(requests.clone()));
                    let responses = tokio::select! {
                        biased;
                        () = cancel.cancelled() => return Err(AgentError::Cancelled),
                        responses = self.execute_tools(&requests) => responses?,
                    };
                    transcript.extend(responses);
                }
                other => return Err(AgentError::UnexpectedMessage(other.message_type())),
            }
        }

        warn!(limit = self.config.max_iterations, "Round limit reached without final answer");
        Err(AgentError::MaxIterations(self.config.max_iterations))
    }

    /// Execute a batch; responses come back in request order. The first
    /// error (only possible under `Abort`) drops the calls still running.
    async fn execute_tools(&self, requests: &[ToolCallRequest]) -> Result<Vec<Message>> {
        if self.config.parallel_tool_calls {
            return try_join_all(requests.iter().map(|r| self.execute_tool(r))).await;
        }

        let mut responses = Vec::with_capacity(requests.len());
        for request in requests {
            responses.push(self.execute_tool(request).await?);
        }
        Ok(responses)
    }

    async fn execute_tool(&self, request: &ToolCallRequest) -> Result<Message> {
        let call = &request.call;
        debug!(tool = %call.name, call_id = %call.id, "Executing tool");

        let result = match self.tools.execute(request).await {
            Ok(output) => output,
            Err(e) => match self.config.tool_error_policy {
                ToolErrorPolicy::Report => {
                    warn!(tool = %call.name, error = %e, "Tool failed, reporting to model");
                    format!("error: {e}")
                }
                ToolErrorPolicy::Abort => return Err(e),
            },
        };

        Ok(Message::tool_response(call.id.clone(), call.name.clone(), result))
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get configuration
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Builder for Agent configuration
#[derive(Default)]
pub struct AgentBuilder {
    provider: Option<Box<dyn LlmProvider>>,
    tools: Vec<Arc<dyn Tool>>,
    config: AgentConfig,
    sink: Option<Arc<dyn TranscriptSink>>,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn provider<P: LlmProvider + 'static>(mut self, provider: P) -> Self {
        self.provider = Some(Box::new(provider));
        self
    }

    #[must_use]
    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.push(Arc::new(tool));
        self
    }

    #[must_use]
    pub fn tools<I: IntoIterator<Item = Arc<dyn Tool>>>(mut self, tools: I) -> Self {
        self.tools.extend(tools);
        self
    }

    #[must_use]
    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    #[must_use]
    pub const fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    #[must_use]
    pub const fn tool_error_policy(mut self, policy: ToolErrorPolicy) -> Self {
        self.config.tool_error_policy = policy;
        self
    }

    #[must_use]
    pub const fn parallel_tool_calls(mut self, parallel: bool) -> Self {
        self.config.parallel_tool_calls = parallel;
        self
    }

    #[must_use]
    pub fn transcript_sink(mut self, sink: Arc<dyn TranscriptSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Dump every transcript through `tracing` at debug level
    #[must_use]
    pub fn debug(self) -> Self {
        self.transcript_sink(Arc::new(TracingSink))
    }

    /// Register every tool locally and with the provider, then freeze both.
    pub fn build(self) -> Result<Agent> {
        let mut provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;
        if self.config.max_iterations == 0 {
            return Err(AgentError::Config("max_iterations must be at least 1".into()));
        }

        let mut registry = ToolRegistry::new();
        for tool in self.tools {
            provider.register_tool(tool.as_ref())?;
            registry.register_arc(tool)?;
        }
        debug!(tools = ?registry.names(), "Agent built");

        Ok(Agent {
            provider: Arc::from(provider),
            tools: Arc::new(registry),
            config: self.config,
            sink: self.sink,
        })
    }
}
