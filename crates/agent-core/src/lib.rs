//! # agent-core
//!
//! Tool-calling agent orchestrator with a provider-agnostic model port.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Agent                                │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │  Reasoning  │  │    Tools    │  │   LlmProvider       │  │
//! │  │    Loop     │──│   Registry  │──│   (model port)      │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! A run seeds a [`Transcript`] with the system prompt and the user's
//! message, then alternates between [`LlmProvider::call`] and tool execution
//! until the model answers with plain text or the round limit is reached.
//! Tools declare their parameters as a [`Param`] tree that is compiled into
//! the JSON object schema advertised to the model.

pub mod error;
pub mod message;
pub mod mock;
pub mod provider;
pub mod reasoning;
pub mod schema;
pub mod tool;

pub use error::{AgentError, Result};
pub use message::{
    Message, MessageError, MessageType, ToolCall, ToolCallRequest, ToolCallResponse, Transcript,
};
pub use provider::LlmProvider;
pub use reasoning::{
    Agent, AgentBuilder, AgentConfig, SendOptions, ToolErrorPolicy, TracingSink, TranscriptSink,
};
pub use schema::{ArgField, Param, ParamType, compile_schema};
pub use tool::{FnTool, NoArgs, Tool, ToolArgs, ToolDefinition, ToolRegistry};

pub use tokio_util::sync::CancellationToken;
