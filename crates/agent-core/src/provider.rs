//! LLM Provider Port
//!
//! Defines the interface every model backend implements. The agent only ever
//! talks to a backend through this trait, so vendor adapters can be swapped
//! without touching the reasoning loop.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_core::{Agent, LlmProvider};
//!
//! let agent = Agent::builder()
//!     .provider(OpenAiProvider::from_env()?)
//!     .tool(my_tool)
//!     .build()?;
//! ```

use async_trait::async_trait;

use crate::error::Result;
use crate::message::Message;
use crate::tool::Tool;

/// Strategy trait for LLM providers
///
/// Tools are registered through `&mut self` while the agent is being built,
/// before the provider is shared, so every tool is advertised before the
/// first [`call`](LlmProvider::call).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send the full transcript and get the model's next turn.
    ///
    /// On success the turn is either [`Message::Assistant`] or
    /// [`Message::ToolRequest`]. Retries, if any, happen in here.
    async fn call(&self, history: &[Message]) -> Result<Message>;

    /// Advertise a tool's schema to the backend. Registering the same name
    /// twice is an error.
    fn register_tool(&mut self, tool: &dyn Tool) -> Result<()>;
}
