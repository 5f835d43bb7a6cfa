//! # agent-runtime
//!
//! Model provider adapters for agent-core.
//!
//! ## Providers
//!
//! - **OpenAI** (default): any OpenAI-compatible `/chat/completions` endpoint
//!   with function calling (OpenAI, proxies, local servers)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::OpenAiProvider;
//!
//! let agent = Agent::builder()
//!     .provider(OpenAiProvider::from_env()?)
//!     .tool(my_tool)
//!     .build()?;
//! ```

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "openai")]
pub use openai::{Model, OpenAiConfig, OpenAiProvider};

// Re-export core types for convenience
pub use agent_core::{Agent, AgentError, LlmProvider, Message, Result, Tool, ToolRegistry};
