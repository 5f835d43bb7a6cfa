//! Error Types

use thiserror::Error;

use crate::message::{MessageError, MessageType};

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM provider error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// A model call failed; wraps the provider's own error
    #[error("Model call failed: {0}")]
    ModelCall(#[source] Box<AgentError>),

    /// The provider answered with a turn it is not allowed to produce
    #[error("Model provider returned an unexpected {0} message")]
    UnexpectedMessage(MessageType),

    /// Tool not found in registry
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool declaration does not match its argument shape
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    /// Tool execution failed
    #[error("Tool '{name}' failed: {message}")]
    ToolExecution { name: String, message: String },

    /// Maximum reasoning rounds reached without a final answer
    #[error("Maximum iterations ({0}) reached")]
    MaxIterations(usize),

    /// Wrong payload requested from a message
    #[error("Message error: {0}")]
    Message(#[from] MessageError),

    /// The run was cancelled by the caller
    #[error("Run cancelled")]
    Cancelled,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rate limited
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),
}

impl AgentError {
    /// Check if error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable(_) | Self::RateLimited(_)
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(msg) => format!("The AI service encountered an error: {msg}"),
            Self::ProviderUnavailable(_) => "The AI service is currently unavailable. Please try again.".into(),
            Self::ModelCall(inner) => inner.user_message(),
            Self::ToolNotFound(name) => format!("The tool '{name}' is not available."),
            Self::ToolValidation(msg) => format!("Invalid tool declaration: {msg}"),
            Self::ToolExecution { name, message } => format!("Tool '{name}' failed: {message}"),
            Self::MaxIterations(_) => "The request took too long to process. Please try a simpler query.".into(),
            Self::Cancelled => "The request was cancelled.".into(),
            Self::RateLimited(_) => "You've made too many requests. Please wait a moment.".into(),
            Self::Auth(_) => "Authentication failed. Please check your credentials.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}
