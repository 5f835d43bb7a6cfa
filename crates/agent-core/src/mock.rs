//! Scripted provider for tests and examples.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::provider::LlmProvider;
use crate::tool::{Tool, ToolDefinition};

#[derive(Default)]
struct MockState {
    responses: VecDeque<Message>,
    histories: Vec<Vec<Message>>,
    tools: Vec<ToolDefinition>,
}

/// Provider that replays pre-configured turns.
///
/// Clones share state, so a test can keep a handle after handing the
/// provider to an agent and inspect what the agent sent.
#[derive(Clone, Default)]
pub struct MockProvider {
    state: Arc<Mutex<MockState>>,
    fallback: Option<Message>,
    delay: Option<Duration>,
}

impl MockProvider {
    /// Create a mock that answers with `responses` in order, then fails.
    pub fn new(responses: Vec<Message>) -> Self {
        let state = MockState {
            responses: responses.into(),
            ..MockState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            ..Self::default()
        }
    }

    /// Create a mock that answers every call with the same turn.
    pub fn repeating(message: Message) -> Self {
        Self {
            fallback: Some(message),
            ..Self::default()
        }
    }

    /// Wait this long before answering each call
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of calls received so far
    pub fn call_count(&self) -> usize {
        self.state().histories.len()
    }

    /// Transcript sent with each call
    pub fn histories(&self) -> Vec<Vec<Message>> {
        self.state().histories.clone()
    }

    /// Tools advertised to this provider
    pub fn registered_tools(&self) -> Vec<ToolDefinition> {
        self.state().tools.clone()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn call(&self, history: &[Message]) -> Result<Message> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        state.histories.push(history.to_vec());
        state
            .responses
            .pop_front()
            .or_else(|| self.fallback.clone())
            .ok_or_else(|| AgentError::Provider("mock provider has no scripted response left".into()))
    }

    fn register_tool(&mut self, tool: &dyn Tool) -> Result<()> {
        let mut state = self.state();
        if state.tools.iter().any(|t| t.name == tool.name()) {
            return Err(AgentError::Config(format!(
                "Tool '{}' already registered with provider",
                tool.name()
            )));
        }
        state.tools.push(ToolDefinition::from_tool(tool));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_then_fails() {
        let mock = MockProvider::new(vec![Message::assistant("one")]);
        let handle = mock.clone();

        let first = mock.call(&[Message::user("hi")]).await.unwrap();
        assert_eq!(first, Message::assistant("one"));
        assert!(mock.call(&[]).await.is_err());

        assert_eq!(handle.call_count(), 2);
        assert_eq!(handle.histories()[0], vec![Message::user("hi")]);
    }

    #[tokio::test]
    async fn test_repeating() {
        let mock = MockProvider::repeating(Message::assistant("again"));
        for _ in 0..3 {
            assert_eq!(mock.call(&[]).await.unwrap(), Message::assistant("again"));
        }
    }
}
