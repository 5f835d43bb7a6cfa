//! Conversation Messages
//!
//! A turn in the transcript is exactly one of five variants. Text turns come
//! from the system, the user or the assistant; the model may instead ask for a
//! batch of tool calls, and every executed call is answered by its own
//! tool-response turn.

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Wrong payload requested from a [`Message`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error("message has no text content (type={0})")]
    NoTextContent(MessageType),

    #[error("message is not a tool call request (type={0})")]
    NotToolCallRequests(MessageType),

    #[error("message is not a tool call response (type={0})")]
    NotToolCallResponse(MessageType),

    #[error("tool request message needs at least one call")]
    EmptyToolRequests,
}

/// Kind of a conversation turn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    System,
    User,
    Assistant,
    ToolRequest,
    ToolResponse,
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::ToolRequest => write!(f, "tool_request"),
            Self::ToolResponse => write!(f, "tool_response"),
        }
    }
}

/// Identity of a single tool invocation. The id is echoed back untouched in
/// the matching response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Tool call requested by the model. `args` is only interpreted by the tool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub call: ToolCall,
    pub args: serde_json::Value,
}

impl ToolCallRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, args: serde_json::Value) -> Self {
        Self {
            call: ToolCall::new(id, name),
            args,
        }
    }
}

/// Textual outcome of one tool call
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallResponse {
    pub call: ToolCall,
    pub result: String,
}

/// A single turn in a conversation
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    /// System prompt/instructions
    System(String),
    /// User input
    User(String),
    /// Final assistant (LLM) answer
    Assistant(String),
    /// Non-empty, ordered batch of tool calls requested by the model
    ToolRequest(Vec<ToolCallRequest>),
    /// Result of one tool call
    ToolResponse(ToolCallResponse),
}

impl Message {
    /// Create a system message
    pub fn system(text: impl Into<String>) -> Self {
        Self::System(text.into())
    }

    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self::User(text.into())
    }

    /// Create an assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::Assistant(text.into())
    }

    /// Create a tool request message. An empty batch is rejected.
    pub fn tool_request(requests: Vec<ToolCallRequest>) -> Result<Self, MessageError> {
        if requests.is_empty() {
            return Err(MessageError::EmptyToolRequests);
        }
        Ok(Self::ToolRequest(requests))
    }

    /// Create a tool response message
    pub fn tool_response(
        id: impl Into<String>,
        name: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self::ToolResponse(ToolCallResponse {
            call: ToolCall::new(id, name),
            result: result.into(),
        })
    }

    pub const fn message_type(&self) -> MessageType {
        match self {
            Self::System(_) => MessageType::System,
            Self::User(_) => MessageType::User,
            Self::Assistant(_) => MessageType::Assistant,
            Self::ToolRequest(_) => MessageType::ToolRequest,
            Self::ToolResponse(_) => MessageType::ToolResponse,
        }
    }

    /// Text of a system, user or assistant turn
    pub fn text(&self) -> Result<&str, MessageError> {
        match self {
            Self::System(text) | Self::User(text) | Self::Assistant(text) => Ok(text.as_str()),
            other => Err(MessageError::NoTextContent(other.message_type())),
        }
    }

    pub fn tool_call_requests(&self) -> Result<&[ToolCallRequest], MessageError> {
        match self {
            Self::ToolRequest(requests) => Ok(requests.as_slice()),
            other => Err(MessageError::NotToolCallRequests(other.message_type())),
        }
    }

    pub fn tool_call_response(&self) -> Result<&ToolCallResponse, MessageError> {
        match self {
            Self::ToolResponse(response) => Ok(response),
            other => Err(MessageError::NotToolCallResponse(other.message_type())),
        }
    }

    pub const fn is_tool_call_request(&self) -> bool {
        matches!(self, Self::ToolRequest(_))
    }

    pub const fn is_tool_call_response(&self) -> bool {
        matches!(self, Self::ToolResponse(_))
    }

    fn record(&self) -> MessageRecord<'_> {
        let mut record = MessageRecord {
            message_type: self.message_type(),
            text: None,
            tool_call_requests: None,
            tool_call_response: None,
        };
        match self {
            Self::System(text) | Self::User(text) | Self::Assistant(text) => {
                record.text = Some(text.as_str());
            }
            Self::ToolRequest(requests) => record.tool_call_requests = Some(requests.as_slice()),
            Self::ToolResponse(response) => record.tool_call_response = Some(response),
        }
        record
    }
}

/// Structured form used for debug dumps
#[derive(Serialize)]
struct MessageRecord<'a> {
    #[serde(rename = "type")]
    message_type: MessageType,

    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_requests: Option<&'a [ToolCallRequest]>,

    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_response: Option<&'a ToolCallResponse>,
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.record().serialize(serializer)
    }
}

const PREVIEW_CHARS: usize = 50;

fn preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        let head: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: ", self.message_type())?;
        match self {
            Self::System(text) | Self::User(text) => write!(f, "{}", preview(text)),
            Self::Assistant(text) => write!(f, "{text}"),
            Self::ToolRequest(requests) => {
                let calls: Vec<String> = requests
                    .iter()
                    .map(|r| format!("{}({})", r.call.name, r.args))
                    .collect();
                write!(f, "{}", calls.join(", "))
            }
            Self::ToolResponse(response) => {
                write!(f, "{} -> {}", response.call.name, response.result)
            }
        }
    }
}

/// Append-only transcript of one conversation run
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Get all messages
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Get the last message
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Extend<Message> for Transcript {
    fn extend<I: IntoIterator<Item = Message>>(&mut self, iter: I) {
        self.messages.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn all_variants() -> Vec<Message> {
        vec![
            Message::system("Be concise"),
            Message::user("Hi"),
            Message::assistant("Hello!"),
            Message::tool_request(vec![ToolCallRequest::new("c1", "add_numbers", json!({"a": 1}))])
                .unwrap(),
            Message::tool_response("c1", "add_numbers", "1"),
        ]
    }

    #[test]
    fn test_exactly_one_payload() {
        for msg in all_variants() {
            let populated = [
                msg.text().is_ok(),
                msg.tool_call_requests().is_ok(),
                msg.tool_call_response().is_ok(),
            ];
            assert_eq!(populated.iter().filter(|p| **p).count(), 1, "{msg:?}");
        }
    }

    #[test]
    fn test_wrong_accessor_errors() {
        let user = Message::user("Hi");
        assert_eq!(
            user.tool_call_requests().unwrap_err(),
            MessageError::NotToolCallRequests(MessageType::User)
        );
        assert_eq!(
            user.tool_call_response().unwrap_err(),
            MessageError::NotToolCallResponse(MessageType::User)
        );

        let response = Message::tool_response("c1", "t", "ok");
        assert_eq!(
            response.text().unwrap_err(),
            MessageError::NoTextContent(MessageType::ToolResponse)
        );
        assert!(response.is_tool_call_response());
        assert!(!response.is_tool_call_request());
    }

    #[test]
    fn test_empty_tool_request_rejected() {
        assert_eq!(
            Message::tool_request(Vec::new()).unwrap_err(),
            MessageError::EmptyToolRequests
        );
    }

    #[test]
    fn test_serialized_record() {
        let value = serde_json::to_value(Message::user("Hi")).unwrap();
        assert_eq!(value, json!({"type": "user", "text": "Hi"}));

        let value = serde_json::to_value(Message::tool_response("c1", "clock", "12:00")).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "tool_response",
                "tool_call_response": {"call": {"id": "c1", "name": "clock"}, "result": "12:00"}
            })
        );

        let request =
            Message::tool_request(vec![ToolCallRequest::new("c2", "add", json!({"a": 2}))]).unwrap();
        let value = serde_json::to_value(request).unwrap();
        assert_eq!(value["type"], "tool_request");
        assert_eq!(value["tool_call_requests"][0]["call"]["id"], "c2");
        assert_eq!(value["tool_call_requests"][0]["args"]["a"], 2);
        assert!(value.get("text").is_none());
    }

    #[test]
    fn test_display_truncates_long_user_text() {
        let long = "x".repeat(80);
        let line = Message::user(long).to_string();
        assert_eq!(line, format!("user: {}...", "x".repeat(50)));

        let line = Message::assistant("y".repeat(80)).to_string();
        assert!(line.ends_with(&"y".repeat(80)));
    }

    #[test]
    fn test_transcript() {
        let mut transcript = Transcript::new();
        transcript.push(Message::system("You are helpful."));
        transcript.push(Message::user("Hi"));
        transcript.extend([Message::assistant("Hello!")]);

        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.last().unwrap().message_type(), MessageType::Assistant);
    }
}
