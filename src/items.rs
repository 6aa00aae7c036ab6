//! Conversation items: messages, tool calls, requests, and responses.
//!
//! Requests and responses are immutable values. Every "mutation" helper
//! returns a fresh value and leaves the original untouched, which the
//! evaluation loop relies on when it rebuilds retry requests from the
//! pristine original.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Role in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            Role::System => "SYSTEM",
            Role::User => "USER",
            Role::Assistant => "ASSISTANT",
            Role::Tool => "TOOL",
        };
        f.write_str(tag)
    }
}

/// A single message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn tool(content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
        }
    }
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// An immutable chat request: a designated system message plus the ordered
/// conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    system: Message,
    messages: Vec<Message>,
}

impl ChatRequest {
    pub fn new(system: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            system: Message::system(system),
            messages,
        }
    }

    /// A request with a single user turn. Convenient for demos and tests.
    pub fn simple(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self::new(system, vec![Message::user(user)])
    }

    pub fn system(&self) -> &Message {
        &self.system
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The most recent user-authored message, if any.
    pub fn last_user(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::User)
    }

    /// Returns a new request whose last user message has been replaced by
    /// `f(original)`. The receiver is left unchanged. When the request holds
    /// no user message, `f` is applied to an empty user message and the
    /// result is appended instead.
    pub fn map_last_user(&self, f: impl FnOnce(&Message) -> Message) -> ChatRequest {
        let mut messages = self.messages.clone();
        match messages.iter().rposition(|m| m.role == Role::User) {
            Some(idx) => messages[idx] = f(&self.messages[idx]),
            None => messages.push(f(&Message::user(""))),
        }
        ChatRequest {
            system: self.system.clone(),
            messages,
        }
    }
}

/// The materialized output of a successful model call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOutput {
    pub id: String,
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub created_at: DateTime<Utc>,
}

impl ModelOutput {
    pub fn message(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            tool_calls: vec![],
            created_at: Utc::now(),
        }
    }

    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            tool_calls,
            created_at: Utc::now(),
        }
    }
}

/// A chat response flowing back through the advisor chain. The output is
/// absent when the model produced nothing usable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub output: Option<ModelOutput>,
}

impl ChatResponse {
    pub fn empty() -> Self {
        Self { output: None }
    }

    pub fn from_output(output: ModelOutput) -> Self {
        Self {
            output: Some(output),
        }
    }

    /// A plain assistant message response.
    pub fn message(content: impl Into<String>) -> Self {
        Self::from_output(ModelOutput::message(content))
    }

    pub fn has_tool_calls(&self) -> bool {
        self.output
            .as_ref()
            .map(|o| !o.tool_calls.is_empty())
            .unwrap_or(false)
    }

    /// The answer text used for evaluation; empty when no output is present.
    pub fn answer_text(&self) -> &str {
        self.output
            .as_ref()
            .map(|o| o.content.as_str())
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_message_constructors() {
        let sys = Message::system("You are a helpful assistant");
        assert_eq!(sys.role, Role::System);
        assert_eq!(sys.content, "You are a helpful assistant");

        let user = Message::user("Hello");
        assert_eq!(user.role, Role::User);
    }

    #[test]
    fn test_role_display_tags() {
        assert_eq!(Role::System.to_string(), "SYSTEM");
        assert_eq!(Role::User.to_string(), "USER");
        assert_eq!(Role::Assistant.to_string(), "ASSISTANT");
        assert_eq!(Role::Tool.to_string(), "TOOL");
    }

    #[test]
    fn test_role_serialization() {
        let serialized = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(serialized, "\"assistant\"");

        let deserialized: Role = serde_json::from_str("\"system\"").unwrap();
        assert_eq!(deserialized, Role::System);
    }

    #[test]
    fn test_last_user_picks_most_recent() {
        let request = ChatRequest::new(
            "sys",
            vec![
                Message::user("first"),
                Message::assistant("reply"),
                Message::user("second"),
            ],
        );
        assert_eq!(request.last_user().unwrap().content, "second");
    }

    #[test]
    fn test_map_last_user_leaves_original_untouched() {
        let request = ChatRequest::simple("sys", "original question");
        let rebuilt = request.map_last_user(|m| Message::user(format!("{} + extra", m.content)));

        assert_eq!(request.last_user().unwrap().content, "original question");
        assert_eq!(
            rebuilt.last_user().unwrap().content,
            "original question + extra"
        );
    }

    #[test]
    fn test_map_last_user_without_user_message_appends() {
        let request = ChatRequest::new("sys", vec![Message::assistant("hi")]);
        let rebuilt = request.map_last_user(|m| Message::user(format!("{}fallback", m.content)));

        assert_eq!(rebuilt.messages().len(), 2);
        assert_eq!(rebuilt.last_user().unwrap().content, "fallback");
        assert!(request.last_user().is_none());
    }

    #[test]
    fn test_answer_text_and_tool_calls() {
        let response = ChatResponse::message("Hello, how can I help?");
        assert_eq!(response.answer_text(), "Hello, how can I help?");
        assert!(!response.has_tool_calls());

        let tool_call = ToolCall {
            id: "call_1".to_string(),
            name: "get_weather".to_string(),
            arguments: serde_json::json!({"city": "Tokyo"}),
        };
        let with_tools =
            ChatResponse::from_output(ModelOutput::with_tool_calls("", vec![tool_call]));
        assert!(with_tools.has_tool_calls());

        assert_eq!(ChatResponse::empty().answer_text(), "");
    }
}
