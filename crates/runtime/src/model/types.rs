//! Core conversation types (provider-agnostic).
//!
//! These types represent the universal concepts shared across LLM providers.
//! Provider-specific wire formats belong in the adapter modules.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;

use super::errors::ModelError;

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    /// Synthetic role carrying tool results back to the model.
    Tool,
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this call (used to correlate results).
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// Arguments as a JSON object.
    pub args: Value,
}

/// The result of a tool execution, linked to its call by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID of the tool call this result answers.
    pub id: String,
    /// Name of the tool that produced it.
    pub name: String,
    /// Result payload as a JSON object.
    pub result: Value,
}

/// A part of a message, which can be text or a tool interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    Text { text: String },
    ToolCall(ToolCall),
    ToolResult(ToolResult),
}

impl Part {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text { text: s.into() }
    }
}

/// A message, consisting of a role and one or more ordered parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Message {
    /// Create a user message with text content.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::text(text)],
        }
    }

    /// Create an assistant message with text content.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            parts: vec![Part::text(text)],
        }
    }

    /// Create a tool message carrying one result per executed call.
    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        Self {
            role: Role::Tool,
            parts: results.into_iter().map(Part::ToolResult).collect(),
        }
    }

    /// Create a message from parts.
    pub fn from_parts(role: Role, parts: Vec<Part>) -> Self {
        Self { role, parts }
    }

    /// Get combined text content from all text parts, in order.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// Extract all tool calls from this message, in emission order.
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::ToolCall(call) => Some(call.clone()),
                _ => None,
            })
            .collect()
    }
}

/// An append-only sequence of messages.
///
/// Messages are never mutated after being appended; the turn loop builds
/// new messages and pushes them. The whole history serializes with serde
/// for callers that want to persist it across sessions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Owned copy of the history, for rendering or for a model request.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }
}

/// A tool definition exposed to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's arguments.
    pub schema: Value,
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Everything needed for one model request.
#[derive(Debug, Clone)]
pub struct ModelRequest<'a> {
    pub messages: &'a [Message],
    pub tools: &'a [ToolSpec],
    pub system: &'a str,
}

/// The response from a model: the newly produced assistant message
/// (text and any tool-call parts, in emission order) plus usage.
#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub message: Message,
    pub usage: Usage,
}

impl ModelResponse {
    /// Tool calls requested by this response, in emission order.
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.message.tool_calls()
    }
}

/// Trait for LLM provider backends.
///
/// One network round trip per call, no internal retry. Implementations
/// convert the neutral history to their wire format, perform the request,
/// and map the response back to a neutral assistant [`Message`].
pub trait Backend: Send + Sync {
    fn generate(
        &self,
        request: ModelRequest<'_>,
    ) -> impl Future<Output = Result<ModelResponse, ModelError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_text_extraction() {
        let msg = Message {
            role: Role::Assistant,
            parts: vec![
                Part::text("Hello "),
                Part::ToolCall(ToolCall {
                    id: "1".into(),
                    name: "cat_file".into(),
                    args: json!({"filePath": "a.txt"}),
                }),
                Part::text("world"),
            ],
        };
        assert_eq!(msg.text(), "Hello world");
    }

    #[test]
    fn message_tool_calls_extraction() {
        let msg = Message {
            role: Role::Assistant,
            parts: vec![
                Part::text("Let me look"),
                Part::ToolCall(ToolCall {
                    id: "1".into(),
                    name: "list_directory".into(),
                    args: json!({"directory": "."}),
                }),
                Part::ToolCall(ToolCall {
                    id: "2".into(),
                    name: "cat_file".into(),
                    args: json!({"filePath": "b.txt"}),
                }),
            ],
        };
        let calls = msg.tool_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].name, "list_directory");
        assert_eq!(calls[1].name, "cat_file");
    }

    #[test]
    fn conversation_appends_in_order() {
        let mut conv = Conversation::new();
        conv.push(Message::user("hi"));
        conv.push(Message::assistant("hello"));
        assert_eq!(conv.len(), 2);
        assert_eq!(conv.messages()[0].role, Role::User);
        assert_eq!(conv.messages()[1].role, Role::Assistant);
    }

    #[test]
    fn tool_results_message_has_tool_role() {
        let msg = Message::tool_results(vec![ToolResult {
            id: "1".into(),
            name: "cat_file".into(),
            result: json!({"content": "x"}),
        }]);
        assert_eq!(msg.role, Role::Tool);
        assert!(
            msg.parts
                .iter()
                .all(|p| matches!(p, Part::ToolResult(_)))
        );
    }

    #[test]
    fn conversation_serde_round_trip() {
        let mut conv = Conversation::new();
        conv.push(Message::user("hi"));
        conv.push(Message::from_parts(
            Role::Assistant,
            vec![
                Part::text("checking"),
                Part::ToolCall(ToolCall {
                    id: "call-1".into(),
                    name: "list_directory".into(),
                    args: json!({"directory": "."}),
                }),
            ],
        ));
        conv.push(Message::tool_results(vec![ToolResult {
            id: "call-1".into(),
            name: "list_directory".into(),
            result: json!({"entries": ["a.txt"]}),
        }]));

        let encoded = serde_json::to_string(&conv).unwrap();
        let decoded: Conversation = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.messages(), conv.messages());
    }
}
